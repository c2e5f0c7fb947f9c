use std::collections::HashMap;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::level_filters::LevelFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::loader::LoadOutcome;
use crate::output::{self, FeedSnapshot, OutputFormat};
use crate::runner::{Options, PageProgress, Runner};

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS]\n\n");

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in cmd.get_arguments() {
        if arg.is_hide_set() {
            continue;
        }

        let heading = arg.get_help_heading().unwrap_or("Options").to_string();

        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };

        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();

            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }

            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }

            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = parts.join(", ");

            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                flags.push_str(&format!(" <{value_name}>"));
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }

            out.push('\n');
        }
    }

    out
}

fn format_opt_value<'a>(v: &'a str, default: &'a str) -> &'a str {
    if v.trim().is_empty() {
        default
    } else {
        v
    }
}

fn configure_logging(verbose: u8, no_color: bool) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_ansi(!no_color)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(format!("off,userscroll={level}"))
        .try_init();
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    workers: usize,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let base_url = args
        .url
        .or(cfg.base_url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "a feed URL must be specified (--url or base_url in config)".to_string())?;

    let defaults = Options::default();
    let path = args.path.or(cfg.path).unwrap_or(defaults.path);
    let counter_param = args
        .counter_param
        .or(cfg.counter_param)
        .unwrap_or(defaults.counter_param);
    crate::utils::parse_query_param(&counter_param)
        .map_err(|e| format!("invalid counter parameter '{counter_param}': {e}"))?;

    let header = args.header.or(cfg.header).filter(|h| !h.trim().is_empty());
    if let Some(raw) = header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid header '{raw}': {e}"))?;
    }

    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(defaults.timeout_seconds);
    let workers = args.workers.or(cfg.workers).unwrap_or(2).max(1);
    let allow_partial = args.allow_partial || cfg.allow_partial.unwrap_or(false);

    let output = args
        .output
        .or(cfg.output)
        .filter(|o| !o.trim().is_empty())
        .map(|o| config::expand_tilde_string(&o));
    let output_format_raw = args.output_format.or(cfg.output_format);
    let output_format = match output_format_raw.as_deref() {
        Some(raw) => OutputFormat::parse(raw).ok_or_else(|| {
            format!("invalid output format '{raw}', expected text, json, xml or html")
        })?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let options = Options {
        base_url,
        path,
        counter_param,
        timeout_seconds,
        proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        header,
        user_agent: args
            .user_agent
            .or(cfg.user_agent)
            .unwrap_or(defaults.user_agent),
        max_pages: args.max_pages.or(cfg.max_pages).unwrap_or(defaults.max_pages),
        rate: args.rate.or(cfg.rate).unwrap_or(defaults.rate),
        title_template: args
            .title_template
            .or(cfg.title_template)
            .unwrap_or(defaults.title_template),
        content_template: args
            .content_template
            .or(cfg.content_template)
            .unwrap_or(defaults.content_template),
        exhausted_message: args
            .exhausted_message
            .or(cfg.exhausted_message)
            .unwrap_or(defaults.exhausted_message),
        stop_on_error: !allow_partial,
    };

    Ok(RunConfig {
        options,
        workers,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
    })
}

fn print_settings(run: &RunConfig) {
    let o = &run.options;
    format_kv_line("URL", &o.base_url);
    format_kv_line("Path", format_opt_value(&o.path, "(base)"));
    format_kv_line("Param", &o.counter_param);
    format_kv_line(
        "Pages",
        &if o.max_pages == 0 {
            "until exhausted".to_string()
        } else {
            o.max_pages.to_string()
        },
    );
    if o.rate != 0 {
        format_kv_line("Rate", &format!("{}/s", o.rate));
    }
    format_kv_line("Timeout", &format!("{}s", o.timeout_seconds));
    if let Some(proxy) = o.proxy.as_deref() {
        format_kv_line("Proxy", proxy);
    }
    format_kv_line(
        "Output",
        run.output.as_deref().unwrap_or("stdout"),
    );
    eprintln!();
}

fn sentinel_spinner(no_color: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    let template = if no_color {
        "{spinner} {msg} [{elapsed_precise}]"
    } else {
        "{spinner:.cyan} {msg} [{elapsed_precise}]"
    };
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn report_progress(pb: &ProgressBar, progress: PageProgress<'_>) {
    match progress.outcome {
        Ok(LoadOutcome::Loaded { rendered, offset }) => {
            pb.set_message(format!(
                "{} ({} users)",
                progress.view.sentinel, offset
            ));
            pb.println(format!(
                "{} page {} :: {} users",
                "+".bold().green(),
                progress.trigger,
                rendered
            ));
        }
        Ok(LoadOutcome::Exhausted) => {
            pb.set_message(progress.view.sentinel.to_string());
        }
        Ok(LoadOutcome::Busy) => {}
        Err(e) => {
            pb.println(format!(
                "{} page {} :: {}",
                "!".bold().red(),
                progress.trigger,
                e
            ));
        }
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_settings(&run);

    let runner = Runner::new(run.options.clone()).map_err(|e| e.to_string())?;

    let pb = sentinel_spinner(run.no_color);
    pb.set_message(crate::view::LOADING_TEXT);
    let result = runner
        .run_with(|progress| report_progress(&pb, progress))
        .await;
    pb.finish_and_clear();
    let result = result.map_err(|e| e.to_string())?;

    let feed = FeedSnapshot::new(&result.view, result.offset, result.exhausted);
    let rendered = output::render(run.output_format, &feed);

    match run.output.as_ref() {
        Some(outfile_path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(outfile_path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output file: {e}"))?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
        }
    }

    let status = if result.exhausted {
        "exhausted".bold().green()
    } else if result.view.error.is_some() {
        "stopped on error".bold().red()
    } else {
        "page limit reached".bold().yellow()
    };
    eprintln!();
    eprintln!(
        ":: Completed :: {} users in {} pages, {} :: took {}ms ::",
        result.offset,
        result.pages,
        status,
        result.elapsed.as_millis()
    );

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let (config_path, explicit) = match args.config.as_deref() {
        Some(p) => (Some(config::expand_tilde(p)), true),
        None => (config::default_config_path(), false),
    };

    if args.init_config {
        let path = config_path.ok_or_else(|| "could not determine config path".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!("{}", path.display());
        return Ok(());
    }

    let cfg = match config_path.as_ref() {
        Some(path) => config::load_config(path, !explicit)?,
        None => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;
    configure_logging(run.verbose, run.no_color);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(run.workers)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
