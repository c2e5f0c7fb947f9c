use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.counter_param.as_deref() {
        crate::utils::parse_query_param(raw).map_err(|e| format!("invalid --param '{raw}': {e}"))?;
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, xml or html"
            ));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err("invalid workers, expected positive integer".to_string());
        }
    }
    Ok(())
}
