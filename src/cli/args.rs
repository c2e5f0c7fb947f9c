use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "userscroll",
    version,
    about = "infinite-scroll loader for paginated user feeds",
    long_about = "userscroll pages through a user feed served as GET <path>?counter=<offset>, renders every record through the post template and writes the resulting page.\n\nExamples:\n  userscroll -u http://127.0.0.1:5000/\n  userscroll -u http://127.0.0.1:5000/ --max-pages 3 -o users.html\n  userscroll -u http://127.0.0.1:5000/ --config ~/.userscroll/config.yml\n\nTip: Use --init-config to write a starter config file."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered page to FILE instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json, xml or html (inferred from --output when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Feed",
        help = "Page URL the feed is served from."
    )]
    pub url: Option<String>,

    #[arg(
        long = "pt",
        visible_alias = "path",
        value_name = "PATH",
        help_heading = "Feed",
        help = "Results path, resolved against --url (default: /load)."
    )]
    pub path: Option<String>,

    #[arg(
        long = "prm",
        visible_alias = "param",
        value_name = "NAME",
        help_heading = "Feed",
        help = "Query parameter carrying the offset (default: counter)."
    )]
    pub counter_param: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Feed",
        help = "Path to config file (defaults to ~/.userscroll/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Feed",
        help = "Write a starter config file (if missing) and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'n',
        long = "mp",
        visible_alias = "max-pages",
        value_name = "N",
        help_heading = "Paging",
        help = "Stop after N load triggers (0 = until the feed is exhausted)."
    )]
    pub max_pages: Option<usize>,

    #[arg(
        short = 'r',
        long = "rt",
        visible_alias = "rate",
        value_name = "N",
        help_heading = "Paging",
        help = "Load triggers per second (0 = unlimited)."
    )]
    pub rate: Option<u32>,

    #[arg(
        short = 'a',
        long = "ap",
        visible_alias = "allow-partial",
        help_heading = "Paging",
        help = "On a failed load, stop paging but write what was rendered and exit successfully."
    )]
    pub allow_partial: bool,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Add a header to every page request (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        long = "ua",
        visible_alias = "user-agent",
        value_name = "AGENT",
        help_heading = "HTTP",
        help = "User-Agent sent with page requests."
    )]
    pub user_agent: Option<String>,

    #[arg(
        long = "tt",
        visible_alias = "title-template",
        value_name = "TEMPLATE",
        help_heading = "Rendering",
        help = "Post title pattern over {id} and {content} (default: 'User - {id}')."
    )]
    pub title_template: Option<String>,

    #[arg(
        long = "ct",
        visible_alias = "content-template",
        value_name = "TEMPLATE",
        help_heading = "Rendering",
        help = "Post content pattern over {id} and {content} (default: '{content}')."
    )]
    pub content_template: Option<String>,

    #[arg(
        long = "em",
        visible_alias = "exhausted-message",
        value_name = "TEXT",
        help_heading = "Rendering",
        help = "Sentinel text once the feed is exhausted (default: 'No more users')."
    )]
    pub exhausted_message: Option<String>,

    #[arg(
        short = 'w',
        long = "wrk",
        visible_alias = "workers",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of runtime worker threads."
    )]
    pub workers: Option<usize>,
}
