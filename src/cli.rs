use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "codecrate", about = "Client for the CodeCrate code execution service", version)]
pub struct Cli {
    /// Base URL of the execution service (overrides CODECRATE_API_URL).
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Initial language (py, cpp, java, js, go).
    #[arg(short = 'l', long, global = true)]
    pub language: Option<String>,

    /// Execute timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Disable coloured output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open the interactive editor (default).
    Tui,
    /// Execute a source file once and print its output.
    Run {
        /// Source file, or `-` for stdin. Defaults to the language template.
        #[arg(value_name = "FILE")]
        file: Option<String>,
    },
    /// Probe the service and report whether it is available.
    Health,
    /// List supported languages, locally and as advertised by the service.
    Languages,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
