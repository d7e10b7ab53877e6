use clap::Parser;

/// Sandframe: renders untrusted HTML in sandboxed surfaces, driven by a host
/// over newline-delimited JSON on stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "sandframe", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run without a window, using in-memory surfaces.
    #[arg(long)]
    pub headless: bool,

    /// Start in development mode (blocked navigations request a reload).
    #[arg(long)]
    pub dev: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_windowed() {
        let args = Args::parse_from(["sandframe"]);
        assert!(!args.headless);
        assert!(!args.dev);
        assert!(args.config.is_none());
    }

    #[test]
    fn parses_all_flags() {
        let args = Args::parse_from([
            "sandframe",
            "--headless",
            "--dev",
            "--config",
            "/tmp/s.toml",
            "--log-level",
            "debug",
        ]);
        assert!(args.headless);
        assert!(args.dev);
        assert_eq!(args.config.as_deref(), Some("/tmp/s.toml"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }
}
