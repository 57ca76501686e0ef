use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "placar")]
#[command(about = "Live scoreboard for matches streamed over server-sent events")]
#[command(version)]
pub struct Cli {
    /// Directory holding config/ (and defaults/); defaults to the working directory
    #[arg(long, value_name = "PATH")]
    pub config_dir: Option<PathBuf>,

    /// Override `server.base_url` from the config file
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments() {
        let cli = Cli::try_parse_from(["placar"]).unwrap();
        assert!(cli.config_dir.is_none());
        assert!(cli.base_url.is_none());
    }

    #[test]
    fn both_overrides() {
        let cli = Cli::try_parse_from([
            "placar",
            "--config-dir",
            "/etc/placar",
            "--base-url",
            "http://scores:8585/consumer/api",
        ])
        .unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/etc/placar")));
        assert_eq!(cli.base_url.as_deref(), Some("http://scores:8585/consumer/api"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["placar", "--port", "1"]).is_err());
    }
}
