use crate::config::DEFAULT_CONFIG_FILE;
use clap::Parser;
use std::path::PathBuf;

/// adb-cleaner - remove unwanted Android packages over adb
#[derive(Parser, Debug)]
#[command(name = "adb-cleaner")]
#[command(about = "Interactively select and uninstall Android packages through adb")]
#[command(version)]
pub struct Cli {
    /// Configuration file (JSON). Missing files fall back to defaults.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Start with simulate-only mode on: the batch logs what it would
    /// remove without touching the device. Can be toggled on the confirm
    /// screen.
    #[arg(long)]
    pub dry_run: bool,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    pub write_config: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["adb-cleaner"]).expect("parse");
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(!cli.dry_run);
        assert!(!cli.write_config);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "adb-cleaner",
            "--config",
            "/tmp/cleaner.json",
            "--dry-run",
            "--write-config",
        ])
        .expect("parse");
        assert_eq!(cli.config, PathBuf::from("/tmp/cleaner.json"));
        assert!(cli.dry_run);
        assert!(cli.write_config);
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["adb-cleaner", "--force"]).is_err());
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
