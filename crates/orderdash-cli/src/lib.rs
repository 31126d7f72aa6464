//! Shared CLI definitions for orderdash.
//!
//! Used by the main application and by the build script (manpage).

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for orderdash
#[derive(Clone, Parser, Debug)]
#[command(
    name = "orderdash",
    version,
    about = "Delivery order dashboard in the terminal"
)]
pub struct Args {
    /// Path to the delivery order export (CSV). Not required with --init-config
    #[arg(required_unless_present = "init_config", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Aggregation page to start on: driver or route
    #[arg(long = "mode")]
    pub mode: Option<String>,

    /// Restrict the view to one driver (driver page) or route (route page)
    #[arg(long = "key")]
    pub key: Option<String>,

    /// Specify the delimiter to use when reading the file
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Write the default config file and exit
    #[arg(long = "init-config", action)]
    pub init_config: bool,

    /// Overwrite an existing config file (with --init-config)
    #[arg(long = "force", action)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_mode_and_key() {
        let args =
            Args::parse_from(["orderdash", "orders.csv", "--mode", "route", "--key", "CX12"]);
        assert_eq!(args.mode.as_deref(), Some("route"));
        assert_eq!(args.key.as_deref(), Some("CX12"));
        assert!(!args.init_config);
    }

    #[test]
    fn init_config_needs_no_path() {
        let args = Args::parse_from(["orderdash", "--init-config"]);
        assert!(args.init_config);
        assert!(args.path.is_none());
    }
}
