use clap::Parser;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "FieldTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime configuration from flags or environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "fieldtrack")]
#[command(about = "Field visit logging, medicine catalog and approvals for medical representatives")]
#[command(version)]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "FIELDTRACK_DB", default_value = "fieldtrack.db")]
    pub db: PathBuf,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, env = "FIELDTRACK_LOG", default_value = "fieldtrack.log")]
    pub log_file: PathBuf,

    /// Insert demo representatives, doctors, medicines and visits if none exist
    #[arg(long)]
    pub seed_demo: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_override_defaults() {
        let config = Config::try_parse_from([
            "fieldtrack",
            "--db",
            "/tmp/visits.db",
            "--log-file",
            "/tmp/ft.log",
            "--seed-demo",
        ])
        .unwrap();
        assert_eq!(config.db, PathBuf::from("/tmp/visits.db"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/ft.log"));
        assert!(config.seed_demo);
    }

    #[test]
    fn seed_demo_is_off_by_default() {
        let config = Config::try_parse_from(["fieldtrack"]).unwrap();
        assert!(!config.seed_demo);
    }

    #[test]
    fn app_name_is_fieldtrack() {
        assert_eq!(APP_NAME, "FieldTrack");
    }
}
