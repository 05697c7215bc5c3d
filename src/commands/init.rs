//! Init command implementation

use crate::config::{Config, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use crate::store::TargetDb;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub force: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            config_path: PathBuf::from(CONFIG_FILE_NAME),
            force: false,
        }
    }
}

/// What init created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitReport {
    pub config_path: String,
    pub target_db: String,
    pub overwritten: bool,
}

/// Write a default config file and create the target schema
pub async fn cmd_init(options: InitOptions) -> Result<InitReport> {
    let InitOptions {
        base_dir,
        config_path,
        force,
    } = options;

    let overwritten = config_path.exists();
    if overwritten && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.paths.base_dir = base_dir;
    config.paths.config_file = config_path.clone();
    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config_path);

    let db_path = config.target_db_path();
    let db = TargetDb::open(&db_path).await?;
    db.init_schema().await?;
    db.close().await;
    info!("Created database at {:?}", db_path);

    Ok(InitReport {
        config_path: config_path.display().to_string(),
        target_db: db_path.display().to_string(),
        overwritten,
    })
}

/// Print init results
pub fn print_init_report(report: &InitReport) {
    let verb = if report.overwritten {
        "Overwrote"
    } else {
        "Created"
    };
    println!("\n✓ {} config: {}", verb, report.config_path);
    println!("✓ Target database ready: {}", report.target_db);
    println!("\nNext steps:");
    println!("  mtb import-history     # import history from the legacy database");
    println!("  mtb populate-media     # register files under the media folder");
    println!("  mtb check-db           # verify table counts");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(tmp: &TempDir, force: bool) -> InitOptions {
        InitOptions {
            base_dir: tmp.path().to_path_buf(),
            config_path: tmp.path().join(CONFIG_FILE_NAME),
            force,
        }
    }

    #[tokio::test]
    async fn test_init_creates_config_and_schema() {
        let tmp = TempDir::new().unwrap();
        let report = cmd_init(options(&tmp, false)).await.unwrap();
        assert!(!report.overwritten);

        let config = Config::load(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.target_db_path(), tmp.path().join("db.sqlite3"));

        let db = TargetDb::open(&config.target_db_path()).await.unwrap();
        assert!(db.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        cmd_init(options(&tmp, false)).await.unwrap();

        let err = cmd_init(options(&tmp, false)).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let report = cmd_init(options(&tmp, true)).await.unwrap();
        assert!(report.overwritten);
    }
}
