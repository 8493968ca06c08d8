use anyhow::{anyhow, Context, Result};
use runtime::DatabaseConfig;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_DSN: &str = "sqlite://database/eventsync.db";
const MEMORY_DSN: &str = "sqlite::memory:";
const DEFAULT_MAX_CONNS: u32 = 10;
const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

/// Only SQLite is compiled in; anything else is a configuration error.
pub fn validate_dsn(dsn: &str) -> Result<()> {
    let raw = dsn.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match url.scheme() {
        "sqlite" => Ok(()),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes.
/// - Adds `mode=rwc` so a missing database file is created.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if let Some(dir) = p.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) if q.contains("mode=") => {
            out.push('?');
            out.push_str(q);
        }
        Some(q) => {
            out.push_str("?mode=rwc&");
            out.push_str(q);
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

pub async fn connect(cfg: Option<&DatabaseConfig>, base_dir: &Path) -> Result<DatabaseConnection> {
    let (dsn, max_conns, busy_timeout_ms) = match cfg {
        Some(c) => (
            c.url.trim().to_owned(),
            c.max_conns.unwrap_or(DEFAULT_MAX_CONNS),
            c.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        ),
        None => {
            tracing::warn!("No database configuration found, using {}", DEFAULT_DSN);
            (
                DEFAULT_DSN.to_string(),
                DEFAULT_MAX_CONNS,
                DEFAULT_BUSY_TIMEOUT_MS,
            )
        }
    };
    validate_dsn(&dsn)?;
    let dsn = absolutize_sqlite_dsn(&dsn, base_dir)?;

    let busy_timeout = Duration::from_millis(u64::from(busy_timeout_ms));
    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(max_conns)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false)
        .map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy_timeout));

    tracing::info!("Connecting to database: {}", dsn);
    let conn = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to {}", dsn))?;
    tracing::info!("Connected DB backend: {:?}", conn.get_database_backend());
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_dsn_is_kept() {
        let base = Path::new("/srv/eventsync");
        assert_eq!(absolutize_sqlite_dsn("sqlite::memory:", base).unwrap(), MEMORY_DSN);
        assert_eq!(absolutize_sqlite_dsn("sqlite://:memory:", base).unwrap(), MEMORY_DSN);
    }

    #[test]
    fn relative_dsn_is_placed_under_base_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dsn = absolutize_sqlite_dsn("sqlite://database/app.db", tmp.path()).unwrap();

        let expected = tmp.path().join("database/app.db");
        assert_eq!(
            dsn,
            format!("sqlite://{}?mode=rwc", expected.to_string_lossy().replace('\\', "/"))
        );
        assert!(tmp.path().join("database").is_dir());
    }

    #[test]
    fn explicit_mode_is_preserved() {
        let tmp = tempfile::tempdir().unwrap();
        let dsn = absolutize_sqlite_dsn("sqlite://a.db?mode=ro", tmp.path()).unwrap();
        assert!(dsn.ends_with("a.db?mode=ro"));

        let dsn = absolutize_sqlite_dsn("sqlite://a.db?cache=shared", tmp.path()).unwrap();
        assert!(dsn.ends_with("a.db?mode=rwc&cache=shared"));
    }

    #[test]
    fn non_sqlite_dsn_is_rejected() {
        assert!(validate_dsn("sqlite::memory:").is_ok());
        assert!(validate_dsn("sqlite://database/eventsync.db").is_ok());

        let err = validate_dsn("postgresql://localhost/db").unwrap_err();
        assert!(err.to_string().contains("Unsupported database type"));
        assert!(validate_dsn("  ").is_err());
    }
}
