//! # Database Migration System
//!
//! Discovers `YYYYMMDDHHMMSS_description.sql` files in the configured directory
//! and applies the ones not yet recorded in `feedback_schema_migrations`.
//!
//! Several service replicas may boot at once, so the whole run happens under a
//! PostgreSQL advisory lock:
//!
//! ```sql
//! SELECT pg_advisory_lock(7310485920114455)
//! ```

use sqlx::{PgPool, Row};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MIGRATION_LOCK_KEY: i64 = 7_310_485_920_114_455;

/// Represents a single database migration file.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version timestamp (YYYYMMDDHHMMSS format)
    pub version: String,
    /// Human-readable migration name
    pub name: String,
    pub path: PathBuf,
}

pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Apply every outstanding migration from `migrations_dir`, returning how many ran
    pub async fn run_all(pool: &PgPool, migrations_dir: &Path) -> Result<usize, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(pool)
            .await?;

        let result = Self::run_outstanding_migrations(pool, migrations_dir).await;

        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(pool)
            .await?;

        result
    }

    async fn run_outstanding_migrations(
        pool: &PgPool,
        migrations_dir: &Path,
    ) -> Result<usize, sqlx::Error> {
        Self::ensure_migration_table(pool).await?;

        let migrations = Self::discover_migrations(migrations_dir)?;
        let applied = Self::get_applied_migrations(pool).await?;
        let mut count = 0;

        for migration in migrations.values() {
            if applied.contains(&migration.version) {
                debug!(version = %migration.version, "Migration already applied");
                continue;
            }
            info!(
                version = %migration.version,
                name = %migration.name,
                "Applying migration"
            );
            Self::run_migration(pool, &migration.path).await?;
            Self::record_migration(pool, &migration.version).await?;
            count += 1;
        }

        Ok(count)
    }

    /// Discover all migration files in `migrations_dir`, ordered by version
    pub fn discover_migrations(
        migrations_dir: &Path,
    ) -> Result<BTreeMap<String, Migration>, sqlx::Error> {
        if !migrations_dir.exists() {
            return Ok(BTreeMap::new());
        }

        let mut migrations = BTreeMap::new();

        for entry in fs::read_dir(migrations_dir).map_err(sqlx::Error::Io)? {
            let entry = entry.map_err(sqlx::Error::Io)?;
            let path = entry.path();

            if path.is_file() && path.extension().map(|s| s == "sql").unwrap_or(false) {
                if let Some(filename) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Some((version, name)) = Self::parse_migration_filename(filename) {
                        migrations.insert(
                            version.clone(),
                            Migration {
                                version,
                                name,
                                path,
                            },
                        );
                    }
                }
            }
        }

        Ok(migrations)
    }

    /// Parse `YYYYMMDDHHMMSS_migration_name` into version and readable name
    pub fn parse_migration_filename(filename: &str) -> Option<(String, String)> {
        if filename.len() < 15 || !filename.is_char_boundary(14) {
            return None;
        }

        let (version_part, name_part) = filename.split_at(14);

        if !version_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let name = name_part
            .strip_prefix('_')
            .unwrap_or(name_part)
            .replace('_', " ");

        Some((version_part.to_string(), name))
    }

    async fn ensure_migration_table(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(
            r#"
            CREATE TABLE IF NOT EXISTS feedback_schema_migrations (
                version VARCHAR(14) PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn get_applied_migrations(pool: &PgPool) -> Result<HashSet<String>, sqlx::Error> {
        let rows = sqlx::query("SELECT version FROM feedback_schema_migrations")
            .fetch_all(pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("version"))
            .collect())
    }

    async fn record_migration(pool: &PgPool, version: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO feedback_schema_migrations (version) VALUES ($1)")
            .bind(version)
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn run_migration(pool: &PgPool, migration_path: &Path) -> Result<(), sqlx::Error> {
        let sql = fs::read_to_string(migration_path).map_err(sqlx::Error::Io)?;
        sqlx::raw_sql(&sql).execute(pool).await?;
        Ok(())
    }
}
