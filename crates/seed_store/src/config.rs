use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sea_orm::ConnectOptions;
use serde::{Deserialize, Serialize};

use clipdeck_seed_core::{
    AssetResolver, DEFAULT_OWNER_USER_IDS, DEFAULT_OWNER_VIDEO_IDS, KeyRange, SeedError,
    SeedResult,
};

pub const CONFIG_FILE: &str = "clipdeck.json";
pub const SQLITE_FILE: &str = "clipdeck.sqlite";

/// Target database, tagged by `backend` in the config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// `path` is relative to the datastore directory unless absolute.
    Sqlite { path: Option<String> },
    Postgres { url: String },
    Mysql { url: String },
}

impl DatabaseConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
            DatabaseConfig::Mysql { .. } => "mysql",
        }
    }

    /// Database file for the SQLite backend; `None` for server backends.
    pub fn sqlite_path(&self, base_dir: &Path) -> Option<PathBuf> {
        let DatabaseConfig::Sqlite { path } = self else {
            return None;
        };
        let file = PathBuf::from(path.as_deref().unwrap_or(SQLITE_FILE));
        Some(if file.is_absolute() {
            file
        } else {
            base_dir.join(file)
        })
    }

    pub fn url(&self, base_dir: &Path) -> String {
        match self {
            DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => url.clone(),
            DatabaseConfig::Sqlite { .. } => {
                let path = self
                    .sqlite_path(base_dir)
                    .unwrap_or_else(|| base_dir.join(SQLITE_FILE));
                format!("sqlite://{}?mode=rwc", path.display())
            }
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

impl PoolConfig {
    pub(crate) fn apply_to(&self, options: &mut ConnectOptions) {
        if let Some(max) = self.max_connections {
            options.max_connections(max);
        }
        if let Some(min) = self.min_connections {
            options.min_connections(min);
        }
        if let Some(ms) = self.connect_timeout_ms {
            options.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.acquire_timeout_ms {
            options.acquire_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.idle_timeout_ms {
            options.idle_timeout(Duration::from_millis(ms));
        }
    }
}

/// Where relative asset paths resolve to. `base_url` wins over `cloudinary_cloud`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssetConfig {
    pub base_url: Option<String>,
    pub cloudinary_cloud: Option<String>,
}

impl AssetConfig {
    pub fn resolver(&self) -> Option<AssetResolver> {
        if let Some(base) = &self.base_url {
            return Some(AssetResolver::new(base.clone()));
        }
        self.cloudinary_cloud
            .as_deref()
            .map(AssetResolver::cloudinary)
    }
}

/// Pipeline tuning. Absent fields take their defaults one by one.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub chunk_size: usize,
    pub owner_user_ids: KeyRange,
    pub owner_video_ids: KeyRange,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1,
            owner_user_ids: DEFAULT_OWNER_USER_IDS,
            owner_video_ids: DEFAULT_OWNER_VIDEO_IDS,
        }
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> SeedResult<()> {
        if self.chunk_size == 0 {
            return Err(SeedError::invalid("reconcile.chunk_size must be at least 1"));
        }
        for (name, range) in [
            ("owner_user_ids", self.owner_user_ids),
            ("owner_video_ids", self.owner_video_ids),
        ] {
            if range.is_empty() {
                return Err(SeedError::invalid(format!(
                    "reconcile.{name} is empty: [{}, {})",
                    range.start, range.end
                )));
            }
        }
        Ok(())
    }
}

/// Contents of `clipdeck.json` in a datastore directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedConfig {
    pub database: DatabaseConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolConfig>,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl SeedConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            assets: AssetConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }

    /// Reads the config in `base_dir`, first writing a SQLite default there if
    /// none exists. The default keeps the database file next to the config.
    pub fn load_or_init(base_dir: &Path) -> SeedResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| SeedError::storage(format!("create config dir: {err}")))?;
        let path = base_dir.join(CONFIG_FILE);
        let config = match read_config(&path)? {
            Some(config) => config,
            None => {
                let config = SeedConfig::default_sqlite(SQLITE_FILE);
                write_config(&path, &config)?;
                log::info!("wrote default config to {}", path.display());
                config
            }
        };
        config.reconcile.validate()?;
        Ok(config)
    }
}

fn read_config(path: &Path) -> SeedResult<Option<SeedConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| SeedError::storage(format!("read config: {err}")))?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| SeedError::invalid(format!("{}: {err}", path.display())))
}

fn write_config(path: &Path, config: &SeedConfig) -> SeedResult<()> {
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| SeedError::storage(format!("serialize config: {err}")))?;
    fs::write(path, payload).map_err(|err| SeedError::storage(format!("write config: {err}")))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{AssetConfig, CONFIG_FILE, DatabaseConfig, SQLITE_FILE, SeedConfig};
    use clipdeck_seed_core::{KeyRange, SeedError};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn base_url_wins_over_cloud_name() {
        let assets = AssetConfig {
            base_url: Some("https://cdn.example.com".into()),
            cloudinary_cloud: Some("ignored".into()),
        };
        let resolver = assets.resolver().expect("resolver");
        assert_eq!(resolver.base(), "https://cdn.example.com");

        let cloud_only = AssetConfig {
            base_url: None,
            cloudinary_cloud: Some("clipdeck".into()),
        };
        assert_eq!(
            cloud_only.resolver().expect("resolver").base(),
            "https://res.cloudinary.com/clipdeck"
        );
        assert!(AssetConfig::default().resolver().is_none());
    }

    #[test]
    fn partial_reconcile_section_falls_back_per_field() {
        let config: SeedConfig = serde_json::from_value(json!({
            "database": { "backend": "sqlite" },
            "reconcile": { "chunk_size": 8, "owner_video_ids": { "start": 10, "end": 12 } }
        }))
        .expect("config");
        assert_eq!(config.reconcile.chunk_size, 8);
        assert_eq!(config.reconcile.owner_user_ids, KeyRange::new(164, 179));
        assert_eq!(config.reconcile.owner_video_ids, KeyRange::new(10, 12));
        assert!(config.assets.resolver().is_none());
    }

    #[test]
    fn first_load_writes_a_relocatable_default() {
        let dir = tempdir().expect("tempdir");
        let config = SeedConfig::load_or_init(dir.path()).expect("first load");
        assert!(dir.path().join(CONFIG_FILE).exists());
        assert_eq!(config.database.backend_name(), "sqlite");

        // The stored path is relative, so a moved directory keeps its database.
        let moved = tempdir().expect("moved");
        fs::copy(
            dir.path().join(CONFIG_FILE),
            moved.path().join(CONFIG_FILE),
        )
        .expect("copy config");
        let reloaded = SeedConfig::load_or_init(moved.path()).expect("reload");
        assert_eq!(
            reloaded.database.sqlite_path(moved.path()),
            Some(moved.path().join(SQLITE_FILE))
        );
    }

    #[test]
    fn invalid_reconcile_section_is_rejected_at_load() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE),
            json!({
                "database": { "backend": "sqlite" },
                "reconcile": { "owner_user_ids": { "start": 5, "end": 5 } }
            })
            .to_string(),
        )
        .expect("write config");
        let err = SeedConfig::load_or_init(dir.path()).unwrap_err();
        assert!(
            matches!(err, SeedError::Validation { ref message } if message.contains("owner_user_ids"))
        );
    }

    #[test]
    fn server_urls_pass_through_and_sqlite_paths_resolve() {
        let base = Path::new("/srv/clipdeck");
        let postgres = DatabaseConfig::Postgres {
            url: "postgres://seed@localhost/clipdeck".into(),
        };
        assert_eq!(postgres.url(base), "postgres://seed@localhost/clipdeck");
        assert_eq!(postgres.sqlite_path(base), None);

        let absolute = DatabaseConfig::Sqlite {
            path: Some("/tmp/seed.sqlite".into()),
        };
        assert_eq!(absolute.url(base), "sqlite:///tmp/seed.sqlite?mode=rwc");
        let defaulted = DatabaseConfig::Sqlite { path: None };
        assert_eq!(
            defaulted.url(base),
            "sqlite:///srv/clipdeck/clipdeck.sqlite?mode=rwc"
        );
    }
}
