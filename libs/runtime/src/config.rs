use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment prefix for overrides, e.g. `USERS__DATABASE__URL=sqlite://other.db`.
pub const ENV_PREFIX: &str = "USERS__";

const DEFAULT_HOME_SUBDIR: &str = ".users";

/// Application configuration: typed global sections plus a per-module bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base directory for relative database and log paths.
    /// Empty means `$HOME/.users`; normalised to an absolute path on load.
    #[serde(default)]
    pub home_dir: String,
    pub database: DatabaseConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Per-module configuration bag: module name → arbitrary YAML/JSON value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite DSN, e.g. `sqlite://users.db?wal=true` or `sqlite::memory:`.
    pub url: String,
    /// Maximum number of pooled connections (defaults to 10).
    pub max_conns: Option<u32>,
    /// Busy timeout in milliseconds (defaults to 5000).
    pub busy_timeout_ms: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://database/users.db".to_string(),
            max_conns: Some(10),
            busy_timeout_ms: Some(5000),
        }
    }
}

/// Maps a tracing target (crate name) to its logging settings.
/// Key `default` is the catch-all for targets without their own section.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Section {
    /// "trace" | "debug" | "info" | "warn" | "error" | "off"
    pub console_level: String,
    /// Log file, relative to `home_dir` unless absolute. Empty disables file output.
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    /// Rotated files kept next to the live one.
    #[serde(default)]
    pub max_backups: Option<usize>,
    /// Size in MB after which the file is rotated.
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/users.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            database: DatabaseConfig::default(),
            logging: Some(default_logging_config()),
            modules: HashMap::new(),
        }
    }
}

/// Overrides coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub verbose: u8,
}

impl AppConfig {
    /// Layered load: defaults → YAML file → `USERS__*` environment variables.
    /// Normalises `home_dir` to an absolute path and creates it.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        Self::load_layered_with_env(config_path.as_ref(), ENV_PREFIX)
    }

    fn load_layered_with_env(config_path: &Path, env_prefix: &str) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // figment treats a missing YAML file as empty; a typo in --config must not go unnoticed.
        if !config_path.is_file() {
            bail!("config file not found: {}", config_path.display());
        }

        // Optional sections start as None so they stay None unless YAML/ENV provide them.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .with_context(|| format!("failed to parse config {}", config_path.display()))?;

        config.normalize_home_dir()?;
        Ok(config)
    }

    /// Load from file when given, otherwise use defaults. `home_dir` is normalised either way.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut config = Self::default();
                config.normalize_home_dir()?;
                Ok(config)
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    pub fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(url) = &overrides.database_url {
            self.database.url = url.clone();
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(section) = logging.get_mut("default") {
            match overrides.verbose {
                0 => {}
                1 => section.console_level = "debug".to_string(),
                _ => section.console_level = "trace".to_string(),
            }
        }
    }

    /// Typed view of `modules.<name>`; the type's default when the entry is absent.
    pub fn module_config<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(name) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("invalid configuration for module '{name}'")),
            None => Ok(T::default()),
        }
    }

    pub fn home_dir_path(&self) -> &Path {
        Path::new(&self.home_dir)
    }

    fn normalize_home_dir(&mut self) -> Result<()> {
        let home = dirs::home_dir();
        let mut resolved = expand_home_dir(&self.home_dir, home.as_deref())
            .context("home_dir normalization failed")?;
        if resolved.is_relative() {
            resolved = std::env::current_dir()?.join(resolved);
        }
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("failed to create home_dir {}", resolved.display()))?;
        self.home_dir = resolved.to_string_lossy().to_string();
        Ok(())
    }
}

/// Expand `~` and fill in the default location for an empty value.
fn expand_home_dir(raw: &str, user_home: Option<&Path>) -> Result<PathBuf> {
    let raw = raw.trim();
    let needs_home = raw.is_empty() || raw == "~" || raw.starts_with("~/");
    if !needs_home {
        return Ok(PathBuf::from(raw));
    }

    let Some(home) = user_home else {
        bail!("cannot resolve '~': user home directory is unknown");
    };
    Ok(match raw {
        "" => home.join(DEFAULT_HOME_SUBDIR),
        "~" => home.to_path_buf(),
        _ => home.join(&raw[2..]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct DemoModuleConfig {
        #[serde(default)]
        limit: u32,
    }

    #[test]
    fn test_default_config_structure() {
        let config = AppConfig::default();

        assert_eq!(config.home_dir, "");
        assert_eq!(config.database.url, "sqlite://database/users.db");
        assert_eq!(config.database.max_conns, Some(10));
        assert_eq!(config.database.busy_timeout_ms, Some(5000));

        let logging = config.logging.as_ref().unwrap();
        let default_section = &logging["default"];
        assert_eq!(default_section.console_level, "info");
        assert_eq!(default_section.file, "logs/users.log");
        assert!(config.modules.is_empty());
    }

    #[test]
    fn test_expand_home_dir() {
        let home = Path::new("/home/demo");
        assert_eq!(
            expand_home_dir("", Some(home)).unwrap(),
            PathBuf::from("/home/demo/.users")
        );
        assert_eq!(
            expand_home_dir("~/.custom", Some(home)).unwrap(),
            PathBuf::from("/home/demo/.custom")
        );
        assert_eq!(
            expand_home_dir("/srv/users", Some(home)).unwrap(),
            PathBuf::from("/srv/users")
        );
        assert!(expand_home_dir("~", None).is_err());
    }

    #[test]
    fn test_load_layered_reads_yaml() {
        let tmp = tempdir().unwrap();
        let home = tmp.path().join("home");
        let cfg_path = tmp.path().join("cfg.yaml");

        let yaml = format!(
            r#"
home_dir: "{}"
database:
  url: "sqlite://users.db?wal=true"
  max_conns: 4
logging:
  default:
    console_level: debug
    file: "logs/default.log"
modules:
  demo:
    limit: 7
"#,
            home.to_string_lossy().replace('\\', "/")
        );
        fs::write(&cfg_path, yaml).unwrap();

        let config = AppConfig::load_layered_with_env(&cfg_path, "USERS_TEST_YAML__").unwrap();

        assert!(Path::new(&config.home_dir).is_absolute());
        assert!(home.is_dir());
        assert_eq!(config.database.url, "sqlite://users.db?wal=true");
        assert_eq!(config.database.max_conns, Some(4));
        assert_eq!(config.database.busy_timeout_ms, Some(5000));

        let def = &config.logging.as_ref().unwrap()["default"];
        assert_eq!(def.console_level, "debug");
        assert_eq!(def.file, "logs/default.log");

        let demo: DemoModuleConfig = config.module_config("demo").unwrap();
        assert_eq!(demo, DemoModuleConfig { limit: 7 });
    }

    #[test]
    fn test_env_overrides_yaml() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        let yaml = format!(
            "home_dir: \"{}\"\ndatabase:\n  url: \"sqlite://from-yaml.db\"\n",
            tmp.path().to_string_lossy().replace('\\', "/")
        );
        fs::write(&cfg_path, yaml).unwrap();

        std::env::set_var("USERS_TEST_ENV__DATABASE__URL", "sqlite://from-env.db");
        let config = AppConfig::load_layered_with_env(&cfg_path, "USERS_TEST_ENV__").unwrap();
        std::env::remove_var("USERS_TEST_ENV__DATABASE__URL");

        assert_eq!(config.database.url, "sqlite://from-env.db");
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = AppConfig::load_layered("/nonexistent/users.yaml").unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        fs::write(&cfg_path, "database:\n  url: \"sqlite::memory:\"\n  pool: 3\n").unwrap();

        assert!(AppConfig::load_layered_with_env(&cfg_path, "USERS_TEST_UNKNOWN__").is_err());
    }

    #[test]
    fn test_missing_module_config_uses_default() {
        let config = AppConfig::default();
        let demo: DemoModuleConfig = config.module_config("demo").unwrap();
        assert_eq!(demo, DemoModuleConfig::default());
    }

    #[test]
    fn test_cli_overrides() {
        for (verbose, expected) in [(0, "info"), (1, "debug"), (2, "trace"), (5, "trace")] {
            let mut config = AppConfig::default();
            config.apply_cli_overrides(&CliOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                verbose,
            });

            assert_eq!(config.database.url, "sqlite::memory:");
            let section = &config.logging.as_ref().unwrap()["default"];
            assert_eq!(section.console_level, expected);
        }
    }

    #[test]
    fn test_to_yaml_roundtrip_basic() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("database:"));
        assert!(yaml.contains("logging:"));

        let roundtrip: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(roundtrip.database.url, config.database.url);
    }
}
