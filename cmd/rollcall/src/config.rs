//! Configuration file loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rollcall_attendance::ServiceConfig;
use rollcall_ledger::LedgerConfig;
use rollcall_verify::EngineConfig;
use serde::Deserialize;

/// Default base directory name under the user's home.
pub const DEFAULT_BASE_DIR: &str = ".rollcall";

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default database filename.
pub const DEFAULT_DATABASE_FILE: &str = "rollcall.redb";

/// Configuration file format.
///
/// ```yaml
/// database: /var/lib/rollcall/rollcall.redb
/// files_dir: ./submissions
/// tokens: [$ROLLCALL_ADMIN_TOKEN]
/// faces:
///   identity_threshold: 60
/// handwriting:
///   sample_threshold: 80
///   aggregate: { kind: representative, index: 1 }
/// ledger:
///   prefix: rollcall
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Option<PathBuf>,

    /// Directory holding `{id}.reference.json` and `{id}.probe.json`.
    pub files_dir: Option<PathBuf>,

    /// Accepted caller tokens. `$VAR` and `${VAR}` are read from the
    /// environment.
    pub tokens: Vec<String>,

    pub faces: EngineConfig,

    pub handwriting: EngineConfig,

    pub ledger: LedgerConfig,
}

impl Config {
    /// Loads `path`, or the default config file when `path` is `None`.
    /// A missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_path(DEFAULT_CONFIG_FILE) {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut cfg: Self = serde_yaml::from_str(content)?;
        cfg.tokens = cfg
            .tokens
            .iter()
            .map(|t| expand_env(t))
            .filter(|t| !t.is_empty())
            .collect();
        Ok(cfg)
    }

    pub fn service(&self) -> ServiceConfig {
        ServiceConfig {
            faces: self.faces.clone(),
            handwriting: self.handwriting.clone(),
        }
    }

    /// Database path: `override_path`, then the config, then the default
    /// under the home directory.
    pub fn database_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(p) = override_path.or(self.database.as_deref()) {
            return Ok(p.to_path_buf());
        }
        default_path(DEFAULT_DATABASE_FILE)
            .ok_or_else(|| anyhow::anyhow!("could not find home directory; pass --db"))
    }

    pub fn files_dir(&self) -> PathBuf {
        self.files_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn default_path(file: &str) -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(file))
}

/// Expands `$VAR` or `${VAR}`; other strings are returned as is.
fn expand_env(s: &str) -> String {
    let Some(rest) = s.strip_prefix('$') else {
        return s.to_string();
    };
    let name = rest
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .unwrap_or(rest);
    std::env::var(name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_verify::{AggregatePolicy, Strategy};

    #[test]
    fn parse_full_config() {
        let cfg = Config::parse(
            r#"
database: /tmp/rc.redb
files_dir: ./subs
tokens: [abc, ""]
faces:
  strategy: distance
  identity_threshold: 55
handwriting:
  aggregate: { kind: representative, index: 1 }
ledger:
  prefix: school
"#,
        )
        .unwrap();

        assert_eq!(cfg.database.as_deref(), Some(Path::new("/tmp/rc.redb")));
        assert_eq!(cfg.files_dir(), PathBuf::from("./subs"));
        assert_eq!(cfg.tokens, ["abc"]);
        assert_eq!(cfg.faces.strategy, Strategy::Distance);
        assert_eq!(cfg.faces.identity_threshold, 55.0);
        assert_eq!(cfg.faces.sample_threshold, 80.0);
        assert_eq!(
            cfg.handwriting.aggregate,
            AggregatePolicy::Representative { index: 1 }
        );
        assert_eq!(cfg.ledger.prefix, "school");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = Config::parse("{}").unwrap();
        assert!(cfg.tokens.is_empty());
        assert_eq!(cfg.service(), ServiceConfig::default());
        assert_eq!(cfg.ledger, LedgerConfig::default());
    }

    #[test]
    fn database_override_wins() {
        let cfg = Config::parse("database: /a.redb").unwrap();
        let p = cfg.database_path(Some(Path::new("/b.redb"))).unwrap();
        assert_eq!(p, PathBuf::from("/b.redb"));
        assert_eq!(cfg.database_path(None).unwrap(), PathBuf::from("/a.redb"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tokens: [t1]\n").unwrap();
        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.tokens, ["t1"]);
    }

    #[test]
    fn expand_env_forms() {
        assert_eq!(expand_env("plain"), "plain");
        assert_eq!(expand_env("$ROLLCALL_TEST_SURELY_UNSET"), "");
        assert_eq!(expand_env("${ROLLCALL_TEST_SURELY_UNSET}"), "");
    }
}
