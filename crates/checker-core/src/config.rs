//! checker.toml configuration parser.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::flag::{
    DEFAULT_FLAG_PREFIX, DEFAULT_TICK_DURATION, FlagError, HmacFlagGenerator, check_tick_duration,
};
use crate::types::Timestamp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckerConfig {
    pub backend: Option<BackendConfig>,
    pub competition: Option<CompetitionConfig>,
    pub flag: Option<FlagConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// "local" or "memory".
    pub kind: Option<String>,
    /// Storage root for the local backend. Must already exist.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitionConfig {
    /// Unix timestamp (seconds) of tick 0.
    pub start_time: Option<Timestamp>,
    /// Tick length, e.g. "60s", "3m".
    pub tick_duration: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagConfig {
    pub prefix: Option<String>,
    /// Hex-encoded HMAC key.
    pub secret: Option<String>,
}

impl CheckerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Backend variant, defaulting to "local".
    pub fn backend_kind(&self) -> &str {
        self.backend
            .as_ref()
            .and_then(|b| b.kind.as_deref())
            .unwrap_or("local")
    }

    /// Storage root, defaulting to the OS temp directory.
    pub fn backend_root(&self) -> PathBuf {
        self.backend
            .as_ref()
            .and_then(|b| b.path.as_ref())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn start_time(&self) -> Timestamp {
        self.competition
            .as_ref()
            .and_then(|c| c.start_time)
            .unwrap_or(0)
    }

    /// Tick length, defaulting to 180s. Must be a positive whole number of seconds.
    pub fn tick_duration(&self) -> anyhow::Result<Duration> {
        let Some(raw) = self.competition.as_ref().and_then(|c| c.tick_duration.as_deref()) else {
            return Ok(DEFAULT_TICK_DURATION);
        };
        let duration =
            parse_duration(raw).ok_or_else(|| anyhow!("invalid tick_duration: {raw:?}"))?;
        check_tick_duration(duration).with_context(|| format!("invalid tick_duration: {raw:?}"))
    }

    pub fn flag_prefix(&self) -> &str {
        self.flag
            .as_ref()
            .and_then(|f| f.prefix.as_deref())
            .unwrap_or(DEFAULT_FLAG_PREFIX)
    }

    /// Decoded flag secret.
    pub fn secret(&self) -> anyhow::Result<Vec<u8>> {
        let raw = self
            .flag
            .as_ref()
            .and_then(|f| f.secret.as_deref())
            .ok_or(FlagError::MissingSecret)?;
        hex::decode(raw.trim()).context("flag secret is not valid hex")
    }

    /// Build the flag generator described by the `[flag]` section.
    pub fn flag_generator(&self) -> anyhow::Result<HmacFlagGenerator> {
        Ok(HmacFlagGenerator::new(self.secret()?).with_prefix(self.flag_prefix()))
    }

    /// Scaffold a checker.toml with every section filled in.
    pub fn scaffold(root: &str, start_time: Timestamp) -> Self {
        CheckerConfig {
            backend: Some(BackendConfig {
                kind: Some("local".to_string()),
                path: Some(root.to_string()),
            }),
            competition: Some(CompetitionConfig {
                start_time: Some(start_time),
                tick_duration: Some(format!("{}s", DEFAULT_TICK_DURATION.as_secs())),
            }),
            flag: Some(FlagConfig {
                prefix: Some(DEFAULT_FLAG_PREFIX.to_string()),
                secret: None,
            }),
        }
    }
}

/// Parse a duration like "500ms", "60s", "3m", or bare seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config = CheckerConfig::parse(
            r#"
[backend]
kind = "local"
path = "/srv/checker"

[competition]
start_time = 1000
tick_duration = "60s"

[flag]
prefix = "FAUST_"
secret = "00ff10"
"#,
        )
        .unwrap();

        assert_eq!(config.backend_kind(), "local");
        assert_eq!(config.backend_root(), PathBuf::from("/srv/checker"));
        assert_eq!(config.start_time(), 1000);
        assert_eq!(config.tick_duration().unwrap(), Duration::from_secs(60));
        assert_eq!(config.flag_prefix(), "FAUST_");
        assert_eq!(config.secret().unwrap(), vec![0x00, 0xff, 0x10]);
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = CheckerConfig::parse("").unwrap();
        assert_eq!(config.backend_kind(), "local");
        assert_eq!(config.backend_root(), std::env::temp_dir());
        assert_eq!(config.start_time(), 0);
        assert_eq!(config.tick_duration().unwrap(), DEFAULT_TICK_DURATION);
        assert_eq!(config.flag_prefix(), DEFAULT_FLAG_PREFIX);
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let config = CheckerConfig::parse("[flag]\nprefix = \"X_\"\n").unwrap();
        let err = config.flag_generator().unwrap_err();
        assert!(err.to_string().contains("secret"), "{err}");
    }

    #[test]
    fn test_bad_tick_duration() {
        let config = CheckerConfig::parse("[competition]\ntick_duration = \"soon\"\n").unwrap();
        assert!(config.tick_duration().is_err());
    }

    #[test]
    fn test_tick_duration_must_be_whole_seconds() {
        for raw in ["500ms", "1500ms", "0s", "0"] {
            let config =
                CheckerConfig::parse(&format!("[competition]\ntick_duration = \"{raw}\"\n"))
                    .unwrap();
            let err = config.tick_duration().unwrap_err();
            assert!(err.to_string().contains("invalid tick_duration"), "{raw}: {err}");
        }

        let config = CheckerConfig::parse("[competition]\ntick_duration = \"2000ms\"\n").unwrap();
        assert_eq!(config.tick_duration().unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_tick_duration_minutes_overflow() {
        let config =
            CheckerConfig::parse("[competition]\ntick_duration = \"307445734561825861m\"\n")
                .unwrap();
        let err = config.tick_duration().unwrap_err();
        assert!(err.to_string().contains("invalid tick_duration"), "{err}");
    }

    #[test]
    fn test_scaffold_round_trips() {
        let config = CheckerConfig::scaffold("/var/lib/checker", 1_700_000_000);
        let toml_str = config.to_toml_string().unwrap();
        let parsed = CheckerConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.backend_root(), PathBuf::from("/var/lib/checker"));
        assert_eq!(parsed.start_time(), 1_700_000_000);
        assert_eq!(parsed.tick_duration().unwrap(), DEFAULT_TICK_DURATION);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.toml");
        std::fs::write(&path, "[competition]\nstart_time = 42\n").unwrap();
        let config = CheckerConfig::from_file(&path).unwrap();
        assert_eq!(config.start_time(), 42);
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("60s"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("3m"), Some(Duration::from_secs(180)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("ten"), None);
        assert_eq!(parse_duration("307445734561825861m"), None);
    }
}
