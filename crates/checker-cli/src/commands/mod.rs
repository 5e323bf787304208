pub mod flag;
pub mod record;

use std::path::Path;

use anyhow::{Context, bail};
use checker_core::CheckerConfig;
use checker_state::{LocalBackend, MemoryBackend, StateBackend};
use tracing::{info, warn};

/// Command-line values that take precedence over checker.toml.
#[derive(Debug, Default)]
pub struct Overrides {
    pub backend_root: Option<String>,
    pub start_time: Option<u64>,
    pub tick_duration: Option<String>,
}

/// Load checker.toml (or defaults) and apply command-line overrides.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<CheckerConfig> {
    let mut config = match path {
        Some(path) => CheckerConfig::from_file(path)?,
        None => CheckerConfig::default(),
    };

    if let Some(root) = &overrides.backend_root {
        config.backend.get_or_insert_with(Default::default).path = Some(root.clone());
    }
    if let Some(start_time) = overrides.start_time {
        config.competition.get_or_insert_with(Default::default).start_time = Some(start_time);
    }
    if let Some(tick_duration) = &overrides.tick_duration {
        config.competition.get_or_insert_with(Default::default).tick_duration =
            Some(tick_duration.clone());
    }

    Ok(config)
}

/// Build the backend selected by `[backend].kind`.
pub fn open_backend(config: &CheckerConfig) -> anyhow::Result<Box<dyn StateBackend>> {
    match config.backend_kind() {
        "local" => Ok(Box::new(LocalBackend::new(config.backend_root()))),
        "memory" => {
            warn!("memory backend starts empty and is discarded on exit");
            Ok(Box::new(MemoryBackend::new()))
        }
        other => bail!("Unsupported backend kind: {other}. Supported: local, memory"),
    }
}

/// Like [`open_backend`], but refuses backends that cannot outlive the process.
pub fn open_backend_for_write(config: &CheckerConfig) -> anyhow::Result<Box<dyn StateBackend>> {
    if config.backend_kind() == "memory" {
        bail!("memory backend discards records on exit; set [backend].kind = \"local\" to store");
    }
    open_backend(config)
}

/// Write a scaffold checker.toml into `path`.
pub fn init(path: &str, overrides: &Overrides) -> anyhow::Result<()> {
    let output = Path::new(path).join("checker.toml");
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    let root = overrides.backend_root.as_deref().unwrap_or("/var/lib/checker");
    let config = CheckerConfig::scaffold(root, overrides.start_time.unwrap_or(0));
    std::fs::write(&output, config.to_toml_string()?)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(path = %output.display(), "scaffold written");
    println!("✓ Generated {}", output.display());
    println!("  Set [flag].secret before deriving flags.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.toml");
        std::fs::write(
            &path,
            "[backend]\npath = \"/from/file\"\n\n[competition]\nstart_time = 5\ntick_duration = \"30s\"\n",
        )
        .unwrap();

        let overrides = Overrides {
            backend_root: Some("/from/cli".to_string()),
            start_time: Some(1000),
            tick_duration: None,
        };
        let config = load_config(Some(&path), &overrides).unwrap();

        assert_eq!(config.backend_root(), Path::new("/from/cli"));
        assert_eq!(config.start_time(), 1000);
        assert_eq!(config.tick_duration().unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn no_file_means_defaults() {
        let config = load_config(None, &Overrides::default()).unwrap();
        assert_eq!(config.backend_kind(), "local");
        assert_eq!(config.start_time(), 0);
    }

    #[test]
    fn unknown_backend_kind() {
        let config = CheckerConfig::parse("[backend]\nkind = \"s3\"\n").unwrap();
        let err = open_backend(&config).err().unwrap();
        assert!(err.to_string().contains("Unsupported backend kind: s3"), "{err}");
    }

    #[test]
    fn memory_backend_is_read_only_from_the_cli() {
        let config = CheckerConfig::parse("[backend]\nkind = \"memory\"\n").unwrap();
        assert!(open_backend(&config).is_ok());
        let err = open_backend_for_write(&config).err().unwrap();
        assert!(err.to_string().contains("discards records on exit"), "{err}");
    }

    #[test]
    fn init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let overrides = Overrides {
            backend_root: Some("/srv/state".to_string()),
            start_time: Some(1_700_000_000),
            tick_duration: None,
        };

        init(path, &overrides).unwrap();
        let written = CheckerConfig::from_file(&dir.path().join("checker.toml")).unwrap();
        assert_eq!(written.backend_root(), Path::new("/srv/state"));
        assert_eq!(written.start_time(), 1_700_000_000);

        assert!(init(path, &overrides).is_err());
    }
}
