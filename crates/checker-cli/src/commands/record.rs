//! `checkerctl meta|blob|ident` — inspect and seed stored checker state.

use std::path::Path;

use anyhow::{Context, bail};
use checker_core::{CheckerConfig, ServiceId, TeamId, Tick};
use checker_state::{Identifier, MetadataRecord, StateBackend, StoreOutcome};
use tracing::warn;

use super::{open_backend, open_backend_for_write};

pub fn meta_put(config: &CheckerConfig, id: &str, file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let record: MetadataRecord = serde_yaml::from_str(&text)
        .with_context(|| format!("{} is not a YAML mapping", file.display()))?;
    let backend = open_backend_for_write(config)?;
    report_store(store_metadata(backend.as_ref(), id, &record)?, id)
}

pub fn meta_get(config: &CheckerConfig, id: &str) -> anyhow::Result<()> {
    let backend = open_backend(config)?;
    match retrieve_metadata_yaml(backend.as_ref(), id)? {
        Some(yaml) => print!("{yaml}"),
        None => eprintln!("no metadata stored for {id}"),
    }
    Ok(())
}

pub fn blob_put(config: &CheckerConfig, id: &str, file: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let backend = open_backend_for_write(config)?;
    let id = Identifier::new(id)?;
    report_store(backend.store_blob(&id, &bytes)?, id.as_str())
}

pub fn blob_get(config: &CheckerConfig, id: &str, out: Option<&Path>) -> anyhow::Result<()> {
    let backend = open_backend(config)?;
    let id = Identifier::new(id)?;
    let Some(bytes) = backend.retrieve_blob(&id)? else {
        eprintln!("no blob stored for {id}");
        return Ok(());
    };

    match out {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("✓ Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => println!("{}", hex::encode(&bytes)),
    }
    Ok(())
}

pub fn ident(team: u32, service: u32, tick: Tick, purpose: &str) -> anyhow::Result<()> {
    let id = Identifier::for_tick(TeamId(team), ServiceId(service), tick, purpose)?;
    println!("{id}");
    Ok(())
}

fn store_metadata(
    backend: &dyn StateBackend,
    id: &str,
    record: &MetadataRecord,
) -> anyhow::Result<StoreOutcome> {
    let id = Identifier::new(id)?;
    Ok(backend.store_metadata(&id, record)?)
}

/// The stored metadata for `id` rendered back to YAML.
fn retrieve_metadata_yaml(backend: &dyn StateBackend, id: &str) -> anyhow::Result<Option<String>> {
    let id = Identifier::new(id)?;
    match backend.retrieve_metadata(&id)? {
        Some(record) => Ok(Some(serde_yaml::to_string(&record)?)),
        None => Ok(None),
    }
}

fn report_store(outcome: StoreOutcome, id: &str) -> anyhow::Result<()> {
    match outcome {
        StoreOutcome::Stored { bytes } => {
            println!("✓ Stored {bytes} bytes for {id}");
            Ok(())
        }
        StoreOutcome::NotStored => {
            warn!(%id, "backend root does not exist");
            bail!("nothing stored for {id}: backend root does not exist")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checker_core::config::BackendConfig;
    use checker_state::LocalBackend;

    fn local_config(root: &Path) -> CheckerConfig {
        CheckerConfig {
            backend: Some(BackendConfig {
                kind: Some("local".to_string()),
                path: Some(root.display().to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn meta_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());
        let input = dir.path().join("input.yaml");
        std::fs::write(&input, "planted: true\nseed: 42\n").unwrap();

        meta_put(&config, "teamA-svc1-tick3", &input).unwrap();

        let backend = LocalBackend::new(dir.path());
        let yaml = retrieve_metadata_yaml(&backend, "teamA-svc1-tick3")
            .unwrap()
            .unwrap();
        let back: MetadataRecord = serde_yaml::from_str(&yaml).unwrap();
        let original: MetadataRecord = serde_yaml::from_str("planted: true\nseed: 42\n").unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn meta_get_absent_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());
        meta_get(&config, "never-written").unwrap();
        assert!(
            retrieve_metadata_yaml(&LocalBackend::new(dir.path()), "never-written")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn meta_put_rejects_non_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());
        let input = dir.path().join("list.yaml");
        std::fs::write(&input, "- a\n- b\n").unwrap();
        assert!(meta_put(&config, "x", &input).is_err());
    }

    #[test]
    fn blob_put_then_get_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());
        let input = dir.path().join("artifact.bin");
        let out = dir.path().join("copy.bin");
        std::fs::write(&input, b"\x00\x01binary\xff").unwrap();

        blob_put(&config, "team1-svc1-tick1-img", &input).unwrap();
        blob_get(&config, "team1-svc1-tick1-img", Some(out.as_path())).unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"\x00\x01binary\xff");
    }

    #[test]
    fn blob_put_missing_root_fails_without_creating_it() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let config = local_config(&missing);
        let input = dir.path().join("data.bin");
        std::fs::write(&input, b"data").unwrap();

        let err = blob_put(&config, "x", &input).unwrap_err();
        assert!(err.to_string().contains("backend root does not exist"), "{err}");
        assert!(!missing.exists());
    }

    #[test]
    fn put_refuses_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = CheckerConfig {
            backend: Some(BackendConfig {
                kind: Some("memory".to_string()),
                path: None,
            }),
            ..Default::default()
        };
        let input = dir.path().join("input.yaml");
        std::fs::write(&input, "planted: true\n").unwrap();

        let err = meta_put(&config, "teamA-svc1-tick3", &input).unwrap_err();
        assert!(err.to_string().contains("discards records on exit"), "{err}");
        assert!(blob_put(&config, "teamA-svc1-tick3", &input).is_err());
        meta_get(&config, "teamA-svc1-tick3").unwrap();
    }

    #[test]
    fn unsafe_identifier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());
        assert!(blob_get(&config, "../etc/passwd", None).is_err());
    }

    #[test]
    fn ident_rejects_bad_purpose() {
        assert!(ident(1, 2, 3, "ok").is_ok());
        assert!(ident(1, 2, 3, "no/slash").is_err());
    }
}
