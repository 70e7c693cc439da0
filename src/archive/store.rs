use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use regex::Regex;
use serde::Deserialize;

use super::ArchiveError;
use crate::models::{ArchiveInfo, ArchiveManifest};

/// Only names produced by the writer are ever touched. Validating against
/// this before any filesystem access blocks path traversal.
static ARCHIVE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^audit_archive_[a-z0-9_]+_\d{8}_\d{6}\.(json|csv)(\.gz)?$")
        .unwrap_or_else(|e| unreachable!("invalid archive name pattern: {e}"))
});

#[derive(Deserialize)]
struct ManifestHeader {
    manifest: ArchiveManifest,
}

/// Lists, serves, and age-purges archive files.
pub struct ArchiveStore {
    dir: PathBuf,
}

impl ArchiveStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Reject anything that does not match the writer's naming convention.
    pub fn validate_name(name: &str) -> Result<(), ArchiveError> {
        if ARCHIVE_NAME.is_match(name) {
            Ok(())
        } else {
            Err(ArchiveError::InvalidName(name.to_string()))
        }
    }

    /// Scan the archive directory. JSON manifests are parsed for action and
    /// record count; everything else falls back to file metadata.
    pub fn list(&self) -> Result<Vec<ArchiveInfo>, ArchiveError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut archives = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if Self::validate_name(&name).is_err() {
                continue;
            }

            let metadata = entry.metadata()?;
            let manifest = read_manifest(&entry.path(), &name);
            archives.push(ArchiveInfo {
                size_bytes: metadata.len(),
                modified: metadata.modified()?.into(),
                action: manifest.as_ref().map(|m| m.action.clone()),
                log_count: manifest.as_ref().map(|m| m.log_count),
                name,
            });
        }

        archives.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(archives)
    }

    /// Read an archive file by name. The name is validated before any
    /// filesystem access.
    pub fn read(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        Self::validate_name(name)?;
        match fs::read(self.dir.join(name)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArchiveError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete archives whose filesystem modification time is before
    /// `cutoff`. Works from file metadata, not manifest content, so a
    /// corrupt manifest never blocks purging. Returns the removed count.
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, ArchiveError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if Self::validate_name(&name).is_err() {
                continue;
            }

            let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
            if modified < cutoff {
                fs::remove_file(entry.path())?;
                removed += 1;
                tracing::debug!(name = %name, modified = %modified, "Purged expired archive");
            }
        }

        if removed > 0 {
            tracing::info!(removed = removed, cutoff = %cutoff, "Purged expired archives");
        }
        Ok(removed)
    }

    /// MIME type for a validated archive name.
    pub fn content_type(name: &str) -> &'static str {
        if name.ends_with(".gz") {
            "application/gzip"
        } else if name.ends_with(".csv") {
            "text/csv"
        } else {
            "application/json"
        }
    }
}

/// Best-effort manifest parse for listings. CSV archives carry no embedded
/// manifest and corrupt JSON is tolerated; both simply return None.
fn read_manifest(path: &Path, name: &str) -> Option<ArchiveManifest> {
    if !name.contains(".json") {
        return None;
    }

    let bytes = fs::read(path).ok()?;
    let bytes = if name.ends_with(".gz") {
        let mut decompressed = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut decompressed)
            .ok()?;
        decompressed
    } else {
        bytes
    };

    serde_json::from_slice::<ManifestHeader>(&bytes)
        .ok()
        .map(|h| h.manifest)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::{
        archive::ArchiveWriter,
        config::{ArchiveConfig, ArchiveFormat},
        models::AuditLog,
    };

    fn record(action: &str) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            action: action.to_string(),
            message: "event".to_string(),
            created_at: Utc::now() - Duration::days(40),
            ip_address: None,
        }
    }

    fn write_archive(dir: &Path, format: ArchiveFormat, compress: bool) -> PathBuf {
        let writer = ArchiveWriter::new(ArchiveConfig {
            path: dir.to_path_buf(),
            format,
            compress,
            ..Default::default()
        });
        writer
            .write("BOOK_VIEWED", &[record("BOOK_VIEWED")], Utc::now())
            .unwrap()
    }

    #[test]
    fn validate_name_accepts_writer_output() {
        for name in [
            "audit_archive_book_viewed_20260823_143005.json",
            "audit_archive_book_viewed_20260823_143005.csv",
            "audit_archive_book_viewed_20260823_143005.json.gz",
            "audit_archive_a1_20260823_143005.csv.gz",
        ] {
            ArchiveStore::validate_name(name).unwrap();
        }
    }

    #[test]
    fn validate_name_blocks_traversal() {
        for name in [
            "../etc/passwd",
            "..",
            "audit_archive_x_20260823_143005.json/../../secret",
            "audit_archive_X_20260823_143005.json",
            "audit_archive_x_2026_143005.json",
            "audit_archive_x_20260823_143005.exe",
            "notes.txt",
            "",
        ] {
            assert!(
                ArchiveStore::validate_name(name).is_err(),
                "should reject {name:?}"
            );
        }
    }

    #[test]
    fn list_parses_json_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), ArchiveFormat::Json, false);
        let store = ArchiveStore::new(dir.path().to_path_buf());

        let archives = store.list().unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].action.as_deref(), Some("BOOK_VIEWED"));
        assert_eq!(archives[0].log_count, Some(1));
        assert!(archives[0].size_bytes > 0);
    }

    #[test]
    fn list_parses_gzipped_json_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), ArchiveFormat::Json, true);
        let store = ArchiveStore::new(dir.path().to_path_buf());

        let archives = store.list().unwrap();
        assert_eq!(archives[0].log_count, Some(1));
    }

    #[test]
    fn list_csv_falls_back_to_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), ArchiveFormat::Csv, false);
        let store = ArchiveStore::new(dir.path().to_path_buf());

        let archives = store.list().unwrap();
        assert_eq!(archives.len(), 1);
        assert!(archives[0].action.is_none());
        assert!(archives[0].log_count.is_none());
    }

    #[test]
    fn list_skips_foreign_files_and_corrupt_manifests() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"not an archive").unwrap();
        fs::write(
            dir.path().join("audit_archive_bad_20260823_143005.json"),
            b"{ corrupt",
        )
        .unwrap();
        let store = ArchiveStore::new(dir.path().to_path_buf());

        let archives = store.list().unwrap();
        assert_eq!(archives.len(), 1);
        assert!(archives[0].action.is_none());
    }

    #[test]
    fn list_missing_directory_is_empty() {
        let store = ArchiveStore::new(PathBuf::from("/nonexistent/archives"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn read_validated_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), ArchiveFormat::Json, false);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let store = ArchiveStore::new(dir.path().to_path_buf());

        let bytes = store.read(&name).unwrap();
        assert_eq!(bytes, fs::read(&path).unwrap());
    }

    #[test]
    fn read_rejects_invalid_name_before_fs_access() {
        let store = ArchiveStore::new(PathBuf::from("/nonexistent/archives"));
        let err = store.read("../../etc/passwd").unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidName(_)));
    }

    #[test]
    fn read_missing_archive_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().to_path_buf());
        let err = store
            .read("audit_archive_gone_20260823_143005.json")
            .unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound(_)));
    }

    #[test]
    fn purge_by_file_age() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), ArchiveFormat::Json, false);
        fs::write(dir.path().join("keep.txt"), b"foreign file").unwrap();
        let store = ArchiveStore::new(dir.path().to_path_buf());

        // Just-written file is newer than a cutoff in the past
        let removed = store
            .purge_older_than(Utc::now() - Duration::days(1))
            .unwrap();
        assert_eq!(removed, 0);

        // ...and older than a cutoff in the future
        let removed = store
            .purge_older_than(Utc::now() + Duration::hours(1))
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.list().unwrap().is_empty());

        // Foreign files are never touched
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn content_types() {
        assert_eq!(
            ArchiveStore::content_type("audit_archive_x_20260823_143005.json"),
            "application/json"
        );
        assert_eq!(
            ArchiveStore::content_type("audit_archive_x_20260823_143005.csv"),
            "text/csv"
        );
        assert_eq!(
            ArchiveStore::content_type("audit_archive_x_20260823_143005.json.gz"),
            "application/gzip"
        );
    }
}
