use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use flate2::{Compression, write::GzEncoder};
use serde::Serialize;

use super::ArchiveError;
use crate::{
    config::{ArchiveConfig, ArchiveFormat},
    models::{ArchiveManifest, AuditLog},
};

/// Fixed CSV column order. Changing this breaks downstream consumers.
pub const CSV_HEADER: [&str; 6] = ["Id", "UserId", "Action", "Message", "CreatedAt", "IpAddress"];

/// One archive file: manifest first, then the record array.
#[derive(Serialize)]
struct ArchiveDocument<'a> {
    manifest: &'a ArchiveManifest,
    logs: &'a [AuditLog],
}

/// Serializes expiring batches to archive files.
///
/// Writes go to a `.tmp` sibling and are renamed into place, so a crash
/// never leaves a half-written archive behind.
#[derive(Clone)]
pub struct ArchiveWriter {
    config: ArchiveConfig,
}

impl ArchiveWriter {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Archive one action's expiring batch. Returns the final file path.
    ///
    /// Fails on I/O problems (permissions, space), on serialization errors,
    /// and when the serialized output exceeds the configured size limit.
    /// The cleanup engine treats any failure here as "do not delete this
    /// batch".
    pub fn write(
        &self,
        action: &str,
        records: &[AuditLog],
        cutoff: DateTime<Utc>,
    ) -> Result<PathBuf, ArchiveError> {
        let archived_at = Utc::now();
        let manifest = ArchiveManifest::build(action, cutoff, archived_at, records);

        let body = match self.config.format {
            ArchiveFormat::Json => serde_json::to_vec_pretty(&ArchiveDocument {
                manifest: &manifest,
                logs: records,
            })?,
            ArchiveFormat::Csv => render_csv(records)?,
        };

        let body = if self.config.compress {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&body)?;
            encoder.finish()?
        } else {
            body
        };

        if body.len() as u64 > self.config.max_size_bytes() {
            return Err(ArchiveError::TooLarge {
                limit_mb: self.config.max_size_mb,
                actual: body.len() as u64,
            });
        }

        fs::create_dir_all(&self.config.path)?;

        let name = archive_file_name(action, archived_at, self.config.format, self.config.compress);
        let final_path = self.config.path.join(&name);
        let tmp_path = self.config.path.join(format!("{name}.tmp"));

        write_atomic(&tmp_path, &final_path, &body)?;

        tracing::info!(
            action = action,
            records = records.len(),
            bytes = body.len(),
            path = %final_path.display(),
            "Wrote archive"
        );

        Ok(final_path)
    }
}

fn write_atomic(tmp: &Path, dest: &Path, body: &[u8]) -> Result<(), ArchiveError> {
    fs::write(tmp, body)?;
    if let Err(e) = fs::rename(tmp, dest) {
        // Never leave the temp file behind on a failed rename
        let _ = fs::remove_file(tmp);
        return Err(e.into());
    }
    Ok(())
}

fn render_csv(records: &[AuditLog]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.id.to_string(),
            record
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            record.action.clone(),
            record.message.clone(),
            record.created_at.to_rfc3339(),
            record.ip_address.clone().unwrap_or_default(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| ArchiveError::Io(e.into_error()))
}

/// `audit_archive_{action}_{yyyyMMdd}_{HHmmss}.{json|csv}[.gz]`
fn archive_file_name(
    action: &str,
    archived_at: DateTime<Utc>,
    format: ArchiveFormat,
    compress: bool,
) -> String {
    let action = sanitize_action(action);
    let stamp = archived_at.format("%Y%m%d_%H%M%S");
    let ext = format.extension();
    let gz = if compress { ".gz" } else { "" };
    format!("audit_archive_{action}_{stamp}.{ext}{gz}")
}

/// Lowercase and restrict to `[a-z0-9_]` so action names can never escape
/// the file naming convention.
fn sanitize_action(action: &str) -> String {
    action
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use chrono::Duration;
    use flate2::read::GzDecoder;
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    fn record(action: &str, message: &str) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            action: action.to_string(),
            message: message.to_string(),
            created_at: Utc::now() - Duration::days(40),
            ip_address: Some("10.0.0.1".to_string()),
        }
    }

    fn writer_with(dir: &Path, format: ArchiveFormat, compress: bool) -> ArchiveWriter {
        ArchiveWriter::new(ArchiveConfig {
            path: dir.to_path_buf(),
            format,
            compress,
            ..Default::default()
        })
    }

    #[test]
    fn csv_two_records_is_exactly_three_lines() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_with(dir.path(), ArchiveFormat::Csv, false);

        let records = vec![record("BOOK_VIEWED", "one"), record("BOOK_VIEWED", "two")];
        let path = writer.write("BOOK_VIEWED", &records, Utc::now()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Id,UserId,Action,Message,CreatedAt,IpAddress");
    }

    #[test]
    fn csv_escapes_embedded_delimiters() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_with(dir.path(), ArchiveFormat::Csv, false);

        let records = vec![record("BOOK_VIEWED", "title, with \"quotes\"")];
        let path = writer.write("BOOK_VIEWED", &records, Utc::now()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[3], "title, with \"quotes\"");
    }

    #[test]
    fn json_places_manifest_before_logs() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_with(dir.path(), ArchiveFormat::Json, false);

        let records = vec![record("BOOK_VIEWED", "one"), record("BOOK_VIEWED", "two")];
        let cutoff = Utc::now() - Duration::days(30);
        let path = writer.write("BOOK_VIEWED", &records, cutoff).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let manifest_pos = content.find("\"manifest\"").unwrap();
        let logs_pos = content.find("\"logs\"").unwrap();
        assert!(manifest_pos < logs_pos);

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["manifest"]["log_count"], 2);
        assert_eq!(value["manifest"]["action"], "BOOK_VIEWED");
        assert_eq!(value["logs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn json_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_with(dir.path(), ArchiveFormat::Json, false);

        let records = vec![record("BOOK_VIEWED", "round trip")];
        let path = writer.write("BOOK_VIEWED", &records, Utc::now()).unwrap();

        #[derive(serde::Deserialize)]
        struct Doc {
            manifest: ArchiveManifest,
            logs: Vec<AuditLog>,
        }
        let doc: Doc = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(doc.manifest.log_count, 1);
        assert_eq!(doc.logs[0].id, records[0].id);
        assert_eq!(doc.logs[0].message, "round trip");
    }

    #[rstest]
    #[case(ArchiveFormat::Json)]
    #[case(ArchiveFormat::Csv)]
    fn gzip_output_decompresses(#[case] format: ArchiveFormat) {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_with(dir.path(), format, true);

        let records = vec![record("BOOK_VIEWED", "compressed")];
        let path = writer.write("BOOK_VIEWED", &records, Utc::now()).unwrap();
        assert!(path.to_string_lossy().ends_with(".gz"));

        let mut decoder = GzDecoder::new(fs::File::open(&path).unwrap());
        let mut decompressed = String::new();
        decoder.read_to_string(&mut decompressed).unwrap();
        assert!(decompressed.contains("compressed"));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_with(dir.path(), ArchiveFormat::Json, false);

        writer
            .write("BOOK_VIEWED", &[record("BOOK_VIEWED", "x")], Utc::now())
            .unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn oversized_archive_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArchiveWriter::new(ArchiveConfig {
            path: dir.path().to_path_buf(),
            format: ArchiveFormat::Json,
            max_size_mb: 1,
            ..Default::default()
        });

        // ~2 MB of message payload across a handful of records
        let big = "x".repeat(512 * 1024);
        let records: Vec<AuditLog> = (0..4).map(|_| record("BULK", &big)).collect();

        let err = writer.write("BULK", &records, Utc::now()).unwrap_err();
        assert!(matches!(err, ArchiveError::TooLarge { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the archive directory should be
        let blocked = dir.path().join("not_a_dir");
        fs::write(&blocked, b"occupied").unwrap();

        let writer = ArchiveWriter::new(ArchiveConfig {
            path: blocked,
            ..Default::default()
        });

        let err = writer
            .write("BOOK_VIEWED", &[record("BOOK_VIEWED", "x")], Utc::now())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }

    #[test]
    fn file_name_convention() {
        let archived_at = "2026-08-23T14:30:05Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            archive_file_name("BOOK_VIEWED", archived_at, ArchiveFormat::Json, false),
            "audit_archive_book_viewed_20260823_143005.json"
        );
        assert_eq!(
            archive_file_name("user.login", archived_at, ArchiveFormat::Csv, true),
            "audit_archive_user_login_20260823_143005.csv.gz"
        );
    }

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize_action("../../etc/passwd"), "______etc_passwd");
        assert_eq!(sanitize_action("BOOK_VIEWED"), "book_viewed");
    }
}
