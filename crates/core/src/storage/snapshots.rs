use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct WriteError {
    pub artifact: String,
    pub path: PathBuf,
    pub detail: String,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to write snapshot {} to {}: {}",
            self.artifact,
            self.path.display(),
            self.detail
        )
    }
}

impl std::error::Error for WriteError {}

/// Destination for finished artifacts. Each write is independent of every other.
pub trait SnapshotSink {
    fn write_value(&self, artifact: &str, payload: &Value) -> Result<PathBuf, WriteError>;
}

/// Writes `<dir>/<artifact>.json`, replacing any previous snapshot atomically.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, artifact: &str) -> PathBuf {
        self.dir.join(format!("{artifact}.json"))
    }

    pub fn write<T: Serialize>(&self, artifact: &str, payload: &T) -> Result<PathBuf, WriteError> {
        let path = self.path_for(artifact);
        let fail = |detail: String| WriteError {
            artifact: artifact.to_string(),
            path: path.clone(),
            detail,
        };

        let bytes = encode_pretty(payload).map_err(|e| fail(format!("serialize: {e}")))?;

        std::fs::create_dir_all(&self.dir).map_err(|e| fail(format!("create dir: {e}")))?;

        // Temp file in the same directory so the rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| fail(format!("create temp file: {e}")))?;
        tmp.write_all(&bytes)
            .map_err(|e| fail(format!("write temp file: {e}")))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| fail(format!("sync temp file: {e}")))?;
        tmp.persist(&path)
            .map_err(|e| fail(format!("replace snapshot: {}", e.error)))?;

        tracing::info!(%artifact, path = %path.display(), bytes = bytes.len(), "snapshot written");
        Ok(path)
    }
}

impl SnapshotSink for SnapshotWriter {
    fn write_value(&self, artifact: &str, payload: &Value) -> Result<PathBuf, WriteError> {
        self.write(artifact, payload)
    }
}

/// Logs what would be written and touches nothing.
#[derive(Debug, Clone)]
pub struct DryRunSink {
    inner: SnapshotWriter,
}

impl DryRunSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: SnapshotWriter::new(dir),
        }
    }
}

impl SnapshotSink for DryRunSink {
    fn write_value(&self, artifact: &str, payload: &Value) -> Result<PathBuf, WriteError> {
        let path = self.inner.path_for(artifact);
        let status = payload.get("status").and_then(Value::as_str).unwrap_or("?");
        tracing::info!(
            %artifact,
            path = %path.display(),
            status,
            dry_run = true,
            "snapshot not written"
        );
        Ok(path)
    }
}

/// UTF-8 JSON with 4-space indentation; non-ASCII text is kept as-is.
pub fn encode_pretty<T: Serialize>(payload: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    payload.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_unescaped_utf8_with_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());

        let path = writer
            .write("market_data_history", &json!({"name": "恒生指數", "value": 1}))
            .unwrap();
        assert_eq!(path, dir.path().join("market_data_history.json"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("恒生指數"));
        assert!(!text.contains("\\u"));
        assert!(text.contains("\n    \"name\""));
    }

    #[test]
    fn replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());
        writer.write("hibor_rates", &json!({"v": 1})).unwrap();
        writer.write("hibor_rates", &json!({"v": 2})).unwrap();

        let v: Value =
            serde_json::from_str(&std::fs::read_to_string(writer.path_for("hibor_rates")).unwrap())
                .unwrap();
        assert_eq!(v["v"], 2);

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "temp files must not be left behind");
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let writer = SnapshotWriter::new(&nested);
        writer.write("x", &json!({})).unwrap();
        assert!(nested.join("x.json").exists());
    }

    #[test]
    fn reports_write_error_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let err = SnapshotWriter::new(&blocker).write("x", &json!({})).unwrap_err();
        assert_eq!(err.artifact, "x");
        assert!(err.to_string().contains("x"));
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DryRunSink::new(dir.path());
        sink.write_value("x", &json!({"status": "ok"})).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
