//! Artifact storage seam.
//!
//! The engine addresses feature-collection artifacts by name through
//! [`FeatureSink`]; only the sink knows where and how rows are stored.
//! [`JsonDirSink`] keeps each artifact as a feature-collection JSON file
//! in one directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Storage operations the reconciler and orchestrator need.
pub trait FeatureSink: Send + Sync {
    fn exists(&self, name: &str) -> bool;

    /// Store `body` as the artifact `name`, replacing any previous content.
    fn write(&self, name: &str, body: &Value) -> io::Result<()>;

    fn delete(&self, name: &str) -> io::Result<()>;

    fn rename(&self, from: &str, to: &str) -> io::Result<()>;

    fn duplicate(&self, from: &str, to: &str) -> io::Result<()>;

    /// Append the rows of artifact `from` onto artifact `to`; returns the
    /// number of rows appended.
    fn append_rows(&self, from: &str, to: &str) -> io::Result<u64>;

    /// Number of rows artifact `name` holds.
    fn row_count(&self, name: &str) -> io::Result<u64>;
}

/// Directory of `<name>.json` feature-collection files.
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn read(&self, name: &str) -> io::Result<Value> {
        let text = fs::read_to_string(self.path(name))?;
        serde_json::from_str(&text)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn persist(&self, name: &str, body: &Value) -> io::Result<()> {
        let file = fs::File::create(self.path(name))?;
        serde_json::to_writer(io::BufWriter::new(file), body)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl FeatureSink for JsonDirSink {
    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn write(&self, name: &str, body: &Value) -> io::Result<()> {
        self.persist(name, body)
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.path(name))
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.path(from), self.path(to))
    }

    fn duplicate(&self, from: &str, to: &str) -> io::Result<()> {
        fs::copy(self.path(from), self.path(to)).map(|_| ())
    }

    fn append_rows(&self, from: &str, to: &str) -> io::Result<u64> {
        let source = self.read(from)?;
        let mut target = self.read(to)?;

        let incoming = source
            .get("features")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let appended = incoming.len() as u64;

        let features = target
            .as_object_mut()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, format!("{to} is not an object"))
            })?
            .entry("features")
            .or_insert_with(|| Value::Array(Vec::new()));
        let rows = features.as_array_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{to} has a non-array feature list"),
            )
        })?;
        rows.extend(incoming);

        self.persist(to, &target)?;
        Ok(appended)
    }

    fn row_count(&self, name: &str) -> io::Result<u64> {
        let body = self.read(name)?;
        Ok(body
            .get("features")
            .and_then(Value::as_array)
            .map_or(0, |features| features.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn page(ids: &[i64]) -> Value {
        json!({
            "geometryType": "esriGeometryPoint",
            "features": ids
                .iter()
                .map(|id| json!({"attributes": {"OBJECTID": id}}))
                .collect::<Vec<_>>()
        })
    }

    #[test]
    fn write_read_count_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path()).unwrap();

        assert!(!sink.exists("roads"));
        sink.write("roads", &page(&[1, 2, 3])).unwrap();
        assert!(sink.exists("roads"));
        assert_eq!(sink.row_count("roads").unwrap(), 3);
    }

    #[test]
    fn append_rows_preserves_order_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path()).unwrap();

        sink.write("a", &page(&[1, 2])).unwrap();
        sink.write("b", &page(&[3, 4, 5])).unwrap();
        let appended = sink.append_rows("b", "a").unwrap();
        assert_eq!(appended, 3);
        assert_eq!(sink.row_count("a").unwrap(), 5);

        let merged = sink.read("a").unwrap();
        let ids: Vec<i64> = merged["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|feature| feature["attributes"]["OBJECTID"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn rename_and_delete_manage_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path()).unwrap();

        sink.write("tmp", &page(&[7])).unwrap();
        sink.rename("tmp", "final").unwrap();
        assert!(!sink.exists("tmp"));
        assert!(sink.exists("final"));

        sink.duplicate("final", "copy").unwrap();
        assert_eq!(sink.row_count("copy").unwrap(), 1);

        sink.delete("copy").unwrap();
        assert!(!sink.exists("copy"));
    }

    #[test]
    fn missing_artifact_errors() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path()).unwrap();
        assert!(sink.row_count("absent").is_err());
        assert!(sink.delete("absent").is_err());
    }
}
