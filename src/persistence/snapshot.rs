use bincode::{serialize_into, DefaultOptions, Options};

use super::ValueEntry;
use crate::Result;
use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Reads and writes the whole key space as one bincode image.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    path: PathBuf,
}

impl SnapshotManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `entries` to a temporary file next to the snapshot and renames
    /// it into place, so a failed write never clobbers the previous image.
    pub fn save(&self, entries: &HashMap<String, ValueEntry>) -> Result<()> {
        let temp_path = self.temp_path();

        if let Err(e) = self.write_and_swap(&temp_path, entries) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }

        info!("Saved {} keys to {:?}", entries.len(), self.path);
        Ok(())
    }

    fn write_and_swap(
        &self,
        temp_path: &Path,
        entries: &HashMap<String, ValueEntry>,
    ) -> Result<()> {
        let file = File::create(temp_path)?;
        let mut writer = BufWriter::new(file);

        serialize_into(&mut writer, entries)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        std::fs::rename(temp_path, &self.path)?;
        Ok(())
    }

    /// `<file name>.tmp` beside the snapshot; never equal to the snapshot itself.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Never fails: a missing or unreadable snapshot yields an empty map.
    pub fn load(&self) -> HashMap<String, ValueEntry> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No snapshot at {:?}, starting empty", self.path);
                return HashMap::new();
            }
            Err(e) => {
                warn!("Failed to open snapshot {:?}: {}", self.path, e);
                return HashMap::new();
            }
        };

        // Length prefixes can never claim more bytes than the file holds.
        let limit = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Failed to stat snapshot {:?}: {}", self.path, e);
                return HashMap::new();
            }
        };
        let options = DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(limit);

        match options.deserialize_from::<_, HashMap<String, ValueEntry>>(BufReader::new(file)) {
            Ok(entries) => {
                info!("Loaded {} keys from {:?}", entries.len(), self.path);
                entries
            }
            Err(e) => {
                warn!("Ignoring corrupt snapshot {:?}: {}", self.path, e);
                HashMap::new()
            }
        }
    }
}

/// Loads the snapshot at `path`, or an empty map.
pub fn load(path: impl AsRef<Path>) -> HashMap<String, ValueEntry> {
    SnapshotManager::new(path.as_ref().to_path_buf()).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn sample() -> HashMap<String, ValueEntry> {
        let mut entries = HashMap::new();
        entries.insert("plain".to_string(), ValueEntry::new("value".to_string()));
        entries.insert(
            "timed".to_string(),
            ValueEntry {
                value: "soon gone".to_string(),
                expires_at: Some(SystemTime::now() + Duration::from_secs(60)),
            },
        );
        entries
    }

    #[test]
    fn save_then_load_reproduces_entries() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let manager = SnapshotManager::new(dir.path().join("data.snapshot"));
        let entries = sample();

        manager.save(&entries)?;

        assert_eq!(manager.load(), entries);
        assert!(!dir.path().join("data.snapshot.tmp").exists());
        Ok(())
    }

    #[test]
    fn save_overwrites_previous_image() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let manager = SnapshotManager::new(dir.path().join("data.snapshot"));

        manager.save(&sample())?;
        manager.save(&HashMap::new())?;

        assert!(manager.load().is_empty());
        Ok(())
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path().join("nope.snapshot")).is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.snapshot");
        std::fs::write(&path, b"\xff\xff\xff\xff\xff\xff\xff\xffgarbage").unwrap();

        assert!(load(&path).is_empty());
    }

    #[test]
    fn oversized_length_prefix_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.snapshot");

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&(1u64 << 62).to_le_bytes());
        bytes.extend_from_slice(b"k");
        std::fs::write(&path, bytes).unwrap();

        assert!(load(&path).is_empty());
    }

    #[test]
    fn temp_file_keeps_full_name() {
        let manager = SnapshotManager::new(PathBuf::from("/var/lib/store/x.temp"));
        assert_eq!(manager.temp_path(), PathBuf::from("/var/lib/store/x.temp.tmp"));

        let db = SnapshotManager::new(PathBuf::from("a.db"));
        let snap = SnapshotManager::new(PathBuf::from("a.snap"));
        assert_ne!(db.temp_path(), snap.temp_path());
    }

    #[test]
    fn sibling_snapshots_do_not_collide() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = SnapshotManager::new(dir.path().join("a.db"));
        let temp = SnapshotManager::new(dir.path().join("a.temp"));

        temp.save(&sample())?;
        db.save(&HashMap::new())?;
        temp.save(&sample())?;

        assert_eq!(temp.load().len(), 2);
        assert!(db.load().is_empty());
        Ok(())
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data.snapshot");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), b"x").unwrap();

        let manager = SnapshotManager::new(target);

        assert!(matches!(manager.save(&sample()), Err(crate::Error::Io(_))));
        assert!(!dir.path().join("data.snapshot.tmp").exists());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path().join("missing").join("data.snapshot"));

        assert!(matches!(manager.save(&sample()), Err(crate::Error::Io(_))));
    }
}
