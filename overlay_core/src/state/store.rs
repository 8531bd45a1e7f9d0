//! Line-per-record state files.
//!
//! The format is one record per line with no header or escaping. Writes go
//! to a sibling temporary file that is then renamed over the target, so a
//! crash mid-write leaves the previous file intact.

use std::path::{Path, PathBuf};

use crate::Result;

#[derive(Debug, Clone)]
pub struct LineStore {
    path: PathBuf,
}

impl LineStore {
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all non-empty records. A missing file holds no records.
    pub async fn read_records(&self) -> Result<Vec<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(split_records(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file with the given records, one per line.
    pub fn write_records<I, S>(&self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut contents = String::new();
        for record in records {
            contents.push_str(record.as_ref());
            contents.push('\n');
        }

        let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// Split on line endings (`\n` or `\r\n`), dropping empty entries.
pub fn split_records(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_records_drops_empty_lines() {
        let records = split_records("wvw\r\n\r\npve.dailies\n\n");
        assert_eq!(records, vec!["wvw".to_string(), "pve.dailies".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_file_has_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = LineStore::new(dir.path(), "categories.txt");

        assert!(store.read_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = LineStore::new(dir.path(), "categories.txt");

        store.write_records(["wvw", "pve"]).unwrap();
        store.write_records(["wvw.reset"]).unwrap();

        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "wvw.reset\n");
        assert_eq!(store.read_records().await.unwrap(), vec!["wvw.reset".to_string()]);
        assert!(!dir.path().join("categories.txt.tmp").exists());
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = LineStore::new(dir.path().join("absent"), "categories.txt");

        assert!(store.write_records(["wvw"]).is_err());
    }
}
