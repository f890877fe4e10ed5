//! Filesystem fixtures

use crate::config::CONFIG_FILE_NAME;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary configuration directory, removed on drop
pub struct TempDirFixture {
    pub temp_dir: TempDir,
}

impl TempDirFixture {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = tempfile::tempdir()?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Where `config.yaml` lives for this fixture
    pub fn config_file(&self) -> PathBuf {
        self.path().join(CONFIG_FILE_NAME)
    }

    /// Replace `config.yaml` with raw content
    pub fn write_config(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.write_file(CONFIG_FILE_NAME, content)
    }

    pub fn read_config(&self) -> Result<String, Box<dyn std::error::Error>> {
        self.read_file(CONFIG_FILE_NAME)
    }

    pub fn write_file(
        &self,
        file_path: &str,
        content: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let full_path = self.path().join(file_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content)?;
        Ok(())
    }

    pub fn read_file(&self, file_path: &str) -> Result<String, Box<dyn std::error::Error>> {
        Ok(fs::read_to_string(self.path().join(file_path))?)
    }

    pub fn file_exists(&self, file_path: &str) -> bool {
        self.path().join(file_path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_cleans_up_on_drop() {
        let path = {
            let fixture = TempDirFixture::new().unwrap();
            fixture.write_config("analytics_opt_in: false\n").unwrap();
            assert!(fixture.file_exists(CONFIG_FILE_NAME));
            assert_eq!(fixture.read_config().unwrap(), "analytics_opt_in: false\n");
            fixture.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
