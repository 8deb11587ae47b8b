//! Filesystem-backed config writer

use pulsewarden_host_api::{ConfigWriter, HostResult};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::debug;

/// Writes config files straight to the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsConfigWriter;

impl FsConfigWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ConfigWriter for FsConfigWriter {
    fn ensure_dir(&self, path: &Path, mode: u32) -> HostResult<()> {
        if path.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(path)?;
        // Set explicitly so the process umask does not strip group bits
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;

        debug!(path = %path.display(), mode = %format!("{:o}", mode), "Created directory");
        Ok(())
    }

    fn write_text(&self, path: &Path, content: &str) -> HostResult<()> {
        fs::write(path, content)?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_creates_with_mode() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("files").join("pulseaudio");

        FsConfigWriter::new().ensure_dir(&dir, 0o771).unwrap();

        let meta = fs::metadata(&dir).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o777, 0o771);
    }

    #[test]
    fn ensure_dir_leaves_existing_alone() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("existing");
        fs::create_dir(&dir).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).unwrap();

        FsConfigWriter::new().ensure_dir(&dir, 0o771).unwrap();

        let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700);
    }

    #[test]
    fn write_text_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("default.pa");
        let writer = FsConfigWriter::new();

        writer.write_text(&file, "first line\nsecond line").unwrap();
        writer.write_text(&file, "replaced").unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "replaced");
    }

    #[test]
    fn write_text_into_missing_dir_fails() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("missing").join("default.pa");

        assert!(FsConfigWriter::new().write_text(&file, "x").is_err());
    }
}
