//! Uploaded-file handling: filename sanitization and self-deleting temp files.

use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use crate::error::{EwclError, Result};

/// Reduce a client-supplied filename to its base name.
///
/// Both `/` and `\` count as separators, whatever the host OS. Names that are
/// empty, `.`, `..`, or contain NUL are rejected.
pub fn sanitize_filename(raw: &str) -> Result<String> {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return Err(EwclError::Input(format!("unsafe upload filename: {raw:?}")));
    }
    Ok(base.to_string())
}

/// A temp file owned by one request. The file is removed when this drops.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Write `contents` to `<dir>/ewcl-<uuid>`. The client filename is not
    /// part of the path.
    pub async fn write(dir: &Path, contents: &[u8]) -> Result<Self> {
        let path = dir.join(format!("ewcl-{}", Uuid::new_v4()));
        // Own the path before writing so a partial write is still cleaned up.
        let guard = Self { path };
        tokio::fs::write(&guard.path, contents).await?;
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Read the upload back as text. Invalid UTF-8 becomes U+FFFD.
    pub async fn read_text(&self) -> Result<String> {
        let bytes = self.read().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove upload temp file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories() {
        assert_eq!(sanitize_filename("1ubq.pdb").unwrap(), "1ubq.pdb");
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("/tmp/x/2ftl.pdb").unwrap(), "2ftl.pdb");
        assert_eq!(sanitize_filename("C:\\Users\\me\\1cfc.pdb").unwrap(), "1cfc.pdb");
    }

    #[test]
    fn rejects_names_without_a_base() {
        for raw in ["", "   ", ".", "..", "dir/", "../..", "a\0b"] {
            assert!(sanitize_filename(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn temp_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::write(dir.path(), b"ATOM\n").await.unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));
        assert_eq!(upload.read().await.unwrap(), b"ATOM\n");

        drop(upload);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn binary_upload_reads_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::write(dir.path(), b"ATOM\xff\nEND\n").await.unwrap();
        assert_eq!(upload.read_text().await.unwrap(), "ATOM\u{fffd}\nEND\n");
    }

    #[tokio::test]
    async fn long_client_names_do_not_reach_the_temp_path() {
        let dir = tempfile::tempdir().unwrap();
        let name = sanitize_filename(&format!("{}.pdb", "a".repeat(240))).unwrap();
        assert_eq!(name.len(), 244);

        let upload = TempUpload::write(dir.path(), b"ATOM\n").await.unwrap();
        let file_name = upload.path().file_name().unwrap().to_string_lossy();
        assert!(file_name.starts_with("ewcl-"));
        assert!(!file_name.contains("aaaa"));
    }

    #[tokio::test]
    async fn concurrent_uploads_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempUpload::write(dir.path(), b"a").await.unwrap();
        let b = TempUpload::write(dir.path(), b"b").await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(TempUpload::write(&missing, b"a").await.is_err());
        assert!(!missing.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
