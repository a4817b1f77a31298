//! Rotating file writer with size-based rotation and numbered backups.
//!
//! The span file grows by one line per finished span. Once it passes the size
//! limit it is shifted to `<name>.1`, older backups move up one slot, and the
//! oldest beyond [`MAX_BACKUP_FILES`] is removed.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Maximum file size before rotation (5 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Number of backup files to retain after rotation.
pub const MAX_BACKUP_FILES: usize = 3;

/// Thread-safe rotating file writer.
///
/// The file is opened lazily on the first write, so construction never fails.
///
/// ```
/// use bolsas_queue::observability::RotatingWriter;
///
/// let dir = std::env::temp_dir().join("bolsas-queue-doc");
/// std::fs::create_dir_all(&dir).unwrap();
/// let writer = RotatingWriter::new(dir.join("spans.jsonl"));
/// writer.write_line("{\"name\":\"handle_event\"}").unwrap();
/// ```
pub struct RotatingWriter {
    file_path: PathBuf,
    max_bytes: u64,
    file: Mutex<Option<File>>,
}

impl RotatingWriter {
    /// Creates a writer rotating at [`MAX_FILE_SIZE_BYTES`].
    #[must_use]
    pub const fn new(file_path: PathBuf) -> Self {
        Self::with_max_bytes(file_path, MAX_FILE_SIZE_BYTES)
    }

    /// Creates a writer rotating once the file exceeds `max_bytes`.
    #[must_use]
    pub const fn with_max_bytes(file_path: PathBuf, max_bytes: u64) -> Self {
        Self {
            file_path,
            max_bytes,
            file: Mutex::new(None),
        }
    }

    /// Appends `line` plus a newline and flushes.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be rotated, opened, or written, or if the lock
    /// was poisoned by a panicking writer.
    pub fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("Mutex poisoned: {e}")))?;

        if self.needs_rotation() {
            *file = None;
            self.rotate()?;
        }

        if file.is_none() {
            *file = Some(OpenOptions::new().create(true).append(true).open(&self.file_path)?);
        }

        let handle = file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("No file available"))?;
        writeln!(handle, "{line}")?;
        handle.flush()
    }

    fn needs_rotation(&self) -> bool {
        fs::metadata(&self.file_path).is_ok_and(|metadata| metadata.len() > self.max_bytes)
    }

    /// `spans.jsonl.2 → .3`, `.1 → .2`, `spans.jsonl → .1`.
    fn rotate(&self) -> std::io::Result<()> {
        let oldest = self.backup_path(MAX_BACKUP_FILES);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for index in (1..MAX_BACKUP_FILES).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }

        if self.file_path.exists() {
            fs::rename(&self.file_path, self.backup_path(1))?;
        }
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{index}"));
        self.file_path.with_file_name(name)
    }

    /// Path of the live file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl std::fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("file_path", &self.file_path)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn appends_lines_below_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingWriter::new(dir.path().join("spans.jsonl"));

        writer.write_line("uno").unwrap();
        writer.write_line("dos").unwrap();

        assert_eq!(read(writer.path()), "uno\ndos\n");
        assert!(!dir.path().join("spans.jsonl.1").exists());
    }

    #[test]
    fn rotation_shifts_backups_and_drops_the_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spans.jsonl");
        let writer = RotatingWriter::with_max_bytes(path.clone(), 4);

        for line in ["line-a", "line-b", "line-c", "line-d", "line-e"] {
            writer.write_line(line).unwrap();
        }

        assert_eq!(read(&path), "line-e\n");
        assert_eq!(read(&dir.path().join("spans.jsonl.1")), "line-d\n");
        assert_eq!(read(&dir.path().join("spans.jsonl.2")), "line-c\n");
        assert_eq!(read(&dir.path().join("spans.jsonl.3")), "line-b\n");
        assert!(!dir.path().join("spans.jsonl.4").exists());
    }
}
