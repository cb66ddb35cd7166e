//! File helpers shared by the on-disk stores.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use crate::sessions::generate_random_string;

/// Atomic write using temp file + rename.
///
/// The target is either fully replaced or not modified at all; a crash
/// mid-write leaves at most a stray temp file next to it.
pub fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let temp_path = path.with_extension(format!("{}.tmp", generate_random_string(16)));

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written {
        // Clean up temp file if write failed
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    // Atomic rename to target
    if let Err(e) = fs::rename(&temp_path, path) {
        // Clean up temp file if rename failed
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}

/// Modification time and length of a file, used to notice outside changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    /// `None` when the file does not exist or cannot be inspected
    pub fn of(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok()?,
            len: metadata.len(),
        })
    }
}
