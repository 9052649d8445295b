//! Output file handling.
//!
//! Headers are written to a sibling temporary file and renamed into place, so
//! the destination is either the previous header or the complete new one.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary path used while writing `path`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Atomically replace `path` with `contents`.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &str) -> io::Result<()> {
    let path = path.as_ref();
    let tmp = temp_path(path);

    let result = write_and_sync(&tmp, contents).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        // Best effort cleanup
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_and_sync(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}
