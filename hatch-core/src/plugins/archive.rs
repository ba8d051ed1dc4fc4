//! Archive inspection - find a plugin module inside a zip package without running it

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::error::PluginHostError;

/// File name a module's entry point ends with inside a plugin archive.
#[cfg(target_os = "macos")]
pub const ENTRY_MODULE_FILENAME: &str = "plugin.dylib";
/// File name a module's entry point ends with inside a plugin archive.
#[cfg(target_os = "windows")]
pub const ENTRY_MODULE_FILENAME: &str = "plugin.dll";
/// File name a module's entry point ends with inside a plugin archive.
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const ENTRY_MODULE_FILENAME: &str = "plugin.so";

/// Extension of plugin package files.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Look for a module entry point in a zip archive.
///
/// Returns the internal path of the first entry (in the archive's own
/// listing order) whose name ends with [`ENTRY_MODULE_FILENAME`], or `None`
/// when the archive has no such entry. Nothing is extracted or executed.
///
/// # Errors
///
/// [`PluginHostError::ArchiveUnreadable`] if the file cannot be opened or is
/// not a zip archive.
pub fn inspect(archive_path: &Path) -> Result<Option<String>, PluginHostError> {
    let mut archive = open(archive_path)?;

    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| PluginHostError::archive_unreadable(archive_path, e))?;

        if entry.name().ends_with(ENTRY_MODULE_FILENAME) {
            tracing::debug!(
                archive = %archive_path.display(),
                module = %entry.name(),
                "Found plugin module"
            );
            return Ok(Some(entry.name().to_string()));
        }
    }

    tracing::debug!(
        archive = %archive_path.display(),
        "No {} in archive",
        ENTRY_MODULE_FILENAME
    );
    Ok(None)
}

/// Extract a single entry of an archive into `dest_dir`.
///
/// Only the entry's file name is kept, so archive-internal directories can
/// never place the file outside `dest_dir`. Returns the written path.
pub fn extract_entry(
    archive_path: &Path,
    entry_name: &str,
    dest_dir: &Path,
) -> Result<PathBuf, PluginHostError> {
    let file_name = Path::new(entry_name)
        .file_name()
        .ok_or_else(|| PluginHostError::module_load(archive_path, "entry has no file name"))?;

    let mut archive = open(archive_path)?;
    let mut entry = archive
        .by_name(entry_name)
        .map_err(|e| PluginHostError::archive_unreadable(archive_path, e))?;

    let dest = dest_dir.join(file_name);
    let mut out = File::create(&dest)?;
    io::copy(&mut entry, &mut out)?;

    Ok(dest)
}

fn open(archive_path: &Path) -> Result<ZipArchive<File>, PluginHostError> {
    let file =
        File::open(archive_path).map_err(|e| PluginHostError::archive_unreadable(archive_path, e))?;
    ZipArchive::new(file).map_err(|e| PluginHostError::archive_unreadable(archive_path, e))
}
