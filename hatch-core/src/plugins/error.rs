//! Plugin host error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, loading, or activating plugins
#[derive(Error, Debug)]
pub enum PluginHostError {
    /// Plugin root is missing or not a directory
    #[error("Plugin root is not a directory: {path}")]
    InvalidPluginRoot { path: PathBuf },

    /// Archive could not be opened or is not a zip file
    #[error("Cannot read plugin archive {path}: {reason}")]
    ArchiveUnreadable { path: PathBuf, reason: String },

    /// More than one archive in a plugin directory carries a module
    #[error("Plugin '{name}' has {} module archives, expected one", .archives.len())]
    AmbiguousPackage { name: String, archives: Vec<PathBuf> },

    /// Module could not be loaded from its archive
    #[error("Failed to load plugin module from {path}: {reason}")]
    ModuleLoadFailure { path: PathBuf, reason: String },

    /// API version mismatch between hatch and plugin
    #[error("API version mismatch: hatch expects {expected}, plugin has {found}")]
    ApiVersionMismatch { expected: u32, found: u32 },

    /// API description could not be parsed
    #[error("Malformed API description {path}: {reason}")]
    ApiDescriptionMalformed { path: PathBuf, reason: String },

    /// API description has an empty `servers` list
    #[error("API description '{api}' declares no servers")]
    NoServerDeclared { api: String },

    /// First server entry is not an absolute URL
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    /// Client generation failed
    #[error("Client generation failed for {path}: {reason}")]
    ClientGeneration { path: PathBuf, reason: String },

    /// Path parameter value cannot be used as a path segment
    #[error("Invalid value for path parameter '{name}': {reason}")]
    InvalidPathParameter { name: String, reason: String },

    /// Operation id not present in the API description
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// HTTP error from a generated client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginHostError {
    pub(crate) fn archive_unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArchiveUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn module_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModuleLoadFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ApiDescriptionMalformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
