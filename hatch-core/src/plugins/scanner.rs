//! Package scanner - discovers plugin candidates under a plugin root

use std::fmt;
use std::path::{Path, PathBuf};

use super::archive::{self, ARCHIVE_EXTENSION};
use super::candidate::{
    ApiSpecBundle, CandidateKind, Catalog, Convention, PluginCandidate, RejectedCandidate,
};
use super::error::PluginHostError;
use super::spec_client::{
    ClientGenerator, ClientProjectConfig, RestClientGenerator, find_api_description,
    load_api_description,
};

/// Optional manifest of a remote-API plugin.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Collaborators the scanner needs for remote-API plugins
pub struct ScanContext {
    pub generator: Box<dyn ClientGenerator>,
    pub client_config: ClientProjectConfig,
}

impl Default for ScanContext {
    fn default() -> Self {
        Self {
            generator: Box::new(RestClientGenerator),
            client_config: ClientProjectConfig::default(),
        }
    }
}

impl fmt::Debug for ScanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanContext")
            .field("client_config", &self.client_config)
            .finish_non_exhaustive()
    }
}

/// Scan the immediate subdirectories of `root` for plugins of one convention.
///
/// Each subdirectory is one potential plugin, named after the directory.
/// Subdirectories are visited in name order. A subdirectory that fails
/// (ambiguous archives, bad API description, generator error) is recorded in
/// [`Catalog::rejected`] and the scan carries on with its siblings.
///
/// # Errors
///
/// [`PluginHostError::InvalidPluginRoot`] if `root` is not a directory.
pub fn scan(
    root: &Path,
    convention: Convention,
    ctx: &ScanContext,
) -> Result<Catalog, PluginHostError> {
    if !root.is_dir() {
        return Err(PluginHostError::InvalidPluginRoot {
            path: root.to_path_buf(),
        });
    }

    let mut catalog = Catalog::default();

    for dir in subdirectories(root)? {
        let Some(name) = plugin_name(&dir) else {
            tracing::warn!(dir = %dir.display(), "Plugin directory name is not valid UTF-8, skipping");
            continue;
        };

        let result = match convention {
            Convention::CodeArchive => scan_code_archive(&dir, &name),
            Convention::ApiSpec => scan_api_spec(&dir, &name, ctx),
        };

        match result {
            Ok(Some(candidate)) => {
                tracing::debug!(plugin = %name, %convention, "Discovered plugin");
                catalog.candidates.insert(name, candidate);
            }
            Ok(None) => {
                tracing::debug!(dir = %dir.display(), %convention, "No plugin found");
            }
            Err(error) => {
                tracing::warn!(plugin = %name, error = %error, "Skipping plugin");
                catalog.rejected.push(RejectedCandidate { name, error });
            }
        }
    }

    Ok(catalog)
}

fn subdirectories(root: &Path) -> Result<Vec<PathBuf>, PluginHostError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn plugin_name(dir: &Path) -> Option<String> {
    dir.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn archives_in(dir: &Path) -> Result<Vec<PathBuf>, PluginHostError> {
    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_archive = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
        if is_archive && path.is_file() {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

fn scan_code_archive(dir: &Path, name: &str) -> Result<Option<PluginCandidate>, PluginHostError> {
    let mut modules = Vec::new();

    for archive_path in archives_in(dir)? {
        match archive::inspect(&archive_path) {
            Ok(Some(entry)) => modules.push((archive_path, entry)),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(plugin = %name, error = %e, "Ignoring unreadable archive");
            }
        }
    }

    if modules.len() > 1 {
        return Err(PluginHostError::AmbiguousPackage {
            name: name.to_string(),
            archives: modules.into_iter().map(|(path, _)| path).collect(),
        });
    }

    Ok(modules
        .pop()
        .map(|(archive_path, entry_module_path)| PluginCandidate {
            name: name.to_string(),
            kind: CandidateKind::CodeArchive {
                archive_path,
                entry_module_path,
            },
        }))
}

fn read_manifest(dir: &Path) -> Result<Option<serde_json::Value>, PluginHostError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let contents = std::fs::read(&path)?;
    let manifest = serde_json::from_slice(&contents)
        .map_err(|e| PluginHostError::malformed(&path, e))?;
    Ok(Some(manifest))
}

fn scan_api_spec(
    dir: &Path,
    name: &str,
    ctx: &ScanContext,
) -> Result<Option<PluginCandidate>, PluginHostError> {
    let Some(description_path) = find_api_description(dir) else {
        return Ok(None);
    };

    let manifest = read_manifest(dir)?;
    let api_description = load_api_description(&description_path)?;
    let client =
        ctx.generator
            .generate(&description_path, &api_description, dir, &ctx.client_config)?;

    Ok(Some(PluginCandidate {
        name: name.to_string(),
        kind: CandidateKind::ApiSpec(ApiSpecBundle {
            manifest,
            api_description,
            client,
        }),
    }))
}
