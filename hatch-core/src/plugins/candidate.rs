//! Discovered plugin candidates and scan catalogs

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::error::PluginHostError;
use super::spec_client::{ApiClient, ApiDescription};

/// Packaging convention a plugin was discovered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// Zip package carrying a native plugin module (`<root>/generic`)
    CodeArchive,
    /// Manifest plus API description for a remote API (`<root>/openai`)
    ApiSpec,
}

impl Convention {
    /// Directory under the plugin root that holds this convention's plugins
    pub fn dir_name(self) -> &'static str {
        match self {
            Convention::CodeArchive => "generic",
            Convention::ApiSpec => "openai",
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Convention::CodeArchive => write!(f, "code-archive"),
            Convention::ApiSpec => write!(f, "api-spec"),
        }
    }
}

/// A remote-API plugin: its manifest, API description, and bound client
#[derive(Clone)]
pub struct ApiSpecBundle {
    /// Contents of `manifest.json`, passed through untouched
    pub manifest: Option<serde_json::Value>,
    /// Parsed API description
    pub api_description: ApiDescription,
    /// Client bound to the description's first server
    pub client: Arc<dyn ApiClient>,
}

impl ApiSpecBundle {
    /// Remote-API plugins leave responses as they are.
    pub fn on_response(&self, response: &str) -> String {
        response.to_string()
    }
}

impl fmt::Debug for ApiSpecBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSpecBundle")
            .field("manifest", &self.manifest)
            .field("api", &self.api_description.info.title)
            .field("base_url", &self.client.base_url().as_str())
            .finish()
    }
}

/// What was found for a candidate, per convention
#[derive(Debug, Clone)]
pub enum CandidateKind {
    CodeArchive {
        /// Zip package on disk
        archive_path: PathBuf,
        /// Path of the module entry point inside the archive
        entry_module_path: String,
    },
    ApiSpec(ApiSpecBundle),
}

/// A discovered, not yet activated plugin
#[derive(Debug, Clone)]
pub struct PluginCandidate {
    /// Base name of the plugin's directory
    pub name: String,
    pub kind: CandidateKind,
}

impl PluginCandidate {
    pub fn convention(&self) -> Convention {
        match self.kind {
            CandidateKind::CodeArchive { .. } => Convention::CodeArchive,
            CandidateKind::ApiSpec(_) => Convention::ApiSpec,
        }
    }
}

/// A plugin directory that was skipped because of an error
#[derive(Debug)]
pub struct RejectedCandidate {
    pub name: String,
    pub error: PluginHostError,
}

/// Result of scanning one plugin root
///
/// Candidates are keyed and ordered by plugin name, so two scans of an
/// unchanged root produce the same catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    pub candidates: BTreeMap<String, PluginCandidate>,
    pub rejected: Vec<RejectedCandidate>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PluginCandidate> {
        self.candidates.get(name)
    }

    /// Candidate names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.candidates.keys().map(String::as_str)
    }

    /// Consume the catalog, yielding candidates in name order
    pub fn into_candidates(self) -> impl Iterator<Item = PluginCandidate> {
        self.candidates.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive_candidate(name: &str) -> PluginCandidate {
        PluginCandidate {
            name: name.to_string(),
            kind: CandidateKind::CodeArchive {
                archive_path: PathBuf::from(format!("/plugins/generic/{name}/plugin.zip")),
                entry_module_path: format!("{name}/plugin.so"),
            },
        }
    }

    #[test]
    fn test_convention_dir_names() {
        assert_eq!(Convention::CodeArchive.dir_name(), "generic");
        assert_eq!(Convention::ApiSpec.dir_name(), "openai");
    }

    #[test]
    fn test_convention_display() {
        assert_eq!(Convention::CodeArchive.to_string(), "code-archive");
        assert_eq!(Convention::ApiSpec.to_string(), "api-spec");
    }

    #[test]
    fn test_candidate_convention() {
        assert_eq!(archive_candidate("foo").convention(), Convention::CodeArchive);
    }

    #[test]
    fn test_catalog_orders_by_name() {
        let mut catalog = Catalog::default();
        for name in ["zeta", "alpha", "mid"] {
            catalog
                .candidates
                .insert(name.to_string(), archive_candidate(name));
        }

        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(catalog.len(), 3);
        assert!(catalog.get("mid").is_some());

        let drained: Vec<String> = catalog.into_candidates().map(|c| c.name).collect();
        assert_eq!(drained, vec!["alpha", "mid", "zeta"]);
    }
}
