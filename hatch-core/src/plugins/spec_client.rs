//! API descriptions and the clients generated from them
//!
//! A remote-API plugin ships an OpenAPI document. This module parses it
//! ([`load_api_description`]), binds a client to the document's first server
//! ([`build_client`]), and defines the [`ClientGenerator`] seam the scanner
//! calls to produce that client.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::error::PluginHostError;

/// Recognized API description file names, in lookup order.
pub const API_DESCRIPTION_FILES: [&str; 3] = ["openapi.json", "openapi.yaml", "openapi.yml"];

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Serialization format of an API description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Json,
    Yaml,
}

impl ApiFormat {
    /// Sniff the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ApiFormat::Json),
            "yaml" | "yml" => Some(ApiFormat::Yaml),
            _ => None,
        }
    }
}

/// Parsed OpenAPI document (the parts the host needs)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDescription {
    /// OpenAPI version string, e.g. `3.0.1`
    pub openapi: String,
    #[serde(default)]
    pub info: ApiInfo,
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
    /// Path template -> path item (method -> operation object)
    #[serde(default)]
    pub paths: BTreeMap<String, BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One callable operation of an API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_id: String,
    /// Upper-case HTTP method
    pub method: String,
    /// Path template, e.g. `/items/{id}`
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ApiDescription {
    /// Operations declared under `paths`, in path then method order.
    ///
    /// Operations without an `operationId` get one derived from the method
    /// and path (`get_items_id` for `GET /items/{id}`).
    pub fn operations(&self) -> Vec<Operation> {
        let mut operations = Vec::new();

        for (path, item) in &self.paths {
            for method in HTTP_METHODS {
                let Some(op) = item.get(method) else {
                    continue;
                };

                let operation_id = op
                    .get("operationId")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| derive_operation_id(method, path));

                operations.push(Operation {
                    operation_id,
                    method: method.to_ascii_uppercase(),
                    path: path.clone(),
                    summary: op.get("summary").and_then(Value::as_str).map(str::to_string),
                });
            }
        }

        operations
    }
}

fn derive_operation_id(method: &str, path: &str) -> String {
    let mut id = method.to_string();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        id.push('_');
        id.extend(
            segment
                .chars()
                .filter(|c| !matches!(c, '{' | '}'))
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }),
        );
    }
    id
}

/// Parse an API description from raw bytes.
///
/// `source` is only used for error messages.
pub fn parse_api_description(
    source: &Path,
    bytes: &[u8],
    format: ApiFormat,
) -> Result<ApiDescription, PluginHostError> {
    let description: ApiDescription = match format {
        ApiFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| PluginHostError::malformed(source, e))?
        }
        ApiFormat::Yaml => {
            serde_yaml::from_slice(bytes).map_err(|e| PluginHostError::malformed(source, e))?
        }
    };

    if !description.openapi.starts_with('3') {
        return Err(PluginHostError::malformed(
            source,
            format!("unsupported OpenAPI version '{}'", description.openapi),
        ));
    }

    Ok(description)
}

/// Read and parse an API description file, sniffing its format from the extension.
pub fn load_api_description(path: &Path) -> Result<ApiDescription, PluginHostError> {
    let format = ApiFormat::from_path(path)
        .ok_or_else(|| PluginHostError::malformed(path, "unrecognized file extension"))?;
    let bytes = std::fs::read(path)?;
    parse_api_description(path, &bytes, format)
}

/// First recognized API description file in `dir`, if any.
pub fn find_api_description(dir: &Path) -> Option<PathBuf> {
    API_DESCRIPTION_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// A callable client for a remote API
pub trait ApiClient: Send + Sync {
    /// Base URL every request is resolved against
    fn base_url(&self) -> &Url;

    /// Operations this client can call
    fn operations(&self) -> &[Operation];

    /// Call an operation.
    ///
    /// `params` is a JSON object; entries named in the path template are
    /// substituted, the rest become the query string (GET, HEAD, DELETE) or
    /// the JSON body (everything else).
    fn call(&self, operation_id: &str, params: &Value) -> Result<Value, PluginHostError>;
}

/// Blocking HTTP client bound to one API's base URL
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: Url,
    operations: Vec<Operation>,
    http: reqwest::blocking::Client,
}

impl RestClient {
    pub fn new(base_url: Url, operations: Vec<Operation>) -> Result<Self, PluginHostError> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            base_url,
            operations,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PluginHostError> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| PluginHostError::InvalidServerUrl {
            url: joined,
            reason: e.to_string(),
        })
    }
}

impl ApiClient for RestClient {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn operations(&self) -> &[Operation] {
        &self.operations
    }

    fn call(&self, operation_id: &str, params: &Value) -> Result<Value, PluginHostError> {
        let op = self
            .operations
            .iter()
            .find(|op| op.operation_id == operation_id)
            .ok_or_else(|| PluginHostError::UnknownOperation(operation_id.to_string()))?;

        let (path, rest) = expand_path(&op.path, params)?;
        let url = self.endpoint(&path)?;
        let method = reqwest::Method::from_bytes(op.method.as_bytes())
            .map_err(|_| PluginHostError::UnknownOperation(operation_id.to_string()))?;

        let sends_body = !matches!(
            method,
            reqwest::Method::GET | reqwest::Method::HEAD | reqwest::Method::DELETE
        );
        let mut request = self.http.request(method, url);
        if sends_body {
            if !rest.is_empty() {
                request = request.json(&rest);
            }
        } else {
            let query: Vec<(String, String)> = rest
                .iter()
                .map(|(k, v)| (k.clone(), scalar_to_string(v)))
                .collect();
            request = request.query(&query);
        }

        tracing::debug!(operation = %operation_id, "Calling remote API");
        let text = request.send()?.error_for_status()?.text()?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Substitute `{name}` segments from `params`; return the path and the unused params.
///
/// Values are percent-encoded so each one stays inside its own segment.
fn expand_path(
    template: &str,
    params: &Value,
) -> Result<(String, serde_json::Map<String, Value>), PluginHostError> {
    let mut rest = params.as_object().cloned().unwrap_or_default();
    let mut path = template.to_string();

    for key in params.as_object().into_iter().flat_map(|m| m.keys()) {
        let placeholder = format!("{{{key}}}");
        if path.contains(&placeholder)
            && let Some(value) = rest.remove(key)
        {
            let value = scalar_to_string(&value);
            if matches!(value.as_str(), "" | "." | "..") {
                return Err(PluginHostError::InvalidPathParameter {
                    name: key.clone(),
                    reason: format!("'{value}' is not a path segment"),
                });
            }
            path = path.replace(&placeholder, &urlencoding::encode(&value));
        }
    }

    Ok((path, rest))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Bind a client to the first server declared by `description`.
pub fn build_client(description: &ApiDescription) -> Result<RestClient, PluginHostError> {
    let server = description
        .servers
        .first()
        .ok_or_else(|| PluginHostError::NoServerDeclared {
            api: description.info.title.clone(),
        })?;

    let base_url = Url::parse(&server.url).map_err(|e| PluginHostError::InvalidServerUrl {
        url: server.url.clone(),
        reason: e.to_string(),
    })?;

    RestClient::new(base_url, description.operations())
}

/// Names used for the generated client project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProjectConfig {
    pub project_name: String,
    pub package_name: String,
}

impl Default for ClientProjectConfig {
    fn default() -> Self {
        Self {
            project_name: "client".to_string(),
            package_name: "client".to_string(),
        }
    }
}

/// Produces a client for an API description.
///
/// Generated artifacts go under `output_dir`; implementations must not rely
/// on (or change) the process working directory.
pub trait ClientGenerator: Send + Sync {
    fn generate(
        &self,
        description_path: &Path,
        description: &ApiDescription,
        output_dir: &Path,
        config: &ClientProjectConfig,
    ) -> Result<Arc<dyn ApiClient>, PluginHostError>;
}

/// Index written next to a generated client
#[derive(Debug, Serialize)]
struct GeneratedIndex<'a> {
    title: &'a str,
    version: &'a str,
    base_url: &'a str,
    source: &'a Path,
    operations: &'a [Operation],
}

/// Default generator: a [`RestClient`] plus an `operations.json` index
/// at `<output_dir>/<project>/<package>/operations.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RestClientGenerator;

impl ClientGenerator for RestClientGenerator {
    fn generate(
        &self,
        description_path: &Path,
        description: &ApiDescription,
        output_dir: &Path,
        config: &ClientProjectConfig,
    ) -> Result<Arc<dyn ApiClient>, PluginHostError> {
        let client = build_client(description)?;

        let package_dir = output_dir
            .join(&config.project_name)
            .join(&config.package_name);
        std::fs::create_dir_all(&package_dir).map_err(|e| PluginHostError::ClientGeneration {
            path: description_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let index = GeneratedIndex {
            title: &description.info.title,
            version: &description.info.version,
            base_url: client.base_url().as_str(),
            source: description_path,
            operations: client.operations(),
        };
        let json = serde_json::to_vec_pretty(&index).map_err(|e| {
            PluginHostError::ClientGeneration {
                path: description_path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(package_dir.join("operations.json"), json)?;

        tracing::debug!(
            api = %description.info.title,
            base_url = %client.base_url(),
            output = %package_dir.display(),
            "Generated API client"
        );

        Ok(Arc::new(client))
    }
}

/// Binds a [`RestClient`] and writes nothing, for read-only listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct BindOnlyGenerator;

impl ClientGenerator for BindOnlyGenerator {
    fn generate(
        &self,
        _description_path: &Path,
        description: &ApiDescription,
        _output_dir: &Path,
        _config: &ClientProjectConfig,
    ) -> Result<Arc<dyn ApiClient>, PluginHostError> {
        Ok(Arc::new(build_client(description)?))
    }
}
