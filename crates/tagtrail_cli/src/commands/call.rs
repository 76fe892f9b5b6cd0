//! Call command implementation.

use std::path::Path;
use std::sync::Arc;
use tagtrail_server::{ApiRequest, ApiResponse, ApiServer, Endpoint, ServerConfig};
use tagtrail_store::FileStore;

/// Sends one request to `endpoint` against the store at `path`.
pub fn call(
    path: &Path,
    secret: &[u8],
    endpoint: &str,
    token: &str,
    body: &str,
) -> Result<ApiResponse, Box<dyn std::error::Error>> {
    let path_str = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{endpoint}")
    };
    let endpoint = Endpoint::from_path(&path_str)
        .ok_or_else(|| format!("Unknown endpoint {endpoint:?}"))?;

    let store = Arc::new(FileStore::open(path)?);
    let server = ApiServer::with_secret(ServerConfig::default(), store, secret.to_vec());

    Ok(server.handle(&ApiRequest::post(endpoint, token, body)))
}

/// Runs the call command.
pub fn run(
    path: &Path,
    secret: &[u8],
    endpoint: &str,
    token: &str,
    body: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = call(path, secret, endpoint, token, body)?;
    let value: serde_json::Value = response.decode()?;

    println!("HTTP {}", response.status);
    println!("{}", serde_json::to_string_pretty(&value)?);

    if response.is_success() {
        Ok(())
    } else {
        Err(format!("Request failed with status {}", response.status).into())
    }
}
