//! Endpoint routing.
//!
//! [`ApiServer`] turns a transport-neutral [`ApiRequest`] into an
//! [`ApiResponse`] with a JSON body. Binding it to an actual HTTP listener is
//! left to the embedding application.

use crate::auth::{AuthConfig, IdentityProvider, TokenIdentityProvider};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use crate::messages::ErrorResponse;
use crate::repository::ProfileRepository;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tagtrail_store::DocumentStore;
use tracing::{debug, error};

/// The five endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Create a profile.
    SignUp,
    /// Fetch the caller's profile.
    SignIn,
    /// Record a visit.
    StoreHistory,
    /// Attach a tag to a site.
    StoreTag,
    /// Detach a tag from a site.
    RemoveTag,
}

impl Endpoint {
    /// All endpoints.
    pub const ALL: [Endpoint; 5] = [
        Endpoint::SignUp,
        Endpoint::SignIn,
        Endpoint::StoreHistory,
        Endpoint::StoreTag,
        Endpoint::RemoveTag,
    ];

    /// Resolves a request path such as `/storeTag` or `/store-tag`.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.trim_matches('/');
        match name {
            "signUp" | "sign-up" => Some(Endpoint::SignUp),
            "signIn" | "sign-in" => Some(Endpoint::SignIn),
            "storeHistory" | "store-history" => Some(Endpoint::StoreHistory),
            "storeTag" | "store-tag" => Some(Endpoint::StoreTag),
            "removeTag" | "remove-tag" => Some(Endpoint::RemoveTag),
            _ => None,
        }
    }

    /// Canonical path of the endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::SignUp => "/signUp",
            Endpoint::SignIn => "/signIn",
            Endpoint::StoreHistory => "/storeHistory",
            Endpoint::StoreTag => "/storeTag",
            Endpoint::RemoveTag => "/removeTag",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A request as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: String,
    /// Request body.
    pub body: Vec<u8>,
}

impl ApiRequest {
    /// Creates a POST request to `endpoint` carrying `token`.
    pub fn post(endpoint: Endpoint, token: &str, body: impl Into<Vec<u8>>) -> Self {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("token", token)
            .finish();
        Self {
            method: "POST".to_string(),
            path: endpoint.path().to_string(),
            query,
            body: body.into(),
        }
    }

    /// Returns the `token` query parameter, decoded.
    pub fn token(&self) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
    }
}

/// A response for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Vec<u8>,
}

const FALLBACK_ERROR_BODY: &[u8] = br#"{"error":"Internal error."}"#;

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!(error = %e, "failed to encode response");
                Self {
                    status: 500,
                    body: FALLBACK_ERROR_BODY.to_vec(),
                }
            }
        }
    }

    /// Builds the response for a failed request.
    pub fn from_error(err: &ServerError) -> Self {
        Self::json(
            err.status_code(),
            &ErrorResponse {
                error: err.client_message(),
            },
        )
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> ServerResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ServerError::InvalidRequest(format!("Malformed body: {e}")))
}

/// The API server.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tagtrail_server::{
///     ApiRequest, ApiServer, AuthConfig, Endpoint, ServerConfig, TokenIdentityProvider,
/// };
/// use tagtrail_store::InMemoryStore;
///
/// let identity = Arc::new(TokenIdentityProvider::new(AuthConfig::new(b"secret".to_vec())));
/// let token = identity.issue_token("uid-1", "ada@example.com").unwrap();
/// let server = ApiServer::new(ServerConfig::default(), Arc::new(InMemoryStore::new()), identity);
///
/// let response = server.handle(&ApiRequest::post(Endpoint::SignUp, &token, r#"{"name":"Ada"}"#));
/// assert_eq!(response.status, 200);
/// ```
pub struct ApiServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl ApiServer {
    /// Creates a server over `store`, verifying callers with `identity`.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let profiles = ProfileRepository::new(store, config.max_write_retries);
        let context = Arc::new(HandlerContext::new(config, identity, profiles));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Creates a server over `store` that verifies HMAC tokens signed with
    /// `secret`, valid for `config.token_expiry`.
    pub fn with_secret(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        secret: Vec<u8>,
    ) -> Self {
        let auth = AuthConfig::new(secret).with_expiry(config.token_expiry);
        let identity = Arc::new(TokenIdentityProvider::new(auth));
        Self::new(config, store, identity)
    }

    /// Returns the profile repository.
    pub fn profiles(&self) -> &ProfileRepository {
        &self.context.profiles
    }

    /// Handles one request.
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let result = Endpoint::from_path(&request.path)
            .ok_or_else(|| ServerError::UnknownEndpoint(request.path.clone()))
            .and_then(|endpoint| {
                if !request.method.eq_ignore_ascii_case("POST") {
                    return Err(ServerError::MethodNotAllowed(request.method.clone()));
                }
                self.dispatch(endpoint, request)
            });

        match result {
            Ok(response) => {
                debug!(path = %request.path, status = response.status, "request handled");
                response
            }
            Err(e) => {
                if e.is_server_error() {
                    error!(path = %request.path, error = %e, "request failed");
                } else {
                    debug!(path = %request.path, error = %e, "request rejected");
                }
                ApiResponse::from_error(&e)
            }
        }
    }

    fn dispatch(&self, endpoint: Endpoint, request: &ApiRequest) -> ServerResult<ApiResponse> {
        let token = request
            .token()
            .ok_or_else(|| ServerError::AuthenticationFailed("missing token".into()))?;

        let response = match endpoint {
            Endpoint::SignUp => {
                let body = parse_body(&request.body)?;
                ApiResponse::json(200, &self.handler.handle_sign_up(&token, body)?)
            }
            Endpoint::SignIn => ApiResponse::json(200, &self.handler.handle_sign_in(&token)?),
            Endpoint::StoreHistory => {
                let body = parse_body(&request.body)?;
                ApiResponse::json(200, &self.handler.handle_store_history(&token, body)?)
            }
            Endpoint::StoreTag => {
                let body = parse_body(&request.body)?;
                ApiResponse::json(200, &self.handler.handle_store_tag(&token, body)?)
            }
            Endpoint::RemoveTag => {
                let body = parse_body(&request.body)?;
                ApiResponse::json(200, &self.handler.handle_remove_tag(&token, body)?)
            }
        };

        Ok(response)
    }
}
