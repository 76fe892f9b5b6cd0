//! Request handlers for the account and bookmark endpoints.

use crate::auth::{Identity, IdentityProvider};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult, MSG_NOT_FOUND, MSG_TAKEN};
use crate::messages::{
    SignUpRequest, SitesResponse, TagRequest, TaggedResponse, VisitRequest, WelcomeResponse,
};
use crate::repository::ProfileRepository;
use chrono::Utc;
use std::sync::Arc;
use tagtrail_core::{attach_tag, detach_tag, provision, record_visit, DisplayName};
use tracing::{debug, info, warn};

/// Context shared by all handlers.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Identity collaborator.
    pub identity: Arc<dyn IdentityProvider>,
    /// Profile storage.
    pub profiles: ProfileRepository,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(
        config: ServerConfig,
        identity: Arc<dyn IdentityProvider>,
        profiles: ProfileRepository,
    ) -> Self {
        Self {
            config,
            identity,
            profiles,
        }
    }
}

/// Handler for endpoint requests.
///
/// Each method verifies the token first and then performs exactly one
/// profile read (sign-in), create (sign-up) or read-reconcile-write cycle.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    fn authenticate(&self, token: &str) -> ServerResult<Identity> {
        self.context.identity.verify(token)
    }

    /// Creates the caller's profile.
    ///
    /// A rejected display name also deletes the caller's account at the
    /// identity provider. That deletion is best-effort: its failure is
    /// logged and does not change the reported error.
    pub fn handle_sign_up(
        &self,
        token: &str,
        request: SignUpRequest,
    ) -> ServerResult<WelcomeResponse> {
        let identity = self.authenticate(token)?;
        let config = &self.context.config;

        let display_name = match DisplayName::parse_within(
            &request.name,
            config.display_name_min,
            config.display_name_max,
        ) {
            Ok(name) => name,
            Err(e) => {
                info!(subject = %identity.subject, error = %e, "sign-up rejected");
                self.compensate(&identity.subject);
                return Err(e.into());
            }
        };

        if self.context.profiles.exists(&identity.subject)? {
            return Err(ServerError::Conflict(MSG_TAKEN.into()));
        }

        let profile = provision(&identity.email, &display_name, &mut rand::thread_rng());
        self.context.profiles.create(&identity.subject, &profile)?;
        info!(subject = %identity.subject, username = %profile.name, "account created");

        Ok(WelcomeResponse {
            success: format!("Welcome, {}!", profile.display_name),
            user: profile.public_view(),
        })
    }

    fn compensate(&self, subject: &str) {
        match self.context.identity.delete_account(subject) {
            Ok(()) => debug!(subject, "identity account deleted"),
            Err(e) => warn!(subject, error = %e, "compensating account deletion failed"),
        }
    }

    /// Returns the caller's stored profile.
    pub fn handle_sign_in(&self, token: &str) -> ServerResult<WelcomeResponse> {
        let identity = self.authenticate(token)?;
        let profile = self
            .context
            .profiles
            .load(&identity.subject)?
            .ok_or_else(|| ServerError::NotFound(MSG_NOT_FOUND.into()))?;

        Ok(WelcomeResponse {
            success: format!("Welcome back, {}!", profile.display_name),
            user: profile.public_view(),
        })
    }

    /// Records a visit in the caller's history.
    pub fn handle_store_history(
        &self,
        token: &str,
        request: VisitRequest,
    ) -> ServerResult<SitesResponse> {
        let identity = self.authenticate(token)?;
        let profile = self.context.profiles.update(&identity.subject, |profile| {
            record_visit(profile, &request.site, &request.site_name, Utc::now())
        })?;

        Ok(SitesResponse {
            sites: profile.sites,
        })
    }

    /// Attaches a tag to one of the caller's sites.
    pub fn handle_store_tag(
        &self,
        token: &str,
        request: TagRequest,
    ) -> ServerResult<TaggedResponse> {
        let identity = self.authenticate(token)?;
        let profile = self.context.profiles.update(&identity.subject, |profile| {
            attach_tag(profile, &request.site, &request.tag)
        })?;

        Ok(TaggedResponse {
            sites: profile.sites,
            tags: profile.tags,
        })
    }

    /// Detaches a tag from one of the caller's sites.
    pub fn handle_remove_tag(
        &self,
        token: &str,
        request: TagRequest,
    ) -> ServerResult<TaggedResponse> {
        let identity = self.authenticate(token)?;
        let profile = self.context.profiles.update(&identity.subject, |profile| {
            detach_tag(profile, &request.site, &request.tag)
        })?;

        Ok(TaggedResponse {
            sites: profile.sites,
            tags: profile.tags,
        })
    }
}
