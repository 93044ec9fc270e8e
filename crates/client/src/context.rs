//! Explicit session object shared by every operation.

use chrono::Utc;
use tokio::sync::RwLock;

use retailerp_auth::{
    AuthenticatedUser, Permission, SessionClaims, SessionInfo, TokenValidationError, authorize,
    validate_claims,
};
use retailerp_shipping::ShippingRule;

use crate::busy::{BusyGuard, InFlight};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::reference::StockLocation;

/// Session state: the API client, the signed-in user and cached reference data.
///
/// Nothing here is global; callers own the context and pass it around.
#[derive(Debug)]
pub struct AppContext {
    pub(crate) api: ApiClient,
    pub(crate) user: RwLock<Option<AuthenticatedUser>>,
    pub(crate) claims: RwLock<Option<SessionClaims>>,
    pub(crate) stocks: RwLock<Option<Vec<StockLocation>>>,
    pub(crate) shipping_rules: RwLock<Option<Vec<ShippingRule>>>,
    pub(crate) in_flight: InFlight,
}

impl AppContext {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::with_client(ApiClient::new(config)?))
    }

    pub fn with_client(api: ApiClient) -> Self {
        Self {
            api,
            user: RwLock::new(None),
            claims: RwLock::new(None),
            stocks: RwLock::new(None),
            shipping_rules: RwLock::new(None),
            in_flight: InFlight::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Fetch the current user from the backend and cache it.
    ///
    /// A session window outside `now` leaves nothing cached.
    pub async fn load_session(&self) -> ClientResult<AuthenticatedUser> {
        if !self.api.has_token() {
            return Err(ClientError::Unauthenticated(
                "no auth token configured".to_string(),
            ));
        }
        let session: SessionInfo = self.api.get("/auth/me").await?;
        let claims = session.claims();
        if let Some(claims) = &claims
            && let Err(err) = validate_claims(claims, Utc::now())
        {
            *self.user.write().await = None;
            *self.claims.write().await = None;
            tracing::warn!(user_id = %claims.sub, expires_at = %claims.expires_at, error = %err, "session rejected");
            return Err(session_error(err));
        }

        let user = session.user;
        tracing::info!(
            user_id = %user.id,
            expires_at = ?claims.as_ref().map(|c| c.expires_at),
            "session loaded"
        );
        *self.user.write().await = Some(user.clone());
        *self.claims.write().await = claims;
        Ok(user)
    }

    pub async fn current_user(&self) -> Option<AuthenticatedUser> {
        self.user.read().await.clone()
    }

    pub async fn session_claims(&self) -> Option<SessionClaims> {
        self.claims.read().await.clone()
    }

    /// Drop the cached user and all reference data.
    pub async fn clear(&self) {
        *self.user.write().await = None;
        *self.claims.write().await = None;
        *self.stocks.write().await = None;
        *self.shipping_rules.write().await = None;
        tracing::info!("session cleared");
    }

    /// Advisory permission check against the cached user.
    pub async fn require(&self, permission: &Permission) -> ClientResult<()> {
        if let Some(claims) = self.claims.read().await.as_ref() {
            validate_claims(claims, Utc::now()).map_err(session_error)?;
        }
        let user = self.user.read().await;
        let user = user.as_ref().ok_or_else(|| {
            ClientError::Unauthenticated("no session loaded".to_string())
        })?;
        authorize(user, permission)?;
        Ok(())
    }

    pub(crate) fn begin(&self, action: impl Into<String>) -> ClientResult<BusyGuard> {
        self.in_flight.begin(action)
    }
}

fn session_error(err: TokenValidationError) -> ClientError {
    match err {
        TokenValidationError::InvalidTimeWindow => ClientError::Schema {
            endpoint: "GET /auth/me".to_string(),
            detail: err.to_string(),
        },
        TokenValidationError::Expired | TokenValidationError::NotYetValid => {
            ClientError::Unauthenticated(err.to_string())
        }
    }
}
