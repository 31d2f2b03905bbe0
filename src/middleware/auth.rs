//! Bearer-token authorization.
//!
//! Tokens are issued by the identity service; this service only verifies
//! them. The [`AuthUser`] extractor authenticates once at the entry point of
//! a protected handler, and handlers demand a named [`Capability`] before
//! entering the flow, replacing per-route decode-and-lookup blocks.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppErrorKind, AppResult, AuthError};

/// Account roles as issued in tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Super Admin")]
    SuperAdmin,
    #[serde(rename = "Admin")]
    Admin,
    #[serde(rename = "Intern")]
    Intern,
}

/// Named permissions demanded by protected entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create campaigns and edit their goals/dates
    ManageCampaigns,
    /// List campaigns and donations attributed to the caller
    ViewOwnCampaigns,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManageCampaigns => "manage-campaigns",
            Capability::ViewOwnCampaigns => "view-own-campaigns",
        }
    }
}

impl Role {
    pub fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageCampaigns => {
                matches!(self, Role::SuperAdmin | Role::Admin)
            }
            Capability::ViewOwnCampaigns => true,
        }
    }
}

/// Token claims as issued by the identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub id: Uuid,
    pub role: Role,
    /// Expiration (unix timestamp), checked by the decoder
    pub exp: i64,
}

/// Verifies HS256 bearer tokens against the shared secret
#[derive(Clone)]
pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                AppError::new(AppErrorKind::Auth(AuthError::InvalidToken {
                    reason: e.to_string(),
                }))
            })
    }
}

/// Authenticated caller, extracted from the Authorization header
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Demand a capability; 403 when the role does not grant it.
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.role.grants(capability) {
            return Ok(());
        }
        Err(AppError::new(AppErrorKind::Auth(
            AuthError::MissingCapability {
                capability: capability.as_str().to_string(),
            },
        )))
    }
}

fn bearer_token(parts: &Parts) -> AppResult<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(AppErrorKind::Auth(AuthError::MissingToken)))?;

    Ok(header.strip_prefix("Bearer ").unwrap_or(header).trim())
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<AuthVerifier>::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = verifier.verify(token)?;

        Ok(AuthUser {
            id: claims.id,
            role: claims.role,
        })
    }
}
