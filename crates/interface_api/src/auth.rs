//! Authentication and authorization
//!
//! Bearer JWTs carry the caller's id in `sub` and a list of roles. The
//! `admin` role passes every permission check; other roles are granted the
//! permissions listed in [`permissions_for`]. Agents may only act on their
//! own account.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{AgentId, UserId};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID; for agents, the agent ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
    #[error("Agents may only act on their own account")]
    NotOwner,
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `subject` - User or agent identifier
/// * `roles` - Caller's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    subject: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: subject.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == roles::ADMIN)
}

/// Role names
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const FINANCE: &str = "finance";
    pub const AGENT: &str = "agent";
    /// Application workflow callers that create commissions
    pub const WORKFLOW: &str = "workflow";
}

/// Permission definitions
pub mod permissions {
    pub const RULE_READ: &str = "rule:read";
    pub const RULE_WRITE: &str = "rule:write";
    pub const COMMISSION_READ: &str = "commission:read";
    pub const COMMISSION_CREATE: &str = "commission:create";
    pub const COMMISSION_APPROVE: &str = "commission:approve";
    pub const EARNINGS_READ: &str = "earnings:read";
    pub const PAYOUT_READ: &str = "payout:read";
    pub const PAYOUT_REQUEST: &str = "payout:request";
    pub const PAYOUT_PROCESS: &str = "payout:process";
}

/// Permissions granted by a non-admin role
pub fn permissions_for(role: &str) -> &'static [&'static str] {
    use permissions::*;
    match role {
        roles::FINANCE => &[
            RULE_READ,
            COMMISSION_READ,
            COMMISSION_APPROVE,
            EARNINGS_READ,
            PAYOUT_READ,
            PAYOUT_PROCESS,
        ],
        roles::AGENT => &[COMMISSION_READ, EARNINGS_READ, PAYOUT_READ, PAYOUT_REQUEST],
        roles::WORKFLOW => &[COMMISSION_CREATE, COMMISSION_READ],
        _ => &[],
    }
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == roles::ADMIN)
    }

    /// Back-office callers see every agent; agents only themselves
    pub fn is_back_office(&self) -> bool {
        self.roles.iter().any(|r| r != roles::AGENT)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin()
            || self
                .roles
                .iter()
                .any(|r| r == permission || permissions_for(r).contains(&permission))
    }

    /// Fails unless the caller holds `permission`
    pub fn require(&self, permission: &str) -> Result<(), AuthError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AuthError::MissingPermission(permission.to_string()))
        }
    }

    /// The caller as a back-office user
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    /// The caller as an agent, if the token subject is an agent
    pub fn agent_id(&self) -> Option<AgentId> {
        if has_role(self, roles::AGENT) && !self.is_admin() {
            self.sub.parse().ok()
        } else {
            None
        }
    }

    /// Fails if an agent caller targets another agent's account
    pub fn require_access_to(&self, agent_id: AgentId) -> Result<(), AuthError> {
        if self.is_back_office() {
            return Ok(());
        }
        match self.agent_id() {
            Some(own) if own == agent_id => Ok(()),
            _ => Err(AuthError::NotOwner),
        }
    }
}
