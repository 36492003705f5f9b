//! HTTP Basic authentication and role checks
//!
//! Accounts come from configuration. Passwords are held only as bcrypt
//! hashes, and checked on the blocking pool.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::config::{AccountConfig, Config};
use crate::{ApiError, AppState};

pub const REALM: &str = "geosections";
pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to hash password of '{username}': {source}")]
    Hash {
        username: String,
        source: bcrypt::BcryptError,
    },
}

/// Authenticated caller, available to handlers as a request extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.roles.iter().any(|r| roles.contains(&r.as_str()))
    }
}

#[derive(Debug)]
struct Account {
    username: String,
    password_hash: String,
    roles: Vec<String>,
}

/// In-memory account store
#[derive(Debug, Default)]
pub struct UserStore {
    accounts: Vec<Account>,
}

impl UserStore {
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        let mut store = Self::default();
        store.add(&config.user, config.password_cost)?;
        store.add(&config.admin, config.password_cost)?;
        Ok(store)
    }

    /// Hash and store an account, replacing one with the same username
    pub fn add(&mut self, account: &AccountConfig, cost: u32) -> Result<(), AuthError> {
        let password_hash =
            bcrypt::hash(&account.password, cost).map_err(|source| AuthError::Hash {
                username: account.username.clone(),
                source,
            })?;

        self.accounts.retain(|a| a.username != account.username);
        self.accounts.push(Account {
            username: account.username.clone(),
            password_hash,
            roles: account.roles.clone(),
        });
        Ok(())
    }

    /// Check credentials, returning the principal on success.
    ///
    /// Runs a full bcrypt verification, so call it off the async workers.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Principal> {
        let account = self.accounts.iter().find(|a| a.username == username)?;

        match bcrypt::verify(password, &account.password_hash) {
            Ok(true) => Some(Principal {
                username: account.username.clone(),
                roles: account.roles.clone(),
            }),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!("Unusable password hash for user '{}': {}", username, e);
                None
            }
        }
    }
}

/// Decode `Authorization: Basic <base64(user:password)>`
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

async fn authorize(
    state: &AppState,
    request: &mut Request,
    roles: &[&str],
) -> Result<(), ApiError> {
    let (username, password) =
        basic_credentials(request.headers()).ok_or(ApiError::Unauthorized)?;

    let users = state.users.clone();
    let candidate = username.clone();
    let principal =
        tokio::task::spawn_blocking(move || users.authenticate(&candidate, &password)).await?;

    let Some(principal) = principal else {
        tracing::debug!("Rejected credentials for user '{}'", username);
        return Err(ApiError::Unauthorized);
    };

    if !principal.has_any_role(roles) {
        tracing::warn!(
            "User '{}' denied access to {}",
            principal.username,
            request.uri().path()
        );
        return Err(ApiError::Forbidden);
    }

    request.extensions_mut().insert(principal);
    Ok(())
}

/// Middleware for routes open to any configured account
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, &mut request, &[ROLE_USER, ROLE_ADMIN]).await?;
    Ok(next.run(request).await)
}

/// Middleware for import and export routes
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, &mut request, &[ROLE_ADMIN]).await?;
    Ok(next.run(request).await)
}
