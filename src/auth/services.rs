use tracing::{debug, info, warn};

use super::{
    error::AuthError,
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking},
    repo::UserStore,
    repo_types::{NewUser, User},
};

/// Raw registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
}

fn require_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(())
}

/// Creates a user after checking that the username is free.
pub async fn register(users: &dyn UserStore, reg: Registration) -> Result<User, AuthError> {
    require_credentials(&reg.username, &reg.password)?;

    if users.find_by_username(&reg.username).await?.is_some() {
        warn!(username = %reg.username, "username already registered");
        return Err(AuthError::DuplicateAccount);
    }

    let password_hash = hash_password_blocking(reg.password)
        .await
        .map_err(AuthError::Internal)?;

    let user = users
        .insert(NewUser {
            first_name: reg.first_name,
            last_name: reg.last_name,
            username: reg.username,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks credentials and returns a signed token.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    username: &str,
    password: &str,
) -> Result<String, AuthError> {
    require_credentials(username, password)?;

    let user = users
        .find_by_username(username)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    let ok = verify_password_blocking(password.to_string(), user.password_hash.clone())
        .await
        .map_err(AuthError::Internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = keys
        .sign(user.id, &user.username)
        .map_err(AuthError::Internal)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(token)
}

/// Tokens are not tracked server-side, so there is nothing to revoke.
pub fn logout() {
    debug!("logout acknowledged");
}
