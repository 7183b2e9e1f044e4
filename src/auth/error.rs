use thiserror::Error;

/// Failure kinds of the account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("user already exists")]
    DuplicateAccount,
    #[error("user not found")]
    AccountNotFound,
    #[error("invalid password")]
    InvalidCredentials,
    #[error("storage failure: {0}")]
    Storage(anyhow::Error),
    #[error("internal failure: {0}")]
    Internal(anyhow::Error),
}

impl AuthError {
    /// True for failures caused by the caller's input rather than the server.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCredentials
                | AuthError::DuplicateAccount
                | AuthError::AccountNotFound
                | AuthError::InvalidCredentials
        )
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Storage(e.into())
    }
}
