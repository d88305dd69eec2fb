use thiserror::Error;

/// Failures reported by an [`crate::backend::Authenticator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("The email or password is incorrect.")]
    InvalidCredentials,
    #[error("The email address is already in use by another account.")]
    EmailExists,
    #[error("Password should be at least {min} characters.")]
    WeakPassword { min: usize },
    #[error("The email address is badly formatted.")]
    InvalidEmail,
    #[error("Too many attempts, try again later.")]
    TooManyAttempts,
    #[error("network error: {0}")]
    Transport(String),
    #[error("{0}")]
    Backend(String),
}

impl AuthError {
    /// Maps identity toolkit error codes (`EMAIL_NOT_FOUND`, `WEAK_PASSWORD : ...`) to variants.
    pub fn from_identity_code(raw: &str) -> Self {
        let code = raw.split(':').next().unwrap_or(raw).trim();
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "USER_DISABLED" => AuthError::InvalidCredentials,
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "WEAK_PASSWORD" => AuthError::WeakPassword { min: 6 },
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
            _ => AuthError::Backend(raw.trim().to_string()),
        }
    }
}

/// Failures reported by a [`crate::backend::DocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("No document to update: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("Missing or insufficient permissions.")]
    PermissionDenied,
    #[error("Not signed in.")]
    NotSignedIn,
    #[error("network error: {0}")]
    Transport(String),
    #[error("malformed document: {0}")]
    Decode(String),
    #[error("{0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AuthError;

    #[test]
    fn identity_codes_map_to_variants() {
        assert_eq!(
            AuthError::from_identity_code("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::from_identity_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::WeakPassword { min: 6 }
        );
        assert_eq!(
            AuthError::from_identity_code("SOMETHING_NEW"),
            AuthError::Backend("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn weak_password_message_names_minimum() {
        let msg = AuthError::WeakPassword { min: 6 }.to_string();
        assert_eq!(msg, "Password should be at least 6 characters.");
    }
}
