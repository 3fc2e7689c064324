use std::fmt;

use base64::Engine;

use super::error::BitbucketError;

/// Bitbucket username and app password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    app_password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, app_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            app_password: app_password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

/// Derives the `Authorization` header for Basic auth.
#[derive(Debug, Clone)]
pub struct AuthProvider {
    credentials: Credentials,
}

impl AuthProvider {
    pub fn new(credentials: Credentials) -> Result<Self, BitbucketError> {
        if credentials.username.is_empty() || credentials.app_password.is_empty() {
            return Err(BitbucketError::Configuration(
                "Username and app password are required for authentication".to_string(),
            ));
        }
        Ok(Self { credentials })
    }

    pub fn auth_header_value(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.credentials.username, self.credentials.app_password
        );
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }
}
