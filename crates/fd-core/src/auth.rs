//! Identity provider capability
//!
//! The dashboard never talks to the identity provider's scripts directly. A
//! provider hands back an opaque credential which is then exchanged with the
//! backend for a session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque credential issued by an identity provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Backend session obtained by exchanging a credential
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Something that can sign a user in and return a credential
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Run the provider's sign-in flow
    async fn sign_in(&self) -> anyhow::Result<Credential>;

    /// Name shown in logs
    fn provider_name(&self) -> &str;
}

/// Provider returning a credential that was obtained out of band
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait::async_trait]
impl AuthProvider for StaticCredentialProvider {
    async fn sign_in(&self) -> anyhow::Result<Credential> {
        Ok(self.credential.clone())
    }

    fn provider_name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_hides_secrets() {
        let credential = Credential::new("secret-token");
        assert!(!format!("{:?}", credential).contains("secret"));

        let session = Session {
            access_token: "secret-session".to_string(),
            email: Some("analyst@example.com".to_string()),
            name: None,
        };
        assert!(!format!("{:?}", session).contains("secret"));
    }

    #[tokio::test]
    async fn test_static_provider_returns_its_credential() {
        let provider = StaticCredentialProvider::new(Credential::new("abc"));
        let credential = provider.sign_in().await.unwrap();
        assert_eq!(credential.as_str(), "abc");
        assert_eq!(provider.provider_name(), "static");
    }
}
