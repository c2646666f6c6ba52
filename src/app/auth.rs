use subtle::ConstantTimeEq;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Authorized,
    Unauthorized,
}

/// Shared-secret check applied before any other request processing.
#[derive(Clone)]
pub struct AuthGate {
    secret: String,
}

impl AuthGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn check(&self, credential: Option<&str>) -> AuthDecision {
        let valid = match credential {
            Some(provided) => provided.as_bytes().ct_eq(self.secret.as_bytes()).into(),
            None => false,
        };
        if valid {
            AuthDecision::Authorized
        } else {
            AuthDecision::Unauthorized
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").field("secret", &"<redacted>").finish()
    }
}
