//! Admin password extraction.
//!
//! The extractor only reads the header. Handlers call
//! [`AdminPassword::authorize`] themselves as their first step, which is
//! where the password is checked and the lockout applies.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use stockroom_engine::{AdminGate, AdminGrant, Timestamp};

use crate::error::Result;
use crate::AppState;

/// Header carrying the admin password.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Admin password presented with a request, if any.
#[derive(Debug, Clone)]
pub struct AdminPassword(pub Option<String>);

impl AdminPassword {
    /// Check the password against the gate.
    pub fn authorize(&self, gate: &AdminGate, now: Timestamp) -> Result<AdminGrant> {
        let presented = self.0.as_deref().unwrap_or_default();
        gate.authorize(presented, now).map_err(|e| {
            tracing::warn!(error = %e, "Admin authorization refused");
            e.into()
        })
    }
}

impl FromRequestParts<AppState> for AdminPassword {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let password = parts
            .headers
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(AdminPassword(password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use stockroom_engine::Error;

    const NOW: Timestamp = 1_706_745_600_000;

    #[test]
    fn missing_header_is_refused() {
        let gate = AdminGate::new(Some("secret".into()), 5, 300);
        let result = AdminPassword(None).authorize(&gate, NOW);
        assert!(matches!(result, Err(AppError::Engine(Error::Unauthorized))));
    }

    #[test]
    fn correct_password_grants() {
        let gate = AdminGate::new(Some("secret".into()), 5, 300);
        let grant = AdminPassword(Some("secret".into()))
            .authorize(&gate, NOW)
            .unwrap();
        assert_eq!(grant.issued_at(), NOW);
    }
}
