//! Credential normalization and the obfuscated-account token.
//!
//! Normalization is a pure function of the raw config and the app key: the
//! password is base64-encoded at most once, and the identity is suffixed with
//! the tenant identifier decoded out of the app key.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::Value;

use crate::chat_url::encode_component;
use crate::config::{AuthConfig, AuthType};

/// Credentials after one-time normalization.
///
/// Serializes with the wire field names the chat application expects, which
/// is also the shape base64-encoded into the dev-mode account token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAuth {
    pub auth_type: AuthTypeWire,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_password: Option<String>,
}

/// Wire spelling of [`AuthType`] for serialized tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthTypeWire {
    Guest,
    Dev,
}

impl From<AuthType> for AuthTypeWire {
    fn from(value: AuthType) -> Self {
        match value {
            AuthType::Guest => Self::Guest,
            AuthType::Dev => Self::Dev,
        }
    }
}

impl NormalizedAuth {
    /// Anonymous default used when the host supplies no credentials.
    #[must_use]
    pub fn guest() -> Self {
        Self { auth_type: AuthTypeWire::Guest, user_identity: None, user_password: None }
    }

    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        match self.auth_type {
            AuthTypeWire::Guest => AuthType::Guest,
            AuthTypeWire::Dev => AuthType::Dev,
        }
    }
}

/// Normalize raw credentials against the tenant `app_key`.
///
/// Absent config yields the guest default. Otherwise the password is
/// base64-encoded unless it already is (idempotent re-normalization), and the
/// identity becomes `urlencode(identity + "." + tenant_identifier)`.
#[must_use]
pub fn normalize(raw: Option<AuthConfig>, app_key: &str) -> NormalizedAuth {
    let Some(raw) = raw else {
        return NormalizedAuth::guest();
    };

    let user_password = raw.user_password.map(|password| {
        if is_base64(&password) {
            password
        } else {
            STANDARD.encode(password)
        }
    });

    let user_identity = raw.user_identity.map(|identity| match tenant_identifier(app_key) {
        Some(identifier) => encode_component(&format!("{identity}.{identifier}")),
        None => {
            log::warn!("app key is not valid base64; leaving user identity unsuffixed");
            encode_component(&identity)
        }
    });

    NormalizedAuth {
        auth_type: raw.auth_type.into(),
        user_identity,
        user_password,
    }
}

/// Tenant identifier: the segment before the first `:` of the decoded key.
fn tenant_identifier(app_key: &str) -> Option<String> {
    let decoded = STANDARD.decode(app_key).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let identifier = text.split(':').next().unwrap_or_default();
    if identifier.is_empty() {
        None
    } else {
        Some(identifier.to_owned())
    }
}

/// Whether `value` round-trips as strict base64 (used to keep password
/// encoding idempotent).
#[must_use]
pub fn is_base64(value: &str) -> bool {
    !value.is_empty() && STANDARD.decode(value).is_ok()
}

/// Account token posted to the chat iframe on first open.
///
/// Guests reuse whatever account the chat previously persisted (may be
/// absent); dev auth sends the whole normalized config base64-encoded.
#[must_use]
pub fn obfuscated_user_account(auth: &NormalizedAuth, stored: Option<Value>) -> Option<Value> {
    match auth.auth_type() {
        AuthType::Guest => stored,
        AuthType::Dev => serde_json::to_string(auth)
            .ok()
            .map(|json| Value::String(STANDARD.encode(json))),
    }
}
