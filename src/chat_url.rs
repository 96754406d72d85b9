//! Chat application URL construction per deployment environment.

#[cfg(test)]
#[path = "chat_url_test.rs"]
mod chat_url_test;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::config::{AuthType, Environment};

pub const CHAT_URL_LOCAL: &str = "http://localhost:8090";
pub const CHAT_URL_HOMOLOG: &str = "https://chat.hmg.chatwidget.io";
pub const CHAT_URL_PRODUCTION: &str = "https://chat.chatwidget.io";

// encodeURIComponent leaves alphanumerics and -_.!~*'() untouched.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single query component.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Base URL for an environment.
#[must_use]
pub fn base_url(environment: Environment) -> &'static str {
    match environment {
        Environment::Local => CHAT_URL_LOCAL,
        Environment::Homolog => CHAT_URL_HOMOLOG,
        Environment::Production => CHAT_URL_PRODUCTION,
    }
}

/// Build the iframe src: `<base>?appKey=<urlencoded>[&authType=<type>]`.
///
/// `auth_type` is appended only when the host supplied an auth config.
#[must_use]
pub fn build(environment: Environment, app_key: &str, auth_type: Option<AuthType>) -> String {
    let mut url = format!("{}?appKey={}", base_url(environment), encode_component(app_key));
    if let Some(auth_type) = auth_type {
        url.push_str("&authType=");
        url.push_str(auth_type.as_str());
    }
    url
}
