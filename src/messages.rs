//! Cross-window postMessage protocol: codes, parsing, and routing.
//!
//! SYSTEM CONTEXT
//! ==============
//! The chat iframe and the host window exchange JSON payloads of the shape
//! `{"code": <int>, ...}`. Parsing and routing are pure: the router turns an
//! inbound message plus a snapshot of widget state into an [`Action`], and
//! the DOM layer applies actions. Messages may arrive before the widget has
//! finished mounting; actions are written so that applying them against a
//! half-built DOM is a no-op.

#[cfg(test)]
#[path = "messages_test.rs"]
mod messages_test;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

/// Iframe reports its UI is ready to be revealed.
pub const CHAT_READY: i64 = 1;
/// Iframe assigned a visitor account; payload carries it base64-encoded.
pub const CREATE_ACCOUNT: i64 = 2;
/// Iframe established its connection to the chat service.
pub const CHAT_CONNECTED: i64 = 3;
/// Iframe forwards a notification intended for the host page.
pub const PARENT_NOTIFICATION: i64 = 4;
/// Host starts the chat session, optionally carrying a visitor account.
pub const START_CONNECTION: i64 = 5;
/// Host pushes a message into the conversation.
pub const SEND_MESSAGE: i64 = 6;

/// Messages the iframe sends to the host window.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    ChatReady,
    CreateAccount { user_account: String },
    ChatConnected,
    ParentNotification { payload: Value },
}

impl Inbound {
    /// Tolerant parse of a postMessage payload. Unknown codes, missing
    /// fields, and non-object payloads all yield `None`.
    #[must_use]
    pub fn parse(data: &Value) -> Option<Self> {
        match data.get("code").and_then(Value::as_i64)? {
            CHAT_READY => Some(Self::ChatReady),
            CREATE_ACCOUNT => {
                let user_account = data.get("userAccount").and_then(Value::as_str)?.to_owned();
                Some(Self::CreateAccount { user_account })
            }
            CHAT_CONNECTED => Some(Self::ChatConnected),
            PARENT_NOTIFICATION => Some(Self::ParentNotification { payload: data.clone() }),
            other => {
                log::debug!("ignoring message with unknown code {other}");
                None
            }
        }
    }
}

/// Widget-state snapshot the router dispatches against.
#[derive(Clone, Copy, Debug)]
pub struct RouterContext {
    /// The host supplied its own container element.
    pub has_external_target: bool,
    /// The chat is currently in the opened visual state.
    pub is_open: bool,
}

/// Effect the DOM layer applies in response to an inbound message.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Make the floating launcher visible.
    RevealLauncher,
    /// Trigger the open transition (host-controlled placement).
    OpenChat,
    /// Persist the decoded visitor account.
    StoreAccount(Value),
    /// Fire the host's `on_load` callback.
    NotifyLoaded,
    /// Surface a notification that arrived while the chat was closed.
    LogNotification(Value),
}

/// Route an inbound message to its effect, if any.
#[must_use]
pub fn route(inbound: Inbound, ctx: RouterContext) -> Option<Action> {
    match inbound {
        Inbound::ChatReady => {
            if ctx.has_external_target {
                Some(Action::OpenChat)
            } else {
                Some(Action::RevealLauncher)
            }
        }
        Inbound::CreateAccount { user_account } => {
            decode_account(&user_account).map(Action::StoreAccount)
        }
        Inbound::ChatConnected => Some(Action::NotifyLoaded),
        Inbound::ParentNotification { payload } => {
            if ctx.is_open {
                None
            } else {
                Some(Action::LogNotification(payload))
            }
        }
    }
}

/// Decode a base64 account payload into JSON. Malformed payloads are logged
/// and dropped; a bad account must never break the host page.
fn decode_account(user_account: &str) -> Option<Value> {
    let bytes = match STANDARD.decode(user_account) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("account payload is not valid base64: {err}");
            return None;
        }
    };
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("account payload is not valid utf-8: {err}");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("account payload is not valid JSON: {err}");
            None
        }
    }
}

/// Payload posted to the iframe when the session starts. `user_account` is
/// `null` for first-time guests.
#[must_use]
pub fn start_connection(user_account: Option<Value>) -> Value {
    json!({ "code": START_CONNECTION, "userAccount": user_account })
}

/// Payload posted to the iframe for [`SEND_MESSAGE`].
#[must_use]
pub fn send_message(content: &str) -> Value {
    json!({ "code": SEND_MESSAGE, "content": content })
}
