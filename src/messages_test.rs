use super::*;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

const CLOSED_WIDGET: RouterContext = RouterContext { has_external_target: false, is_open: false };

// =============================================================
// parse
// =============================================================

#[test]
fn parse_requires_a_numeric_code() {
    assert_eq!(Inbound::parse(&json!({"code": "1"})), None);
    assert_eq!(Inbound::parse(&json!({})), None);
    assert_eq!(Inbound::parse(&json!(null)), None);
}

#[test]
fn parse_ignores_unknown_codes() {
    assert_eq!(Inbound::parse(&json!({"code": 99})), None);
}

#[test]
fn parse_create_account_requires_the_payload_field() {
    assert_eq!(Inbound::parse(&json!({"code": CREATE_ACCOUNT})), None);
    assert_eq!(Inbound::parse(&json!({"code": CREATE_ACCOUNT, "userAccount": 7})), None);
}

// =============================================================
// route
// =============================================================

#[test]
fn chat_ready_reveals_launcher_without_external_target() {
    let inbound = Inbound::parse(&json!({"code": CHAT_READY})).expect("parses");
    assert_eq!(route(inbound, CLOSED_WIDGET), Some(Action::RevealLauncher));
}

#[test]
fn chat_ready_opens_chat_with_external_target() {
    let ctx = RouterContext { has_external_target: true, is_open: false };
    let inbound = Inbound::parse(&json!({"code": CHAT_READY})).expect("parses");
    assert_eq!(route(inbound, ctx), Some(Action::OpenChat));
}

#[test]
fn create_account_decodes_base64_json_payload() {
    let account = json!({"fullName": "Visitor", "email": "visitor@example.com"});
    let encoded = STANDARD.encode(account.to_string());
    let inbound =
        Inbound::parse(&json!({"code": CREATE_ACCOUNT, "userAccount": encoded})).expect("parses");
    assert_eq!(route(inbound, CLOSED_WIDGET), Some(Action::StoreAccount(account)));
}

#[test]
fn create_account_with_malformed_payload_is_dropped() {
    let not_base64 =
        Inbound::parse(&json!({"code": CREATE_ACCOUNT, "userAccount": "%%%"})).expect("parses");
    assert_eq!(route(not_base64, CLOSED_WIDGET), None);

    let not_json = Inbound::parse(
        &json!({"code": CREATE_ACCOUNT, "userAccount": STANDARD.encode("not json")}),
    )
    .expect("parses");
    assert_eq!(route(not_json, CLOSED_WIDGET), None);
}

#[test]
fn chat_connected_notifies_the_host() {
    let inbound = Inbound::parse(&json!({"code": CHAT_CONNECTED})).expect("parses");
    assert_eq!(route(inbound, CLOSED_WIDGET), Some(Action::NotifyLoaded));
}

#[test]
fn parent_notification_only_surfaces_while_closed() {
    let payload = json!({"code": PARENT_NOTIFICATION, "content": "new message"});
    let inbound = Inbound::parse(&payload).expect("parses");

    let open = RouterContext { has_external_target: false, is_open: true };
    assert_eq!(route(inbound.clone(), open), None);
    assert_eq!(route(inbound, CLOSED_WIDGET), Some(Action::LogNotification(payload)));
}

// =============================================================
// outbound payloads
// =============================================================

#[test]
fn start_connection_carries_the_account_or_null() {
    assert_eq!(
        start_connection(None),
        json!({"code": START_CONNECTION, "userAccount": null})
    );

    let account = json!({"email": "visitor@example.com"});
    assert_eq!(
        start_connection(Some(account.clone())),
        json!({"code": START_CONNECTION, "userAccount": account})
    );
}

#[test]
fn send_message_wraps_the_content() {
    assert_eq!(send_message("hello"), json!({"code": SEND_MESSAGE, "content": "hello"}));
}
