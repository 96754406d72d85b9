//! # chat-widget
//!
//! Embeddable chat launcher for host web pages. The widget renders a floating
//! button (or fills a host-supplied container), lazily mounts an iframe
//! pointing at the hosted chat application, and relays a small postMessage
//! protocol between that iframe and the host page's localStorage.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pure logic (auth normalization, URL construction, storage expiry, template
//! rendering, message routing) lives in ungated modules and tests natively.
//! Everything that touches the DOM is gated behind the `web` feature so the
//! crate compiles on non-WASM targets with graceful no-ops.

pub mod auth;
pub mod chat_url;
pub mod config;
pub mod messages;
pub mod storage;
pub mod template;
pub mod widget;
