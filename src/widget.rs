//! DOM widget controller: launcher, iframe lifecycle, and event wiring.
//!
//! ARCHITECTURE
//! ============
//! [`ChatWidget`] owns an `Rc`-shared inner object; every event-listener
//! closure captures its own clone of that handle, so no module-level alias
//! is needed and `destroy()` can drop the message listener deterministically.
//! The message path is parse → route → apply: routing is pure
//! (`crate::messages`), and applying an action against a DOM that has not
//! finished mounting is a no-op.

#[cfg(test)]
#[path = "widget_test.rs"]
mod widget_test;

/// Delay before the opened class is applied, giving the CSS transition a
/// starting frame.
#[cfg(feature = "web")]
pub(crate) const OPEN_DELAY_MS: u32 = 100;

/// Gap between the launcher and the iframe bottom edge.
#[cfg(feature = "web")]
pub(crate) const LAUNCHER_GAP_PX: u32 = 15;

/// Height subtracted from the window when capping the iframe.
#[cfg(feature = "web")]
pub(crate) const IFRAME_HEIGHT_INSET_PX: f64 = 250.0;

/// Effect of one open/close toggle.
#[cfg(any(test, feature = "web"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToggleEffect {
    Open { first_open: bool },
    Close,
}

/// Decide what a toggle does from the current state. The session connection
/// starts on the first open only and never restarts on reopen.
#[cfg(any(test, feature = "web"))]
pub(crate) fn next_toggle(is_open: bool, connection_started: bool) -> ToggleEffect {
    if is_open {
        ToggleEffect::Close
    } else {
        ToggleEffect::Open { first_open: !connection_started }
    }
}

#[cfg(feature = "web")]
use std::cell::RefCell;
#[cfg(feature = "web")]
use std::rc::Rc;

#[cfg(feature = "web")]
use gloo_timers::callback::Timeout;
#[cfg(feature = "web")]
use serde_json::Value;
#[cfg(feature = "web")]
use wasm_bindgen::JsCast;
#[cfg(feature = "web")]
use wasm_bindgen::closure::Closure;
#[cfg(feature = "web")]
use web_sys::{Document, HtmlElement, HtmlIFrameElement, HtmlImageElement, MessageEvent, Window};

#[cfg(feature = "web")]
use crate::auth;
#[cfg(feature = "web")]
use crate::chat_url;
#[cfg(feature = "web")]
use crate::config::WidgetConfig;
#[cfg(feature = "web")]
use crate::messages::{self, Action, Inbound, RouterContext};
#[cfg(feature = "web")]
use crate::storage::{ACCOUNT_KEY, ACCOUNT_TTL_SECS, ExpiringStore, LocalStorage};
#[cfg(feature = "web")]
use crate::template::{
    self, CLOSE_ICON, CONTAINER_ID, DEFAULT_ICON, ICON_ID, IFRAME_FLOATING_CLASS, IFRAME_ID,
    IFRAME_OPEN_CLASS, LAUNCHER_HTML, LAUNCHER_ID,
};

/// Error surfaced when the widget cannot mount at all. Everything after a
/// successful mount is recoverable and only logs.
#[cfg(feature = "web")]
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("no browser window or document available")]
    MissingBrowser,
    #[error("target element #{0} not found")]
    MissingTarget(String),
    #[error("failed to create widget DOM nodes")]
    DomCreate,
}

/// Handle to a mounted chat widget.
#[cfg(feature = "web")]
pub struct ChatWidget {
    inner: Rc<WidgetInner>,
}

#[cfg(feature = "web")]
struct WidgetInner {
    config: WidgetConfig,
    chat_url: String,
    container: HtmlElement,
    store: ExpiringStore<LocalStorage>,
    state: RefCell<WidgetState>,
    listeners: RefCell<Listeners>,
}

#[cfg(feature = "web")]
#[derive(Default)]
struct WidgetState {
    is_open: bool,
    connection_started: bool,
    iframe: Option<HtmlIFrameElement>,
}

#[cfg(feature = "web")]
#[derive(Default)]
struct Listeners {
    message: Option<Closure<dyn FnMut(MessageEvent)>>,
    resize: Option<Closure<dyn FnMut(web_sys::Event)>>,
    click: Option<Closure<dyn FnMut(web_sys::Event)>>,
    iframe_load: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

#[cfg(feature = "web")]
impl ChatWidget {
    /// Mount the widget into the host page.
    ///
    /// With a `target` configured, the launcher markup and iframe render
    /// into that element and the chat opens as soon as it reports ready.
    /// Without one, a floating container is appended to `<body>` and the
    /// launcher button toggles the chat.
    pub fn mount(config: WidgetConfig) -> Result<Self, WidgetError> {
        init_browser_logging();

        let window = web_sys::window().ok_or(WidgetError::MissingBrowser)?;
        let document = window.document().ok_or(WidgetError::MissingBrowser)?;

        let chat_url = chat_url::build(config.environment, &config.app_key, config.auth_type_param);
        let store = ExpiringStore::new(LocalStorage::detect());
        store.sweep_expired();

        let external = config.target_id.is_some();
        let container: HtmlElement = match &config.target_id {
            Some(id) => document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                .ok_or_else(|| WidgetError::MissingTarget(id.clone()))?,
            None => {
                let div = document
                    .create_element("div")
                    .map_err(|_| WidgetError::DomCreate)?;
                div.set_id(CONTAINER_ID);
                div.dyn_into::<HtmlElement>().map_err(|_| WidgetError::DomCreate)?
            }
        };

        let icon = config
            .button
            .icon
            .clone()
            .unwrap_or_else(|| DEFAULT_ICON.to_owned());
        let model = template::launcher_view_model(&config.button.color, &icon);
        container.set_inner_html(&template::render(LAUNCHER_HTML, &model));

        let inner = Rc::new(WidgetInner {
            config,
            chat_url,
            container,
            store,
            state: RefCell::new(WidgetState::default()),
            listeners: RefCell::new(Listeners::default()),
        });

        WidgetInner::install_message_listener(&inner, &window);

        if external {
            inner.create_iframe();
        } else {
            if let Some(body) = document.body() {
                let _ = body.append_child(&inner.container);
            }
            WidgetInner::install_click_listener(&inner, &document);
        }

        inner.resize_elements();
        WidgetInner::install_resize_listener(&inner, &window);

        Ok(Self { inner })
    }

    /// Push a message into the open conversation.
    pub fn send_message(&self, content: &str) {
        self.inner.post_to_iframe(messages::send_message(content));
    }

    /// Stop routing iframe messages. DOM nodes and the resize listener stay
    /// mounted.
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

#[cfg(feature = "web")]
impl WidgetInner {
    fn install_message_listener(inner: &Rc<Self>, window: &Window) {
        let handle = Rc::clone(inner);
        let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
            WidgetInner::on_message(&handle, &event);
        }) as Box<dyn FnMut(MessageEvent)>);
        if window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::warn!("failed to install message listener");
        }
        inner.listeners.borrow_mut().message = Some(closure);
    }

    fn install_click_listener(inner: &Rc<Self>, document: &Document) {
        let Some(launcher) = document.get_element_by_id(LAUNCHER_ID) else {
            log::warn!("launcher element missing; chat cannot be toggled");
            return;
        };
        let handle = Rc::clone(inner);
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            WidgetInner::toggle_open(&handle);
        }) as Box<dyn FnMut(web_sys::Event)>);
        let _ = launcher.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        inner.listeners.borrow_mut().click = Some(closure);
    }

    fn install_resize_listener(inner: &Rc<Self>, window: &Window) {
        let handle = Rc::clone(inner);
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            handle.resize_elements();
        }) as Box<dyn FnMut(web_sys::Event)>);
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        inner.listeners.borrow_mut().resize = Some(closure);
    }

    fn on_message(inner: &Rc<Self>, event: &MessageEvent) {
        let Some(data) = js_value_to_json(&event.data()) else {
            return;
        };
        let Some(inbound) = Inbound::parse(&data) else {
            return;
        };
        let ctx = RouterContext {
            has_external_target: inner.config.target_id.is_some(),
            is_open: inner.state.borrow().is_open,
        };
        if let Some(action) = messages::route(inbound, ctx) {
            Self::apply(inner, action);
        }
    }

    fn apply(inner: &Rc<Self>, action: Action) {
        match action {
            Action::RevealLauncher => inner.reveal_launcher(),
            Action::OpenChat => Self::toggle_open(inner),
            Action::StoreAccount(account) => {
                if let Err(err) = inner.store.set(ACCOUNT_KEY, &account, ACCOUNT_TTL_SECS) {
                    log::warn!("failed to persist chat account: {err}");
                }
            }
            Action::NotifyLoaded => {
                if let Some(on_load) = inner.config.events.on_load.as_deref() {
                    on_load();
                }
            }
            Action::LogNotification(payload) => {
                log::info!("chat notification received while closed: {payload}");
            }
        }
    }

    fn toggle_open(inner: &Rc<Self>) {
        let effect = {
            let state = inner.state.borrow();
            next_toggle(state.is_open, state.connection_started)
        };
        match effect {
            ToggleEffect::Open { first_open } => Self::open_chat(inner, first_open),
            ToggleEffect::Close => inner.close_chat(),
        }
    }

    fn open_chat(inner: &Rc<Self>, first_open: bool) {
        inner.create_iframe();

        // The opened class lands one frame after the iframe exists so the
        // CSS transition has a starting state.
        let delayed = Rc::clone(inner);
        Timeout::new(OPEN_DELAY_MS, move || {
            if let Some(iframe) = delayed.state.borrow().iframe.clone() {
                let _ = iframe.class_list().add_1(IFRAME_OPEN_CLASS);
            }
            delayed.resize_elements();
        })
        .forget();

        inner.set_launcher_icon(CLOSE_ICON);

        if first_open {
            Self::start_connection_on_load(inner);
            inner.state.borrow_mut().connection_started = true;
        }

        inner.state.borrow_mut().is_open = true;
        if let Some(on_enter) = inner.config.events.on_enter.as_deref() {
            on_enter();
        }
    }

    fn close_chat(&self) {
        if let Some(iframe) = self.state.borrow().iframe.clone() {
            let _ = iframe.class_list().remove_1(IFRAME_OPEN_CLASS);
        }
        let icon = self
            .config
            .button
            .icon
            .clone()
            .unwrap_or_else(|| DEFAULT_ICON.to_owned());
        self.set_launcher_icon(&icon);
        self.state.borrow_mut().is_open = false;
        if let Some(on_leave) = self.config.events.on_leave.as_deref() {
            on_leave();
        }
    }

    fn create_iframe(&self) {
        if self.state.borrow().iframe.is_some() {
            return;
        }
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Ok(element) = document.create_element("iframe") else {
            log::warn!("failed to create chat iframe");
            return;
        };
        let Ok(iframe) = element.dyn_into::<HtmlIFrameElement>() else {
            return;
        };
        iframe.set_src(&self.chat_url);
        iframe.set_id(IFRAME_ID);
        iframe.set_frame_border("0");
        if self.config.target_id.is_none() {
            let _ = iframe.class_list().add_1(IFRAME_FLOATING_CLASS);
        }
        let _ = self.container.append_child(&iframe);
        self.state.borrow_mut().iframe = Some(iframe);
    }

    /// Register the one-shot session handshake for the first open: once the
    /// iframe loads, post the obfuscated account.
    fn start_connection_on_load(inner: &Rc<Self>) {
        let Some(iframe) = inner.state.borrow().iframe.clone() else {
            return;
        };
        let sender = Rc::clone(inner);
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let stored = sender.store.get::<Value>(ACCOUNT_KEY);
            let account = auth::obfuscated_user_account(&sender.config.auth, stored);
            sender.post_to_iframe(messages::start_connection(account));
        }) as Box<dyn FnMut(web_sys::Event)>);
        iframe.set_onload(Some(closure.as_ref().unchecked_ref()));
        inner.listeners.borrow_mut().iframe_load = Some(closure);
    }

    fn post_to_iframe(&self, payload: Value) {
        let Some(iframe) = self.state.borrow().iframe.clone() else {
            log::warn!("chat iframe is not mounted; dropping outbound message");
            return;
        };
        let Some(content_window) = iframe.content_window() else {
            return;
        };
        let Ok(js_payload) = js_sys::JSON::parse(&payload.to_string()) else {
            return;
        };
        if content_window.post_message(&js_payload, &self.chat_url).is_err() {
            log::warn!("failed to post message to chat iframe");
        }
    }

    fn reveal_launcher(&self) {
        let Some(launcher) = element_by_id::<HtmlElement>(LAUNCHER_ID) else {
            return;
        };
        let style = launcher.style();
        let _ = style.set_property("visibility", "visible");
        let _ = style.set_property("opacity", "1");
    }

    fn set_launcher_icon(&self, src: &str) {
        let Some(icon) = element_by_id::<HtmlImageElement>(ICON_ID) else {
            return;
        };
        icon.set_src(src);
    }

    /// Keep the launcher square; in the floating layout, pin the iframe
    /// above the launcher and cap it to the viewport. With an external
    /// target the host's container governs placement and sizing.
    fn resize_elements(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(launcher) = element_by_id::<HtmlElement>(LAUNCHER_ID) else {
            return;
        };

        let width = window
            .get_computed_style(&launcher)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value("width").ok())
            .unwrap_or_default();
        let _ = launcher.style().set_property("height", &width);

        if self.config.target_id.is_none() {
            if let Some(iframe) = element_by_id::<HtmlElement>(IFRAME_ID) {
                let _ = iframe
                    .style()
                    .set_property("bottom", &format!("calc({LAUNCHER_GAP_PX}px + {width})"));
                let capped = window
                    .outer_height()
                    .ok()
                    .and_then(|v| v.as_f64())
                    .map_or(0.0, |h| h - IFRAME_HEIGHT_INSET_PX);
                let _ = iframe.style().set_property("max-height", &format!("{capped}px"));
            }
        }
    }

    fn destroy(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(closure) = self.listeners.borrow_mut().message.take() {
            let _ = window
                .remove_event_listener_with_callback("message", closure.as_ref().unchecked_ref());
        }
    }
}

/// Convert a postMessage payload into JSON through the JS JSON object.
/// Non-serializable payloads yield `None` and are ignored upstream.
#[cfg(feature = "web")]
fn js_value_to_json(value: &wasm_bindgen::JsValue) -> Option<serde_json::Value> {
    let raw = js_sys::JSON::stringify(value).ok()?;
    serde_json::from_str(&String::from(raw)).ok()
}

#[cfg(feature = "web")]
fn element_by_id<T: JsCast>(id: &str) -> Option<T> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into::<T>()
        .ok()
}

#[cfg(feature = "web")]
fn init_browser_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
