//! Widget configuration and the public construction surface.
//!
//! SYSTEM CONTEXT
//! ==============
//! Hosts describe the widget once through [`WidgetConfig::builder`]; the
//! resulting config is immutable for the widget's lifetime. Auth credentials
//! are normalized exactly once at `build()` time.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::rc::Rc;

use crate::auth::{self, NormalizedAuth};

/// Deployment target selecting which chat base URL the iframe loads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    Local,
    Homolog,
    #[default]
    Production,
}

/// Credential mode the chat application authenticates the visitor with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthType {
    /// Anonymous visitor; the chat assigns a throwaway account.
    #[default]
    Guest,
    /// Host-asserted identity with a shared password.
    Dev,
}

impl AuthType {
    /// Wire/query-parameter spelling of the auth type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Dev => "dev",
        }
    }
}

/// Launcher button appearance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonConfig {
    /// Background color applied to the floating launcher.
    pub color: String,
    /// Custom icon URL or data URI. The built-in icon is used when absent.
    pub icon: Option<String>,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self { color: "#0096fa".to_owned(), icon: None }
    }
}

/// Raw caller-supplied credentials, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub auth_type: AuthType,
    pub user_identity: Option<String>,
    pub user_password: Option<String>,
}

/// Host callbacks fired on widget lifecycle transitions.
///
/// `on_enter` fires when the chat opens, `on_leave` when it closes, and
/// `on_load` once the chat application reports it is connected.
#[derive(Clone, Default)]
pub struct WidgetEvents {
    pub on_enter: Option<Rc<dyn Fn()>>,
    pub on_leave: Option<Rc<dyn Fn()>>,
    pub on_load: Option<Rc<dyn Fn()>>,
}

/// Immutable widget configuration produced by [`WidgetConfigBuilder::build`].
#[derive(Clone)]
pub struct WidgetConfig {
    /// Base64 `identifier:secret` key identifying the tenant.
    pub app_key: String,
    pub button: ButtonConfig,
    /// Credentials after one-time normalization.
    pub auth: NormalizedAuth,
    /// Set only when the host supplied an auth config; appended to the chat
    /// URL as the `authType` query parameter.
    pub auth_type_param: Option<AuthType>,
    /// Element id of a host-controlled container. When absent the widget
    /// creates its own floating container on `<body>`.
    pub target_id: Option<String>,
    pub events: WidgetEvents,
    pub environment: Environment,
}

impl WidgetConfig {
    /// Start building a config for the tenant identified by `app_key`.
    pub fn builder(app_key: impl Into<String>) -> WidgetConfigBuilder {
        WidgetConfigBuilder {
            app_key: app_key.into(),
            button: ButtonConfig::default(),
            auth: None,
            target_id: None,
            events: WidgetEvents::default(),
            environment: Environment::default(),
        }
    }
}

/// Fluent builder for [`WidgetConfig`].
pub struct WidgetConfigBuilder {
    app_key: String,
    button: ButtonConfig,
    auth: Option<AuthConfig>,
    target_id: Option<String>,
    events: WidgetEvents,
    environment: Environment,
}

impl WidgetConfigBuilder {
    #[must_use]
    pub fn button(mut self, button: ButtonConfig) -> Self {
        self.button = button;
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Render the widget into the host element with this id instead of the
    /// default floating container.
    #[must_use]
    pub fn target(mut self, element_id: impl Into<String>) -> Self {
        self.target_id = Some(element_id.into());
        self
    }

    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn on_enter(mut self, callback: impl Fn() + 'static) -> Self {
        self.events.on_enter = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_leave(mut self, callback: impl Fn() + 'static) -> Self {
        self.events.on_leave = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_load(mut self, callback: impl Fn() + 'static) -> Self {
        self.events.on_load = Some(Rc::new(callback));
        self
    }

    /// Finalize the config, normalizing credentials against the app key.
    #[must_use]
    pub fn build(self) -> WidgetConfig {
        let auth_type_param = self.auth.as_ref().map(|a| a.auth_type);
        let auth = auth::normalize(self.auth, &self.app_key);
        WidgetConfig {
            app_key: self.app_key,
            button: self.button,
            auth,
            auth_type_param,
            target_id: self.target_id,
            events: self.events,
            environment: self.environment,
        }
    }
}
