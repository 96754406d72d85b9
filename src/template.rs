//! Embedded launcher markup and placeholder rendering.
//!
//! Placeholders are resolved through an explicit view-model list built at
//! render time; there is no reflective field lookup. An unresolved
//! placeholder renders as an empty string and logs a warning.

#[cfg(test)]
#[path = "template_test.rs"]
mod template_test;

/// Id of the container div the widget creates when no target is supplied.
pub const CONTAINER_ID: &str = "chat-widget-container";
/// Id of the floating launcher button.
pub const LAUNCHER_ID: &str = "chat-widget-launcher";
/// Id of the icon image inside the launcher.
pub const ICON_ID: &str = "chat-widget-icon";
/// Id of the chat iframe once created.
pub const IFRAME_ID: &str = "chat-widget-frame";
/// Class marking the iframe's opened visual state.
pub const IFRAME_OPEN_CLASS: &str = "chat-widget-frame--open";
/// Class for the floating (no external target) layout; external targets keep
/// host-controlled placement.
pub const IFRAME_FLOATING_CLASS: &str = "chat-widget-frame--floating";

/// Built-in launcher icon (chat bubble).
pub const DEFAULT_ICON: &str = "data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 24 24'><path fill='white' d='M4 2h16a2 2 0 0 1 2 2v12a2 2 0 0 1-2 2H8l-4 4V4a2 2 0 0 1 2-2z'/></svg>";

/// Icon shown while the chat is open.
pub const CLOSE_ICON: &str = "data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 24 24'><path fill='white' d='M19 6.4 17.6 5 12 10.6 6.4 5 5 6.4 10.6 12 5 17.6 6.4 19 12 13.4 17.6 19 19 17.6 13.4 12z'/></svg>";

/// Launcher markup rendered into the widget container. The launcher starts
/// hidden; the iframe reveals it with [`crate::messages::CHAT_READY`].
pub const LAUNCHER_HTML: &str = r##"<style>
  #chat-widget-launcher {
    position: fixed;
    bottom: 15px;
    right: 15px;
    width: 56px;
    border-radius: 50%;
    background-color: {{button_color}};
    box-shadow: 0 4px 12px rgba(0, 0, 0, 0.25);
    cursor: pointer;
    display: flex;
    align-items: center;
    justify-content: center;
    visibility: hidden;
    opacity: 0;
    transition: opacity 0.3s ease;
    z-index: 2147483000;
  }
  #chat-widget-icon {
    width: 55%;
    height: 55%;
  }
  #chat-widget-frame {
    width: 370px;
    height: 520px;
    max-height: 100%;
    border: 0;
    border-radius: 8px;
    box-shadow: 0 6px 24px rgba(0, 0, 0, 0.3);
    opacity: 0;
    pointer-events: none;
    transition: opacity 0.25s ease, max-height 0.25s ease;
    z-index: 2147483000;
  }
  #chat-widget-frame.chat-widget-frame--floating {
    position: fixed;
    right: 15px;
  }
  #chat-widget-frame.chat-widget-frame--open {
    opacity: 1;
    pointer-events: auto;
  }
</style>
<div id="chat-widget-launcher">
  <img id="chat-widget-icon" src="{{button_icon}}" alt="Open chat" />
</div>
"##;

/// Substitute `{{field}}` placeholders from an enumerated view model.
#[must_use]
pub fn render(template: &str, model: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        match model.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => log::warn!("template placeholder {key} has no view-model entry"),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// View model for [`LAUNCHER_HTML`].
#[must_use]
pub fn launcher_view_model(button_color: &str, button_icon: &str) -> Vec<(&'static str, String)> {
    vec![
        ("button_color", button_color.to_owned()),
        ("button_icon", button_icon.to_owned()),
    ]
}
