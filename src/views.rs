//! Stock logical views shipped with the bridge.
//!
//! Backends use these to exercise their renderers without depending on a full
//! component library. Both are plain text labels; they differ only in the role
//! a renderer should give them.

use waterui_bridge_core::{LogicalView, ViewState};

/// How a label is meant to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// Ordinary body text.
    Body,
    /// A title or section heading.
    Heading,
    /// Something the user can activate.
    Action {
        /// Whether activation is currently possible.
        enabled: bool,
    },
}

/// A logical view whose whole content is one line of text.
///
/// A single renderer type can be bound to every view type implementing this.
pub trait Label: LogicalView {
    /// The text to show.
    fn text(&self) -> String;

    /// The role the text plays.
    fn role(&self) -> LabelRole;
}

/// Static text.
#[derive(Debug)]
pub struct Text {
    state: ViewState,
    content: String,
    heading: bool,
}

impl Text {
    /// Creates body text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            state: ViewState::new(),
            content: content.into(),
            heading: false,
        }
    }

    /// Creates heading text.
    pub fn heading(content: impl Into<String>) -> Self {
        Self {
            heading: true,
            ..Self::new(content)
        }
    }

    /// Borrows the text content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl LogicalView for Text {
    fn view_state(&self) -> &ViewState {
        &self.state
    }
}

impl Label for Text {
    fn text(&self) -> String {
        self.content.clone()
    }

    fn role(&self) -> LabelRole {
        if self.heading {
            LabelRole::Heading
        } else {
            LabelRole::Body
        }
    }
}

/// A labelled button.
#[derive(Debug)]
pub struct Button {
    state: ViewState,
    label: String,
    enabled: bool,
}

impl Button {
    /// Creates an enabled button.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            state: ViewState::new(),
            label: label.into(),
            enabled: true,
        }
    }

    /// Sets whether the button can be activated.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Borrows the button label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the button can be activated.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl LogicalView for Button {
    fn view_state(&self) -> &ViewState {
        &self.state
    }
}

impl Label for Button {
    fn text(&self) -> String {
        self.label.clone()
    }

    fn role(&self) -> LabelRole {
        LabelRole::Action {
            enabled: self.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{any::TypeId, sync::Arc};

    use waterui_bridge_core::SharedView;

    use super::*;

    #[test]
    fn roles_follow_construction() {
        assert_eq!(Text::new("a").role(), LabelRole::Body);
        assert_eq!(Text::heading("a").role(), LabelRole::Heading);
        assert_eq!(
            Button::new("a").enabled(false).role(),
            LabelRole::Action { enabled: false }
        );
    }

    #[test]
    fn erased_views_keep_their_concrete_type() {
        let text: SharedView = Arc::new(Text::new("hello"));
        let button: SharedView = Arc::new(Button::new("OK"));

        assert_eq!(text.view_type_id(), TypeId::of::<Text>());
        assert_eq!(button.view_type_id(), TypeId::of::<Button>());
        assert_ne!(text.view_id(), button.view_id());
        assert!(button.view_type_name().ends_with("Button"));
    }
}
