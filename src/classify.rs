//! Interactivity classification for click and Enter-key events.
//!
//! The page observer snapshots the event target and its ancestors into
//! [`ElementInfo`] values; the functions here decide whether the event looks
//! like an intentional interaction worth capturing.

use tracing::trace;

/// Default number of ancestors (including the target itself) inspected for a
/// click event.
pub const DEFAULT_ANCESTOR_LEVELS: usize = 3;

/// Tags that are interactive by themselves.
const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea", "label"];

/// ARIA roles treated as interactive for click events.
const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "menuitem", "checkbox", "radio", "tab", "option",
];

/// Tags on which an Enter press counts as an interaction.
const ENTER_TAGS: &[&str] = &["input", "textarea", "button", "a", "select"];

/// ARIA roles on which an Enter press counts as an interaction.
/// Narrower than the click set: `tab` is excluded.
const ENTER_ROLES: &[&str] = &["button", "link", "menuitem", "checkbox", "radio", "option"];

/// Generic containers and icon elements that commonly sit between a click
/// target and the real control; the walk continues through them.
const PASS_THROUGH_TAGS: &[&str] = &["svg", "path", "g", "div", "span", "i", "img"];

/// Document root boundary: the walk never evaluates these.
const ROOT_TAGS: &[&str] = &["body", "html"];

/// Marker class used when a resolved cursor style is unavailable.
const POINTER_CLASS: &str = "cursor-pointer";

/// Snapshot of the properties of one DOM element that the classifier reads.
#[derive(Debug, Clone, Default)]
pub struct ElementInfo {
    /// Tag name. Matched case-insensitively.
    pub tag: String,
    /// Value of the `role` attribute, if any.
    pub role: Option<String>,
    /// Whether the element carries an inline `onclick` attribute.
    pub has_onclick: bool,
    /// Whether the element is content-editable.
    pub content_editable: bool,
    /// Resolved `cursor` style, when the observer could compute it.
    pub cursor: Option<String>,
    /// Class list, used for the `cursor-pointer` fallback.
    pub classes: Vec<String>,
}

impl ElementInfo {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_onclick(mut self) -> Self {
        self.has_onclick = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.content_editable = true;
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    fn tag_lower(&self) -> String {
        self.tag.to_ascii_lowercase()
    }
}

/// Why an element was classified as interactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveReason {
    Tag,
    Role,
    OnclickAttribute,
    ContentEditable,
    PointerCursor,
    PointerClass,
}

impl std::fmt::Display for InteractiveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InteractiveReason::Tag => "interactive tag",
            InteractiveReason::Role => "interactive role",
            InteractiveReason::OnclickAttribute => "onclick attribute",
            InteractiveReason::ContentEditable => "content-editable",
            InteractiveReason::PointerCursor => "pointer cursor",
            InteractiveReason::PointerClass => "cursor-pointer class",
        };
        f.write_str(s)
    }
}

/// Verdict of a click classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub interactive: bool,
    /// Set when `interactive`, naming the first criterion that matched.
    pub reason: Option<InteractiveReason>,
}

impl Classification {
    fn hit(reason: InteractiveReason) -> Self {
        Self {
            interactive: true,
            reason: Some(reason),
        }
    }

    fn miss() -> Self {
        Self {
            interactive: false,
            reason: None,
        }
    }
}

fn check_one(el: &ElementInfo) -> Option<InteractiveReason> {
    let tag = el.tag_lower();
    if INTERACTIVE_TAGS.contains(&tag.as_str()) {
        return Some(InteractiveReason::Tag);
    }
    if let Some(role) = &el.role {
        if INTERACTIVE_ROLES.contains(&role.as_str()) {
            return Some(InteractiveReason::Role);
        }
    }
    if el.has_onclick {
        return Some(InteractiveReason::OnclickAttribute);
    }
    if el.content_editable {
        return Some(InteractiveReason::ContentEditable);
    }
    if el.cursor.as_deref() == Some("pointer") {
        return Some(InteractiveReason::PointerCursor);
    }
    if el.classes.iter().any(|c| c == POINTER_CLASS) {
        return Some(InteractiveReason::PointerClass);
    }
    None
}

/// Classify a click event. `ancestry` is the event target followed by its
/// ancestors toward the root; at most `levels` elements are evaluated, and the
/// walk stops early at a body/html boundary.
pub fn classify_click(ancestry: &[ElementInfo], levels: usize) -> Classification {
    for (depth, el) in ancestry.iter().take(levels).enumerate() {
        let tag = el.tag_lower();
        if ROOT_TAGS.contains(&tag.as_str()) {
            break;
        }
        if let Some(reason) = check_one(el) {
            trace!(depth, tag = %tag, %reason, "click target classified interactive");
            return Classification::hit(reason);
        }
        if PASS_THROUGH_TAGS.contains(&tag.as_str()) {
            trace!(depth, tag = %tag, "pass-through container, checking ancestor");
        }
    }
    Classification::miss()
}

/// Whether an Enter key press on `target` counts as an interaction. Unlike
/// clicks, only the focused element itself is inspected.
pub fn is_enter_target(target: &ElementInfo) -> bool {
    let tag = target.tag_lower();
    if ENTER_TAGS.contains(&tag.as_str()) {
        return true;
    }
    if let Some(role) = &target.role {
        if ENTER_ROLES.contains(&role.as_str()) {
            return true;
        }
    }
    target.content_editable
}
