#![forbid(unsafe_code)]

//! Per-instance configuration.
//!
//! [`ModalConfig`] is fixed at bind time except for the animation settings,
//! which the animation handle may change later. All option types have
//! string forms matching the host attribute values the engine writes
//! (`data-type`, `data-position`, `data-animation`).
//!
//! With the `config` feature, configs load from TOML or JSON documents:
//!
//! ```toml
//! kind = "bottom-sheet"
//! position = "bottom"
//! stack_size = 3
//! on_esc = "hide"
//!
//! [animation]
//! kind = "slide"
//!
//! [drag]
//! positions = [100.0, 50.0]
//! close_position = 20.0
//! ```

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use sheets_core::NodeId;

/// Default number of sheets retained per instance.
pub const DEFAULT_STACK_SIZE: usize = 10;

// --- Option enums ---

/// Presentation style of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum ModalKind {
    #[default]
    Floating,
    FullPage,
    BottomSheet,
}

impl ModalKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Floating => "floating",
            Self::FullPage => "full-page",
            Self::BottomSheet => "bottom-sheet",
        }
    }
}

/// Anchor of the sheet host inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum ModalPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

impl ModalPosition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

/// Named animation style applied through `data-animation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum AnimationKind {
    #[default]
    Fade,
    Slide,
    Scale,
}

impl AnimationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::Slide => "slide",
            Self::Scale => "scale",
        }
    }
}

/// Instance-level animation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct AnimationConfig {
    /// Skip transition listening for every call that does not override it.
    pub disabled: bool,
    pub kind: AnimationKind,
}

impl AnimationConfig {
    /// Animation switched off entirely.
    pub const fn off() -> Self {
        Self {
            disabled: true,
            kind: AnimationKind::Fade,
        }
    }

    /// Set the disabled flag.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set the animation kind.
    pub fn kind(mut self, kind: AnimationKind) -> Self {
        self.kind = kind;
        self
    }
}

// --- Actions ---

/// What to do when Escape is pressed or the overlay is clicked.
#[derive(Clone, Default)]
pub enum ModalAction {
    /// Ignore the input.
    None,
    #[default]
    Pop,
    Empty,
    Hide,
    Back,
    Next,
    /// Invoke a host callback instead of a stack operation.
    Callback(Rc<dyn Fn()>),
}

impl ModalAction {
    /// Wrap a closure as a callback action.
    pub fn callback(f: impl Fn() + 'static) -> Self {
        Self::Callback(Rc::new(f))
    }

    /// Action name, `"callback"` for callbacks.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pop => "pop",
            Self::Empty => "empty",
            Self::Hide => "hide",
            Self::Back => "back",
            Self::Next => "next",
            Self::Callback(_) => "callback",
        }
    }

    /// Whether the action does nothing.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for ModalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for ModalAction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Callback(a), Self::Callback(b)) => Rc::ptr_eq(a, b),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Display for ModalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error parsing a [`ModalAction`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown modal action {0:?} (expected none, pop, empty, hide, back or next)")]
pub struct UnknownAction(pub String);

impl FromStr for ModalAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "pop" => Ok(Self::Pop),
            "empty" => Ok(Self::Empty),
            "hide" => Ok(Self::Hide),
            "back" => Ok(Self::Back),
            "next" => Ok(Self::Next),
            _ => Err(UnknownAction(s.to_string())),
        }
    }
}

#[cfg(feature = "config")]
impl serde::Serialize for ModalAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Self::Callback(_) = self {
            return Err(serde::ser::Error::custom(
                "callback actions cannot be serialized",
            ));
        }
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "config")]
impl<'de> serde::Deserialize<'de> for ModalAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

// --- Bottom sheet drag ---

/// Drag behavior of bottom sheets.
///
/// Positions are visible fractions of the sheet height, in percent
/// (`100.0` = fully visible).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct BottomSheetDragConfig {
    /// Snap positions, in percent visible.
    pub positions: Vec<f64>,
    /// Index into `positions` the sheet opens at.
    pub start_position: usize,
    /// Releasing at or below this visible percentage closes the sheet.
    pub close_position: f64,
    /// Release velocity (px/ms) that counts as a swipe.
    pub swipe_threshold: f64,
    /// Re-measure the sheet height on every drag start.
    pub dynamic_height: bool,
    /// Allow dragging down to close.
    pub close_by_drag_down: bool,
    /// Attribute marking the drag header. When set, only drags starting
    /// inside an element carrying it bypass the scroll check.
    pub header_selector: Option<String>,
    /// Ignore all pointer input.
    pub disable_drag: bool,
}

impl Default for BottomSheetDragConfig {
    fn default() -> Self {
        Self {
            positions: vec![100.0],
            start_position: 0,
            close_position: 25.0,
            swipe_threshold: 0.5,
            dynamic_height: false,
            close_by_drag_down: true,
            header_selector: None,
            disable_drag: false,
        }
    }
}

impl BottomSheetDragConfig {
    /// Set snap positions.
    pub fn positions(mut self, positions: impl Into<Vec<f64>>) -> Self {
        self.positions = positions.into();
        self
    }

    /// Set the opening position index.
    pub fn start_position(mut self, index: usize) -> Self {
        self.start_position = index;
        self
    }

    /// Set the close threshold.
    pub fn close_position(mut self, percent: f64) -> Self {
        self.close_position = percent;
        self
    }

    /// Set the swipe velocity threshold.
    pub fn swipe_threshold(mut self, px_per_ms: f64) -> Self {
        self.swipe_threshold = px_per_ms;
        self
    }

    pub fn dynamic_height(mut self, dynamic: bool) -> Self {
        self.dynamic_height = dynamic;
        self
    }

    pub fn close_by_drag_down(mut self, enabled: bool) -> Self {
        self.close_by_drag_down = enabled;
        self
    }

    pub fn header_selector(mut self, attribute: impl Into<String>) -> Self {
        self.header_selector = Some(attribute.into());
        self
    }

    pub fn disable_drag(mut self, disabled: bool) -> Self {
        self.disable_drag = disabled;
        self
    }

    fn validate_into(&self, errors: &mut Vec<String>) {
        if self.positions.is_empty() {
            errors.push("drag.positions must not be empty".into());
        }
        for (i, p) in self.positions.iter().enumerate() {
            if !(*p > 0.0 && *p <= 100.0) {
                errors.push(format!("drag.positions[{i}] must be in (0, 100], got {p}"));
            }
        }
        if !self.positions.is_empty() && self.start_position >= self.positions.len() {
            errors.push(format!(
                "drag.start_position {} out of range for {} positions",
                self.start_position,
                self.positions.len()
            ));
        }
        if !(0.0..100.0).contains(&self.close_position) {
            errors.push(format!(
                "drag.close_position must be in [0, 100), got {}",
                self.close_position
            ));
        }
        if !(self.swipe_threshold > 0.0) {
            errors.push(format!(
                "drag.swipe_threshold must be positive, got {}",
                self.swipe_threshold
            ));
        }
    }
}

// --- ModalConfig ---

/// Configuration of one bound instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ModalConfig {
    pub kind: ModalKind,
    pub position: ModalPosition,
    /// Maximum number of retained sheets (`>= 1`).
    pub stack_size: usize,
    pub animation: AnimationConfig,
    /// Node the instance shell attaches to; the document root when `None`.
    #[cfg_attr(feature = "config", serde(skip))]
    pub root_element: Option<NodeId>,
    pub on_esc: ModalAction,
    pub on_click_overlay: ModalAction,
    pub drag: BottomSheetDragConfig,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            kind: ModalKind::default(),
            position: ModalPosition::default(),
            stack_size: DEFAULT_STACK_SIZE,
            animation: AnimationConfig::default(),
            root_element: None,
            on_esc: ModalAction::Pop,
            on_click_overlay: ModalAction::Pop,
            drag: BottomSheetDragConfig::default(),
        }
    }
}

impl ModalConfig {
    /// Set the presentation style.
    pub fn kind(mut self, kind: ModalKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the position.
    pub fn position(mut self, position: ModalPosition) -> Self {
        self.position = position;
        self
    }

    /// Set the maximum number of retained sheets.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    /// Set animation settings.
    pub fn animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }

    /// Attach the shell under `node` instead of the document root.
    pub fn root_element(mut self, node: NodeId) -> Self {
        self.root_element = Some(node);
        self
    }

    /// Set the Escape action.
    pub fn on_esc(mut self, action: ModalAction) -> Self {
        self.on_esc = action;
        self
    }

    /// Set the overlay click action.
    pub fn on_click_overlay(mut self, action: ModalAction) -> Self {
        self.on_click_overlay = action;
        self
    }

    /// Set bottom-sheet drag behavior.
    pub fn drag(mut self, drag: BottomSheetDragConfig) -> Self {
        self.drag = drag;
        self
    }

    /// Collect every validation problem. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.stack_size == 0 {
            errors.push("stack_size must be at least 1".into());
        }
        if self.kind == ModalKind::BottomSheet {
            self.drag.validate_into(&mut errors);
        }
        errors
    }

    /// Fail with [`ConfigError::Validation`] if the config is invalid.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validated()
    }

    /// Parse and validate a JSON document.
    #[cfg(feature = "config")]
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validated()
    }
}

/// Errors loading a [`ModalConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[cfg(feature = "config")]
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}
