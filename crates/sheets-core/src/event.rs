#![forbid(unsafe_code)]

//! Host events delivered to the overlay engine.
//!
//! Every event carries the node it was dispatched on (`target`). Listeners
//! decide for themselves whether a bubbled event from a descendant is
//! relevant; transition listeners, for instance, only accept events whose
//! target is exactly the element they observe.

use std::time::Duration;

use crate::dom::NodeId;

/// Keyboard keys the engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Key {
    Escape,
    Tab,
    Enter,
    /// Any other key, by its DOM `key` value.
    Other(String),
}

/// Phase of a pointer/touch interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Pointer/touch sample along the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub target: NodeId,
    /// Client Y coordinate in CSS pixels.
    pub y: f64,
    /// Host timestamp of the sample.
    pub time: Duration,
}

impl PointerEvent {
    /// Create a pointer sample.
    pub const fn new(phase: PointerPhase, target: NodeId, y: f64, time: Duration) -> Self {
        Self {
            phase,
            target,
            y,
            time,
        }
    }
}

/// An event observed by the host document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DomEvent {
    /// A CSS transition finished on `target`.
    TransitionEnd { target: NodeId },
    /// A CSS transition was canceled on `target`.
    TransitionCancel { target: NodeId },
    /// Focus moved to `target`.
    FocusIn { target: NodeId },
    /// A key was pressed while `target` (or the document) had focus.
    KeyDown { key: Key, target: Option<NodeId> },
    /// A primary-button click on `target`.
    Click { target: NodeId },
    /// Pointer/touch movement.
    Pointer(PointerEvent),
}

impl DomEvent {
    /// The node the event was dispatched on, if any.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Self::TransitionEnd { target }
            | Self::TransitionCancel { target }
            | Self::FocusIn { target }
            | Self::Click { target } => Some(*target),
            Self::KeyDown { target, .. } => *target,
            Self::Pointer(p) => Some(p.target),
        }
    }

    /// Whether this event signals the end (or cancellation) of a transition.
    #[inline]
    pub fn is_transition_finish(&self) -> bool {
        matches!(
            self,
            Self::TransitionEnd { .. } | Self::TransitionCancel { .. }
        )
    }
}
