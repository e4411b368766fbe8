#![forbid(unsafe_code)]

//! Bottom-sheet drag controller.
//!
//! Turns pointer samples on the active sheet into a vertical offset written
//! to the `--sheet-offset` style property, snapping to configured positions
//! on release and requesting a close when the sheet is dragged (or swiped)
//! far enough down.
//!
//! # State Machine
//!
//! `Idle → Pressed → (Dragging | Scrolling) → Idle`
//!
//! - `Pressed`: pointer down inside the sheet; intent not yet known.
//! - The first non-zero movement decides the intent through
//!   [`classify_movement`], unless the press started inside the drag header,
//!   which always drags.
//! - `Scrolling` gestures are left to the content and report `Ignored`.
//!
//! # Invariants
//!
//! 1. The offset stays within `[offset of the highest position, height]`.
//! 2. A release reports `Close` only when `close_by_drag_down` is set.
//! 3. `disable_drag` makes every sample `Ignored`.

use sheets_core::{Dom, MovementIntent, NodeId, PointerEvent, PointerPhase, classify_movement};

use crate::config::BottomSheetDragConfig;

/// Style property carrying the drag offset.
pub const OFFSET_PROPERTY: &str = "--sheet-offset";

/// Result of feeding one pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// The sample did not move the sheet.
    Ignored,
    /// The sheet follows the pointer.
    Dragging,
    /// Released and snapped to a position (percent visible).
    Snapped(f64),
    /// Released in a closing gesture.
    Close,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    target: NodeId,
    start_y: f64,
    last_y: f64,
    last_time_ms: f64,
    /// px/ms, positive downward.
    velocity: f64,
    base_offset: f64,
    offset: f64,
    intent: Option<MovementIntent>,
}

/// Drag state for one bottom-sheet instance.
#[derive(Debug, Clone)]
pub struct BottomSheetDrag {
    config: BottomSheetDragConfig,
    /// Snap positions, highest first.
    snaps: Vec<f64>,
    element: Option<NodeId>,
    current: usize,
    height: f64,
    gesture: Option<Gesture>,
}

impl BottomSheetDrag {
    /// Attach to `element` with `config`.
    pub fn attach(element: NodeId, config: BottomSheetDragConfig) -> Self {
        let mut drag = Self::new(config);
        drag.element = Some(element);
        drag
    }

    /// Create a detached controller.
    pub fn new(config: BottomSheetDragConfig) -> Self {
        let mut snaps: Vec<f64> = config
            .positions
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .collect();
        if snaps.is_empty() {
            snaps.push(100.0);
        }
        let start = config
            .positions
            .get(config.start_position)
            .copied()
            .unwrap_or(snaps[0]);
        snaps.sort_by(|a, b| b.total_cmp(a));
        snaps.dedup();
        let current = snaps.iter().position(|&p| p == start).unwrap_or(0);
        Self {
            config,
            snaps,
            element: None,
            current,
            height: 0.0,
            gesture: None,
        }
    }

    /// Follow a different sheet element. Any gesture in progress is dropped.
    pub fn retarget(&mut self, element: Option<NodeId>) {
        if self.element != element {
            self.element = element;
            self.gesture = None;
            self.height = 0.0;
        }
    }

    pub fn element(&self) -> Option<NodeId> {
        self.element
    }

    /// Current snap position, in percent visible.
    pub fn position(&self) -> f64 {
        self.snaps[self.current]
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture
            .is_some_and(|g| g.intent == Some(MovementIntent::Drag))
    }

    /// Write the offset of the current snap position.
    pub fn apply_position(&mut self, dom: &mut dyn Dom) {
        let Some(element) = self.element else {
            return;
        };
        self.measure(dom, element);
        let offset = self.offset_for(self.position());
        write_offset(dom, element, Some(offset));
    }

    /// Clear the offset style and any gesture.
    pub fn reset(&mut self, dom: &mut dyn Dom) {
        self.gesture = None;
        if let Some(element) = self.element {
            write_offset(dom, element, None);
        }
    }

    /// Feed one pointer sample.
    pub fn handle_pointer(&mut self, dom: &mut dyn Dom, event: &PointerEvent) -> DragOutcome {
        if self.config.disable_drag {
            return DragOutcome::Ignored;
        }
        let Some(element) = self.element else {
            return DragOutcome::Ignored;
        };
        match event.phase {
            PointerPhase::Down => self.on_down(dom, element, event),
            PointerPhase::Move => self.on_move(dom, element, event),
            PointerPhase::Up => self.on_up(dom, element),
            PointerPhase::Cancel => self.on_cancel(dom, element),
        }
    }

    // --- Phases ---

    fn on_down(&mut self, dom: &mut dyn Dom, element: NodeId, event: &PointerEvent) -> DragOutcome {
        if !dom.contains(element, event.target) {
            return DragOutcome::Ignored;
        }
        if self.config.dynamic_height || self.height <= 0.0 {
            self.height = 0.0;
            self.measure(dom, element);
        }
        let base_offset = self.offset_for(self.position());
        let intent = self
            .starts_in_header(dom, element, event.target)
            .then_some(MovementIntent::Drag);
        self.gesture = Some(Gesture {
            target: event.target,
            start_y: event.y,
            last_y: event.y,
            last_time_ms: millis(event),
            velocity: 0.0,
            base_offset,
            offset: base_offset,
            intent,
        });
        DragOutcome::Ignored
    }

    fn on_move(&mut self, dom: &mut dyn Dom, element: NodeId, event: &PointerEvent) -> DragOutcome {
        let min_offset = self.offset_for(self.snaps[0]);
        let height = self.height;
        let Some(g) = self.gesture.as_mut() else {
            return DragOutcome::Ignored;
        };
        let travel = event.y - g.start_y;
        if g.intent.is_none() {
            if travel == 0.0 {
                return DragOutcome::Ignored;
            }
            g.intent = Some(classify_movement(dom, g.target, element, travel));
        }
        if g.intent != Some(MovementIntent::Drag) {
            return DragOutcome::Ignored;
        }

        let now = millis(event);
        let dt = now - g.last_time_ms;
        if dt > 0.0 {
            g.velocity = (event.y - g.last_y) / dt;
        }
        g.last_y = event.y;
        g.last_time_ms = now;
        g.offset = (g.base_offset + travel).clamp(min_offset, height.max(min_offset));
        let offset = g.offset;
        write_offset(dom, element, Some(offset));
        DragOutcome::Dragging
    }

    fn on_up(&mut self, dom: &mut dyn Dom, element: NodeId) -> DragOutcome {
        let Some(g) = self.gesture.take() else {
            return DragOutcome::Ignored;
        };
        if g.intent != Some(MovementIntent::Drag) {
            return DragOutcome::Ignored;
        }

        let visible = if self.height > 0.0 {
            100.0 - g.offset / self.height * 100.0
        } else {
            self.position()
        };
        let lowest = self.snaps.len() - 1;
        let threshold = self.config.swipe_threshold;
        let swipe_down = g.velocity > threshold;
        let swipe_up = g.velocity < -threshold;

        if self.config.close_by_drag_down
            && (visible <= self.config.close_position || (swipe_down && self.current == lowest))
        {
            tracing::debug!(
                target: "sheets.stack",
                visible,
                velocity = g.velocity,
                "drag released in closing gesture"
            );
            write_offset(dom, element, None);
            return DragOutcome::Close;
        }

        self.current = if swipe_down {
            (self.current + 1).min(lowest)
        } else if swipe_up {
            self.current.saturating_sub(1)
        } else {
            self.nearest(visible)
        };
        let position = self.position();
        write_offset(dom, element, Some(self.offset_for(position)));
        DragOutcome::Snapped(position)
    }

    fn on_cancel(&mut self, dom: &mut dyn Dom, element: NodeId) -> DragOutcome {
        let Some(g) = self.gesture.take() else {
            return DragOutcome::Ignored;
        };
        if g.intent != Some(MovementIntent::Drag) {
            return DragOutcome::Ignored;
        }
        let position = self.position();
        write_offset(dom, element, Some(self.offset_for(position)));
        DragOutcome::Snapped(position)
    }

    // --- Geometry ---

    fn measure(&mut self, dom: &dyn Dom, element: NodeId) {
        if self.height <= 0.0 {
            self.height = dom.scroll_metrics(element).client_height.max(0.0);
        }
    }

    fn offset_for(&self, visible: f64) -> f64 {
        self.height * (100.0 - visible) / 100.0
    }

    fn nearest(&self, visible: f64) -> usize {
        self.snaps
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - visible).abs().total_cmp(&(*b - visible).abs()))
            .map_or(self.current, |(i, _)| i)
    }

    fn starts_in_header(&self, dom: &dyn Dom, element: NodeId, target: NodeId) -> bool {
        let Some(attr) = self.config.header_selector.as_deref() else {
            return false;
        };
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            if dom.has_attribute(node, attr) {
                return true;
            }
            if node == element {
                break;
            }
            cursor = dom.parent(node);
        }
        false
    }
}

fn millis(event: &PointerEvent) -> f64 {
    event.time.as_secs_f64() * 1000.0
}

fn write_offset(dom: &mut dyn Dom, element: NodeId, offset: Option<f64>) {
    match offset {
        Some(px) => dom.set_style(element, OFFSET_PROPERTY, Some(&format!("{px}px"))),
        None => dom.set_style(element, OFFSET_PROPERTY, None),
    }
}
