#![forbid(unsafe_code)]

//! Ordered sheet list for one overlay instance.
//!
//! `SheetStack` is pure bookkeeping: it knows nothing about the host tree,
//! transitions or focus. The async engine in [`crate::instance`] decides
//! *when* to call these operations; this module only guarantees the list
//! and the active pointer stay consistent.
//!
//! # Invariants
//!
//! - Sheets are ordered bottom (index 0) to top (last).
//! - `active` is `Some(i)` with `i < len` whenever the stack is non-empty,
//!   and `None` when it is empty.
//! - A sheet's `element` is set at most once.
//! - Sheet IDs are never reused.
//!
//! # Failure Modes
//!
//! - `remove_top()` / `evict_bottom()` on an empty stack return `None`.
//! - `remove_id()` for a non-existent ID returns `None`.
//! - `step_target()` reports `EmptyStack`, `NoActiveSheet` or `Boundary`
//!   without touching the active pointer.

use std::sync::atomic::{AtomicU64, Ordering};

use sheets_core::{Direction, ModalError, NodeId, Result};

use crate::content::Content;

/// Global counter for unique sheet IDs.
static SHEET_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a pushed sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(u64);

impl SheetId {
    fn new() -> Self {
        Self(SHEET_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SheetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One pushed content entry.
#[derive(Debug, Clone)]
pub struct Sheet {
    id: SheetId,
    content: Content,
    element: Option<NodeId>,
    last_focused: Option<NodeId>,
    attributes: Vec<(String, String)>,
}

impl Sheet {
    /// Create a sheet with a fresh ID.
    pub fn new(content: Content) -> Self {
        Self {
            id: SheetId::new(),
            content,
            element: None,
            last_focused: None,
            attributes: Vec::new(),
        }
    }

    /// Attach host attributes applied when the element binds.
    pub fn with_attributes(mut self, attributes: Vec<(String, String)>) -> Self {
        self.attributes = attributes;
        self
    }

    #[inline]
    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// The mounted host element, once bound.
    #[inline]
    pub fn element(&self) -> Option<NodeId> {
        self.element
    }

    /// Last element focused inside this sheet.
    #[inline]
    pub fn last_focused(&self) -> Option<NodeId> {
        self.last_focused
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Bind the host element. Returns `false` if one was already bound.
    pub fn bind_element(&mut self, element: NodeId) -> bool {
        if self.element.is_some() {
            return false;
        }
        self.element = Some(element);
        true
    }

    pub fn set_last_focused(&mut self, node: NodeId) {
        self.last_focused = Some(node);
    }
}

/// Sheets compare by identity.
impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sheet {}

/// Ordered sheets plus the active pointer.
#[derive(Debug)]
pub struct SheetStack {
    /// Sheets, bottom to top.
    sheets: Vec<Sheet>,
    active: Option<usize>,
    stack_size: usize,
}

impl SheetStack {
    /// Create an empty stack retaining at most `stack_size` sheets
    /// (clamped to at least 1).
    pub fn new(stack_size: usize) -> Self {
        Self {
            sheets: Vec::new(),
            active: None,
            stack_size: stack_size.max(1),
        }
    }

    // --- Stack Operations ---

    /// Append `sheet` on top and make it active.
    ///
    /// The stack may exceed `stack_size` until [`Self::evict_bottom`] runs.
    pub fn push_sheet(&mut self, sheet: Sheet) -> SheetId {
        let id = sheet.id;
        self.sheets.push(sheet);
        self.active = Some(self.sheets.len() - 1);
        id
    }

    /// Remove the top sheet.
    ///
    /// If the active sheet was the top, the new top becomes active;
    /// otherwise the active sheet is unchanged.
    pub fn remove_top(&mut self) -> Option<Sheet> {
        let sheet = self.sheets.pop()?;
        self.clamp_active();
        Some(sheet)
    }

    /// Remove the bottom sheet if the stack is over capacity.
    pub fn evict_bottom(&mut self) -> Option<Sheet> {
        if !self.is_over_capacity() {
            return None;
        }
        let sheet = self.sheets.remove(0);
        self.active = self.active.map(|i| i.saturating_sub(1));
        self.clamp_active();
        Some(sheet)
    }

    /// Remove a specific sheet by ID.
    pub fn remove_id(&mut self, id: SheetId) -> Option<Sheet> {
        let idx = self.position(id)?;
        let sheet = self.sheets.remove(idx);
        if let Some(active) = self.active
            && idx < active
        {
            self.active = Some(active - 1);
        }
        self.clamp_active();
        Some(sheet)
    }

    /// Remove every sheet, top first.
    pub fn clear(&mut self) -> Vec<Sheet> {
        self.active = None;
        let mut removed: Vec<Sheet> = self.sheets.drain(..).collect();
        removed.reverse();
        removed
    }

    // --- Navigation ---

    /// Index the active pointer would move to in `direction`.
    pub fn step_target(&self, direction: Direction) -> Result<usize> {
        if self.sheets.len() < 2 {
            return Err(ModalError::EmptyStack);
        }
        let active = self.active.ok_or(ModalError::NoActiveSheet)?;
        match direction {
            Direction::Forward if active + 1 < self.sheets.len() => Ok(active + 1),
            Direction::Backward if active > 0 => Ok(active - 1),
            _ => Err(ModalError::Boundary { direction }),
        }
    }

    /// Move the active pointer one sheet in `direction`.
    pub fn step(&mut self, direction: Direction) -> Result<usize> {
        let target = self.step_target(direction)?;
        self.active = Some(target);
        Ok(target)
    }

    /// Point `active` at `index`. Returns `false` if out of range.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.sheets.len() {
            return false;
        }
        self.active = Some(index);
        true
    }

    // --- State Queries ---

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[inline]
    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    /// Whether more sheets are held than `stack_size` allows.
    #[inline]
    pub fn is_over_capacity(&self) -> bool {
        self.sheets.len() > self.stack_size
    }

    /// Sheets, bottom to top.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn top(&self) -> Option<&Sheet> {
        self.sheets.last()
    }

    #[inline]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Sheet> {
        self.active.and_then(|i| self.sheets.get(i))
    }

    pub fn get(&self, id: SheetId) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SheetId) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.id == id)
    }

    pub fn position(&self, id: SheetId) -> Option<usize> {
        self.sheets.iter().position(|s| s.id == id)
    }

    pub fn contains(&self, id: SheetId) -> bool {
        self.position(id).is_some()
    }

    /// First sheet whose bound element satisfies `matches`.
    pub fn find_by_element(&self, mut matches: impl FnMut(NodeId) -> bool) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.element.is_some_and(&mut matches))
    }

    /// Bound elements of every sheet except the active one.
    pub fn inactive_elements(&self) -> Vec<NodeId> {
        self.sheets
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != self.active)
            .filter_map(|(_, s)| s.element)
            .collect()
    }

    fn clamp_active(&mut self) {
        self.active = match (self.active, self.sheets.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, len) => Some(len - 1),
        };
    }
}
