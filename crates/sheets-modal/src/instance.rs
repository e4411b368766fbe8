#![forbid(unsafe_code)]

//! Async sheet stack engine for one bound overlay host.
//!
//! Each control operation is an async state machine:
//!
//! `Pending → TransitionStarted → TransitionResolved → Committed`
//!
//! and suspends exactly once per observed transition. Stack mutations that
//! remove elements (pop, eviction, `pop_last`) are committed only after the
//! transition they ride on has resolved, so an element is never detached
//! while its own transition is still running.
//!
//! # Host shell
//!
//! ```text
//! root_element
//! └── div[data-modal-container][data-type][data-position][data-animation]
//!     ├── div[data-modal-overlay]     open/close transitions observed here
//!     └── div[data-modal-sheets]
//!         ├── sheet[data-sheet-id]
//!         └── sheet[data-sheet-id][data-active]
//! ```
//!
//! `data-open` is present on the container while the instance is open.
//!
//! # Invariants
//!
//! 1. `is_open()` implies a non-empty stack with exactly one active sheet.
//! 2. An empty stack is never open.
//! 3. Operations on a torn-down instance fail with `InvalidState`;
//!    operations in flight at teardown fail with `Abandoned`.
//!
//! # Failure Modes
//!
//! - Operations are not serialized here. Interleaving two operations on one
//!   instance is the caller's problem; the runtime's call queue prevents it.
//! - A renderer must not call back into the instance from `render`; it
//!   returns the element (or `None` and binds later) instead.

use std::cell::RefCell;
use std::rc::Rc;

use sheets_a11y::{FocusCoordinator, FocusPhase};
use sheets_core::{
    Direction, Dom, DomEvent, InstanceId, Key, ModalError, NodeId, Pending, Resolver, Result,
};
use tracing::Instrument;

use crate::config::{ModalAction, ModalConfig, ModalKind};
use crate::content::Content;
use crate::drag::{BottomSheetDrag, DragOutcome};
use crate::renderer::SheetRenderer;
use crate::stack::{Sheet, SheetId, SheetStack};
use crate::stage::Stage;
use crate::transition::{AnimationOverride, CallOptions, TransitionResolver, run_transition};

pub const CONTAINER_ATTR: &str = "data-modal-container";
pub const OVERLAY_ATTR: &str = "data-modal-overlay";
pub const SHEETS_ATTR: &str = "data-modal-sheets";
pub const TYPE_ATTR: &str = "data-type";
pub const POSITION_ATTR: &str = "data-position";
pub const ANIMATION_ATTR: &str = "data-animation";
pub const PAUSED_ATTR: &str = "data-animation-paused";
pub const OPEN_ATTR: &str = "data-open";
pub const SHEET_ID_ATTR: &str = "data-sheet-id";
pub const ACTIVE_ATTR: &str = "data-active";
pub const LEAVING_ATTR: &str = "data-leaving";

/// Host nodes created for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    pub container: NodeId,
    pub overlay: NodeId,
    pub sheets: NodeId,
}

struct State {
    config: ModalConfig,
    stack: SheetStack,
    open: bool,
    torn_down: bool,
    focus: FocusCoordinator,
    transitions: TransitionResolver,
    mounts: Vec<(SheetId, Resolver<NodeId>)>,
    drag: Option<BottomSheetDrag>,
}

struct Inner {
    id: InstanceId,
    stage: Stage,
    shell: Shell,
    state: RefCell<State>,
    renderer: RefCell<Box<dyn SheetRenderer>>,
}

/// One bound overlay host. Clones share the instance.
#[derive(Clone)]
pub struct ModalInstance {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for ModalInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("ModalInstance")
            .field("id", &self.inner.id)
            .field("open", &state.open)
            .field("sheets", &state.stack.len())
            .field("torn_down", &state.torn_down)
            .finish()
    }
}

impl ModalInstance {
    /// Create the instance shell under the configured root.
    ///
    /// `config.stack_size` is clamped to at least 1; validation is the
    /// caller's job (see [`ModalConfig::validate`]).
    pub fn new(stage: &Stage, config: ModalConfig, renderer: impl SheetRenderer + 'static) -> Self {
        let id = InstanceId::next();
        let shell = stage.with_dom(|dom| {
            let root = config
                .root_element
                .filter(|&node| dom.is_connected(node))
                .unwrap_or_else(|| dom.document_root());
            let container = dom.create_element("div");
            dom.set_attribute(container, CONTAINER_ATTR, &id.to_string());
            dom.set_attribute(container, TYPE_ATTR, config.kind.as_str());
            dom.set_attribute(container, POSITION_ATTR, config.position.as_str());
            dom.set_attribute(container, ANIMATION_ATTR, animation_attr(&config));
            dom.set_attribute(container, "tabindex", "-1");
            let overlay = dom.create_element("div");
            dom.set_attribute(overlay, OVERLAY_ATTR, "");
            let sheets = dom.create_element("div");
            dom.set_attribute(sheets, SHEETS_ATTR, "");
            dom.append_child(container, overlay);
            dom.append_child(container, sheets);
            dom.append_child(root, container);
            Shell {
                container,
                overlay,
                sheets,
            }
        });
        let drag =
            (config.kind == ModalKind::BottomSheet).then(|| BottomSheetDrag::new(config.drag.clone()));
        tracing::debug!(
            target: "sheets.stack",
            instance = %id,
            kind = config.kind.as_str(),
            stack_size = config.stack_size,
            "instance bound"
        );
        Self {
            inner: Rc::new(Inner {
                id,
                stage: stage.clone(),
                shell,
                state: RefCell::new(State {
                    stack: SheetStack::new(config.stack_size),
                    config,
                    open: false,
                    torn_down: false,
                    focus: FocusCoordinator::new(id),
                    transitions: TransitionResolver::new(),
                    mounts: Vec::new(),
                    drag,
                }),
                renderer: RefCell::new(Box::new(renderer)),
            }),
        }
    }

    // --- Queries ---

    #[inline]
    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn shell(&self) -> Shell {
        self.inner.shell
    }

    pub fn stage(&self) -> &Stage {
        &self.inner.stage
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().open
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.state.borrow().torn_down
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().stack.is_empty()
    }

    /// Snapshot of the sheets, bottom to top.
    pub fn sheets(&self) -> Vec<Sheet> {
        self.inner.state.borrow().stack.sheets().to_vec()
    }

    pub fn active_sheet(&self) -> Option<Sheet> {
        self.inner.state.borrow().stack.active().cloned()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.inner.state.borrow().stack.active_index()
    }

    pub fn sheet(&self, id: SheetId) -> Option<Sheet> {
        self.inner.state.borrow().stack.get(id).cloned()
    }

    pub fn config(&self) -> ModalConfig {
        self.inner.state.borrow().config.clone()
    }

    pub fn focus_phase(&self) -> FocusPhase {
        self.inner.state.borrow().focus.phase()
    }

    /// Whether another overlay blocked this one when it last opened.
    pub fn is_blocked(&self) -> bool {
        self.inner.state.borrow().focus.is_blocked()
    }

    /// Elements whose transition this instance is waiting for.
    pub fn pending_transitions(&self) -> Vec<NodeId> {
        self.inner.state.borrow().transitions.pending_elements()
    }

    // --- Animation settings ---

    pub fn animation_disabled(&self) -> bool {
        self.inner.state.borrow().config.animation.disabled
    }

    pub fn set_animation_disabled(&self, disabled: bool) {
        self.inner.state.borrow_mut().config.animation.disabled = disabled;
        self.sync_animation_attr();
    }

    pub fn animation_kind(&self) -> crate::config::AnimationKind {
        self.inner.state.borrow().config.animation.kind
    }

    pub fn set_animation_kind(&self, kind: crate::config::AnimationKind) {
        self.inner.state.borrow_mut().config.animation.kind = kind;
        self.sync_animation_attr();
    }

    /// Toggle `data-animation-paused` on the container.
    pub fn set_animation_paused(&self, paused: bool) {
        let container = self.inner.shell.container;
        self.inner.stage.with_dom(|dom| {
            if paused {
                dom.set_attribute(container, PAUSED_ATTR, "");
            } else {
                dom.remove_attribute(container, PAUSED_ATTR);
            }
        });
    }

    pub fn is_animation_paused(&self) -> bool {
        let container = self.inner.shell.container;
        self.inner
            .stage
            .with_dom(|dom| dom.has_attribute(container, PAUSED_ATTR))
    }

    // --- Control operations ---

    /// Push `content` as a new active sheet.
    ///
    /// The first sheet opens the shell. Pushing onto a hidden stack keeps it
    /// hidden. After the push's transition, the stack is trimmed to
    /// `stack_size` (bottom first) and, with `pop_last`, the sheet that was
    /// on top before the push is removed. Neither removal animates.
    pub async fn push(&self, content: Content, options: CallOptions) -> Result<Sheet> {
        let span = tracing::debug_span!(
            target: "sheets.stack",
            "modal.push",
            instance = %self.id(),
            sheets = self.len()
        );
        self.push_sheet(content, options).instrument(span).await
    }

    /// Push `content` and drop the sheet beneath it.
    pub async fn transit(&self, content: Content, options: CallOptions) -> Result<Sheet> {
        let span = tracing::debug_span!(
            target: "sheets.stack",
            "modal.transit",
            instance = %self.id(),
            sheets = self.len()
        );
        self.push_sheet(content, options.pop_last(true))
            .instrument(span)
            .await
    }

    /// Remove the top sheet, closing the instance when it was the last one.
    pub async fn pop(&self, options: CallOptions) -> Result<Sheet> {
        let span = tracing::debug_span!(
            target: "sheets.stack",
            "modal.pop",
            instance = %self.id(),
            sheets = self.len()
        );
        async {
            self.ensure_live()?;
            let (len, open) = {
                let state = self.inner.state.borrow();
                (state.stack.len(), state.open)
            };
            if len == 0 {
                return Err(ModalError::EmptyStack);
            }
            if len == 1 && open {
                self.close_shell(&options, true).await?;
            }
            let sheet = self.remove_top_sheet(&options).await?;
            self.close_if_empty(&options).await?;
            Ok(sheet)
        }
        .instrument(span)
        .await
    }

    /// Remove the top sheet without closing the shell.
    ///
    /// Animates the leaving sheet only while the instance is open, another
    /// sheet remains and the top sheet is the active one. A top sheet behind
    /// the active one is hidden and is removed without waiting.
    pub async fn remove_top_sheet(&self, options: &CallOptions) -> Result<Sheet> {
        self.ensure_live()?;
        let (top, next_active, animate_out) = {
            let state = self.inner.state.borrow();
            let stack = &state.stack;
            let top = stack.top().ok_or(ModalError::EmptyStack)?;
            let len = stack.len();
            let top_active = stack.active_index() == Some(len - 1);
            let next_active = match stack.active_index() {
                Some(i) if i + 1 == len && len > 1 => stack.sheets()[len - 2].element(),
                Some(i) => stack.sheets()[i].element(),
                None => None,
            };
            (top.clone(), next_active, state.open && len > 1 && top_active)
        };

        if animate_out && let Some(element) = top.element() {
            self.transition(options, element, |dom, _| {
                dom.set_attribute(element, LEAVING_ATTR, "");
                dom.remove_attribute(element, ACTIVE_ATTR);
                if let Some(next) = next_active {
                    dom.set_attribute(next, ACTIVE_ATTR, "");
                }
            })
            .await?;
        }

        let removed = {
            let mut state = self.inner.state.borrow_mut();
            if state.stack.top().map(Sheet::id) == Some(top.id()) {
                state.stack.remove_top()
            } else {
                state.stack.remove_id(top.id())
            }
        };
        let sheet = removed.ok_or_else(|| ModalError::invalid("top sheet vanished during pop"))?;
        self.release_sheet(&sheet);
        self.sync_active_flags();
        if self.is_open() {
            self.refocus_active();
        }
        tracing::debug!(target: "sheets.stack", sheet = %sheet.id(), "sheet removed");
        Ok(sheet)
    }

    /// Close the shell if no sheet remains. Returns whether it closed.
    pub async fn close_if_empty(&self, options: &CallOptions) -> Result<bool> {
        let (empty, open) = {
            let state = self.inner.state.borrow();
            (state.stack.is_empty(), state.open)
        };
        if empty && open {
            self.close_shell(options, false).await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Remove every sheet in one combined transition and close.
    ///
    /// Completion waits on the overlay alone. The active sheet is marked
    /// leaving but its own transition is not awaited.
    pub async fn empty(&self, options: CallOptions) -> Result<Vec<Sheet>> {
        let span = tracing::debug_span!(
            target: "sheets.stack",
            "modal.empty",
            instance = %self.id(),
            sheets = self.len()
        );
        async {
            self.ensure_live()?;
            if self.is_empty() {
                return Err(ModalError::EmptyStack);
            }
            if self.is_open() {
                self.close_shell(&options, true).await?;
            }
            let removed = self.inner.state.borrow_mut().stack.clear();
            for sheet in &removed {
                self.release_sheet(sheet);
            }
            tracing::debug!(target: "sheets.stack", removed = removed.len(), "stack emptied");
            Ok(removed)
        }
        .instrument(span)
        .await
    }

    /// Activate the sheet above the active one.
    pub async fn next(&self, options: CallOptions) -> Result<Sheet> {
        let span = tracing::debug_span!(
            target: "sheets.stack",
            "modal.next",
            instance = %self.id(),
            sheets = self.len()
        );
        self.step(Direction::Forward, options).instrument(span).await
    }

    /// Activate the sheet below the active one.
    pub async fn back(&self, options: CallOptions) -> Result<Sheet> {
        let span = tracing::debug_span!(
            target: "sheets.stack",
            "modal.back",
            instance = %self.id(),
            sheets = self.len()
        );
        self.step(Direction::Backward, options)
            .instrument(span)
            .await
    }

    /// Close the shell, keeping every sheet. A no-op when already hidden.
    pub async fn hide(&self, options: CallOptions) -> Result<()> {
        let span = tracing::debug_span!(
            target: "sheets.stack",
            "modal.hide",
            instance = %self.id(),
            sheets = self.len()
        );
        async {
            self.ensure_live()?;
            if !self.is_open() {
                return Ok(());
            }
            self.close_shell(&options, false).await
        }
        .instrument(span)
        .await
    }

    /// Open the shell, pushing `content` first if given.
    pub async fn show(&self, content: Option<Content>, options: CallOptions) -> Result<Sheet> {
        let span = tracing::debug_span!(
            target: "sheets.stack",
            "modal.show",
            instance = %self.id(),
            sheets = self.len()
        );
        async {
            self.ensure_live()?;
            if let Some(content) = content {
                let sheet = self.push_sheet(content, options.clone()).await?;
                if !self.is_open() {
                    self.open_shell(&options).await?;
                }
                return Ok(sheet);
            }
            if self.is_empty() {
                return Err(ModalError::EmptyStack);
            }
            if !self.is_open() {
                self.open_shell(&options).await?;
            }
            self.active_sheet().ok_or(ModalError::NoActiveSheet)
        }
        .instrument(span)
        .await
    }

    // --- Host integration ---

    /// Report the mounted element of `sheet`.
    ///
    /// The first report binds; later reports are ignored and return `false`.
    pub fn bind_element(&self, sheet: SheetId, element: NodeId) -> bool {
        let mut state = self.inner.state.borrow_mut();
        if state.torn_down {
            return false;
        }
        let Some(entry) = state.stack.get_mut(sheet) else {
            return false;
        };
        if !entry.bind_element(element) {
            tracing::trace!(target: "sheets.stack", sheet = %sheet, "element already bound");
            return false;
        }
        let attributes = entry.attributes().to_vec();
        let host = self.inner.shell.sheets;
        self.inner.stage.with_dom(|dom| {
            if dom.parent(element) != Some(host) {
                dom.append_child(host, element);
            }
            dom.set_attribute(element, SHEET_ID_ATTR, &sheet.to_string());
            for (name, value) in &attributes {
                dom.set_attribute(element, name, value);
            }
        });
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut state.mounts)
            .into_iter()
            .partition(|(id, _)| *id == sheet);
        state.mounts = waiting;
        for (_, resolver) in ready {
            resolver.resolve(element);
        }
        true
    }

    /// Route a host event to this instance.
    ///
    /// Resolves transitions, tracks focus, and reports the configured
    /// action for Escape, overlay clicks and closing drags.
    pub fn dispatch(&self, event: &DomEvent) -> Option<ModalAction> {
        let shell = self.inner.shell;
        let mut state = self.inner.state.borrow_mut();
        if state.torn_down {
            return None;
        }
        let action = match event {
            DomEvent::TransitionEnd { .. } | DomEvent::TransitionCancel { .. } => {
                state.transitions.handle(event);
                None
            }
            DomEvent::FocusIn { target } => {
                self.track_focus(&mut state, *target);
                None
            }
            DomEvent::KeyDown {
                key: Key::Escape, ..
            } if self.accepts_input(&state) => Some(state.config.on_esc.clone()),
            DomEvent::Click { target }
                if *target == shell.overlay && self.accepts_input(&state) =>
            {
                Some(state.config.on_click_overlay.clone())
            }
            DomEvent::Pointer(pointer) if self.accepts_input(&state) => {
                let outcome = match state.drag.as_mut() {
                    Some(drag) => self
                        .inner
                        .stage
                        .with_dom(|dom| drag.handle_pointer(dom, pointer)),
                    None => DragOutcome::Ignored,
                };
                (outcome == DragOutcome::Close).then_some(ModalAction::Pop)
            }
            _ => None,
        };
        action.filter(|a| !a.is_none())
    }

    /// Tear the instance down. Idempotent.
    ///
    /// Runs the closed-state focus handler, abandons in-flight operations
    /// and detaches the shell.
    pub fn teardown(&self) {
        let container = self.inner.shell.container;
        let removed = {
            let mut state = self.inner.state.borrow_mut();
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            state.open = false;
            let State { focus, .. } = &mut *state;
            self.inner.stage.with_focus(|dom, env| {
                focus.closed(dom, env);
                env.inert.forget_owner(container);
            });
            let abandoned = state.transitions.abandon_all() + state.mounts.len();
            state.mounts.clear();
            if abandoned > 0 {
                tracing::debug!(
                    target: "sheets.stack",
                    instance = %self.id(),
                    abandoned,
                    "teardown abandoned pending operations"
                );
            }
            state.stack.clear()
        };
        for sheet in &removed {
            self.release_sheet(sheet);
        }
        self.inner.stage.with_dom(|dom| dom.remove(container));
        tracing::debug!(target: "sheets.stack", instance = %self.id(), "instance torn down");
    }

    // --- Internal steps ---

    fn ensure_live(&self) -> Result<()> {
        if self.is_torn_down() {
            return Err(ModalError::invalid(format!(
                "instance {} has been torn down",
                self.id()
            )));
        }
        Ok(())
    }

    async fn push_sheet(&self, content: Content, options: CallOptions) -> Result<Sheet> {
        self.ensure_live()?;
        let (id, previous_top, was_empty) = {
            let mut state = self.inner.state.borrow_mut();
            let previous_top = state.stack.top().map(Sheet::id);
            let was_empty = state.stack.is_empty();
            let sheet = Sheet::new(content).with_attributes(options.attributes.clone());
            (state.stack.push_sheet(sheet), previous_top, was_empty)
        };
        let element = self.mount(id).await?;

        if was_empty {
            self.open_shell(&options).await?;
        } else if self.is_open() {
            self.transition(&options, element, |dom, stack| mark_active(dom, stack))
                .await?;
            self.refocus_active();
        } else {
            self.sync_active_flags();
        }

        loop {
            let evicted = self.inner.state.borrow_mut().stack.evict_bottom();
            let Some(sheet) = evicted else {
                break;
            };
            tracing::debug!(target: "sheets.stack", sheet = %sheet.id(), "evicted bottom sheet");
            self.release_sheet(&sheet);
        }
        if options.pop_last
            && let Some(previous) = previous_top
        {
            let removed = self.inner.state.borrow_mut().stack.remove_id(previous);
            if let Some(sheet) = removed {
                tracing::debug!(target: "sheets.stack", sheet = %sheet.id(), "removed previous top");
                self.release_sheet(&sheet);
            }
        }
        if self.is_open() {
            self.refocus_active();
        }

        self.sheet(id)
            .ok_or_else(|| ModalError::invalid("pushed sheet was removed by its own push"))
    }

    async fn step(&self, direction: Direction, options: CallOptions) -> Result<Sheet> {
        self.ensure_live()?;
        let (target, element, open) = {
            let state = self.inner.state.borrow();
            let target = state.stack.step_target(direction)?;
            let element = state.stack.sheets()[target]
                .element()
                .ok_or_else(|| ModalError::invalid("navigation target has no mounted element"))?;
            (target, element, state.open)
        };
        if open {
            self.transition(&options, element, move |dom, stack| {
                stack.set_active(target);
                mark_active(dom, stack);
            })
            .await?;
            self.refocus_active();
        } else {
            self.inner.state.borrow_mut().stack.set_active(target);
            self.sync_active_flags();
        }
        self.active_sheet().ok_or(ModalError::NoActiveSheet)
    }

    async fn mount(&self, id: SheetId) -> Result<NodeId> {
        let sheet = self
            .sheet(id)
            .ok_or_else(|| ModalError::invalid("sheet removed before mounting"))?;
        let host = self.inner.shell.sheets;
        let rendered = {
            let mut renderer = self.inner.renderer.borrow_mut();
            self.inner
                .stage
                .with_dom(|dom| renderer.render(dom, host, &sheet))
        };
        if let Some(element) = rendered {
            self.bind_element(id, element);
        }
        if let Some(element) = self.sheet(id).and_then(|s| s.element()) {
            return Ok(element);
        }
        let (resolver, pending) = Pending::channel();
        self.inner.state.borrow_mut().mounts.push((id, resolver));
        tracing::debug!(target: "sheets.stack", sheet = %id, "waiting for sheet to mount");
        pending.await
    }

    async fn open_shell(&self, options: &CallOptions) -> Result<()> {
        let shell = self.inner.shell;
        if self.active_element().is_none() {
            return Err(ModalError::invalid("no mounted active sheet to open with"));
        }
        {
            let mut state = self.inner.state.borrow_mut();
            state.open = true;
            let State { focus, .. } = &mut *state;
            self.inner
                .stage
                .with_focus(|dom, env| focus.begin_opening(dom, env, shell.container));
        }
        self.transition(options, shell.overlay, |dom, stack| {
            dom.set_attribute(shell.container, OPEN_ATTR, "");
            mark_active(dom, stack);
        })
        .await?;

        let mut state = self.inner.state.borrow_mut();
        let Some(active) = state.stack.active() else {
            return Err(ModalError::NoActiveSheet);
        };
        let element = active.element();
        let remembered = active.last_focused();
        let others = state.stack.inactive_elements();
        let State { focus, drag, .. } = &mut *state;
        self.inner.stage.with_focus(|dom, env| {
            if let Some(element) = element {
                focus.opened(dom, env, element, &others, remembered);
            }
            if let Some(drag) = drag.as_mut() {
                drag.retarget(element);
                drag.apply_position(dom);
            }
        });
        tracing::debug!(target: "sheets.stack", instance = %self.id(), "instance opened");
        Ok(())
    }

    async fn close_shell(&self, options: &CallOptions, leaving: bool) -> Result<()> {
        let shell = self.inner.shell;
        let leaving_element = if leaving { self.active_element() } else { None };
        {
            let mut state = self.inner.state.borrow_mut();
            state.open = false;
            let State { focus, .. } = &mut *state;
            self.inner
                .stage
                .with_dom(|dom| focus.begin_closing(dom, shell.container));
        }
        self.transition(options, shell.overlay, |dom, _| {
            dom.remove_attribute(shell.container, OPEN_ATTR);
            if let Some(element) = leaving_element {
                dom.set_attribute(element, LEAVING_ATTR, "");
            }
        })
        .await?;

        let mut state = self.inner.state.borrow_mut();
        let State { focus, drag, .. } = &mut *state;
        self.inner.stage.with_focus(|dom, env| {
            focus.closed(dom, env);
            if let Some(drag) = drag.as_mut() {
                drag.reset(dom);
            }
        });
        tracing::debug!(target: "sheets.stack", instance = %self.id(), "instance closed");
        Ok(())
    }

    /// Start a transition on `element` and wait for it.
    async fn transition(
        &self,
        options: &CallOptions,
        element: NodeId,
        trigger: impl FnOnce(&mut dyn Dom, &mut SheetStack),
    ) -> Result<()> {
        let pending = {
            let mut state = self.inner.state.borrow_mut();
            if state.torn_down {
                return Err(ModalError::invalid("instance torn down mid-operation"));
            }
            let animate = options.animates(&state.config.animation);
            let kind = options.kind(&state.config.animation);
            let container = self.inner.shell.container;
            let State {
                transitions, stack, ..
            } = &mut *state;
            self.inner.stage.with_dom(|dom| {
                if animate {
                    dom.set_attribute(container, ANIMATION_ATTR, kind.as_str());
                }
                run_transition(dom, transitions, element, animate, |dom| trigger(dom, stack))
            })
        };
        let result = pending.await;
        if matches!(options.animation, Some(AnimationOverride::Kind(_))) {
            self.sync_animation_attr();
        }
        result
    }

    fn active_element(&self) -> Option<NodeId> {
        self.inner
            .state
            .borrow()
            .stack
            .active()
            .and_then(Sheet::element)
    }

    fn refocus_active(&self) {
        let mut state = self.inner.state.borrow_mut();
        let Some(active) = state.stack.active() else {
            return;
        };
        let Some(element) = active.element() else {
            return;
        };
        let remembered = active.last_focused();
        let others = state.stack.inactive_elements();
        let State { focus, drag, .. } = &mut *state;
        self.inner.stage.with_focus(|dom, env| {
            focus.activate_sheet(dom, env, element, &others, remembered);
        });
        if let Some(drag) = drag.as_mut() {
            drag.retarget(Some(element));
        }
    }

    fn sync_active_flags(&self) {
        let state = self.inner.state.borrow();
        self.inner
            .stage
            .with_dom(|dom| mark_active(dom, &state.stack));
    }

    fn sync_animation_attr(&self) {
        let value = animation_attr(&self.inner.state.borrow().config);
        let container = self.inner.shell.container;
        self.inner
            .stage
            .with_dom(|dom| dom.set_attribute(container, ANIMATION_ATTR, value));
    }

    /// Drop the host-side traces of a sheet that left the stack.
    fn release_sheet(&self, sheet: &Sheet) {
        let id = self.id();
        self.inner
            .state
            .borrow_mut()
            .mounts
            .retain(|(sheet_id, _)| *sheet_id != sheet.id());
        let Some(element) = sheet.element() else {
            return;
        };
        self.inner.stage.with_focus(|dom, env| {
            while env.inert.unmark(dom, element, id) {}
        });
        let mut renderer = self.inner.renderer.borrow_mut();
        self.inner
            .stage
            .with_dom(|dom| renderer.unmount(dom, sheet, element));
    }

    fn track_focus(&self, state: &mut State, target: NodeId) {
        let container = self.inner.shell.container;
        let State { stack, focus, .. } = state;
        self.inner.stage.with_focus(|dom, env| {
            let owner = stack
                .find_by_element(|element| dom.contains(element, target))
                .map(Sheet::id);
            if let Some(owner) = owner
                && let Some(sheet) = stack.get_mut(owner)
            {
                sheet.set_last_focused(target);
            }
            if !focus.intercepts_focus() || env.inert.is_inert(dom, container) {
                return;
            }
            let Some(active) = stack.active() else {
                return;
            };
            let Some(element) = active.element() else {
                return;
            };
            if let Some(redirected) =
                focus.contain_focus(dom, element, target, active.last_focused())
            {
                tracing::debug!(
                    target: "sheets.focus",
                    instance = %self.id(),
                    from = target.get(),
                    to = redirected.get(),
                    "focus trapped inside active sheet"
                );
            }
        });
    }

    fn accepts_input(&self, state: &State) -> bool {
        if !state.open {
            return false;
        }
        let container = self.inner.shell.container;
        !self
            .inner
            .stage
            .with_focus(|dom, env| env.inert.is_inert(dom, container))
    }
}

fn animation_attr(config: &ModalConfig) -> &'static str {
    if config.animation.disabled {
        "none"
    } else {
        config.animation.kind.as_str()
    }
}

fn mark_active(dom: &mut dyn Dom, stack: &SheetStack) {
    let active = stack.active_index();
    for (i, sheet) in stack.sheets().iter().enumerate() {
        let Some(element) = sheet.element() else {
            continue;
        };
        if Some(i) == active {
            dom.set_attribute(element, ACTIVE_ATTR, "");
            dom.remove_attribute(element, LEAVING_ATTR);
        } else {
            dom.remove_attribute(element, ACTIVE_ATTR);
        }
    }
}
