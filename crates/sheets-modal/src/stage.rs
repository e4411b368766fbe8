#![forbid(unsafe_code)]

//! Shared document context.
//!
//! Every instance bound to the same document shares one [`Stage`]: the host
//! tree, the document-wide accessibility state, and the host-advanced
//! timers. Borrows are scoped to closures and never held across an
//! `.await`.

use std::cell::RefCell;
use std::rc::Rc;

use sheets_a11y::FocusEnvironment;
use sheets_core::{Dom, Timers};

struct StageInner {
    dom: RefCell<Box<dyn Dom>>,
    env: RefCell<FocusEnvironment>,
    timers: Timers,
}

/// Handle to a shared document. Clones share state.
#[derive(Clone)]
pub struct Stage {
    inner: Rc<StageInner>,
}

impl Stage {
    pub fn new(dom: impl Dom + 'static) -> Self {
        Self::with_timers(dom, Timers::new())
    }

    /// Create a stage driven by existing timers.
    pub fn with_timers(dom: impl Dom + 'static, timers: Timers) -> Self {
        Self {
            inner: Rc::new(StageInner {
                dom: RefCell::new(Box::new(dom)),
                env: RefCell::new(FocusEnvironment::new()),
                timers,
            }),
        }
    }

    /// Run `f` with mutable access to the host tree.
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut dyn Dom) -> R) -> R {
        let mut dom = self.inner.dom.borrow_mut();
        f(dom.as_mut())
    }

    /// Run `f` with the host tree and the accessibility state.
    pub fn with_focus<R>(&self, f: impl FnOnce(&mut dyn Dom, &mut FocusEnvironment) -> R) -> R {
        let mut dom = self.inner.dom.borrow_mut();
        let mut env = self.inner.env.borrow_mut();
        f(dom.as_mut(), &mut env)
    }

    /// Run `f` with read access to the accessibility state.
    pub fn with_env<R>(&self, f: impl FnOnce(&FocusEnvironment) -> R) -> R {
        f(&self.inner.env.borrow())
    }

    pub fn timers(&self) -> &Timers {
        &self.inner.timers
    }

    /// Whether both handles share one document.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("now", &self.inner.timers.now())
            .finish_non_exhaustive()
    }
}
