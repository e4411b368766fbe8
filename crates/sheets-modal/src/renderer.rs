#![forbid(unsafe_code)]

//! Sheet rendering seam.
//!
//! The engine does not know what a sheet looks like. When a sheet is pushed
//! it asks the [`SheetRenderer`] for the sheet's host element. A renderer
//! that mounts asynchronously (a framework that renders on its next frame)
//! returns `None` and later reports the element through
//! [`ModalInstance::bind_element`](crate::ModalInstance::bind_element).

use sheets_core::{Dom, NodeId};

use crate::stack::Sheet;

/// Builds and tears down sheet elements.
pub trait SheetRenderer {
    /// Build `sheet`'s element under `host`.
    ///
    /// Returns `None` when the element mounts later.
    fn render(&mut self, dom: &mut dyn Dom, host: NodeId, sheet: &Sheet) -> Option<NodeId>;

    /// Remove a sheet's element. Defaults to detaching it.
    fn unmount(&mut self, dom: &mut dyn Dom, sheet: &Sheet, element: NodeId) {
        let _ = sheet;
        dom.remove(element);
    }
}

impl<F> SheetRenderer for F
where
    F: FnMut(&mut dyn Dom, NodeId, &Sheet) -> Option<NodeId>,
{
    fn render(&mut self, dom: &mut dyn Dom, host: NodeId, sheet: &Sheet) -> Option<NodeId> {
        self(dom, host, sheet)
    }
}

/// Renderer that never mounts anything itself.
///
/// Hosts using it must call `bind_element` for every pushed sheet.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredRenderer;

impl SheetRenderer for DeferredRenderer {
    fn render(&mut self, _dom: &mut dyn Dom, _host: NodeId, _sheet: &Sheet) -> Option<NodeId> {
        None
    }
}
