#![allow(dead_code)]

use std::time::Duration;

use sheets::prelude::*;
use sheets::{ModalInstance, Result};

/// Sheet element: `section > [h2, button, button]`.
pub fn render(dom: &mut dyn Dom, host: NodeId, _sheet: &Sheet) -> Option<NodeId> {
    let section = dom.create_element("section");
    dom.append_child(host, section);
    let title = dom.create_element("h2");
    dom.append_child(section, title);
    for _ in 0..2 {
        let button = dom.create_element("button");
        dom.append_child(section, button);
    }
    Some(section)
}

pub fn runtime() -> ModalRuntime {
    ModalRuntime::new(MemoryDom::new(), RuntimeConfig::default())
}

/// Runtime without call gaps, for tests that do not care about timing.
pub fn instant_runtime() -> ModalRuntime {
    ModalRuntime::new(
        MemoryDom::new(),
        RuntimeConfig::default().call_gap(Duration::ZERO),
    )
}

/// End every pending transition, advancing time through call gaps, until
/// the queue is drained.
pub fn settle(rt: &ModalRuntime) {
    for _ in 0..256 {
        rt.run_until_stalled();
        let pending = rt.pending_transitions();
        for &target in &pending {
            rt.dispatch(&DomEvent::TransitionEnd { target });
        }
        if pending.is_empty() {
            if rt.is_idle() {
                return;
            }
            rt.advance(Duration::from_millis(10));
        }
    }
    panic!("runtime did not settle");
}

/// Take a settled call outcome.
pub fn outcome<T>(pending: &mut Pending<T>) -> Result<T> {
    pending.try_take().expect("call should have settled")
}

/// A focused button outside every overlay.
pub fn outside_button(rt: &ModalRuntime) -> NodeId {
    rt.with_dom(|dom| {
        let root = dom.document_root();
        let button = dom.create_element("button");
        dom.append_child(root, button);
        assert!(dom.focus(button));
        button
    })
}

pub fn focused(rt: &ModalRuntime) -> Option<NodeId> {
    rt.with_dom(|dom| dom.active_element())
}

pub fn has_attr(rt: &ModalRuntime, node: NodeId, name: &str) -> bool {
    rt.with_dom(|dom| dom.has_attribute(node, name))
}

/// Content labels bottom to top.
pub fn labels(instance: &ModalInstance) -> Vec<&'static str> {
    instance
        .sheets()
        .iter()
        .map(|sheet| {
            *sheet
                .content()
                .downcast_ref::<&'static str>()
                .expect("string content")
        })
        .collect()
}

/// First button of `sheet`'s element.
pub fn first_button(rt: &ModalRuntime, sheet: &Sheet) -> NodeId {
    let element = sheet.element().expect("mounted sheet");
    rt.with_dom(|dom| {
        dom.children(element)
            .into_iter()
            .find(|&child| dom.tag(child).as_deref() == Some("button"))
            .expect("sheet has a button")
    })
}

pub fn escape() -> DomEvent {
    DomEvent::KeyDown {
        key: Key::Escape,
        target: None,
    }
}
