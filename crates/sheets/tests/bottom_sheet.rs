//! Pointer gestures on bottom-sheet instances.

mod common;

use std::time::Duration;

use common::*;
use sheets::prelude::*;

fn bottom_sheet(drag: BottomSheetDragConfig) -> (ModalRuntime, ModalHandle, NodeId) {
    let rt = runtime();
    let config = ModalConfig::default()
        .kind(ModalKind::BottomSheet)
        .position(ModalPosition::Bottom)
        .drag(drag);
    let modal = rt.bind(DEFAULT_KEY, config, render).unwrap();
    let mut pushed = modal.push("sheet", CallOptions::new());
    settle(&rt);
    let sheet = outcome(&mut pushed).unwrap();
    let button = first_button(&rt, &sheet);
    (rt, modal, button)
}

/// Press on `target`, move down by `distance` over `elapsed`, release.
fn drag_down(rt: &ModalRuntime, target: NodeId, distance: f64, elapsed: Duration) -> usize {
    let samples = [
        PointerEvent::new(PointerPhase::Down, target, 100.0, Duration::ZERO),
        PointerEvent::new(PointerPhase::Move, target, 100.0 + distance, elapsed),
        PointerEvent::new(PointerPhase::Up, target, 100.0 + distance, elapsed),
    ];
    samples
        .into_iter()
        .map(|sample| rt.dispatch(&DomEvent::Pointer(sample)))
        .sum()
}

#[test]
fn fast_swipe_down_closes_the_sheet() {
    let (rt, _modal, button) = bottom_sheet(BottomSheetDragConfig::default());
    let instance = rt.instance(DEFAULT_KEY).unwrap();
    assert_eq!(
        rt.with_dom(|dom| dom.attribute(instance.shell().container, "data-type")),
        Some("bottom-sheet".into())
    );

    assert_eq!(drag_down(&rt, button, 40.0, Duration::from_millis(10)), 1);
    settle(&rt);
    assert!(instance.is_empty());
    assert!(!instance.is_open());
}

#[test]
fn slow_drag_snaps_back_without_closing() {
    let (rt, _modal, button) = bottom_sheet(BottomSheetDragConfig::default());
    assert_eq!(drag_down(&rt, button, 40.0, Duration::from_secs(1)), 0);
    settle(&rt);
    let instance = rt.instance(DEFAULT_KEY).unwrap();
    assert_eq!(instance.len(), 1);
    assert!(instance.is_open());
}

#[test]
fn closing_by_drag_can_be_turned_off() {
    let drag = BottomSheetDragConfig::default().close_by_drag_down(false);
    let (rt, _modal, button) = bottom_sheet(drag);
    assert_eq!(drag_down(&rt, button, 40.0, Duration::from_millis(10)), 0);
    assert!(rt.instance(DEFAULT_KEY).unwrap().is_open());
}

#[test]
fn disabled_drag_ignores_pointer_input() {
    let drag = BottomSheetDragConfig::default().disable_drag(true);
    let (rt, _modal, button) = bottom_sheet(drag);
    assert_eq!(drag_down(&rt, button, 40.0, Duration::from_millis(10)), 0);
    assert_eq!(rt.instance(DEFAULT_KEY).unwrap().len(), 1);
}

#[test]
fn hidden_sheet_ignores_gestures() {
    let (rt, modal, button) = bottom_sheet(BottomSheetDragConfig::default());
    let _ = modal.hide(CallOptions::new());
    settle(&rt);
    assert_eq!(drag_down(&rt, button, 40.0, Duration::from_millis(10)), 0);
    assert_eq!(rt.instance(DEFAULT_KEY).unwrap().len(), 1);
}

#[test]
fn floating_instances_do_not_drag() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
    let mut pushed = modal.push("a", CallOptions::new());
    settle(&rt);
    let sheet = outcome(&mut pushed).unwrap();
    let button = first_button(&rt, &sheet);
    assert_eq!(drag_down(&rt, button, 40.0, Duration::from_millis(10)), 0);
}
