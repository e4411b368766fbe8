//! Stack behavior through the queued runtime surface.

mod common;

use std::time::Duration;

use common::*;
use proptest::prelude::*;
use sheets::prelude::*;
use sheets::{Direction, ErrorKind};

#[test]
fn stack_size_evicts_oldest_first() {
    let rt = runtime();
    let modal = rt
        .bind(DEFAULT_KEY, ModalConfig::default().stack_size(3), render)
        .unwrap();
    for label in ["a", "b", "c", "d", "e"] {
        let _ = modal.push(label, CallOptions::new());
    }
    settle(&rt);

    let instance = rt.instance(DEFAULT_KEY).unwrap();
    assert_eq!(labels(&instance), ["c", "d", "e"]);
    assert_eq!(instance.active_index(), Some(2));
}

#[test]
fn transit_replaces_the_previous_top() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
    let _ = modal.push("a", CallOptions::new());
    let _ = modal.push("b", CallOptions::new());
    let mut transited = modal.transit("c", CallOptions::new());
    settle(&rt);

    let sheet = outcome(&mut transited).unwrap();
    let instance = rt.instance(DEFAULT_KEY).unwrap();
    assert_eq!(labels(&instance), ["a", "c"]);
    assert_eq!(instance.active_sheet(), Some(sheet));
}

#[test]
fn transit_on_empty_stack_is_a_push() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
    let mut transited = modal.transit("only", CallOptions::new());
    settle(&rt);

    assert!(outcome(&mut transited).is_ok());
    let instance = rt.instance(DEFAULT_KEY).unwrap();
    assert_eq!(labels(&instance), ["only"]);
    assert!(instance.is_open());
}

#[test]
fn hide_preserves_and_pop_discards() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();

    let mut pushed = modal.push("a", CallOptions::new());
    let _ = modal.hide(CallOptions::new());
    let mut shown = modal.show(None, CallOptions::new());
    settle(&rt);
    let a = outcome(&mut pushed).unwrap();
    assert_eq!(outcome(&mut shown), Ok(a.clone()));
    let instance = rt.instance(DEFAULT_KEY).unwrap();
    assert!(instance.is_open());
    assert_eq!(instance.active_sheet(), Some(a));

    let mut popped = modal.pop(CallOptions::new());
    settle(&rt);
    assert!(outcome(&mut popped).is_ok());
    assert!(!instance.is_open());
    assert!(instance.is_empty());

    let mut shown = modal.show(None, CallOptions::new());
    settle(&rt);
    assert_eq!(outcome(&mut shown), Err(ModalError::EmptyStack));
}

#[test]
fn show_with_content_pushes_and_opens() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
    let mut shown = modal.show(Some(Content::from("fresh")), CallOptions::new());
    settle(&rt);

    assert!(outcome(&mut shown).is_ok());
    let instance = rt.instance(DEFAULT_KEY).unwrap();
    assert!(instance.is_open());
    assert_eq!(labels(&instance), ["fresh"]);
}

#[test]
fn empty_removes_everything_and_closes() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
    let _ = modal.push("a", CallOptions::new());
    let _ = modal.push("b", CallOptions::new());
    let mut emptied = modal.empty(CallOptions::new());
    settle(&rt);

    let removed = outcome(&mut emptied).unwrap();
    assert_eq!(removed.len(), 2);
    let instance = rt.instance(DEFAULT_KEY).unwrap();
    assert!(instance.is_empty());
    assert!(!instance.is_open());
    for sheet in removed {
        let element = sheet.element().unwrap();
        assert_eq!(rt.with_dom(|dom| dom.parent(element)), None);
    }

    let mut again = modal.empty(CallOptions::new());
    settle(&rt);
    assert_eq!(outcome(&mut again).unwrap_err().kind(), ErrorKind::EmptyStack);
}

#[test]
fn next_then_back_returns_to_start() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
    for label in ["a", "b", "c", "d"] {
        let _ = modal.push(label, CallOptions::new());
    }
    settle(&rt);
    let instance = rt.instance(DEFAULT_KEY).unwrap();

    // Walk down to the bottom, checking the round trip at every index.
    for start in (0..3).rev() {
        let _ = modal.back(CallOptions::new());
        settle(&rt);
        assert_eq!(instance.active_index(), Some(start));

        let _ = modal.next(CallOptions::new());
        let _ = modal.back(CallOptions::new());
        settle(&rt);
        assert_eq!(instance.active_index(), Some(start));
    }

    let mut past_edge = modal.back(CallOptions::new());
    settle(&rt);
    assert_eq!(
        outcome(&mut past_edge),
        Err(ModalError::Boundary {
            direction: Direction::Backward
        })
    );
    assert_eq!(instance.len(), 4);
}

#[test]
fn navigation_on_single_sheet_is_an_empty_stack_error() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
    let _ = modal.push("a", CallOptions::new());
    let mut next = modal.next(CallOptions::new());
    settle(&rt);
    assert_eq!(outcome(&mut next), Err(ModalError::EmptyStack));
}

#[test]
fn unbound_key_rejects_without_throwing() {
    let rt = runtime();
    let modal = rt.get_modal("nowhere");
    let mut pushed = modal.push("a", CallOptions::new());
    assert!(!pushed.is_settled());
    settle(&rt);
    assert_eq!(outcome(&mut pushed), Err(ModalError::unbound("nowhere")));
}

#[test]
fn queued_call_waits_for_previous_transition() {
    let rt = runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();
    let instance = rt.instance(DEFAULT_KEY).unwrap();

    let mut first = modal.push("a", CallOptions::new());
    let mut second = modal.push("b", CallOptions::new());
    rt.run_until_stalled();
    assert_eq!(instance.len(), 1);
    assert_eq!(rt.pending_transitions(), vec![instance.shell().overlay]);

    // Time alone does not release the lane.
    rt.advance(Duration::from_millis(500));
    assert_eq!(instance.len(), 1);
    assert!(!second.is_settled());

    rt.dispatch(&DomEvent::TransitionEnd {
        target: instance.shell().overlay,
    });
    assert!(outcome(&mut first).is_ok());
    assert_eq!(instance.len(), 1);

    // The next call starts one gap after the previous one finished.
    rt.advance(Duration::from_millis(9));
    assert_eq!(instance.len(), 1);
    rt.advance(Duration::from_millis(1));
    assert_eq!(instance.len(), 2);

    settle(&rt);
    assert_eq!(labels(&instance), ["a", "b"]);
    assert!(outcome(&mut second).is_ok());
}

#[test]
fn per_key_lanes_do_not_wait_for_each_other() {
    let rt = ModalRuntime::new(
        MemoryDom::new(),
        RuntimeConfig::default().queue_scope(QueueScope::PerKey),
    );
    let left = rt.bind("left", ModalConfig::default(), render).unwrap();
    let right = rt.bind("right", ModalConfig::default(), render).unwrap();

    let _ = left.push("l", CallOptions::new());
    let _ = right.push("r", CallOptions::new());
    rt.run_until_stalled();

    assert_eq!(rt.instance("left").unwrap().len(), 1);
    assert_eq!(rt.instance("right").unwrap().len(), 1);
    assert_eq!(rt.pending_transitions().len(), 2);
}

#[test]
fn focus_returns_to_the_element_focused_before_opening() {
    let rt = runtime();
    let outside = outside_button(&rt);
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();

    let _ = modal.push("a", CallOptions::new());
    let _ = modal.push("b", CallOptions::new());
    let _ = modal.pop(CallOptions::new());
    let _ = modal.transit("c", CallOptions::new());
    let _ = modal.push("d", CallOptions::new());
    let _ = modal.back(CallOptions::new());
    settle(&rt);
    assert_ne!(focused(&rt), Some(outside));
    assert!(has_attr(&rt, outside, "inert"));

    let _ = modal.empty(CallOptions::new());
    settle(&rt);
    assert_eq!(focused(&rt), Some(outside));
    assert!(!has_attr(&rt, outside, "inert"));
    assert!(!rt.with_dom(|dom| dom.is_scroll_locked()));
}

#[test]
fn disabled_animation_settles_in_the_same_turn() {
    let rt = instant_runtime();
    let modal = rt.bind(DEFAULT_KEY, ModalConfig::default(), render).unwrap();

    let mut pushed = modal.push("a", CallOptions::instant());
    rt.run_until_stalled();
    assert!(outcome(&mut pushed).is_ok());
    assert!(rt.pending_transitions().is_empty());

    // The instance setting still animates calls without an override.
    let animated = modal.push("b", CallOptions::new());
    rt.run_until_stalled();
    assert!(!animated.is_settled());
    assert_eq!(rt.pending_transitions().len(), 1);
}

#[derive(Debug, Clone)]
enum Op {
    Push,
    Transit,
    Pop,
    Next,
    Back,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Push),
        1 => Just(Op::Transit),
        2 => Just(Op::Pop),
        1 => Just(Op::Next),
        1 => Just(Op::Back),
    ]
}

const LABELS: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

proptest! {
    #[test]
    fn stack_matches_model(stack_size in 1usize..5, ops in prop::collection::vec(op(), 1..40)) {
        let rt = instant_runtime();
        let config = ModalConfig::default()
            .stack_size(stack_size)
            .animation(AnimationConfig::off());
        let modal = rt.bind(DEFAULT_KEY, config, render).unwrap();
        let instance = rt.instance(DEFAULT_KEY).unwrap();
        let mut model: Vec<&'static str> = Vec::new();

        for (i, op) in ops.iter().enumerate() {
            let label = LABELS[i % LABELS.len()];
            match op {
                Op::Push | Op::Transit => {
                    let previous = model.last().copied();
                    let transit = matches!(op, Op::Transit);
                    let _ = if transit {
                        modal.transit(label, CallOptions::new())
                    } else {
                        modal.push(label, CallOptions::new())
                    };
                    model.push(label);
                    if model.len() > stack_size {
                        model.remove(0);
                    }
                    if transit && previous.is_some() && model.len() > 1 {
                        let at = model.len() - 2;
                        if Some(model[at]) == previous {
                            model.remove(at);
                        }
                    }
                }
                Op::Pop => {
                    let _ = modal.pop(CallOptions::new());
                    model.pop();
                }
                Op::Next => {
                    let _ = modal.next(CallOptions::new());
                }
                Op::Back => {
                    let _ = modal.back(CallOptions::new());
                }
            }
            rt.run_until_stalled();

            prop_assert!(instance.len() <= stack_size);
            prop_assert_eq!(labels(&instance), model.clone());
            prop_assert_eq!(instance.is_open(), !model.is_empty());
        }
    }
}
