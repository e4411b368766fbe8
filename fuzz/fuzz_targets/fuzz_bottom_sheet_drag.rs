#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sheets_core::{Dom, MemoryDom, PointerEvent, PointerPhase, ScrollMetrics};
use sheets_modal::{BottomSheetDrag, BottomSheetDragConfig, DragOutcome};

#[derive(Debug, Arbitrary)]
enum Phase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Arbitrary)]
struct Sample {
    phase: Phase,
    on_list: bool,
    y: i16,
    dt_ms: u8,
}

#[derive(Debug, Arbitrary)]
struct Input {
    positions: Vec<u8>,
    height: u16,
    list_scroll_top: u8,
    close_by_drag_down: bool,
    samples: Vec<Sample>,
}

fuzz_target!(|input: Input| {
    let positions: Vec<f64> = input
        .positions
        .iter()
        .take(8)
        .map(|&p| f64::from(p % 100) + 1.0)
        .collect();
    if positions.is_empty() {
        return;
    }
    let config = BottomSheetDragConfig::default()
        .positions(positions.clone())
        .close_by_drag_down(input.close_by_drag_down);

    let mut dom = MemoryDom::new();
    let root = dom.document_root();
    let sheet = dom.append_new(root, "section");
    let list = dom.append_new(sheet, "ul");
    let height = f64::from(input.height);
    dom.set_scroll_metrics(sheet, ScrollMetrics::new(0.0, height, height));
    dom.set_scroll_metrics(
        list,
        ScrollMetrics::new(f64::from(input.list_scroll_top), 400.0, 100.0),
    );

    let mut drag = BottomSheetDrag::attach(sheet, config);
    drag.apply_position(&mut dom);
    let mut time = Duration::ZERO;
    for sample in input.samples.into_iter().take(128) {
        time += Duration::from_millis(u64::from(sample.dt_ms));
        let phase = match sample.phase {
            Phase::Down => PointerPhase::Down,
            Phase::Move => PointerPhase::Move,
            Phase::Up => PointerPhase::Up,
            Phase::Cancel => PointerPhase::Cancel,
        };
        let target = if sample.on_list { list } else { sheet };
        let event = PointerEvent::new(phase, target, f64::from(sample.y), time);
        let outcome = drag.handle_pointer(&mut dom, &event);

        if outcome == DragOutcome::Close {
            assert!(input.close_by_drag_down);
        }
        assert!(positions.contains(&drag.position()));
        if let Some(offset) = dom.style(sheet, sheets_modal::OFFSET_PROPERTY) {
            let px: f64 = offset.trim_end_matches("px").parse().unwrap();
            assert!(px.is_finite());
            assert!(px >= 0.0 && px <= height.max(0.0) + f64::EPSILON);
        }
    }
});
