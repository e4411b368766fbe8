#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sheets_core::Direction;
use sheets_modal::{Content, Sheet, SheetStack};

#[derive(Debug, Arbitrary)]
enum Op {
    Push,
    Transit,
    RemoveTop,
    Forward,
    Backward,
    SetActive(u8),
    RemoveAt(u8),
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    stack_size: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let mut stack = SheetStack::new(usize::from(input.stack_size % 16));
    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Push | Op::Transit => {
                let previous = stack.top().map(Sheet::id);
                stack.push_sheet(Sheet::new(Content::new(())));
                while stack.evict_bottom().is_some() {}
                if matches!(op, Op::Transit)
                    && let Some(previous) = previous
                {
                    stack.remove_id(previous);
                }
            }
            Op::RemoveTop => {
                stack.remove_top();
            }
            Op::Forward => {
                let _ = stack.step(Direction::Forward);
            }
            Op::Backward => {
                let _ = stack.step(Direction::Backward);
            }
            Op::SetActive(index) => {
                let applied = stack.set_active(usize::from(index));
                assert_eq!(applied, usize::from(index) < stack.len());
            }
            Op::RemoveAt(index) => {
                let id = stack.sheets().get(usize::from(index)).map(Sheet::id);
                if let Some(id) = id {
                    assert!(stack.remove_id(id).is_some());
                }
            }
            Op::Clear => {
                let removed = stack.clear();
                assert!(stack.is_empty());
                drop(removed);
            }
        }

        assert!(stack.len() <= stack.stack_size());
        match stack.active_index() {
            Some(active) => assert!(active < stack.len()),
            None => assert!(stack.is_empty()),
        }
    }
});
