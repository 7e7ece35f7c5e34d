#![no_main]

use core::time::Duration;

use arbitrary::Arbitrary;
use flipbook_core::{Direction, Flipbook, FlipbookConfig, SettlePolicy, Zone};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Next,
    Prev,
    Tap(bool),
    Filter(String),
    Click(i16, i16),
    Advance(u16),
    Frame,
}

#[derive(Arbitrary, Debug)]
struct Input {
    tags: Vec<Option<String>>,
    fire_and_forget: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let mut config = FlipbookConfig::default();
    if input.fire_and_forget {
        config.settle_policy = SettlePolicy::FireAndForget;
    }
    // Cap deck size to keep runs fast.
    let tags: Vec<Option<String>> = input.tags.into_iter().take(64).collect();
    let page_count = tags.len();
    let Ok(mut widget) = Flipbook::new(config, tags) else {
        return;
    };
    widget.init();

    let mut now = Duration::ZERO;
    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Next => {
                widget.navigate(Direction::Next);
            }
            Op::Prev => {
                widget.navigate(Direction::Prev);
            }
            Op::Tap(next) => {
                let zone = if next { Zone::Next } else { Zone::Prev };
                widget.handle_event(&flipbook_core::Event::ZoneTap(zone));
            }
            Op::Filter(term) => {
                widget.apply_filter(&term);
            }
            Op::Click(x, y) => {
                widget.pointer_down(f64::from(x), f64::from(y));
            }
            Op::Advance(ms) => {
                now += Duration::from_millis(u64::from(ms));
                widget.advance(now);
            }
            Op::Frame => widget.frame_presented(),
        }

        // Post-conditions that must always hold:
        let view = widget.view();
        assert_eq!(view.pages.len(), page_count, "page count changed");
        if page_count > 0 {
            let current = widget.current_page();
            assert!(current < page_count, "cursor out of range");
            assert!(
                widget.deck().get(current).is_some_and(|p| p.is_visible()),
                "cursor on hidden page"
            );
            assert_eq!(widget.is_open(), current > 0, "open flag disagrees with cursor");
        }
    }
});
