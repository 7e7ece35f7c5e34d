#![forbid(unsafe_code)]

//! End-to-end widget scenarios driven through the public API only.

use std::time::Duration;

use flipbook_core::loader::LoaderPhase;
use flipbook_core::{Direction, Event, Flipbook, FlipbookConfig, KeyCode, SettlePolicy, Zone};
use pretty_assertions::assert_eq;

fn breeds() -> Flipbook {
    breeds_with(FlipbookConfig::default())
}

fn breeds_with(config: FlipbookConfig) -> Flipbook {
    let mut book = Flipbook::new(
        config,
        [None, None, Some("Labrador"), Some("Poodle"), Some("Beagle")],
    )
    .expect("default config is valid");
    book.init();
    book
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn search_then_page_through_matches() {
    let mut book = breeds();
    let summary = book.apply_filter("oodle");
    assert_eq!((summary.visible, summary.filtered), (3, 2));
    assert_eq!(book.current_page(), 0);

    let hidden: Vec<bool> = book.view().pages.iter().map(|p| p.hidden).collect();
    assert_eq!(hidden, vec![false, false, true, false, true]);

    book.handle_event(&Event::Navigate(Direction::Next));
    assert_eq!(book.current_page(), 1);
    book.handle_event(&Event::Navigate(Direction::Next));
    assert_eq!(book.current_page(), 3);
    assert_eq!(book.cue_count(), 2);
}

#[test]
fn prev_on_cover_changes_nothing() {
    let mut book = breeds();
    let before = book.view();
    book.handle_event(&Event::Key(KeyCode::Left));
    book.handle_event(&Event::ZoneTap(Zone::Prev));
    book.handle_event(&Event::Navigate(Direction::Prev));
    assert_eq!(book.view(), before);
    assert_eq!(book.view().checksum(), before.checksum());
}

#[test]
fn click_marker_lives_under_six_hundred_ms() {
    let mut book = breeds();
    book.advance(ms(10));
    book.handle_event(&Event::PointerDown { x: 100.0, y: 200.0 });

    let view = book.view();
    assert_eq!(view.markers.len(), 1);
    assert_eq!((view.markers[0].x, view.markers[0].y), (100.0, 200.0));

    // One painted frame per 16 ms, like requestAnimationFrame.
    let mut t = 10;
    while t < 610 {
        book.frame_presented();
        t += 16;
        book.advance(ms(t));
    }
    assert!(book.view().markers.is_empty());
    assert_eq!(book.effects().spawned_total(), 1);
}

#[test]
fn full_walk_forward_and_back() {
    let mut book = breeds();
    for expected in 1..5 {
        book.navigate(Direction::Next);
        assert_eq!(book.current_page(), expected);
    }
    assert!(!book.zones().next);
    book.advance(ms(700));
    let flipped: Vec<bool> = book.view().pages.iter().map(|p| p.flipped).collect();
    assert_eq!(flipped, vec![true, true, true, true, false]);

    for expected in (0..4).rev() {
        book.navigate(Direction::Prev);
        assert_eq!(book.current_page(), expected);
    }
    book.advance(ms(1400));
    let view = book.view();
    assert!(view.pages.iter().all(|p| !p.flipped));
    assert!(!view.book_open);
    let orders: Vec<u32> = view.pages.iter().map(|p| p.stack_order).collect();
    assert_eq!(orders, vec![5, 4, 3, 2, 1]);
}

#[test]
fn stale_settle_is_dropped_under_default_policy() {
    let mut book = breeds();
    book.navigate(Direction::Next);
    book.apply_filter("beagle");
    book.advance(ms(650));
    let orders: Vec<u32> = book.view().pages.iter().map(|p| p.stack_order).collect();
    assert_eq!(orders, vec![3, 2, 0, 0, 1]);
}

#[test]
fn stale_settle_overwrites_filter_order_when_fire_and_forget() {
    let mut book = breeds_with(FlipbookConfig {
        settle_policy: SettlePolicy::FireAndForget,
        ..FlipbookConfig::default()
    });
    book.navigate(Direction::Next);
    book.apply_filter("beagle");
    book.advance(ms(650));
    let orders: Vec<u32> = book.view().pages.iter().map(|p| p.stack_order).collect();
    assert_eq!(orders, vec![5, 4, 3, 2, 1]);
}

#[test]
fn loader_lifecycle_is_independent_of_navigation() {
    let mut book = breeds();
    book.navigate(Direction::Next);
    book.advance(ms(999));
    assert_eq!(book.loader_phase(), LoaderPhase::Shown);
    book.advance(ms(1000));
    assert_eq!(book.loader_phase(), LoaderPhase::Fading);
    book.apply_filter("pug");
    book.advance(ms(2000));
    assert_eq!(book.loader_phase(), LoaderPhase::Removed);
}

#[test]
fn widgets_do_not_share_state() {
    let mut a = breeds();
    let b = breeds();
    a.navigate(Direction::Next);
    a.pointer_down(1.0, 1.0);
    assert_eq!(b.current_page(), 0);
    assert_eq!(b.effects().live(), 0);
}
