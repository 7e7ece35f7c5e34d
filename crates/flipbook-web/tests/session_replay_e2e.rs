#![forbid(unsafe_code)]

//! Record a realistic browsing session and replay it through a fresh widget.

use core::time::Duration;

use flipbook_core::event::{Direction, Event, KeyCode, Zone};
use flipbook_core::Flipbook;
use flipbook_web::patch::DomPatch;
use flipbook_web::session_record::{SessionRecorder, replay};
use flipbook_web::step_program::StepProgram;
use pretty_assertions::assert_eq;

fn breeds() -> Flipbook {
    Flipbook::with_defaults([
        None,
        None,
        Some("Labrador"),
        Some("Poodle"),
        Some("Beagle"),
        Some("Pug"),
        Some("Corgi"),
    ])
    .expect("valid")
}

#[test]
fn sixty_frames_of_browsing_replay_exactly() {
    let mut rec = SessionRecorder::new(breeds(), 0);
    rec.init().unwrap();

    let frame = Duration::from_millis(16);
    for i in 0u64..60 {
        let ts = i * 16_000_000;
        match i {
            2 => rec.push_event(ts, Event::Key(KeyCode::Right)),
            5 => rec.push_event(ts, Event::ZoneTap(Zone::Next)),
            6 => rec.push_event(ts, Event::PointerDown { x: 40.0, y: 50.0 }),
            20 => rec.push_event(ts, Event::SearchInput("o".into())),
            22 => rec.push_event(ts, Event::Navigate(Direction::Next)),
            23 => rec.push_event(ts, Event::Navigate(Direction::Next)),
            40 => rec.push_event(ts, Event::Key(KeyCode::PageUp)),
            _ => {}
        }
        rec.step().unwrap();
        rec.advance_time(frame);
    }
    let trace = rec.finish();

    let result = replay(breeds(), &trace).unwrap();
    assert!(result.ok(), "mismatch: {:?}", result.first_mismatch);
    assert_eq!(result.total_frames, trace.frame_count());
}

#[test]
fn flip_then_settle_emits_expected_patches() {
    let mut program = StepProgram::new(breeds());
    program.init().unwrap();
    program.take_patches();

    program.push_event(Event::Navigate(Direction::Next));
    program.step().unwrap();
    let flip = program.take_patches();
    assert_eq!(
        flip,
        vec![
            DomPatch::StackOrder { page: 0, z: 8 },
            DomPatch::Flipped {
                page: 0,
                flipped: true
            },
            DomPatch::BookOpen { open: true },
            DomPatch::ZoneVisible {
                zone: Zone::Prev,
                visible: true
            },
            DomPatch::PlayCue,
        ]
    );

    program.advance_time(Duration::from_millis(649));
    assert!(!program.step().unwrap().rendered);
    program.advance_time(Duration::from_millis(1));
    assert!(program.step().unwrap().rendered);
    assert_eq!(program.take_patches(), vec![DomPatch::StackOrder { page: 0, z: 1 }]);
}
