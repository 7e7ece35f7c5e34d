#![no_main]

use flipbook_core::{Flipbook, FlipbookConfig};
use flipbook_web::input_parser::parse_encoded_input_to_event;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    // Parsing must never panic; accepted events must be safe to handle.
    if let Ok(Some(event)) = parse_encoded_input_to_event(json) {
        let tags = [None, None, Some("poodle"), Some("beagle")];
        let Ok(mut widget) = Flipbook::new(FlipbookConfig::default(), tags) else {
            return;
        };
        widget.init();
        widget.handle_event(&event);
        let current = widget.current_page();
        assert!(
            widget.deck().get(current).is_some_and(|p| p.is_visible()),
            "cursor on hidden page after {event:?}"
        );
    }
});
