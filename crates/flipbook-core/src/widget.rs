#![forbid(unsafe_code)]

//! The flipbook widget instance.
//!
//! [`Flipbook`] owns the deck, the navigation cursor, and every timer. All
//! mutation goes through its methods; there is no ambient state, so a test
//! can hold as many independent widgets as it likes.
//!
//! # Time
//!
//! The widget has no clock. Hosts call [`Flipbook::advance`] with monotonic
//! time and [`Flipbook::frame_presented`] after painting; operations invoked
//! in between schedule relative to the last advanced instant.
//!
//! # Settle race
//!
//! A flip leaves the crossed page raised above the deck and schedules a
//! settle that recomputes every stack order once the animation is over.
//! Under [`SettlePolicy::CancelPrevious`] a newer flip or filter cancels the
//! pending settle, so a stale settle can never overwrite newer stacking.
//! [`SettlePolicy::FireAndForget`] keeps every settle, including stale ones.

use core::time::Duration;

use crate::config::{FlipbookConfig, SettlePolicy};
use crate::deck::Deck;
use crate::effects::{EffectSpawner, Marker, MarkerId};
use crate::event::{Direction, Event};
use crate::filter::{self, FilterSummary, SearchTerm};
use crate::loader::{LoaderFader, LoaderPhase};
use crate::navigation::{self, NavigateOutcome, Zones};
use crate::scheduler::{Scheduler, TaskId};
use crate::view::{MarkerView, PageView, ViewSnapshot};

/// Deferred work owned by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Recompute the settled stack order for the cursor at fire time.
    SettleStack,
    ActivateMarker(MarkerId),
    DeactivateMarker(MarkerId),
    RemoveMarker(MarkerId),
    FadeLoader,
    RemoveLoader,
}

/// Widget construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipbookError {
    /// The configuration failed validation.
    InvalidConfig(Vec<String>),
}

impl std::fmt::Display for FlipbookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(errors) => {
                write!(f, "invalid flipbook config: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for FlipbookError {}

/// One widget instance.
#[derive(Debug, Clone)]
pub struct Flipbook {
    config: FlipbookConfig,
    deck: Deck,
    current: usize,
    zones: Zones,
    book_open: bool,
    scheduler: Scheduler<Task>,
    pending_settle: Option<TaskId>,
    effects: EffectSpawner,
    loader: LoaderFader,
    cue_count: u64,
    initialized: bool,
}

impl Flipbook {
    /// Build a widget over pages described by their tags, in display order.
    pub fn new<I, S>(config: FlipbookConfig, tags: I) -> Result<Self, FlipbookError>
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(FlipbookError::InvalidConfig(errors));
        }
        let mut deck = Deck::from_tags(tags, config.fixed_leading_pages);
        deck.settle_stack(0);
        let zones = Zones::compute(&deck, 0, config.zone_policy);
        Ok(Self {
            config,
            deck,
            current: 0,
            zones,
            book_open: false,
            scheduler: Scheduler::new(),
            pending_settle: None,
            effects: EffectSpawner::new(),
            loader: LoaderFader::new(),
            cue_count: 0,
            initialized: false,
        })
    }

    /// Build a widget with [`FlipbookConfig::default`].
    pub fn with_defaults<I, S>(tags: I) -> Result<Self, FlipbookError>
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::new(FlipbookConfig::default(), tags)
    }

    /// Settle the initial stack, compute zones, and start the loader fade.
    ///
    /// Calling it again is a no-op.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.deck.settle_stack(self.current);
        self.refresh_indicators();
        self.loader.start(&self.config.timings, &mut self.scheduler);
        tracing::debug!(
            target: "flipbook.nav",
            pages = self.deck.len(),
            "flipbook initialized"
        );
    }

    // ---------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------

    /// Move to the nearest visible page in `direction`.
    ///
    /// At the visible boundary this changes nothing: no cue, no flip, no timer.
    pub fn navigate(&mut self, direction: Direction) -> NavigateOutcome {
        let from = self.current;
        let Some(to) = navigation::find_target(&self.deck, from, direction) else {
            tracing::trace!(
                target: "flipbook.nav",
                direction = direction.as_str(),
                current = from,
                "navigation at boundary"
            );
            return NavigateOutcome::AtBoundary;
        };

        self.cue_count += 1;
        let crossed = navigation::flip(&mut self.deck, from, to, direction);
        self.current = to;
        self.schedule_settle();
        self.refresh_indicators();

        tracing::debug!(
            target: "flipbook.nav",
            direction = direction.as_str(),
            from,
            to,
            crossed,
            "page flipped"
        );
        NavigateOutcome::Moved { from, to, crossed }
    }

    /// Filter searchable pages by `raw_term` and reset to the cover.
    ///
    /// Always immediate: the dense stack is applied without animation.
    pub fn apply_filter(&mut self, raw_term: &str) -> FilterSummary {
        let term = SearchTerm::parse(raw_term);
        let summary = filter::apply(&mut self.deck, &term);
        self.current = 0;
        if self.config.settle_policy == SettlePolicy::CancelPrevious {
            self.cancel_pending_settle();
        }
        self.deck.dense_visible_stack();
        self.book_open = false;
        self.zones = Zones::compute(&self.deck, self.current, self.config.zone_policy);

        tracing::debug!(
            target: "flipbook.filter",
            term = term.as_str(),
            visible = summary.visible,
            filtered = summary.filtered,
            "filter applied"
        );
        summary
    }

    /// Spawn a click marker at `(x, y)`.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> MarkerId {
        let timings = self.config.timings;
        self.effects.pointer_down(x, y, &timings, &mut self.scheduler)
    }

    /// Route one input event to the matching operation.
    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::PointerDown { x, y } => {
                self.pointer_down(*x, *y);
            }
            Event::ZoneTap(zone) => {
                let direction = zone.direction();
                if self.zones.allows(direction) {
                    self.navigate(direction);
                } else {
                    tracing::trace!(target: "flipbook.nav", zone = zone.as_str(), "tap on disabled zone ignored");
                }
            }
            Event::Key(code) => match code.direction() {
                Some(direction) => {
                    self.navigate(direction);
                }
                None => {
                    tracing::trace!(target: "flipbook.nav", key = ?code, "unbound key ignored");
                }
            },
            Event::SearchInput(value) => {
                self.apply_filter(value);
            }
            Event::Navigate(direction) => {
                self.navigate(*direction);
            }
        }
    }

    /// Advance time to `now` and run every task that became due.
    ///
    /// Returns the number of tasks fired.
    pub fn advance(&mut self, now: Duration) -> usize {
        self.scheduler.advance_to(now);
        let mut fired = 0;
        while let Some((id, task)) = self.scheduler.pop_due() {
            self.run_task(id, task);
            fired += 1;
        }
        fired
    }

    /// Tell the widget the host painted a frame.
    pub fn frame_presented(&mut self) {
        self.scheduler.frame_presented();
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn config(&self) -> &FlipbookConfig {
        &self.config
    }

    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current
    }

    #[must_use]
    pub const fn zones(&self) -> Zones {
        self.zones
    }

    /// Whether the book shows as open (cursor past the cover).
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.book_open
    }

    #[must_use]
    pub const fn cue_count(&self) -> u64 {
        self.cue_count
    }

    #[must_use]
    pub const fn loader_phase(&self) -> LoaderPhase {
        self.loader.phase()
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> + '_ {
        self.effects.markers()
    }

    #[must_use]
    pub const fn effects(&self) -> &EffectSpawner {
        &self.effects
    }

    /// Whether a stack settle is still queued.
    #[must_use]
    pub const fn settle_pending(&self) -> bool {
        self.pending_settle.is_some()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.scheduler.now()
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Snapshot of everything a host needs to paint.
    #[must_use]
    pub fn view(&self) -> ViewSnapshot {
        ViewSnapshot {
            pages: self
                .deck
                .pages()
                .iter()
                .map(|p| PageView {
                    index: p.index(),
                    stack_order: p.stack_order(),
                    flipped: p.is_flipped(),
                    hidden: !p.is_visible(),
                })
                .collect(),
            book_open: self.book_open,
            zones: self.zones,
            markers: self
                .effects
                .markers()
                .map(|m| MarkerView {
                    id: m.id,
                    x: m.x,
                    y: m.y,
                    active: m.active,
                })
                .collect(),
            loader: self.loader.phase(),
            cue_count: self.cue_count,
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn refresh_indicators(&mut self) {
        self.book_open = self.current > 0;
        self.zones = Zones::compute(&self.deck, self.current, self.config.zone_policy);
    }

    fn cancel_pending_settle(&mut self) {
        if let Some(id) = self.pending_settle.take() {
            self.scheduler.cancel(id);
        }
    }

    fn schedule_settle(&mut self) {
        match self.config.settle_policy {
            SettlePolicy::CancelPrevious => self.cancel_pending_settle(),
            SettlePolicy::FireAndForget => {}
        }
        let id = self
            .scheduler
            .schedule_after(self.config.timings.flip_settle(), Task::SettleStack);
        self.pending_settle = Some(id);
    }

    fn run_task(&mut self, id: TaskId, task: Task) {
        let timings = self.config.timings;
        match task {
            Task::SettleStack => {
                self.deck.settle_stack(self.current);
                if self.pending_settle == Some(id) {
                    self.pending_settle = None;
                }
                tracing::trace!(target: "flipbook.nav", current = self.current, "stack settled");
            }
            Task::ActivateMarker(marker) => {
                self.effects.activate(marker);
            }
            Task::DeactivateMarker(marker) => {
                self.effects.deactivate(marker);
            }
            Task::RemoveMarker(marker) => self.effects.remove(marker, &mut self.scheduler),
            Task::FadeLoader => self.loader.fade(&timings, &mut self.scheduler),
            Task::RemoveLoader => self.loader.remove(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyCode, Zone};
    use crate::navigation::ZonePolicy;
    use pretty_assertions::assert_eq;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn breeds(config: FlipbookConfig) -> Flipbook {
        let mut book = Flipbook::new(
            config,
            [
                None,
                None,
                Some("Labrador"),
                Some("Poodle"),
                Some("Beagle"),
            ],
        )
        .unwrap();
        book.init();
        book
    }

    fn orders(book: &Flipbook) -> Vec<u32> {
        book.deck().pages().iter().map(|p| p.stack_order()).collect()
    }

    fn flipped(book: &Flipbook) -> Vec<bool> {
        book.deck().pages().iter().map(|p| p.is_flipped()).collect()
    }

    #[test]
    fn initial_state() {
        let book = breeds(FlipbookConfig::default());
        assert_eq!(book.current_page(), 0);
        assert_eq!(orders(&book), vec![5, 4, 3, 2, 1]);
        assert_eq!(book.deck().topmost(), Some(0));
        assert!(!book.is_open());
        assert_eq!(
            book.zones(),
            Zones {
                prev: false,
                next: true
            }
        );
        assert_eq!(book.loader_phase(), LoaderPhase::Shown);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FlipbookConfig {
            fixed_leading_pages: 0,
            ..FlipbookConfig::default()
        };
        let err = Flipbook::new(config, [Some("x")]).unwrap_err();
        assert!(matches!(err, FlipbookError::InvalidConfig(_)));
        assert!(err.to_string().contains("fixed_leading_pages"));
    }

    #[test]
    fn prev_at_cover_is_a_no_op() {
        let mut book = breeds(FlipbookConfig::default());
        let before = book.view();
        let pending = book.pending_tasks();
        assert_eq!(book.navigate(Direction::Prev), NavigateOutcome::AtBoundary);
        assert_eq!(book.view(), before);
        assert_eq!(book.cue_count(), 0);
        assert_eq!(book.pending_tasks(), pending);
    }

    #[test]
    fn next_flips_raises_and_defers_settle() {
        let mut book = breeds(FlipbookConfig::default());
        let outcome = book.navigate(Direction::Next);
        assert_eq!(
            outcome,
            NavigateOutcome::Moved {
                from: 0,
                to: 1,
                crossed: 0
            }
        );
        assert_eq!(book.current_page(), 1);
        assert!(book.is_open());
        assert_eq!(book.cue_count(), 1);
        assert_eq!(flipped(&book), vec![true, false, false, false, false]);
        // Raised, not yet settled.
        assert_eq!(orders(&book), vec![6, 4, 3, 2, 1]);
        assert!(book.settle_pending());

        book.advance(ms(649));
        assert_eq!(orders(&book), vec![6, 4, 3, 2, 1]);
        book.advance(ms(650));
        assert_eq!(orders(&book), vec![1, 4, 3, 2, 1]);
        assert!(!book.settle_pending());
    }

    #[test]
    fn prev_unflips_the_arriving_page() {
        let mut book = breeds(FlipbookConfig::default());
        book.navigate(Direction::Next);
        book.navigate(Direction::Next);
        book.advance(ms(1000));
        assert_eq!(flipped(&book), vec![true, true, false, false, false]);

        let outcome = book.navigate(Direction::Prev);
        assert_eq!(
            outcome,
            NavigateOutcome::Moved {
                from: 2,
                to: 1,
                crossed: 1
            }
        );
        assert_eq!(flipped(&book), vec![true, false, false, false, false]);
        assert_eq!(book.deck().get(1).map(|p| p.stack_order()), Some(6));
    }

    #[test]
    fn filter_then_navigate_skips_hidden_pages() {
        let mut book = breeds(FlipbookConfig::default());
        book.apply_filter("oodle");
        assert_eq!(book.current_page(), 0);
        assert_eq!(orders(&book), vec![3, 2, 0, 1, 0]);

        book.navigate(Direction::Next);
        assert_eq!(book.current_page(), 1);
        book.navigate(Direction::Next);
        assert_eq!(book.current_page(), 3);
        assert_eq!(book.navigate(Direction::Next), NavigateOutcome::AtBoundary);
        // Raw-index rule: page 3 is not the last page, so the zone stays on.
        assert!(book.zones().next);
    }

    #[test]
    fn last_visible_policy_disables_forward_zone_on_last_visible_page() {
        let mut book = breeds(FlipbookConfig {
            zone_policy: ZonePolicy::LastVisible,
            ..FlipbookConfig::default()
        });
        book.apply_filter("oodle");
        book.navigate(Direction::Next);
        book.navigate(Direction::Next);
        assert_eq!(book.current_page(), 3);
        assert!(!book.zones().next);
        assert!(book.zones().prev);
    }

    #[test]
    fn filter_resets_flips_and_cursor() {
        let mut book = breeds(FlipbookConfig::default());
        book.navigate(Direction::Next);
        book.navigate(Direction::Next);
        book.apply_filter("");
        assert_eq!(book.current_page(), 0);
        assert!(!book.is_open());
        assert_eq!(flipped(&book), vec![false; 5]);
        assert_eq!(orders(&book), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn cancel_previous_drops_stale_settle_after_filter() {
        let mut book = breeds(FlipbookConfig::default());
        book.navigate(Direction::Next);
        book.apply_filter("oodle");
        assert!(!book.settle_pending());
        book.advance(ms(1000));
        assert_eq!(orders(&book), vec![3, 2, 0, 1, 0]);
    }

    #[test]
    fn fire_and_forget_lets_stale_settle_stomp_filter_order() {
        let mut book = breeds(FlipbookConfig {
            settle_policy: SettlePolicy::FireAndForget,
            ..FlipbookConfig::default()
        });
        book.navigate(Direction::Next);
        book.apply_filter("oodle");
        book.advance(ms(650));
        // The late settle overwrites the dense filter order with N - i.
        assert_eq!(orders(&book), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn cancel_previous_keeps_one_settle_for_rapid_flips() {
        let mut book = breeds(FlipbookConfig::default());
        book.navigate(Direction::Next);
        book.advance(ms(300));
        book.navigate(Direction::Next);
        assert_eq!(book.advance(ms(650)), 0);
        assert_eq!(orders(&book), vec![6, 6, 3, 2, 1]);
        assert_eq!(book.advance(ms(950)), 1);
        assert_eq!(orders(&book), vec![1, 2, 3, 2, 1]);
    }

    #[test]
    fn fire_and_forget_runs_every_settle() {
        let mut book = breeds(FlipbookConfig {
            settle_policy: SettlePolicy::FireAndForget,
            ..FlipbookConfig::default()
        });
        book.navigate(Direction::Next);
        book.advance(ms(300));
        book.navigate(Direction::Next);
        // The first settle fires mid-animation of the second flip.
        book.advance(ms(650));
        assert_eq!(orders(&book), vec![1, 2, 3, 2, 1]);
        book.advance(ms(950));
        assert!(!book.settle_pending());
    }

    #[test]
    fn events_route_to_operations() {
        let mut book = breeds(FlipbookConfig::default());
        book.handle_event(&Event::ZoneTap(Zone::Prev));
        assert_eq!(book.cue_count(), 0);
        book.handle_event(&Event::ZoneTap(Zone::Next));
        book.handle_event(&Event::Key(KeyCode::Right));
        book.handle_event(&Event::Key(KeyCode::Char('x')));
        assert_eq!(book.current_page(), 2);
        book.handle_event(&Event::Navigate(Direction::Prev));
        assert_eq!(book.current_page(), 1);
        book.handle_event(&Event::SearchInput("BEAGLE ".into()));
        assert_eq!(book.current_page(), 0);
        assert_eq!(book.deck().visible_count(), 3);
        book.handle_event(&Event::PointerDown { x: 3.0, y: 4.0 });
        assert_eq!(book.effects().live(), 1);
    }

    #[test]
    fn click_marker_is_gone_within_the_effect_window() {
        let mut book = breeds(FlipbookConfig::default());
        let id = book.pointer_down(100.0, 200.0);
        let view = book.view();
        assert_eq!(view.markers.len(), 1);
        assert_eq!((view.markers[0].x, view.markers[0].y), (100.0, 200.0));
        assert_eq!(view.markers[0].id, id);

        book.frame_presented();
        book.advance(ms(16));
        assert!(book.view().markers[0].active);
        book.advance(ms(66));
        assert!(!book.view().markers[0].active);
        book.advance(ms(600));
        assert!(book.view().markers.is_empty());
    }

    #[test]
    fn click_marker_is_cleaned_up_without_frames() {
        let mut book = breeds(FlipbookConfig::default());
        book.pointer_down(100.0, 200.0);
        book.advance(ms(600));
        assert_eq!(book.effects().live(), 0);
        book.advance(ms(5000));
        assert_eq!(book.effects().live(), 0);
        assert_eq!(book.pending_tasks(), 0);
    }

    #[test]
    fn click_marker_removal_ignores_a_late_frame() {
        let mut book = breeds(FlipbookConfig::default());
        book.pointer_down(100.0, 200.0);
        book.advance(ms(400));
        book.frame_presented();
        book.advance(ms(600));
        assert_eq!(book.effects().live(), 0);
    }

    #[test]
    fn loader_runs_off_the_same_clock() {
        let mut book = breeds(FlipbookConfig::default());
        book.init();
        book.advance(ms(1000));
        assert_eq!(book.loader_phase(), LoaderPhase::Fading);
        book.advance(ms(2000));
        assert_eq!(book.loader_phase(), LoaderPhase::Removed);
        assert_eq!(book.pending_tasks(), 0);
    }

    #[test]
    fn empty_book_never_moves() {
        let mut book = Flipbook::with_defaults(std::iter::empty::<Option<String>>()).unwrap();
        book.init();
        assert_eq!(book.navigate(Direction::Next), NavigateOutcome::AtBoundary);
        assert_eq!(book.apply_filter("x").visible, 0);
        assert_eq!(book.zones(), Zones::default());
    }
}
