//! Page navigation. Single steps flip one spread immediately; a scrub to a
//! distant position is paced as a chain of single steps, one per scrub
//! interval, so every intermediate turn is rendered.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use crate::book::Book;
use crate::flip::FlipDirection;

/// Notifications for position indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// A single step landed outside of a scrub.
    PageChanged { page: usize },
    SeekStarted { from: usize, target: usize },
    SeekFinished { page: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NavigationState {
    /// Number of sheets turned onto the left-hand stack, `0..=spread_count`.
    pub current_page: usize,
    pub seeking: bool,
}

/// Pending scrub: where it is headed and when the next step is due. The
/// direction of each step is re-derived from the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeekPlan {
    target: usize,
    next_due: Duration,
}

#[derive(Debug, Clone)]
pub struct NavigationController {
    state: NavigationState,
    spread_count: usize,
    scrub_interval: Duration,
    seek: Option<SeekPlan>,
    events: VecDeque<NavigationEvent>,
    scrub_path: Vec<usize>,
    flips_requested: u64,
}

impl NavigationController {
    pub fn new(spread_count: usize, scrub_interval: Duration) -> Self {
        Self {
            state: NavigationState::default(),
            spread_count,
            scrub_interval,
            seek: None,
            events: VecDeque::new(),
            scrub_path: Vec::new(),
            flips_requested: 0,
        }
    }

    pub fn for_book(book: &Book) -> Self {
        Self::new(book.spread_count(), book.config().scrub_interval)
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn is_seeking(&self) -> bool {
        self.state.seeking
    }

    pub fn seek_target(&self) -> Option<usize> {
        self.seek.map(|plan| plan.target)
    }

    /// When the next scrub step fires, if a scrub is running.
    pub fn next_due(&self) -> Option<Duration> {
        self.seek.map(|plan| plan.next_due)
    }

    pub fn spread_count(&self) -> usize {
        self.spread_count
    }

    /// Positions visited by the running (or most recent) scrub, starting
    /// position included.
    pub fn scrub_path(&self) -> &[usize] {
        &self.scrub_path
    }

    pub fn flips_requested(&self) -> u64 {
        self.flips_requested
    }

    /// Turns the previous sheet back. No-op at the front cover.
    pub fn step_left(&mut self, book: &mut Book) -> bool {
        if self.state.current_page == 0 {
            return false;
        }
        let spread = self.state.current_page - 1;
        book.flip(spread, FlipDirection::Leftward);
        self.flips_requested += 1;
        self.state.current_page -= 1;
        self.after_step();
        true
    }

    /// Turns the next sheet over. No-op once every sheet is turned.
    pub fn step_right(&mut self, book: &mut Book) -> bool {
        if self.state.current_page >= self.spread_count {
            return false;
        }
        let spread = self.state.current_page;
        book.flip(spread, FlipDirection::Rightward);
        self.flips_requested += 1;
        self.state.current_page += 1;
        self.after_step();
        true
    }

    /// Requests a paced scrub to `target` (clamped to the valid range). Returns
    /// `false` when the request is dropped: another scrub is running, or the
    /// book is already there.
    pub fn seek_to(&mut self, target: usize, now: Duration) -> bool {
        if self.state.seeking {
            log::debug!(
                "dropping seek to {target}: scrub to {:?} still running",
                self.seek_target()
            );
            return false;
        }
        let target = target.min(self.spread_count);
        let from = self.state.current_page;
        if target == from {
            return false;
        }

        log::info!("scrubbing from {from} to {target}");
        self.state.seeking = true;
        self.seek = Some(SeekPlan {
            target,
            next_due: now + self.scrub_interval,
        });
        self.scrub_path.clear();
        self.scrub_path.push(from);
        self.events
            .push_back(NavigationEvent::SeekStarted { from, target });
        true
    }

    /// Fires the next scrub step if it is due. At most one step per call; the
    /// following step is scheduled one interval after this call.
    pub fn poll(&mut self, book: &mut Book, now: Duration) -> bool {
        let Some(plan) = self.seek else {
            return false;
        };
        if now < plan.next_due {
            return false;
        }
        if self.state.current_page == plan.target {
            // Keyboard steps can land on the target between scrub steps.
            self.finish_seek();
            return false;
        }

        let stepped = if plan.target < self.state.current_page {
            self.step_left(book)
        } else {
            self.step_right(book)
        };
        if stepped {
            self.scrub_path.push(self.state.current_page);
            log::debug!(
                "scrub step -> {} (target {})",
                self.state.current_page,
                plan.target
            );
        }

        if !stepped || self.state.current_page == plan.target {
            self.finish_seek();
        } else {
            self.seek = Some(SeekPlan {
                target: plan.target,
                next_due: now + self.scrub_interval,
            });
        }
        stepped
    }

    pub fn drain_events(&mut self) -> Vec<NavigationEvent> {
        self.events.drain(..).collect()
    }

    fn after_step(&mut self) {
        if !self.state.seeking {
            self.events.push_back(NavigationEvent::PageChanged {
                page: self.state.current_page,
            });
        }
    }

    fn finish_seek(&mut self) {
        let page = self.state.current_page;
        log::info!("scrub settled at {page}");
        self.seek = None;
        self.state.seeking = false;
        self.events.push_back(NavigationEvent::SeekFinished { page });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BookConfig;

    const STEP: Duration = Duration::from_millis(80);

    fn book(page_count: usize) -> Book {
        Book::new(BookConfig {
            page_count,
            surface_width: 8,
            surface_height: 8,
            ..BookConfig::default()
        })
        .expect("book builds")
    }

    /// Polls at exactly the scrub cadence until the scrub settles.
    fn run_scrub(
        nav: &mut NavigationController,
        book: &mut Book,
        mut now: Duration,
    ) -> Duration {
        while nav.is_seeking() {
            now += STEP;
            nav.poll(book, now);
        }
        now
    }

    #[test]
    fn step_left_at_front_cover_is_a_no_op() {
        let mut book = book(4);
        let mut nav = NavigationController::for_book(&book);
        assert!(!nav.step_left(&mut book));
        assert_eq!(nav.current_page(), 0);
        assert!(!book.is_animating());
        assert!(nav.drain_events().is_empty());
    }

    #[test]
    fn step_right_past_last_sheet_is_a_no_op() {
        let mut book = book(4);
        let mut nav = NavigationController::for_book(&book);
        assert!(nav.step_right(&mut book));
        assert!(nav.step_right(&mut book));
        book.tick(1.0);

        assert!(!nav.step_right(&mut book));
        assert_eq!(nav.current_page(), 2);
        assert!(!book.is_animating());
        assert_eq!(nav.flips_requested(), 2);
    }

    #[test]
    fn steps_flip_the_adjacent_spread() {
        let mut book = book(6);
        let mut nav = NavigationController::for_book(&book);
        nav.step_right(&mut book);
        let timeline = book
            .spread(0)
            .and_then(|spread| spread.animator().timeline())
            .expect("spread 0 flipping");
        assert_eq!(timeline.direction(), FlipDirection::Rightward);

        book.tick(1.0);
        nav.step_left(&mut book);
        let timeline = book
            .spread(0)
            .and_then(|spread| spread.animator().timeline())
            .expect("spread 0 flipping back");
        assert_eq!(timeline.direction(), FlipDirection::Leftward);
        assert_eq!(
            nav.drain_events(),
            vec![
                NavigationEvent::PageChanged { page: 1 },
                NavigationEvent::PageChanged { page: 0 },
            ]
        );
    }

    #[test]
    fn seek_to_current_page_does_nothing() {
        let mut book = book(8);
        let mut nav = NavigationController::for_book(&book);
        nav.step_right(&mut book);
        nav.drain_events();
        for _ in 0..3 {
            assert!(!nav.seek_to(1, Duration::ZERO));
        }
        assert!(!nav.is_seeking());
        assert_eq!(nav.current_page(), 1);
        assert_eq!(nav.flips_requested(), 1);
        assert!(nav.drain_events().is_empty());
    }

    #[test]
    fn seek_waits_one_interval_before_each_step() {
        let mut book = book(8);
        let mut nav = NavigationController::for_book(&book);
        assert!(nav.seek_to(2, Duration::ZERO));
        assert!(nav.is_seeking());
        assert_eq!(nav.next_due(), Some(STEP));

        assert!(!nav.poll(&mut book, Duration::from_millis(79)));
        assert_eq!(nav.current_page(), 0);
        assert!(nav.poll(&mut book, STEP));
        assert_eq!(nav.current_page(), 1);
        assert_eq!(nav.next_due(), Some(STEP * 2));
    }

    #[test]
    fn seek_visits_every_page_in_order() {
        let mut book = book(20);
        let mut nav = NavigationController::for_book(&book);
        nav.seek_to(7, Duration::ZERO);
        let now = run_scrub(&mut nav, &mut book, Duration::ZERO);
        assert_eq!(nav.scrub_path(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(nav.current_page(), 7);

        nav.seek_to(3, now);
        run_scrub(&mut nav, &mut book, now);
        assert_eq!(nav.scrub_path(), &[7, 6, 5, 4, 3]);
        assert_eq!(nav.flips_requested(), 11);
    }

    #[test]
    fn seek_target_is_clamped_to_the_last_sheet() {
        let mut book = book(4);
        let mut nav = NavigationController::for_book(&book);
        assert!(nav.seek_to(99, Duration::ZERO));
        assert_eq!(nav.seek_target(), Some(2));
        run_scrub(&mut nav, &mut book, Duration::ZERO);
        assert_eq!(nav.current_page(), 2);
    }

    #[test]
    fn overlapping_seek_requests_are_dropped() {
        let mut book = book(20);
        let mut nav = NavigationController::for_book(&book);
        assert!(nav.seek_to(5, Duration::ZERO));
        nav.poll(&mut book, STEP);
        assert!(!nav.seek_to(1, STEP));
        assert_eq!(nav.seek_target(), Some(5));
        run_scrub(&mut nav, &mut book, STEP);
        assert_eq!(nav.current_page(), 5);
    }

    #[test]
    fn indicator_updates_are_suppressed_mid_scrub() {
        let mut book = book(8);
        let mut nav = NavigationController::for_book(&book);
        nav.seek_to(3, Duration::ZERO);
        run_scrub(&mut nav, &mut book, Duration::ZERO);
        assert_eq!(
            nav.drain_events(),
            vec![
                NavigationEvent::SeekStarted { from: 0, target: 3 },
                NavigationEvent::SeekFinished { page: 3 },
            ]
        );
    }

    #[test]
    fn keyboard_steps_during_a_scrub_do_not_overshoot() {
        let mut book = book(20);
        let mut nav = NavigationController::for_book(&book);
        nav.seek_to(4, Duration::ZERO);
        nav.poll(&mut book, STEP);
        nav.step_right(&mut book);
        nav.step_right(&mut book);
        nav.step_right(&mut book);
        nav.step_right(&mut book);
        assert_eq!(nav.current_page(), 5);

        run_scrub(&mut nav, &mut book, STEP);
        assert_eq!(nav.current_page(), 4);
        assert!(!nav.is_seeking());
    }

    #[test]
    fn events_serialize_with_a_kind_tag() {
        let mut book = book(8);
        let mut nav = NavigationController::for_book(&book);
        nav.seek_to(1, Duration::ZERO);
        run_scrub(&mut nav, &mut book, Duration::ZERO);

        let json = serde_json::to_value(nav.drain_events()).expect("events serialize");
        assert_eq!(
            json,
            serde_json::json!([
                { "kind": "seek_started", "from": 0, "target": 1 },
                { "kind": "seek_finished", "page": 1 },
            ])
        );
        let state = serde_json::to_value(nav.state()).expect("state serializes");
        assert_eq!(
            state,
            serde_json::json!({ "current_page": 1, "seeking": false })
        );
    }

    #[test]
    fn scrub_settles_when_keyboard_reaches_the_target() {
        let mut book = book(20);
        let mut nav = NavigationController::for_book(&book);
        nav.seek_to(3, Duration::ZERO);
        nav.poll(&mut book, STEP);
        nav.step_right(&mut book);
        nav.step_right(&mut book);

        assert!(!nav.poll(&mut book, STEP * 2));
        assert!(!nav.is_seeking());
        assert_eq!(nav.current_page(), 3);
        assert_eq!(nav.flips_requested(), 3);
    }
}
