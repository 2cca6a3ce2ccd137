//! Glue for one interactive book: owns the scene model, the navigation
//! controller and the stroke router, and drives them from a single
//! cooperative tick.

use std::time::Duration;

use crate::book::{Book, PageId};
use crate::clock::Clock;
use crate::config::BookConfig;
use crate::error::BookError;
use crate::navigation::{NavigationController, NavigationEvent, NavigationState};
use crate::stroke::{Modifiers, StrokeInputRouter, StrokeOutcome, SurfacePicker};

#[derive(Debug)]
pub struct BookSession<C: Clock> {
    book: Book,
    navigation: NavigationController,
    router: StrokeInputRouter,
    clock: C,
    last_tick: Duration,
}

impl<C: Clock> BookSession<C> {
    pub fn new(config: BookConfig, clock: C) -> Result<Self, BookError> {
        Ok(Self::from_book(Book::new(config)?, clock))
    }

    pub fn from_book(book: Book, clock: C) -> Self {
        let navigation = NavigationController::for_book(&book);
        let last_tick = clock.now();
        Self {
            book,
            navigation,
            router: StrokeInputRouter::new(),
            clock,
            last_tick,
        }
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut Book {
        &mut self.book
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn router(&self) -> &StrokeInputRouter {
        &self.router
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn current_page_index(&self) -> usize {
        self.navigation.current_page()
    }

    pub fn navigation_state(&self) -> NavigationState {
        self.navigation.state()
    }

    pub fn step_left(&mut self) -> bool {
        self.navigation.step_left(&mut self.book)
    }

    pub fn step_right(&mut self) -> bool {
        self.navigation.step_right(&mut self.book)
    }

    pub fn seek_to(&mut self, target: usize) -> bool {
        let now = self.clock.now();
        self.navigation.seek_to(target, now)
    }

    pub fn draw_mode(&self) -> bool {
        self.router.draw_mode()
    }

    pub fn set_draw_mode(&mut self, enabled: bool) {
        self.router.set_draw_mode(enabled, &mut self.book);
    }

    pub fn toggle_draw_mode(&mut self) -> bool {
        self.router.toggle_draw_mode(&mut self.book)
    }

    pub fn pointer_down(&mut self) -> bool {
        self.router.pointer_down(&mut self.book)
    }

    pub fn pointer_move<P>(&mut self, ndc: [f32; 2], modifiers: Modifiers, picker: &P) -> StrokeOutcome
    where
        P: SurfacePicker + ?Sized,
    {
        self.router
            .pointer_move(ndc, modifiers, picker, &mut self.book)
    }

    pub fn pointer_up(&mut self) -> Option<PageId> {
        self.router.pointer_up(&mut self.book)
    }

    pub fn drain_events(&mut self) -> Vec<NavigationEvent> {
        self.navigation.drain_events()
    }

    /// Advances flip animations by the wall time since the previous tick and
    /// fires a due scrub step. A step fired here starts its flip at rest; it
    /// begins moving on the next tick.
    pub fn tick(&mut self) -> TickSummary {
        let now = self.clock.now();
        let dt = now.saturating_sub(self.last_tick).as_secs_f32();
        self.last_tick = now;

        self.book.tick(dt);
        let scrub_stepped = self.navigation.poll(&mut self.book, now);
        TickSummary {
            dt,
            animating: self.book.animating_count(),
            scrub_stepped,
        }
    }

    pub fn into_book(self) -> Book {
        self.book
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummary {
    /// Seconds applied to running flips.
    pub dt: f32,
    /// Spreads still in flight after the tick.
    pub animating: usize,
    pub scrub_stepped: bool,
}
