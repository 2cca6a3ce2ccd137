//! Routes pointer gestures onto annotation surfaces.
//!
//! The router is a small state machine: `Idle` until a pointer press in draw
//! mode, then `Drawing` with at most one active surface until release. Each
//! move is resolved through a [`SurfacePicker`]; when the hit surface changes
//! mid-gesture the old stroke is ended before the new one starts, so no line
//! ever connects two pages.

use crate::annotation::{StrokeSegment, SurfacePoint};
use crate::book::{Book, PageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(self) -> bool {
        self.ctrl || self.shift || self.meta
    }
}

/// What a pick landed on, tagged once when the scene is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    Page(PageId),
    /// Rendered but not drawable (e.g. the filler behind an odd last page).
    Inert,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub target: PickTarget,
    /// World-space intersection point.
    pub point: [f32; 3],
    pub uv: SurfacePoint,
    pub distance: f32,
}

/// Resolves a pointer position in normalised device coordinates to the
/// nearest surface under it.
pub trait SurfacePicker {
    fn pick(&self, ndc: [f32; 2]) -> Option<PickHit>;
}

impl<F> SurfacePicker for F
where
    F: Fn([f32; 2]) -> Option<PickHit>,
{
    fn pick(&self, ndc: [f32; 2]) -> Option<PickHit> {
        self(ndc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Drawing {
        surface: Option<PageId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeOutcome {
    /// Not drawing, or the move was reserved for the camera.
    Ignored,
    Painted {
        page: PageId,
        segment: Option<StrokeSegment>,
    },
    /// The pick left the active surface without landing on another one.
    Ended { page: PageId },
    /// Nothing drawable under the pointer and no stroke to end.
    Missed,
}

#[derive(Debug, Clone, Default)]
pub struct StrokeInputRouter {
    draw_mode: bool,
    state: GestureState,
}

impl StrokeInputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_mode(&self) -> bool {
        self.draw_mode
    }

    /// Switching draw mode off mid-gesture ends the active stroke.
    pub fn set_draw_mode(&mut self, enabled: bool, book: &mut Book) {
        if self.draw_mode == enabled {
            return;
        }
        log::info!("draw mode {}", if enabled { "on" } else { "off" });
        self.draw_mode = enabled;
        if !enabled {
            self.pointer_up(book);
        }
    }

    pub fn toggle_draw_mode(&mut self, book: &mut Book) -> bool {
        self.set_draw_mode(!self.draw_mode, book);
        self.draw_mode
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn active_surface(&self) -> Option<PageId> {
        match self.state {
            GestureState::Drawing { surface } => surface,
            GestureState::Idle => None,
        }
    }

    /// Starts a gesture. Returns whether the router captured the pointer
    /// (only in draw mode); uncaptured presses belong to the camera. A press
    /// that arrives without a release first closes the previous gesture.
    pub fn pointer_down(&mut self, book: &mut Book) -> bool {
        if let Some(page) = self.pointer_up(book) {
            log::debug!("press without release; closed stroke on {page}");
        }
        if !self.draw_mode {
            return false;
        }
        self.state = GestureState::Drawing { surface: None };
        true
    }

    pub fn pointer_move<P>(
        &mut self,
        ndc: [f32; 2],
        modifiers: Modifiers,
        picker: &P,
        book: &mut Book,
    ) -> StrokeOutcome
    where
        P: SurfacePicker + ?Sized,
    {
        let GestureState::Drawing { surface: active } = self.state else {
            return StrokeOutcome::Ignored;
        };
        if modifiers.any() {
            return StrokeOutcome::Ignored;
        }

        let hit = picker.pick(ndc).and_then(|hit| match hit.target {
            PickTarget::Page(page) if book.page(page).is_some() => Some((page, hit.uv)),
            _ => None,
        });

        match hit {
            Some((page, uv)) => {
                if let Some(previous) = active.filter(|previous| *previous != page) {
                    end_stroke(book, previous);
                }
                self.state = GestureState::Drawing {
                    surface: Some(page),
                };
                let segment = book
                    .surface_mut(page)
                    .and_then(|surface| surface.stroke_to(uv));
                StrokeOutcome::Painted { page, segment }
            }
            None => match active {
                Some(previous) => {
                    end_stroke(book, previous);
                    self.state = GestureState::Drawing { surface: None };
                    StrokeOutcome::Ended { page: previous }
                }
                None => StrokeOutcome::Missed,
            },
        }
    }

    /// Ends the gesture; returns the surface whose stroke was closed.
    pub fn pointer_up(&mut self, book: &mut Book) -> Option<PageId> {
        let active = self.active_surface();
        if let Some(page) = active {
            end_stroke(book, page);
        }
        self.state = GestureState::Idle;
        active
    }
}

fn end_stroke(book: &mut Book, page: PageId) {
    if let Some(surface) = book.surface_mut(page) {
        surface.stroke_end();
    }
}
