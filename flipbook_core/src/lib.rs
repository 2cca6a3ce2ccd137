//! Scene model for an annotatable 3D flip book: page spreads with flip
//! timelines, paced navigation, and per-page ink surfaces fed by a pointer
//! router. Rendering lives in `flipbook_viewer`; everything here is
//! renderer-independent and driven by an injectable clock.

pub mod annotation;
pub mod book;
pub mod clock;
pub mod config;
pub mod error;
pub mod flip;
pub mod material;
pub mod navigation;
pub mod session;
pub mod stroke;

pub use annotation::{AnnotationSurface, StrokeSegment, SurfacePoint};
pub use book::{Book, Page, PageId, PageSide, PageSpread};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{BookConfig, StrokeStyle};
pub use error::BookError;
pub use flip::{FlipAnimator, FlipDirection, FlipTimeline, SpreadTransform};
pub use material::{BaseTexture, LayeredPageMaterial, blend_over};
pub use navigation::{NavigationController, NavigationEvent, NavigationState};
pub use session::{BookSession, TickSummary};
pub use stroke::{
    GestureState, Modifiers, PickHit, PickTarget, StrokeInputRouter, StrokeOutcome,
    SurfacePicker,
};
