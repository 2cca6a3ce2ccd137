//! Per-page ink layer. Each surface owns a fixed-size RGBA raster that strokes
//! are rasterised into; the renderer re-uploads the raster whenever the surface
//! reports itself dirty.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::config::StrokeStyle;
use crate::error::BookError;

/// A point in normalised surface space, `[0, 1] x [0, 1]`, with `y = 1` at the
/// top edge (texture UV convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub x: f32,
    pub y: f32,
}

impl SurfacePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for SurfacePoint {
    fn from(value: [f32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

/// One rasterised line, in surface space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSegment {
    pub from: SurfacePoint,
    pub to: SurfacePoint,
}

pub struct AnnotationSurface {
    pixmap: Pixmap,
    style: StrokeStyle,
    last_point: Option<SurfacePoint>,
    dirty: bool,
    segments_drawn: usize,
}

impl std::fmt::Debug for AnnotationSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("last_point", &self.last_point)
            .field("dirty", &self.dirty)
            .field("segments_drawn", &self.segments_drawn)
            .finish()
    }
}

impl AnnotationSurface {
    /// Allocates a fully transparent raster.
    pub fn new(width: u32, height: u32, style: StrokeStyle) -> Result<Self, BookError> {
        if width == 0 || height == 0 {
            return Err(BookError::EmptySurface { width, height });
        }
        let pixmap =
            Pixmap::new(width, height).ok_or(BookError::RasterAllocation { width, height })?;
        Ok(Self {
            pixmap,
            style,
            last_point: None,
            dirty: false,
            segments_drawn: 0,
        })
    }

    /// Extends the current gesture to `point`. The first sample of a gesture
    /// only records the origin; every later sample draws a segment from the
    /// previous one and marks the surface dirty.
    pub fn stroke_to(&mut self, point: SurfacePoint) -> Option<StrokeSegment> {
        let segment = self.last_point.map(|from| StrokeSegment { from, to: point });
        if let Some(segment) = segment {
            self.rasterize(segment);
            self.segments_drawn += 1;
            self.dirty = true;
            log::trace!(
                "stroke segment ({:.3}, {:.3}) -> ({:.3}, {:.3})",
                segment.from.x,
                segment.from.y,
                segment.to.x,
                segment.to.y
            );
        }
        self.last_point = Some(point);
        segment
    }

    /// Forgets the gesture origin. Ink already on the raster stays.
    pub fn stroke_end(&mut self) {
        self.last_point = None;
    }

    pub fn last_point(&self) -> Option<SurfacePoint> {
        self.last_point
    }

    pub fn is_stroking(&self) -> bool {
        self.last_point.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called by the renderer once the raster has been copied to the GPU.
    pub fn mark_synced(&mut self) {
        self.dirty = false;
    }

    pub fn segments_drawn(&self) -> usize {
        self.segments_drawn
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA rows, top row first.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Premultiplied RGBA of one raster pixel, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap
            .pixel(x, y)
            .map(|color| [color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// Maps a surface point to raster coordinates. Raster row 0 is the top of
    /// the page, which is `y = 1` in surface space.
    pub fn to_raster(&self, point: SurfacePoint) -> (f32, f32) {
        let width = self.pixmap.width() as f32;
        let height = self.pixmap.height() as f32;
        (point.x * width, (1.0 - point.y) * height)
    }

    fn rasterize(&mut self, segment: StrokeSegment) {
        let (x0, y0) = self.to_raster(segment.from);
        let (x1, y1) = self.to_raster(segment.to);

        let mut pb = PathBuilder::new();
        pb.move_to(x0, y0);
        pb.line_to(x1, y1);
        let Some(path) = pb.finish() else {
            return;
        };

        let [r, g, b, a] = self.style.color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = false;

        let stroke = Stroke {
            width: self.style.width,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            ..Stroke::default()
        };

        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SURFACE_HEIGHT, SURFACE_WIDTH};

    fn surface() -> AnnotationSurface {
        AnnotationSurface::new(SURFACE_WIDTH, SURFACE_HEIGHT, StrokeStyle::default())
            .expect("surface allocates")
    }

    // Raster row 400 has its centre at y = 400.5, i.e. 1 - 400.5 / 800.
    const ROW_400: f32 = 1.0 - 400.5 / 800.0;
    // Raster row 80, near the top edge.
    const ROW_80: f32 = 1.0 - 80.5 / 800.0;

    fn painted(surface: &AnnotationSurface, x: u32, y: u32) -> bool {
        surface.pixel(x, y).map(|px| px[3] > 0).unwrap_or(false)
    }

    #[test]
    fn first_sample_only_records_origin() {
        let mut surface = surface();
        assert!(surface.stroke_to(SurfacePoint::new(0.25, ROW_400)).is_none());
        assert!(!surface.is_dirty());
        assert_eq!(surface.segments_drawn(), 0);
        assert!(surface.pixels().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn consecutive_samples_draw_one_segment() {
        let mut surface = surface();
        let p1 = SurfacePoint::new(0.25, ROW_400);
        let p2 = SurfacePoint::new(0.75, ROW_400);
        surface.stroke_to(p1);
        let segment = surface.stroke_to(p2).expect("second sample draws");

        assert_eq!(segment, StrokeSegment { from: p1, to: p2 });
        assert_eq!(surface.segments_drawn(), 1);
        assert!(surface.is_dirty());
        assert!(painted(&surface, 300, 400));
        assert!(!painted(&surface, 300, 200));
        assert!(!painted(&surface, 100, 400));
    }

    #[test]
    fn stroke_end_starts_a_fresh_origin() {
        let mut surface = surface();
        surface.stroke_to(SurfacePoint::new(0.1, ROW_400));
        surface.stroke_to(SurfacePoint::new(0.2, ROW_400));
        surface.stroke_end();
        assert!(!surface.is_stroking());

        let p3 = SurfacePoint::new(0.9, ROW_400);
        assert!(surface.stroke_to(p3).is_none());
        assert_eq!(surface.segments_drawn(), 1);
        // Nothing bridges the gap between the two gestures.
        assert!(!painted(&surface, 400, 400));
        assert_eq!(surface.last_point(), Some(p3));
    }

    #[test]
    fn strokes_persist_across_gestures() {
        let mut surface = surface();
        surface.stroke_to(SurfacePoint::new(0.25, ROW_400));
        surface.stroke_to(SurfacePoint::new(0.75, ROW_400));
        surface.stroke_end();
        surface.mark_synced();
        assert!(!surface.is_dirty());
        assert!(painted(&surface, 300, 400));
    }

    #[test]
    fn vertical_axis_is_flipped_into_raster_rows() {
        let mut surface = surface();
        surface.stroke_to(SurfacePoint::new(0.25, ROW_80));
        surface.stroke_to(SurfacePoint::new(0.75, ROW_80));
        assert!(painted(&surface, 300, 80));
        assert!(!painted(&surface, 300, 800 - 81));

        let (x, y) = surface.to_raster(SurfacePoint::new(0.0, 1.0));
        assert_eq!((x, y), (0.0, 0.0));
    }

    #[test]
    fn ink_uses_configured_colour() {
        let mut surface = surface();
        surface.stroke_to(SurfacePoint::new(0.25, ROW_400));
        surface.stroke_to(SurfacePoint::new(0.75, ROW_400));
        assert_eq!(surface.pixel(300, 400), Some([0xaa, 0xaa, 0xaa, 0xff]));
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        let result = AnnotationSurface::new(0, 10, StrokeStyle::default());
        assert!(matches!(result, Err(BookError::EmptySurface { .. })));
    }
}
