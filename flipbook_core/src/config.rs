//! Fixed book constants. `BookConfig::default()` mirrors them exactly; tests
//! build smaller books through struct-update syntax.

use std::time::Duration;

use crate::error::BookError;

/// Number of pages in the book.
pub const PAGE_COUNT: usize = 64;

/// Seconds a single flip takes from start to settle.
pub const FLIP_PERIOD_SECS: f32 = 0.5;

/// Raster width of each annotation surface.
pub const SURFACE_WIDTH: u32 = 600;

/// Raster height of each annotation surface.
pub const SURFACE_HEIGHT: u32 = 800;

/// Delay between consecutive flips while scrubbing.
pub const SCRUB_INTERVAL: Duration = Duration::from_millis(80);

/// Ink width in raster pixels.
pub const STROKE_WIDTH: f32 = 1.0;

/// Ink colour (#aaaaaa, opaque).
pub const STROKE_COLOR: [u8; 4] = [0xaa, 0xaa, 0xaa, 0xff];

/// Page plane size in world units (width, height).
pub const PAGE_SIZE: [f32; 2] = [214.0, 304.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: [u8; 4],
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: STROKE_WIDTH,
            color: STROKE_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookConfig {
    pub page_count: usize,
    pub flip_period_secs: f32,
    pub surface_width: u32,
    pub surface_height: u32,
    pub scrub_interval: Duration,
    pub stroke: StrokeStyle,
    pub page_size: [f32; 2],
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            page_count: PAGE_COUNT,
            flip_period_secs: FLIP_PERIOD_SECS,
            surface_width: SURFACE_WIDTH,
            surface_height: SURFACE_HEIGHT,
            scrub_interval: SCRUB_INTERVAL,
            stroke: StrokeStyle::default(),
            page_size: PAGE_SIZE,
        }
    }
}

impl BookConfig {
    /// Physical sheets needed to hold every page (`ceil(page_count / 2)`).
    pub fn spread_count(&self) -> usize {
        self.page_count.div_ceil(2)
    }

    pub fn validate(&self) -> Result<(), BookError> {
        if self.page_count == 0 {
            return Err(BookError::NoPages);
        }
        if self.surface_width == 0 || self.surface_height == 0 {
            return Err(BookError::EmptySurface {
                width: self.surface_width,
                height: self.surface_height,
            });
        }
        if !self.flip_period_secs.is_finite() || self.flip_period_secs <= 0.0 {
            return Err(BookError::InvalidFlipPeriod(self.flip_period_secs));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = BookConfig::default();
        assert_eq!(config.page_count, 64);
        assert_eq!(config.spread_count(), 32);
        assert_eq!(config.scrub_interval, Duration::from_millis(80));
        assert_eq!(config.stroke.color, [0xaa, 0xaa, 0xaa, 0xff]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn odd_page_counts_round_spreads_up() {
        let config = BookConfig {
            page_count: 5,
            ..BookConfig::default()
        };
        assert_eq!(config.spread_count(), 3);
    }

    #[test]
    fn validate_rejects_degenerate_books() {
        let empty = BookConfig {
            page_count: 0,
            ..BookConfig::default()
        };
        assert!(matches!(empty.validate(), Err(BookError::NoPages)));

        let flat = BookConfig {
            surface_height: 0,
            ..BookConfig::default()
        };
        assert!(matches!(
            flat.validate(),
            Err(BookError::EmptySurface { height: 0, .. })
        ));

        let frozen = BookConfig {
            flip_period_secs: 0.0,
            ..BookConfig::default()
        };
        assert!(matches!(
            frozen.validate(),
            Err(BookError::InvalidFlipPeriod(_))
        ));
    }
}
