use thiserror::Error;

/// Construction failures. Everything past construction is total.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("a book needs at least one page")]
    NoPages,
    #[error("annotation surface must have non-zero dimensions (got {width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error("flip period must be a positive number of seconds (got {0})")]
    InvalidFlipPeriod(f32),
    #[error("could not allocate a {width}x{height} annotation raster")]
    RasterAllocation { width: u32, height: u32 },
}
