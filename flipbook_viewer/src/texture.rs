use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use flipbook_core::{BaseTexture, PageId};

/// Pixel size of the generated blank sheet, matching the annotation raster.
pub const BLANK_PAGE_WIDTH: u32 = flipbook_core::config::SURFACE_WIDTH;
pub const BLANK_PAGE_HEIGHT: u32 = flipbook_core::config::SURFACE_HEIGHT;

/// Straight-alpha RGBA8 pixels, top row first.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Opaque white sheet used when a page has no image of its own.
pub fn blank_page(width: u32, height: u32) -> PageImage {
    PageImage {
        data: vec![0xFF; width as usize * height as usize * 4],
        width,
        height,
    }
}

/// `<dir>/<index>.png` when it exists, otherwise the blank sheet.
pub fn base_texture_for(pages_dir: Option<&Path>, page: PageId) -> BaseTexture {
    let Some(dir) = pages_dir else {
        return BaseTexture::Blank;
    };
    let candidate: PathBuf = dir.join(format!("{}.png", page.index()));
    if candidate.is_file() {
        BaseTexture::Image(candidate)
    } else {
        BaseTexture::Blank
    }
}

pub fn load_page_image(path: &Path) -> Result<PageImage> {
    let decoded = image::open(path)
        .with_context(|| format!("decoding page image {}", path.display()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    ensure!(
        width > 0 && height > 0,
        "page image {} has no pixels",
        path.display()
    );
    Ok(PageImage {
        data: decoded.into_raw(),
        width,
        height,
    })
}

/// Resolves a base texture to pixels. A page whose image fails to decode
/// falls back to the blank sheet so the book stays usable.
pub fn resolve_base_image(base: &BaseTexture) -> PageImage {
    match base {
        BaseTexture::Blank => blank_page(BLANK_PAGE_WIDTH, BLANK_PAGE_HEIGHT),
        BaseTexture::Image(path) => match load_page_image(path) {
            Ok(image) => image,
            Err(err) => {
                eprintln!("[flipbook_viewer] falling back to blank page: {err:?}");
                blank_page(BLANK_PAGE_WIDTH, BLANK_PAGE_HEIGHT)
            }
        },
    }
}

pub struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl<'a> TextureUpload<'a> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pads RGBA rows out to `COPY_BYTES_PER_ROW_ALIGNMENT` when needed; aligned
/// input is borrowed as-is.
pub fn prepare_rgba_upload<'a>(
    width: u32,
    height: u32,
    data: &'a [u8],
) -> Result<TextureUpload<'a>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = 4usize * width as usize;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    ensure!(
        data.len() >= row_bytes * height as usize,
        "texture buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        row_bytes * height as usize
    );

    if row_bytes % alignment == 0 {
        return Ok(TextureUpload {
            data: Cow::Borrowed(&data[..row_bytes * height as usize]),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * height as usize];
    for (row, src) in data.chunks_exact(row_bytes).take(height as usize).enumerate() {
        let dst_offset = row * padded_row_bytes;
        buffer[dst_offset..dst_offset + row_bytes].copy_from_slice(src);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}
