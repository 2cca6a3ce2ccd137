//! Pages and the sheets (spreads) that carry them. Membership is fixed at
//! construction: page `2k` is the front of spread `k`, page `2k + 1` its back.

use std::fmt;

use crate::annotation::AnnotationSurface;
use crate::config::BookConfig;
use crate::error::BookError;
use crate::flip::{FlipAnimator, FlipDirection, SpreadTransform};
use crate::material::{BaseTexture, LayeredPageMaterial};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub usize);

impl PageId {
    pub fn index(self) -> usize {
        self.0
    }

    pub fn spread(self) -> usize {
        self.0 / 2
    }

    pub fn side(self) -> PageSide {
        if self.0 % 2 == 0 {
            PageSide::Front
        } else {
            PageSide::Back
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSide {
    Front,
    Back,
}

/// A renderable page face with its own ink layer and material.
#[derive(Debug)]
pub struct Page {
    id: PageId,
    material: LayeredPageMaterial,
    surface: AnnotationSurface,
}

impl Page {
    fn new(id: PageId, base: BaseTexture, config: &BookConfig) -> Result<Self, BookError> {
        let surface =
            AnnotationSurface::new(config.surface_width, config.surface_height, config.stroke)?;
        let material = LayeredPageMaterial::new(base, format!("page-{}", id.index()));
        Ok(Self {
            id,
            material,
            surface,
        })
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn side(&self) -> PageSide {
        self.id.side()
    }

    pub fn material(&self) -> &LayeredPageMaterial {
        &self.material
    }

    pub fn surface(&self) -> &AnnotationSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut AnnotationSurface {
        &mut self.surface
    }
}

/// One physical sheet. The back face is absent for an odd trailing page.
#[derive(Debug)]
pub struct PageSpread {
    index: usize,
    front: Page,
    back: Option<Page>,
    resting_depth: f32,
    transform: SpreadTransform,
    animator: FlipAnimator,
}

impl PageSpread {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn front(&self) -> &Page {
        &self.front
    }

    pub fn back(&self) -> Option<&Page> {
        self.back.as_ref()
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        std::iter::once(&self.front).chain(self.back.as_ref())
    }

    pub fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        std::iter::once(&mut self.front).chain(self.back.as_mut())
    }

    /// Depth anchor of the flip curve; larger for sheets nearer the camera.
    pub fn resting_depth(&self) -> f32 {
        self.resting_depth
    }

    pub fn transform(&self) -> SpreadTransform {
        self.transform
    }

    pub fn animator(&self) -> &FlipAnimator {
        &self.animator
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// Starts (or restarts) a flip; the pose jumps to the new timeline's
    /// first keyframe immediately.
    pub fn flip(&mut self, direction: FlipDirection, period: f32) {
        log::debug!("spread {} flipping {:?}", self.index, direction);
        self.transform = self.animator.start(direction, period, self.resting_depth);
    }

    /// Advances the running flip, if any. Returns whether it is still running.
    pub fn advance(&mut self, dt: f32) -> bool {
        if let Some(pose) = self.animator.advance(dt) {
            self.transform = pose;
        }
        self.animator.is_animating()
    }

    fn page_mut(&mut self, side: PageSide) -> Option<&mut Page> {
        match side {
            PageSide::Front => Some(&mut self.front),
            PageSide::Back => self.back.as_mut(),
        }
    }

    fn page(&self, side: PageSide) -> Option<&Page> {
        match side {
            PageSide::Front => Some(&self.front),
            PageSide::Back => self.back.as_ref(),
        }
    }
}

#[derive(Debug)]
pub struct Book {
    config: BookConfig,
    spreads: Vec<PageSpread>,
}

impl Book {
    /// Builds a book whose pages all start from a blank base image.
    pub fn new(config: BookConfig) -> Result<Self, BookError> {
        Self::with_base_textures(config, |_| BaseTexture::Blank)
    }

    pub fn with_base_textures<F>(config: BookConfig, mut base_for: F) -> Result<Self, BookError>
    where
        F: FnMut(PageId) -> BaseTexture,
    {
        config.validate()?;
        let spread_count = config.spread_count();
        let mut spreads = Vec::with_capacity(spread_count);
        for index in 0..spread_count {
            let front_id = PageId(index * 2);
            let back_id = PageId(index * 2 + 1);
            let front = Page::new(front_id, base_for(front_id), &config)?;
            let back = if back_id.index() < config.page_count {
                Some(Page::new(back_id, base_for(back_id), &config)?)
            } else {
                None
            };
            let resting_depth = spread_count as f32 / 2.0 - index as f32;
            spreads.push(PageSpread {
                index,
                front,
                back,
                resting_depth,
                transform: SpreadTransform::resting(resting_depth),
                animator: FlipAnimator::new(),
            });
        }
        log::debug!(
            "built book with {} pages across {} spreads",
            config.page_count,
            spread_count
        );
        Ok(Self { config, spreads })
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn page_count(&self) -> usize {
        self.config.page_count
    }

    pub fn spread_count(&self) -> usize {
        self.spreads.len()
    }

    pub fn spreads(&self) -> &[PageSpread] {
        &self.spreads
    }

    pub fn spread(&self, index: usize) -> Option<&PageSpread> {
        self.spreads.get(index)
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.spreads.get(id.spread())?.page(id.side())
    }

    pub fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.spreads.get_mut(id.spread())?.page_mut(id.side())
    }

    pub fn surface_mut(&mut self, id: PageId) -> Option<&mut AnnotationSurface> {
        self.page_mut(id).map(Page::surface_mut)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.spreads.iter().flat_map(|spread| spread.pages())
    }

    pub fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.spreads.iter_mut().flat_map(|spread| spread.pages_mut())
    }

    /// Flips one spread with the configured period. Out-of-range indices are
    /// ignored.
    pub fn flip(&mut self, spread: usize, direction: FlipDirection) -> bool {
        let period = self.config.flip_period_secs;
        match self.spreads.get_mut(spread) {
            Some(target) => {
                target.flip(direction, period);
                true
            }
            None => false,
        }
    }

    /// Advances every running flip by `dt` seconds and returns how many are
    /// still running afterwards.
    pub fn tick(&mut self, dt: f32) -> usize {
        self.spreads
            .iter_mut()
            .map(|spread| spread.advance(dt))
            .filter(|running| *running)
            .count()
    }

    pub fn is_animating(&self) -> bool {
        self.spreads.iter().any(PageSpread::is_animating)
    }

    /// Spreads with a flip in flight.
    pub fn animating_count(&self) -> usize {
        self.spreads
            .iter()
            .filter(|spread| spread.is_animating())
            .count()
    }
}
