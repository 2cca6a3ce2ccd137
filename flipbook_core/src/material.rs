//! Layered page material: the annotation raster composited over the page's
//! base image with alpha-over blending. The WGSL program is what the renderer
//! compiles; `blend_over` is its per-pixel CPU equivalent.

use std::path::{Path, PathBuf};

/// Bind group slot layout expected by [`LAYERED_SHADER_SOURCE`], group 1.
pub const ANNOTATION_TEXTURE_BINDING: u32 = 0;
pub const BASE_TEXTURE_BINDING: u32 = 1;
pub const PAGE_SAMPLER_BINDING: u32 = 2;
pub const PAGE_MODEL_BINDING: u32 = 3;

/// Vertex input: `@location(0)` position (vec3), `@location(1)` surface-space
/// uv (vec2, `y = 1` at the top). Group 0 holds the camera uniform, group 1
/// the per-page textures, sampler and model matrix.
///
/// The annotation layer arrives premultiplied, so `ca.rgb` already carries
/// `Ca.rgb * Ca.a`.
pub const LAYERED_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_projection: mat4x4<f32>,
};

struct PageUniform {
    model: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniform;

@group(1) @binding(0)
var annotation_texture: texture_2d<f32>;
@group(1) @binding(1)
var base_texture: texture_2d<f32>;
@group(1) @binding(2)
var page_sampler: sampler;
@group(1) @binding(3)
var<uniform> page: PageUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_projection * page.model * vec4<f32>(input.position, 1.0);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let texel = vec2<f32>(input.uv.x, 1.0 - input.uv.y);
    let ca = textureSample(annotation_texture, page_sampler, texel);
    let cb = textureSample(base_texture, page_sampler, texel);
    return vec4<f32>(ca.rgb + cb.rgb * cb.a * (1.0 - ca.a), 1.0);
}
"#;

/// Where a page's base image comes from. Resolving it to pixels is the asset
/// loader's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseTexture {
    /// Plain white sheet.
    Blank,
    Image(PathBuf),
}

impl BaseTexture {
    pub fn path(&self) -> Option<&Path> {
        match self {
            BaseTexture::Blank => None,
            BaseTexture::Image(path) => Some(path.as_path()),
        }
    }
}

/// One per page face. Holds the base image reference; the annotation layer is
/// the sibling [`AnnotationSurface`](crate::AnnotationSurface) owned by the
/// same page.
#[derive(Debug, Clone)]
pub struct LayeredPageMaterial {
    base: BaseTexture,
    label: String,
}

impl LayeredPageMaterial {
    pub fn new(base: BaseTexture, label: impl Into<String>) -> Self {
        Self {
            base,
            label: label.into(),
        }
    }

    pub fn base(&self) -> &BaseTexture {
        &self.base
    }

    /// Debug label for GPU objects created on behalf of this material.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Alpha-over of a premultiplied annotation texel onto a straight-alpha base
/// texel. The result is always opaque.
pub fn blend_over(annotation: [u8; 4], base: [u8; 4]) -> [u8; 4] {
    let ca_a = f32::from(annotation[3]) / 255.0;
    let cb_a = f32::from(base[3]) / 255.0;
    let mut out = [0u8, 0, 0, 255];
    for channel in 0..3 {
        let ca = f32::from(annotation[channel]) / 255.0;
        let cb = f32::from(base[channel]) / 255.0;
        let value = ca + cb * cb_a * (1.0 - ca_a);
        out[channel] = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out
}
