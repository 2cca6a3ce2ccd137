use std::{borrow::Cow, sync::Arc};

use anyhow::{Context, Result};
use bytemuck::cast_slice;
use flipbook_core::{
    BaseTexture, Book, BookSession, MonotonicClock, PickTarget,
    material::{
        ANNOTATION_TEXTURE_BINDING, BASE_TEXTURE_BINDING, LAYERED_SHADER_SOURCE,
        PAGE_MODEL_BINDING, PAGE_SAMPLER_BINDING,
    },
};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use super::super::camera::MapCamera;
use super::super::mesh::{
    CameraUniforms, PAGE_INDICES, PageUniforms, PageVertex, camera_uniform, page_quad,
    page_uniform, scene_faces,
};
use super::input::{self, InputState};
use super::{FaceResources, ViewerState};
use crate::texture::{PageImage, blank_page, prepare_rgba_upload, resolve_base_image};

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Page colour textures are sampled as sRGB so the swapchain re-encodes them
/// unchanged.
const PAGE_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
/// #999999 behind the book.
const BACKGROUND_SRGB: u8 = 0x99;

/// Bundles the wgpu objects tied to the viewer window.
struct WgpuBootstrap {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
}

/// Camera uniform plus the layouts shared by every page draw.
struct SharedResources {
    camera_buffer: wgpu::Buffer,
    camera_bind_group_layout: wgpu::BindGroupLayout,
    camera_bind_group: wgpu::BindGroup,
    page_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

/// Bootstraps wgpu, builds the layered-page pipeline and uploads every face's
/// base image before handing back a ready-to-render `ViewerState`.
pub(super) async fn new(
    window: Arc<Window>,
    session: BookSession<MonotonicClock>,
) -> Result<ViewerState> {
    let size = window.inner_size();
    let wgpu = bootstrap_wgpu(window.clone()).await?;

    let camera = MapCamera::new(size.width, size.height);
    let shared = create_shared_resources(&wgpu.device, &camera);
    let pipeline = create_page_pipeline(
        &wgpu.device,
        &shared.camera_bind_group_layout,
        &shared.page_bind_group_layout,
        wgpu.surface_format,
    );

    let quad = page_quad(session.book().config().page_size);
    let quad_vertex_buffer = wgpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("page-quad-vertices"),
        contents: cast_slice(&quad),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let quad_index_buffer = wgpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("page-quad-indices"),
        contents: cast_slice(&PAGE_INDICES),
        usage: wgpu::BufferUsages::INDEX,
    });

    let faces = create_face_resources(&wgpu.device, &wgpu.queue, &shared, session.book())?;
    println!(
        "[flipbook_viewer] uploaded {} page faces ({} pages)",
        faces.len(),
        session.book().page_count()
    );

    let (depth_texture, depth_view) = create_depth_texture(&wgpu.device, size);

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu.surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu.present_mode,
        alpha_mode: wgpu.alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    let background = background_color(wgpu.surface_format);
    let indicator_page = session.current_page_index();

    let mut state = ViewerState {
        window,
        surface: wgpu.surface,
        device: wgpu.device,
        queue: wgpu.queue,
        config,
        size,
        pipeline,
        quad_vertex_buffer,
        quad_index_buffer,
        quad_index_count: PAGE_INDICES.len() as u32,
        camera_buffer: shared.camera_buffer,
        camera_bind_group: shared.camera_bind_group,
        faces,
        _sampler: shared.sampler,
        _depth_texture: depth_texture,
        depth_view,
        background,
        camera,
        session,
        input: InputState::default(),
        indicator_page,
    };

    state.surface.configure(&state.device, &state.config);
    input::refresh_title(&mut state);

    Ok(state)
}

async fn bootstrap_wgpu(window: Arc<Window>) -> Result<WgpuBootstrap> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .context("creating wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("requesting wgpu adapter")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("flipbook-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting wgpu device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .or_else(|| surface_caps.formats.first().copied())
        .context("surface reports no texture formats")?;
    let present_mode = surface_caps
        .present_modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        .unwrap_or(wgpu::PresentMode::Fifo);
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Opaque);

    Ok(WgpuBootstrap {
        surface,
        device,
        queue,
        surface_format,
        present_mode,
        alpha_mode,
    })
}

fn create_shared_resources(device: &wgpu::Device, camera: &MapCamera) -> SharedResources {
    let camera_bind_group_layout =
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera-uniform-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<CameraUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("camera-uniform-buffer"),
        contents: cast_slice(&[camera_uniform(camera.view_projection())]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera-uniform-bind-group"),
        layout: &camera_bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: camera_buffer.as_entire_binding(),
        }],
    });

    let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    };

    let page_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("page-bind-group-layout"),
        entries: &[
            texture_entry(ANNOTATION_TEXTURE_BINDING),
            texture_entry(BASE_TEXTURE_BINDING),
            wgpu::BindGroupLayoutEntry {
                binding: PAGE_SAMPLER_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: PAGE_MODEL_BINDING,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<PageUniforms>() as u64,
                    ),
                },
                count: None,
            },
        ],
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("page-sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    SharedResources {
        camera_buffer,
        camera_bind_group_layout,
        camera_bind_group,
        page_bind_group_layout,
        sampler,
    }
}

fn create_page_pipeline(
    device: &wgpu::Device,
    camera_layout: &wgpu::BindGroupLayout,
    page_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("layered-page-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(LAYERED_SHADER_SOURCE)),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("layered-page-pipeline-layout"),
        bind_group_layouts: &[camera_layout, page_layout],
        push_constant_ranges: &[],
    });

    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<PageVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("layered-page-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            // Reversed-z: nearer fragments carry larger depth.
            depth_compare: wgpu::CompareFunction::Greater,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn create_face_resources(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    shared: &SharedResources,
    book: &Book,
) -> Result<Vec<FaceResources>> {
    let config = book.config();
    let blank = blank_page(config.surface_width, config.surface_height);
    let blank_base = Arc::new(upload_page_texture(device, queue, "blank-page", &blank)?);

    let mut faces = Vec::new();
    for face in scene_faces(book) {
        let (label, base) = match face.target {
            PickTarget::Page(id) => {
                let base = book
                    .page(id)
                    .map(|page| page.material().base().clone())
                    .unwrap_or(BaseTexture::Blank);
                let label = book
                    .page(id)
                    .map(|page| page.material().label().to_owned())
                    .unwrap_or_else(|| format!("page-{}", id.index()));
                (label, base)
            }
            PickTarget::Inert => (format!("filler-{}", face.spread), BaseTexture::Blank),
        };

        let base_texture = match base {
            BaseTexture::Blank => blank_base.clone(),
            BaseTexture::Image(_) => {
                let image = resolve_base_image(&base);
                Arc::new(upload_page_texture(device, queue, &label, &image)?)
            }
        };

        let annotation_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{label}-annotation")),
            size: wgpu::Extent3d {
                width: config.surface_width,
                height: config.surface_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PAGE_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-model")),
            contents: cast_slice(&[page_uniform(face.model)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let annotation_view =
            annotation_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let base_view = base_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout: &shared.page_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: ANNOTATION_TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&annotation_view),
                },
                wgpu::BindGroupEntry {
                    binding: BASE_TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&base_view),
                },
                wgpu::BindGroupEntry {
                    binding: PAGE_SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&shared.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: PAGE_MODEL_BINDING,
                    resource: model_buffer.as_entire_binding(),
                },
            ],
        });

        faces.push(FaceResources {
            target: face.target,
            annotation_texture,
            model_buffer,
            bind_group,
            _base_texture: base_texture,
        });
    }
    Ok(faces)
}

fn upload_page_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &PageImage,
) -> Result<wgpu::Texture> {
    let extent = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("{label}-base")),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: PAGE_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_rgba(queue, &texture, image.width, image.height, &image.data)
        .with_context(|| format!("uploading base texture for {label}"))?;
    Ok(texture)
}

pub(super) fn write_rgba(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    data: &[u8],
) -> Result<()> {
    let upload = prepare_rgba_upload(width, height, data)?;
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        upload.pixels(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(upload.bytes_per_row()),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    Ok(())
}

pub(super) fn create_depth_texture(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
) -> (wgpu::Texture, wgpu::TextureView) {
    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("page-depth-texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Clear colour for the swapchain; sRGB targets expect linear values.
fn background_color(surface_format: wgpu::TextureFormat) -> wgpu::Color {
    let encoded = f64::from(BACKGROUND_SRGB) / 255.0;
    let value = if surface_format.is_srgb() {
        srgb_to_linear(encoded)
    } else {
        encoded
    };
    wgpu::Color {
        r: value,
        g: value,
        b: value,
        a: 1.0,
    }
}

fn srgb_to_linear(value: f64) -> f64 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_linearised_for_srgb_targets() {
        let srgb = background_color(wgpu::TextureFormat::Bgra8UnormSrgb);
        let plain = background_color(wgpu::TextureFormat::Bgra8Unorm);
        assert!((plain.r - 0.6).abs() < 1e-9);
        assert!((srgb.r - 0.318).abs() < 1e-3);
        assert_eq!(srgb.a, 1.0);
    }
}
