//! Central runtime state for the viewer. Owns the wgpu device/surface, the
//! per-face GPU resources and the book session, and exposes small helpers
//! that the event loop in `main.rs` drives. Submodules cover lifecycle
//! slices: `init` for setup, `layout` for resize handling, `render` for the
//! draw pass, and `input` for keyboard and pointer routing.

use std::sync::Arc;

use anyhow::Result;
use flipbook_core::{BookSession, MonotonicClock, PickTarget};
use wgpu::SurfaceError;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::ModifiersState,
    window::Window,
};

use super::camera::MapCamera;

mod init;
mod input;
mod layout;
mod render;

/// GPU side of one drawable face. Face `i` renders page `i`; the filler behind
/// an odd last page takes the slot after the final page.
struct FaceResources {
    target: PickTarget,
    annotation_texture: wgpu::Texture,
    model_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    _base_texture: Arc<wgpu::Texture>,
}

pub struct ViewerState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    pipeline: wgpu::RenderPipeline,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    quad_index_count: u32,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    faces: Vec<FaceResources>,
    _sampler: wgpu::Sampler,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    background: wgpu::Color,
    camera: MapCamera,
    session: BookSession<MonotonicClock>,
    input: input::InputState,
    /// Position last reported to the title bar; only moves on navigation
    /// events so a running scrub does not update it.
    indicator_page: usize,
}

impl ViewerState {
    pub async fn new(window: Arc<Window>, session: BookSession<MonotonicClock>) -> Result<Self> {
        init::new(window, session).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        layout::resize(self, new_size);
    }

    /// Advances the session by the wall time since the last frame and
    /// refreshes the position indicator from any navigation events.
    pub fn update(&mut self) {
        self.session.tick();
        let events = self.session.drain_events();
        if input::apply_navigation_events(self, &events) {
            input::refresh_title(self);
        }
    }

    pub fn render(&mut self) -> Result<(), SurfaceError> {
        render::render(self)
    }

    /// Returns `true` when the key asks the viewer to exit.
    pub fn handle_key_event(&mut self, event: &KeyEvent) -> bool {
        input::handle_key_event(self, event)
    }

    pub fn set_modifiers(&mut self, modifiers: ModifiersState) {
        input::set_modifiers(self, modifiers);
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        input::cursor_moved(self, position);
    }

    pub fn pointer_button(&mut self, button: MouseButton, button_state: ElementState) {
        input::pointer_button(self, button, button_state);
    }

    pub fn focus_lost(&mut self) {
        input::focus_lost(self);
    }

    pub fn scroll(&mut self, delta: MouseScrollDelta) {
        input::scroll(self, delta);
    }
}
