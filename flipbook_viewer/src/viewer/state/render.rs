use bytemuck::cast_slice;
use flipbook_core::PickTarget;
use wgpu::SurfaceError;

use super::super::mesh::{camera_uniform, page_uniform, scene_faces};
use super::ViewerState;
use super::init::write_rgba;

pub(super) fn render(state: &mut ViewerState) -> Result<(), SurfaceError> {
    sync_annotation_textures(state);
    write_uniforms(state);

    let frame = state.surface.get_current_texture()?;
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("flipbook-viewer-encoder"),
        });

    draw_pages(state, &view, &mut encoder);

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}

/// Copies every dirty annotation raster to its texture, then marks it synced.
fn sync_annotation_textures(state: &mut ViewerState) {
    let ViewerState {
        faces,
        queue,
        session,
        ..
    } = state;
    let book = session.book_mut();
    for face in faces.iter() {
        let PickTarget::Page(id) = face.target else {
            continue;
        };
        let Some(surface) = book.surface_mut(id) else {
            continue;
        };
        if !surface.is_dirty() {
            continue;
        }
        match write_rgba(
            queue,
            &face.annotation_texture,
            surface.width(),
            surface.height(),
            surface.pixels(),
        ) {
            Ok(()) => surface.mark_synced(),
            Err(err) => eprintln!("[flipbook_viewer] annotation upload for {id} failed: {err:?}"),
        }
    }
}

fn write_uniforms(state: &ViewerState) {
    let uniform = camera_uniform(state.camera.view_projection());
    state
        .queue
        .write_buffer(&state.camera_buffer, 0, cast_slice(&[uniform]));

    for (face, resources) in scene_faces(state.session.book())
        .iter()
        .zip(state.faces.iter())
    {
        state.queue.write_buffer(
            &resources.model_buffer,
            0,
            cast_slice(&[page_uniform(face.model)]),
        );
    }
}

fn draw_pages(state: &ViewerState, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
    let depth_attachment = wgpu::RenderPassDepthStencilAttachment {
        view: &state.depth_view,
        depth_ops: Some(wgpu::Operations {
            // Reversed-z: 0 is the far plane.
            load: wgpu::LoadOp::Clear(0.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    };

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("page-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(state.background),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(depth_attachment),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    pass.set_pipeline(&state.pipeline);
    pass.set_bind_group(0, &state.camera_bind_group, &[]);
    pass.set_vertex_buffer(0, state.quad_vertex_buffer.slice(..));
    pass.set_index_buffer(state.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    for face in &state.faces {
        pass.set_bind_group(1, &face.bind_group, &[]);
        pass.draw_indexed(0..state.quad_index_count, 0, 0..1);
    }
}
