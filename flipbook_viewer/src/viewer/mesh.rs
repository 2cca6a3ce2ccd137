//! Page geometry. Every face shares one quad centred on its local origin;
//! the per-face model matrix hinges it on the spread's binding axis and
//! applies the spread's flip pose.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use flipbook_core::{Book, PageSide, PickTarget, SpreadTransform};
use glam::{Mat4, Vec3};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PageVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Counter-clockwise when seen from +z, so back-face culling hides a page
/// that faces away from the camera.
pub const PAGE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PageUniforms {
    pub model: [[f32; 4]; 4],
}

/// Plane of `size` world units facing +z; uv `(0, 0)` at the bottom-left.
pub fn page_quad(size: [f32; 2]) -> [PageVertex; 4] {
    let half_w = size[0] * 0.5;
    let half_h = size[1] * 0.5;
    [
        PageVertex {
            position: [-half_w, -half_h, 0.0],
            uv: [0.0, 0.0],
        },
        PageVertex {
            position: [half_w, -half_h, 0.0],
            uv: [1.0, 0.0],
        },
        PageVertex {
            position: [half_w, half_h, 0.0],
            uv: [1.0, 1.0],
        },
        PageVertex {
            position: [-half_w, half_h, 0.0],
            uv: [0.0, 1.0],
        },
    ]
}

pub fn spread_matrix(transform: SpreadTransform) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, transform.depth))
        * Mat4::from_rotation_y(transform.rotation_y)
}

/// Places a face with its left edge on the binding. The back face is the
/// same plane turned half a revolution about its own centre.
pub fn face_matrix(side: PageSide, size: [f32; 2]) -> Mat4 {
    let offset = Mat4::from_translation(Vec3::new(size[0] * 0.5, 0.0, 0.0));
    match side {
        PageSide::Front => offset,
        PageSide::Back => offset * Mat4::from_rotation_y(PI),
    }
}

/// One drawable face of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceInstance {
    pub target: PickTarget,
    pub spread: usize,
    pub side: PageSide,
    pub model: Mat4,
}

/// Every face in draw order, with the blank filler behind an odd last page
/// tagged inert.
pub fn scene_faces(book: &Book) -> Vec<FaceInstance> {
    let size = book.config().page_size;
    let mut faces = Vec::with_capacity(book.spread_count() * 2);
    for spread in book.spreads() {
        let pose = spread_matrix(spread.transform());
        faces.push(FaceInstance {
            target: PickTarget::Page(spread.front().id()),
            spread: spread.index(),
            side: PageSide::Front,
            model: pose * face_matrix(PageSide::Front, size),
        });
        let back = spread
            .back()
            .map(|page| PickTarget::Page(page.id()))
            .unwrap_or(PickTarget::Inert);
        faces.push(FaceInstance {
            target: back,
            spread: spread.index(),
            side: PageSide::Back,
            model: pose * face_matrix(PageSide::Back, size),
        });
    }
    faces
}

pub fn camera_uniform(view_projection: Mat4) -> CameraUniforms {
    CameraUniforms {
        view_projection: view_projection.to_cols_array_2d(),
    }
}

pub fn page_uniform(model: Mat4) -> PageUniforms {
    PageUniforms {
        model: model.to_cols_array_2d(),
    }
}
