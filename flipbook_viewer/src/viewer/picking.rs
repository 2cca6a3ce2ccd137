//! Ray casting against page faces. Only front-facing hits count, matching
//! what back-face culling leaves visible.

use flipbook_core::{Book, PickHit, PickTarget, SurfacePicker, SurfacePoint};
use glam::{Mat4, Vec3};

use super::camera::{MapCamera, Ray};
use super::mesh::scene_faces;

#[derive(Debug, Clone, Copy)]
struct PickPlane {
    target: PickTarget,
    model: Mat4,
    inverse: Mat4,
}

/// Snapshot of the scene's faces under one camera. Built per pointer event
/// so it never borrows the book it will paint into.
#[derive(Debug, Clone)]
pub struct ScenePicker {
    camera: MapCamera,
    page_size: [f32; 2],
    planes: Vec<PickPlane>,
}

impl ScenePicker {
    pub fn new(camera: &MapCamera, book: &Book) -> Self {
        let planes = scene_faces(book)
            .into_iter()
            .map(|face| PickPlane {
                target: face.target,
                model: face.model,
                inverse: face.model.inverse(),
            })
            .collect();
        Self {
            camera: camera.clone(),
            page_size: book.config().page_size,
            planes,
        }
    }

    pub fn cast(&self, ray: Ray) -> Option<PickHit> {
        self.planes
            .iter()
            .filter_map(|plane| self.intersect(plane, ray))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn intersect(&self, plane: &PickPlane, ray: Ray) -> Option<PickHit> {
        let origin = plane.inverse.transform_point3(ray.origin);
        let direction = plane.inverse.transform_vector3(ray.direction);
        // Front faces look down +z in face space; the ray must travel -z.
        if direction.z >= -f32::EPSILON {
            return None;
        }
        let distance = -origin.z / direction.z;
        if distance <= 0.0 {
            return None;
        }
        let local = origin + direction * distance;
        let [width, height] = self.page_size;
        let u = local.x / width + 0.5;
        let v = local.y / height + 0.5;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        let point: Vec3 = plane.model.transform_point3(local);
        Some(PickHit {
            target: plane.target,
            point: point.to_array(),
            uv: SurfacePoint::new(u, v),
            distance,
        })
    }
}

impl SurfacePicker for ScenePicker {
    fn pick(&self, ndc: [f32; 2]) -> Option<PickHit> {
        self.cast(self.camera.ray(ndc))
    }
}
