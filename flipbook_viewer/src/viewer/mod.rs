mod camera;
mod mesh;
mod picking;
mod state;

pub use state::ViewerState;
