pub mod compositor;
pub mod markers;

pub use compositor::Compositor;
pub use markers::{Marker, MarkerStyle};
