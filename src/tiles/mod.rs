pub mod source;

pub use source::{OpenStreetMapSource, TileError, TileSource};
