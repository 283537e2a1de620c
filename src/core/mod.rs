pub mod bounds;
pub mod config;
pub mod constants;
pub mod fit;
pub mod geo;
pub mod viewport;
