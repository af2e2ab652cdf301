pub mod config;
pub mod errors;
pub mod geometry;
pub mod placement;

pub use config::*;
pub use errors::*;
pub use geometry::*;
pub use placement::*;
