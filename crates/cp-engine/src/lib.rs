// Coverplace engine: file export around the placement optimizer

pub mod export;

pub use export::{
    coordinate_map, read_config, write_coordinates, write_json, HeatmapDocument,
};
