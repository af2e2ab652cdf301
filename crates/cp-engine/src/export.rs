//! JSON documents handed to persistence and rendering.

use chrono::{DateTime, Utc};
use cp_field::Integration;
use cp_types::{CpResult, OptimizationResult, PlacementConfig, PlacementVector, Point2D};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Placement list keyed by emitter index: `{"0": [x, y], "1": [x, y], ...}`.
pub fn coordinate_map(placements: &PlacementVector) -> BTreeMap<usize, [f64; 2]> {
    placements
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (*p).into()))
        .collect()
}

/// Everything a heat-map renderer needs for one result.
///
/// `cells[y][x]` holds the coverage at sample `(x, y)`; `emitters` is the same
/// set the cells were computed from, so it includes the presentation corner
/// when that is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapDocument {
    pub width: f64,
    pub height: f64,
    /// Radius of the circle drawn around each emitter.
    pub radius: f64,
    pub presentation_corner: bool,
    pub coverage: f64,
    pub cells: Vec<Vec<f64>>,
    pub emitters: Vec<[f64; 2]>,
    pub generated_at: DateTime<Utc>,
}

impl HeatmapDocument {
    pub fn new(
        config: &PlacementConfig,
        placements: &PlacementVector,
        integration: &Integration,
    ) -> Self {
        let mut emitters: Vec<[f64; 2]> =
            placements.points().iter().map(|p| (*p).into()).collect();
        if config.presentation_corner {
            emitters.push(Point2D::ORIGIN.into());
        }
        Self {
            width: config.room.width,
            height: config.room.height,
            radius: config.radius,
            presentation_corner: config.presentation_corner,
            coverage: integration.sum,
            cells: integration.grid.to_rows(),
            emitters,
            generated_at: Utc::now(),
        }
    }
}

/// Pretty-printed JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> CpResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body)?;
    Ok(())
}

pub fn write_coordinates(path: &Path, result: &OptimizationResult) -> CpResult<()> {
    write_json(path, &coordinate_map(&result.placements))?;
    info!("Wrote {} coordinates to {}", result.placements.len(), path.display());
    Ok(())
}

/// Load a [`PlacementConfig`] from a JSON file.
pub fn read_config(path: &Path) -> CpResult<PlacementConfig> {
    let body = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_optimizer::PlacementOptimizer;
    use cp_types::{ConvergenceStatus, RoomDimensions};

    fn result() -> OptimizationResult {
        OptimizationResult {
            placements: PlacementVector::new(vec![
                Point2D::new(4.0, 5.5),
                Point2D::new(12.0, 18.25),
            ]),
            coverage: 123.0,
            status: ConvergenceStatus::Converged,
            iterations: 7,
            objective_evaluations: 21,
            constraint_evaluations: 21,
            separation: Some(9.0),
        }
    }

    #[test]
    fn coordinates_keyed_by_index() {
        let json = serde_json::to_value(coordinate_map(&result().placements)).unwrap();
        assert_eq!(json, serde_json::json!({"0": [4.0, 5.5], "1": [12.0, 18.25]}));
    }

    #[test]
    fn write_coordinates_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("table_coords.json");
        write_coordinates(&path, &result()).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        let back: BTreeMap<usize, [f64; 2]> = serde_json::from_str(&body).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[&1], [12.0, 18.25]);
    }

    #[test]
    fn heatmap_matches_scored_emitter_set() {
        let config = PlacementConfig::new(RoomDimensions::new(8.0, 6.0), 1)
            .with_radius(1.0)
            .with_scale(2.0)
            .with_presentation_corner(true);
        let optimizer = PlacementOptimizer::new(config.clone()).unwrap();
        let placements = PlacementVector::new(vec![Point2D::new(5.0, 3.0)]);
        let integration = optimizer.coverage_grid(&placements).unwrap();

        let doc = HeatmapDocument::new(&config, &placements, &integration);
        assert_eq!(doc.cells.len(), 6);
        assert_eq!(doc.cells[0].len(), 8);
        assert_eq!(doc.cells[3][5], 1.0);
        assert_eq!(doc.cells[0][0], 1.0);
        assert_eq!(doc.emitters, vec![[5.0, 3.0], [0.0, 0.0]]);
        assert_eq!(doc.coverage, integration.sum);
    }

    #[test]
    fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.json");
        let config = PlacementConfig::default().with_emitters(3);
        write_json(&path, &config).unwrap();
        assert_eq!(read_config(&path).unwrap(), config);
    }

    #[test]
    fn missing_config_is_io_error() {
        let err = read_config(Path::new("/nonexistent/coverplace.json")).unwrap_err();
        assert!(matches!(err, cp_types::CpError::Io(_)));
    }
}
