//! Externally supplied parameters for a placement run.

use serde::{Deserialize, Serialize};

use crate::errors::CpResult;
use crate::geometry::RoomDimensions;

/// Top-level configuration for one placement run.
///
/// All fields are plain scalars so the config can be read from a flat JSON
/// document or assembled from command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    pub room: RoomDimensions,

    /// Number of optimizer-controlled emitters (tables).
    pub emitters: usize,

    /// Physical radius of each emitter.
    pub radius: f64,

    /// Dimensionless spread of the coverage kernel relative to `radius`.
    pub scale: f64,

    /// Pin an extra fixed emitter at the room origin.
    #[serde(default)]
    pub presentation_corner: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            room: RoomDimensions::new(20.0, 25.0),
            emitters: 5,
            radius: 2.0,
            scale: 2.0,
            presentation_corner: true,
        }
    }
}

impl PlacementConfig {
    pub fn new(room: RoomDimensions, emitters: usize) -> Self {
        Self {
            room,
            emitters,
            ..Self::default()
        }
    }

    pub fn with_emitters(mut self, n: usize) -> Self {
        self.emitters = n;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_presentation_corner(mut self, enabled: bool) -> Self {
        self.presentation_corner = enabled;
        self
    }

    /// Reject configurations no optimization can start from.
    pub fn validate(&self) -> CpResult<()> {
        let RoomDimensions { width, height } = self.room;

        if !(width.is_finite() && width > 0.0) || !(height.is_finite() && height > 0.0) {
            return Err(crate::config_error!(
                "room dimensions must be positive, got {}",
                self.room
            ));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(crate::config_error!(
                "radius must be positive, got {}",
                self.radius
            ));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(crate::config_error!(
                "scale must be positive, got {}",
                self.scale
            ));
        }
        if self.emitters == 0 {
            return Err(crate::config_error!("at least one emitter is required"));
        }
        let diameter = 2.0 * self.radius;
        if width < diameter || height < diameter {
            return Err(crate::config_error!(
                "room {} cannot hold an emitter of radius {}",
                self.room,
                self.radius
            ));
        }
        Ok(())
    }
}
