//! Render configuration.
//!
//! A fully resolved set of rendering choices. Every field has a default and
//! the whole struct deserializes with `#[serde(default)]`, so callers may
//! supply only the fields they care about.

use serde::{Deserialize, Serialize};

use crate::cluster::MergeStrategy;
use crate::detector::ModuleRole;
use crate::error::{Error, Result};
use crate::matrix::Frame;
use crate::neighbors::Connectivity;
use crate::shapes::{ShapeKind, ShapeParams};
use crate::smooth::validate_intensity;

/// Shape selection per structural role.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleShapes {
    pub finder: ShapeKind,
    pub separator: ShapeKind,
    pub timing: ShapeKind,
    pub alignment: ShapeKind,
    pub format: ShapeKind,
    pub version: ShapeKind,
    pub dark_module: ShapeKind,
    pub data: ShapeKind,
}

impl RoleShapes {
    /// The same kind for every role.
    pub fn uniform(kind: ShapeKind) -> Self {
        Self {
            finder: kind.clone(),
            separator: kind.clone(),
            timing: kind.clone(),
            alignment: kind.clone(),
            format: kind.clone(),
            version: kind.clone(),
            dark_module: kind.clone(),
            data: kind,
        }
    }

    pub fn for_role(&self, role: ModuleRole) -> &ShapeKind {
        match role {
            ModuleRole::Finder => &self.finder,
            ModuleRole::Separator => &self.separator,
            ModuleRole::Timing => &self.timing,
            ModuleRole::Alignment => &self.alignment,
            ModuleRole::Format => &self.format,
            ModuleRole::Version => &self.version,
            ModuleRole::DarkModule => &self.dark_module,
            ModuleRole::Data => &self.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub connectivity: Connectivity,
    pub merge: MergeStrategy,
    /// Merged components smaller than this dissolve into single modules.
    pub min_cluster_size: usize,
    /// Corner rounding of cluster outlines, in `[0, 1]`.
    pub smoothing: f64,
    /// Output units per module.
    pub module_pitch: f64,
    /// Light border around the symbol, in modules.
    pub quiet_zone: usize,
    pub shapes: RoleShapes,
    pub shape_params: ShapeParams,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Four,
            merge: MergeStrategy::None,
            min_cluster_size: 3,
            smoothing: 0.5,
            module_pitch: 10.0,
            quiet_zone: 4,
            shapes: RoleShapes::default(),
            shape_params: ShapeParams::default(),
        }
    }
}

impl RenderConfig {
    /// Check the numeric fields and build the output frame.
    pub fn frame(&self) -> Result<Frame> {
        validate_intensity(self.smoothing)?;
        self.shape_params.validate()?;
        if self.min_cluster_size == 0 {
            return Err(Error::InvalidClusterSize { value: 0 });
        }
        Frame::new(self.module_pitch, self.quiet_zone)
    }

    pub fn with_shape_params(mut self, params: ShapeParams) -> Self {
        self.shape_params = params;
        self
    }

    pub fn with_merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_min_cluster_size(mut self, min: usize) -> Self {
        self.min_cluster_size = min;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = RenderConfig::default();
        assert_eq!(c.min_cluster_size, 3);
        assert_eq!(c.smoothing, 0.5);
        assert_eq!(c.quiet_zone, 4);
        assert_eq!(c.shapes.for_role(ModuleRole::Finder), &ShapeKind::Square);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c: RenderConfig = serde_json::from_str(
            r#"{"merge":"aggressive","connectivity":"eight","shapes":{"data":"circle"}}"#,
        )
        .unwrap();
        assert_eq!(c.merge, MergeStrategy::Aggressive);
        assert_eq!(c.connectivity, Connectivity::Eight);
        assert_eq!(c.shapes.data, ShapeKind::Circle);
        assert_eq!(c.shapes.finder, ShapeKind::Square);
        assert_eq!(c.module_pitch, 10.0);
        assert_eq!(c.shape_params, ShapeParams::default());
    }

    #[test]
    fn test_frame_validation() {
        assert!(RenderConfig::default().frame().is_ok());
        let err = RenderConfig::default().with_smoothing(2.0).frame().unwrap_err();
        assert_eq!(err, Error::SmoothingOutOfRange { value: 2.0 });
        let bad_pitch = RenderConfig {
            module_pitch: 0.0,
            ..RenderConfig::default()
        };
        assert_eq!(bad_pitch.frame().unwrap_err(), Error::InvalidPitch { value: 0.0 });
    }

    #[test]
    fn test_frame_rejects_out_of_range_shape_params() {
        let c = RenderConfig::default().with_shape_params(ShapeParams {
            scale: 1.5,
            roundness: 0.5,
        });
        assert_eq!(
            c.frame().unwrap_err(),
            Error::ShapeParamOutOfRange {
                name: "scale",
                value: 1.5
            }
        );
        let c = RenderConfig::default().with_shape_params(ShapeParams {
            scale: 1.0,
            roundness: -1.0,
        });
        assert_eq!(
            c.frame().unwrap_err(),
            Error::ShapeParamOutOfRange {
                name: "roundness",
                value: -1.0
            }
        );
    }

    #[test]
    fn test_frame_rejects_zero_min_cluster_size() {
        let c = RenderConfig::default().with_min_cluster_size(0);
        assert_eq!(c.frame().unwrap_err(), Error::InvalidClusterSize { value: 0 });
        assert!(RenderConfig::default().with_min_cluster_size(1).frame().is_ok());
    }

    #[test]
    fn test_uniform_role_shapes() {
        let s = RoleShapes::uniform(ShapeKind::Dot);
        assert!(ModuleRole::ALL.iter().all(|r| s.for_role(*r) == &ShapeKind::Dot));
    }
}
