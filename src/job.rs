//! Job files: the region to pocket plus every planning and output setting.
//!
//! Jobs are stored as JSON or TOML, chosen by file extension.

use pocketkit_core::{Curve, Point, Region, RegionAlgebra};
use pocketkit_toolpath::{DepthParams, GcodeOptions, PocketParams};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading, saving or interpreting a job.
#[derive(Error, Debug)]
pub enum JobError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The job file format is not supported.
    #[error("Unsupported job format: {0}")]
    UnsupportedFormat(String),

    /// A job value is invalid.
    #[error("Invalid job: {0}")]
    Invalid(String),
}

pub type JobResult<T> = std::result::Result<T, JobError>;

/// Outline contributing to the pocket region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
    Rectangle {
        min: Point,
        max: Point,
        #[serde(default)]
        hole: bool,
    },
    Circle {
        center: Point,
        radius: f64,
        #[serde(default)]
        hole: bool,
    },
    Polygon {
        points: Vec<Point>,
        #[serde(default)]
        hole: bool,
    },
}

impl ShapeSpec {
    pub fn is_hole(&self) -> bool {
        match self {
            ShapeSpec::Rectangle { hole, .. }
            | ShapeSpec::Circle { hole, .. }
            | ShapeSpec::Polygon { hole, .. } => *hole,
        }
    }

    pub fn to_curve(&self) -> Curve {
        match self {
            ShapeSpec::Rectangle { min, max, .. } => Curve::rectangle(*min, *max),
            ShapeSpec::Circle { center, radius, .. } => Curve::circle(*center, *radius),
            ShapeSpec::Polygon { points, .. } => Curve::polygon(points),
        }
    }

    fn validate(&self) -> JobResult<()> {
        match self {
            ShapeSpec::Rectangle { min, max, .. } => {
                if max.x <= min.x || max.y <= min.y {
                    return Err(JobError::Invalid(format!(
                        "rectangle max {:?} must lie above and right of min {:?}",
                        max, min
                    )));
                }
            }
            ShapeSpec::Circle { radius, .. } => {
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(JobError::Invalid(format!(
                        "circle radius must be positive, got {}",
                        radius
                    )));
                }
            }
            ShapeSpec::Polygon { points, .. } => {
                if points.len() < 3 {
                    return Err(JobError::Invalid(format!(
                        "polygon needs at least 3 points, got {}",
                        points.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A complete pocketing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub shapes: Vec<ShapeSpec>,
    #[serde(default)]
    pub pocket: PocketParams,
    #[serde(default)]
    pub depths: DepthParams,
    #[serde(default)]
    pub gcode: GcodeOptions,
}

impl Job {
    pub fn new(shapes: Vec<ShapeSpec>) -> Self {
        Self {
            shapes,
            pocket: PocketParams::default(),
            depths: DepthParams::default(),
            gcode: GcodeOptions::default(),
        }
    }

    /// Load a job from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> JobResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let job: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(JobError::UnsupportedFormat(path.display().to_string()));
        };

        job.validate()?;
        Ok(job)
    }

    /// Save a job to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> JobResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(JobError::UnsupportedFormat(path.display().to_string()));
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the shapes and planning parameters.
    pub fn validate(&self) -> JobResult<()> {
        if !self.shapes.iter().any(|s| !s.is_hole()) {
            return Err(JobError::Invalid(
                "job needs at least one outer shape".to_string(),
            ));
        }
        for shape in &self.shapes {
            shape.validate()?;
        }
        self.pocket
            .validate()
            .map_err(|e| JobError::Invalid(e.to_string()))?;
        self.depths
            .depths()
            .map_err(|e| JobError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Region enclosed by the outer shapes with every hole removed.
    pub fn to_region(&self) -> JobResult<Region> {
        let (holes, outers): (Vec<&ShapeSpec>, Vec<&ShapeSpec>) =
            self.shapes.iter().partition(|s| s.is_hole());

        let mut region = Region::new();
        for shape in outers {
            let curve = shape.to_curve();
            region.append(if curve.is_clockwise() {
                curve.reversed()
            } else {
                curve
            });
        }
        region
            .reorder()
            .map_err(|e| JobError::Invalid(e.to_string()))?;

        if !holes.is_empty() {
            let mut cutter = Region::new();
            for shape in holes {
                cutter.append(shape.to_curve());
            }
            cutter
                .reorder()
                .map_err(|e| JobError::Invalid(e.to_string()))?;
            region
                .subtract(&cutter)
                .map_err(|e| JobError::Invalid(e.to_string()))?;
        }
        Ok(region)
    }
}
