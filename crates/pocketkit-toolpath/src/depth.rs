//! Depth stepping.

use crate::error::{ParameterError, ParameterResult};
use serde::{Deserialize, Serialize};

/// Z levels for a pocket and the heights used between them.
///
/// Depths count downward: `final_depth` is below `start_depth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthParams {
    /// Height the tool rises to before any repositioning rapid.
    pub clearance_height: f64,
    /// Gap above the current start depth at which rapids end and feeds begin.
    pub rapid_safety_space: f64,
    pub start_depth: f64,
    /// Maximum cut per layer.
    pub step_down: f64,
    /// Thickness of the finishing layer, zero for none.
    pub z_finish_depth: f64,
    /// Extra depth cut below `final_depth` to break through the stock.
    pub z_thru_depth: f64,
    pub final_depth: f64,
    /// Explicit depth list overriding the computed layers.
    pub user_depths: Option<Vec<f64>>,
}

impl Default for DepthParams {
    fn default() -> Self {
        Self {
            clearance_height: 5.0,
            rapid_safety_space: 2.0,
            start_depth: 0.0,
            step_down: 1.0,
            z_finish_depth: 0.0,
            z_thru_depth: 0.0,
            final_depth: -1.0,
            user_depths: None,
        }
    }
}

impl DepthParams {
    /// Creates a schedule cutting from `start_depth` to `final_depth` in layers of at most `step_down`.
    pub fn new(
        clearance_height: f64,
        rapid_safety_space: f64,
        start_depth: f64,
        step_down: f64,
        final_depth: f64,
    ) -> Self {
        Self {
            clearance_height,
            rapid_safety_space,
            start_depth,
            step_down,
            final_depth,
            ..Self::default()
        }
    }

    /// Ordered Z levels, from the first layer down to the final depth.
    ///
    /// Roughing layers are equal in thickness. A non-zero `z_finish_depth`
    /// leaves that much for a last pass at the final depth.
    pub fn depths(&self) -> ParameterResult<Vec<f64>> {
        self.validate()?;
        let depths = match &self.user_depths {
            Some(list) => list.clone(),
            None => self.computed_depths(),
        };
        check_monotonic(&depths, self.start_depth)?;
        Ok(depths)
    }

    fn computed_depths(&self) -> Vec<f64> {
        let bottom = self.final_depth - self.z_thru_depth;
        let finish = self.z_finish_depth.min(self.start_depth - bottom).max(0.0);
        let rough_bottom = bottom + finish;
        let rough_total = self.start_depth - rough_bottom;

        let mut depths = Vec::new();
        if rough_total > 1e-9 {
            let layers = (rough_total / self.step_down - 1e-9).ceil().max(1.0) as usize;
            let layer = rough_total / layers as f64;
            for i in 1..layers {
                depths.push(self.start_depth - layer * i as f64);
            }
            depths.push(rough_bottom);
        }
        if finish > 1e-9 || depths.is_empty() {
            depths.push(bottom);
        }
        depths
    }

    fn validate(&self) -> ParameterResult<()> {
        let fields = [
            ("clearance_height", self.clearance_height),
            ("rapid_safety_space", self.rapid_safety_space),
            ("start_depth", self.start_depth),
            ("step_down", self.step_down),
            ("z_finish_depth", self.z_finish_depth),
            ("z_thru_depth", self.z_thru_depth),
            ("final_depth", self.final_depth),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ParameterError::InvalidValue {
                    name: name.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }
        if self.user_depths.is_none() {
            if self.step_down <= 0.0 {
                return Err(ParameterError::OutOfRange {
                    name: "step_down".to_string(),
                    value: self.step_down,
                    min: 0.0,
                    max: f64::INFINITY,
                });
            }
            if self.final_depth >= self.start_depth {
                return Err(ParameterError::InvalidDepths(format!(
                    "final depth {} is not below start depth {}",
                    self.final_depth, self.start_depth
                )));
            }
        }
        for (name, value) in [
            ("z_finish_depth", self.z_finish_depth),
            ("z_thru_depth", self.z_thru_depth),
        ] {
            if value < 0.0 {
                return Err(ParameterError::OutOfRange {
                    name: name.to_string(),
                    value,
                    min: 0.0,
                    max: f64::INFINITY,
                });
            }
        }
        Ok(())
    }
}

fn check_monotonic(depths: &[f64], start_depth: f64) -> ParameterResult<()> {
    if depths.is_empty() {
        return Err(ParameterError::InvalidDepths("no depths".to_string()));
    }
    let mut previous = start_depth;
    for (i, depth) in depths.iter().enumerate() {
        if !depth.is_finite() {
            return Err(ParameterError::InvalidDepths(format!("depth {} is not finite", i)));
        }
        if i > 0 && *depth >= previous {
            return Err(ParameterError::InvalidDepths(format!(
                "depth {} ({}) does not descend from {}",
                i, depth, previous
            )));
        }
        previous = *depth;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_equal_layers() {
        let d = DepthParams::new(5.0, 1.0, 0.0, 1.0, -3.0);
        assert!(approx(&d.depths().unwrap(), &[-1.0, -2.0, -3.0]));
    }

    #[test]
    fn test_layers_are_evened_out() {
        let d = DepthParams::new(5.0, 1.0, 0.0, 2.0, -5.0);
        assert!(approx(&d.depths().unwrap(), &[-5.0 / 3.0, -10.0 / 3.0, -5.0]));
    }

    #[test]
    fn test_finish_layer() {
        let mut d = DepthParams::new(5.0, 1.0, 0.0, 2.0, -4.0);
        d.z_finish_depth = 0.5;
        assert!(approx(&d.depths().unwrap(), &[-1.75, -3.5, -4.0]));
    }

    #[test]
    fn test_single_shallow_layer() {
        let d = DepthParams::new(5.0, 1.0, 0.0, 3.0, -0.5);
        assert!(approx(&d.depths().unwrap(), &[-0.5]));
    }

    #[test]
    fn test_user_depths_override() {
        let mut d = DepthParams::default();
        d.user_depths = Some(vec![-0.5, -2.0, -2.5]);
        assert!(approx(&d.depths().unwrap(), &[-0.5, -2.0, -2.5]));
    }

    #[test]
    fn test_rejects_bad_schedules() {
        let d = DepthParams::new(5.0, 1.0, 0.0, 0.0, -3.0);
        assert!(matches!(d.depths(), Err(ParameterError::OutOfRange { .. })));

        let d = DepthParams::new(5.0, 1.0, 0.0, 1.0, 1.0);
        assert!(matches!(d.depths(), Err(ParameterError::InvalidDepths(_))));

        let mut d = DepthParams::default();
        d.user_depths = Some(vec![]);
        assert!(matches!(d.depths(), Err(ParameterError::InvalidDepths(_))));

        d.user_depths = Some(vec![-1.0, -0.5]);
        assert!(matches!(d.depths(), Err(ParameterError::InvalidDepths(_))));

        let d = DepthParams::new(f64::NAN, 1.0, 0.0, 1.0, -1.0);
        assert!(matches!(d.depths(), Err(ParameterError::InvalidValue { .. })));
    }
}
