//! Linear mapping between the backend computation scale and the quantized
//! front scale shown to users.

use serde::{Deserialize, Serialize};

use super::config::MapperConfig;
use super::error::MapperError;
use super::types::{ScaleKind, ScaleValues};

/// Decimal digits kept before mapping back to the front scale.
const BACK_ROUNDING: f64 = 1e5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Affine {
    slope: f64,
    intercept: f64,
}

impl Affine {
    fn between(from: (f64, f64), to: (f64, f64)) -> Self {
        let slope = (to.1 - to.0) / (from.1 - from.0);
        Self {
            slope,
            intercept: to.0 - slope * from.0,
        }
    }

    fn apply(&self, x: f64) -> f64 {
        x * self.slope + self.intercept
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleMapper {
    front_bounds: (f64, f64),
    front_values: Vec<f64>,
    back_bounds: (f64, f64),
    f2b: Affine,
    b2f: Affine,
}

impl Default for ScaleMapper {
    fn default() -> Self {
        Self::build(&MapperConfig::default())
    }
}

impl ScaleMapper {
    pub fn new(config: &MapperConfig) -> Result<Self, MapperError> {
        if config.front_values < 2 {
            return Err(MapperError::TooFewFrontValues(config.front_values));
        }
        check_bounds("front", config.front_low, config.front_high)?;
        check_bounds("back", config.back_low, config.back_high)?;

        Ok(Self::build(config))
    }

    fn build(config: &MapperConfig) -> Self {
        let front_bounds = (config.front_low, config.front_high);
        let back_bounds = (config.back_low, config.back_high);
        Self {
            front_bounds,
            front_values: linspace(front_bounds.0, front_bounds.1, config.front_values),
            back_bounds,
            f2b: Affine::between(front_bounds, back_bounds),
            b2f: Affine::between(back_bounds, front_bounds),
        }
    }

    pub fn front_bounds(&self) -> (f64, f64) {
        self.front_bounds
    }

    pub fn back_bounds(&self) -> (f64, f64) {
        self.back_bounds
    }

    /// The discrete values a front-scale result can take, ascending.
    pub fn front_values(&self) -> &[f64] {
        &self.front_values
    }

    pub fn front_to_back(&self, x: impl Into<ScaleValues>) -> ScaleValues {
        let x = x.into();
        if out_of_bounds(&x, self.front_bounds) {
            tracing::warn!(
                values = ?x.as_slice(),
                low = self.front_bounds.0,
                high = self.front_bounds.1,
                "values converted to the back scale lie beyond the front scale bounds"
            );
        }
        x.map(|v| self.to_back(v))
    }

    pub fn back_to_front(&self, x: impl Into<ScaleValues>) -> ScaleValues {
        let x = x.into().map(round_back);
        if out_of_bounds(&x, self.back_bounds) {
            tracing::warn!(
                values = ?x.as_slice(),
                low = self.back_bounds.0,
                high = self.back_bounds.1,
                "values converted to the front scale lie beyond the back scale bounds"
            );
        }
        x.map(|v| self.to_front(v))
    }

    pub fn front_to_back_value(&self, x: f64) -> f64 {
        match self.front_to_back(x) {
            ScaleValues::Scalar(y) => y,
            ScaleValues::Sequence(ys) => ys.first().copied().unwrap_or(f64::NAN),
        }
    }

    pub fn back_to_front_value(&self, x: f64) -> f64 {
        match self.back_to_front(x) {
            ScaleValues::Scalar(y) => y,
            ScaleValues::Sequence(ys) => ys.first().copied().unwrap_or(f64::NAN),
        }
    }

    /// Classify values as belonging to the back or the front range.
    ///
    /// A sequence is judged by its extremes: the low end votes on the left
    /// bounds, the high end on the right bounds, and the votes must agree.
    /// A scalar votes only where it falls outside the overlap of both ranges;
    /// a scalar inside the overlap (or outside on both sides) is ambiguous.
    pub fn which_scale(&self, x: impl Into<ScaleValues>) -> Option<ScaleKind> {
        let x = x.into();
        let (back, front) = (self.back_bounds, self.front_bounds);

        let left_widest = if back.0 <= front.0 { ScaleKind::Back } else { ScaleKind::Front };
        let left_tightest = if back.0 >= front.0 { ScaleKind::Back } else { ScaleKind::Front };
        let right_widest = if back.1 >= front.1 { ScaleKind::Back } else { ScaleKind::Front };
        let right_tightest = if back.1 <= front.1 { ScaleKind::Back } else { ScaleKind::Front };
        let inner_low = back.0.max(front.0);
        let inner_high = back.1.min(front.1);

        let verdict = match &x {
            ScaleValues::Scalar(v) => {
                let left = (*v < inner_low).then_some(left_widest);
                let right = (*v > inner_high).then_some(right_widest);
                match (left, right) {
                    (Some(kind), None) | (None, Some(kind)) => Some(kind),
                    _ => None,
                }
            }
            ScaleValues::Sequence(_) => x.extent().and_then(|(low, top)| {
                let left = if low < inner_low { left_widest } else { left_tightest };
                let right = if top > inner_high { right_widest } else { right_tightest };
                (left == right).then_some(left)
            }),
        };

        if verdict.is_none() {
            tracing::warn!(values = ?x.as_slice(), "values to be classified are ambiguous");
        }
        verdict
    }

    /// Integer front-scale points expressed on the back scale, ascending.
    pub fn checkpoints(&self) -> Vec<f64> {
        let first = self.front_bounds.0.ceil() as i64;
        let last = self.front_bounds.1.floor() as i64;
        let points: Vec<f64> = if last > first {
            (first..=last).map(|v| v as f64).collect()
        } else {
            vec![self.front_bounds.0, self.front_bounds.1]
        };
        self.front_to_back(points).into_vec()
    }

    fn to_back(&self, x: f64) -> f64 {
        self.f2b.apply(x).clamp(self.back_bounds.0, self.back_bounds.1)
    }

    fn to_front(&self, x: f64) -> f64 {
        let y = self.b2f.apply(x);
        let mut closest = 0;
        for (i, v) in self.front_values.iter().enumerate() {
            if (v - y).abs() < (self.front_values[closest] - y).abs() {
                closest = i;
            }
        }
        self.front_values[closest]
    }
}

fn check_bounds(scale: &'static str, low: f64, high: f64) -> Result<(), MapperError> {
    if low.is_finite() && high.is_finite() && low < high {
        Ok(())
    } else {
        Err(MapperError::InvalidBounds { scale, low, high })
    }
}

fn out_of_bounds(x: &ScaleValues, bounds: (f64, f64)) -> bool {
    match x.extent() {
        Some((min, max)) => min < bounds.0 || max > bounds.1,
        None => false,
    }
}

fn round_back(x: f64) -> f64 {
    (x * BACK_ROUNDING).round() / BACK_ROUNDING
}

pub(crate) fn linspace(low: f64, high: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { high } else { low + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ScaleMapper {
        ScaleMapper::new(&MapperConfig::default()).unwrap()
    }

    #[test]
    fn test_front_bounds_map_to_back_bounds() {
        let m = mapper();
        assert!((m.front_to_back_value(1.0) + 100.0).abs() < 1e-9);
        assert!((m.front_to_back_value(4.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_back_to_front_quantizes() {
        let m = mapper();
        assert_eq!(m.front_values(), &[1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
        assert_eq!(m.back_to_front_value(0.0), 2.5);
        assert_eq!(m.back_to_front_value(-100.0), 1.0);
        assert_eq!(m.back_to_front_value(100.0), 4.0);
        assert_eq!(m.back_to_front_value(30.0), 3.0);
    }

    #[test]
    fn test_quantization_tie_goes_to_lower_value() {
        let m = ScaleMapper::new(&MapperConfig {
            front_low: 0.0,
            front_high: 4.0,
            front_values: 5,
            back_low: -2.0,
            back_high: 2.0,
        })
        .unwrap();
        // -1.5 maps to 0.5, halfway between 0 and 1
        assert_eq!(m.back_to_front_value(-1.5), 0.0);
        assert_eq!(m.back_to_front_value(1.5), 3.0);
    }

    #[test]
    fn test_front_to_back_clamps_out_of_range() {
        let m = mapper();
        assert_eq!(m.front_to_back_value(5.0), 100.0);
        assert_eq!(m.front_to_back_value(0.0), -100.0);
    }

    #[test]
    fn test_sequences_keep_shape() {
        let m = mapper();
        let back = m.front_to_back(vec![1.0, 2.5, 4.0]);
        let values = back.as_slice();
        assert_eq!(values.len(), 3);
        assert!((values[1]).abs() < 1e-9);
        let front = m.back_to_front(vec![-100.0, 0.0, 100.0]);
        assert_eq!(front, ScaleValues::Sequence(vec![1.0, 2.5, 4.0]));
    }

    #[test]
    fn test_which_scale_sequences() {
        let m = mapper();
        assert_eq!(m.which_scale(vec![-80.0, 50.0]), Some(ScaleKind::Back));
        assert_eq!(m.which_scale(vec![1.0, 3.5]), Some(ScaleKind::Front));
        assert_eq!(m.which_scale(vec![-50.0, 3.0]), None);
        assert_eq!(m.which_scale(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_which_scale_scalars() {
        let m = mapper();
        assert_eq!(m.which_scale(50.0), Some(ScaleKind::Back));
        assert_eq!(m.which_scale(-50.0), Some(ScaleKind::Back));
        // inside the overlap of both ranges
        assert_eq!(m.which_scale(2.0), None);
    }

    #[test]
    fn test_checkpoints() {
        let m = mapper();
        let cps = m.checkpoints();
        assert_eq!(cps.len(), 4);
        assert!((cps[0] + 100.0).abs() < 1e-9);
        assert!((cps[1] + 100.0 / 3.0).abs() < 1e-9);
        assert!((cps[3] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_construction() {
        let mut config = MapperConfig::default();
        config.front_values = 1;
        assert_eq!(
            ScaleMapper::new(&config).unwrap_err(),
            MapperError::TooFewFrontValues(1)
        );
        let mut config = MapperConfig::default();
        config.back_low = 100.0;
        assert!(matches!(
            ScaleMapper::new(&config),
            Err(MapperError::InvalidBounds { scale: "back", .. })
        ));
    }
}
