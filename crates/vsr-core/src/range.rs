#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A closed interval of admissible scalar values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DoubleRange {
    pub min: f64,
    pub max: f64,
}

impl DoubleRange {
    pub const SYMMETRIC_UNIT: DoubleRange = DoubleRange { min: -1.0, max: 1.0 };
    pub const UNIT: DoubleRange = DoubleRange { min: 0.0, max: 1.0 };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn extent(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Map `value` into `[0, 1]`, clipping anything outside the range.
    ///
    /// A degenerate range maps everything to the midpoint.
    pub fn normalize(&self, value: f64) -> f64 {
        let extent = self.extent();
        if extent <= 0.0 || !extent.is_finite() {
            return 0.5;
        }
        DoubleRange::UNIT.clip((value - self.min) / extent)
    }

    /// Inverse of [`DoubleRange::normalize`] for values in `[0, 1]`.
    pub fn denormalize(&self, value: f64) -> f64 {
        self.min + value * self.extent()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangedValue {
    pub value: f64,
    pub range: DoubleRange,
}

impl RangedValue {
    pub fn new(value: f64, range: DoubleRange) -> Self {
        Self { value, range }
    }

    /// Re-express the value in `target`, clipping it into its own range first.
    pub fn rescale(&self, target: DoubleRange) -> f64 {
        target.denormalize(self.range.normalize(self.value))
    }
}

/// A buffer of values sharing one range, e.g. a controller's inputs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangedValues {
    pub values: Vec<f64>,
    pub range: DoubleRange,
}

impl RangedValues {
    pub fn new(values: Vec<f64>, range: DoubleRange) -> Self {
        Self { values, range }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_map_to_boundaries() {
        let sensor = DoubleRange::new(-10.0, 10.0);
        let target = DoubleRange::SYMMETRIC_UNIT;
        assert_eq!(RangedValue::new(-10.0, sensor).rescale(target), -1.0);
        assert_eq!(RangedValue::new(10.0, sensor).rescale(target), 1.0);
        assert_eq!(RangedValue::new(0.0, sensor).rescale(target), 0.0);
    }

    #[test]
    fn out_of_range_is_clipped() {
        let sensor = DoubleRange::new(0.5, 1.5);
        assert_eq!(sensor.normalize(7.0), 1.0);
        assert_eq!(sensor.normalize(-7.0), 0.0);
    }

    #[test]
    fn clip_is_idempotent() {
        let r = DoubleRange::SYMMETRIC_UNIT;
        for v in [-3.0, -1.0, 0.25, 1.0, 2.0] {
            assert_eq!(r.clip(r.clip(v)), r.clip(v));
        }
        assert_eq!(r.clip(1.0), 1.0);
        assert_eq!(r.clip(-1.0), -1.0);
    }

    #[test]
    fn degenerate_range_maps_to_midpoint() {
        assert_eq!(DoubleRange::new(2.0, 2.0).normalize(2.0), 0.5);
    }
}
