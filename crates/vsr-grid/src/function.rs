//! Time-dependent real functions used as voxel brains.

use core::f64::consts::PI;
use core::fmt;

use crate::{GridError, Key};

/// A function `(t, input) -> output` with fixed arity.
///
/// `apply` writes into a caller-owned buffer of exactly `n_outputs` values.
pub trait TimedRealFunction {
    fn apply(&self, t: f64, input: &[f64], output: &mut [f64]);

    fn n_inputs(&self) -> usize;

    fn n_outputs(&self) -> usize;

    fn check_dimension(&self, n_inputs: usize, n_outputs: usize) -> Result<(), GridError> {
        self.check_dimension_at(None, n_inputs, n_outputs)
    }

    fn check_dimension_at(&self, cell: Option<Key>, n_inputs: usize, n_outputs: usize) -> Result<(), GridError> {
        if self.n_inputs() == n_inputs && self.n_outputs() == n_outputs {
            return Ok(());
        }
        Err(GridError::DimensionMismatch {
            cell,
            expected_inputs: n_inputs,
            expected_outputs: n_outputs,
            found_inputs: self.n_inputs(),
            found_outputs: self.n_outputs(),
        })
    }
}

/// Ignores its input and always returns the same values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantFunction {
    n_inputs: usize,
    values: Vec<f64>,
}

impl ConstantFunction {
    pub fn new(n_inputs: usize, values: Vec<f64>) -> Self {
        Self { n_inputs, values }
    }
}

impl TimedRealFunction for ConstantFunction {
    fn apply(&self, _t: f64, _input: &[f64], output: &mut [f64]) {
        for (o, v) in output.iter_mut().zip(&self.values) {
            *o = *v;
        }
    }

    fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    fn n_outputs(&self) -> usize {
        self.values.len()
    }
}

type ApplyFn = dyn Fn(f64, &[f64], &mut [f64]);

/// A closure with declared arity.
pub struct FnFunction {
    n_inputs: usize,
    n_outputs: usize,
    f: Box<ApplyFn>,
}

impl FnFunction {
    pub fn new(n_inputs: usize, n_outputs: usize, f: impl Fn(f64, &[f64], &mut [f64]) + 'static) -> Self {
        Self {
            n_inputs,
            n_outputs,
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for FnFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFunction")
            .field("n_inputs", &self.n_inputs)
            .field("n_outputs", &self.n_outputs)
            .finish_non_exhaustive()
    }
}

impl TimedRealFunction for FnFunction {
    fn apply(&self, t: f64, input: &[f64], output: &mut [f64]) {
        (self.f)(t, input, output)
    }

    fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    fn n_outputs(&self) -> usize {
        self.n_outputs
    }
}

/// Open-loop gait: the first output is `amplitude * sin(2π frequency t + phase)`,
/// every other output (outgoing signals) is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinusoidalFunction {
    pub n_inputs: usize,
    pub n_outputs: usize,
    pub amplitude: f64,
    pub frequency: f64,
    pub phase: f64,
}

impl TimedRealFunction for SinusoidalFunction {
    fn apply(&self, t: f64, _input: &[f64], output: &mut [f64]) {
        output.fill(0.0);
        if let Some(first) = output.first_mut() {
            *first = self.amplitude * (2.0 * PI * self.frequency * t + self.phase).sin();
        }
    }

    fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    fn n_outputs(&self) -> usize {
        self.n_outputs
    }
}
