//! One brain per cell, talking to its four neighbours with one tick of delay.

use vsr_core::RangedValues;

use crate::{
    ActuationController, BrainIo, Grid, GridBody, GridError, TimedRealFunction, INPUT_RANGE,
    OUTPUT_RANGE,
};

/// Per-cell brains exchanging signals with their N, E, S and W neighbours.
///
/// A cell's brain sees `sensors ⊕ N ⊕ E ⊕ S ⊕ W`, each neighbour block
/// `n_signals` wide, and produces `1 + k·n_signals` values: the actuation
/// followed by outgoing signals, with `k = 4` when `directional` and `k = 1`
/// otherwise. Signals read at tick `t` were written at tick `t - 1`; absent
/// or out-of-grid neighbours read as zeros.
pub struct DistributedController {
    functions: Grid<Box<dyn TimedRealFunction>>,
    n_signals: usize,
    directional: bool,
    signals: Grid<Vec<f64>>,
    full_inputs: Grid<Vec<f64>>,
    full_outputs: Grid<Vec<f64>>,
}

impl DistributedController {
    /// Check every occupied cell has a brain of the right arity and allocate
    /// the buffers. Nothing is checked per tick.
    pub fn new(
        body: &GridBody,
        functions: Grid<Box<dyn TimedRealFunction>>,
        n_signals: usize,
        directional: bool,
    ) -> Result<Self, GridError> {
        if !functions.same_shape(body.cells()) {
            return Err(GridError::ShapeMismatch {
                expected_w: body.w(),
                expected_h: body.h(),
                found_w: functions.w(),
                found_h: functions.h(),
            });
        }
        let communication = Self::communication_size(n_signals, directional);
        for (key, cell) in body.cells().occupied() {
            let function = functions.get(key).ok_or(GridError::MissingFunction { cell: key })?;
            function.check_dimension_at(Some(key), cell.sensors.len() + 4 * n_signals, 1 + communication)?;
        }
        Ok(Self {
            signals: body.cells().map(|_, _| Some(vec![0.0; communication])),
            full_inputs: body
                .cells()
                .map(|_, c| Some(vec![0.0; c.sensors.len() + 4 * n_signals])),
            full_outputs: body.cells().map(|_, _| Some(vec![0.0; 1 + communication])),
            functions,
            n_signals,
            directional,
        })
    }

    fn communication_size(n_signals: usize, directional: bool) -> usize {
        if directional {
            4 * n_signals
        } else {
            n_signals
        }
    }

    pub fn n_signals(&self) -> usize {
        self.n_signals
    }

    pub fn directional(&self) -> bool {
        self.directional
    }

    /// Outgoing signals of every cell, as produced by the last `compute`.
    pub fn signals(&self) -> &Grid<Vec<f64>> {
        &self.signals
    }

    pub fn full_inputs(&self) -> &Grid<Vec<f64>> {
        &self.full_inputs
    }
}

impl ActuationController for DistributedController {
    fn compute(&mut self, t: f64, inputs: &Grid<Vec<f64>>, outputs: &mut Grid<f64>) {
        let ns = self.n_signals;

        // Assemble sensed values and last tick's neighbour signals.
        for (key, sensed) in inputs.occupied() {
            let Some(full) = self.full_inputs.get_mut(key) else {
                continue;
            };
            full[..sensed.len()].copy_from_slice(sensed);
            for (direction, neighbour) in key.neighbours().into_iter().enumerate() {
                let start = sensed.len() + direction * ns;
                let block = &mut full[start..start + ns];
                match self.signals.get(neighbour) {
                    Some(signals) if self.directional => {
                        block.copy_from_slice(&signals[direction * ns..(direction + 1) * ns])
                    }
                    Some(signals) => block.copy_from_slice(signals),
                    None => block.fill(0.0),
                }
            }
        }

        for (key, full) in self.full_inputs.occupied() {
            if let (Some(function), Some(out)) = (self.functions.get(key), self.full_outputs.get_mut(key)) {
                function.apply(t, full, out);
            }
        }

        // Split actuation and the signals neighbours read next tick.
        for (key, out) in self.full_outputs.occupied() {
            if let Some(value) = outputs.get_mut(key) {
                *value = out[0];
            }
            if let Some(signals) = self.signals.get_mut(key) {
                signals.copy_from_slice(&out[1..]);
            }
        }
    }

    fn check_layout(&self, body: &GridBody) -> Result<(), GridError> {
        if !self.full_inputs.same_shape(body.cells()) {
            return Err(GridError::ShapeMismatch {
                expected_w: body.w(),
                expected_h: body.h(),
                found_w: self.full_inputs.w(),
                found_h: self.full_inputs.h(),
            });
        }
        let communication = Self::communication_size(self.n_signals, self.directional);
        for (key, cell) in body.cells().occupied() {
            let (Some(inputs), Some(outputs)) = (self.full_inputs.get(key), self.full_outputs.get(key)) else {
                return Err(GridError::MissingFunction { cell: key });
            };
            let expected_inputs = cell.sensors.len() + 4 * self.n_signals;
            if inputs.len() != expected_inputs || outputs.len() != 1 + communication {
                return Err(GridError::DimensionMismatch {
                    cell: Some(key),
                    expected_inputs,
                    expected_outputs: 1 + communication,
                    found_inputs: inputs.len(),
                    found_outputs: outputs.len(),
                });
            }
        }
        Ok(())
    }

    fn brain_ios(&self) -> Vec<BrainIo> {
        self.full_inputs
            .occupied()
            .filter_map(|(key, inputs)| {
                let outputs = self.full_outputs.get(key)?;
                Some(BrainIo {
                    inputs: RangedValues::new(inputs.clone(), INPUT_RANGE),
                    outputs: RangedValues::new(outputs.clone(), OUTPUT_RANGE),
                })
            })
            .collect()
    }
}
