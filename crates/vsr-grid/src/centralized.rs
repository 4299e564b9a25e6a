use vsr_core::RangedValues;

use crate::{ActuationController, BrainIo, Grid, GridBody, GridError, TimedRealFunction, INPUT_RANGE, OUTPUT_RANGE};

/// A single brain for the whole body.
///
/// Input is every cell's readings concatenated in x-major cell order; output
/// is one actuation value per occupied cell, in the same order.
pub struct CentralizedController {
    function: Box<dyn TimedRealFunction>,
    input: Vec<f64>,
    output: Vec<f64>,
}

impl CentralizedController {
    pub fn new(body: &GridBody, function: Box<dyn TimedRealFunction>) -> Result<Self, GridError> {
        let n_inputs = body.total_sensors();
        let n_outputs = body.cells().count();
        function.check_dimension(n_inputs, n_outputs)?;
        Ok(Self {
            function,
            input: vec![0.0; n_inputs],
            output: vec![0.0; n_outputs],
        })
    }
}

impl ActuationController for CentralizedController {
    fn compute(&mut self, t: f64, inputs: &Grid<Vec<f64>>, outputs: &mut Grid<f64>) {
        let mut offset = 0;
        for sensed in inputs.values() {
            let end = (offset + sensed.len()).min(self.input.len());
            self.input[offset..end].copy_from_slice(&sensed[..end - offset]);
            offset = end;
        }
        self.function.apply(t, &self.input, &mut self.output);
        let keys: Vec<_> = outputs.occupied().map(|(k, _)| k).collect();
        for (key, value) in keys.into_iter().zip(&self.output) {
            outputs.set(key, Some(*value));
        }
    }

    fn check_layout(&self, body: &GridBody) -> Result<(), GridError> {
        let expected_inputs = body.total_sensors();
        let expected_outputs = body.cells().count();
        if self.input.len() != expected_inputs || self.output.len() != expected_outputs {
            return Err(GridError::DimensionMismatch {
                cell: None,
                expected_inputs,
                expected_outputs,
                found_inputs: self.input.len(),
                found_outputs: self.output.len(),
            });
        }
        Ok(())
    }

    fn brain_ios(&self) -> Vec<BrainIo> {
        vec![BrainIo {
            inputs: RangedValues::new(self.input.clone(), INPUT_RANGE),
            outputs: RangedValues::new(self.output.clone(), OUTPUT_RANGE),
        }]
    }
}
