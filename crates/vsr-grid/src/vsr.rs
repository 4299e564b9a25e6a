//! The grid voxel robot and its sensing/actuation loop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;
use vsr_core::{
    Action, ActionError, ActionKind, ActionOutcome, ActionPerformer, Agent, AnchorId, BodyId,
    DoubleRange, EmbodiedAgent, LinkType, Point, RangedValues,
};

use crate::{Grid, GridBody, GridError, Key};

/// Range every sensor reading is normalized into before it reaches a brain.
pub const INPUT_RANGE: DoubleRange = DoubleRange::SYMMETRIC_UNIT;
/// Range every actuation value is clipped into.
pub const OUTPUT_RANGE: DoubleRange = DoubleRange::SYMMETRIC_UNIT;

pub const VOXEL_SIDE_LENGTH: f64 = 1.0;
pub const VOXEL_MASS: f64 = 1.0;

/// Input and output buffers of one brain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrainIo {
    pub inputs: RangedValues,
    pub outputs: RangedValues,
}

/// Turns per-cell sensor readings into per-cell actuation values.
pub trait ActuationController: 'static {
    /// `inputs` holds the normalized readings of every occupied cell; write
    /// one actuation value per occupied cell into `outputs`. Values are
    /// clipped afterwards.
    fn compute(&mut self, t: f64, inputs: &Grid<Vec<f64>>, outputs: &mut Grid<f64>);

    fn brain_ios(&self) -> Vec<BrainIo>;

    /// Fails unless `body` has the shape and per-cell sensor counts this
    /// controller was built for. `compute` relies on it.
    fn check_layout(&self, body: &GridBody) -> Result<(), GridError>;
}

/// A voxel robot whose cells sense, think through an [`ActuationController`]
/// and actuate.
pub struct NumGridVsr<C> {
    body: GridBody,
    side_length: f64,
    mass: f64,
    voxels: Grid<BodyId>,
    inputs: Grid<Vec<f64>>,
    outputs: Grid<f64>,
    controller: C,
}

impl<C: ActuationController> NumGridVsr<C> {
    pub fn new(body: GridBody, controller: C) -> Result<Self, GridError> {
        Self::with_voxels(body, controller, VOXEL_SIDE_LENGTH, VOXEL_MASS)
    }

    /// Fails if `controller` was built for a different body layout.
    pub fn with_voxels(body: GridBody, controller: C, side_length: f64, mass: f64) -> Result<Self, GridError> {
        controller.check_layout(&body)?;
        let inputs = body.cells().map(|_, c| Some(vec![0.0; c.sensors.len()]));
        let outputs = body.cells().map(|_, _| Some(0.0));
        let voxels = Grid::new(body.w(), body.h());
        Ok(Self {
            body,
            side_length,
            mass,
            voxels,
            inputs,
            outputs,
            controller,
        })
    }

    pub fn body(&self) -> &GridBody {
        &self.body
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn voxels(&self) -> &Grid<BodyId> {
        &self.voxels
    }

    /// Normalized sensor readings per cell, as of the last `act`.
    pub fn inputs(&self) -> &Grid<Vec<f64>> {
        &self.inputs
    }

    /// Clipped actuation values per cell, as of the last `act`.
    pub fn outputs(&self) -> &Grid<f64> {
        &self.outputs
    }

    pub fn brain_ios(&self) -> Vec<BrainIo> {
        self.controller.brain_ios()
    }

    /// Consume the sense outcomes of the previous tick, one per input slot,
    /// in cell order then slot order.
    fn ingest(&mut self, previous: &[ActionOutcome]) {
        let mut readings = previous.iter().filter_map(|o| {
            let sense = o.action.sense()?;
            Some(INPUT_RANGE.denormalize(sense.range().normalize(o.scalar().unwrap_or(0.0))))
        });
        let keys: Vec<Key> = self.inputs.occupied().map(|(k, _)| k).collect();
        for key in keys {
            let Some(slots) = self.inputs.get_mut(key) else {
                continue;
            };
            for slot in slots.iter_mut() {
                match readings.next() {
                    Some(value) => *slot = value,
                    None => return,
                }
            }
        }
    }

    fn emit(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        for (key, &voxel) in self.voxels.occupied() {
            if let Some(cell) = self.body.cells().get(key) {
                actions.extend(cell.sensors.iter().map(|s| s.to_action(voxel)));
            }
            actions.push(Action::ActuateVoxel {
                voxel,
                value: self.outputs.get(key).copied().unwrap_or(0.0),
            });
        }
        actions
    }
}

impl<C: ActuationController> Agent for NumGridVsr<C> {
    fn act(&mut self, t: f64, previous: &[ActionOutcome]) -> Vec<Action> {
        self.ingest(previous);
        self.controller.compute(t, &self.inputs, &mut self.outputs);
        let keys: Vec<Key> = self.outputs.occupied().map(|(k, _)| k).collect();
        for key in keys {
            if let Some(value) = self.outputs.get_mut(key) {
                *value = OUTPUT_RANGE.clip(*value);
            }
        }
        self.emit()
    }

    fn body_parts(&self) -> Vec<BodyId> {
        self.voxels.values().copied().collect()
    }
}

impl<C: ActuationController> EmbodiedAgent for NumGridVsr<C> {
    /// Create one voxel per occupied cell at `(x, y) * side`, then weld each
    /// voxel to its right and upper neighbours.
    fn assemble(&mut self, performer: &mut dyn ActionPerformer) -> Result<(), ActionError> {
        let cells: Vec<(Key, vsr_core::Material)> =
            self.body.cells().occupied().map(|(k, c)| (k, c.material)).collect();
        for (key, material) in cells {
            let voxel = performer
                .perform(
                    Action::CreateAndTranslateVoxel {
                        side_length: self.side_length,
                        mass: self.mass,
                        material,
                        position: Point::new(key.x as f64, key.y as f64) * self.side_length,
                    },
                    None,
                )?
                .body()
                .ok_or_else(|| ActionError::Undoable {
                    kind: ActionKind::CreateAndTranslateVoxel,
                    cause: format!("no voxel created for cell {key}"),
                })?;
            self.voxels.set(key, Some(voxel));
        }

        let placed: Vec<(Key, BodyId)> = self.voxels.occupied().map(|(k, v)| (k, *v)).collect();
        for (key, voxel) in placed {
            // Right side: bottom-right and top-right corners.
            if let Some(&right) = self.voxels.get(key.translated(1, 0)) {
                for index in [1, 2] {
                    attach(performer, AnchorId::new(voxel, index), right)?;
                }
            }
            // Top side: top-right and top-left corners.
            if let Some(&up) = self.voxels.get(key.translated(0, 1)) {
                for index in [2, 3] {
                    attach(performer, AnchorId::new(voxel, index), up)?;
                }
            }
        }
        debug!(voxels = self.voxels.count(), "grid body assembled");
        Ok(())
    }
}

fn attach(performer: &mut dyn ActionPerformer, anchor: AnchorId, anchorable: BodyId) -> Result<(), ActionError> {
    performer.perform(
        Action::AttachAnchor {
            anchor,
            anchorable,
            link_type: LinkType::Rigid,
        },
        None,
    )?;
    Ok(())
}
