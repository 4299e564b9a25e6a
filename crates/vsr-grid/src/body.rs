#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use vsr_core::Material;

use crate::{Grid, GridShape, Key, Sensor};

/// What goes into one occupied cell.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellSpec {
    pub material: Material,
    pub sensors: Vec<Sensor>,
}

/// Layout of a grid robot: which cells hold a voxel and what each voxel senses.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBody {
    cells: Grid<CellSpec>,
}

impl GridBody {
    pub fn new(cells: Grid<CellSpec>) -> Self {
        Self { cells }
    }

    /// Every cell of `shape` gets `material` and the sensors chosen for it.
    pub fn from_shape(shape: &GridShape, material: Material, mut sensors: impl FnMut(Key) -> Vec<Sensor>) -> Self {
        Self::new(shape.cells().map(|k, _| {
            Some(CellSpec {
                material,
                sensors: sensors(k),
            })
        }))
    }

    pub fn uniform(shape: &GridShape, material: Material, sensors: &[Sensor]) -> Self {
        Self::from_shape(shape, material, |_| sensors.to_vec())
    }

    pub fn cells(&self) -> &Grid<CellSpec> {
        &self.cells
    }

    pub fn w(&self) -> usize {
        self.cells.w()
    }

    pub fn h(&self) -> usize {
        self.cells.h()
    }

    pub fn n_sensors(&self, key: Key) -> Option<usize> {
        self.cells.get(key).map(|c| c.sensors.len())
    }

    pub fn total_sensors(&self) -> usize {
        self.cells.values().map(|c| c.sensors.len()).sum()
    }
}
