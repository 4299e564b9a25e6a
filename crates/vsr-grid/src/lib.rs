//! Grid-organized voxel robots on top of the `vsr-core` kernel.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod body;
pub mod centralized;
pub mod distributed;
pub mod error;
pub mod function;
pub mod grid;
pub mod sensor;
pub mod shape;
pub mod vsr;

pub use body::{CellSpec, GridBody};
pub use centralized::CentralizedController;
pub use distributed::DistributedController;
pub use error::GridError;
pub use function::{ConstantFunction, FnFunction, SinusoidalFunction, TimedRealFunction};
pub use grid::{Grid, Key};
pub use sensor::Sensor;
pub use shape::{GridShape, MAX_SHAPE_CELLS, SHAPE_NAMES};
pub use vsr::{
    ActuationController, BrainIo, NumGridVsr, INPUT_RANGE, OUTPUT_RANGE, VOXEL_MASS, VOXEL_SIDE_LENGTH,
};
