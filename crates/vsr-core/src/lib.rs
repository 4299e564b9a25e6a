//! Deterministic action-dispatch kernel for voxel-based soft robots.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod agent;
pub mod anchor;
pub mod body;
mod composite;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod range;
pub mod sense;
pub mod snapshot;
pub mod solvers;
pub mod substrate;

pub use action::{Action, ActionKind, ActionOutcome, ActionValue, LinkOutcome, SenseAction, SenseKind};
pub use agent::{Agent, AgentId, EmbodiedAgent};
pub use anchor::{Link, LinkType};
pub use body::{Anchor, AnchorId, Body, BodyId, BodyKind, BodyRegistry, JointState, Material, Motor, VoxelState};
pub use config::EngineConfig;
pub use engine::{ActionPerformer, Engine, Solver, SolverRegistry};
pub use error::{ActionError, TickError};
pub use geometry::{BoundingBox, Point, Poly};
pub use range::{DoubleRange, RangedValue, RangedValues};
pub use snapshot::{ActionFailure, AgentSummary, NfcMessage, Snapshot};
pub use substrate::Substrate;
