//! Scenario files: engine and substrate settings, terrain, and robots.

use std::f64::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vsr_core::{Action, ActionPerformer, AgentId, BodyId, Engine, EngineConfig, Material, Point, Poly};
use vsr_grid::{
    CentralizedController, ConstantFunction, DistributedController, FnFunction, GridBody, GridShape,
    NumGridVsr, Sensor, SinusoidalFunction, TimedRealFunction,
};
use vsr_kinematic::{KinematicConfig, KinematicSubstrate};

/// A complete simulation setup, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Kernel settings (time step, dispatch depth, transactional mode)
    pub engine: EngineConfig,

    /// Reference physics settings
    pub substrate: KinematicConfig,

    /// Ticks to run when the command line does not say otherwise
    #[serde(default = "default_ticks")]
    pub ticks: usize,

    pub terrain: Terrain,

    pub robots: Vec<RobotSpec>,
}

fn default_ticks() -> usize {
    600
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            substrate: KinematicConfig::default(),
            ticks: default_ticks(),
            terrain: Terrain::default(),
            robots: vec![RobotSpec::default()],
        }
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(content).context("Failed to parse scenario YAML")?;
        for (i, robot) in scenario.robots.iter().enumerate() {
            GridShape::parse(&robot.shape).with_context(|| format!("robot {i}"))?;
        }
        Ok(scenario)
    }

    /// Build the engine, lay down the terrain and add every robot.
    pub fn build(&self) -> Result<(Engine<KinematicSubstrate>, Vec<AgentId>)> {
        let mut engine = Engine::new(KinematicSubstrate::new(self.substrate), self.engine);
        let ground = self.substrate.ground_level.unwrap_or(0.0);
        for poly in self.terrain.polys(ground) {
            let outcome = engine
                .perform(Action::CreateUnmovableBody { poly }, None)
                .context("Failed to create terrain")?;
            if let Some(body) = outcome.body() {
                tracing::debug!(body = %body, "Terrain body created");
            }
        }
        let mut agents = Vec::with_capacity(self.robots.len());
        for (i, robot) in self.robots.iter().enumerate() {
            let agent = robot.spawn(&mut engine).with_context(|| format!("Failed to add robot {i}"))?;
            tracing::info!(agent = %agent, shape = %robot.shape, "Robot added");
            agents.push(agent);
        }
        Ok((engine, agents))
    }
}

/// Static scenery, created as unmovable bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Terrain {
    /// A slab whose top face is the ground level, centered on `x = 0`.
    Flat {
        #[serde(default = "default_terrain_width")]
        width: f64,
        #[serde(default = "default_terrain_thickness")]
        thickness: f64,
    },
    /// Arbitrary polygons in world coordinates.
    Polys { polys: Vec<Poly> },
    None,
}

fn default_terrain_width() -> f64 {
    200.0
}
fn default_terrain_thickness() -> f64 {
    1.0
}

impl Default for Terrain {
    fn default() -> Self {
        Terrain::Flat {
            width: default_terrain_width(),
            thickness: default_terrain_thickness(),
        }
    }
}

impl Terrain {
    fn polys(&self, ground: f64) -> Vec<Poly> {
        match self {
            Terrain::Flat { width, thickness } => {
                vec![Poly::rect(*width, *thickness).translated(Point::new(-width / 2.0, ground - thickness))]
            }
            Terrain::Polys { polys } => polys.clone(),
            Terrain::None => Vec::new(),
        }
    }
}

/// One grid robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotSpec {
    /// Named shape (`biped-4x3`) or layout (`###/#.#`)
    #[serde(default = "default_shape")]
    pub shape: String,

    /// Sensors placed on every cell
    #[serde(default = "default_sensors")]
    pub sensors: Vec<Sensor>,

    pub material: Material,

    pub controller: ControllerSpec,

    /// Lower-left corner of the assembled body
    pub position: Option<Point>,
}

fn default_shape() -> String {
    "biped-4x3".to_string()
}
fn default_sensors() -> Vec<Sensor> {
    vec![Sensor::AreaRatio]
}

impl Default for RobotSpec {
    fn default() -> Self {
        Self {
            shape: default_shape(),
            sensors: default_sensors(),
            material: Material::default(),
            controller: ControllerSpec::default(),
            position: None,
        }
    }
}

impl RobotSpec {
    pub fn body(&self) -> Result<GridBody> {
        let shape = GridShape::parse(&self.shape)?;
        Ok(GridBody::uniform(&shape, self.material, &self.sensors))
    }

    fn spawn(&self, engine: &mut Engine<KinematicSubstrate>) -> Result<AgentId> {
        let body = self.body()?;
        let agent = match self.controller {
            ControllerSpec::Constant {
                value,
                n_signals,
                directional,
            } => {
                let n_outputs = 1 + if directional { 4 * n_signals } else { n_signals };
                let functions = body.cells().map(|_, cell| {
                    let n_inputs = cell.sensors.len() + 4 * n_signals;
                    Some(Box::new(ConstantFunction::new(n_inputs, vec![value; n_outputs])) as Box<dyn TimedRealFunction>)
                });
                let controller = DistributedController::new(&body, functions, n_signals, directional)?;
                engine.add_embodied_agent(NumGridVsr::new(body, controller)?, self.position)?
            }
            ControllerSpec::Sinusoidal {
                amplitude,
                frequency,
                phase_step,
                n_signals,
                directional,
            } => {
                let n_outputs = 1 + if directional { 4 * n_signals } else { n_signals };
                let functions = body.cells().map(|key, cell| {
                    Some(Box::new(SinusoidalFunction {
                        n_inputs: cell.sensors.len() + 4 * n_signals,
                        n_outputs,
                        amplitude,
                        frequency,
                        phase: key.x as f64 * phase_step,
                    }) as Box<dyn TimedRealFunction>)
                });
                let controller = DistributedController::new(&body, functions, n_signals, directional)?;
                engine.add_embodied_agent(NumGridVsr::new(body, controller)?, self.position)?
            }
            ControllerSpec::Centralized {
                amplitude,
                frequency,
                phase_step,
            } => {
                let phases: Vec<f64> = body.cells().occupied().map(|(k, _)| k.x as f64 * phase_step).collect();
                let function = FnFunction::new(body.total_sensors(), phases.len(), move |t, _, out| {
                    for (o, phase) in out.iter_mut().zip(&phases) {
                        *o = amplitude * (2.0 * PI * frequency * t + phase).sin();
                    }
                });
                let controller = CentralizedController::new(&body, Box::new(function))?;
                engine.add_embodied_agent(NumGridVsr::new(body, controller)?, self.position)?
            }
        };
        Ok(agent)
    }
}

/// Brain wiring for a robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerSpec {
    /// Distributed, every output fixed.
    Constant {
        #[serde(default)]
        value: f64,
        #[serde(default)]
        n_signals: usize,
        #[serde(default)]
        directional: bool,
    },
    /// Distributed open-loop gait, phase shifted along x.
    Sinusoidal {
        #[serde(default = "default_amplitude")]
        amplitude: f64,
        #[serde(default = "default_frequency")]
        frequency: f64,
        #[serde(default = "default_phase_step")]
        phase_step: f64,
        #[serde(default)]
        n_signals: usize,
        #[serde(default)]
        directional: bool,
    },
    /// One brain driving the same gait for the whole body.
    Centralized {
        #[serde(default = "default_amplitude")]
        amplitude: f64,
        #[serde(default = "default_frequency")]
        frequency: f64,
        #[serde(default = "default_phase_step")]
        phase_step: f64,
    },
}

fn default_amplitude() -> f64 {
    1.0
}
fn default_frequency() -> f64 {
    1.0
}
fn default_phase_step() -> f64 {
    PI / 2.0
}

impl Default for ControllerSpec {
    fn default() -> Self {
        ControllerSpec::Sinusoidal {
            amplitude: default_amplitude(),
            frequency: default_frequency(),
            phase_step: default_phase_step(),
            n_signals: 0,
            directional: false,
        }
    }
}

/// Average center of a robot's voxels, if any are left.
pub fn robot_center(snapshot: &vsr_core::Snapshot, parts: &[BodyId]) -> Option<Point> {
    let centers: Vec<Point> = parts
        .iter()
        .filter_map(|id| snapshot.body(*id))
        .map(|body| body.center())
        .collect();
    Point::average(&centers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let scenario = Scenario::parse("{}").unwrap();
        assert_eq!(scenario.ticks, 600);
        assert_eq!(scenario.terrain, Terrain::default());
        assert_eq!(scenario.robots.len(), 1);
        assert_eq!(scenario.robots[0].shape, "biped-4x3");
        assert_eq!(scenario.engine.max_dispatch_depth, EngineConfig::default().max_dispatch_depth);
    }

    #[test]
    fn robots_and_terrain_parse() {
        let yaml = r###"
ticks: 10
engine:
  transactional: true
substrate:
  gravity: -1.0
terrain:
  type: none
robots:
  - shape: worm-3x1
    sensors:
      - type: area_ratio
      - type: velocity
        direction: 1.57
    controller:
      kind: constant
      value: 0.5
      n_signals: 1
    position: { x: 2.0, y: 1.0 }
  - shape: "##/##"
    controller:
      kind: centralized
"###;
        let scenario = Scenario::parse(yaml).unwrap();
        assert_eq!(scenario.ticks, 10);
        assert!(scenario.engine.transactional);
        assert_eq!(scenario.substrate.gravity, -1.0);
        assert_eq!(scenario.terrain, Terrain::None);
        assert_eq!(scenario.robots.len(), 2);
        assert_eq!(scenario.robots[0].sensors.len(), 2);
        assert_eq!(
            scenario.robots[0].controller,
            ControllerSpec::Constant {
                value: 0.5,
                n_signals: 1,
                directional: false
            }
        );
        assert_eq!(scenario.robots[0].position, Some(Point::new(2.0, 1.0)));
        assert_eq!(scenario.robots[1].sensors, vec![Sensor::AreaRatio]);
    }

    #[test]
    fn unknown_shape_is_rejected_on_load() {
        let err = Scenario::parse("robots:\n  - shape: octopus-3x3\n").unwrap_err();
        assert!(format!("{err:#}").contains("robot 0"));
    }

    #[test]
    fn every_controller_kind_builds() {
        let yaml = r#"
robots:
  - shape: box-2x2
    controller: { kind: constant, value: 0.1, n_signals: 2, directional: true }
    position: { x: 0.0, y: 0.0 }
  - shape: biped-3x2
    controller: { kind: sinusoidal, n_signals: 1 }
    position: { x: 10.0, y: 0.0 }
  - shape: worm-4x1
    sensors: [{ type: area_ratio }, { type: angle }]
    controller: { kind: centralized }
    position: { x: 20.0, y: 0.0 }
"#;
        let scenario = Scenario::parse(yaml).unwrap();
        let (mut engine, agents) = scenario.build().unwrap();
        assert_eq!(agents.len(), 3);
        // Ground slab plus 4 + 5 + 4 voxels.
        assert_eq!(engine.bodies().len(), 14);

        let snapshot = engine.tick().unwrap();
        assert!(snapshot.failures.is_empty());
        for summary in &snapshot.agents {
            assert!(robot_center(&snapshot, &summary.body_parts).is_some());
        }
    }
}
