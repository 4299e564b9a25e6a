//! The dispatch kernel: solver table, body registry, agents and clock.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::{
    composite, Action, ActionError, ActionFailure, ActionKind, ActionOutcome, ActionValue, Agent,
    AgentId, AgentSummary, BodyRegistry, EmbodiedAgent, EngineConfig, NfcMessage, Point, Snapshot,
    Substrate, TickError,
};

/// Performs actions on behalf of an agent.
///
/// Composite actions and agent assembly see the kernel only through this
/// trait: they can read the registry and issue further actions, nothing else.
pub trait ActionPerformer {
    fn perform(&mut self, action: Action, agent: Option<AgentId>) -> Result<ActionOutcome, ActionError>;

    fn bodies(&self) -> &BodyRegistry;

    fn t(&self) -> f64;
}

pub type Solver<S> =
    fn(&mut Engine<S>, &Action, Option<AgentId>) -> Result<Option<ActionValue>, ActionError>;

/// Maps primitive [`ActionKind`]s to their solvers.
pub struct SolverRegistry<S: Substrate> {
    solvers: BTreeMap<ActionKind, Solver<S>>,
}

impl<S: Substrate> SolverRegistry<S> {
    pub fn new() -> Self {
        Self {
            solvers: BTreeMap::new(),
        }
    }

    /// Register `solver` for `kind`, returning the one it replaces.
    pub fn register(&mut self, kind: ActionKind, solver: Solver<S>) -> Option<Solver<S>> {
        self.solvers.insert(kind, solver)
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.solvers.contains_key(&kind)
    }

    /// The solver for `kind`, falling back along its parent chain.
    pub fn resolve(&self, kind: ActionKind) -> Option<Solver<S>> {
        let mut current = Some(kind);
        while let Some(k) = current {
            if let Some(solver) = self.solvers.get(&k) {
                trace!(?kind, resolved = ?k, "solver resolved");
                return Some(*solver);
            }
            current = k.parent();
        }
        None
    }
}

impl<S: Substrate> Default for SolverRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

struct AgentSlot {
    id: AgentId,
    agent: Box<dyn Agent>,
    last_outcomes: Vec<ActionOutcome>,
}

pub struct Engine<S: Substrate> {
    config: EngineConfig,
    pub(crate) substrate: S,
    pub(crate) bodies: BodyRegistry,
    solvers: SolverRegistry<S>,
    agents: Vec<AgentSlot>,
    next_agent: u32,
    t: f64,
    depth: usize,
    performed: Vec<ActionOutcome>,
    failures: Vec<ActionFailure>,
    pub(crate) nfc_messages: Vec<NfcMessage>,
    pub(crate) last_nfc_messages: Vec<NfcMessage>,
}

impl<S: Substrate> Engine<S> {
    pub fn new(substrate: S, config: EngineConfig) -> Self {
        let mut solvers = SolverRegistry::new();
        S::register_solvers(&mut solvers);
        Self {
            config,
            substrate,
            bodies: BodyRegistry::new(),
            solvers,
            agents: Vec::new(),
            next_agent: 0,
            t: 0.0,
            depth: 0,
            performed: Vec::new(),
            failures: Vec::new(),
            nfc_messages: Vec::new(),
            last_nfc_messages: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    /// Split borrow for custom solvers that drive the substrate directly.
    pub fn parts_mut(&mut self) -> (&mut S, &mut BodyRegistry) {
        (&mut self.substrate, &mut self.bodies)
    }

    pub fn solvers_mut(&mut self) -> &mut SolverRegistry<S> {
        &mut self.solvers
    }

    /// Near-field messages emitted during the previous tick.
    pub fn last_nfc_messages(&self) -> &[NfcMessage] {
        &self.last_nfc_messages
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.id).collect()
    }

    pub fn add_agent<A: Agent>(&mut self, agent: A) -> AgentId {
        let id = AgentId(self.next_agent);
        self.next_agent += 1;
        self.agents.push(AgentSlot {
            id,
            agent: Box::new(agent),
            last_outcomes: Vec::new(),
        });
        debug!(%id, "agent added");
        id
    }

    /// Assemble `agent`, optionally move its parts so their enclosing box
    /// minimum sits at `position`, then register it.
    pub fn add_embodied_agent<A: EmbodiedAgent>(
        &mut self,
        mut agent: A,
        position: Option<Point>,
    ) -> Result<AgentId, TickError> {
        agent.assemble(self).map_err(TickError::Assembly)?;
        if let Some(position) = position {
            self.perform(
                Action::TranslateBodies {
                    bodies: agent.body_parts(),
                    position,
                },
                None,
            )
            .map_err(TickError::Assembly)?;
        }
        Ok(self.add_agent(agent))
    }

    fn dispatch(
        &mut self,
        action: &Action,
        agent: Option<AgentId>,
    ) -> Result<Option<ActionValue>, ActionError> {
        if action.is_composite() {
            return composite::resolve(action, self, agent);
        }
        let kind = action.kind();
        let solver = self
            .solvers
            .resolve(kind)
            .ok_or(ActionError::Unresolvable { kind })?;
        solver(self, action, agent)
    }

    /// Poll every agent, perform its actions, advance the substrate and
    /// return the resulting snapshot.
    ///
    /// Outcomes reach the agents only when the pass completes. An aborted
    /// transactional tick leaves every agent's previous outcomes in place.
    pub fn tick(&mut self) -> Result<Snapshot, TickError> {
        let t = self.t;
        let mut agents = std::mem::take(&mut self.agents);
        let mut aborted = None;
        let mut staged = Vec::with_capacity(agents.len());

        'agents: for slot in agents.iter_mut() {
            let actions = slot.agent.act(t, &slot.last_outcomes);
            let mut outcomes = Vec::with_capacity(actions.len());
            for action in actions {
                match self.perform(action.clone(), Some(slot.id)) {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(error) if self.config.transactional => {
                        aborted = Some(error);
                        break 'agents;
                    }
                    Err(error) => {
                        warn!(agent = %slot.id, kind = ?action.kind(), %error, "action failed");
                        self.failures.push(ActionFailure {
                            agent: Some(slot.id),
                            action: action.clone(),
                            error,
                        });
                        outcomes.push(ActionOutcome::new(Some(slot.id), action, None));
                    }
                }
            }
            staged.push(outcomes);
        }

        if let Some(source) = aborted {
            self.agents = agents;
            self.performed.clear();
            self.failures.clear();
            self.nfc_messages.clear();
            return Err(TickError::Aborted { t, source });
        }
        for (slot, outcomes) in agents.iter_mut().zip(staged) {
            slot.last_outcomes = outcomes;
        }
        self.agents = agents;

        self.substrate.step(&mut self.bodies, self.config.dt);
        self.t += self.config.dt;

        let snapshot = self.snapshot();
        debug!(
            t = self.t,
            outcomes = snapshot.outcomes.len(),
            failures = snapshot.failures.len(),
            "tick done"
        );
        self.performed.clear();
        self.failures.clear();
        self.last_nfc_messages = std::mem::take(&mut self.nfc_messages);
        Ok(snapshot)
    }

    /// The current state, with whatever has been performed since the last tick.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            t: self.t,
            bodies: self.bodies.iter().cloned().collect(),
            agents: self
                .agents
                .iter()
                .map(|slot| AgentSummary {
                    id: slot.id,
                    body_parts: slot.agent.body_parts(),
                })
                .collect(),
            outcomes: self.performed.clone(),
            failures: self.failures.clone(),
            nfc_messages: self.nfc_messages.clone(),
        }
    }
}

impl<S: Substrate> ActionPerformer for Engine<S> {
    fn perform(&mut self, action: Action, agent: Option<AgentId>) -> Result<ActionOutcome, ActionError> {
        let kind = action.kind();
        if self.depth >= self.config.max_dispatch_depth {
            return Err(ActionError::DepthExceeded {
                kind,
                depth: self.config.max_dispatch_depth,
            });
        }
        self.depth += 1;
        let value = self.dispatch(&action, agent);
        self.depth -= 1;
        let value = value?;
        trace!(?kind, empty = value.is_none(), "action performed");
        let outcome = ActionOutcome::new(agent, action, value);
        self.performed.push(outcome.clone());
        Ok(outcome)
    }

    fn bodies(&self) -> &BodyRegistry {
        &self.bodies
    }

    fn t(&self) -> f64 {
        self.t
    }
}
