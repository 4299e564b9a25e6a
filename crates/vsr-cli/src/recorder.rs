//! JSONL run log, one record per tick.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vsr_core::{AgentId, Point, Snapshot};

use crate::scenario::robot_center;

/// A robot's position at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotRecord {
    pub agent: AgentId,
    pub center: Option<Point>,
}

/// One line of the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    pub timestamp: DateTime<Utc>,
    pub t: f64,
    pub bodies: usize,
    pub outcomes: usize,
    pub failures: usize,
    pub robots: Vec<RobotRecord>,
}

impl TickRecord {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            timestamp: Utc::now(),
            t: snapshot.t,
            bodies: snapshot.bodies.len(),
            outcomes: snapshot.outcomes.len(),
            failures: snapshot.failures.len(),
            robots: snapshot
                .agents
                .iter()
                .map(|a| RobotRecord {
                    agent: a.id,
                    center: robot_center(snapshot, &a.body_parts),
                })
                .collect(),
        }
    }
}

/// Appends tick records to a JSONL file and keeps running totals.
pub struct Recorder {
    path: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    summary: RunSummary,
}

impl Recorder {
    /// Without a path, records are only folded into the summary.
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let writer = match path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open run log: {}", path.display()))?;
                Some(BufWriter::new(file))
            }
            None => None,
        };
        Ok(Self {
            path: path.map(Path::to_path_buf),
            writer,
            summary: RunSummary::default(),
        })
    }

    pub fn record(&mut self, snapshot: &Snapshot) -> Result<()> {
        let record = TickRecord::from_snapshot(snapshot);
        if let Some(writer) = &mut self.writer {
            let line = serde_json::to_string(&record)?;
            writeln!(writer, "{}", line)?;
        }
        self.summary.add(&record);
        Ok(())
    }

    pub fn finish(mut self) -> Result<RunSummary> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        if let Some(path) = &self.path {
            tracing::debug!(path = %path.display(), "Run log flushed");
        }
        Ok(self.summary)
    }
}

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: usize,
    pub t: f64,
    pub outcomes: usize,
    pub failures: usize,
    pub start: Vec<RobotRecord>,
    pub end: Vec<RobotRecord>,
}

impl RunSummary {
    fn add(&mut self, record: &TickRecord) {
        if self.ticks == 0 {
            self.start = record.robots.clone();
        }
        self.ticks += 1;
        self.t = record.t;
        self.outcomes += record.outcomes;
        self.failures += record.failures;
        self.end = record.robots.clone();
    }

    /// Horizontal displacement of each robot between the first and last tick.
    pub fn displacements(&self) -> Vec<(AgentId, Option<f64>)> {
        self.end
            .iter()
            .map(|end| {
                let start = self.start.iter().find(|s| s.agent == end.agent).and_then(|s| s.center);
                let dx = start.zip(end.center).map(|(a, b)| b.x - a.x);
                (end.agent, dx)
            })
            .collect()
    }

    pub fn print(&self) {
        println!("Run summary");
        println!("===========");
        println!();
        println!("Ticks: {} (t = {:.3}s)", self.ticks, self.t);
        println!("Outcomes: {}", self.outcomes);
        println!("Failures: {}", self.failures);
        println!();
        println!("Robots:");
        for (agent, dx) in self.displacements() {
            match dx {
                Some(dx) => println!("  - {} moved {:+.3}", agent, dx),
                None => println!("  - {} has no body left", agent),
            }
        }
    }
}
