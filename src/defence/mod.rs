//! DAG defence engine.
//!
//! A defence DAG is a phased dependency graph of memory accesses whose
//! timing is pre-computed offline. The engine executes it over simulated
//! time: each phase's nodes are placed in a collision-free schedule map,
//! a scheduled slot consumes a real defence-domain request when one is
//! queued and synthesizes a fake one when not, and a phase advances once
//! every one of its nodes has seen its read return.
//!
//! The document arrives as JSON. Node and edge tables are keyed by decimal
//! strings in the serialized form and deserialize into integer-keyed
//! `BTreeMap`s, so iteration order is numeric. Within a phase the edge
//! table is column-major over (source, dest): for new-node index `j` among
//! `n` new nodes, edges `j`, `j+n`, `j+2n`, … lead from old nodes `0, 1,
//! 2, …` in order. Any edge whose endpoints disagree with its position is
//! rejected, since a silently reordered document would mis-schedule every
//! phase after the first.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use serde::Deserialize;

use crate::common::SimError;
use crate::config::DefenceConfig;

/// One node of a defence phase.
#[derive(Clone, Debug, Deserialize)]
pub struct DagNode {
    /// Bank the node's access targets.
    #[serde(rename = "bankID")]
    pub bank_id: u64,
    /// Non-zero when the node pairs a write-back with its read.
    #[serde(rename = "combinedWB")]
    pub combined_wb: u8,
}

/// One edge of a defence phase.
#[derive(Clone, Debug, Deserialize)]
pub struct DagEdge {
    /// Node the edge leaves, in the previous phase.
    #[serde(rename = "sourceID")]
    pub source_id: usize,
    /// Node the edge enters, in this phase.
    #[serde(rename = "destID")]
    pub dest_id: usize,
    /// Minimum spacing in DAG latency units.
    pub latency: u64,
}

/// One phase of the defence DAG.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DagPhase {
    /// Nodes keyed by node id.
    #[serde(default)]
    pub node: BTreeMap<usize, DagNode>,
    /// Edges keyed by serialization position.
    #[serde(default)]
    pub edge: BTreeMap<usize, DagEdge>,
}

/// The full defence document: an ordered sequence of phases.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DefenceDag(pub Vec<DagPhase>);

impl DefenceDag {
    /// Parses a DAG document from JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Number of phases.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document has no phases.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Phase and schedule state of an active defence.
#[derive(Debug)]
pub struct DefenceEngine {
    dag: DefenceDag,
    slack: f64,
    def_clk_div: u64,

    current_phase: Option<usize>,
    defence_domain: u64,

    /// Cycle -> node id. Entries are never removed; collision bumping
    /// consults every key ever placed, which keeps placement stable across
    /// phases.
    schedule: BTreeMap<u64, usize>,
    finish_times: HashMap<usize, u64>,

    remaining_in_phase: usize,
    nodes_this_phase: usize,

    fake_reads_this_phase: u64,
    fake_writes_this_phase: u64,

    /// Fake read requests synthesized over the whole run.
    pub total_fake_reads: u64,
    /// Fake write requests synthesized over the whole run.
    pub total_fake_writes: u64,
    /// Defence nodes executed over the whole run.
    pub total_nodes: u64,
}

impl DefenceEngine {
    /// Creates an inactive engine.
    pub fn new(config: &DefenceConfig) -> Self {
        Self {
            dag: DefenceDag::default(),
            slack: config.slack,
            def_clk_div: config.def_clk_div,
            current_phase: None,
            defence_domain: 0,
            schedule: BTreeMap::new(),
            finish_times: HashMap::new(),
            remaining_in_phase: 0,
            nodes_this_phase: 0,
            fake_reads_this_phase: 0,
            fake_writes_this_phase: 0,
            total_fake_reads: 0,
            total_fake_writes: 0,
            total_nodes: 0,
        }
    }

    /// Installs the DAG document to execute.
    pub fn set_dag(&mut self, dag: DefenceDag) {
        self.dag = dag;
    }

    /// Whether a defence is currently running.
    pub fn active(&self) -> bool {
        self.current_phase.is_some()
    }

    /// The security domain defended traffic carries.
    pub fn domain(&self) -> u64 {
        self.defence_domain
    }

    /// The phase currently executing.
    pub fn current_phase(&self) -> Option<usize> {
        self.current_phase
    }

    /// The full schedule map; diagnostic and test hook.
    pub fn schedule(&self) -> &BTreeMap<u64, usize> {
        &self.schedule
    }

    /// Starts the defence at phase zero.
    ///
    /// Every phase-zero node is placed at `now + (latency(edge 0) /
    /// DEF_CLK_DIV) * SLACK`; a computed cycle equal to `now` is bumped by
    /// one, and occupied cycles bump until a free one is found.
    ///
    /// # Arguments
    ///
    /// * `domain_id` - Security domain of the defended tenant.
    /// * `now` - Current cycle.
    pub fn init(&mut self, domain_id: u64, now: u64) -> Result<(), SimError> {
        info!("defence: slack setting {}", self.slack);
        if !(self.slack < 1.01) {
            return Err(SimError::SlackOutOfRange(self.slack));
        }

        let phase = self
            .dag
            .0
            .first()
            .cloned()
            .unwrap_or_default();
        let first_edge = phase
            .edge
            .get(&0)
            .ok_or(SimError::DagMissingEdge { phase: 0, edge: 0 })?;
        let base = (first_edge.latency / self.def_clk_div) as f64 * self.slack;

        self.defence_domain = domain_id;
        self.current_phase = Some(0);
        self.remaining_in_phase = 0;
        self.nodes_this_phase = 0;
        self.fake_reads_this_phase = 0;
        self.fake_writes_this_phase = 0;

        for &node_id in phase.node.keys() {
            self.remaining_in_phase += 1;
            self.nodes_this_phase += 1;
            self.total_nodes += 1;

            let mut scheduled = base as u64 + now;
            if scheduled == now {
                scheduled += 1;
            }
            while self.schedule.contains_key(&scheduled) {
                scheduled += 1;
            }
            debug!(
                "defence: scheduling node {} at cycle {} (current {})",
                node_id, scheduled, now
            );
            self.schedule.insert(scheduled, node_id);
        }
        Ok(())
    }

    /// The node scheduled for this exact cycle, if any.
    pub fn scheduled_node(&self, now: u64) -> Option<usize> {
        if self.current_phase.is_none() {
            return None;
        }
        self.schedule.get(&now).copied()
    }

    /// Bank and write-back request of a node in the current phase.
    pub fn node_info(&self, node_id: usize) -> Option<(u64, bool)> {
        let phase = self.current_phase?;
        let node = self.dag.0.get(phase)?.node.get(&node_id)?;
        Some((node.bank_id, node.combined_wb != 0))
    }

    /// Counts a synthesized fake read in the running phase.
    pub fn count_fake_read(&mut self) {
        self.fake_reads_this_phase += 1;
    }

    /// Counts a synthesized fake write in the running phase.
    pub fn count_fake_write(&mut self) {
        self.fake_writes_this_phase += 1;
    }

    /// Records a returned defence read and advances the phase when it was
    /// the last outstanding node.
    ///
    /// Successor nodes are placed at the maximum over their predecessors of
    /// `finish_time + floor(SLACK * latency / DEF_CLK_DIV)`, with the same
    /// bump rules as [`DefenceEngine::init`]. Fake and real reads both land
    /// here; only the client callback distinguishes them.
    pub fn read_returned(&mut self, node_id: usize, now: u64) -> Result<(), SimError> {
        let current = match self.current_phase {
            Some(phase) => phase,
            None => return Ok(()),
        };

        self.finish_times.insert(node_id, now);
        debug!("defence: node {} finished at cycle {}", node_id, now);
        self.remaining_in_phase = self.remaining_in_phase.saturating_sub(1);
        if self.remaining_in_phase > 0 {
            return Ok(());
        }

        let total_phases = self.dag.len();
        let next = (current + 1) % total_phases;
        debug!(
            "defence: finished phase {} ({} fake reads over {} nodes), starting phase {}",
            current, self.fake_reads_this_phase, self.nodes_this_phase, next
        );

        self.total_fake_reads += self.fake_reads_this_phase;
        self.total_fake_writes += self.fake_writes_this_phase;
        self.fake_reads_this_phase = 0;
        self.fake_writes_this_phase = 0;
        self.nodes_this_phase = 0;

        let old_ids: Vec<usize> = self.dag.0[current].node.keys().copied().collect();
        let new_phase = self.dag.0[next].clone();
        let num_new = new_phase.node.len();

        for (j, &new_id) in new_phase.node.keys().enumerate() {
            self.remaining_in_phase += 1;
            self.nodes_this_phase += 1;
            self.total_nodes += 1;

            let mut scheduled: u64 = 0;
            let mut edge_index = j;
            for &old_id in &old_ids {
                let edge = new_phase.edge.get(&edge_index).ok_or(SimError::DagMissingEdge {
                    phase: next,
                    edge: edge_index,
                })?;
                if edge.source_id != old_id {
                    return Err(SimError::DagEdgeMismatch {
                        phase: next,
                        edge: edge_index,
                        expected: old_id,
                        found: edge.source_id,
                    });
                }
                if edge.dest_id != new_id {
                    return Err(SimError::DagEdgeMismatch {
                        phase: next,
                        edge: edge_index,
                        expected: new_id,
                        found: edge.dest_id,
                    });
                }

                let weight = (self.slack * edge.latency as f64 / self.def_clk_div as f64) as u64;
                let candidate = weight + self.finish_times.get(&old_id).copied().unwrap_or(0);
                scheduled = scheduled.max(candidate);

                edge_index += num_new;
            }

            if scheduled == now {
                scheduled += 1;
            }
            while self.schedule.contains_key(&scheduled) {
                scheduled += 1;
            }
            debug!(
                "defence: scheduled node {} at cycle {} (current {})",
                new_id, scheduled, now
            );
            self.schedule.insert(scheduled, new_id);
        }

        self.current_phase = Some(next);
        Ok(())
    }
}
