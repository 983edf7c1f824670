//! Incremental, batch-bounded growth of a category's network

use std::collections::HashSet;

use anyhow::{Context, Result};

use crate::graph::{NodeKind, SsnGraph};
use crate::storage::{from_persisted, to_persisted, GraphRepository};

/// Sequences shorter than this are ignored as fragments
const MIN_SEQUENCE_LEN: usize = 12;

/// Job name used when re-enqueueing a growth cycle
pub const EXPAND_JOB: &str = "expand_ssn";

/// A sequence record from the external source
#[derive(Debug, Clone)]
pub struct SeqRecord {
    pub id: String,
    pub sequence: String,
    pub kind: NodeKind,
}

/// External catalog of sequences for one category
pub trait SequenceSource {
    /// Candidate records, optionally restricted to catalog members
    fn candidates(&self, only_catalog: bool) -> Result<Vec<SeqRecord>>;

    /// Look up one record; `None` when the identifier is unknown
    fn record(&self, id: &str) -> Result<Option<SeqRecord>>;

    /// Every identifier the source currently knows
    fn known_ids(&self) -> Result<HashSet<String>>;
}

/// External service computing pairwise alignments for one node
pub trait AlignmentService {
    /// Neighbor identifier and alignment score pairs for the record
    fn align(&self, record: &SeqRecord) -> Result<Vec<(String, f32)>>;
}

/// External scheduler handling re-enqueued growth cycles
pub trait JobScheduler {
    fn enqueue(&self, job: &str, category: &str, job_id: &str) -> Result<()>;
    fn active_job_ids(&self) -> Result<HashSet<String>>;
    fn mark_idle(&self, category: &str) -> Result<()>;
}

/// Outcome of one growth cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStatus {
    /// A batch was processed and another cycle was requested
    Scheduled,
    /// Nothing left to add or align; the category is up to date
    Idle,
}

/// Drives bounded growth batches for one category.
///
/// Batch priority is fixed: missing catalog nodes first, then alignments
/// for present nodes, then all remaining nodes. Each non-empty batch is
/// persisted before the next cycle is requested, handing control back to
/// the scheduler between batches.
pub struct GrowthController<'a> {
    category: String,
    source: &'a dyn SequenceSource,
    aligner: &'a dyn AlignmentService,
    scheduler: &'a dyn JobScheduler,
    repository: &'a dyn GraphRepository,
    batch_cap: usize,
}

impl<'a> GrowthController<'a> {
    pub fn new(
        category: &str,
        source: &'a dyn SequenceSource,
        aligner: &'a dyn AlignmentService,
        scheduler: &'a dyn JobScheduler,
        repository: &'a dyn GraphRepository,
        batch_cap: usize,
    ) -> Self {
        Self {
            category: category.to_string(),
            source,
            aligner,
            scheduler,
            repository,
            batch_cap,
        }
    }

    /// Run one bounded growth cycle for the category
    pub fn build_or_resume(&self) -> Result<GrowthStatus> {
        let mut graph = match self.repository.load(&self.category)? {
            Some(persisted) => from_persisted(&persisted),
            None => {
                log::info!("Starting empty network for {}", self.category);
                SsnGraph::new()
            }
        };

        let pruned = self.prune_missing(&mut graph)?;
        if pruned > 0 {
            log::info!("Pruned {} nodes no longer known to the source", pruned);
        }

        // 1. catalog members missing from the graph
        let missing_catalog = self.missing_candidates(&graph, true)?;
        if !missing_catalog.is_empty() {
            log::info!(
                "Adding {} missing catalog nodes for {}",
                missing_catalog.len(),
                self.category
            );
            for record in &missing_catalog {
                graph.add_node(&record.id, record.kind, false);
            }
            return self.persist_and_reschedule(&graph);
        }

        // 2. present nodes still waiting for alignments
        let pending = graph.nodes_needing_alignment(self.batch_cap);
        if !pending.is_empty() {
            log::info!(
                "Computing alignments for {} nodes of {}",
                pending.len(),
                self.category
            );
            for id in &pending {
                self.align_node(&mut graph, id)?;
            }
            return self.persist_and_reschedule(&graph);
        }

        // 3. everything else not yet present
        let missing_any = self.missing_candidates(&graph, false)?;
        if !missing_any.is_empty() {
            log::info!(
                "Adding {} remaining nodes for {}",
                missing_any.len(),
                self.category
            );
            for record in &missing_any {
                graph.add_node(&record.id, record.kind, false);
            }
            return self.persist_and_reschedule(&graph);
        }

        log::info!("Growth for {} is complete", self.category);
        self.scheduler
            .mark_idle(&self.category)
            .context("marking category idle")?;
        Ok(GrowthStatus::Idle)
    }

    /// Remove nodes whose identifier the source no longer knows
    pub fn prune_missing(&self, graph: &mut SsnGraph) -> Result<usize> {
        let known = self.source.known_ids().context("listing known sequences")?;
        let stale: Vec<String> = graph
            .node_ids()
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect();
        for id in &stale {
            log::debug!("Node {} not in the sequence source - removing", id);
            graph.remove_node(id);
        }
        Ok(stale.len())
    }

    fn align_node(&self, graph: &mut SsnGraph, id: &str) -> Result<()> {
        let record = self
            .source
            .record(id)
            .with_context(|| format!("looking up {}", id))?;
        let Some(record) = record else {
            log::debug!("Skipping alignment for {}: unknown to the source", id);
            return Ok(());
        };

        let alignments = self
            .aligner
            .align(&record)
            .with_context(|| format!("aligning {}", id))?;
        graph.add_node(&record.id, record.kind, true);

        let mut new_nodes = 0;
        for (neighbor, score) in &alignments {
            if !graph.contains(neighbor) {
                match self.source.record(neighbor)? {
                    Some(other) => {
                        graph.add_node(&other.id, other.kind, false);
                        new_nodes += 1;
                    }
                    None => {
                        log::debug!("Alignment names unknown sequence {}", neighbor);
                        continue;
                    }
                }
            }
            graph.add_edge(&record.id, neighbor, *score);
        }
        log::debug!(
            "{} aligned: {} edges, {} new nodes",
            id,
            alignments.len(),
            new_nodes
        );
        Ok(())
    }

    fn missing_candidates(&self, graph: &SsnGraph, only_catalog: bool) -> Result<Vec<SeqRecord>> {
        let mut batch = Vec::new();
        for record in self
            .source
            .candidates(only_catalog)
            .context("listing candidate sequences")?
        {
            if graph.contains(&record.id) {
                continue;
            }
            if record.sequence.len() <= MIN_SEQUENCE_LEN {
                continue;
            }
            batch.push(record);
            if batch.len() == self.batch_cap {
                break;
            }
        }
        Ok(batch)
    }

    fn persist_and_reschedule(&self, graph: &SsnGraph) -> Result<GrowthStatus> {
        self.repository
            .save(&self.category, &to_persisted(graph))
            .context("saving similarity network")?;
        self.request_growth_cycle()?;
        Ok(GrowthStatus::Scheduled)
    }

    /// Ask the scheduler for another cycle unless one is already queued
    pub fn request_growth_cycle(&self) -> Result<()> {
        let job_id = format!("{}_{}", self.category, EXPAND_JOB);
        let active = self.scheduler.active_job_ids()?;
        if active.contains(&job_id) {
            log::debug!("Growth cycle {} already queued", job_id);
            return Ok(());
        }
        self.scheduler.enqueue(EXPAND_JOB, &self.category, &job_id)
    }
}
