// Path: crates/types/src/report.rs
//! Work reports and their dependency bookkeeping (§3.3).

use crate::hash::Hash32;
use crate::keys::{CoreIndex, ServiceId};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifies the work package a report refines, plus the commitments the
/// off-chain refinement environment produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Hash of the work package itself.
    pub hash: Hash32,
    /// Root of the exported-segments merkle tree.
    pub exports_root: Hash32,
    /// Root of the erasure-coded availability pieces.
    pub erasure_root: Hash32,
    /// Length in bytes of the encoded work package.
    pub length: u32,
}

/// The execution context a work report was refined against.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ReportContext {
    /// Hash of the block the refinement anchored to.
    pub anchor: Hash32,
    /// Hash of the block used to resolve historical lookups.
    pub lookup_anchor: Hash32,
    /// Work-package hashes this report depends on.
    pub prerequisites: Vec<Hash32>,
    /// State root at the anchor block, used to validate the refinement.
    pub state_root: Hash32,
}

/// One service invocation result bundled inside a work report.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct WorkResult {
    /// The service the result targets.
    pub service_id: ServiceId,
    /// The code hash the service advertised at refinement time.
    pub code_hash: Hash32,
    /// Gas budget the accumulation execution of this result is granted.
    pub accumulate_gas: u64,
    /// The refined output: either a payload or an error code from refinement.
    pub payload: WorkResultPayload,
}

/// The outcome of off-chain refinement for a single result entry.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum WorkResultPayload {
    /// Refinement produced an output payload to be delivered to accumulation.
    Ok(Vec<u8>),
    /// Refinement itself failed; accumulation still runs but sees the error.
    Err(RefinementError),
}

/// Reasons refinement (off-chain, out of scope here) may have failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum RefinementError {
    /// The refinement host ran out of its gas budget.
    OutOfGas,
    /// The refining code panicked.
    Panic,
    /// A segment-root lookup the refinement depended on could not resolve.
    BadExports,
}

/// A segment-root lookup entry: a work package whose exported segments this
/// report's refinement imported, named by hash.
pub type SegmentRootLookup = Hash32;

/// A complete work report as carried in a guarantee or queued in ρ/ϑ.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct WorkReport {
    /// Identity and availability commitments for the underlying package.
    pub package_spec: PackageSpec,
    /// The refinement context (anchor, lookup anchor, prerequisites).
    pub context: ReportContext,
    /// The core this report was guaranteed against.
    pub core_index: CoreIndex,
    /// Hash of the authorizer that permitted this package's submission.
    pub authorization_hash: Hash32,
    /// Per-service results produced by refinement.
    pub results: Vec<WorkResult>,
    /// Work packages whose exported segments this report's refinement used.
    pub segment_root_lookup: Vec<SegmentRootLookup>,
}

impl WorkReport {
    /// Sum of `accumulate_gas` across all results.
    pub fn total_accumulate_gas(&self) -> u64 {
        self.results.iter().map(|r| r.accumulate_gas).sum()
    }
}

/// A work report together with the mutable set of outstanding work-package
/// dependencies that must be satisfied before it can accumulate (§3.3).
///
/// Initially `outstanding = context.prerequisites ∪ segment_root_lookup`;
/// the accumulation pipeline (§4.5) removes entries from this set as
/// dependencies are satisfied by ξ or by prior emissions in the same round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkReportAndDeps {
    /// The underlying report.
    pub report: WorkReport,
    /// The slot this report was queued under (used for ϑ placement and the
    /// `τ mod E`-rooted iteration order).
    pub queued_at_slot: u32,
    /// Outstanding dependency hashes not yet satisfied.
    pub outstanding: BTreeSet<Hash32>,
}

impl WorkReportAndDeps {
    /// Build from a freshly-guaranteed report, deriving the initial
    /// dependency set from its context and segment-root lookups.
    pub fn new(report: WorkReport, queued_at_slot: u32) -> Self {
        let mut outstanding: BTreeSet<Hash32> =
            report.context.prerequisites.iter().copied().collect();
        outstanding.extend(report.segment_root_lookup.iter().copied());
        Self {
            report,
            queued_at_slot,
            outstanding,
        }
    }

    /// The work-package hash this entry is keyed by.
    pub fn package_hash(&self) -> Hash32 {
        self.report.package_spec.hash
    }

    /// True once every dependency has been satisfied.
    pub fn is_ready(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Remove a satisfied dependency, e.g. because it now appears in ξ or
    /// was emitted earlier in the same accumulation round.
    pub fn satisfy(&mut self, dep: &Hash32) {
        self.outstanding.remove(dep);
    }
}
