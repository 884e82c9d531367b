// Path: crates/state/src/components/availability.rs
//! ρ: per-core availability assignments (spec §3.1, §4.4).

use jam_types::keys::TimeSlot;
use jam_types::report::WorkReport;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A work report awaiting assurance for a given core, plus the slot at
/// which it times out if it never reaches supermajority.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AvailabilityAssignment {
    pub report: WorkReport,
    pub timeout: TimeSlot,
    /// Set of validator indices that have attested availability so far.
    pub assured_by: Vec<u16>,
    /// The guarantors whose signatures placed this report on ρ, kept so a
    /// timeout can attribute the refusal statistic (spec §4.4).
    pub guarantors: Vec<u16>,
    pub available: bool,
}

impl AvailabilityAssignment {
    pub fn new(report: WorkReport, timeout: TimeSlot, guarantors: Vec<u16>) -> Self {
        Self {
            report,
            timeout,
            assured_by: Vec::new(),
            guarantors,
            available: false,
        }
    }

    /// Records an assurance from `validator_index`; returns whether this
    /// pushed the assignment over the supermajority threshold for the
    /// first time.
    pub fn record_assurance(&mut self, validator_index: u16, supermajority: u16) -> bool {
        if !self.assured_by.contains(&validator_index) {
            self.assured_by.push(validator_index);
        }
        if !self.available && self.assured_by.len() >= supermajority as usize {
            self.available = true;
            return true;
        }
        false
    }

    pub fn is_timed_out(&self, current_slot: TimeSlot) -> bool {
        self.timeout < current_slot
    }
}

/// ρ: at most one pending assignment per core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Availability {
    pub cores: Vec<Option<AvailabilityAssignment>>,
}

impl Availability {
    pub fn new(core_count: u16) -> Self {
        Self {
            cores: vec![None; core_count as usize],
        }
    }

    /// Evicts every entry timed out as of `current_slot`, returning each
    /// evicted entry's guarantor set so the caller can attribute the
    /// refusal statistic (spec §4.4: "a refusal statistic incremented").
    pub fn evict_timed_out(&mut self, current_slot: TimeSlot) -> Vec<Vec<u16>> {
        let mut evicted = Vec::new();
        for slot in self.cores.iter_mut() {
            if let Some(a) = slot {
                if !a.available && a.is_timed_out(current_slot) {
                    evicted.push(a.guarantors.clone());
                    *slot = None;
                }
            }
        }
        evicted
    }

    /// Takes every entry now marked available, leaving its core empty.
    pub fn extract_available(&mut self) -> Vec<WorkReport> {
        let mut out = Vec::new();
        for slot in self.cores.iter_mut() {
            let take = matches!(slot, Some(a) if a.available);
            if take {
                if let Some(a) = slot.take() {
                    out.push(a.report);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_types::hash::Hash32;
    use jam_types::report::{PackageSpec, ReportContext};

    fn sample_report() -> WorkReport {
        WorkReport {
            package_spec: PackageSpec {
                hash: Hash32::ZERO,
                exports_root: Hash32::ZERO,
                erasure_root: Hash32::ZERO,
                length: 0,
            },
            context: ReportContext {
                anchor: Hash32::ZERO,
                lookup_anchor: Hash32::ZERO,
                prerequisites: vec![],
                state_root: Hash32::ZERO,
            },
            core_index: 0,
            authorization_hash: Hash32::ZERO,
            results: vec![],
            segment_root_lookup: vec![],
        }
    }

    #[test]
    fn supermajority_marks_available_once() {
        let mut a = AvailabilityAssignment::new(sample_report(), 10, vec![0, 1, 2]);
        assert!(!a.record_assurance(0, 2));
        assert!(a.record_assurance(1, 2));
        assert!(!a.record_assurance(2, 2));
        assert!(a.available);
    }

    #[test]
    fn timed_out_entries_are_evicted() {
        let mut av = Availability::new(1);
        av.cores[0] = Some(AvailabilityAssignment::new(sample_report(), 5, vec![0]));
        assert_eq!(av.evict_timed_out(10), vec![vec![0]]);
        assert!(av.cores[0].is_none());
    }
}
