// Path: crates/state/src/components/pending.rs
//! ϑ (vartheta): per-slot queued work-reports-with-dependencies (spec §3.1, §4.5).

use jam_types::report::WorkReportAndDeps;

/// ϑ: `E` slots, each holding the reports queued under it, bounded by the
/// epoch length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingReports {
    pub slots: Vec<Vec<WorkReportAndDeps>>,
}

impl PendingReports {
    pub fn new(epoch_length: u32) -> Self {
        Self {
            slots: vec![Vec::new(); epoch_length as usize],
        }
    }

    pub fn within_bound(&self, epoch_length: u32) -> bool {
        self.slots.len() <= epoch_length as usize
    }

    /// Iterates queued reports starting from `start_slot` (= `τ mod E`) and
    /// wrapping around, so newer slots are visited before older ones
    /// (spec §4.5 "Pending reports iteration").
    pub fn iter_from(&self, start_slot: usize) -> impl Iterator<Item = (usize, &WorkReportAndDeps)> {
        let n = self.slots.len();
        (0..n).flat_map(move |offset| {
            let idx = if n == 0 { 0 } else { (start_slot + offset) % n };
            self.slots
                .get(idx)
                .into_iter()
                .flat_map(move |v| v.iter().map(move |r| (idx, r)))
        })
    }

    pub fn remove_by_package_hash(&mut self, hash: &jam_types::hash::Hash32) {
        for slot in self.slots.iter_mut() {
            slot.retain(|r| &r.package_hash() != hash);
        }
    }
}
