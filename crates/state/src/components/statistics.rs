// Path: crates/state/src/components/statistics.rs
//! π: validator and core/service activity statistics (spec §3.1, §4.1 step 10).

use jam_types::keys::ServiceId;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-validator activity counters for a single epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorStats {
    pub blocks_authored: u32,
    pub tickets_submitted: u32,
    pub preimages_submitted: u32,
    pub preimage_bytes_submitted: u64,
    pub reports_guaranteed: u32,
    pub assurances_submitted: u32,
    /// ρ entries evicted on timeout while this validator was guarantor
    /// (spec §4.4 "a refusal statistic incremented").
    pub availability_refusals: u32,
}

/// Per-service accumulation activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ServiceStats {
    pub accumulate_count: u32,
    pub accumulate_gas_used: u64,
    pub on_transfers_count: u32,
}

/// π: one `ValidatorStats` per validator index, one `ServiceStats` per
/// service id referenced by an accumulated report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Statistics {
    pub validators: Vec<ValidatorStats>,
    pub services: BTreeMap<ServiceId, ServiceStats>,
}

impl Statistics {
    pub fn new(validators_count: u16) -> Self {
        Self {
            validators: vec![ValidatorStats::default(); validators_count as usize],
            services: BTreeMap::new(),
        }
    }

    pub fn record_author(&mut self, author_index: u16) {
        if let Some(v) = self.validators.get_mut(author_index as usize) {
            v.blocks_authored += 1;
        }
    }

    pub fn record_guarantor(&mut self, validator_index: u16) {
        if let Some(v) = self.validators.get_mut(validator_index as usize) {
            v.reports_guaranteed += 1;
        }
    }

    pub fn record_assurer(&mut self, validator_index: u16) {
        if let Some(v) = self.validators.get_mut(validator_index as usize) {
            v.assurances_submitted += 1;
        }
    }

    pub fn record_accumulation(&mut self, service_id: ServiceId, gas_used: u64) {
        let entry = self.services.entry(service_id).or_default();
        entry.accumulate_count += 1;
        entry.accumulate_gas_used += gas_used;
    }

    /// A ρ entry timed out while `validator_index` was assigned as its
    /// guarantor (spec §4.4: "a refusal statistic incremented").
    pub fn record_availability_refusal(&mut self, validator_index: u16) {
        if let Some(v) = self.validators.get_mut(validator_index as usize) {
            v.availability_refusals += 1;
        }
    }

    pub fn record_ticket_submitted(&mut self, validator_index: u16) {
        if let Some(v) = self.validators.get_mut(validator_index as usize) {
            v.tickets_submitted += 1;
        }
    }

    pub fn record_preimage_submitted(&mut self, validator_index: u16, blob_len: u64) {
        if let Some(v) = self.validators.get_mut(validator_index as usize) {
            v.preimages_submitted += 1;
            v.preimage_bytes_submitted += blob_len;
        }
    }
}
