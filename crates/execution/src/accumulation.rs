// Path: crates/execution/src/accumulation.rs
//! Accumulation (spec §4.5): partition newly-available reports, filter and
//! resolve ϑ's dependency graph to fixpoint, then execute each result's PVM
//! invocation against a copy-on-write service-account snapshot.

use jam_pvm::prelude::{decode_program, HostContext, Memory, Pvm};
use jam_state::account::{FootprintCost, ServiceAccount, WriteOutcome};
use jam_state::components::accumulated_history::AccumulatedHistory;
use jam_state::components::pending::PendingReports;
use jam_state::components::statistics::Statistics;
use jam_state::sigma::ServiceAccounts;
use jam_types::error::AccumulationError;
use jam_types::hash::Hash32;
use jam_types::keys::ServiceId;
use jam_types::report::{WorkReport, WorkReportAndDeps, WorkResultPayload};

/// Bridges one result's PVM invocation to a single service account's
/// storage. Accumulation is partitioned by service id (spec §5
/// "Shared-resource policy"), so each instance only ever touches the one
/// account it was constructed with.
struct ServiceHostContext<'a> {
    service: ServiceId,
    account: &'a mut ServiceAccount,
    /// The budget reported back to the guest by the `gas_remaining` host
    /// call. Not wired to the `Pvm`'s live counter (the `HostContext` seam
    /// is decoupled from it, matching `vm.rs`'s `NullHost` test stub), so
    /// this mirrors the budget this invocation started with.
    gas_budget: i64,
}

impl HostContext for ServiceHostContext<'_> {
    fn gas_remaining(&self) -> i64 {
        self.gas_budget
    }

    fn lookup_preimage(&self, _service: ServiceId, hash: &Hash32) -> Option<Vec<u8>> {
        self.account.get(hash).map(<[u8]>::to_vec)
    }

    fn read_storage(&self, _service: ServiceId, key: &Hash32) -> Option<Vec<u8>> {
        self.account.get(key).map(<[u8]>::to_vec)
    }

    fn write_storage(
        &mut self,
        _service: ServiceId,
        key: Hash32,
        value: Vec<u8>,
        cost: &FootprintCost,
    ) -> WriteOutcome {
        self.account.write(key, value, cost)
    }

    fn info_service(&self, _service: ServiceId) -> Option<(Hash32, u64)> {
        Some((self.account.code_hash, self.account.balance))
    }

    fn fetch(&self, _kind: u32) -> Option<Vec<u8>> {
        None
    }

    fn debug_log(&mut self, message: &[u8]) {
        tracing::debug!(service = self.service, message = %String::from_utf8_lossy(message), "pvm debug_log");
    }

    fn current_service(&self) -> ServiceId {
        self.service
    }
}

/// Runs one service result's accumulation invocation, returning the gas
/// consumed. Storage mutations are applied to `account` in place only when
/// the PVM halts normally; `out_of_gas`/`panic`/`page_fault` leave `account`
/// unmodified (spec §4.5: "On `out_of_gas` or `panic`, storage changes are
/// discarded but ξ still records the package hash").
fn run_result(service_id: ServiceId, account: &mut ServiceAccount, code_hash: &Hash32, gas: u64, input: &[u8]) -> u64 {
    let Some(code) = account.get(code_hash).map(<[u8]>::to_vec) else {
        tracing::debug!(service = service_id, "accumulation code blob missing, skipping invocation");
        return 0;
    };
    let Ok(program) = decode_program(&code) else {
        tracing::debug!(service = service_id, "accumulation program failed to decode, skipping invocation");
        return 0;
    };

    let memory = Memory::new(&[], &[], input, &[]);
    let mut pvm = Pvm::new(program, memory, gas);
    let gas_before = pvm.gas_remaining();
    let mut trial = account.clone();
    let mut ctx = ServiceHostContext { service: service_id, account: &mut trial, gas_budget: gas as i64 };
    let outcome = pvm.run(&mut ctx);
    let gas_used = (gas_before - pvm.gas_remaining()).max(0) as u64;

    if outcome.is_ok() {
        *account = trial;
    }
    gas_used
}

/// Accumulates every report ready this block (spec §4.5). `newly_available`
/// is the set W of reports that just reached availability; `pending` is ϑ,
/// mutated in place as entries resolve; `history` is ξ, read (not yet
/// updated — the caller folds the returned hashes in via
/// `AccumulatedHistory::shift_and_append`). Returns the package hashes
/// accumulated this round, in emission order.
pub fn accumulate(
    newly_available: Vec<WorkReport>,
    pending: &mut PendingReports,
    history: &AccumulatedHistory,
    delta: &mut ServiceAccounts,
    current_slot: u32,
    statistics: &mut Statistics,
) -> Result<Vec<Hash32>, AccumulationError> {
    let epoch_length = pending.slots.len().max(1);

    // Partition (spec §4.5 "Partition").
    let mut resolved = Vec::new();
    for report in newly_available {
        if report.context.prerequisites.is_empty() && report.segment_root_lookup.is_empty() {
            resolved.push(report);
        } else {
            let slot_index = (current_slot as usize) % epoch_length;
            if let Some(slot) = pending.slots.get_mut(slot_index) {
                slot.push(WorkReportAndDeps::new(report, current_slot));
            }
        }
    }

    // Filter (spec §4.5 "Filter").
    for slot in pending.slots.iter_mut() {
        slot.retain(|r| !history.contains(&r.package_hash()));
        for entry in slot.iter_mut() {
            let satisfied: Vec<Hash32> = entry
                .outstanding
                .iter()
                .filter(|d| history.contains(d))
                .copied()
                .collect();
            for dep in &satisfied {
                entry.satisfy(dep);
            }
        }
    }

    // Priority queue Q fixpoint (spec §4.5).
    loop {
        let start = (current_slot as usize) % epoch_length;
        let ready_hashes: Vec<Hash32> = pending
            .iter_from(start)
            .filter(|(_, r)| r.is_ready())
            .map(|(_, r)| r.package_hash())
            .collect();
        if ready_hashes.is_empty() {
            break;
        }
        for hash in &ready_hashes {
            if let Some(report) = pending
                .iter_from(start)
                .find(|(_, r)| &r.package_hash() == hash)
                .map(|(_, r)| r.report.clone())
            {
                resolved.push(report);
            }
        }
        for hash in &ready_hashes {
            pending.remove_by_package_hash(hash);
        }
        for slot in pending.slots.iter_mut() {
            for entry in slot.iter_mut() {
                for hash in &ready_hashes {
                    entry.satisfy(hash);
                }
            }
        }
    }

    // Execution (spec §4.5 "Execution").
    let mut newly_accumulated = Vec::with_capacity(resolved.len());
    for report in &resolved {
        newly_accumulated.push(report.package_spec.hash);
        for result in &report.results {
            let WorkResultPayload::Ok(input) = &result.payload else {
                continue;
            };
            let Some(mut account) = delta.get(&result.service_id).cloned() else {
                return Err(AccumulationError::UnknownService(result.service_id));
            };
            let gas_used = run_result(
                result.service_id,
                &mut account,
                &result.code_hash,
                result.accumulate_gas,
                input,
            );
            statistics.record_accumulation(result.service_id, gas_used);

            if !input.is_empty() && account.creation_slot != current_slot {
                account.last_accumulation_slot = current_slot;
            }
            delta.insert(result.service_id, account);
        }
    }

    Ok(newly_accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_types::report::{PackageSpec, ReportContext, RefinementError, WorkResult};

    fn halting_program() -> Vec<u8> {
        vec![0, 1, 0]
    }

    fn account_with_code(code: Vec<u8>) -> ServiceAccount {
        let code_hash = Hash32([9; 32]);
        let mut account = ServiceAccount::new(code_hash, 1_000_000, 100, 100, 0, 0);
        account.storage.insert(code_hash, jam_state::account::StorageEntry(code));
        account
    }

    fn report_with_result(service_id: u32, payload: WorkResultPayload) -> WorkReport {
        WorkReport {
            package_spec: PackageSpec {
                hash: Hash32([1; 32]),
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
            results: vec![WorkResult {
                service_id,
                code_hash: Hash32([9; 32]),
                accumulate_gas: 1_000,
                payload,
            }],
            segment_root_lookup: vec![],
        }
    }

    #[test]
    fn immediate_report_accumulates_and_updates_slot() {
        let mut delta = ServiceAccounts::new();
        delta.insert(1, account_with_code(halting_program()));
        let mut pending = PendingReports::new(4);
        let history = AccumulatedHistory::new(4);
        let mut stats = Statistics::new(1);

        let report = report_with_result(1, WorkResultPayload::Ok(vec![1, 2, 3]));
        let hashes = accumulate(vec![report.clone()], &mut pending, &history, &mut delta, 2, &mut stats).unwrap();

        assert_eq!(hashes, vec![report.package_spec.hash]);
        assert_eq!(delta.get(&1).unwrap().last_accumulation_slot, 2);
        assert_eq!(stats.services.get(&1).unwrap().accumulate_count, 1);
    }

    #[test]
    fn refinement_error_result_is_skipped_without_invocation() {
        let mut delta = ServiceAccounts::new();
        delta.insert(1, account_with_code(halting_program()));
        let mut pending = PendingReports::new(4);
        let history = AccumulatedHistory::new(4);
        let mut stats = Statistics::new(1);

        let report = report_with_result(1, WorkResultPayload::Err(RefinementError::Panic));
        let hashes = accumulate(vec![report.clone()], &mut pending, &history, &mut delta, 0, &mut stats).unwrap();

        assert_eq!(hashes, vec![report.package_spec.hash]);
        assert!(stats.services.get(&1).is_none());
    }

    #[test]
    fn report_with_prerequisite_queues_until_satisfied() {
        let mut delta = ServiceAccounts::new();
        delta.insert(1, account_with_code(halting_program()));
        let mut pending = PendingReports::new(4);
        let mut history = AccumulatedHistory::new(4);
        let mut stats = Statistics::new(1);

        let dep_hash = Hash32([5; 32]);
        let mut report = report_with_result(1, WorkResultPayload::Ok(vec![]));
        report.context.prerequisites = vec![dep_hash];

        let hashes = accumulate(vec![report.clone()], &mut pending, &history, &mut delta, 0, &mut stats).unwrap();
        assert!(hashes.is_empty());
        assert_eq!(pending.slots.iter().map(Vec::len).sum::<usize>(), 1);

        history.shift_and_append([dep_hash]);
        let hashes = accumulate(vec![], &mut pending, &history, &mut delta, 1, &mut stats).unwrap();
        assert_eq!(hashes, vec![report.package_spec.hash]);
    }
}
