// Path: crates/pvm/src/hostcalls.rs
//! The host-call dispatch surface (spec §4.6 "Host calls"): `gas_remaining`,
//! `lookup_preimage`, `read_storage`, `write_storage`, `info_service`,
//! `fetch`, `debug_log`, keyed by opcode number.

use crate::vm::Pvm;
use jam_state::account::{FootprintCost, WriteOutcome};
use jam_types::error::PvmError;
use jam_types::hash::Hash32;
use jam_types::keys::ServiceId;

/// Host calls observe and mutate exactly one service account's storage
/// (and may read others' code/balance for `info_service`/`fetch`); this
/// trait is the seam between the PVM's register machine and whatever
/// owns the surrounding `δ` during accumulation or on-transfer.
pub trait HostContext {
    fn gas_remaining(&self) -> i64;
    fn lookup_preimage(&self, service: ServiceId, hash: &Hash32) -> Option<Vec<u8>>;
    fn read_storage(&self, service: ServiceId, key: &Hash32) -> Option<Vec<u8>>;
    fn write_storage(
        &mut self,
        service: ServiceId,
        key: Hash32,
        value: Vec<u8>,
        cost: &FootprintCost,
    ) -> WriteOutcome;
    fn info_service(&self, service: ServiceId) -> Option<(Hash32, u64)>;
    fn fetch(&self, kind: u32) -> Option<Vec<u8>>;
    fn debug_log(&mut self, message: &[u8]);
    /// The service this PVM instance is executing on behalf of.
    fn current_service(&self) -> ServiceId;
}

/// Host-call opcode numbers (spec §4.6: "keyed by opcode number").
pub mod opcode {
    pub const GAS_REMAINING: u32 = 0;
    pub const LOOKUP_PREIMAGE: u32 = 1;
    pub const READ_STORAGE: u32 = 2;
    pub const WRITE_STORAGE: u32 = 3;
    pub const INFO_SERVICE: u32 = 4;
    pub const FETCH: u32 = 5;
    pub const DEBUG_LOG: u32 = 6;
}

/// Status codes placed in register 7 on return from a host call (spec
/// §4.6: "Return status placed in register 7 by convention").
pub mod status {
    pub const OK: u64 = 0;
    pub const NONE: u64 = 1;
    pub const FULL: u64 = 2;
    pub const WHAT: u64 = u64::MAX;
}

/// Copies `bytes` into guest memory at `out_ptr`, honoring the
/// `(offset, limit)` windowing convention: at most `limit` bytes starting
/// at `offset` are copied, but the full length is always returned (spec
/// §4.6: "always returning the full value length even when `limit=0`").
fn copy_windowed(
    pvm: &mut Pvm,
    out_ptr: u32,
    offset: u32,
    limit: u32,
    bytes: &[u8],
) -> Result<u64, PvmError> {
    let start = (offset as usize).min(bytes.len());
    let end = start.saturating_add(limit as usize).min(bytes.len());
    if let Some(window) = bytes.get(start..end) {
        if !window.is_empty() {
            pvm.memory.write(out_ptr, window)?;
        }
    }
    Ok(bytes.len() as u64)
}

/// Dispatches a host call by opcode number against `ctx`, charging its
/// fixed gas cost first (spec §4.6: "Every host call charges 10 gas").
/// Registers 0-2 conventionally carry `(arg0, out_ptr, offset_or_limit)`
/// style arguments; the exact register convention per call is documented
/// inline.
pub fn dispatch(
    pvm: &mut Pvm,
    ctx: &mut dyn HostContext,
    hostcall_opcode: u32,
) -> Result<(), PvmError> {
    pvm.charge_gas(10)?;

    let service = ctx.current_service();
    let status_code = match hostcall_opcode {
        opcode::GAS_REMAINING => {
            pvm.set_register(0, ctx.gas_remaining().max(0) as u64);
            status::OK
        }
        opcode::LOOKUP_PREIMAGE => {
            let hash = read_hash_arg(pvm, 0)?;
            let out_ptr = pvm.register(1) as u32;
            let offset = pvm.register(2) as u32;
            let limit = pvm.register(3) as u32;
            match ctx.lookup_preimage(service, &hash) {
                Some(bytes) => {
                    copy_windowed(pvm, out_ptr, offset, limit, &bytes)?;
                    status::OK
                }
                None => status::NONE,
            }
        }
        opcode::READ_STORAGE => {
            let key = read_hash_arg(pvm, 0)?;
            let out_ptr = pvm.register(1) as u32;
            let offset = pvm.register(2) as u32;
            let limit = pvm.register(3) as u32;
            match ctx.read_storage(service, &key) {
                Some(bytes) => {
                    copy_windowed(pvm, out_ptr, offset, limit, &bytes)?;
                    status::OK
                }
                None => status::NONE,
            }
        }
        opcode::WRITE_STORAGE => {
            let key = read_hash_arg(pvm, 0)?;
            let value_ptr = pvm.register(1) as u32;
            let value_len = pvm.register(2) as u32;
            let value = pvm.memory.read(value_ptr, value_len)?;
            match ctx.write_storage(service, key, value, &FootprintCost::default()) {
                WriteOutcome::Written(prior) => {
                    pvm.set_register(0, prior.map(|l| l as u64).unwrap_or(u64::MAX));
                    status::OK
                }
                WriteOutcome::Full => status::FULL,
            }
        }
        opcode::INFO_SERVICE => match ctx.info_service(service) {
            Some((code_hash, balance)) => {
                let out_ptr = pvm.register(0) as u32;
                let mut bytes = code_hash.as_bytes().to_vec();
                bytes.extend_from_slice(&balance.to_le_bytes());
                pvm.memory.write(out_ptr, &bytes)?;
                status::OK
            }
            None => status::NONE,
        },
        opcode::FETCH => {
            let kind = pvm.register(0) as u32;
            let out_ptr = pvm.register(1) as u32;
            let offset = pvm.register(2) as u32;
            let limit = pvm.register(3) as u32;
            match ctx.fetch(kind) {
                Some(bytes) => {
                    copy_windowed(pvm, out_ptr, offset, limit, &bytes)?;
                    status::OK
                }
                None => status::NONE,
            }
        }
        opcode::DEBUG_LOG => {
            let ptr = pvm.register(0) as u32;
            let len = pvm.register(1) as u32;
            let bytes = pvm.memory.read(ptr, len)?;
            ctx.debug_log(&bytes);
            status::OK
        }
        _ => status::WHAT,
    };

    pvm.set_register(7, status_code);
    Ok(())
}

fn read_hash_arg(pvm: &Pvm, reg: usize) -> Result<Hash32, PvmError> {
    let ptr = pvm.register(reg) as u32;
    let bytes = pvm.memory.read(ptr, 32)?;
    let mut out = [0u8; 32];
    if let Some(slice) = bytes.get(..32) {
        out.copy_from_slice(slice);
    }
    Ok(Hash32(out))
}
