// Path: crates/pvm/src/vm.rs
//! The register machine proper: ties the decoded `Program`, paged
//! `Memory`, and `instructions` execution together into a single
//! run-to-termination step loop (spec §4.6).

use crate::decoder::Program;
use crate::hostcalls::{self, HostContext};
use crate::instructions::{decode_instruction, instruction_cost, Instruction};
use crate::memory::Memory;
use jam_types::error::PvmError;

/// Register count (spec §4.6 "Registers"; width decided as u64, see
/// `DESIGN.md`'s Open Question record).
pub const REGISTER_COUNT: usize = 13;

/// A single PVM instance: registers, program counter, remaining gas, the
/// decoded program, and its memory image.
pub struct Pvm {
    registers: [u64; REGISTER_COUNT],
    pc: u32,
    gas: i64,
    program: Program,
    pub(crate) memory: Memory,
}

impl Pvm {
    pub fn new(program: Program, memory: Memory, gas_limit: u64) -> Self {
        Self {
            registers: [0u64; REGISTER_COUNT],
            pc: 0,
            gas: gas_limit as i64,
            program,
            memory,
        }
    }

    pub fn register(&self, index: usize) -> u64 {
        self.registers.get(index).copied().unwrap_or(0)
    }

    pub fn set_register(&mut self, index: usize, value: u64) {
        if let Some(slot) = self.registers.get_mut(index) {
            *slot = value;
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn gas_remaining(&self) -> i64 {
        self.gas
    }

    /// Deducts `amount` from the remaining gas budget, failing with
    /// `OutOfGas` once it would go negative (spec §4.6: "When `gas < 0`,
    /// execution terminates with `out_of_gas`").
    pub fn charge_gas(&mut self, amount: u64) -> Result<(), PvmError> {
        self.gas -= amount as i64;
        if self.gas < 0 {
            return Err(PvmError::OutOfGas);
        }
        Ok(())
    }

    fn jump_to(&mut self, dest: u32) -> Result<(), PvmError> {
        if !self.program.is_basic_block_start(dest) {
            return Err(PvmError::Panic);
        }
        self.pc = dest;
        Ok(())
    }

    /// Executes one instruction, returning `Ok(true)` if execution should
    /// continue, `Ok(false)` on a normal halt (fell off the end of the
    /// code section).
    fn step(&mut self, ctx: &mut dyn HostContext) -> Result<bool, PvmError> {
        if self.pc as usize >= self.program.code.len() {
            return Ok(false);
        }
        let (instr, len) = decode_instruction(&self.program.code, self.pc)
            .map_err(|_| PvmError::Panic)?;
        self.charge_gas(instruction_cost(&instr))?;
        let next_pc = self.pc.wrapping_add(len);

        match instr {
            Instruction::Trap => return Err(PvmError::Panic),
            Instruction::Fallthrough => self.pc = next_pc,
            Instruction::HostCall { opcode } => {
                hostcalls::dispatch(self, ctx, opcode)?;
                self.pc = next_pc;
            }
            Instruction::StoreImmU32 { addr, value } => {
                self.memory.write(addr, &value.to_le_bytes())?;
                self.pc = next_pc;
            }
            Instruction::Jump { offset } => {
                let dest = self.pc.wrapping_add(offset as u32);
                self.jump_to(dest)?;
            }
            Instruction::LoadImm { reg, imm } => {
                self.set_register(reg as usize, u64::from(imm));
                self.pc = next_pc;
            }
            Instruction::JumpInd { reg, table_offset } => {
                let index = (self.register(reg as usize) as u32).wrapping_add(table_offset);
                let dest = *self
                    .program
                    .jump_table
                    .get(index as usize)
                    .ok_or(PvmError::Panic)?;
                self.jump_to(dest)?;
            }
            Instruction::Sbrk { reg, increment } => {
                let prev = self.memory.sbrk(increment);
                self.set_register(reg as usize, u64::from(prev));
                self.pc = next_pc;
            }
            Instruction::BranchEqImm { reg, cmp, offset } => {
                if self.register(reg as usize) as u32 == cmp {
                    let dest = self.pc.wrapping_add(offset as u32);
                    self.jump_to(dest)?;
                } else {
                    self.pc = next_pc;
                }
            }
            Instruction::AddImm { dst, src, imm } => {
                let value = self.register(src as usize).wrapping_add(u64::from(imm));
                self.set_register(dst as usize, value);
                self.pc = next_pc;
            }
            Instruction::LoadIndU32 { dst, base, imm } => {
                let addr = (self.register(base as usize) as u32).wrapping_add(imm);
                let bytes = self.memory.read(addr, 4)?;
                let mut word = [0u8; 4];
                if let Some(slice) = bytes.get(..4) {
                    word.copy_from_slice(slice);
                }
                self.set_register(dst as usize, u64::from(u32::from_le_bytes(word)));
                self.pc = next_pc;
            }
            Instruction::StoreIndU32 { src, base, imm } => {
                let addr = (self.register(base as usize) as u32).wrapping_add(imm);
                let value = self.register(src as usize) as u32;
                self.memory.write(addr, &value.to_le_bytes())?;
                self.pc = next_pc;
            }
            Instruction::Add { dst, a, b } => {
                let value = self.register(a as usize).wrapping_add(self.register(b as usize));
                self.set_register(dst as usize, value);
                self.pc = next_pc;
            }
            Instruction::Sub { dst, a, b } => {
                let value = self.register(a as usize).wrapping_sub(self.register(b as usize));
                self.set_register(dst as usize, value);
                self.pc = next_pc;
            }
            Instruction::Mul { dst, a, b } => {
                let value = self.register(a as usize).wrapping_mul(self.register(b as usize));
                self.set_register(dst as usize, value);
                self.pc = next_pc;
            }
            Instruction::Xor { dst, a, b } => {
                let value = self.register(a as usize) ^ self.register(b as usize);
                self.set_register(dst as usize, value);
                self.pc = next_pc;
            }
            Instruction::And { dst, a, b } => {
                let value = self.register(a as usize) & self.register(b as usize);
                self.set_register(dst as usize, value);
                self.pc = next_pc;
            }
            Instruction::Or { dst, a, b } => {
                let value = self.register(a as usize) | self.register(b as usize);
                self.set_register(dst as usize, value);
                self.pc = next_pc;
            }
        }
        Ok(true)
    }

    /// Runs to termination: halt, panic, out-of-gas, or page fault (spec
    /// §4.6/§5: "it runs to termination... or to a host call"). `Ok(())`
    /// is a normal halt; every other outcome is carried in the error.
    pub fn run(&mut self, ctx: &mut dyn HostContext) -> Result<(), PvmError> {
        loop {
            match self.step(ctx) {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_program;
    use jam_state::account::{FootprintCost, WriteOutcome};
    use jam_types::hash::Hash32;
    use jam_types::keys::ServiceId;

    struct NullHost;
    impl HostContext for NullHost {
        fn gas_remaining(&self) -> i64 {
            0
        }
        fn lookup_preimage(&self, _service: ServiceId, _hash: &Hash32) -> Option<Vec<u8>> {
            None
        }
        fn read_storage(&self, _service: ServiceId, _key: &Hash32) -> Option<Vec<u8>> {
            None
        }
        fn write_storage(
            &mut self,
            _service: ServiceId,
            _key: Hash32,
            _value: Vec<u8>,
            _cost: &FootprintCost,
        ) -> WriteOutcome {
            WriteOutcome::Full
        }
        fn info_service(&self, _service: ServiceId) -> Option<(Hash32, u64)> {
            None
        }
        fn fetch(&self, _kind: u32) -> Option<Vec<u8>> {
            None
        }
        fn debug_log(&mut self, _message: &[u8]) {}
        fn current_service(&self) -> ServiceId {
            0
        }
    }

    fn mask_byte(starts: &[usize]) -> u8 {
        let mut b = 0u8;
        for &s in starts {
            b |= 1 << s;
        }
        b
    }

    #[test]
    fn runs_to_halt_on_empty_code() {
        let bytes = vec![0, 1, 0, mask_byte(&[])];
        let program = decode_program(&bytes).unwrap();
        let memory = Memory::new(&[], &[], &[], &[]);
        let mut pvm = Pvm::new(program, memory, 1_000);
        let mut host = NullHost;
        assert!(pvm.run(&mut host).is_ok());
    }

    #[test]
    fn trap_instruction_panics() {
        let bytes = vec![0, 1, 1, 0x00, mask_byte(&[0])];
        let program = decode_program(&bytes).unwrap();
        let memory = Memory::new(&[], &[], &[], &[]);
        let mut pvm = Pvm::new(program, memory, 1_000);
        let mut host = NullHost;
        assert_eq!(pvm.run(&mut host), Err(PvmError::Panic));
    }

    #[test]
    fn arithmetic_executes_and_halts() {
        // LoadImm r0=5; LoadImm r1=7; Add r2=r0+r1
        let code = [
            0x40, 0, 5, 0, 0, 0, // LoadImm r0, 5
            0x40, 1, 7, 0, 0, 0, // LoadImm r1, 7
            0x60, 2, 0, 1, // Add r2 = r0 + r1
        ];
        let code_len = code.len();
        let mut mask = vec![false; code_len];
        if let Some(slot) = mask.first_mut() {
            *slot = true;
        }
        let mut bytes = vec![0, 1];
        bytes.extend_from_slice(&(code_len as u8).to_le_bytes());
        bytes.extend_from_slice(&code);
        let mask_bytes = code_len.div_ceil(8);
        for i in 0..mask_bytes {
            let mut byte = 0u8;
            for bit in 0..8 {
                let idx = i * 8 + bit;
                if idx < mask.len() && mask.get(idx).copied().unwrap_or(false) {
                    byte |= 1 << bit;
                }
            }
            bytes.push(byte);
        }

        let program = decode_program(&bytes).unwrap();
        let memory = Memory::new(&[], &[], &[], &[]);
        let mut pvm = Pvm::new(program, memory, 1_000);
        let mut host = NullHost;
        pvm.run(&mut host).unwrap();
        assert_eq!(pvm.register(2), 12);
    }

    #[test]
    fn out_of_gas_terminates_execution() {
        let bytes = vec![0, 1, 1, 0x01, mask_byte(&[0])];
        let program = decode_program(&bytes).unwrap();
        let memory = Memory::new(&[], &[], &[], &[]);
        let mut pvm = Pvm::new(program, memory, 0);
        let mut host = NullHost;
        assert_eq!(pvm.run(&mut host), Err(PvmError::OutOfGas));
    }
}
