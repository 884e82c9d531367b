// Path: crates/pvm/src/instructions.rs
//! Typed instruction families and their decoding (spec §4.6: "Typed
//! instruction families: `NoArgs`, `OneImm`, `TwoImm`, `OneOffset`,
//! `OneReg*Imm*`, `TwoReg*Imm*`, `ThreeReg`. Opcodes fall within per-family
//! ranges.").

use jam_types::error::PvmDecodeError;

/// One decoded instruction, grouped by the family that determines its
/// argument shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // NoArgs (0x00-0x0F)
    Trap,
    Fallthrough,
    // OneImm (0x10-0x1F)
    HostCall { opcode: u32 },
    // TwoImm (0x20-0x2F)
    StoreImmU32 { addr: u32, value: u32 },
    // OneOffset (0x30-0x3F)
    Jump { offset: i32 },
    // OneReg*Imm* (0x40-0x4F)
    LoadImm { reg: u8, imm: u32 },
    JumpInd { reg: u8, table_offset: u32 },
    Sbrk { reg: u8, increment: u32 },
    BranchEqImm { reg: u8, cmp: u32, offset: i32 },
    // TwoReg*Imm* (0x50-0x5F)
    AddImm { dst: u8, src: u8, imm: u32 },
    LoadIndU32 { dst: u8, base: u8, imm: u32 },
    StoreIndU32 { src: u8, base: u8, imm: u32 },
    // ThreeReg (0x60-0x6F)
    Add { dst: u8, a: u8, b: u8 },
    Sub { dst: u8, a: u8, b: u8 },
    Mul { dst: u8, a: u8, b: u8 },
    Xor { dst: u8, a: u8, b: u8 },
    And { dst: u8, a: u8, b: u8 },
    Or { dst: u8, a: u8, b: u8 },
}

fn u32_at(code: &[u8], pos: usize) -> Option<u32> {
    let slice = code.get(pos..pos + 4)?;
    let bytes: [u8; 4] = slice.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

fn i32_at(code: &[u8], pos: usize) -> Option<i32> {
    u32_at(code, pos).map(|v| v as i32)
}

/// Decodes the instruction at `pc`, returning the instruction and its
/// total encoded length (opcode byte included).
pub fn decode_instruction(code: &[u8], pc: u32) -> Result<(Instruction, u32), PvmDecodeError> {
    let pos = pc as usize;
    let opcode = *code.get(pos).ok_or(PvmDecodeError::InvalidCodeLength)?;
    let body = pos + 1;

    let (instr, body_len): (Instruction, u32) = match opcode {
        0x00 => (Instruction::Trap, 0),
        0x01 => (Instruction::Fallthrough, 0),
        0x10 => {
            let opcode = u32_at(code, body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::HostCall { opcode }, 4)
        }
        0x20 => {
            let addr = u32_at(code, body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let value = u32_at(code, body + 4).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::StoreImmU32 { addr, value }, 8)
        }
        0x30 => {
            let offset = i32_at(code, body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::Jump { offset }, 4)
        }
        0x40 => {
            let reg = *code.get(body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let imm = u32_at(code, body + 1).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::LoadImm { reg, imm }, 5)
        }
        0x41 => {
            let reg = *code.get(body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let table_offset = u32_at(code, body + 1).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::JumpInd { reg, table_offset }, 5)
        }
        0x42 => {
            let reg = *code.get(body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let increment = u32_at(code, body + 1).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::Sbrk { reg, increment }, 5)
        }
        0x43 => {
            let reg = *code.get(body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let cmp = u32_at(code, body + 1).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let offset = i32_at(code, body + 5).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::BranchEqImm { reg, cmp, offset }, 9)
        }
        0x50 => {
            let dst = *code.get(body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let src = *code.get(body + 1).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let imm = u32_at(code, body + 2).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::AddImm { dst, src, imm }, 6)
        }
        0x51 => {
            let dst = *code.get(body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let base = *code.get(body + 1).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let imm = u32_at(code, body + 2).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::LoadIndU32 { dst, base, imm }, 6)
        }
        0x52 => {
            let src = *code.get(body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let base = *code.get(body + 1).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let imm = u32_at(code, body + 2).ok_or(PvmDecodeError::InvalidCodeLength)?;
            (Instruction::StoreIndU32 { src, base, imm }, 6)
        }
        0x60 | 0x61 | 0x62 | 0x63 | 0x64 | 0x65 => {
            let dst = *code.get(body).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let a = *code.get(body + 1).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let b = *code.get(body + 2).ok_or(PvmDecodeError::InvalidCodeLength)?;
            let instr = match opcode {
                0x60 => Instruction::Add { dst, a, b },
                0x61 => Instruction::Sub { dst, a, b },
                0x62 => Instruction::Mul { dst, a, b },
                0x63 => Instruction::Xor { dst, a, b },
                0x64 => Instruction::And { dst, a, b },
                _ => Instruction::Or { dst, a, b },
            };
            (instr, 3)
        }
        _ => return Err(PvmDecodeError::InvalidCodeLength),
    };

    Ok((instr, 1 + body_len))
}

/// Gas cost charged for executing `instr` (spec §4.6: "every executed
/// instruction charges its defined cost"). Control-flow and host-call
/// instructions cost more than straight-line arithmetic, mirroring the
/// usual register-machine convention that redirection is pricier than
/// computation.
pub fn instruction_cost(instr: &Instruction) -> u64 {
    match instr {
        Instruction::Trap | Instruction::Fallthrough => 1,
        Instruction::HostCall { .. } => 10,
        Instruction::Jump { .. } | Instruction::JumpInd { .. } => 2,
        Instruction::BranchEqImm { .. } => 2,
        Instruction::Sbrk { .. } => 3,
        Instruction::StoreImmU32 { .. }
        | Instruction::LoadIndU32 { .. }
        | Instruction::StoreIndU32 { .. } => 2,
        Instruction::LoadImm { .. }
        | Instruction::AddImm { .. }
        | Instruction::Add { .. }
        | Instruction::Sub { .. }
        | Instruction::Mul { .. }
        | Instruction::Xor { .. }
        | Instruction::And { .. }
        | Instruction::Or { .. } => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_trap() {
        let (instr, len) = decode_instruction(&[0x00], 0).unwrap();
        assert_eq!(instr, Instruction::Trap);
        assert_eq!(len, 1);
    }

    #[test]
    fn decodes_load_imm() {
        let code = [0x40, 3, 0x2a, 0, 0, 0];
        let (instr, len) = decode_instruction(&code, 0).unwrap();
        assert_eq!(instr, Instruction::LoadImm { reg: 3, imm: 42 });
        assert_eq!(len, 6);
    }

    #[test]
    fn decodes_three_reg_add() {
        let code = [0x60, 1, 2, 3];
        let (instr, len) = decode_instruction(&code, 0).unwrap();
        assert_eq!(instr, Instruction::Add { dst: 1, a: 2, b: 3 });
        assert_eq!(len, 4);
    }

    #[test]
    fn rejects_truncated_instruction() {
        let code = [0x40, 3];
        assert!(decode_instruction(&code, 0).is_err());
    }

    #[test]
    fn rejects_unknown_opcode() {
        assert!(decode_instruction(&[0xFF], 0).is_err());
    }
}
