//! Type 4 encoders: load/store multiple, `push` and `pop`.

use super::EncodeSite;
use crate::error::IrError;
use crate::instr::Instruction;
use crate::opcode::{Family, Opcode, OpcodeInfo};
use crate::opnd::Operand;

/// Type 4 switch.
pub(super) fn encode_load_store_multiple(
    word: u32,
    instr: &Instruction,
    info: &OpcodeInfo,
    _site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    match info.family {
        // cond|100|P|U|0|W|L|Rn|register_list
        Family::LoadStoreMultiple => {
            let (list, mem) = if instr.opcode().is_load() {
                (instr.dst(0), instr.src(0))
            } else {
                (instr.src(0), instr.dst(0))
            };
            Ok(word | (mem.base().gpr_number() << 16) | list_bits(&list))
        }
        // Rn is fixed to sp.
        Family::PushPop => {
            let list = if instr.opcode() == Opcode::Push {
                instr.src(0)
            } else {
                instr.dst(0)
            };
            Ok(word | list_bits(&list))
        }
        other => unreachable!("{:?} is not a type 4 family", other),
    }
}

fn list_bits(op: &Operand) -> u32 {
    match op {
        Operand::RegList(mask) => u32::from(*mask),
        other => unreachable!("expected a register list, found {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use crate::create;
    use crate::encode::encode;
    use crate::instr::{Cond, InstrFlags, Instruction};
    use crate::opcode::Opcode;
    use crate::reg::Reg;

    fn arm(instr: &Instruction) -> u32 {
        let mut buf = [0u8; 4];
        encode(instr, &mut buf, 0).unwrap();
        u32::from_le_bytes(buf)
    }

    #[test]
    fn push_and_pop() {
        // push {r4, lr} → E92D4010
        assert_eq!(arm(&create::push(&[Reg::R4, Reg::LR])), 0xE92D_4010);
        // pop {r4, pc} → E8BD8010
        assert_eq!(arm(&create::pop(&[Reg::R4, Reg::PC])), 0xE8BD_8010);
        // popne {r0-r3} → 18BD000F
        let popne = create::pop(&[Reg::R0, Reg::R1, Reg::R2, Reg::R3]).with_cond(Cond::Ne);
        assert_eq!(arm(&popne), 0x18BD_000F);
    }

    #[test]
    fn block_transfers() {
        // ldm r0!, {r1, r2} → E8B00006
        let ldm = create::load_multiple(Opcode::Ldm, Reg::R0, &[Reg::R1, Reg::R2])
            .with_flags(InstrFlags::W);
        assert_eq!(arm(&ldm), 0xE8B0_0006);
        // stmdb sp!, {r4, lr} → E92D4010, the same word as push
        let stmdb = create::store_multiple(Opcode::Stmdb, Reg::SP, &[Reg::R4, Reg::LR])
            .with_flags(InstrFlags::W);
        assert_eq!(arm(&stmdb), 0xE92D_4010);
        // stmib r0, {r0} → E9800001
        assert_eq!(arm(&create::store_multiple(Opcode::Stmib, Reg::R0, &[Reg::R0])), 0xE980_0001);
        // ldmda r1, {r2} → E8110004
        assert_eq!(arm(&create::load_multiple(Opcode::Ldmda, Reg::R1, &[Reg::R2])), 0xE811_0004);
    }

    #[test]
    fn empty_list_has_no_encoding() {
        let empty = create::store_multiple(Opcode::Stm, Reg::R0, &[]);
        assert!(encode(&empty, &mut [0u8; 4], 0).is_err());
    }
}
