//! Template matching.
//!
//! [`encoding_possible`] decides whether an instruction's operands fit one
//! template; [`get_encoding_info`] walks an opcode's chain and returns the
//! first template that fits.

use crate::encode::common::mem_parts;
use crate::instr::{InstrFlags, Instruction};
use crate::opnd::{Operand, MASK_G, MASK_NZCVQ, MASK_NZCVQG};
use crate::reg::Reg;
use crate::size::{immed_size_ok, OpndSize};
use crate::template::{templates_for, BitGroup, InstrTemplate, MemForm, OperandTemplate, OpndType};

/// Whether `op` has the type and size `tmpl` expects.
pub fn opnd_type_ok(instr: &Instruction, op: &Operand, tmpl: &OperandTemplate) -> bool {
    match tmpl.ty {
        OpndType::None => op.is_null(),
        OpndType::Reg(bank) => match op {
            Operand::Reg(reg) => {
                reg.bank() == Some(bank) && size_matches(op.size_of(), tmpl.size)
            }
            _ => false,
        },
        OpndType::GprNotPc => {
            matches!(op, Operand::Reg(reg) if reg.is_gpr() && *reg != Reg::PC)
                && size_matches(op.size_of(), tmpl.size)
        }
        OpndType::FixedReg(expected) => *op == Operand::Reg(expected),
        OpndType::StatusReg => matches!(op, Operand::Reg(Reg::Cpsr | Reg::Spsr)),
        OpndType::IndirReg => matches!(op, Operand::MemReg(reg) if reg.is_gpr()),
        OpndType::Mem(form) | OpndType::FloatMem(form) => {
            let size_ok = match instr.opcode().access_size() {
                Some(access) => size_matches(op.size_of(), access),
                None => size_matches(op.size_of(), tmpl.size),
            };
            size_ok && mem_form_ok(instr, op, form)
        }
        OpndType::Imm => match op {
            Operand::Immed { value, .. } => immed_size_ok(*value, tmpl.size),
            _ => false,
        },
        OpndType::J => matches!(op, Operand::Pc(_) | Operand::Instr(_)),
        OpndType::Mask => matches!(op, Operand::Mask(mask) if (1..=15).contains(mask)),
        OpndType::MaskApsr => {
            matches!(op, Operand::Mask(mask) if [MASK_NZCVQ, MASK_G, MASK_NZCVQG].contains(mask))
        }
        OpndType::RegList => matches!(op, Operand::RegList(mask) if *mask != 0),
    }
}

fn size_matches(actual: OpndSize, expected: OpndSize) -> bool {
    expected == OpndSize::Na || actual == OpndSize::Na || actual == expected
}

/// Whether a memory operand's addressing shape fits `form`.
///
/// Shapes the form cannot encode (an index where only a displacement fits,
/// an out-of-range or misaligned displacement, a non-power-of-two scale)
/// are rejected here rather than truncated by the encoder.
fn mem_form_ok(instr: &Instruction, op: &Operand, form: MemForm) -> bool {
    let pc_relative = matches!(form, MemForm::PcRel12 | MemForm::PcRel8);
    if let Operand::MemInstr { .. } = op {
        // The encoder computes and range-checks the final offset.
        return pc_relative;
    }
    let Some(parts) = mem_parts(op) else {
        return false;
    };
    if pc_relative {
        if parts.base != Reg::PC || parts.index != Reg::Null {
            return false;
        }
    } else if !parts.base.is_gpr() {
        return false;
    }

    let magnitude = parts.magnitude();
    let shape_ok = match form {
        MemForm::Imm12 | MemForm::PcRel12 => parts.index == Reg::Null && magnitude <= 4095,
        MemForm::Imm8 | MemForm::PcRel8 => parts.index == Reg::Null && magnitude <= 255,
        MemForm::Imm8x4 => parts.index == Reg::Null && magnitude <= 1020 && magnitude % 4 == 0,
        MemForm::Reg | MemForm::RegNoShift => {
            let scale_ok = match op {
                Operand::BaseDisp(bd) => {
                    bd.scale.is_power_of_two() && (form == MemForm::Reg || bd.scale == 1)
                }
                _ => false,
            };
            parts.index.is_gpr() && parts.index != Reg::PC && parts.disp == 0 && scale_ok
        }
    };
    if !shape_ok {
        return false;
    }

    // The U flag selects add or subtract and must agree with the operand.
    if instr.opcode().has_u_flag() {
        let up = instr.flags().contains(InstrFlags::U);
        let agrees = if parts.index != Reg::Null {
            up != parts.subtract
        } else {
            parts.disp == 0 || (parts.disp > 0) == up
        };
        if !agrees {
            return false;
        }
    }
    true
}

/// Whether `instr` fits `tmpl`.
pub fn encoding_possible(instr: &Instruction, tmpl: &InstrTemplate) -> bool {
    let op = instr.opcode();
    if instr.shift().is_some() && !op.has_shift() {
        return false;
    }
    let flags = instr.flags();
    if !flags.contains(tmpl.required) || flags.intersects(tmpl.cleared) {
        return false;
    }
    if instr.num_dsts() != tmpl.num_dsts() || instr.num_srcs() != tmpl.num_srcs() {
        return false;
    }

    let mut claims: [Option<Operand>; BitGroup::COUNT] = [None; BitGroup::COUNT];
    let slots = instr
        .dsts()
        .iter()
        .zip(tmpl.dsts.iter())
        .chain(instr.srcs().iter().zip(tmpl.srcs.iter()));
    for (operand, slot) in slots {
        if !opnd_type_ok(instr, operand, slot) {
            return false;
        }
        let Some(group) = slot.bits else {
            continue;
        };
        match claims[group.index()] {
            Some(prev) if !same_field_value(&prev, operand) => {
                log::debug!(
                    "{}: {} and {} collide in {:?}",
                    op,
                    prev,
                    operand,
                    group
                );
                return false;
            }
            Some(_) => {}
            None => claims[group.index()] = Some(*operand),
        }
    }
    true
}

/// Whether two operands claiming the same field encode the same value.
fn same_field_value(a: &Operand, b: &Operand) -> bool {
    match (a, b) {
        (Operand::Reg(reg), mem) | (mem, Operand::Reg(reg)) if mem.is_memory_reference() => {
            mem.base() == *reg
        }
        _ if a.is_memory_reference() && b.is_memory_reference() => a.base() == b.base(),
        _ => a.same(b),
    }
}

/// First template in the opcode's chain that `instr` fits.
pub fn get_encoding_info(instr: &Instruction) -> Option<&'static InstrTemplate> {
    let found = templates_for(instr.opcode())
        .iter()
        .find(|tmpl| encoding_possible(instr, tmpl));
    if found.is_none() {
        log::debug!("no template of '{}' accepts {}", instr.opcode(), instr);
    }
    found
}

/// Whether any template of the instruction's opcode accepts it.
pub fn instr_is_encoding_possible(instr: &Instruction) -> bool {
    get_encoding_info(instr).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create;
    use crate::instr::{AddrMode, ShiftType, MAX_DSTS, MAX_SRCS};
    use crate::opcode::Opcode;
    use crate::opnd::BaseDisp;
    use crate::reg::RegBank;

    const NONE: OperandTemplate = OperandTemplate {
        ty: OpndType::None,
        size: OpndSize::Na,
        bits: None,
    };

    fn shared_field_template() -> InstrTemplate {
        let rd = OperandTemplate {
            ty: OpndType::Reg(RegBank::Gpr),
            size: OpndSize::Bytes4,
            bits: Some(BitGroup::Field12),
        };
        let mut srcs = [NONE; MAX_SRCS];
        srcs[0] = rd;
        let mut dsts = [NONE; MAX_DSTS];
        dsts[0] = rd;
        InstrTemplate {
            dsts,
            srcs,
            required: InstrFlags::empty(),
            cleared: InstrFlags::empty(),
        }
    }

    #[test]
    fn shared_bits_require_identical_operands() {
        let tmpl = shared_field_template();
        let differ = Instruction::build(
            Opcode::Clz,
            &[Operand::reg(Reg::R1)],
            &[Operand::reg(Reg::R2)],
        );
        assert!(!encoding_possible(&differ, &tmpl));
        let same = Instruction::build(
            Opcode::Clz,
            &[Operand::reg(Reg::R1)],
            &[Operand::reg(Reg::R1)],
        );
        assert!(encoding_possible(&same, &tmpl));
    }

    #[test]
    fn accumulating_multiply_needs_matching_halves() {
        let ok = create::mul_long_acc(Opcode::Umlal, Reg::R0, Reg::R1, Reg::R2, Reg::R3);
        assert!(instr_is_encoding_possible(&ok));
        let mut bad = ok.clone();
        bad.set_src(0, Operand::reg(Reg::R5));
        assert!(!instr_is_encoding_possible(&bad));
    }

    #[test]
    fn pc_is_refused_where_1111_means_another_instruction() {
        for op in [Opcode::Smlad, Opcode::Smlsd, Opcode::Smmla] {
            let acc = create::media_mul_acc(op, Reg::R0, Reg::R1, Reg::R2, Reg::R3);
            assert!(instr_is_encoding_possible(&acc), "{:?}", op);
            let pc = create::media_mul_acc(op, Reg::R0, Reg::R1, Reg::R2, Reg::PC);
            assert!(!instr_is_encoding_possible(&pc), "{:?}", op);
        }
        assert!(instr_is_encoding_possible(&create::bfi(Reg::R0, Reg::R1, 8, 4)));
        assert!(!instr_is_encoding_possible(&create::bfi(Reg::R0, Reg::PC, 8, 4)));
    }

    #[test]
    fn displacement_ranges() {
        let ldr = |disp| create::load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, disp, AddrMode::Offset);
        assert!(instr_is_encoding_possible(&ldr(4095)));
        assert!(instr_is_encoding_possible(&ldr(-4095)));
        assert!(!instr_is_encoding_possible(&ldr(4096)));
        let ldrh = |disp| create::load_store_imm(Opcode::LdrhImm, Reg::R0, Reg::R1, disp, AddrMode::Offset);
        assert!(instr_is_encoding_possible(&ldrh(255)));
        assert!(!instr_is_encoding_possible(&ldrh(256)));
        let vldr = |disp| create::vldr(Reg::D0, Reg::R1, disp);
        assert!(instr_is_encoding_possible(&vldr(1020)));
        assert!(!instr_is_encoding_possible(&vldr(1022)));
        assert!(!instr_is_encoding_possible(&vldr(1024)));
    }

    #[test]
    fn index_rejected_where_only_displacement_fits() {
        let mut ldr = create::load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, 0, AddrMode::Offset);
        let indexed = BaseDisp::indexed(Reg::R1, Reg::R2, 1, false, OpndSize::Bytes4);
        ldr.set_src(0, Operand::BaseDisp(indexed));
        assert!(!instr_is_encoding_possible(&ldr));
    }

    #[test]
    fn scaled_index_only_in_word_forms() {
        let ldr = create::load_store_reg(Opcode::LdrReg, Reg::R0, Reg::R1, Reg::R2, 4, false, AddrMode::Offset);
        assert!(instr_is_encoding_possible(&ldr));
        let ldrh = create::load_store_reg(Opcode::LdrhReg, Reg::R0, Reg::R1, Reg::R2, 4, false, AddrMode::Offset);
        assert!(!instr_is_encoding_possible(&ldrh));
        let odd = create::load_store_reg(Opcode::LdrReg, Reg::R0, Reg::R1, Reg::R2, 3, false, AddrMode::Offset);
        assert!(!instr_is_encoding_possible(&odd));
    }

    #[test]
    fn u_flag_must_agree_with_sign() {
        let mut ldr = create::load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, -8, AddrMode::Offset);
        assert!(instr_is_encoding_possible(&ldr));
        ldr.set_flags(ldr.flags() | InstrFlags::U);
        assert!(!instr_is_encoding_possible(&ldr));
    }

    #[test]
    fn addressing_mode_selects_template() {
        for mode in [AddrMode::Offset, AddrMode::PreIndex, AddrMode::PostIndex] {
            let ldr = create::load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, 4, mode);
            assert!(instr_is_encoding_possible(&ldr), "{:?}", mode);
        }
        let mut unprivileged = create::load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, 4, AddrMode::PostIndex);
        unprivileged.set_flags(unprivileged.flags() | InstrFlags::W);
        assert!(!instr_is_encoding_possible(&unprivileged));
    }

    #[test]
    fn shift_only_on_shifting_opcodes() {
        let mut clz = create::clz(Reg::R0, Reg::R1);
        assert!(instr_is_encoding_possible(&clz));
        clz.set_shift(Some(ShiftType::Lsl));
        assert!(!instr_is_encoding_possible(&clz));
    }

    #[test]
    fn rotated_immediates_and_masks() {
        assert!(instr_is_encoding_possible(&create::dp_move_imm(Opcode::MovImm, Reg::R0, 0xFF00)));
        assert!(!instr_is_encoding_possible(&create::dp_move_imm(Opcode::MovImm, Reg::R0, 0x1FF)));
        assert!(instr_is_encoding_possible(&create::msr_reg(Reg::Cpsr, MASK_G, Reg::R0)));
        assert!(instr_is_encoding_possible(&create::msr_reg(Reg::Spsr, 0b1001, Reg::R0)));
        assert!(!instr_is_encoding_possible(&create::msr_reg(Reg::Cpsr, 0, Reg::R0)));
    }

    #[test]
    fn pc_relative_literal_needs_pc_base() {
        let lit = create::load_literal(Opcode::LdrLit, Reg::R0, -16);
        assert!(instr_is_encoding_possible(&lit));
        let mut wrong = lit.clone();
        wrong.set_src(0, Operand::base_disp(Reg::R1, 16, OpndSize::Bytes4));
        assert!(!instr_is_encoding_possible(&wrong));
    }

    #[test]
    fn operand_counts_must_match() {
        let ldr = Instruction::build(Opcode::LdrImm, &[Operand::reg(Reg::R0)], &[]);
        assert!(!instr_is_encoding_possible(&ldr));
        assert!(!instr_is_encoding_possible(&Instruction::label()));
    }
}
