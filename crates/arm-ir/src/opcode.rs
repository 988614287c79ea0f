//! A32 opcodes and their fixed encoding bits.
//!
//! Every opcode row records the instruction-type class (bits 27..25), the
//! primary opcode field (bits 24..20), any other bits the opcode fixes, and
//! the secondary opcode (bits 7..0). Bits that vary with operands are owned
//! by the opcode's [`Family`], which names the encoder that packs them.
//!
//! ```text
//! 31..28  27..25  24..20   19..8              7..0
//! cond    type    primary  operands / fixed   secondary | operands
//! ```

use core::fmt;

use crate::size::OpndSize;

/// Top-level instruction-type class, bits 27..25 of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum InstrType {
    /// Data processing (register forms), multiply, misc and extra load/store.
    DataProcessingAndEls = 0,
    /// Data processing with a modified immediate, `movw`/`movt`, `msr`, hints.
    DataProcessingImmediate = 1,
    /// Word and byte load/store with an immediate offset.
    LoadStore1 = 2,
    /// Word and byte load/store with a register offset, and media.
    LoadStore2AndMedia = 3,
    /// Load/store multiple.
    LoadStoreMultiple = 4,
    /// Branch and branch with link.
    Branch = 5,
    /// Coprocessor load/store and two-register transfers.
    CoprocessorDataMovement = 6,
    /// Coprocessor data operations, register transfers and `svc`.
    AdvancedCoprocessorAndSyscall = 7,
}

impl InstrType {
    /// All classes in encoding order.
    pub const ALL: [InstrType; 8] = [
        InstrType::DataProcessingAndEls,
        InstrType::DataProcessingImmediate,
        InstrType::LoadStore1,
        InstrType::LoadStore2AndMedia,
        InstrType::LoadStoreMultiple,
        InstrType::Branch,
        InstrType::CoprocessorDataMovement,
        InstrType::AdvancedCoprocessorAndSyscall,
    ];

    /// Class of the 3-bit field value.
    pub fn from_bits(bits: u32) -> InstrType {
        InstrType::ALL[(bits & 7) as usize]
    }
}

/// A group of opcodes sharing one bit layout and one encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Family {
    DpReg,
    DpRegMove,
    DpRegTest,
    DpRsr,
    DpRsrMove,
    DpRsrTest,
    Multiply,
    MultiplyAccumulate,
    MultiplyLong,
    BranchExchange,
    CountLeadingZeros,
    StatusRegRead,
    StatusRegWriteReg,
    Breakpoint,
    SaturatingArith,
    ExtraLoadStoreImm,
    ExtraLoadStoreReg,
    ExtraLoadStoreLit,
    DualLoadStoreImm,
    DualLoadStoreReg,
    LoadExclusive,
    StoreExclusive,
    DpImm,
    DpImmMove,
    DpImmTest,
    MoveWide,
    StatusRegWriteImm,
    Hint,
    AddressOfPc,
    LoadStoreImm,
    LoadLiteral,
    PreloadImm,
    Barrier,
    ClearExclusive,
    LoadStoreReg,
    Extend,
    Reverse,
    BitfieldExtract,
    BitfieldInsert,
    BitfieldClear,
    DualMultiply,
    MostSignificantMultiply,
    LoadStoreMultiple,
    PushPop,
    Branch,
    BranchLinkExchangeImm,
    CoprocLoadStore,
    CoprocTwoReg,
    VfpLoadStore,
    SupervisorCall,
    CoprocDataOp,
    CoprocRegTransfer,
    VfpDataOp,
    VfpCoreTransfer,
    VfpStatusTransfer,
}

impl Family {
    /// The instruction-type class whose dispatch switch handles this family.
    pub fn instr_type(self) -> InstrType {
        use Family::*;
        match self {
            DpReg | DpRegMove | DpRegTest | DpRsr | DpRsrMove | DpRsrTest | Multiply
            | MultiplyAccumulate | MultiplyLong | BranchExchange | CountLeadingZeros
            | StatusRegRead | StatusRegWriteReg | Breakpoint | SaturatingArith
            | ExtraLoadStoreImm | ExtraLoadStoreReg | ExtraLoadStoreLit | DualLoadStoreImm
            | DualLoadStoreReg | LoadExclusive | StoreExclusive => {
                InstrType::DataProcessingAndEls
            }
            DpImm | DpImmMove | DpImmTest | MoveWide | StatusRegWriteImm | Hint
            | AddressOfPc => InstrType::DataProcessingImmediate,
            LoadStoreImm | LoadLiteral | PreloadImm | Barrier | ClearExclusive => {
                InstrType::LoadStore1
            }
            LoadStoreReg | Extend | Reverse | BitfieldExtract | BitfieldInsert
            | BitfieldClear | DualMultiply | MostSignificantMultiply => {
                InstrType::LoadStore2AndMedia
            }
            LoadStoreMultiple | PushPop => InstrType::LoadStoreMultiple,
            Branch | BranchLinkExchangeImm => InstrType::Branch,
            CoprocLoadStore | CoprocTwoReg | VfpLoadStore => InstrType::CoprocessorDataMovement,
            SupervisorCall | CoprocDataOp | CoprocRegTransfer | VfpDataOp | VfpCoreTransfer
            | VfpStatusTransfer => InstrType::AdvancedCoprocessorAndSyscall,
        }
    }

    /// Bits written from operand values. Bits an opcode fixes override this.
    pub fn operand_mask(self) -> u32 {
        use Family::*;
        match self {
            DpReg => 0x000F_FFEF,
            DpRegMove => 0x0000_FFEF,
            DpRegTest => 0x000F_0FEF,
            DpRsr => 0x000F_FF6F,
            DpRsrMove => 0x0000_FF6F,
            DpRsrTest => 0x000F_0F6F,
            Multiply => 0x000F_0F0F,
            MultiplyAccumulate | MultiplyLong => 0x000F_FF0F,
            BranchExchange => 0x0000_000F,
            CountLeadingZeros => 0x0000_F00F,
            StatusRegRead => 0x0040_F000,
            StatusRegWriteReg => 0x004F_000F,
            Breakpoint => 0x000F_FF0F,
            SaturatingArith => 0x000F_F00F,
            ExtraLoadStoreImm | DualLoadStoreImm => 0x000F_FF0F,
            ExtraLoadStoreReg | DualLoadStoreReg => 0x000F_F00F,
            ExtraLoadStoreLit => 0x0000_FF0F,
            LoadExclusive => 0x000F_F000,
            StoreExclusive => 0x000F_F00F,
            DpImm => 0x000F_FFFF,
            DpImmMove => 0x0000_FFFF,
            DpImmTest => 0x000F_0FFF,
            MoveWide => 0x000F_FFFF,
            StatusRegWriteImm => 0x004F_0FFF,
            Hint | ClearExclusive => 0,
            AddressOfPc => 0x0000_FFFF,
            LoadStoreImm => 0x000F_FFFF,
            LoadLiteral => 0x0000_FFFF,
            PreloadImm => 0x000F_0FFF,
            Barrier => 0x0000_000F,
            LoadStoreReg => 0x000F_FF8F,
            Extend => 0x0000_FC0F,
            Reverse => 0x0000_F00F,
            BitfieldExtract | BitfieldInsert | BitfieldClear => 0x001F_FF8F,
            DualMultiply | MostSignificantMultiply => 0x000F_FF0F,
            LoadStoreMultiple => 0x000F_FFFF,
            PushPop => 0x0000_FFFF,
            Branch | BranchLinkExchangeImm | SupervisorCall => 0x00FF_FFFF,
            CoprocLoadStore | CoprocTwoReg => 0x000F_FFFF,
            VfpLoadStore => 0x004F_F0FF,
            CoprocDataOp => 0x00FF_FFEF,
            CoprocRegTransfer => 0x00EF_FFEF,
            VfpDataOp => 0x004F_F0AF,
            VfpCoreTransfer => 0x000F_F080,
            VfpStatusTransfer => 0x0000_F000,
        }
    }
}

/// Fixed encoding bits of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Instruction-type class, bits 27..25.
    pub ty: InstrType,
    /// Layout family and encoder.
    pub family: Family,
    /// Primary opcode, bits 24..20, with every variable flag clear.
    pub primary: u8,
    /// Other bits fixed by the opcode, already in position.
    pub fixed: u32,
    /// Secondary opcode, bits 7..0.
    pub secondary: u8,
}

macro_rules! opcodes {
    ($($variant:ident => $name:literal, $family:ident, $ty:ident, $primary:literal, $fixed:literal, $secondary:literal;)*) => {
        /// An A32 opcode.
        ///
        /// Distinct addressing forms of one mnemonic (`ldr` with an immediate,
        /// a register or a literal offset) are distinct opcodes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Opcode {
            /// Raw bits that have not been decoded.
            Undecoded,
            /// Zero-length marker used as a branch target.
            Label,
            $(
                #[allow(missing_docs)]
                $variant,
            )*
        }

        impl Opcode {
            /// Every opcode with a machine encoding.
            pub const KNOWN: &'static [Opcode] = &[$(Opcode::$variant,)*];

            /// Assembler mnemonic.
            pub fn name(self) -> &'static str {
                match self {
                    Opcode::Undecoded => "<raw>",
                    Opcode::Label => "<label>",
                    $(Opcode::$variant => $name,)*
                }
            }

            /// Fixed encoding bits, or `None` for the pseudo opcodes.
            pub fn info(self) -> Option<OpcodeInfo> {
                match self {
                    Opcode::Undecoded | Opcode::Label => None,
                    $(Opcode::$variant => Some(OpcodeInfo {
                        ty: InstrType::$ty,
                        family: Family::$family,
                        primary: $primary,
                        fixed: $fixed,
                        secondary: $secondary,
                    }),)*
                }
            }
        }
    };
}

opcodes! {
    // ── Data processing, register (shift by immediate) ─────────────────────
    AndReg => "and", DpReg, DataProcessingAndEls, 0b00000, 0, 0x00;
    EorReg => "eor", DpReg, DataProcessingAndEls, 0b00010, 0, 0x00;
    SubReg => "sub", DpReg, DataProcessingAndEls, 0b00100, 0, 0x00;
    RsbReg => "rsb", DpReg, DataProcessingAndEls, 0b00110, 0, 0x00;
    AddReg => "add", DpReg, DataProcessingAndEls, 0b01000, 0, 0x00;
    AdcReg => "adc", DpReg, DataProcessingAndEls, 0b01010, 0, 0x00;
    SbcReg => "sbc", DpReg, DataProcessingAndEls, 0b01100, 0, 0x00;
    RscReg => "rsc", DpReg, DataProcessingAndEls, 0b01110, 0, 0x00;
    TstReg => "tst", DpRegTest, DataProcessingAndEls, 0b10001, 0, 0x00;
    TeqReg => "teq", DpRegTest, DataProcessingAndEls, 0b10011, 0, 0x00;
    CmpReg => "cmp", DpRegTest, DataProcessingAndEls, 0b10101, 0, 0x00;
    CmnReg => "cmn", DpRegTest, DataProcessingAndEls, 0b10111, 0, 0x00;
    OrrReg => "orr", DpReg, DataProcessingAndEls, 0b11000, 0, 0x00;
    MovReg => "mov", DpRegMove, DataProcessingAndEls, 0b11010, 0, 0x00;
    BicReg => "bic", DpReg, DataProcessingAndEls, 0b11100, 0, 0x00;
    MvnReg => "mvn", DpRegMove, DataProcessingAndEls, 0b11110, 0, 0x00;

    // ── Data processing, register-shifted register ─────────────────────────
    AndRsr => "and", DpRsr, DataProcessingAndEls, 0b00000, 0, 0x10;
    EorRsr => "eor", DpRsr, DataProcessingAndEls, 0b00010, 0, 0x10;
    SubRsr => "sub", DpRsr, DataProcessingAndEls, 0b00100, 0, 0x10;
    RsbRsr => "rsb", DpRsr, DataProcessingAndEls, 0b00110, 0, 0x10;
    AddRsr => "add", DpRsr, DataProcessingAndEls, 0b01000, 0, 0x10;
    AdcRsr => "adc", DpRsr, DataProcessingAndEls, 0b01010, 0, 0x10;
    SbcRsr => "sbc", DpRsr, DataProcessingAndEls, 0b01100, 0, 0x10;
    RscRsr => "rsc", DpRsr, DataProcessingAndEls, 0b01110, 0, 0x10;
    TstRsr => "tst", DpRsrTest, DataProcessingAndEls, 0b10001, 0, 0x10;
    TeqRsr => "teq", DpRsrTest, DataProcessingAndEls, 0b10011, 0, 0x10;
    CmpRsr => "cmp", DpRsrTest, DataProcessingAndEls, 0b10101, 0, 0x10;
    CmnRsr => "cmn", DpRsrTest, DataProcessingAndEls, 0b10111, 0, 0x10;
    OrrRsr => "orr", DpRsr, DataProcessingAndEls, 0b11000, 0, 0x10;
    MovRsr => "mov", DpRsrMove, DataProcessingAndEls, 0b11010, 0, 0x10;
    BicRsr => "bic", DpRsr, DataProcessingAndEls, 0b11100, 0, 0x10;
    MvnRsr => "mvn", DpRsrMove, DataProcessingAndEls, 0b11110, 0, 0x10;

    // ── Multiply ───────────────────────────────────────────────────────────
    Mul => "mul", Multiply, DataProcessingAndEls, 0b00000, 0, 0x90;
    Mla => "mla", MultiplyAccumulate, DataProcessingAndEls, 0b00010, 0, 0x90;
    Mls => "mls", MultiplyAccumulate, DataProcessingAndEls, 0b00110, 0, 0x90;
    Umull => "umull", MultiplyLong, DataProcessingAndEls, 0b01000, 0, 0x90;
    Umlal => "umlal", MultiplyLong, DataProcessingAndEls, 0b01010, 0, 0x90;
    Smull => "smull", MultiplyLong, DataProcessingAndEls, 0b01100, 0, 0x90;
    Smlal => "smlal", MultiplyLong, DataProcessingAndEls, 0b01110, 0, 0x90;

    // ── Miscellaneous ──────────────────────────────────────────────────────
    Bx => "bx", BranchExchange, DataProcessingAndEls, 0b10010, 0x000F_FF00, 0x10;
    BlxReg => "blx", BranchExchange, DataProcessingAndEls, 0b10010, 0x000F_FF00, 0x30;
    Clz => "clz", CountLeadingZeros, DataProcessingAndEls, 0b10110, 0x000F_0F00, 0x10;
    Mrs => "mrs", StatusRegRead, DataProcessingAndEls, 0b10000, 0x000F_0000, 0x00;
    MsrReg => "msr", StatusRegWriteReg, DataProcessingAndEls, 0b10010, 0x0000_F000, 0x00;
    Bkpt => "bkpt", Breakpoint, DataProcessingAndEls, 0b10010, 0, 0x70;
    Qadd => "qadd", SaturatingArith, DataProcessingAndEls, 0b10000, 0, 0x50;
    Qsub => "qsub", SaturatingArith, DataProcessingAndEls, 0b10010, 0, 0x50;
    Qdadd => "qdadd", SaturatingArith, DataProcessingAndEls, 0b10100, 0, 0x50;
    Qdsub => "qdsub", SaturatingArith, DataProcessingAndEls, 0b10110, 0, 0x50;

    // ── Extra load/store ───────────────────────────────────────────────────
    StrhImm => "strh", ExtraLoadStoreImm, DataProcessingAndEls, 0b00100, 0, 0xB0;
    LdrhImm => "ldrh", ExtraLoadStoreImm, DataProcessingAndEls, 0b00101, 0, 0xB0;
    LdrsbImm => "ldrsb", ExtraLoadStoreImm, DataProcessingAndEls, 0b00101, 0, 0xD0;
    LdrshImm => "ldrsh", ExtraLoadStoreImm, DataProcessingAndEls, 0b00101, 0, 0xF0;
    LdrdImm => "ldrd", DualLoadStoreImm, DataProcessingAndEls, 0b00100, 0, 0xD0;
    StrdImm => "strd", DualLoadStoreImm, DataProcessingAndEls, 0b00100, 0, 0xF0;
    StrhReg => "strh", ExtraLoadStoreReg, DataProcessingAndEls, 0b00000, 0, 0xB0;
    LdrhReg => "ldrh", ExtraLoadStoreReg, DataProcessingAndEls, 0b00001, 0, 0xB0;
    LdrsbReg => "ldrsb", ExtraLoadStoreReg, DataProcessingAndEls, 0b00001, 0, 0xD0;
    LdrshReg => "ldrsh", ExtraLoadStoreReg, DataProcessingAndEls, 0b00001, 0, 0xF0;
    LdrdReg => "ldrd", DualLoadStoreReg, DataProcessingAndEls, 0b00000, 0, 0xD0;
    StrdReg => "strd", DualLoadStoreReg, DataProcessingAndEls, 0b00000, 0, 0xF0;
    LdrhLit => "ldrh", ExtraLoadStoreLit, DataProcessingAndEls, 0b10101, 0x000F_0000, 0xB0;
    LdrsbLit => "ldrsb", ExtraLoadStoreLit, DataProcessingAndEls, 0b10101, 0x000F_0000, 0xD0;
    LdrshLit => "ldrsh", ExtraLoadStoreLit, DataProcessingAndEls, 0b10101, 0x000F_0000, 0xF0;
    LdrdLit => "ldrd", ExtraLoadStoreLit, DataProcessingAndEls, 0b10100, 0x000F_0000, 0xD0;
    Ldrex => "ldrex", LoadExclusive, DataProcessingAndEls, 0b11001, 0x0000_0F00, 0x9F;
    Strex => "strex", StoreExclusive, DataProcessingAndEls, 0b11000, 0x0000_0F00, 0x90;

    // ── Data processing, immediate ─────────────────────────────────────────
    AndImm => "and", DpImm, DataProcessingImmediate, 0b00000, 0, 0x00;
    EorImm => "eor", DpImm, DataProcessingImmediate, 0b00010, 0, 0x00;
    SubImm => "sub", DpImm, DataProcessingImmediate, 0b00100, 0, 0x00;
    RsbImm => "rsb", DpImm, DataProcessingImmediate, 0b00110, 0, 0x00;
    AddImm => "add", DpImm, DataProcessingImmediate, 0b01000, 0, 0x00;
    AdcImm => "adc", DpImm, DataProcessingImmediate, 0b01010, 0, 0x00;
    SbcImm => "sbc", DpImm, DataProcessingImmediate, 0b01100, 0, 0x00;
    RscImm => "rsc", DpImm, DataProcessingImmediate, 0b01110, 0, 0x00;
    TstImm => "tst", DpImmTest, DataProcessingImmediate, 0b10001, 0, 0x00;
    TeqImm => "teq", DpImmTest, DataProcessingImmediate, 0b10011, 0, 0x00;
    CmpImm => "cmp", DpImmTest, DataProcessingImmediate, 0b10101, 0, 0x00;
    CmnImm => "cmn", DpImmTest, DataProcessingImmediate, 0b10111, 0, 0x00;
    OrrImm => "orr", DpImm, DataProcessingImmediate, 0b11000, 0, 0x00;
    MovImm => "mov", DpImmMove, DataProcessingImmediate, 0b11010, 0, 0x00;
    BicImm => "bic", DpImm, DataProcessingImmediate, 0b11100, 0, 0x00;
    MvnImm => "mvn", DpImmMove, DataProcessingImmediate, 0b11110, 0, 0x00;
    Movw => "movw", MoveWide, DataProcessingImmediate, 0b10000, 0, 0x00;
    Movt => "movt", MoveWide, DataProcessingImmediate, 0b10100, 0, 0x00;
    MsrImm => "msr", StatusRegWriteImm, DataProcessingImmediate, 0b10010, 0x0000_F000, 0x00;
    Nop => "nop", Hint, DataProcessingImmediate, 0b10010, 0x0000_F000, 0x00;
    Yield => "yield", Hint, DataProcessingImmediate, 0b10010, 0x0000_F000, 0x01;
    Wfe => "wfe", Hint, DataProcessingImmediate, 0b10010, 0x0000_F000, 0x02;
    Wfi => "wfi", Hint, DataProcessingImmediate, 0b10010, 0x0000_F000, 0x03;
    Sev => "sev", Hint, DataProcessingImmediate, 0b10010, 0x0000_F000, 0x04;
    Adr => "adr", AddressOfPc, DataProcessingImmediate, 0b01000, 0x000F_0000, 0x00;

    // ── Load/store word and byte, immediate offset ─────────────────────────
    StrImm => "str", LoadStoreImm, LoadStore1, 0b00000, 0, 0x00;
    LdrImm => "ldr", LoadStoreImm, LoadStore1, 0b00001, 0, 0x00;
    StrbImm => "strb", LoadStoreImm, LoadStore1, 0b00100, 0, 0x00;
    LdrbImm => "ldrb", LoadStoreImm, LoadStore1, 0b00101, 0, 0x00;
    LdrLit => "ldr", LoadLiteral, LoadStore1, 0b10001, 0x000F_0000, 0x00;
    LdrbLit => "ldrb", LoadLiteral, LoadStore1, 0b10101, 0x000F_0000, 0x00;
    Pld => "pld", PreloadImm, LoadStore1, 0b10101, 0x0000_F000, 0x00;
    Dmb => "dmb", Barrier, LoadStore1, 0b10111, 0x000F_F000, 0x50;
    Dsb => "dsb", Barrier, LoadStore1, 0b10111, 0x000F_F000, 0x40;
    Isb => "isb", Barrier, LoadStore1, 0b10111, 0x000F_F000, 0x60;
    Clrex => "clrex", ClearExclusive, LoadStore1, 0b10111, 0x000F_F00F, 0x10;

    // ── Load/store word and byte, register offset; media ───────────────────
    StrReg => "str", LoadStoreReg, LoadStore2AndMedia, 0b00000, 0, 0x00;
    LdrReg => "ldr", LoadStoreReg, LoadStore2AndMedia, 0b00001, 0, 0x00;
    StrbReg => "strb", LoadStoreReg, LoadStore2AndMedia, 0b00100, 0, 0x00;
    LdrbReg => "ldrb", LoadStoreReg, LoadStore2AndMedia, 0b00101, 0, 0x00;
    Sxtb => "sxtb", Extend, LoadStore2AndMedia, 0b01010, 0x000F_0000, 0x70;
    Sxth => "sxth", Extend, LoadStore2AndMedia, 0b01011, 0x000F_0000, 0x70;
    Uxtb => "uxtb", Extend, LoadStore2AndMedia, 0b01110, 0x000F_0000, 0x70;
    Uxth => "uxth", Extend, LoadStore2AndMedia, 0b01111, 0x000F_0000, 0x70;
    Rev => "rev", Reverse, LoadStore2AndMedia, 0b01011, 0x000F_0F00, 0x30;
    Rev16 => "rev16", Reverse, LoadStore2AndMedia, 0b01011, 0x000F_0F00, 0xB0;
    Rbit => "rbit", Reverse, LoadStore2AndMedia, 0b01111, 0x000F_0F00, 0x30;
    Revsh => "revsh", Reverse, LoadStore2AndMedia, 0b01111, 0x000F_0F00, 0xB0;
    Sbfx => "sbfx", BitfieldExtract, LoadStore2AndMedia, 0b11010, 0, 0x50;
    Ubfx => "ubfx", BitfieldExtract, LoadStore2AndMedia, 0b11110, 0, 0x50;
    Bfi => "bfi", BitfieldInsert, LoadStore2AndMedia, 0b11100, 0, 0x10;
    Bfc => "bfc", BitfieldClear, LoadStore2AndMedia, 0b11100, 0x0000_000F, 0x10;
    Smuad => "smuad", DualMultiply, LoadStore2AndMedia, 0b10000, 0x0000_F000, 0x10;
    Smusd => "smusd", DualMultiply, LoadStore2AndMedia, 0b10000, 0x0000_F000, 0x50;
    Smlad => "smlad", DualMultiply, LoadStore2AndMedia, 0b10000, 0, 0x10;
    Smlsd => "smlsd", DualMultiply, LoadStore2AndMedia, 0b10000, 0, 0x50;
    Smmul => "smmul", MostSignificantMultiply, LoadStore2AndMedia, 0b10101, 0x0000_F000, 0x10;
    Smmla => "smmla", MostSignificantMultiply, LoadStore2AndMedia, 0b10101, 0, 0x10;

    // ── Load/store multiple ────────────────────────────────────────────────
    Stmda => "stmda", LoadStoreMultiple, LoadStoreMultiple, 0b00000, 0, 0x00;
    Ldmda => "ldmda", LoadStoreMultiple, LoadStoreMultiple, 0b00001, 0, 0x00;
    Stm => "stm", LoadStoreMultiple, LoadStoreMultiple, 0b01000, 0, 0x00;
    Ldm => "ldm", LoadStoreMultiple, LoadStoreMultiple, 0b01001, 0, 0x00;
    Stmdb => "stmdb", LoadStoreMultiple, LoadStoreMultiple, 0b10000, 0, 0x00;
    Ldmdb => "ldmdb", LoadStoreMultiple, LoadStoreMultiple, 0b10001, 0, 0x00;
    Stmib => "stmib", LoadStoreMultiple, LoadStoreMultiple, 0b11000, 0, 0x00;
    Ldmib => "ldmib", LoadStoreMultiple, LoadStoreMultiple, 0b11001, 0, 0x00;
    Push => "push", PushPop, LoadStoreMultiple, 0b10010, 0x000D_0000, 0x00;
    Pop => "pop", PushPop, LoadStoreMultiple, 0b01011, 0x000D_0000, 0x00;

    // ── Branch ─────────────────────────────────────────────────────────────
    B => "b", Branch, Branch, 0b00000, 0, 0x00;
    Bl => "bl", Branch, Branch, 0b10000, 0, 0x00;
    BlxImm => "blx", BranchLinkExchangeImm, Branch, 0b00000, 0, 0x00;

    // ── Coprocessor data movement ──────────────────────────────────────────
    Stc => "stc", CoprocLoadStore, CoprocessorDataMovement, 0b00000, 0, 0x00;
    Ldc => "ldc", CoprocLoadStore, CoprocessorDataMovement, 0b00001, 0, 0x00;
    Mcrr => "mcrr", CoprocTwoReg, CoprocessorDataMovement, 0b00100, 0, 0x00;
    Mrrc => "mrrc", CoprocTwoReg, CoprocessorDataMovement, 0b00101, 0, 0x00;
    VstrS => "vstr", VfpLoadStore, CoprocessorDataMovement, 0b10000, 0x0000_0A00, 0x00;
    VldrS => "vldr", VfpLoadStore, CoprocessorDataMovement, 0b10001, 0x0000_0A00, 0x00;
    VstrD => "vstr", VfpLoadStore, CoprocessorDataMovement, 0b10000, 0x0000_0B00, 0x00;
    VldrD => "vldr", VfpLoadStore, CoprocessorDataMovement, 0b10001, 0x0000_0B00, 0x00;

    // ── Coprocessor operations and supervisor call ─────────────────────────
    Svc => "svc", SupervisorCall, AdvancedCoprocessorAndSyscall, 0b10000, 0, 0x00;
    Cdp => "cdp", CoprocDataOp, AdvancedCoprocessorAndSyscall, 0b00000, 0, 0x00;
    Mcr => "mcr", CoprocRegTransfer, AdvancedCoprocessorAndSyscall, 0b00000, 0, 0x10;
    Mrc => "mrc", CoprocRegTransfer, AdvancedCoprocessorAndSyscall, 0b00001, 0, 0x10;
    VaddS => "vadd.f32", VfpDataOp, AdvancedCoprocessorAndSyscall, 0b00011, 0x0000_0A00, 0x00;
    VaddD => "vadd.f64", VfpDataOp, AdvancedCoprocessorAndSyscall, 0b00011, 0x0000_0B00, 0x00;
    VsubS => "vsub.f32", VfpDataOp, AdvancedCoprocessorAndSyscall, 0b00011, 0x0000_0A00, 0x40;
    VsubD => "vsub.f64", VfpDataOp, AdvancedCoprocessorAndSyscall, 0b00011, 0x0000_0B00, 0x40;
    VmulS => "vmul.f32", VfpDataOp, AdvancedCoprocessorAndSyscall, 0b00010, 0x0000_0A00, 0x00;
    VmulD => "vmul.f64", VfpDataOp, AdvancedCoprocessorAndSyscall, 0b00010, 0x0000_0B00, 0x00;
    VdivS => "vdiv.f32", VfpDataOp, AdvancedCoprocessorAndSyscall, 0b01000, 0x0000_0A00, 0x00;
    VdivD => "vdiv.f64", VfpDataOp, AdvancedCoprocessorAndSyscall, 0b01000, 0x0000_0B00, 0x00;
    VmovSr => "vmov", VfpCoreTransfer, AdvancedCoprocessorAndSyscall, 0b00000, 0x0000_0A00, 0x10;
    VmovRs => "vmov", VfpCoreTransfer, AdvancedCoprocessorAndSyscall, 0b00001, 0x0000_0A00, 0x10;
    Vmrs => "vmrs", VfpStatusTransfer, AdvancedCoprocessorAndSyscall, 0b01111, 0x0001_0A00, 0x10;
    Vmsr => "vmsr", VfpStatusTransfer, AdvancedCoprocessorAndSyscall, 0b01110, 0x0001_0A00, 0x10;
}

// ── Flag bit positions ───────────────────────────────────────────────────

/// P (pre-index) flag position.
pub(crate) const P_BIT: u32 = 1 << 24;
/// U (add offset) flag position.
pub(crate) const U_BIT: u32 = 1 << 23;
/// D (long transfer) flag position.
pub(crate) const D_BIT: u32 = 1 << 22;
/// W (writeback) flag position.
pub(crate) const W_BIT: u32 = 1 << 21;
/// S (set flags) flag position.
pub(crate) const S_BIT: u32 = 1 << 20;
/// H (halfword target) flag position.
pub(crate) const H_BIT: u32 = 1 << 24;
/// M (swap halves of `Rm`) flag position in the dual multiplies.
pub(crate) const M_BIT: u32 = 1 << 5;
/// R (round) flag position in the most-significant multiplies.
pub(crate) const R_BIT: u32 = 1 << 5;

impl Opcode {
    /// Instruction-type class, or `None` for the pseudo opcodes.
    pub fn instr_type(self) -> Option<InstrType> {
        self.info().map(|info| info.ty)
    }

    /// Layout family, or `None` for the pseudo opcodes.
    pub fn family(self) -> Option<Family> {
        self.info().map(|info| info.family)
    }

    /// Whether the opcode encodes condition `1111` regardless of the
    /// instruction's stored condition.
    pub fn is_unconditional(self) -> bool {
        matches!(
            self,
            Opcode::Pld
                | Opcode::Dmb
                | Opcode::Dsb
                | Opcode::Isb
                | Opcode::Clrex
                | Opcode::BlxImm
        )
    }

    /// Whether the S (set flags) bit is a per-instruction choice.
    pub fn has_s_flag(self) -> bool {
        match self.family() {
            Some(
                Family::DpReg
                | Family::DpRegMove
                | Family::DpRsr
                | Family::DpRsrMove
                | Family::DpImm
                | Family::DpImmMove
                | Family::Multiply
                | Family::MultiplyLong,
            ) => true,
            Some(Family::MultiplyAccumulate) => self == Opcode::Mla,
            _ => false,
        }
    }

    /// Whether the P (pre-index) bit is a per-instruction choice.
    pub fn has_p_flag(self) -> bool {
        matches!(
            self.family(),
            Some(
                Family::LoadStoreImm
                    | Family::LoadStoreReg
                    | Family::ExtraLoadStoreImm
                    | Family::ExtraLoadStoreReg
                    | Family::DualLoadStoreImm
                    | Family::DualLoadStoreReg
                    | Family::CoprocLoadStore
            )
        )
    }

    /// Whether the W (writeback) bit is a per-instruction choice.
    pub fn has_w_flag(self) -> bool {
        self.has_p_flag() || self.family() == Some(Family::LoadStoreMultiple)
    }

    /// Whether the U (add offset) bit is a per-instruction choice.
    pub fn has_u_flag(self) -> bool {
        self.has_p_flag()
            || matches!(
                self.family(),
                Some(
                    Family::LoadLiteral
                        | Family::ExtraLoadStoreLit
                        | Family::PreloadImm
                        | Family::VfpLoadStore
                )
            )
    }

    /// Whether the D (long coprocessor transfer) bit is a per-instruction choice.
    pub fn has_d_flag(self) -> bool {
        self.family() == Some(Family::CoprocLoadStore)
    }

    /// Whether the H bit is part of the opcode's encoding.
    pub fn has_h_flag(self) -> bool {
        self == Opcode::BlxImm
    }

    /// Whether the M (swap second operand halves) bit is a per-instruction choice.
    pub fn has_m_flag(self) -> bool {
        self.family() == Some(Family::DualMultiply)
    }

    /// Whether the R (round) bit is a per-instruction choice.
    pub fn has_r_flag(self) -> bool {
        self.family() == Some(Family::MostSignificantMultiply)
    }

    /// Whether the L (load) bit is a per-instruction choice.
    ///
    /// Loads and stores are distinct opcodes, so this never holds.
    pub fn has_l_flag(self) -> bool {
        false
    }

    /// Whether the B (byte) bit is a per-instruction choice.
    ///
    /// Byte and word transfers are distinct opcodes, so this never holds.
    pub fn has_b_flag(self) -> bool {
        false
    }

    /// Word bits owned by this opcode's variable flags.
    pub(crate) fn flag_bits(self) -> u32 {
        let mut bits = 0;
        if self.has_p_flag() {
            bits |= P_BIT;
        }
        if self.has_u_flag() {
            bits |= U_BIT;
        }
        if self.has_d_flag() {
            bits |= D_BIT;
        }
        if self.has_w_flag() {
            bits |= W_BIT;
        }
        if self.has_s_flag() {
            bits |= S_BIT;
        }
        if self.has_h_flag() {
            bits |= H_BIT;
        }
        if self.has_m_flag() {
            bits |= M_BIT;
        }
        if self.has_r_flag() {
            bits |= R_BIT;
        }
        bits
    }

    /// Whether the instruction carries a shift type in bits 6..5.
    pub fn has_shift(self) -> bool {
        matches!(
            self.family(),
            Some(
                Family::DpReg
                    | Family::DpRegMove
                    | Family::DpRegTest
                    | Family::DpRsr
                    | Family::DpRsrMove
                    | Family::DpRsrTest
            )
        )
    }

    /// Whether the opcode always transfers control.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::B | Opcode::Bl | Opcode::BlxImm | Opcode::Bx | Opcode::BlxReg
        )
    }

    /// Whether the opcode loads from a PC-relative literal.
    pub fn is_load_literal(self) -> bool {
        self.immediate_form_of_literal().is_some()
    }

    /// Immediate-offset counterpart of a literal load.
    ///
    /// The rewrite pass uses this to retarget a literal load through a
    /// scratch register holding the literal's absolute address.
    pub fn immediate_form_of_literal(self) -> Option<Opcode> {
        Some(match self {
            Opcode::LdrLit => Opcode::LdrImm,
            Opcode::LdrbLit => Opcode::LdrbImm,
            Opcode::LdrhLit => Opcode::LdrhImm,
            Opcode::LdrsbLit => Opcode::LdrsbImm,
            Opcode::LdrshLit => Opcode::LdrshImm,
            Opcode::LdrdLit => Opcode::LdrdImm,
            _ => return None,
        })
    }

    /// Size of the memory access, for opcodes that access memory directly.
    pub fn access_size(self) -> Option<OpndSize> {
        use Opcode::*;
        Some(match self {
            LdrImm | StrImm | LdrReg | StrReg | LdrLit | Ldrex | Strex => OpndSize::Bytes4,
            LdrbImm | StrbImm | LdrbReg | StrbReg | LdrbLit | LdrsbImm | LdrsbReg | LdrsbLit
            | Pld => OpndSize::Bytes1,
            LdrhImm | StrhImm | LdrhReg | StrhReg | LdrhLit | LdrshImm | LdrshReg | LdrshLit => {
                OpndSize::Bytes2
            }
            LdrdImm | StrdImm | LdrdReg | StrdReg | LdrdLit => OpndSize::Bytes8,
            VldrS | VstrS | Ldc | Stc => OpndSize::Bytes4,
            VldrD | VstrD => OpndSize::Bytes8,
            _ => return None,
        })
    }

    /// Whether the opcode reads memory.
    pub fn is_load(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            LdrImm
                | LdrReg
                | LdrLit
                | LdrbImm
                | LdrbReg
                | LdrbLit
                | LdrhImm
                | LdrhReg
                | LdrhLit
                | LdrsbImm
                | LdrsbReg
                | LdrsbLit
                | LdrshImm
                | LdrshReg
                | LdrshLit
                | LdrdImm
                | LdrdReg
                | LdrdLit
                | Ldrex
                | Ldm
                | Ldmda
                | Ldmdb
                | Ldmib
                | Pop
                | Ldc
                | VldrS
                | VldrD
        )
    }

    /// Whether the opcode writes memory.
    pub fn is_store(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            StrImm
                | StrReg
                | StrbImm
                | StrbReg
                | StrhImm
                | StrhReg
                | StrdImm
                | StrdReg
                | Strex
                | Stm
                | Stmda
                | Stmdb
                | Stmib
                | Push
                | Stc
                | VstrS
                | VstrD
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_belongs_to_a_family_of_its_own_type() {
        for op in Opcode::KNOWN {
            let info = op.info().unwrap();
            assert_eq!(info.family.instr_type(), info.ty, "{:?}", op);
        }
        assert!(Opcode::Undecoded.family().is_none());
        assert!(Opcode::Label.family().is_none());
    }

    #[test]
    fn fixed_bits_stay_out_of_shared_fields() {
        for op in Opcode::KNOWN {
            let info = op.info().unwrap();
            assert!(info.primary < 32, "{:?}", op);
            assert_eq!(info.fixed & 0xFFF0_0000, 0, "{:?} fixes a primary bit", op);
            assert_eq!(info.fixed & 0xFF & u32::from(info.secondary), 0, "{:?}", op);
            let primary = u32::from(info.primary) << 20;
            assert_eq!(primary & op.flag_bits(), 0, "{:?} flag overlaps primary", op);
            assert_eq!(
                u32::from(info.secondary) & op.flag_bits(),
                0,
                "{:?} flag overlaps secondary",
                op
            );
        }
    }

    #[test]
    fn literal_to_immediate_table() {
        for op in Opcode::KNOWN.iter().filter(|op| op.is_load_literal()) {
            let imm = op.immediate_form_of_literal().unwrap();
            assert_ne!(imm, *op);
            assert!(!imm.is_load_literal());
            assert_eq!(op.name(), imm.name());
            assert_eq!(op.access_size(), imm.access_size());
            assert!(imm.is_load());
            assert!(imm.has_p_flag() && imm.has_u_flag());
        }
        assert_eq!(Opcode::LdrLit.immediate_form_of_literal(), Some(Opcode::LdrImm));
        assert_eq!(Opcode::LdrImm.immediate_form_of_literal(), None);
        let count = Opcode::KNOWN.iter().filter(|op| op.is_load_literal()).count();
        assert_eq!(count, 6);
    }

    #[test]
    fn unimplemented_flags_are_never_variable() {
        for op in Opcode::KNOWN {
            assert!(!op.has_l_flag());
            assert!(!op.has_b_flag());
        }
    }

    #[test]
    fn flag_applicability() {
        assert!(Opcode::AddReg.has_s_flag());
        assert!(!Opcode::CmpReg.has_s_flag());
        assert!(Opcode::Mla.has_s_flag());
        assert!(!Opcode::Mls.has_s_flag());
        assert!(Opcode::LdrImm.has_p_flag());
        assert!(Opcode::LdrLit.has_u_flag());
        assert!(!Opcode::LdrLit.has_w_flag());
        assert!(Opcode::Ldm.has_w_flag());
        assert!(!Opcode::Push.has_w_flag());
        assert!(Opcode::Ldc.has_d_flag());
        assert!(Opcode::Smlad.has_m_flag());
        assert!(Opcode::Smmul.has_r_flag());
        assert!(Opcode::BlxImm.has_h_flag());
    }

    #[test]
    fn instr_type_from_bits() {
        for (i, ty) in InstrType::ALL.iter().enumerate() {
            assert_eq!(InstrType::from_bits(i as u32), *ty);
            assert_eq!(*ty as usize, i);
        }
    }
}
