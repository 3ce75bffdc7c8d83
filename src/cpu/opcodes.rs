// Opcode table - Static 256-entry decode table for the 65816
//
// Each entry pairs a mnemonic with its addressing mode and a handler tag.
// Slots left at `Op::Unknown` are undecodable; hitting one dumps the
// execution trace and halts (fatal in debug builds).
//
// `auto_step_pc` is cleared for block moves: MVN re-executes at the same
// PC until the transfer count in A wraps, stepping PC itself when done.

use super::addressing::AddressingMode as Mode;

/// Handler tag dispatched by the execution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Unknown,
    Adc, AdcImm, And, AndImm, Asl, AslA, Bcc, Bcs, Beq, Bit, BitImm, Bmi,
    Bne, Bpl, Bra, Brl, Bvc, Bvs, Clc, Cld, Cli, Clv, Cmp, CmpImm,
    Cpx, CpxImm, Cpy, CpyImm, Dec, DecA, Dex, Dey, Eor, EorImm, Inc, IncA,
    Inx, Iny, Jmp, Jsl, Jsr, Lda, LdaImm, Ldx, LdxImm, Ldy, LdyImm, Lsr,
    LsrA, Mvn, Nop, Ora, OraImm, Pea, Per, Pha, Phb, Phd, Phk, Php,
    Phx, Phy, Pla, Plb, Pld, Plp, Plx, Ply, Rep, Rol, RolA, Ror,
    RorA, Rti, Rtl, Rts, Sbc, SbcImm, Sec, Sed, Sei, Sep, Sta, Stx,
    Sty, Stz, Tax, Tay, Tcd, Tcs, Tdc, Trb, Tsb, Tsc, Tsx, Txa,
    Txs, Txy, Tya, Tyx, Wai, Xba, Xce,
}

/// One decoded opcode slot.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry {
    pub name: &'static str,
    pub mode: Mode,
    pub op: Op,
    /// Step PC past the opcode byte before resolving the operand
    pub auto_step_pc: bool,
}

const UNKNOWN: OpcodeEntry = OpcodeEntry {
    name: "???",
    mode: Mode::Implied,
    op: Op::Unknown,
    auto_step_pc: true,
};

const fn entry(name: &'static str, mode: Mode, op: Op) -> OpcodeEntry {
    OpcodeEntry {
        name,
        mode,
        op,
        auto_step_pc: true,
    }
}

const fn entry_manual_pc(name: &'static str, mode: Mode, op: Op) -> OpcodeEntry {
    OpcodeEntry {
        name,
        mode,
        op,
        auto_step_pc: false,
    }
}

#[rustfmt::skip]
const fn build_table() -> [OpcodeEntry; 256] {
    let mut t = [UNKNOWN; 256];

    t[0x01] = entry("ORA", Mode::DpIndirectIndexedX, Op::Ora);
    t[0x03] = entry("ORA", Mode::StackRelative, Op::Ora);
    t[0x04] = entry("TSB", Mode::Dp, Op::Tsb);
    t[0x05] = entry("ORA", Mode::Dp, Op::Ora);
    t[0x06] = entry("ASL", Mode::Dp, Op::Asl);
    t[0x07] = entry("ORA", Mode::DpIndirectLong, Op::Ora);
    t[0x08] = entry("PHP", Mode::Implied, Op::Php);
    t[0x09] = entry("ORA", Mode::ImmediateA, Op::OraImm);
    t[0x0A] = entry("ASL", Mode::Implied, Op::AslA);
    t[0x0B] = entry("PHD", Mode::Implied, Op::Phd);
    t[0x0C] = entry("TSB", Mode::Absolute, Op::Tsb);
    t[0x0D] = entry("ORA", Mode::Absolute, Op::Ora);
    t[0x0E] = entry("ASL", Mode::Absolute, Op::Asl);
    t[0x0F] = entry("ORA", Mode::AbsoluteLong, Op::Ora);
    t[0x10] = entry("BPL", Mode::PcRelative, Op::Bpl);
    t[0x11] = entry("ORA", Mode::DpIndirectIndexedY, Op::Ora);
    t[0x12] = entry("ORA", Mode::DpIndirect, Op::Ora);
    t[0x13] = entry("ORA", Mode::StackRelativeIndirectIndexedY, Op::Ora);
    t[0x14] = entry("TRB", Mode::Dp, Op::Trb);
    t[0x15] = entry("ORA", Mode::DpIndexedX, Op::Ora);
    t[0x16] = entry("ASL", Mode::DpIndexedX, Op::Asl);
    t[0x17] = entry("ORA", Mode::DpIndirectLongIndexedY, Op::Ora);
    t[0x18] = entry("CLC", Mode::Implied, Op::Clc);
    t[0x19] = entry("ORA", Mode::AbsoluteIndexedY, Op::Ora);
    t[0x1A] = entry("INC", Mode::Implied, Op::IncA);
    t[0x1B] = entry("TCS", Mode::Implied, Op::Tcs);
    t[0x1C] = entry("TRB", Mode::Absolute, Op::Trb);
    t[0x1D] = entry("ORA", Mode::AbsoluteIndexedX, Op::Ora);
    t[0x1E] = entry("ASL", Mode::AbsoluteIndexedX, Op::Asl);
    t[0x1F] = entry("ORA", Mode::AbsoluteLongIndexedX, Op::Ora);
    t[0x20] = entry("JSR", Mode::AbsoluteJmp, Op::Jsr);
    t[0x21] = entry("AND", Mode::DpIndirectIndexedX, Op::And);
    t[0x22] = entry("JSL", Mode::AbsoluteLong, Op::Jsl);
    t[0x23] = entry("AND", Mode::StackRelative, Op::And);
    t[0x24] = entry("BIT", Mode::Dp, Op::Bit);
    t[0x25] = entry("AND", Mode::Dp, Op::And);
    t[0x26] = entry("ROL", Mode::Dp, Op::Rol);
    t[0x27] = entry("AND", Mode::DpIndirectLong, Op::And);
    t[0x28] = entry("PLP", Mode::Implied, Op::Plp);
    t[0x29] = entry("AND", Mode::ImmediateA, Op::AndImm);
    t[0x2A] = entry("ROL", Mode::Implied, Op::RolA);
    t[0x2B] = entry("PLD", Mode::Implied, Op::Pld);
    t[0x2C] = entry("BIT", Mode::Absolute, Op::Bit);
    t[0x2D] = entry("AND", Mode::Absolute, Op::And);
    t[0x2E] = entry("ROL", Mode::Absolute, Op::Rol);
    t[0x2F] = entry("AND", Mode::AbsoluteLong, Op::And);
    t[0x30] = entry("BMI", Mode::PcRelative, Op::Bmi);
    t[0x31] = entry("AND", Mode::DpIndirectIndexedY, Op::And);
    t[0x32] = entry("AND", Mode::DpIndirect, Op::And);
    t[0x33] = entry("AND", Mode::StackRelativeIndirectIndexedY, Op::And);
    t[0x34] = entry("BIT", Mode::DpIndexedX, Op::Bit);
    t[0x35] = entry("AND", Mode::DpIndexedX, Op::And);
    t[0x36] = entry("ROL", Mode::DpIndexedX, Op::Rol);
    t[0x37] = entry("AND", Mode::DpIndirectLongIndexedY, Op::And);
    t[0x38] = entry("SEC", Mode::Implied, Op::Sec);
    t[0x39] = entry("AND", Mode::AbsoluteIndexedY, Op::And);
    t[0x3A] = entry("DEC", Mode::Implied, Op::DecA);
    t[0x3B] = entry("TSC", Mode::Implied, Op::Tsc);
    t[0x3C] = entry("BIT", Mode::AbsoluteIndexedX, Op::Bit);
    t[0x3D] = entry("AND", Mode::AbsoluteIndexedX, Op::And);
    t[0x3E] = entry("ROL", Mode::AbsoluteIndexedX, Op::Rol);
    t[0x3F] = entry("AND", Mode::AbsoluteLongIndexedX, Op::And);
    t[0x40] = entry("RTI", Mode::Implied, Op::Rti);
    t[0x41] = entry("EOR", Mode::DpIndirectIndexedX, Op::Eor);
    t[0x43] = entry("EOR", Mode::StackRelative, Op::Eor);
    t[0x45] = entry("EOR", Mode::Dp, Op::Eor);
    t[0x46] = entry("LSR", Mode::Dp, Op::Lsr);
    t[0x47] = entry("EOR", Mode::DpIndirectLong, Op::Eor);
    t[0x48] = entry("PHA", Mode::Implied, Op::Pha);
    t[0x49] = entry("EOR", Mode::ImmediateA, Op::EorImm);
    t[0x4A] = entry("LSR", Mode::Implied, Op::LsrA);
    t[0x4B] = entry("PHK", Mode::Implied, Op::Phk);
    t[0x4C] = entry("JMP", Mode::AbsoluteJmp, Op::Jmp);
    t[0x4D] = entry("EOR", Mode::Absolute, Op::Eor);
    t[0x4E] = entry("LSR", Mode::Absolute, Op::Lsr);
    t[0x4F] = entry("EOR", Mode::AbsoluteLong, Op::Eor);
    t[0x50] = entry("BVC", Mode::PcRelative, Op::Bvc);
    t[0x51] = entry("EOR", Mode::DpIndirectIndexedY, Op::Eor);
    t[0x52] = entry("EOR", Mode::DpIndirect, Op::Eor);
    t[0x53] = entry("EOR", Mode::StackRelativeIndirectIndexedY, Op::Eor);
    t[0x54] = entry_manual_pc("MVN", Mode::BlockMove, Op::Mvn);
    t[0x55] = entry("EOR", Mode::DpIndexedX, Op::Eor);
    t[0x56] = entry("LSR", Mode::DpIndexedX, Op::Lsr);
    t[0x57] = entry("EOR", Mode::DpIndirectLongIndexedY, Op::Eor);
    t[0x58] = entry("CLI", Mode::Implied, Op::Cli);
    t[0x59] = entry("EOR", Mode::AbsoluteIndexedY, Op::Eor);
    t[0x5A] = entry("PHY", Mode::Implied, Op::Phy);
    t[0x5B] = entry("TCD", Mode::Implied, Op::Tcd);
    t[0x5C] = entry("JMP", Mode::AbsoluteLong, Op::Jmp);
    t[0x5D] = entry("EOR", Mode::AbsoluteIndexedX, Op::Eor);
    t[0x5E] = entry("LSR", Mode::AbsoluteIndexedX, Op::Lsr);
    t[0x5F] = entry("EOR", Mode::AbsoluteLongIndexedX, Op::Eor);
    t[0x60] = entry("RTS", Mode::Implied, Op::Rts);
    t[0x61] = entry("ADC", Mode::DpIndirectIndexedX, Op::Adc);
    t[0x62] = entry("PER", Mode::PcRelativeLong, Op::Per);
    t[0x63] = entry("ADC", Mode::StackRelative, Op::Adc);
    t[0x64] = entry("STZ", Mode::Dp, Op::Stz);
    t[0x65] = entry("ADC", Mode::Dp, Op::Adc);
    t[0x66] = entry("ROR", Mode::Dp, Op::Ror);
    t[0x67] = entry("ADC", Mode::DpIndirectLong, Op::Adc);
    t[0x68] = entry("PLA", Mode::Implied, Op::Pla);
    t[0x69] = entry("ADC", Mode::ImmediateA, Op::AdcImm);
    t[0x6A] = entry("ROR", Mode::Implied, Op::RorA);
    t[0x6B] = entry("RTL", Mode::Implied, Op::Rtl);
    t[0x6C] = entry("JMP", Mode::AbsoluteIndirect, Op::Jmp);
    t[0x6D] = entry("ADC", Mode::Absolute, Op::Adc);
    t[0x6E] = entry("ROR", Mode::Absolute, Op::Ror);
    t[0x6F] = entry("ADC", Mode::AbsoluteLong, Op::Adc);
    t[0x70] = entry("BVS", Mode::PcRelative, Op::Bvs);
    t[0x71] = entry("ADC", Mode::DpIndirectIndexedY, Op::Adc);
    t[0x72] = entry("ADC", Mode::DpIndirect, Op::Adc);
    t[0x73] = entry("ADC", Mode::StackRelativeIndirectIndexedY, Op::Adc);
    t[0x74] = entry("STZ", Mode::DpIndexedX, Op::Stz);
    t[0x75] = entry("ADC", Mode::DpIndexedX, Op::Adc);
    t[0x76] = entry("ROR", Mode::DpIndexedX, Op::Ror);
    t[0x77] = entry("ADC", Mode::DpIndirectLongIndexedY, Op::Adc);
    t[0x78] = entry("SEI", Mode::Implied, Op::Sei);
    t[0x79] = entry("ADC", Mode::AbsoluteIndexedY, Op::Adc);
    t[0x7A] = entry("PLY", Mode::Implied, Op::Ply);
    t[0x7B] = entry("TDC", Mode::Implied, Op::Tdc);
    t[0x7C] = entry("JMP", Mode::AbsoluteJmpIndirectIndexedX, Op::Jmp);
    t[0x7D] = entry("ADC", Mode::AbsoluteIndexedX, Op::Adc);
    t[0x7E] = entry("ROR", Mode::AbsoluteIndexedX, Op::Ror);
    t[0x7F] = entry("ADC", Mode::AbsoluteLongIndexedX, Op::Adc);
    t[0x80] = entry("BRA", Mode::PcRelative, Op::Bra);
    t[0x81] = entry("STA", Mode::DpIndirectIndexedX, Op::Sta);
    t[0x82] = entry("BRL", Mode::PcRelativeLong, Op::Brl);
    t[0x83] = entry("STA", Mode::StackRelative, Op::Sta);
    t[0x84] = entry("STY", Mode::Dp, Op::Sty);
    t[0x85] = entry("STA", Mode::Dp, Op::Sta);
    t[0x86] = entry("STX", Mode::Dp, Op::Stx);
    t[0x87] = entry("STA", Mode::DpIndirectLong, Op::Sta);
    t[0x88] = entry("DEY", Mode::Implied, Op::Dey);
    t[0x89] = entry("BIT", Mode::ImmediateA, Op::BitImm);
    t[0x8A] = entry("TXA", Mode::Implied, Op::Txa);
    t[0x8B] = entry("PHB", Mode::Implied, Op::Phb);
    t[0x8C] = entry("STY", Mode::Absolute, Op::Sty);
    t[0x8D] = entry("STA", Mode::Absolute, Op::Sta);
    t[0x8E] = entry("STX", Mode::Absolute, Op::Stx);
    t[0x8F] = entry("STA", Mode::AbsoluteLong, Op::Sta);
    t[0x90] = entry("BCC", Mode::PcRelative, Op::Bcc);
    t[0x91] = entry("STA", Mode::DpIndirectIndexedY, Op::Sta);
    t[0x92] = entry("STA", Mode::DpIndirect, Op::Sta);
    t[0x93] = entry("STA", Mode::StackRelativeIndirectIndexedY, Op::Sta);
    t[0x94] = entry("STY", Mode::DpIndexedX, Op::Sty);
    t[0x95] = entry("STA", Mode::DpIndexedX, Op::Sta);
    t[0x96] = entry("STX", Mode::DpIndexedY, Op::Stx);
    t[0x97] = entry("STA", Mode::DpIndirectLongIndexedY, Op::Sta);
    t[0x98] = entry("TYA", Mode::Implied, Op::Tya);
    t[0x99] = entry("STA", Mode::AbsoluteIndexedY, Op::Sta);
    t[0x9A] = entry("TXS", Mode::Implied, Op::Txs);
    t[0x9B] = entry("TXY", Mode::Implied, Op::Txy);
    t[0x9C] = entry("STZ", Mode::Absolute, Op::Stz);
    t[0x9D] = entry("STA", Mode::AbsoluteIndexedX, Op::Sta);
    t[0x9E] = entry("STZ", Mode::AbsoluteIndexedX, Op::Stz);
    t[0x9F] = entry("STA", Mode::AbsoluteLongIndexedX, Op::Sta);
    t[0xA0] = entry("LDY", Mode::ImmediateIndex, Op::LdyImm);
    t[0xA1] = entry("LDA", Mode::DpIndirectIndexedX, Op::Lda);
    t[0xA2] = entry("LDX", Mode::ImmediateIndex, Op::LdxImm);
    t[0xA3] = entry("LDA", Mode::StackRelative, Op::Lda);
    t[0xA4] = entry("LDY", Mode::Dp, Op::Ldy);
    t[0xA5] = entry("LDA", Mode::Dp, Op::Lda);
    t[0xA6] = entry("LDX", Mode::Dp, Op::Ldx);
    t[0xA7] = entry("LDA", Mode::DpIndirectLong, Op::Lda);
    t[0xA8] = entry("TAY", Mode::Implied, Op::Tay);
    t[0xA9] = entry("LDA", Mode::ImmediateA, Op::LdaImm);
    t[0xAA] = entry("TAX", Mode::Implied, Op::Tax);
    t[0xAB] = entry("PLB", Mode::Implied, Op::Plb);
    t[0xAC] = entry("LDY", Mode::Absolute, Op::Ldy);
    t[0xAD] = entry("LDA", Mode::Absolute, Op::Lda);
    t[0xAE] = entry("LDX", Mode::Absolute, Op::Ldx);
    t[0xAF] = entry("LDA", Mode::AbsoluteLong, Op::Lda);
    t[0xB0] = entry("BCS", Mode::PcRelative, Op::Bcs);
    t[0xB1] = entry("LDA", Mode::DpIndirectIndexedY, Op::Lda);
    t[0xB2] = entry("LDA", Mode::DpIndirect, Op::Lda);
    t[0xB3] = entry("LDA", Mode::StackRelativeIndirectIndexedY, Op::Lda);
    t[0xB4] = entry("LDY", Mode::DpIndexedX, Op::Ldy);
    t[0xB5] = entry("LDA", Mode::DpIndexedX, Op::Lda);
    t[0xB6] = entry("LDX", Mode::DpIndexedY, Op::Ldx);
    t[0xB7] = entry("LDA", Mode::DpIndirectLongIndexedY, Op::Lda);
    t[0xB8] = entry("CLV", Mode::Implied, Op::Clv);
    t[0xB9] = entry("LDA", Mode::AbsoluteIndexedY, Op::Lda);
    t[0xBA] = entry("TSX", Mode::Implied, Op::Tsx);
    t[0xBB] = entry("TYX", Mode::Implied, Op::Tyx);
    t[0xBC] = entry("LDY", Mode::AbsoluteIndexedX, Op::Ldy);
    t[0xBD] = entry("LDA", Mode::AbsoluteIndexedX, Op::Lda);
    t[0xBE] = entry("LDX", Mode::AbsoluteIndexedY, Op::Ldx);
    t[0xBF] = entry("LDA", Mode::AbsoluteLongIndexedX, Op::Lda);
    t[0xC0] = entry("CPY", Mode::ImmediateIndex, Op::CpyImm);
    t[0xC1] = entry("CMP", Mode::DpIndirectIndexedX, Op::Cmp);
    t[0xC2] = entry("REP", Mode::Immediate, Op::Rep);
    t[0xC3] = entry("CMP", Mode::StackRelative, Op::Cmp);
    t[0xC4] = entry("CPY", Mode::Dp, Op::Cpy);
    t[0xC5] = entry("CMP", Mode::Dp, Op::Cmp);
    t[0xC6] = entry("DEC", Mode::Dp, Op::Dec);
    t[0xC7] = entry("CMP", Mode::DpIndirectLong, Op::Cmp);
    t[0xC8] = entry("INY", Mode::Implied, Op::Iny);
    t[0xC9] = entry("CMP", Mode::ImmediateA, Op::CmpImm);
    t[0xCA] = entry("DEX", Mode::Implied, Op::Dex);
    t[0xCB] = entry("WAI", Mode::Implied, Op::Wai);
    t[0xCC] = entry("CPY", Mode::Absolute, Op::Cpy);
    t[0xCD] = entry("CMP", Mode::Absolute, Op::Cmp);
    t[0xCE] = entry("DEC", Mode::Absolute, Op::Dec);
    t[0xCF] = entry("CMP", Mode::AbsoluteLong, Op::Cmp);
    t[0xD0] = entry("BNE", Mode::PcRelative, Op::Bne);
    t[0xD1] = entry("CMP", Mode::DpIndirectIndexedY, Op::Cmp);
    t[0xD2] = entry("CMP", Mode::DpIndirect, Op::Cmp);
    t[0xD3] = entry("CMP", Mode::StackRelativeIndirectIndexedY, Op::Cmp);
    t[0xD4] = entry("PEI", Mode::DpIndirect, Op::Pea);
    t[0xD5] = entry("CMP", Mode::DpIndexedX, Op::Cmp);
    t[0xD6] = entry("DEC", Mode::DpIndexedX, Op::Dec);
    t[0xD7] = entry("CMP", Mode::DpIndirectLongIndexedY, Op::Cmp);
    t[0xD8] = entry("CLD", Mode::Implied, Op::Cld);
    t[0xD9] = entry("CMP", Mode::AbsoluteIndexedY, Op::Cmp);
    t[0xDA] = entry("PHX", Mode::Implied, Op::Phx);
    t[0xDC] = entry("JMP", Mode::AbsoluteIndirectLong, Op::Jmp);
    t[0xDD] = entry("CMP", Mode::AbsoluteIndexedX, Op::Cmp);
    t[0xDE] = entry("DEC", Mode::AbsoluteIndexedX, Op::Dec);
    t[0xDF] = entry("CMP", Mode::AbsoluteLongIndexedX, Op::Cmp);
    t[0xE0] = entry("CPX", Mode::ImmediateIndex, Op::CpxImm);
    t[0xE1] = entry("SBC", Mode::DpIndirectIndexedX, Op::Sbc);
    t[0xE2] = entry("SEP", Mode::Immediate, Op::Sep);
    t[0xE3] = entry("SBC", Mode::StackRelative, Op::Sbc);
    t[0xE4] = entry("CPX", Mode::Dp, Op::Cpx);
    t[0xE5] = entry("SBC", Mode::Dp, Op::Sbc);
    t[0xE6] = entry("INC", Mode::Dp, Op::Inc);
    t[0xE7] = entry("SBC", Mode::DpIndirectLong, Op::Sbc);
    t[0xE8] = entry("INX", Mode::Implied, Op::Inx);
    t[0xE9] = entry("SBC", Mode::ImmediateA, Op::SbcImm);
    t[0xEA] = entry("NOP", Mode::Implied, Op::Nop);
    t[0xEB] = entry("XBA", Mode::Implied, Op::Xba);
    t[0xEC] = entry("CPX", Mode::Absolute, Op::Cpx);
    t[0xED] = entry("SBC", Mode::Absolute, Op::Sbc);
    t[0xEE] = entry("INC", Mode::Absolute, Op::Inc);
    t[0xEF] = entry("SBC", Mode::AbsoluteLong, Op::Sbc);
    t[0xF0] = entry("BEQ", Mode::PcRelative, Op::Beq);
    t[0xF1] = entry("SBC", Mode::DpIndirectIndexedY, Op::Sbc);
    t[0xF2] = entry("SBC", Mode::DpIndirect, Op::Sbc);
    t[0xF3] = entry("SBC", Mode::StackRelativeIndirectIndexedY, Op::Sbc);
    t[0xF4] = entry("PEA", Mode::Absolute, Op::Pea);
    t[0xF5] = entry("SBC", Mode::DpIndexedX, Op::Sbc);
    t[0xF6] = entry("INC", Mode::DpIndexedX, Op::Inc);
    t[0xF7] = entry("SBC", Mode::DpIndirectLongIndexedY, Op::Sbc);
    t[0xF8] = entry("SED", Mode::Implied, Op::Sed);
    t[0xF9] = entry("SBC", Mode::AbsoluteIndexedY, Op::Sbc);
    t[0xFA] = entry("PLX", Mode::Implied, Op::Plx);
    t[0xFB] = entry("XCE", Mode::Implied, Op::Xce);
    t[0xFC] = entry("JSR", Mode::AbsoluteJmpIndirectIndexedX, Op::Jsr);
    t[0xFD] = entry("SBC", Mode::AbsoluteIndexedX, Op::Sbc);
    t[0xFE] = entry("INC", Mode::AbsoluteIndexedX, Op::Inc);
    t[0xFF] = entry("SBC", Mode::AbsoluteLongIndexedX, Op::Sbc);
    t
}

/// Decode table indexed by opcode byte.
pub static OPCODE_TABLE: [OpcodeEntry; 256] = build_table();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_expected_opcodes() {
        let live = OPCODE_TABLE
            .iter()
            .filter(|entry| entry.op != Op::Unknown)
            .count();
        assert_eq!(live, 251);
    }

    #[test]
    fn test_known_entries() {
        assert_eq!(OPCODE_TABLE[0xA9].name, "LDA");
        assert_eq!(OPCODE_TABLE[0xA9].mode, Mode::ImmediateA);

        assert_eq!(OPCODE_TABLE[0xFB].name, "XCE");
        assert_eq!(OPCODE_TABLE[0x54].name, "MVN");
        assert!(!OPCODE_TABLE[0x54].auto_step_pc);

        // BRK is intentionally undecodable
        assert_eq!(OPCODE_TABLE[0x00].op, Op::Unknown);
    }
}
