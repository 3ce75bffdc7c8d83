// CPU execution loop - fetch, decode, dispatch, trace
//
// One call to `step` runs at most one instruction. Pending interrupts are
// dispatched first; a CPU parked by WAI just burns an idle cycle until an
// interrupt arrives. Cycle cost accumulates from the bus (every fetch and
// data access charges its map cost) plus one internal cycle per
// instruction.

use crate::bus::Membus;
use crate::debug;
use crate::timings;

use super::addressing::{AddressingMode as Mode, Resolved};
use super::opcodes::{Op, OpcodeEntry, OPCODE_TABLE};
use super::{flags, Cpu};

const TAG: &str = "65816";

impl Cpu {
    /// Execute one CPU instruction.
    ///
    /// # Returns
    /// The number of master-clock cycles consumed.
    pub fn step(&mut self, bus: &mut Membus) -> u32 {
        let mut cycles = timings::CPU_ONE_CYCLE;

        // Interrupts are observed at instruction boundaries
        if self.take_nmi() {
            self.handle_nmi(bus, &mut cycles);
            self.set_wait_interrupt(false);
        } else if self.irq_line() {
            self.set_wait_interrupt(false);
            if !self.flag(flags::I) {
                self.handle_irq(bus, &mut cycles);
            }
        }

        if self.waiting_for_interrupt() {
            return cycles;
        }

        let opcode_pc = self.program_address();
        let opcode = bus.read_u8(opcode_pc, &mut cycles);
        let entry = &OPCODE_TABLE[opcode as usize];

        if entry.op == Op::Unknown {
            debug::error(TAG, "Unknown instruction detected");
            self.trace_mut().dump(TAG);
            debug::error(
                TAG,
                format!("Unknown opcode 0x{:02X} (Address {:06X})", opcode, opcode_pc),
            );
            debug_assert!(false, "unknown opcode 0x{:02X}", opcode);

            // Release behavior: skip the byte and keep going
            self.regs.pc = self.regs.pc.wrapping_add(1);
            return cycles;
        }

        if entry.auto_step_pc {
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }

        let resolved = self.resolve(entry.mode, bus, &mut cycles);

        self.log_instruction(opcode_pc, entry, &resolved);
        self.dispatch(entry.op, bus, resolved.data, &mut cycles);

        cycles
    }

    fn dispatch(&mut self, op: Op, bus: &mut Membus, data: u32, cycles: &mut u32) {
        match op {
            Op::Adc => self.op_adc(bus, data, cycles),
            Op::AdcImm => self.op_adc_imm(data),
            Op::Sbc => self.op_sbc(bus, data, cycles),
            Op::SbcImm => self.op_sbc_imm(data),

            Op::And => self.op_and(bus, data, cycles),
            Op::AndImm => self.op_and_imm(data),
            Op::Ora => self.op_ora(bus, data, cycles),
            Op::OraImm => self.op_ora_imm(data),
            Op::Eor => self.op_eor(bus, data, cycles),
            Op::EorImm => self.op_eor_imm(data),
            Op::Bit => self.op_bit(bus, data, cycles),
            Op::BitImm => self.op_bit_imm(data),
            Op::Trb => self.op_trb(bus, data, cycles),
            Op::Tsb => self.op_tsb(bus, data, cycles),

            Op::Asl => self.op_asl(bus, data, cycles),
            Op::AslA => self.op_asl_a(),
            Op::Lsr => self.op_lsr(bus, data, cycles),
            Op::LsrA => self.op_lsr_a(),
            Op::Rol => self.op_rol(bus, data, cycles),
            Op::RolA => self.op_rol_a(),
            Op::Ror => self.op_ror(bus, data, cycles),
            Op::RorA => self.op_ror_a(),

            Op::Cmp => self.op_cmp(bus, data, cycles),
            Op::CmpImm => self.op_cmp_imm(data),
            Op::Cpx => self.op_cpx(bus, data, cycles),
            Op::CpxImm => self.op_cpx_imm(data),
            Op::Cpy => self.op_cpy(bus, data, cycles),
            Op::CpyImm => self.op_cpy_imm(data),

            Op::Inc => self.op_inc(bus, data, cycles),
            Op::IncA => self.op_inc_a(),
            Op::Inx => self.op_inx(),
            Op::Iny => self.op_iny(),
            Op::Dec => self.op_dec(bus, data, cycles),
            Op::DecA => self.op_dec_a(),
            Op::Dex => self.op_dex(),
            Op::Dey => self.op_dey(),

            Op::Lda => self.op_lda(bus, data, cycles),
            Op::LdaImm => self.op_lda_imm(data),
            Op::Ldx => self.op_ldx(bus, data, cycles),
            Op::LdxImm => self.op_ldx_imm(data),
            Op::Ldy => self.op_ldy(bus, data, cycles),
            Op::LdyImm => self.op_ldy_imm(data),
            Op::Sta => self.op_sta(bus, data, cycles),
            Op::Stx => self.op_stx(bus, data, cycles),
            Op::Sty => self.op_sty(bus, data, cycles),
            Op::Stz => self.op_stz(bus, data, cycles),

            Op::Bcc => self.op_bcc(data),
            Op::Bcs => self.op_bcs(data),
            Op::Beq => self.op_beq(data),
            Op::Bne => self.op_bne(data),
            Op::Bmi => self.op_bmi(data),
            Op::Bpl => self.op_bpl(data),
            Op::Bvc => self.op_bvc(data),
            Op::Bvs => self.op_bvs(data),
            Op::Bra => self.op_bra(data),
            Op::Brl => self.op_brl(data),

            Op::Jmp => self.op_jmp(data),
            Op::Jsr => self.op_jsr(bus, data, cycles),
            Op::Jsl => self.op_jsl(bus, data, cycles),
            Op::Rts => self.op_rts(bus, cycles),
            Op::Rtl => self.op_rtl(bus, cycles),
            Op::Rti => self.op_rti(bus, cycles),

            Op::Mvn => self.op_mvn(bus, data, cycles),

            Op::Pea => self.op_pea(bus, data, cycles),
            Op::Per => self.op_per(bus, data, cycles),
            Op::Pha => self.op_pha(bus, cycles),
            Op::Phb => self.op_phb(bus, cycles),
            Op::Phd => self.op_phd(bus, cycles),
            Op::Phk => self.op_phk(bus, cycles),
            Op::Php => self.op_php(bus, cycles),
            Op::Phx => self.op_phx(bus, cycles),
            Op::Phy => self.op_phy(bus, cycles),
            Op::Pla => self.op_pla(bus, cycles),
            Op::Plb => self.op_plb(bus, cycles),
            Op::Pld => self.op_pld(bus, cycles),
            Op::Plp => self.op_plp(bus, cycles),
            Op::Plx => self.op_plx(bus, cycles),
            Op::Ply => self.op_ply(bus, cycles),

            Op::Clc => self.op_clc(),
            Op::Cld => self.op_cld(),
            Op::Cli => self.op_cli(),
            Op::Clv => self.op_clv(),
            Op::Sec => self.op_sec(),
            Op::Sed => self.op_sed(),
            Op::Sei => self.op_sei(),
            Op::Rep => self.op_rep(data),
            Op::Sep => self.op_sep(data),
            Op::Xce => self.op_xce(),

            Op::Tax => self.op_tax(),
            Op::Tay => self.op_tay(),
            Op::Txa => self.op_txa(),
            Op::Tya => self.op_tya(),
            Op::Txy => self.op_txy(),
            Op::Tyx => self.op_tyx(),
            Op::Tcd => self.op_tcd(),
            Op::Tdc => self.op_tdc(),
            Op::Tcs => self.op_tcs(),
            Op::Tsc => self.op_tsc(),
            Op::Tsx => self.op_tsx(),
            Op::Txs => self.op_txs(),
            Op::Xba => self.op_xba(),

            Op::Nop => self.op_nop(),
            Op::Wai => self.op_wai(),

            Op::Unknown => unreachable!("unknown opcodes are filtered before dispatch"),
        }
    }

    /// Format one instruction and append it to the trace ring.
    fn log_instruction(&mut self, opcode_pc: u32, entry: &OpcodeEntry, resolved: &Resolved) {
        let operand = format_operand(entry, resolved);
        let regs = &self.regs;
        let line = format!(
            "{:06X} {:<24} A:{:04X} X:{:04X} Y:{:04X} S:{:04X} D:{:04X} DB:{:02X} P:{:02X}",
            opcode_pc,
            format!("{} {}", entry.name, operand),
            regs.a,
            regs.x,
            regs.y,
            regs.s,
            regs.d,
            regs.db,
            regs.p as u8,
        );
        self.trace_mut().push(line);
    }
}

/// Render the operand the way a disassembler would.
fn format_operand(entry: &OpcodeEntry, resolved: &Resolved) -> String {
    let raw = resolved.raw;
    let data = resolved.data;

    match entry.mode {
        Mode::Implied => String::new(),
        Mode::Immediate | Mode::ImmediateA | Mode::ImmediateIndex => {
            if resolved.raw_len == 1 {
                format!("#${:02X}", raw)
            } else {
                format!("#${:04X}", raw)
            }
        }
        Mode::Absolute | Mode::AbsoluteJmp => format!("${:04X} [{:06X}]", raw, data),
        Mode::AbsoluteJmpIndirectIndexedX => format!("(${:04X},X) [{:06X}]", raw, data),
        Mode::AbsoluteIndexedX => format!("${:04X},X [{:06X}]", raw, data),
        Mode::AbsoluteIndexedY => format!("${:04X},Y [{:06X}]", raw, data),
        Mode::AbsoluteLong => format!("${:06X}", raw),
        Mode::AbsoluteIndirect => format!("[${:04X}] [{:06X}]", raw, data),
        Mode::AbsoluteIndirectLong => format!("[${:04X}] [{:06X}]", raw, data),
        Mode::AbsoluteLongIndexedX => format!("${:06X},X [{:06X}]", raw, data),
        Mode::Dp => format!("${:02X} [{:06X}]", raw, data),
        Mode::DpIndexedX => format!("${:02X},X [{:06X}]", raw, data),
        Mode::DpIndexedY => format!("${:02X},Y [{:06X}]", raw, data),
        Mode::DpIndirect => format!("(${:02X}) [{:06X}]", raw, data),
        Mode::DpIndirectIndexedX => format!("(${:02X}),X [{:06X}]", raw, data),
        Mode::DpIndirectIndexedY => format!("(${:02X}),Y [{:06X}]", raw, data),
        Mode::DpIndirectLong => format!("[${:02X}] [{:06X}]", raw, data),
        Mode::DpIndirectLongIndexedY => format!("[${:02X}],Y [{:06X}]", raw, data),
        Mode::PcRelative => format!("${:02X} [{:06X}]", raw, data),
        Mode::PcRelativeLong => format!("${:04X} [{:06X}]", raw, data),
        Mode::StackRelative => format!("${:02X},S [{:06X}]", raw, data),
        Mode::StackRelativeIndirectIndexedY => format!("(${:02X},S),Y [{:06X}]", raw, data),
        Mode::BlockMove => format!("${:02X}, ${:02X}", raw >> 8, raw & 0xFF),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::AddressingType;

    /// LowROM bus with a program at $00:8000 and the reset vector set.
    fn bus_with_program(program: &[u8]) -> Membus {
        let mut bus = Membus::new(AddressingType::LowRom, false);
        bus.rom = vec![0; 512 * 1024];
        bus.rom[..program.len()].copy_from_slice(program);

        // Reset vector -> $8000
        bus.rom[0x7FFC] = 0x00;
        bus.rom[0x7FFD] = 0x80;
        bus
    }

    fn cpu_at_reset(bus: &mut Membus) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.reset(bus);
        cpu
    }

    // ========================================
    // Basic dispatch
    // ========================================

    #[test]
    fn test_lda_immediate_8bit() {
        let mut bus = bus_with_program(&[0xA9, 0x42]); // LDA #$42
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus);

        assert_eq!(cpu.regs.a, 0x42);
        assert_eq!(cpu.regs.pc, 0x8002);
        assert!(!cpu.flag(flags::Z));
        assert!(!cpu.flag(flags::N));
    }

    #[test]
    fn test_lda_immediate_16bit() {
        // REP #$20 (M=0), LDA #$1234
        let mut bus = bus_with_program(&[0xC2, 0x20, 0xA9, 0x34, 0x12]);
        let mut cpu = cpu_at_reset(&mut bus);
        // Native mode so REP can clear M
        cpu.op_xce_for_test();

        cpu.step(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(cpu.regs.a, 0x1234);
        assert_eq!(cpu.regs.pc, 0x8005);
    }

    #[test]
    fn test_sta_absolute_roundtrip() {
        // LDA #$5A ; STA $0123
        let mut bus = bus_with_program(&[0xA9, 0x5A, 0x8D, 0x23, 0x01]);
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(bus.wram.read(0x123), 0x5A);
    }

    #[test]
    fn test_cycles_accumulate() {
        let mut bus = bus_with_program(&[0xEA]); // NOP
        let mut cpu = cpu_at_reset(&mut bus);

        let cycles = cpu.step(&mut bus);
        // One internal cycle + one slow-ROM fetch
        assert_eq!(cycles, 6 + 8);
    }

    // ========================================
    // Flags and widths
    // ========================================

    #[test]
    fn test_adc_sets_carry_and_overflow() {
        // LDA #$7F ; ADC #$01
        let mut bus = bus_with_program(&[0xA9, 0x7F, 0x69, 0x01]);
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.flag(flags::V), "0x7F + 1 overflows signed 8-bit");
        assert!(cpu.flag(flags::N));
        assert!(!cpu.flag(flags::C));
    }

    #[test]
    fn test_sbc_borrow() {
        // SEC ; LDA #$10 ; SBC #$20
        let mut bus = bus_with_program(&[0x38, 0xA9, 0x10, 0xE9, 0x20]);
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus);
        cpu.step(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(cpu.regs.a, 0xF0);
        assert!(!cpu.flag(flags::C), "borrow clears carry");
        assert!(cpu.flag(flags::N));
    }

    #[test]
    fn test_cmp_carry_semantics() {
        // LDA #$40 ; CMP #$40
        let mut bus = bus_with_program(&[0xA9, 0x40, 0xC9, 0x40]);
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus);
        cpu.step(&mut bus);

        assert!(cpu.flag(flags::C), "lhs >= rhs sets C");
        assert!(cpu.flag(flags::Z));
    }

    #[test]
    fn test_index_width_invariant_after_sep() {
        // Native mode; REP #$10 ; LDX #$1234 ; SEP #$10
        let mut bus = bus_with_program(&[0xC2, 0x10, 0xA2, 0x34, 0x12, 0xE2, 0x10]);
        let mut cpu = cpu_at_reset(&mut bus);
        cpu.op_xce_for_test();

        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.x, 0x1234);

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.x, 0x34, "X high byte cleared when X flag set");
        assert_eq!(cpu.regs.y, 0x00);
    }

    #[test]
    fn test_xce_swaps_carry_and_emulation() {
        // CLC ; XCE
        let mut bus = bus_with_program(&[0x18, 0xFB]);
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus);
        cpu.step(&mut bus);

        assert!(!cpu.flag(flags::E), "cleared carry leaves emulation mode");
        assert!(cpu.flag(flags::C), "old E lands in C");
    }

    // ========================================
    // Control flow
    // ========================================

    #[test]
    fn test_branch_taken_and_not_taken() {
        // LDA #$00 ; BEQ +2 ; (skipped: LDA #$FF) ; NOP
        let mut bus = bus_with_program(&[0xA9, 0x00, 0xF0, 0x02, 0xA9, 0xFF, 0xEA]);
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x8006, "branch lands past the skipped load");

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.a, 0x00, "skipped instruction never ran");
    }

    #[test]
    fn test_jsr_rts_symmetry() {
        // JSR $8005 ; NOP ; NOP ; [sub] LDA #$77 ; RTS
        let mut bus = bus_with_program(&[0x20, 0x05, 0x80, 0xEA, 0xEA, 0xA9, 0x77, 0x60]);
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus); // JSR
        assert_eq!(cpu.regs.pc, 0x8005);

        cpu.step(&mut bus); // LDA
        cpu.step(&mut bus); // RTS
        assert_eq!(cpu.regs.pc, 0x8003, "RTS resumes after the JSR");
        assert_eq!(cpu.regs.a, 0x77);
    }

    #[test]
    fn test_mvn_moves_block() {
        // Native, 16-bit A/XY; move 3 bytes from $7E:1000 to $7E:2000.
        // REP #$30 ; LDA #$0002 ; LDX #$1000 ; LDY #$2000 ; MVN $7E,$7E ; NOP
        let mut bus = bus_with_program(&[
            0xC2, 0x30, 0xA9, 0x02, 0x00, 0xA2, 0x00, 0x10, 0xA0, 0x00, 0x20, 0x54, 0x7E, 0x7E,
            0xEA,
        ]);
        let mut cpu = cpu_at_reset(&mut bus);
        cpu.op_xce_for_test();

        bus.wram.write(0x1000, 0xAA);
        bus.wram.write(0x1001, 0xBB);
        bus.wram.write(0x1002, 0xCC);

        for _ in 0..4 {
            cpu.step(&mut bus);
        }

        // MVN executes once per byte
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        cpu.step(&mut bus);

        assert_eq!(bus.wram.read(0x2000), 0xAA);
        assert_eq!(bus.wram.read(0x2001), 0xBB);
        assert_eq!(bus.wram.read(0x2002), 0xCC);
        assert_eq!(cpu.regs.a, 0xFFFF);
        assert_eq!(cpu.regs.pc, 0x800E, "PC stepped past MVN when done");
    }

    // ========================================
    // Interrupts
    // ========================================

    #[test]
    fn test_nmi_dispatch_and_rti() {
        // Program: NOP x2. Handler at $00:9000 (ROM offset 0x1000):
        // LDA #$99 ; RTI. Interrupt entry and the first handler
        // instruction happen within one step.
        let mut bus = bus_with_program(&[0xEA, 0xEA]);
        bus.rom[0x7FEA] = 0x00; // NMI vector = $9000
        bus.rom[0x7FEB] = 0x90;
        bus.rom[0x1000] = 0xA9; // LDA #$99
        bus.rom[0x1001] = 0x99;
        bus.rom[0x1002] = 0x40; // RTI
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus); // NOP at $8000
        cpu.set_nmi();
        cpu.step(&mut bus); // NMI entry + first handler instruction

        assert_eq!(cpu.regs.pc, 0x9002, "first handler instruction executed");
        assert_eq!(cpu.regs.a, 0x99);
        assert_eq!(cpu.state(), crate::cpu::State::Interrupt);

        cpu.step(&mut bus); // RTI
        assert_eq!(cpu.regs.pc, 0x8001, "RTI resumes the interrupted flow");
        assert_eq!(cpu.state(), crate::cpu::State::Running);
    }

    #[test]
    fn test_wai_parks_until_interrupt() {
        let mut bus = bus_with_program(&[0xCB, 0xEA]); // WAI ; NOP
        bus.rom[0x7FEA] = 0x00; // NMI vector = $9000
        bus.rom[0x7FEB] = 0x90;
        bus.rom[0x1000] = 0x40; // handler: RTI
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus); // WAI
        assert!(cpu.waiting_for_interrupt());

        let pc = cpu.regs.pc;
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, pc, "no progress while waiting");

        cpu.set_nmi();
        cpu.step(&mut bus); // NMI entry + RTI in the handler
        assert!(!cpu.waiting_for_interrupt());
        assert_eq!(cpu.regs.pc, 0x8001, "back after the WAI");
    }

    #[test]
    fn test_irq_respects_i_flag() {
        // SEI ; NOP
        let mut bus = bus_with_program(&[0x78, 0xEA]);
        bus.rom[0x7FEE] = 0x00; // IRQ vector = $9000
        bus.rom[0x7FEF] = 0x90;
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus); // SEI
        cpu.set_irq_line(true);
        cpu.step(&mut bus); // NOP, IRQ masked

        assert_eq!(cpu.regs.pc, 0x8002, "masked IRQ does not dispatch");
    }

    #[test]
    fn test_irq_dispatch() {
        // CLI ; NOP ; NOP. Handler at $00:9000 (ROM offset 0x1000).
        let mut bus = bus_with_program(&[0x58, 0xEA, 0xEA]);
        bus.rom[0x7FEE] = 0x00;
        bus.rom[0x7FEF] = 0x90;
        bus.rom[0x1000] = 0xA9; // LDA #$12
        bus.rom[0x1001] = 0x12;
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus); // CLI
        cpu.set_irq_line(true);
        cpu.step(&mut bus); // IRQ entry + first handler instruction

        assert_eq!(cpu.regs.pc, 0x9002, "IRQ handler entered");
        assert_eq!(cpu.regs.a, 0x12);
        assert!(cpu.flag(flags::I), "I set on entry");
    }

    // ========================================
    // Fault path
    // ========================================

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_unknown_opcode_skips_in_release() {
        let mut bus = bus_with_program(&[0x00, 0xEA]); // BRK is undecodable
        let mut cpu = cpu_at_reset(&mut bus);

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x8001);
    }

    impl Cpu {
        /// Flip into native mode without running XCE through memory.
        fn op_xce_for_test(&mut self) {
            self.set_flag(flags::C, false);
            self.op_xce();
        }
    }
}
