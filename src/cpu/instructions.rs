// Instruction handlers for the 65816
//
// One method per handler tag. Memory-mode handlers receive the effective
// 24-bit address in `data`; immediate handlers receive the literal
// operand. Width is decided by the M flag (accumulator ops) or the X flag
// (index ops): flag set means 8-bit.
//
// Decimal mode is not modeled; ADC/SBC assert it away in debug builds and
// fall back to binary arithmetic otherwise.

use crate::bus::Membus;

use super::{flags, Cpu, State};

impl Cpu {
    // ========================================
    // Arithmetic
    // ========================================

    pub(super) fn op_adc(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.a8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.adc_common(operand);
    }

    pub(super) fn op_adc_imm(&mut self, data: u32) {
        self.adc_common(data);
    }

    fn adc_common(&mut self, data: u32) {
        debug_assert!(!self.flag(flags::D), "decimal mode is not modeled");

        let carry = self.flag(flags::C) as u32;

        if self.a8() {
            let a = (self.regs.a & 0xFF) as u32;
            let data = data & 0xFF;
            let result = a + data + carry;

            // V: operands agree in sign, result disagrees
            self.set_flag(
                flags::V,
                (a & 0x80) == (data & 0x80) && (a & 0x80) != (result & 0x80),
            );

            self.regs.a = (self.regs.a & 0xFF00) | (result & 0xFF) as u16;
            self.set_nz(self.regs.a & 0xFF, 0x80);
            self.set_flag(flags::C, result >= 0x100);
        } else {
            let a = self.regs.a as u32;
            let data = data & 0xFFFF;
            let result = a + data + carry;

            self.set_flag(flags::V, !(a ^ data) & (data ^ result) & 0x8000 != 0);

            self.regs.a = result as u16;
            self.set_nz(self.regs.a, 0x8000);
            self.set_flag(flags::C, result >= 0x10000);
        }
    }

    pub(super) fn op_sbc(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.a8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.sbc_common(operand);
    }

    pub(super) fn op_sbc_imm(&mut self, data: u32) {
        self.sbc_common(data);
    }

    fn sbc_common(&mut self, data: u32) {
        debug_assert!(!self.flag(flags::D), "decimal mode is not modeled");

        let carry = self.flag(flags::C) as u32;

        if self.a8() {
            // Subtraction as addition of the complement
            let a = (self.regs.a & 0xFF) as u32;
            let data = (!data) & 0xFF;
            let result = a + data + carry;

            self.set_flag(flags::V, !(a ^ data) & (a ^ result) & 0x80 != 0);
            self.set_flag(flags::C, result > 0xFF);
            self.set_nz((result & 0xFF) as u16, 0x80);

            self.regs.a = (self.regs.a & 0xFF00) | (result & 0xFF) as u16;
        } else {
            let a = self.regs.a as u32;
            let data = (!data) & 0xFFFF;
            let result = a + data + carry;

            self.set_flag(flags::V, !(a ^ data) & (a ^ result) & 0x8000 != 0);
            self.set_flag(flags::C, result > 0xFFFF);
            self.set_nz((result & 0xFFFF) as u16, 0x8000);

            self.regs.a = result as u16;
        }
    }

    pub(super) fn op_inc_a(&mut self) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | (self.regs.a.wrapping_add(1) & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a = self.regs.a.wrapping_add(1);
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_inc(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            let value = bus.read_u8(data, cycles).wrapping_add(1);
            bus.write_u8(data, value, cycles);
            self.set_nz(value as u16, 0x80);
        } else {
            let value = bus.read_u16(data, cycles).wrapping_add(1);
            bus.write_u16(data, value, cycles);
            self.set_nz(value, 0x8000);
        }
    }

    pub(super) fn op_inx(&mut self) {
        if self.index8() {
            self.regs.x = (self.regs.x & 0xFF00) | (self.regs.x.wrapping_add(1) & 0xFF);
            self.set_nz(self.regs.x & 0xFF, 0x80);
        } else {
            self.regs.x = self.regs.x.wrapping_add(1);
            self.set_nz(self.regs.x, 0x8000);
        }
    }

    pub(super) fn op_iny(&mut self) {
        if self.index8() {
            self.regs.y = (self.regs.y & 0xFF00) | (self.regs.y.wrapping_add(1) & 0xFF);
            self.set_nz(self.regs.y & 0xFF, 0x80);
        } else {
            self.regs.y = self.regs.y.wrapping_add(1);
            self.set_nz(self.regs.y, 0x8000);
        }
    }

    pub(super) fn op_dec_a(&mut self) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | (self.regs.a.wrapping_sub(1) & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a = self.regs.a.wrapping_sub(1);
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_dec(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            let value = bus.read_u8(data, cycles).wrapping_sub(1);
            bus.write_u8(data, value, cycles);
            self.set_nz(value as u16, 0x80);
        } else {
            let value = bus.read_u16(data, cycles).wrapping_sub(1);
            bus.write_u16(data, value, cycles);
            self.set_nz(value, 0x8000);
        }
    }

    pub(super) fn op_dex(&mut self) {
        if self.index8() {
            self.regs.x = self.regs.x.wrapping_sub(1) & 0xFF;
            self.set_nz(self.regs.x, 0x80);
        } else {
            self.regs.x = self.regs.x.wrapping_sub(1);
            self.set_nz(self.regs.x, 0x8000);
        }
    }

    pub(super) fn op_dey(&mut self) {
        if self.index8() {
            self.regs.y = self.regs.y.wrapping_sub(1) & 0xFF;
            self.set_nz(self.regs.y, 0x80);
        } else {
            self.regs.y = self.regs.y.wrapping_sub(1);
            self.set_nz(self.regs.y, 0x8000);
        }
    }

    // ========================================
    // Logic
    // ========================================

    pub(super) fn op_and(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.a8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_and_imm(operand);
    }

    pub(super) fn op_and_imm(&mut self, data: u32) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | ((self.regs.a & 0xFF) & data as u16);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a &= data as u16;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_ora(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.a8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_ora_imm(operand);
    }

    pub(super) fn op_ora_imm(&mut self, data: u32) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | ((self.regs.a & 0xFF) | (data as u16 & 0xFF));
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a |= data as u16;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_eor(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.a8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_eor_imm(operand);
    }

    pub(super) fn op_eor_imm(&mut self, data: u32) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | ((self.regs.a & 0xFF) ^ (data as u16 & 0xFF));
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a ^= data as u16;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_bit(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            let value = bus.read_u8(data, cycles);
            self.set_z((self.regs.a & 0xFF) & value as u16);
            self.set_flag(flags::N, value & (1 << 7) != 0);
            self.set_flag(flags::V, value & (1 << 6) != 0);
        } else {
            let value = bus.read_u16(data, cycles);
            self.set_z(self.regs.a & value);
            self.set_flag(flags::N, value & (1 << 15) != 0);
            self.set_flag(flags::V, value & (1 << 14) != 0);
        }
    }

    /// Immediate BIT only touches Z.
    pub(super) fn op_bit_imm(&mut self, data: u32) {
        if self.a8() {
            self.set_z((self.regs.a & 0xFF) & (data as u16 & 0xFF));
        } else {
            self.set_z(self.regs.a & data as u16);
        }
    }

    pub(super) fn op_trb(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            let a = (self.regs.a & 0xFF) as u8;
            let value = bus.read_u8(data, cycles);
            self.set_z((value & a) as u16);
            bus.write_u8(data, value & !a, cycles);
        } else {
            let value = bus.read_u16(data, cycles);
            self.set_z(value & self.regs.a);
            bus.write_u16(data, value & !self.regs.a, cycles);
        }
    }

    pub(super) fn op_tsb(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            let a = (self.regs.a & 0xFF) as u8;
            let value = bus.read_u8(data, cycles);
            self.set_z((value & a) as u16);
            bus.write_u8(data, value | a, cycles);
        } else {
            let value = bus.read_u16(data, cycles);
            self.set_z(value & self.regs.a);
            bus.write_u16(data, value | self.regs.a, cycles);
        }
    }

    // ========================================
    // Shifts and rotates
    // ========================================

    pub(super) fn op_asl_a(&mut self) {
        if self.a8() {
            let v = (self.regs.a & 0xFF) << 1;
            self.set_flag(flags::C, v >> 8 != 0);
            self.regs.a = (self.regs.a & 0xFF00) | (v & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            let v = (self.regs.a as u32) << 1;
            self.set_flag(flags::C, v >> 16 != 0);
            self.regs.a = v as u16;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_asl(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            let value = bus.read_u8(data, cycles);
            self.set_flag(flags::C, value >> 7 != 0);
            let value = value << 1;
            bus.write_u8(data, value, cycles);
            self.set_nz(value as u16, 0x80);
        } else {
            let value = bus.read_u16(data, cycles);
            self.set_flag(flags::C, value >> 15 != 0);
            let value = value << 1;
            bus.write_u16(data, value, cycles);
            self.set_nz(value, 0x8000);
        }
    }

    pub(super) fn op_lsr_a(&mut self) {
        if self.a8() {
            let v = self.regs.a & 0xFF;
            self.set_flag(flags::C, v & 1 != 0);
            let v = v >> 1;
            self.regs.a = (self.regs.a & 0xFF00) | v;
            self.set_nz(v, 0x80);
        } else {
            let v = self.regs.a;
            self.set_flag(flags::C, v & 1 != 0);
            self.regs.a = v >> 1;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_lsr(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            let value = bus.read_u8(data, cycles);
            self.set_flag(flags::C, value & 1 != 0);
            let value = value >> 1;
            bus.write_u8(data, value, cycles);
            self.set_nz(value as u16, 0x80);
        } else {
            let value = bus.read_u16(data, cycles);
            self.set_flag(flags::C, value & 1 != 0);
            let value = value >> 1;
            bus.write_u16(data, value, cycles);
            self.set_nz(value, 0x8000);
        }
    }

    pub(super) fn op_rol_a(&mut self) {
        let carry = self.flag(flags::C) as u16;

        if self.a8() {
            let v = ((self.regs.a & 0xFF) << 1) | carry;
            self.set_flag(flags::C, v >> 8 != 0);
            self.regs.a = (self.regs.a & 0xFF00) | (v & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            let v = ((self.regs.a as u32) << 1) | carry as u32;
            self.set_flag(flags::C, v >> 16 != 0);
            self.regs.a = v as u16;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_rol(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let carry = self.flag(flags::C) as u16;

        if self.a8() {
            let v = ((bus.read_u8(data, cycles) as u16) << 1) | carry;
            self.set_flag(flags::C, v >> 8 != 0);
            let v = (v & 0xFF) as u8;
            bus.write_u8(data, v, cycles);
            self.set_nz(v as u16, 0x80);
        } else {
            let v = ((bus.read_u16(data, cycles) as u32) << 1) | carry as u32;
            self.set_flag(flags::C, v >> 16 != 0);
            let v = v as u16;
            bus.write_u16(data, v, cycles);
            self.set_nz(v, 0x8000);
        }
    }

    pub(super) fn op_ror_a(&mut self) {
        let carry = self.flag(flags::C) as u16;

        if self.a8() {
            let v = self.regs.a & 0xFF;
            self.set_flag(flags::C, v & 1 != 0);
            let v = (carry << 7) | (v >> 1);
            self.regs.a = (self.regs.a & 0xFF00) | (v & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            let v = self.regs.a;
            self.set_flag(flags::C, v & 1 != 0);
            self.regs.a = (carry << 15) | (v >> 1);
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_ror(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let carry = self.flag(flags::C) as u16;

        if self.a8() {
            let value = bus.read_u8(data, cycles);
            self.set_flag(flags::C, value & 1 != 0);
            let value = ((carry as u8) << 7) | (value >> 1);
            bus.write_u8(data, value, cycles);
            self.set_nz(value as u16, 0x80);
        } else {
            let value = bus.read_u16(data, cycles);
            self.set_flag(flags::C, value & 1 != 0);
            let value = (carry << 15) | (value >> 1);
            bus.write_u16(data, value, cycles);
            self.set_nz(value, 0x8000);
        }
    }

    // ========================================
    // Compare
    // ========================================

    pub(super) fn op_cmp(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.a8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_cmp_imm(operand);
    }

    pub(super) fn op_cmp_imm(&mut self, data: u32) {
        let (result, mask) = if self.a8() {
            ((self.regs.a & 0xFF) as i32 - (data & 0xFF) as i32, 0x80)
        } else {
            (self.regs.a as i32 - (data & 0xFFFF) as i32, 0x8000)
        };

        self.set_nz(result as u16, mask);
        self.set_c_sub(result);
    }

    pub(super) fn op_cpx(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.index8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_cpx_imm(operand);
    }

    pub(super) fn op_cpx_imm(&mut self, data: u32) {
        let (result, mask) = if self.index8() {
            ((self.regs.x & 0xFF) as i32 - (data & 0xFF) as i32, 0x80)
        } else {
            (self.regs.x as i32 - (data & 0xFFFF) as i32, 0x8000)
        };

        self.set_nz(result as u16, mask);
        self.set_c_sub(result);
    }

    pub(super) fn op_cpy(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.index8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_cpy_imm(operand);
    }

    pub(super) fn op_cpy_imm(&mut self, data: u32) {
        let (result, mask) = if self.index8() {
            ((self.regs.y & 0xFF) as i32 - (data & 0xFF) as i32, 0x80)
        } else {
            (self.regs.y as i32 - (data & 0xFFFF) as i32, 0x8000)
        };

        self.set_nz(result as u16, mask);
        self.set_c_sub(result);
    }

    // ========================================
    // Loads and stores
    // ========================================

    pub(super) fn op_lda(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.a8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_lda_imm(operand);
    }

    pub(super) fn op_lda_imm(&mut self, data: u32) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | (data as u16 & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a = data as u16;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_ldx(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.index8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_ldx_imm(operand);
    }

    pub(super) fn op_ldx_imm(&mut self, data: u32) {
        if self.index8() {
            self.regs.x = data as u16 & 0xFF;
            self.set_nz(self.regs.x, 0x80);
        } else {
            self.regs.x = data as u16;
            self.set_nz(self.regs.x, 0x8000);
        }
    }

    pub(super) fn op_ldy(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let operand = if self.index8() {
            bus.read_u8(data, cycles) as u32
        } else {
            bus.read_u16(data, cycles) as u32
        };
        self.op_ldy_imm(operand);
    }

    pub(super) fn op_ldy_imm(&mut self, data: u32) {
        if self.index8() {
            self.regs.y = data as u16 & 0xFF;
            self.set_nz(self.regs.y, 0x80);
        } else {
            self.regs.y = data as u16;
            self.set_nz(self.regs.y, 0x8000);
        }
    }

    pub(super) fn op_sta(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            bus.write_u8(data, (self.regs.a & 0xFF) as u8, cycles);
        } else {
            bus.write_u16(data, self.regs.a, cycles);
        }
    }

    pub(super) fn op_stx(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.index8() {
            bus.write_u8(data, (self.regs.x & 0xFF) as u8, cycles);
        } else {
            bus.write_u16(data, self.regs.x, cycles);
        }
    }

    pub(super) fn op_sty(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.index8() {
            bus.write_u8(data, (self.regs.y & 0xFF) as u8, cycles);
        } else {
            bus.write_u16(data, self.regs.y, cycles);
        }
    }

    pub(super) fn op_stz(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        if self.a8() {
            bus.write_u8(data, 0, cycles);
        } else {
            bus.write_u16(data, 0, cycles);
        }
    }

    // ========================================
    // Branches and jumps
    // ========================================

    fn branch_if(&mut self, condition: bool, data: u32) {
        if condition {
            self.regs.pc = data as u16;
        }
    }

    pub(super) fn op_bcc(&mut self, data: u32) {
        self.branch_if(!self.flag(flags::C), data);
    }

    pub(super) fn op_bcs(&mut self, data: u32) {
        self.branch_if(self.flag(flags::C), data);
    }

    pub(super) fn op_beq(&mut self, data: u32) {
        self.branch_if(self.flag(flags::Z), data);
    }

    pub(super) fn op_bne(&mut self, data: u32) {
        self.branch_if(!self.flag(flags::Z), data);
    }

    pub(super) fn op_bmi(&mut self, data: u32) {
        self.branch_if(self.flag(flags::N), data);
    }

    pub(super) fn op_bpl(&mut self, data: u32) {
        self.branch_if(!self.flag(flags::N), data);
    }

    pub(super) fn op_bvc(&mut self, data: u32) {
        self.branch_if(!self.flag(flags::V), data);
    }

    pub(super) fn op_bvs(&mut self, data: u32) {
        self.branch_if(self.flag(flags::V), data);
    }

    pub(super) fn op_bra(&mut self, data: u32) {
        self.regs.pc = data as u16;
    }

    pub(super) fn op_brl(&mut self, data: u32) {
        self.regs.pb = (data >> 16) as u8;
        self.regs.pc = data as u16;
    }

    pub(super) fn op_jmp(&mut self, data: u32) {
        self.regs.pb = (data >> 16) as u8;
        self.regs.pc = data as u16;
    }

    pub(super) fn op_jsr(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        self.push_u16(bus, self.regs.pc.wrapping_sub(1), cycles);
        self.regs.pc = data as u16;
    }

    pub(super) fn op_jsl(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        self.push_u8(bus, self.regs.pb, cycles);
        self.push_u16(bus, self.regs.pc.wrapping_sub(1), cycles);

        self.regs.pb = (data >> 16) as u8;
        self.regs.pc = data as u16;
    }

    pub(super) fn op_rts(&mut self, bus: &mut Membus, cycles: &mut u32) {
        self.regs.pc = self.pull_u16(bus, cycles).wrapping_add(1);
    }

    pub(super) fn op_rtl(&mut self, bus: &mut Membus, cycles: &mut u32) {
        self.regs.pc = self.pull_u16(bus, cycles).wrapping_add(1);
        self.regs.pb = self.pull_u8(bus, cycles);
    }

    pub(super) fn op_rti(&mut self, bus: &mut Membus, cycles: &mut u32) {
        let p = self.pull_u8(bus, cycles) as u16;
        let pc = self.pull_u16(bus, cycles);
        let pb = self.pull_u8(bus, cycles);

        // E survives; only the architectural byte is restored
        self.regs.p = (self.regs.p & flags::E) | p;
        self.regs.pc = pc;
        self.regs.pb = pb;

        self.clamp_index_registers();
        self.set_state(State::Running);
    }

    // ========================================
    // Block move
    //
    // MVN moves one byte per execution; PC is stepped past the operand
    // only when the count in A wraps, so the instruction re-runs and
    // interrupts stay serviceable mid-transfer.
    // ========================================

    pub(super) fn op_mvn(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        let src_bank = ((data >> 8) & 0xFF) as u8;
        self.regs.db = (data & 0xFF) as u8;

        let src = ((src_bank as u32) << 16) | self.regs.x as u32;
        let dst = ((self.regs.db as u32) << 16) | self.regs.y as u32;
        let value = bus.read_u8(src, cycles);
        bus.write_u8(dst, value, cycles);

        self.regs.a = self.regs.a.wrapping_sub(1);
        self.regs.x = self.regs.x.wrapping_add(1);
        self.regs.y = self.regs.y.wrapping_add(1);

        if self.regs.a == 0xFFFF {
            // Skip opcode + parameters
            self.regs.pc = self.regs.pc.wrapping_add(3);
        }
    }

    // ========================================
    // Stack
    // ========================================

    pub(super) fn op_pea(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        self.push_u16(bus, data as u16, cycles);
    }

    pub(super) fn op_per(&mut self, bus: &mut Membus, data: u32, cycles: &mut u32) {
        self.push_u16(bus, data as u16, cycles);
    }

    pub(super) fn op_pha(&mut self, bus: &mut Membus, cycles: &mut u32) {
        if self.a8() {
            self.push_u8(bus, (self.regs.a & 0xFF) as u8, cycles);
        } else {
            self.push_u16(bus, self.regs.a, cycles);
        }
    }

    pub(super) fn op_phb(&mut self, bus: &mut Membus, cycles: &mut u32) {
        self.push_u8(bus, self.regs.db, cycles);
    }

    pub(super) fn op_phd(&mut self, bus: &mut Membus, cycles: &mut u32) {
        self.push_u16(bus, self.regs.d, cycles);
    }

    pub(super) fn op_phk(&mut self, bus: &mut Membus, cycles: &mut u32) {
        self.push_u8(bus, self.regs.pb, cycles);
    }

    pub(super) fn op_php(&mut self, bus: &mut Membus, cycles: &mut u32) {
        self.push_u8(bus, self.regs.p as u8, cycles);
    }

    pub(super) fn op_phx(&mut self, bus: &mut Membus, cycles: &mut u32) {
        if self.index8() {
            self.push_u8(bus, (self.regs.x & 0xFF) as u8, cycles);
        } else {
            self.push_u16(bus, self.regs.x, cycles);
        }
    }

    pub(super) fn op_phy(&mut self, bus: &mut Membus, cycles: &mut u32) {
        if self.index8() {
            self.push_u8(bus, (self.regs.y & 0xFF) as u8, cycles);
        } else {
            self.push_u16(bus, self.regs.y, cycles);
        }
    }

    pub(super) fn op_pla(&mut self, bus: &mut Membus, cycles: &mut u32) {
        if self.a8() {
            let value = self.pull_u8(bus, cycles);
            self.regs.a = (self.regs.a & 0xFF00) | value as u16;
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a = self.pull_u16(bus, cycles);
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_plb(&mut self, bus: &mut Membus, cycles: &mut u32) {
        self.regs.db = self.pull_u8(bus, cycles);
        self.set_nz(self.regs.db as u16, 0x80);
    }

    pub(super) fn op_pld(&mut self, bus: &mut Membus, cycles: &mut u32) {
        self.regs.d = self.pull_u16(bus, cycles);
        self.set_nz(self.regs.d, 0x8000);
    }

    pub(super) fn op_plp(&mut self, bus: &mut Membus, cycles: &mut u32) {
        let p = self.pull_u8(bus, cycles) as u16;
        self.regs.p = (self.regs.p & flags::E) | p;
        self.clamp_index_registers();
    }

    pub(super) fn op_plx(&mut self, bus: &mut Membus, cycles: &mut u32) {
        if self.index8() {
            self.regs.x = self.pull_u8(bus, cycles) as u16;
            self.set_nz(self.regs.x, 0x80);
        } else {
            self.regs.x = self.pull_u16(bus, cycles);
            self.set_nz(self.regs.x, 0x8000);
        }
    }

    pub(super) fn op_ply(&mut self, bus: &mut Membus, cycles: &mut u32) {
        if self.index8() {
            self.regs.y = self.pull_u8(bus, cycles) as u16;
            self.set_nz(self.regs.y, 0x80);
        } else {
            self.regs.y = self.pull_u16(bus, cycles);
            self.set_nz(self.regs.y, 0x8000);
        }
    }

    // ========================================
    // Flag manipulation
    // ========================================

    pub(super) fn op_clc(&mut self) {
        self.set_flag(flags::C, false);
    }

    pub(super) fn op_cld(&mut self) {
        self.set_flag(flags::D, false);
    }

    pub(super) fn op_cli(&mut self) {
        self.set_flag(flags::I, false);
    }

    pub(super) fn op_clv(&mut self) {
        self.set_flag(flags::V, false);
    }

    pub(super) fn op_sec(&mut self) {
        self.set_flag(flags::C, true);
    }

    pub(super) fn op_sed(&mut self) {
        self.set_flag(flags::D, true);
    }

    pub(super) fn op_sei(&mut self) {
        self.set_flag(flags::I, true);
    }

    pub(super) fn op_rep(&mut self, data: u32) {
        self.regs.p &= !(data as u16 & 0xFF);
    }

    pub(super) fn op_sep(&mut self, data: u32) {
        self.regs.p |= data as u16 & 0xFF;
        self.clamp_index_registers();
    }

    /// Swap C and E. Entering emulation forces 8-bit widths and caps the
    /// stack pointer into page 1.
    pub(super) fn op_xce(&mut self) {
        let carry = self.flag(flags::C);
        let emulation = self.flag(flags::E);

        if carry {
            self.set_flag(flags::E, true);
            self.set_flag(flags::M, true);
            self.set_flag(flags::X, true);
            self.regs.x &= 0xFF;
            self.regs.y &= 0xFF;
            self.regs.s = 0x0100 | (self.regs.s & 0xFF);
        } else {
            self.set_flag(flags::E, false);
        }

        self.set_flag(flags::C, emulation);
    }

    // ========================================
    // Transfers
    // ========================================

    pub(super) fn op_tax(&mut self) {
        if self.index8() {
            self.regs.x = (self.regs.x & 0xFF00) | (self.regs.a & 0xFF);
            self.set_nz(self.regs.x & 0xFF, 0x80);
        } else {
            self.regs.x = self.regs.a;
            self.set_nz(self.regs.x, 0x8000);
        }
    }

    pub(super) fn op_tay(&mut self) {
        if self.index8() {
            self.regs.y = (self.regs.y & 0xFF00) | (self.regs.a & 0xFF);
            self.set_nz(self.regs.y & 0xFF, 0x80);
        } else {
            self.regs.y = self.regs.a;
            self.set_nz(self.regs.y, 0x8000);
        }
    }

    pub(super) fn op_txa(&mut self) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | (self.regs.x & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a = self.regs.x;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_tya(&mut self) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | (self.regs.y & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a = self.regs.y;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_txy(&mut self) {
        if self.index8() {
            self.regs.y = (self.regs.y & 0xFF00) | (self.regs.x & 0xFF);
            self.set_nz(self.regs.y & 0xFF, 0x80);
        } else {
            self.regs.y = self.regs.x;
            self.set_nz(self.regs.y, 0x8000);
        }
    }

    pub(super) fn op_tyx(&mut self) {
        if self.index8() {
            self.regs.x = (self.regs.x & 0xFF00) | (self.regs.y & 0xFF);
            self.set_nz(self.regs.x & 0xFF, 0x80);
        } else {
            self.regs.x = self.regs.y;
            self.set_nz(self.regs.x, 0x8000);
        }
    }

    pub(super) fn op_tcd(&mut self) {
        self.regs.d = self.regs.a;
        self.set_nz(self.regs.d, 0x8000);
    }

    pub(super) fn op_tdc(&mut self) {
        self.regs.a = self.regs.d;
        self.set_nz(self.regs.a, 0x8000);
    }

    /// TCS never touches flags; the full 16-bit A is transferred.
    pub(super) fn op_tcs(&mut self) {
        self.regs.s = self.regs.a;
    }

    pub(super) fn op_tsc(&mut self) {
        if self.a8() {
            self.regs.a = (self.regs.a & 0xFF00) | (self.regs.s & 0xFF);
            self.set_nz(self.regs.a & 0xFF, 0x80);
        } else {
            self.regs.a = self.regs.s;
            self.set_nz(self.regs.a, 0x8000);
        }
    }

    pub(super) fn op_tsx(&mut self) {
        if self.index8() {
            self.regs.x = (self.regs.x & 0xFF00) | (self.regs.s & 0xFF);
            self.set_nz(self.regs.x & 0xFF, 0x80);
        } else {
            self.regs.x = self.regs.s;
            self.set_nz(self.regs.x, 0x8000);
        }
    }

    pub(super) fn op_txs(&mut self) {
        self.regs.s = self.regs.x;
    }

    pub(super) fn op_xba(&mut self) {
        self.regs.a = ((self.regs.a & 0xFF) << 8) | (self.regs.a >> 8);
        self.set_nz(self.regs.a & 0xFF, 0x80);
    }

    // ========================================
    // Misc
    // ========================================

    pub(super) fn op_nop(&mut self) {}

    pub(super) fn op_wai(&mut self) {
        self.set_wait_interrupt(true);
    }
}
