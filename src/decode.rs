//! The prefix-tree decoder: the unprefixed 256-entry table plus the CB, ED, and DDCB/FDCB
//! sub-dispatchers. DD/FD prefix *collapsing* (so the decoder only ever has to think about
//! "what index register is in effect") lives in [`crate::Cpu::step`]; this module picks the
//! handler for whatever opcode byte comes after that.
//!
//! Costs are attached here, at the decode site, not inside the handlers in [`crate::ops`]: a
//! handler *returns* its T-state cost rather than mutating a shared table entry, and the
//! natural place to own "what did this opcode cost" is the same match arm that dispatched it.

use crate::cpu::{Cpu, IndexMode};
use crate::ops::*;
use crate::Bus;

/// An 8-bit register-field substitution (B,C,D,E,H,L,(HL),A) costs 4 extra T-states under a
/// DD/FD prefix (the one extra M1 fetch) when it doesn't touch memory.
fn idx_cost_reg(base: u32, mode: IndexMode) -> u32 {
    if mode == IndexMode::Hl {
        base
    } else {
        base + 4
    }
}

/// An 8-bit register-field substitution that resolves to `(IX+d)`/`(IY+d)` costs 12 extra
/// T-states under a DD/FD prefix (prefix fetch + displacement fetch + address calculation).
fn idx_cost_mem(base: u32, mode: IndexMode) -> u32 {
    if mode == IndexMode::Hl {
        base
    } else {
        base + 12
    }
}

/// A 16-bit register-pair operation (the pair itself is IX/IY, not a memory reference through
/// it) costs a flat 4 extra T-states under a DD/FD prefix.
fn idx_cost_pair(base: u32, mode: IndexMode) -> u32 {
    if mode == IndexMode::Hl {
        base
    } else {
        base + 4
    }
}

impl Cpu {
    /// Dispatch one unprefixed (or DD/FD-prefixed) opcode byte. `mode` selects which index
    /// register, if any, `(HL)`/`H`/`L` references should be redirected through.
    pub(crate) fn dispatch_main(&mut self, bus: &mut dyn Bus, opcode: u8, mode: IndexMode) -> u32 {
        match opcode {
            0x00 => 4, // NOP

            0x76 => {
                // HALT — the one "LD r,r'"-shaped slot (dst=6, src=6) that isn't a load.
                control::halt(self);
                4
            }

            0xCB => self.dispatch_cb(bus, mode),
            0xED => {
                let extra = if mode != IndexMode::Hl { 4 } else { 0 };
                extra + self.dispatch_ed(bus)
            }

            // --- 8-bit load ---
            0x02 => {
                load::ld_bc_from_a(self, bus);
                7
            }
            0x12 => {
                load::ld_de_from_a(self, bus);
                7
            }
            0x0A => {
                load::ld_a_from_bc(self, bus);
                7
            }
            0x1A => {
                load::ld_a_from_de(self, bus);
                7
            }
            0x32 => {
                load::ld_nn_from_a(self, bus);
                13
            }
            0x3A => {
                load::ld_a_from_nn(self, bus);
                13
            }

            op if (op & 0xC7) == 0x06 => {
                let dst = (op >> 3) & 0x07;
                let cost = if dst == 6 { idx_cost_mem(10, mode) } else { idx_cost_reg(7, mode) };
                // LD (IX+d),n is 19T, not the 22T the generic memory-op delta would give.
                let cost = if dst == 6 && mode != IndexMode::Hl { 19 } else { cost };
                load::ld_r_n(self, bus, dst, mode);
                cost
            }

            op if (op & 0xC0) == 0x40 => {
                let dst = (op >> 3) & 0x07;
                let src = op & 0x07;
                let touches_mem = dst == 6 || src == 6;
                let base = if touches_mem { 7 } else { 4 };
                let cost = if touches_mem { idx_cost_mem(base, mode) } else { idx_cost_reg(base, mode) };
                load::ld_r_r(self, bus, dst, src, mode);
                cost
            }

            // --- 16-bit load ---
            op if (op & 0xCF) == 0x01 => {
                let rp = (op >> 4) & 0x03;
                load::ld_rp_nn(self, bus, rp, mode);
                idx_cost_pair(10, mode)
            }
            0x22 => {
                load::ld_nn_from_rp_indirect(self, bus, 2, mode);
                idx_cost_pair(16, mode)
            }
            0x2A => {
                load::ld_rp_from_nn_indirect(self, bus, 2, mode);
                idx_cost_pair(16, mode)
            }
            0xF9 => {
                load::ld_sp_from_hl(self, mode);
                idx_cost_pair(6, mode)
            }

            op if (op & 0xCF) == 0xC5 => {
                let qq = (op >> 4) & 0x03;
                load::push(self, bus, qq, mode);
                idx_cost_pair(11, mode)
            }
            op if (op & 0xCF) == 0xC1 => {
                let qq = (op >> 4) & 0x03;
                load::pop(self, bus, qq, mode);
                idx_cost_pair(10, mode)
            }

            // --- Exchange ---
            0x08 => {
                exchange::ex_af_af_prime(self);
                4
            }
            0xEB => {
                exchange::ex_de_hl(self);
                4
            }
            0xD9 => {
                exchange::exx(self);
                4
            }
            0xE3 => {
                exchange::ex_sp_indirect(self, bus, mode);
                idx_cost_pair(19, mode)
            }

            // --- 8-bit arithmetic/logic ---
            op if (op & 0xC0) == 0x80 => {
                let alu_op = (op >> 3) & 0x07;
                let src = op & 0x07;
                let touches_mem = src == 6;
                let base = if touches_mem { 7 } else { 4 };
                let cost = if touches_mem { idx_cost_mem(base, mode) } else { idx_cost_reg(base, mode) };
                let operand = self.read_reg8(bus, src, mode);
                self.apply_alu(alu_op, operand);
                cost
            }
            op if (op & 0xC7) == 0xC6 => {
                let alu_op = (op >> 3) & 0x07;
                let operand = self.fetch_u8(bus);
                self.apply_alu(alu_op, operand);
                7
            }

            // --- 8-bit INC/DEC ---
            op if (op & 0xC7) == 0x04 => {
                let reg = (op >> 3) & 0x07;
                let touches_mem = reg == 6;
                let base = if touches_mem { 11 } else { 4 };
                let cost = if touches_mem { idx_cost_mem(base, mode) } else { idx_cost_reg(base, mode) };
                let value = self.read_reg8(bus, reg, mode);
                let result = arith::inc8(self, value);
                self.write_reg8(bus, reg, mode, result);
                cost
            }
            op if (op & 0xC7) == 0x05 => {
                let reg = (op >> 3) & 0x07;
                let touches_mem = reg == 6;
                let base = if touches_mem { 11 } else { 4 };
                let cost = if touches_mem { idx_cost_mem(base, mode) } else { idx_cost_reg(base, mode) };
                let value = self.read_reg8(bus, reg, mode);
                let result = arith::dec8(self, value);
                self.write_reg8(bus, reg, mode, result);
                cost
            }

            // --- 16-bit arithmetic ---
            op if (op & 0xCF) == 0x09 => {
                let rp = (op >> 4) & 0x03;
                let a = self.read_rp(2, mode);
                let b = self.read_rp(rp, mode);
                let result = arith::add16(self, a, b);
                self.write_rp(2, mode, result);
                idx_cost_pair(11, mode)
            }
            op if (op & 0xCF) == 0x03 => {
                let rp = (op >> 4) & 0x03;
                let value = self.read_rp(rp, mode).wrapping_add(1);
                self.write_rp(rp, mode, value);
                idx_cost_pair(6, mode)
            }
            op if (op & 0xCF) == 0x0B => {
                let rp = (op >> 4) & 0x03;
                let value = self.read_rp(rp, mode).wrapping_sub(1);
                self.write_rp(rp, mode, value);
                idx_cost_pair(6, mode)
            }

            // --- Accumulator rotates ---
            0x07 => {
                rotate::rlca(self);
                4
            }
            0x0F => {
                rotate::rrca(self);
                4
            }
            0x17 => {
                rotate::rla(self);
                4
            }
            0x1F => {
                rotate::rra(self);
                4
            }

            // --- Misc accumulator/flag ---
            0x27 => {
                arith::daa(self);
                4
            }
            0x2F => {
                control::cpl(self);
                4
            }
            0x37 => {
                control::scf(self);
                4
            }
            0x3F => {
                control::ccf(self);
                4
            }

            // --- Branch/control flow ---
            0xC3 => {
                branch::jp_nn(self, bus);
                10
            }
            0xE9 => {
                branch::jp_indirect(self, mode);
                idx_cost_pair(4, mode)
            }
            0x18 => {
                branch::jr_e(self, bus);
                12
            }
            0x10 => {
                if branch::djnz(self, bus) {
                    13
                } else {
                    8
                }
            }
            0xCD => {
                branch::call_nn(self, bus);
                17
            }
            0xC9 => {
                branch::ret(self, bus);
                10
            }
            0xDB => {
                io::in_a_n(self, bus);
                11
            }
            0xD3 => {
                io::out_n_a(self, bus);
                11
            }
            0xF3 => {
                control::di(self);
                4
            }
            0xFB => {
                control::ei(self);
                4
            }

            op if (op & 0xC7) == 0xC2 => {
                let cc = (op >> 3) & 0x07;
                branch::jp_cc_nn(self, bus, cc);
                10
            }
            op if (op & 0xE7) == 0x20 => {
                let cc = (op >> 3) & 0x03;
                if branch::jr_cc_e(self, bus, cc) {
                    12
                } else {
                    7
                }
            }
            op if (op & 0xC7) == 0xC4 => {
                let cc = (op >> 3) & 0x07;
                if branch::call_cc_nn(self, bus, cc) {
                    17
                } else {
                    10
                }
            }
            op if (op & 0xC7) == 0xC0 => {
                let cc = (op >> 3) & 0x07;
                if branch::ret_cc(self, bus, cc) {
                    11
                } else {
                    5
                }
            }
            op if (op & 0xC7) == 0xC7 => {
                let target = (op & 0x38) as u16;
                branch::rst(self, bus, target);
                11
            }

            // Any other bit pattern in the main table is unreachable: the guards above cover
            // every byte 0x00..=0xFF except the prefixes, which are matched explicitly.
            other => self.illegal_opcode(&[other]),
        }
    }

    fn apply_alu(&mut self, alu_op: u8, operand: u8) {
        match alu_op {
            0 => {
                arith::add8(self, operand, false);
            }
            1 => {
                arith::add8(self, operand, true);
            }
            2 => {
                arith::sub8(self, operand, false, true);
            }
            3 => {
                arith::sub8(self, operand, true, true);
            }
            4 => {
                arith::and8(self, operand);
            }
            5 => {
                arith::xor8(self, operand);
            }
            6 => {
                arith::or8(self, operand);
            }
            7 => {
                arith::sub8(self, operand, false, false);
            }
            other => unreachable!("alu operation out of range: {other}"),
        }
    }

    /// `CB`-prefixed rotate/shift/bit-test/bit-set-or-clear group. For `mode == Hl` this is the
    /// plain two-byte `CB xx` form; otherwise it's the four-byte `DD/FD CB d xx` form, whose
    /// displacement byte comes *before* the final opcode byte (unlike the regular DD/FD
    /// encoding, where a displacement follows the opcode).
    fn dispatch_cb(&mut self, bus: &mut dyn Bus, mode: IndexMode) -> u32 {
        if mode == IndexMode::Hl {
            let cb_op = self.fetch_u8(bus);
            let reg = cb_op & 0x07;
            let touches_mem = reg == 6;
            let operand = self.read_reg8(bus, reg, mode);
            let result = self.cb_transform(cb_op, operand);

            if (cb_op >> 6) & 0x03 != 1 {
                self.write_reg8(bus, reg, mode, result);
            }

            if touches_mem {
                if (cb_op >> 6) & 0x03 == 1 {
                    12
                } else {
                    15
                }
            } else {
                8
            }
        } else {
            let d = self.fetch_u8(bus) as i8 as i16;
            let addr = self.read_rp(2, mode).wrapping_add(d as u16);
            let cb_op = self.fetch_u8(bus);
            let reg = cb_op & 0x07;
            let operand = bus.read_mem(addr);
            let result = self.cb_transform(cb_op, operand);

            let group = (cb_op >> 6) & 0x03;
            if group == 1 {
                // BIT b,(IX+d): flags only, nothing written back.
                20
            } else {
                bus.write_mem(addr, result);
                // Undocumented copy-back: DDCB/FDCB forms naming a register (not just "(HL)")
                // also land the result in that register.
                if reg != 6 {
                    self.write_reg8(bus, reg, mode, result);
                }
                23
            }
        }
    }

    /// Apply the CB-group transform named by `cb_op` to `operand`, setting flags as a side
    /// effect (for `BIT`, the only side effect) and returning the new byte value (for
    /// everything else; the return value is meaningless for `BIT`).
    fn cb_transform(&mut self, cb_op: u8, operand: u8) -> u8 {
        let group = (cb_op >> 6) & 0x03;
        let sub = (cb_op >> 3) & 0x07;

        match group {
            0 => match sub {
                0 => rotate::rlc(self, operand),
                1 => rotate::rrc(self, operand),
                2 => rotate::rl(self, operand),
                3 => rotate::rr(self, operand),
                4 => rotate::sla(self, operand),
                5 => rotate::sra(self, operand),
                6 => rotate::sll(self, operand),
                7 => rotate::srl(self, operand),
                other => unreachable!("shift group out of range: {other}"),
            },
            1 => {
                bit::bit(self, operand, sub);
                operand
            }
            2 => bit::res(operand, sub),
            3 => bit::set(operand, sub),
            other => unreachable!("cb group out of range: {other}"),
        }
    }

    /// `ED`-prefixed group: block ops, extended 16-bit loads, `NEG`, `IM`, `RETN`/`RETI`,
    /// `LD A,I`/`LD A,R`, `RLD`/`RRD`, `IN r,(C)`/`OUT (C),r`. `mode` is never consulted here —
    /// DD/FD before ED behaves as though the index prefix were never there (the 4 T-state
    /// penalty for that wasted prefix is charged by the caller).
    fn dispatch_ed(&mut self, bus: &mut dyn Bus) -> u32 {
        let opcode = self.fetch_u8(bus);
        let hl = IndexMode::Hl;

        match opcode {
            0x47 => {
                load::ld_i_a(self);
                9
            }
            0x4F => {
                load::ld_r_a(self);
                9
            }
            0x57 => {
                load::ld_a_i(self);
                9
            }
            0x5F => {
                load::ld_a_r(self);
                9
            }
            0x67 => {
                let addr = self.registers.hl();
                rotate::rrd(self, bus, addr);
                18
            }
            0x6F => {
                let addr = self.registers.hl();
                rotate::rld(self, bus, addr);
                18
            }

            0xA0 => {
                block::ldi_ldd(self, bus, 1);
                16
            }
            0xA8 => {
                block::ldi_ldd(self, bus, -1);
                16
            }
            0xB0 => {
                block::ldi_ldd(self, bus, 1);
                if self.registers.pv_flag() {
                    self.pc = self.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }
            0xB8 => {
                block::ldi_ldd(self, bus, -1);
                if self.registers.pv_flag() {
                    self.pc = self.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }

            0xA1 => {
                block::cpi_cpd(self, bus, 1);
                16
            }
            0xA9 => {
                block::cpi_cpd(self, bus, -1);
                16
            }
            0xB1 => {
                block::cpi_cpd(self, bus, 1);
                if self.registers.pv_flag() && !self.registers.z_flag() {
                    self.pc = self.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }
            0xB9 => {
                block::cpi_cpd(self, bus, -1);
                if self.registers.pv_flag() && !self.registers.z_flag() {
                    self.pc = self.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }

            0xA2 => {
                block::ini_ind(self, bus, 1);
                16
            }
            0xAA => {
                block::ini_ind(self, bus, -1);
                16
            }
            0xB2 => {
                block::ini_ind(self, bus, 1);
                if !self.registers.z_flag() {
                    self.pc = self.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }
            0xBA => {
                block::ini_ind(self, bus, -1);
                if !self.registers.z_flag() {
                    self.pc = self.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }

            0xA3 => {
                block::outi_outd(self, bus, 1);
                16
            }
            0xAB => {
                block::outi_outd(self, bus, -1);
                16
            }
            0xB3 => {
                block::outi_outd(self, bus, 1);
                if !self.registers.z_flag() {
                    self.pc = self.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }
            0xBB => {
                block::outi_outd(self, bus, -1);
                if !self.registers.z_flag() {
                    self.pc = self.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }

            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                // RETN is every (op & 0xC7) == 0x45 slot except 0x4D, which is RETI.
                if opcode == 0x4D {
                    branch::reti(self, bus);
                } else {
                    branch::retn(self, bus);
                }
                14
            }

            op if (op & 0xC7) == 0x46 => {
                let mode_value = match op & 0x18 {
                    0x00 | 0x08 => 0,
                    0x10 => 1,
                    0x18 => 2,
                    _ => unreachable!(),
                };
                control::set_interrupt_mode(self, mode_value);
                8
            }

            op if (op & 0xC7) == 0x44 => {
                arith::neg(self);
                8
            }

            op if (op & 0xC7) == 0x40 => {
                let dst = (op >> 3) & 0x07;
                io::in_r_c(self, bus, dst, hl);
                12
            }
            op if (op & 0xC7) == 0x41 => {
                let src = (op >> 3) & 0x07;
                io::out_c_r(self, bus, src, hl);
                12
            }

            op if (op & 0xCF) == 0x42 => {
                let rp = (op >> 4) & 0x03;
                let a = self.registers.hl();
                let b = self.read_rp(rp, hl);
                let result = arith::sbc16(self, a, b);
                self.registers.set_hl(result);
                15
            }
            op if (op & 0xCF) == 0x4A => {
                let rp = (op >> 4) & 0x03;
                let a = self.registers.hl();
                let b = self.read_rp(rp, hl);
                let result = arith::adc16(self, a, b);
                self.registers.set_hl(result);
                15
            }

            op if (op & 0xCF) == 0x43 => {
                let rp = (op >> 4) & 0x03;
                load::ld_nn_from_rp_indirect(self, bus, rp, hl);
                20
            }
            op if (op & 0xCF) == 0x4B => {
                let rp = (op >> 4) & 0x03;
                load::ld_rp_from_nn_indirect(self, bus, rp, hl);
                20
            }

            // Genuinely undefined ED opcodes act as an 8 T-state NOP, matching real silicon.
            _ => 8,
        }
    }

    #[cold]
    fn illegal_opcode(&self, prefix: &[u8]) -> ! {
        panic!(
            "illegal Z80 opcode sequence {prefix:02X?} at PC={:#06X}",
            self.pc
        );
    }
}
