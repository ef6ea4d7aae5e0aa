//! 8-bit and 16-bit load forms.

use crate::cpu::{Cpu, IndexMode};
use crate::flags::{parity, sign8, zero8};
use crate::Bus;

/// `LD r,r'` / `LD r,(HL)` / `LD r,(IX+d)` / `LD r,(IY+d)` / `LD (HL),r` etc — any combination
/// of the eight register-field encodings, one of which may be a memory reference.
pub fn ld_r_r(cpu: &mut Cpu, bus: &mut dyn Bus, dst: u8, src: u8, mode: IndexMode) {
    let value = cpu.read_reg8(bus, src, mode);
    cpu.write_reg8(bus, dst, mode, value);
}

/// `LD r,n` / `LD (HL),n` / `LD (IX+d),n` — immediate forms. The displacement (if any) precedes
/// the immediate byte in the instruction stream.
pub fn ld_r_n(cpu: &mut Cpu, bus: &mut dyn Bus, dst: u8, mode: IndexMode) {
    if dst == 6 {
        let addr = cpu.indexed_addr(bus, mode);
        let n = cpu.fetch_u8(bus);
        bus.write_mem(addr, n);
    } else {
        let n = cpu.fetch_u8(bus);
        cpu.write_reg8(bus, dst, mode, n);
    }
}

/// `LD A,(BC)`.
pub fn ld_a_from_bc(cpu: &mut Cpu, bus: &mut dyn Bus) {
    let value = bus.read_mem(cpu.registers.bc());
    cpu.registers.set_a(value);
}

/// `LD A,(DE)`.
pub fn ld_a_from_de(cpu: &mut Cpu, bus: &mut dyn Bus) {
    let value = bus.read_mem(cpu.registers.de());
    cpu.registers.set_a(value);
}

/// `LD (BC),A`.
pub fn ld_bc_from_a(cpu: &mut Cpu, bus: &mut dyn Bus) {
    bus.write_mem(cpu.registers.bc(), cpu.registers.a());
}

/// `LD (DE),A`.
pub fn ld_de_from_a(cpu: &mut Cpu, bus: &mut dyn Bus) {
    bus.write_mem(cpu.registers.de(), cpu.registers.a());
}

/// `LD A,(nn)`.
pub fn ld_a_from_nn(cpu: &mut Cpu, bus: &mut dyn Bus) {
    let addr = cpu.fetch_u16(bus);
    let value = bus.read_mem(addr);
    cpu.registers.set_a(value);
}

/// `LD (nn),A`.
pub fn ld_nn_from_a(cpu: &mut Cpu, bus: &mut dyn Bus) {
    let addr = cpu.fetch_u16(bus);
    bus.write_mem(addr, cpu.registers.a());
}

/// `LD I,A`.
pub fn ld_i_a(cpu: &mut Cpu) {
    cpu.i = cpu.registers.a();
}

/// `LD R,A`.
pub fn ld_r_a(cpu: &mut Cpu) {
    cpu.r = cpu.registers.a();
}

/// `LD A,I` — copies IFF2 into P/V so software can test the interrupt-enable state
/// non-destructively. H and N are cleared; C is unaffected.
pub fn ld_a_i(cpu: &mut Cpu) {
    let value = cpu.i;
    cpu.registers.set_a(value);
    cpu.registers.set_s_flag(sign8(value));
    cpu.registers.set_z_flag(zero8(value));
    cpu.registers.set_h_flag(false);
    cpu.registers.set_pv_flag(cpu.iff2);
    cpu.registers.set_n_flag(false);
}

/// `LD A,R` — same flag contract as `LD A,I`, copying the refresh register instead.
pub fn ld_a_r(cpu: &mut Cpu) {
    let value = cpu.r;
    cpu.registers.set_a(value);
    cpu.registers.set_s_flag(sign8(value));
    cpu.registers.set_z_flag(zero8(value));
    cpu.registers.set_h_flag(false);
    cpu.registers.set_pv_flag(cpu.iff2);
    cpu.registers.set_n_flag(false);
}

/// `LD dd,nn` / `LD ix,nn` / `LD iy,nn`.
pub fn ld_rp_nn(cpu: &mut Cpu, bus: &mut dyn Bus, rp: u8, mode: IndexMode) {
    let value = cpu.fetch_u16(bus);
    cpu.write_rp(rp, mode, value);
}

/// `LD HL,(nn)` and its `IX`/`IY` forms.
pub fn ld_rp_from_nn_indirect(cpu: &mut Cpu, bus: &mut dyn Bus, rp: u8, mode: IndexMode) {
    let addr = cpu.fetch_u16(bus);
    let lo = bus.read_mem(addr);
    let hi = bus.read_mem(addr.wrapping_add(1));
    cpu.write_rp(rp, mode, u16::from_le_bytes([lo, hi]));
}

/// `LD (nn),HL` and its `IX`/`IY` forms.
pub fn ld_nn_from_rp_indirect(cpu: &mut Cpu, bus: &mut dyn Bus, rp: u8, mode: IndexMode) {
    let addr = cpu.fetch_u16(bus);
    let value = cpu.read_rp(rp, mode);
    let [lo, hi] = value.to_le_bytes();
    bus.write_mem(addr, lo);
    bus.write_mem(addr.wrapping_add(1), hi);
}

/// `LD SP,HL` / `LD SP,IX` / `LD SP,IY`.
pub fn ld_sp_from_hl(cpu: &mut Cpu, mode: IndexMode) {
    cpu.sp = cpu.read_rp(2, mode);
}

/// `PUSH qq` for qq in {BC, DE, HL/IX/IY, AF}.
pub fn push(cpu: &mut Cpu, bus: &mut dyn Bus, qq: u8, mode: IndexMode) {
    let value = cpu.read_rp_af(qq, mode);
    cpu.push_u16(bus, value);
}

/// `POP qq` for qq in {BC, DE, HL/IX/IY, AF}.
pub fn pop(cpu: &mut Cpu, bus: &mut dyn Bus, qq: u8, mode: IndexMode) {
    let value = cpu.pop_u16(bus);
    cpu.write_rp_af(qq, mode, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::FlatBus;

    #[test]
    fn ld_a_i_copies_iff2_into_parity_overflow() {
        let mut cpu = Cpu::new();
        cpu.i = 0x42;
        cpu.iff2 = true;

        ld_a_i(&mut cpu);

        assert_eq!(cpu.registers.a(), 0x42);
        assert!(cpu.registers.pv_flag());
        assert!(!cpu.registers.h_flag());
        assert!(!cpu.registers.n_flag());
    }

    #[test]
    fn ld_nn_hl_then_ld_hl_nn_round_trips() {
        let mut cpu = Cpu::new();
        let mut bus = FlatBus::new();
        cpu.registers.set_hl(0xBEEF);
        cpu.pc = 0x0000;
        bus.mem[0] = 0x00;
        bus.mem[1] = 0x10;

        ld_nn_from_rp_indirect(&mut cpu, &mut bus, 2, IndexMode::Hl);

        cpu.pc = 0x0000;
        cpu.registers.set_hl(0);
        ld_rp_from_nn_indirect(&mut cpu, &mut bus, 2, IndexMode::Hl);

        assert_eq!(cpu.registers.hl(), 0xBEEF);
    }
}
