//! Block transfer, block compare, and block I/O. Each function performs exactly one iteration; the repeating forms
//! (`LDIR`, `CPIR`, `INIR`, `OTIR`, ...) are the plain form plus a PC rewind in
//! [`crate::decode`], which inspects the flags left behind here to decide whether to repeat.

use crate::flags::{half_carry_sub8, sign8, zero8};
use crate::cpu::Cpu;
use crate::Bus;

/// `LDI`/`LDD`: copy `(HL)` to `(DE)`, then step HL and DE by `step`, decrement BC. H and N
/// cleared; P/V set iff BC is nonzero after the decrement. S, Z, C unaffected.
pub fn ldi_ldd(cpu: &mut Cpu, bus: &mut dyn Bus, step: i16) {
    let hl = cpu.registers.hl();
    let de = cpu.registers.de();
    let value = bus.read_mem(hl);
    bus.write_mem(de, value);

    cpu.registers.set_hl(hl.wrapping_add(step as u16));
    cpu.registers.set_de(de.wrapping_add(step as u16));

    let bc = cpu.registers.bc().wrapping_sub(1);
    cpu.registers.set_bc(bc);

    cpu.registers.set_h_flag(false);
    cpu.registers.set_n_flag(false);
    cpu.registers.set_pv_flag(bc != 0);
}

/// `CPI`/`CPD`: compute `A - (HL)` for flags only, then step HL by `step`, decrement BC. P/V set
/// iff BC is nonzero after. C is unaffected (unlike a real `SUB`).
pub fn cpi_cpd(cpu: &mut Cpu, bus: &mut dyn Bus, step: i16) {
    let hl = cpu.registers.hl();
    let a = cpu.registers.a();
    let operand = bus.read_mem(hl);
    let result = a.wrapping_sub(operand);

    cpu.registers.set_hl(hl.wrapping_add(step as u16));

    let bc = cpu.registers.bc().wrapping_sub(1);
    cpu.registers.set_bc(bc);

    cpu.registers.set_s_flag(sign8(result));
    cpu.registers.set_z_flag(zero8(result));
    cpu.registers.set_h_flag(half_carry_sub8(a, operand, 0));
    cpu.registers.set_pv_flag(bc != 0);
    cpu.registers.set_n_flag(true);
}

/// `INI`/`IND`: read a byte from port `(C)`, write it to `(HL)`, step HL by `step`, decrement B.
/// Z set iff B is zero after the decrement; N set.
pub fn ini_ind(cpu: &mut Cpu, bus: &mut dyn Bus, step: i16) {
    let port = cpu.registers.bc();
    let value = bus.port_in(port);
    let hl = cpu.registers.hl();
    bus.write_mem(hl, value);
    cpu.registers.set_hl(hl.wrapping_add(step as u16));

    let b = cpu.registers.b().wrapping_sub(1);
    cpu.registers.set_b(b);

    cpu.registers.set_z_flag(b == 0);
    cpu.registers.set_n_flag(true);
}

/// `OUTI`/`OUTD`: read a byte from `(HL)`, write it to port `(C)`, step HL by `step`, decrement
/// B. Same flag contract as `INI`/`IND`.
pub fn outi_outd(cpu: &mut Cpu, bus: &mut dyn Bus, step: i16) {
    let hl = cpu.registers.hl();
    let value = bus.read_mem(hl);
    let port = cpu.registers.bc();
    bus.port_out(port, value);
    cpu.registers.set_hl(hl.wrapping_add(step as u16));

    let b = cpu.registers.b().wrapping_sub(1);
    cpu.registers.set_b(b);

    cpu.registers.set_z_flag(b == 0);
    cpu.registers.set_n_flag(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::FlatBus;

    #[test]
    fn ldi_copies_byte_and_decrements_bc() {
        let mut cpu = Cpu::new();
        let mut bus = FlatBus::new();
        cpu.registers.set_hl(0x1000);
        cpu.registers.set_de(0x2000);
        cpu.registers.set_bc(3);
        bus.mem[0x1000] = 0x42;

        ldi_ldd(&mut cpu, &mut bus, 1);

        assert_eq!(bus.mem[0x2000], 0x42);
        assert_eq!(cpu.registers.hl(), 0x1001);
        assert_eq!(cpu.registers.de(), 0x2001);
        assert_eq!(cpu.registers.bc(), 2);
        assert!(cpu.registers.pv_flag());
    }

    #[test]
    fn ldi_clears_overflow_flag_when_bc_reaches_zero() {
        let mut cpu = Cpu::new();
        let mut bus = FlatBus::new();
        cpu.registers.set_hl(0x1000);
        cpu.registers.set_de(0x2000);
        cpu.registers.set_bc(1);

        ldi_ldd(&mut cpu, &mut bus, 1);

        assert_eq!(cpu.registers.bc(), 0);
        assert!(!cpu.registers.pv_flag());
    }

    #[test]
    fn cpi_sets_zero_when_match_found() {
        let mut cpu = Cpu::new();
        let mut bus = FlatBus::new();
        cpu.registers.set_a(0x42);
        cpu.registers.set_hl(0x1000);
        cpu.registers.set_bc(5);
        bus.mem[0x1000] = 0x42;

        cpi_cpd(&mut cpu, &mut bus, 1);

        assert!(cpu.registers.z_flag());
        assert_eq!(cpu.registers.hl(), 0x1001);
        assert_eq!(cpu.registers.bc(), 4);
    }
}
