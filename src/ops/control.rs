//! Control flow and interrupt-mode instructions — everything that isn't arithmetic, a load, or
//! a branch.

use crate::cpu::Cpu;

/// `HALT`: PC stays on the `HALT` opcode (the step driver re-fetches it every step without
/// advancing PC while halted); cleared by any accepted interrupt. The fetch that read this
/// opcode already advanced PC past it, so rewind by one to park it back on `HALT`.
pub fn halt(cpu: &mut Cpu) {
    cpu.halted = true;
    cpu.pc = cpu.pc.wrapping_sub(1);
}

/// `DI`: clears both interrupt-enable latches.
pub fn di(cpu: &mut Cpu) {
    cpu.iff1 = false;
    cpu.iff2 = false;
}

/// `EI`: sets both latches, and arms the one-instruction delay before a maskable interrupt can
/// actually be accepted.
pub fn ei(cpu: &mut Cpu) {
    cpu.iff1 = true;
    cpu.iff2 = true;
    cpu.ei_delay = true;
}

/// `CPL`: `A <- !A`; H and N set.
pub fn cpl(cpu: &mut Cpu) {
    let value = !cpu.registers.a();
    cpu.registers.set_a(value);
    cpu.registers.set_h_flag(true);
    cpu.registers.set_n_flag(true);
}

/// `CCF`: `C <- !C`; H takes the old C; N cleared.
pub fn ccf(cpu: &mut Cpu) {
    let old_c = cpu.registers.c_flag();
    cpu.registers.set_h_flag(old_c);
    cpu.registers.set_c_flag(!old_c);
    cpu.registers.set_n_flag(false);
}

/// `SCF`: `C <- 1`; H and N cleared.
pub fn scf(cpu: &mut Cpu) {
    cpu.registers.set_c_flag(true);
    cpu.registers.set_h_flag(false);
    cpu.registers.set_n_flag(false);
}

/// `IM 0`/`IM 1`/`IM 2`.
pub fn set_interrupt_mode(cpu: &mut Cpu, mode: u8) {
    cpu.im = mode;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpl_twice_is_identity_on_a_with_h_and_n_set() {
        let mut cpu = Cpu::new();
        cpu.registers.set_a(0x5A);
        cpl(&mut cpu);
        cpl(&mut cpu);
        assert_eq!(cpu.registers.a(), 0x5A);
        assert!(cpu.registers.h_flag());
        assert!(cpu.registers.n_flag());
    }

    #[test]
    fn halt_rewinds_pc_onto_the_halt_opcode() {
        let mut cpu = Cpu::new();
        cpu.pc = 0x0101;
        halt(&mut cpu);
        assert_eq!(cpu.pc, 0x0100);
        assert!(cpu.halted);
    }

    #[test]
    fn ei_arms_the_interrupt_delay() {
        let mut cpu = Cpu::new();
        ei(&mut cpu);
        assert!(cpu.iff1);
        assert!(cpu.iff2);
        assert!(cpu.ei_delay);
    }
}
