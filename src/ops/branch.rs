//! Jumps, calls, returns, and `RST`.

use crate::cpu::{Cpu, IndexMode};
use crate::Bus;

/// Evaluate one of the eight condition codes {NZ,Z,NC,C,PO,PE,P,M}, extracted from opcode
/// bits 3-5.
pub fn test_condition(cpu: &Cpu, cc: u8) -> bool {
    match cc {
        0 => !cpu.registers.z_flag(),
        1 => cpu.registers.z_flag(),
        2 => !cpu.registers.c_flag(),
        3 => cpu.registers.c_flag(),
        4 => !cpu.registers.pv_flag(),
        5 => cpu.registers.pv_flag(),
        6 => !cpu.registers.s_flag(),
        7 => cpu.registers.s_flag(),
        other => unreachable!("condition code out of range: {other}"),
    }
}

/// `JP nn`.
pub fn jp_nn(cpu: &mut Cpu, bus: &mut dyn Bus) {
    cpu.pc = cpu.fetch_u16(bus);
}

/// `JP cc,nn`. The target address is always consumed from the instruction stream; it's only
/// applied to PC when the condition holds. Returns whether the jump was taken.
pub fn jp_cc_nn(cpu: &mut Cpu, bus: &mut dyn Bus, cc: u8) -> bool {
    let addr = cpu.fetch_u16(bus);
    let taken = test_condition(cpu, cc);
    if taken {
        cpu.pc = addr;
    }
    taken
}

/// `JP (HL)` / `JP (IX)` / `JP (IY)`: jumps to the register's *value*, not a memory reference
/// through it.
pub fn jp_indirect(cpu: &mut Cpu, mode: IndexMode) {
    cpu.pc = cpu.read_rp(2, mode);
}

/// `JR e`: PC += signed displacement, computed after the displacement byte is fetched.
pub fn jr_e(cpu: &mut Cpu, bus: &mut dyn Bus) {
    let e = cpu.fetch_u8(bus) as i8 as i16;
    cpu.pc = cpu.pc.wrapping_add(e as u16);
}

/// `JR cc,e` for cc in {NZ,Z,NC,C}. Returns whether the jump was taken.
pub fn jr_cc_e(cpu: &mut Cpu, bus: &mut dyn Bus, cc: u8) -> bool {
    let e = cpu.fetch_u8(bus) as i8 as i16;
    let taken = test_condition(cpu, cc);
    if taken {
        cpu.pc = cpu.pc.wrapping_add(e as u16);
    }
    taken
}

/// `DJNZ e`: decrement B, branch if nonzero. Returns whether the branch was taken.
pub fn djnz(cpu: &mut Cpu, bus: &mut dyn Bus) -> bool {
    let e = cpu.fetch_u8(bus) as i8 as i16;
    let b = cpu.registers.b().wrapping_sub(1);
    cpu.registers.set_b(b);
    let taken = b != 0;
    if taken {
        cpu.pc = cpu.pc.wrapping_add(e as u16);
    }
    taken
}

/// `CALL nn`.
pub fn call_nn(cpu: &mut Cpu, bus: &mut dyn Bus) {
    let addr = cpu.fetch_u16(bus);
    cpu.push_u16(bus, cpu.pc);
    cpu.pc = addr;
}

/// `CALL cc,nn`. Returns whether the call was taken.
pub fn call_cc_nn(cpu: &mut Cpu, bus: &mut dyn Bus, cc: u8) -> bool {
    let addr = cpu.fetch_u16(bus);
    let taken = test_condition(cpu, cc);
    if taken {
        cpu.push_u16(bus, cpu.pc);
        cpu.pc = addr;
    }
    taken
}

/// `RET`.
pub fn ret(cpu: &mut Cpu, bus: &mut dyn Bus) {
    cpu.pc = cpu.pop_u16(bus);
}

/// `RET cc`. Returns whether the return was taken.
pub fn ret_cc(cpu: &mut Cpu, bus: &mut dyn Bus, cc: u8) -> bool {
    let taken = test_condition(cpu, cc);
    if taken {
        cpu.pc = cpu.pop_u16(bus);
    }
    taken
}

/// `RETI`: identical effect to `RET`; exists so a host can distinguish "returning from an
/// interrupt service routine" for the purpose of re-enabling a daisy-chained interrupt
/// controller. IFF state is untouched (unlike `RETN`).
pub fn reti(cpu: &mut Cpu, bus: &mut dyn Bus) {
    cpu.pc = cpu.pop_u16(bus);
}

/// `RETN`: like `RET`, but also restores IFF1 from IFF2 (which NMI entry preserved).
pub fn retn(cpu: &mut Cpu, bus: &mut dyn Bus) {
    cpu.pc = cpu.pop_u16(bus);
    cpu.iff1 = cpu.iff2;
}

/// `RST p`.
pub fn rst(cpu: &mut Cpu, bus: &mut dyn Bus, target: u16) {
    cpu.push_u16(bus, cpu.pc);
    cpu.pc = target;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::FlatBus;

    #[test]
    fn call_then_ret_restores_pc_and_stack() {
        let mut cpu = Cpu::new();
        let mut bus = FlatBus::new();
        cpu.pc = 0x0003;
        cpu.sp = 0xFFFE;
        bus.mem[0] = 0x06;
        bus.mem[1] = 0x00;
        cpu.pc = 0;

        call_nn(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x0006);
        assert_eq!(cpu.sp, 0xFFFC);

        ret(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x0002);
        assert_eq!(cpu.sp, 0xFFFE);
    }

    #[test]
    fn push_with_sp_one_wraps_through_zero() {
        let mut cpu = Cpu::new();
        let mut bus = FlatBus::new();
        cpu.sp = 0x0001;

        cpu.push_u16(&mut bus, 0xBEEF);

        assert_eq!(cpu.sp, 0xFFFF);
    }
}
