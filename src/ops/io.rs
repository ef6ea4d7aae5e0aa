//! Port I/O.

use crate::cpu::{Cpu, IndexMode};
use crate::flags::{parity, sign8, zero8};
use crate::Bus;

/// `IN A,(n)`: the Z80 places A on the upper 8 address lines alongside the immediate port
/// number, so the full 16-bit port passed to the bus is `(A << 8) | n`. Hosts that only care
/// about 8-bit ports may ignore the high byte.
pub fn in_a_n(cpu: &mut Cpu, bus: &mut dyn Bus) {
    let n = cpu.fetch_u8(bus);
    let port = ((cpu.registers.a() as u16) << 8) | n as u16;
    let value = bus.port_in(port);
    cpu.registers.set_a(value);
}

/// `OUT (n),A`.
pub fn out_n_a(cpu: &mut Cpu, bus: &mut dyn Bus) {
    let n = cpu.fetch_u8(bus);
    let port = ((cpu.registers.a() as u16) << 8) | n as u16;
    bus.port_out(port, cpu.registers.a());
}

/// `IN r,(C)`: B is on the upper address lines, so the port is the full BC pair. Sets S, Z,
/// P/V from the byte read; H and N cleared. Register field 6 is the undocumented `IN F,(C)`,
/// which reads and flags the byte without storing it anywhere.
pub fn in_r_c(cpu: &mut Cpu, bus: &mut dyn Bus, dst: u8, mode: IndexMode) {
    let port = cpu.registers.bc();
    let value = bus.port_in(port);

    if dst != 6 {
        cpu.write_reg8(bus, dst, mode, value);
    }

    cpu.registers.set_s_flag(sign8(value));
    cpu.registers.set_z_flag(zero8(value));
    cpu.registers.set_h_flag(false);
    cpu.registers.set_pv_flag(parity(value));
    cpu.registers.set_n_flag(false);
}

/// `OUT (C),r`. No flag effect. Register field 6 is the undocumented `OUT (C),0`.
pub fn out_c_r(cpu: &mut Cpu, bus: &mut dyn Bus, src: u8, mode: IndexMode) {
    let port = cpu.registers.bc();
    let value = if src == 6 { 0 } else { cpu.read_reg8(bus, src, mode) };
    bus.port_out(port, value);
}
