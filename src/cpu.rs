use std::fmt::Debug;

use crate::registers::Registers;
use crate::Bus;

/// Which index register (if any) the current instruction is operating through. `Hl` is the
/// unprefixed case; `Ix`/`Iy` mean the instruction was reached via a `DD`/`FD` prefix and any
/// reference to `(HL)`, `H`, or `L` should be redirected to `(IX+d)`/`IXH` or `(IY+d)`/`IYL` etc.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum IndexMode {
    Hl,
    Ix,
    Iy,
}

/// A flat, `memcpy`-equivalent snapshot of everything architectural about a [`Cpu`]. No pointers,
/// no derived state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CpuSnapshot {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub a_shadow: u8,
    pub f_shadow: u8,
    pub b_shadow: u8,
    pub c_shadow: u8,
    pub d_shadow: u8,
    pub e_shadow: u8,
    pub h_shadow: u8,
    pub l_shadow: u8,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub halted: bool,
    pub t_states: u64,
    pub pending_nmi: bool,
    pub pending_irq: bool,
    pub data_bus: u8,
}

/// A Zilog Z80, modeled at instruction granularity: [`Cpu::step`] executes exactly one
/// instruction (or services one pending interrupt) and returns the number of T-states it took.
///
/// Names follow the registers Zilog's own documentation uses, not abbreviations chosen to save
/// characters.
#[derive(Clone, Eq, PartialEq)]
pub struct Cpu {
    /// The primary register set: A, F, B, C, D, E, H, L and their pair views.
    pub registers: Registers,

    /// The shadow register set, swapped in by `EX AF,AF'` (AF only) and `EXX` (BC/DE/HL only).
    pub shadow: Registers,

    /// Index register IX.
    pub ix: u16,

    /// Index register IY.
    pub iy: u16,

    /// Stack pointer. The stack grows downward.
    pub sp: u16,

    /// Program counter.
    pub pc: u16,

    /// Interrupt vector register, high byte of the IM 2 vector address.
    pub i: u8,

    /// Memory refresh register. Low 7 bits increment once per opcode byte fetched; bit 7 is
    /// preserved.
    pub r: u8,

    /// Interrupt-enable latch 1. Gates acceptance of a maskable interrupt.
    pub iff1: bool,

    /// Interrupt-enable latch 2. Survives NMI so `RETN` can restore IFF1 from it.
    pub iff2: bool,

    /// Interrupt mode, 0/1/2.
    pub im: u8,

    /// Set by `HALT`, cleared by any accepted interrupt.
    pub halted: bool,

    /// Running count of T-states since the last [`Cpu::reset`].
    pub t_states: u64,

    pub(crate) pending_nmi: bool,
    pub(crate) pending_irq: bool,

    /// The byte the host will place on the data bus for the next IM 0/IM 2 interrupt
    /// acknowledgement cycle. Set via [`Cpu::set_data_bus`].
    pub data_bus: u8,

    /// True for exactly one `step()` after `EI` executes: the real Z80 defers interrupt
    /// acceptance by one instruction so that `EI` followed immediately by `RET` is atomic.
    pub(crate) ei_delay: bool,
}

impl Cpu {
    /// Create a [`Cpu`] in the power-on reset state.
    pub fn new() -> Self {
        let mut cpu = Self {
            registers: Registers::new(),
            shadow: Registers::new(),
            ix: 0,
            iy: 0,
            sp: 0,
            pc: 0,
            i: 0,
            r: 0,
            iff1: false,
            iff2: false,
            im: 0,
            halted: false,
            t_states: 0,
            pending_nmi: false,
            pending_irq: false,
            data_bus: 0xFF,
            ei_delay: false,
        };
        cpu.reset();
        cpu
    }

    /// Reset to the documented power-on state. Registers other than PC/I/R/IFF1/IFF2/IM/halted
    /// are architecturally undefined; this implementation zeroes them.
    pub fn reset(&mut self) {
        self.pc = 0x0000;
        self.i = 0;
        self.r = 0;
        self.iff1 = false;
        self.iff2 = false;
        self.im = 0;
        self.halted = false;
        self.pending_nmi = false;
        self.pending_irq = false;
        self.ei_delay = false;
    }

    /// Raise the pending-IRQ latch. Consumed (and cleared) at the next [`Cpu::step`] that
    /// finds IFF1 set and is not in the one-instruction shadow of `EI`.
    pub fn interrupt(&mut self) {
        self.pending_irq = true;
    }

    /// Raise the pending-NMI latch. Unconditionally honored at the next [`Cpu::step`].
    pub fn nmi(&mut self) {
        self.pending_nmi = true;
    }

    /// Set the byte the host will deliver on the next IM 0 (opcode) or IM 2 (vector low byte)
    /// acknowledgement cycle.
    pub fn set_data_bus(&mut self, value: u8) {
        self.data_bus = value;
    }

    /// Execute one instruction, or service one pending interrupt, and return its T-state cost.
    pub fn step(&mut self, bus: &mut dyn Bus) -> u32 {
        if let Some(t) = self.service_interrupts(bus) {
            self.t_states += t as u64;
            return t;
        }

        if self.halted {
            // The CPU keeps re-fetching HALT without advancing PC; R still bumps each time.
            self.bump_r();
            self.t_states += 4;
            return 4;
        }

        let t = self.decode_and_execute(bus);
        self.t_states += t as u64;
        t
    }

    fn service_interrupts(&mut self, bus: &mut dyn Bus) -> Option<u32> {
        if self.pending_nmi {
            self.pending_nmi = false;
            self.halted = false;
            self.push_u16(bus, self.pc);
            self.iff2 = self.iff1;
            self.iff1 = false;
            self.pc = 0x0066;
            return Some(11);
        }

        if self.ei_delay {
            self.ei_delay = false;
            return None;
        }

        if self.pending_irq && self.iff1 {
            self.pending_irq = false;
            self.halted = false;
            self.iff1 = false;
            self.iff2 = false;

            return Some(match self.im {
                0 => {
                    let opcode = self.data_bus;
                    let t = self.dispatch_main(bus, opcode, IndexMode::Hl);
                    t + 2
                }
                1 => {
                    self.push_u16(bus, self.pc);
                    self.pc = 0x0038;
                    13
                }
                2 => {
                    let vector_addr = ((self.i as u16) << 8) | self.data_bus as u16;
                    let lo = bus.read_mem(vector_addr);
                    let hi = bus.read_mem(vector_addr.wrapping_add(1));
                    self.push_u16(bus, self.pc);
                    self.pc = u16::from_le_bytes([lo, hi]);
                    19
                }
                other => unreachable!("invalid interrupt mode {other}"),
            });
        }

        None
    }

    /// Collapse a chain of `DD`/`FD` prefixes (real hardware treats all but the last as a
    /// wasted 4 T-state no-op) and dispatch the resulting instruction.
    fn decode_and_execute(&mut self, bus: &mut dyn Bus) -> u32 {
        let mut mode = IndexMode::Hl;
        let mut wasted_prefix_t = 0u32;

        loop {
            let opcode = self.fetch_u8(bus);
            match opcode {
                0xDD => {
                    if mode != IndexMode::Hl {
                        wasted_prefix_t += 4;
                    }
                    mode = IndexMode::Ix;
                }
                0xFD => {
                    if mode != IndexMode::Hl {
                        wasted_prefix_t += 4;
                    }
                    mode = IndexMode::Iy;
                }
                _ => return wasted_prefix_t + self.dispatch_main(bus, opcode, mode),
            }
        }
    }

    /// Fetch a byte at PC, advance PC by one (mod 2^16), bump R's low 7 bits.
    pub fn fetch_u8(&mut self, bus: &mut dyn Bus) -> u8 {
        let value = bus.read_mem(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.bump_r();
        value
    }

    /// Fetch two bytes, little-endian, via two [`Cpu::fetch_u8`] calls.
    pub fn fetch_u16(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.fetch_u8(bus);
        let hi = self.fetch_u8(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Push a 16-bit value: SP decrements then writes high byte, decrements then writes low.
    pub fn push_u16(&mut self, bus: &mut dyn Bus, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.sp = self.sp.wrapping_sub(1);
        bus.write_mem(self.sp, hi);
        self.sp = self.sp.wrapping_sub(1);
        bus.write_mem(self.sp, lo);
    }

    /// Pop a 16-bit value: low byte at SP then SP increments, high byte then SP increments.
    pub fn pop_u16(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = bus.read_mem(self.sp);
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read_mem(self.sp);
        self.sp = self.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn bump_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    /// Read one of the eight 8-bit register-field encodings (B,C,D,E,H,L,(HL),A), honoring the
    /// current index mode for H/L and redirecting `(HL)` to `(IX+d)`/`(IY+d)` when indexed.
    pub(crate) fn read_reg8(&mut self, bus: &mut dyn Bus, index: u8, mode: IndexMode) -> u8 {
        match index {
            0 => self.registers.b(),
            1 => self.registers.c(),
            2 => self.registers.d(),
            3 => self.registers.e(),
            4 => match mode {
                IndexMode::Hl => self.registers.h(),
                IndexMode::Ix => (self.ix >> 8) as u8,
                IndexMode::Iy => (self.iy >> 8) as u8,
            },
            5 => match mode {
                IndexMode::Hl => self.registers.l(),
                IndexMode::Ix => self.ix as u8,
                IndexMode::Iy => self.iy as u8,
            },
            6 => {
                let addr = self.indexed_addr(bus, mode);
                bus.read_mem(addr)
            }
            7 => self.registers.a(),
            other => unreachable!("register field out of range: {other}"),
        }
    }

    pub(crate) fn write_reg8(&mut self, bus: &mut dyn Bus, index: u8, mode: IndexMode, value: u8) {
        match index {
            0 => self.registers.set_b(value),
            1 => self.registers.set_c(value),
            2 => self.registers.set_d(value),
            3 => self.registers.set_e(value),
            4 => match mode {
                IndexMode::Hl => self.registers.set_h(value),
                IndexMode::Ix => self.ix = (self.ix & 0x00FF) | ((value as u16) << 8),
                IndexMode::Iy => self.iy = (self.iy & 0x00FF) | ((value as u16) << 8),
            },
            5 => match mode {
                IndexMode::Hl => self.registers.set_l(value),
                IndexMode::Ix => self.ix = (self.ix & 0xFF00) | value as u16,
                IndexMode::Iy => self.iy = (self.iy & 0xFF00) | value as u16,
            },
            6 => {
                let addr = self.indexed_addr(bus, mode);
                bus.write_mem(addr, value);
            }
            7 => self.registers.set_a(value),
            other => unreachable!("register field out of range: {other}"),
        }
    }

    /// The effective address `(HL)`/`(IX+d)`/`(IY+d)` refers to. For indexed modes this fetches
    /// a signed displacement byte immediately after the opcode byte, per the DD/FD encoding.
    pub(crate) fn indexed_addr(&mut self, bus: &mut dyn Bus, mode: IndexMode) -> u16 {
        match mode {
            IndexMode::Hl => self.registers.hl(),
            IndexMode::Ix => {
                let d = self.fetch_u8(bus) as i8 as i16;
                self.ix.wrapping_add(d as u16)
            }
            IndexMode::Iy => {
                let d = self.fetch_u8(bus) as i8 as i16;
                self.iy.wrapping_add(d as u16)
            }
        }
    }

    /// 16-bit register-pair field (0=BC, 1=DE, 2=HL/IX/IY, 3=SP), as used by `LD dd,nn`,
    /// `ADD HL,ss`, `INC ss`/`DEC ss`.
    pub(crate) fn read_rp(&self, index: u8, mode: IndexMode) -> u16 {
        match index {
            0 => self.registers.bc(),
            1 => self.registers.de(),
            2 => match mode {
                IndexMode::Hl => self.registers.hl(),
                IndexMode::Ix => self.ix,
                IndexMode::Iy => self.iy,
            },
            3 => self.sp,
            other => unreachable!("register pair field out of range: {other}"),
        }
    }

    pub(crate) fn write_rp(&mut self, index: u8, mode: IndexMode, value: u16) {
        match index {
            0 => self.registers.set_bc(value),
            1 => self.registers.set_de(value),
            2 => match mode {
                IndexMode::Hl => self.registers.set_hl(value),
                IndexMode::Ix => self.ix = value,
                IndexMode::Iy => self.iy = value,
            },
            3 => self.sp = value,
            other => unreachable!("register pair field out of range: {other}"),
        }
    }

    /// 16-bit register-pair field for `PUSH`/`POP` (0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(crate) fn read_rp_af(&self, index: u8, mode: IndexMode) -> u16 {
        match index {
            3 => self.registers.af(),
            other => self.read_rp(other, mode),
        }
    }

    pub(crate) fn write_rp_af(&mut self, index: u8, mode: IndexMode, value: u16) {
        match index {
            3 => self.registers.set_af(value),
            other => self.write_rp(other, mode, value),
        }
    }

    /// Snapshot the full architectural state.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            a: self.registers.a(),
            f: self.registers.f(),
            b: self.registers.b(),
            c: self.registers.c(),
            d: self.registers.d(),
            e: self.registers.e(),
            h: self.registers.h(),
            l: self.registers.l(),
            a_shadow: self.shadow.a(),
            f_shadow: self.shadow.f(),
            b_shadow: self.shadow.b(),
            c_shadow: self.shadow.c(),
            d_shadow: self.shadow.d(),
            e_shadow: self.shadow.e(),
            h_shadow: self.shadow.h(),
            l_shadow: self.shadow.l(),
            ix: self.ix,
            iy: self.iy,
            sp: self.sp,
            pc: self.pc,
            i: self.i,
            r: self.r,
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            halted: self.halted,
            t_states: self.t_states,
            pending_nmi: self.pending_nmi,
            pending_irq: self.pending_irq,
            data_bus: self.data_bus,
        }
    }

    /// Restore a [`Cpu`] from a previously taken snapshot.
    pub fn restore(&mut self, snapshot: &CpuSnapshot) {
        self.registers.set_a(snapshot.a);
        self.registers.set_f(snapshot.f);
        self.registers.set_b(snapshot.b);
        self.registers.set_c(snapshot.c);
        self.registers.set_d(snapshot.d);
        self.registers.set_e(snapshot.e);
        self.registers.set_h(snapshot.h);
        self.registers.set_l(snapshot.l);
        self.shadow.set_a(snapshot.a_shadow);
        self.shadow.set_f(snapshot.f_shadow);
        self.shadow.set_b(snapshot.b_shadow);
        self.shadow.set_c(snapshot.c_shadow);
        self.shadow.set_d(snapshot.d_shadow);
        self.shadow.set_e(snapshot.e_shadow);
        self.shadow.set_h(snapshot.h_shadow);
        self.shadow.set_l(snapshot.l_shadow);
        self.ix = snapshot.ix;
        self.iy = snapshot.iy;
        self.sp = snapshot.sp;
        self.pc = snapshot.pc;
        self.i = snapshot.i;
        self.r = snapshot.r;
        self.iff1 = snapshot.iff1;
        self.iff2 = snapshot.iff2;
        self.im = snapshot.im;
        self.halted = snapshot.halted;
        self.t_states = snapshot.t_states;
        self.pending_nmi = snapshot.pending_nmi;
        self.pending_irq = snapshot.pending_irq;
        self.data_bus = snapshot.data_bus;
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cpu {{ ")?;
        write!(f, "A:{:02X} F:{:02X} ", self.registers.a(), self.registers.f())?;
        write!(f, "BC:{:04X} DE:{:04X} HL:{:04X} ", self.registers.bc(), self.registers.de(), self.registers.hl())?;
        write!(f, "IX:{:04X} IY:{:04X} ", self.ix, self.iy)?;
        write!(f, "SP:{:04X} PC:{:04X} ", self.sp, self.pc)?;
        write!(f, "I:{:02X} R:{:02X} IM:{} ", self.i, self.r, self.im)?;
        write!(f, "IFF1:{} IFF2:{} HALT:{} ", self.iff1 as u8, self.iff2 as u8, self.halted as u8)?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_documented_fields() {
        let mut cpu = Cpu::new();
        cpu.pc = 0x1234;
        cpu.i = 0x10;
        cpu.r = 0x55;
        cpu.iff1 = true;
        cpu.iff2 = true;
        cpu.im = 2;
        cpu.halted = true;

        cpu.reset();

        assert_eq!(cpu.pc, 0);
        assert_eq!(cpu.i, 0);
        assert_eq!(cpu.r, 0);
        assert!(!cpu.iff1);
        assert!(!cpu.iff2);
        assert_eq!(cpu.im, 0);
        assert!(!cpu.halted);
    }

    #[test]
    fn bc_pair_aliases_its_halves() {
        let mut cpu = Cpu::new();
        cpu.registers.set_bc(0xBEEF);
        assert_eq!(cpu.registers.b(), 0xBE);
        assert_eq!(cpu.registers.c(), 0xEF);

        cpu.registers.set_b(0x12);
        cpu.registers.set_c(0x34);
        assert_eq!(cpu.registers.bc(), 0x1234);
    }

    #[test]
    fn r_register_wraps_within_low_seven_bits_preserving_bit_seven() {
        let mut cpu = Cpu::new();
        cpu.r = 0x7F;
        cpu.bump_r();
        assert_eq!(cpu.r, 0x00);

        cpu.r = 0xFF;
        cpu.bump_r();
        assert_eq!(cpu.r, 0x80);
    }
}
