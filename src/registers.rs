use proc_bitfield::bitfield;

bitfield! {
    /// The general purpose 8 and 16 bit registers of the Z80, including the flag byte.
    ///
    /// Packs A/F/B/C/D/E/H/L into a single `u64` so that every register-pair view (`AF`, `BC`,
    /// `DE`, `HL`) is always observable through its 8-bit halves and vice versa — writing `B`
    /// and reading `BC` (or the reverse) never disagrees, satisfying the register-pair aliasing
    /// invariant.
    #[derive(Clone, Copy, Eq, PartialEq)]
    pub struct Registers(u64): Debug, FromRaw, IntoRaw, DerefRaw {
        /// Carry flag (bit 0 of F).
        pub c_flag: bool @ 0,

        /// Add/subtract flag (bit 1 of F). Set after subtractive operations, cleared after
        /// additive ones; consulted by `DAA`.
        pub n_flag: bool @ 1,

        /// Parity/overflow flag (bit 2 of F). Parity after logical ops, signed overflow after
        /// arithmetic, BC-nonzero after block ops, IFF2 after `LD A,I`/`LD A,R`.
        pub pv_flag: bool @ 2,

        /// Undocumented flag bit 3, a copy of the corresponding result bit on most instructions.
        pub x_flag: bool @ 3,

        /// Half-carry flag (bit 4 of F): carry from bit 3 to bit 4.
        pub h_flag: bool @ 4,

        /// Undocumented flag bit 5, a copy of the corresponding result bit on most instructions.
        pub y_flag: bool @ 5,

        /// Zero flag (bit 6 of F).
        pub z_flag: bool @ 6,

        /// Sign flag (bit 7 of F): a copy of result bit 7.
        pub s_flag: bool @ 7,

        /// The flag byte, `F`, as a whole.
        pub f: u8 @ 0..=7,

        /// The accumulator, `A`.
        pub a: u8 @ 8..=15,

        /// `AF`: the accumulator and flags combined.
        pub af: u16 @ 0..=15,

        /// `C`, the low half of `BC`.
        pub c: u8 @ 16..=23,

        /// `B`, the high half of `BC`.
        pub b: u8 @ 24..=31,

        /// `BC` combined.
        pub bc: u16 @ 16..=31,

        /// `E`, the low half of `DE`.
        pub e: u8 @ 32..=39,

        /// `D`, the high half of `DE`.
        pub d: u8 @ 40..=47,

        /// `DE` combined.
        pub de: u16 @ 32..=47,

        /// `L`, the low half of `HL`.
        pub l: u8 @ 48..=55,

        /// `H`, the high half of `HL`.
        pub h: u8 @ 56..=63,

        /// `HL` combined.
        pub hl: u16 @ 48..=63,
    }
}

impl Registers {
    /// Architecturally-undefined power-on state. Real registers don't reset to any particular
    /// value; zero is as good a default as any and matches [`Cpu::reset`](crate::Cpu::reset).
    pub const fn new() -> Self {
        Self(0)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
