//! RV32I general-purpose registers.

/// An RV32I general-purpose register (`x0`..`x31`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gpr(u8);

impl Gpr {
    /// Create a GPR from a register number (0-31).
    ///
    /// # Panics
    ///
    /// Panics if the register number is >= 32. Use [`Gpr::from_num`] for
    /// untrusted input.
    pub fn new(num: u8) -> Self {
        assert!(num < 32, "register number must be < 32");
        Self(num)
    }

    /// Create a GPR from a register number, returning `None` if out of range.
    pub fn from_num(num: u8) -> Option<Self> {
        (num < 32).then_some(Self(num))
    }

    /// Look up a register by name.
    ///
    /// Accepts the ABI names (`zero`, `ra`, `sp`, ..., with `fp` as an alias
    /// for `s0`) and the numeric names `x0`..`x31`.
    pub fn from_name(name: &str) -> Option<Self> {
        let num = match name {
            "zero" => 0,
            "ra" => 1,
            "sp" => 2,
            "gp" => 3,
            "tp" => 4,
            "t0" => 5,
            "t1" => 6,
            "t2" => 7,
            "s0" | "fp" => 8,
            "s1" => 9,
            "a0" => 10,
            "a1" => 11,
            "a2" => 12,
            "a3" => 13,
            "a4" => 14,
            "a5" => 15,
            "a6" => 16,
            "a7" => 17,
            "s2" => 18,
            "s3" => 19,
            "s4" => 20,
            "s5" => 21,
            "s6" => 22,
            "s7" => 23,
            "s8" => 24,
            "s9" => 25,
            "s10" => 26,
            "s11" => 27,
            "t3" => 28,
            "t4" => 29,
            "t5" => 30,
            "t6" => 31,
            _ => {
                let digits = name.strip_prefix('x')?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let num: u8 = digits.parse().ok()?;
                return Self::from_num(num);
            }
        };
        Some(Self(num))
    }

    /// Get the register number (0-31).
    pub fn num(self) -> u8 {
        self.0
    }

    /// The canonical ABI name of the register (`x8` prints as `s0`).
    pub fn name(self) -> &'static str {
        const NAMES: [&str; 32] = [
            "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3",
            "a4", "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11",
            "t3", "t4", "t5", "t6",
        ];
        NAMES[self.0 as usize]
    }
}

impl core::fmt::Display for Gpr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// Named registers
impl Gpr {
    pub const ZERO: Gpr = Gpr(0);
    pub const RA: Gpr = Gpr(1);
    pub const SP: Gpr = Gpr(2);
    pub const GP: Gpr = Gpr(3);
    pub const TP: Gpr = Gpr(4);
    pub const T0: Gpr = Gpr(5);
    pub const T1: Gpr = Gpr(6);
    pub const T2: Gpr = Gpr(7);
    pub const S0: Gpr = Gpr(8);
    /// Frame pointer, alias of `s0`.
    pub const FP: Gpr = Gpr(8);
    pub const S1: Gpr = Gpr(9);
    pub const A0: Gpr = Gpr(10);
    pub const A1: Gpr = Gpr(11);
    pub const A2: Gpr = Gpr(12);
    pub const A3: Gpr = Gpr(13);
    pub const A4: Gpr = Gpr(14);
    pub const A5: Gpr = Gpr(15);
    pub const A6: Gpr = Gpr(16);
    pub const A7: Gpr = Gpr(17);
    pub const S2: Gpr = Gpr(18);
    pub const S3: Gpr = Gpr(19);
    pub const S4: Gpr = Gpr(20);
    pub const S5: Gpr = Gpr(21);
    pub const S6: Gpr = Gpr(22);
    pub const S7: Gpr = Gpr(23);
    pub const S8: Gpr = Gpr(24);
    pub const S9: Gpr = Gpr(25);
    pub const S10: Gpr = Gpr(26);
    pub const S11: Gpr = Gpr(27);
    pub const T3: Gpr = Gpr(28);
    pub const T4: Gpr = Gpr(29);
    pub const T5: Gpr = Gpr(30);
    pub const T6: Gpr = Gpr(31);
}
