//!
//! # Unit Normalization
//!
//! Liberty files declare the units of their numeric attributes once, at library level,
//! e.g. `time_unit : "1ps" ;` and `capacitive_load_unit (1, ff) ;`.
//! Values are scaled into fixed internal units as they are read:
//!
//! | Quantity    | Internal Unit |
//! |-------------|---------------|
//! | Time        | 1ns           |
//! | Capacitance | 1pF           |
//! | Power       | 1nW           |
//! | Voltage     | 1V            |
//! | Current     | 1mA           |
//! | Resistance  | 1kΩ           |
//!
//! Undeclared units are taken to already be internal.
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io Imports
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::data::{LibDecimal, LutVar};

/// Metric prefixes, as powers of ten
static PREFIXES: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    HashMap::from([
        ("", 0),
        ("k", 3),
        ("m", -3),
        ("u", -6),
        ("n", -9),
        ("p", -12),
        ("f", -15),
        ("a", -18),
    ])
});

/// # Physical Quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    Time,
    Capacitance,
    Power,
    Voltage,
    Current,
    Resistance,
}
impl Quantity {
    /// Base-unit suffix, in lower case
    fn suffix(&self) -> &'static str {
        match self {
            Self::Time => "s",
            Self::Capacitance => "f",
            Self::Power => "w",
            Self::Voltage => "v",
            Self::Current => "a",
            Self::Resistance => "ohm",
        }
    }
    /// Power of ten of the internal unit
    fn internal_exp(&self) -> i32 {
        match self {
            Self::Time => -9,
            Self::Capacitance => -12,
            Self::Power => -9,
            Self::Voltage => 0,
            Self::Current => -3,
            Self::Resistance => 3,
        }
    }
    /// The quantity indexed by table variable `var`, if any
    pub fn of_lut_var(var: LutVar) -> Option<Self> {
        if var.is_transition() {
            Some(Self::Time)
        } else if var.is_capacitance() {
            Some(Self::Capacitance)
        } else {
            None
        }
    }
}

/// # Declared Unit
///
/// A multiplier on a prefixed base unit, e.g. `100ps` or `(1, ff)`,
/// stored as its conversion factor into internal units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledUnit {
    pub quantity: Quantity,
    /// Internal units per declared unit
    pub factor: LibDecimal,
}
impl ScaledUnit {
    /// The identity unit of `quantity`
    pub fn internal(quantity: Quantity) -> Self {
        Self {
            quantity,
            factor: LibDecimal::ONE,
        }
    }
    /// Parse a combined unit string such as `1ns`, `10ps`, or `1kohm`
    pub fn parse(quantity: Quantity, txt: &str) -> Option<Self> {
        let txt = txt.trim();
        let split = txt
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(txt.len());
        let (mult, unit) = txt.split_at(split);
        let mult = if mult.is_empty() { "1" } else { mult };
        Self::from_parts(quantity, mult, unit)
    }
    /// Create from a separate multiplier and unit, as in `capacitive_load_unit (1, ff)`
    pub fn from_parts(quantity: Quantity, mult: &str, unit: &str) -> Option<Self> {
        let mult: LibDecimal = mult.trim().parse().ok()?;
        let unit = unit.trim().to_ascii_lowercase();
        let prefix = unit.strip_suffix(quantity.suffix())?;
        let exp = *PREFIXES.get(prefix)?;
        let factor = mult.checked_mul(pow10(exp - quantity.internal_exp())?)?;
        Some(Self { quantity, factor })
    }
}

/// Ten to the power `exp`
fn pow10(exp: i32) -> Option<LibDecimal> {
    if exp >= 0 {
        let mut rv = LibDecimal::ONE;
        for _ in 0..exp {
            rv = rv.checked_mul(LibDecimal::TEN)?;
        }
        Some(rv)
    } else {
        let scale = u32::try_from(-exp).ok()?;
        (scale <= 28).then(|| LibDecimal::new(1, scale))
    }
}

/// Convert `raw`, in `unit`, into internal units.
/// Returns `None` if the result is outside the representable range.
pub fn normalize(raw: LibDecimal, unit: &ScaledUnit) -> Option<LibDecimal> {
    raw.checked_mul(unit.factor).map(|v| v.normalize())
}

/// # Library Unit Declarations
///
/// The set in effect during one read. Never stored in the loaded library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSet {
    units: HashMap<Quantity, ScaledUnit>,
}
impl UnitSet {
    /// Declare `unit` for its quantity, replacing any earlier declaration
    pub fn declare(&mut self, unit: ScaledUnit) {
        self.units.insert(unit.quantity, unit);
    }
    /// The declared unit of `quantity`, or its internal unit if undeclared
    pub fn get(&self, quantity: Quantity) -> ScaledUnit {
        self.units
            .get(&quantity)
            .copied()
            .unwrap_or_else(|| ScaledUnit::internal(quantity))
    }
    /// Convert `raw`, a value of `quantity`, into internal units
    pub fn normalize(&self, raw: LibDecimal, quantity: Quantity) -> Option<LibDecimal> {
        normalize(raw, &self.get(quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> LibDecimal {
        LibDecimal::from_str(s).unwrap()
    }

    #[test]
    fn it_parses_units() {
        let ps = ScaledUnit::parse(Quantity::Time, "1ps").unwrap();
        assert_eq!(ps.factor, dec("0.001"));
        let ns = ScaledUnit::parse(Quantity::Time, "1ns").unwrap();
        assert_eq!(ns.factor, LibDecimal::ONE);
        let ps100 = ScaledUnit::parse(Quantity::Time, "100ps").unwrap();
        assert_eq!(ps100.factor, dec("0.1"));
        let ff = ScaledUnit::from_parts(Quantity::Capacitance, "1", "ff").unwrap();
        assert_eq!(ff.factor, dec("0.001"));
        let pf = ScaledUnit::from_parts(Quantity::Capacitance, "1", "pf").unwrap();
        assert_eq!(pf.factor, LibDecimal::ONE);
        let uw = ScaledUnit::parse(Quantity::Power, "1uW").unwrap();
        assert_eq!(uw.factor, dec("1000"));
        let kohm = ScaledUnit::parse(Quantity::Resistance, "1kohm").unwrap();
        assert_eq!(kohm.factor, LibDecimal::ONE);
        let ua = ScaledUnit::parse(Quantity::Current, "1uA").unwrap();
        assert_eq!(ua.factor, dec("0.001"));
        let v = ScaledUnit::parse(Quantity::Voltage, "1V").unwrap();
        assert_eq!(v.factor, LibDecimal::ONE);
    }
    #[test]
    fn it_rejects_bad_units() {
        assert_eq!(ScaledUnit::parse(Quantity::Time, "1pf"), None);
        assert_eq!(ScaledUnit::parse(Quantity::Time, "1xs"), None);
        assert_eq!(ScaledUnit::from_parts(Quantity::Capacitance, "one", "ff"), None);
    }
    #[test]
    fn it_normalizes() {
        let ps = ScaledUnit::parse(Quantity::Time, "1ps").unwrap();
        assert_eq!(normalize(dec("25.0"), &ps), Some(dec("0.025")));
        // Undeclared units are the identity
        let units = UnitSet::default();
        assert_eq!(units.normalize(dec("0.532"), Quantity::Capacitance), Some(dec("0.532")));
        let mut units = UnitSet::default();
        units.declare(ScaledUnit::from_parts(Quantity::Capacitance, "1", "ff").unwrap());
        assert_eq!(units.normalize(dec("2"), Quantity::Capacitance), Some(dec("0.002")));
        assert_eq!(units.normalize(dec("2"), Quantity::Time), Some(dec("2")));
    }
    #[test]
    fn it_reports_overflow() {
        let kf = ScaledUnit::from_parts(Quantity::Capacitance, "1", "kf").unwrap();
        assert_eq!(kf.factor, dec("1000000000000000"));
        assert_eq!(normalize(dec("1000"), &kf), Some(dec("1000000000000000000")));
        assert_eq!(normalize(LibDecimal::MAX, &kf), None);
    }
}
