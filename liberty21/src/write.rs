//!
//! # Liberty Writer Module
//!
//! Renders a [Celllib] as Liberty text: name, delay model, defaults,
//! then every template and every cell, in definition order.
//! Output re-reads into an equal [Celllib] when loaded at the same corner.
//!

// Std-Lib
use std::io::Write;
use std::ops::{AddAssign, SubAssign};
use std::path::Path;

// Local Imports
use crate::data::*;
use crate::error::{LibResult, LibertyError};

/// Write a [Celllib] to file `fname`
pub fn save(lib: &Celllib, fname: impl AsRef<Path>) -> LibResult<()> {
    let f = std::fs::File::create(fname)?;
    LibWriter::new(std::io::BufWriter::new(f)).write_lib(lib)
}
/// Write a [Celllib] to Liberty-format [String]
pub fn to_string(lib: &Celllib) -> LibResult<String> {
    let mut buf = Vec::new();
    LibWriter::new(&mut buf).write_lib(lib)?;
    String::from_utf8(buf).map_err(|e| LibertyError::Boxed(Box::new(e)))
}

impl std::fmt::Display for Celllib {
    /// Renders Liberty text
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&s)
    }
}

/// # Liberty Writing Helper
pub struct LibWriter<'wr> {
    /// Write Destination
    dest: Box<dyn Write + 'wr>,
    /// Indentation Helper
    indent: Indent,
}
impl<'wr> LibWriter<'wr> {
    /// Create a new [LibWriter] to destination `dest`.
    fn new(dest: impl Write + 'wr) -> Self {
        Self {
            dest: Box::new(dest),
            indent: Indent::new("  "),
        }
    }
    /// Write a [Celllib] to the destination
    fn write_lib(&mut self, lib: &Celllib) -> LibResult<()> {
        self.write_line(format_args!("{} ({}) {{", LibKey::Library, name(lib.name())))?;
        self.indent += 1;
        if let Some(model) = lib.delay_model() {
            self.write_line(format_args!("{} : {} ;", LibKey::DelayModel, model))?;
        }
        for (key, val) in lib.defaults().entries() {
            if let Some(val) = val {
                self.write_line(format_args!("{} : {} ;", key, val))?;
            }
        }
        for t in lib.lut_templates() {
            self.write_lut_template(t)?;
        }
        for cell in lib.cells() {
            self.write_cell(cell)?;
        }
        self.indent -= 1;
        self.write_line(format_args!("}}"))?;
        self.dest.flush()?;
        Ok(())
    }
    /// Write a [LutTemplate]
    fn write_lut_template(&mut self, t: &LutTemplate) -> LibResult<()> {
        self.write_line(format_args!("{} ({}) {{", LibKey::LuTableTemplate, name(&t.name)))?;
        self.indent += 1;
        for (axis, var) in t.variables.iter().enumerate() {
            self.write_line(format_args!("{} : {} ;", variable_key(axis), var))?;
        }
        for (axis, idx) in t.indices.iter().enumerate() {
            self.write_line(format_args!("{} (\"{}\") ;", index_key(axis), join(idx)))?;
        }
        self.indent -= 1;
        self.write_line(format_args!("}}"))?;
        Ok(())
    }
    /// Write a [Cell]
    fn write_cell(&mut self, cell: &Cell) -> LibResult<()> {
        self.write_line(format_args!("{} ({}) {{", LibKey::Cell, name(&cell.name)))?;
        self.indent += 1;
        if let Some(ref v) = cell.area {
            self.write_line(format_args!("{} : {} ;", LibKey::Area, v))?;
        }
        if let Some(ref v) = cell.leakage_power {
            self.write_line(format_args!("{} : {} ;", LibKey::CellLeakagePower, v))?;
        }
        if let Some(ref v) = cell.footprint {
            self.write_line(format_args!("{} : \"{}\" ;", LibKey::CellFootprint, v))?;
        }
        for pin in cell.pins() {
            self.write_pin(pin)?;
        }
        self.indent -= 1;
        self.write_line(format_args!("}}"))?;
        Ok(())
    }
    /// Write a [Cellpin]
    fn write_pin(&mut self, pin: &Cellpin) -> LibResult<()> {
        use LibKey::*;
        self.write_line(format_args!("{} ({}) {{", Pin, name(&pin.name)))?;
        self.indent += 1;
        if let Some(ref v) = pin.direction {
            self.write_line(format_args!("{} : {} ;", Direction, v))?;
        }
        let numbers = [
            (Capacitance, pin.capacitance),
            (RiseCapacitance, pin.rise_capacitance),
            (FallCapacitance, pin.fall_capacitance),
            (MaxCapacitance, pin.max_capacitance),
            (MinCapacitance, pin.min_capacitance),
            (MaxTransition, pin.max_transition),
            (MinTransition, pin.min_transition),
            (FanoutLoad, pin.fanout_load),
            (MaxFanout, pin.max_fanout),
        ];
        for (key, val) in numbers {
            if let Some(val) = val {
                self.write_line(format_args!("{} : {} ;", key, val))?;
            }
        }
        if let Some(v) = pin.is_clock {
            self.write_line(format_args!("{} : {} ;", Clock, v))?;
        }
        if let Some(ref v) = pin.function {
            self.write_line(format_args!("{} : \"{}\" ;", Function, v))?;
        }
        for timing in pin.timings.iter() {
            self.write_timing(timing)?;
        }
        self.indent -= 1;
        self.write_line(format_args!("}}"))?;
        Ok(())
    }
    /// Write a [Timing] arc
    fn write_timing(&mut self, timing: &Timing) -> LibResult<()> {
        self.write_line(format_args!("{} () {{", LibKey::Timing))?;
        self.indent += 1;
        self.write_line(format_args!("{} : \"{}\" ;", LibKey::RelatedPin, timing.related_pin))?;
        if let Some(ref v) = timing.sense {
            self.write_line(format_args!("{} : {} ;", LibKey::TimingSense, v))?;
        }
        if let Some(ref v) = timing.timing_type {
            self.write_line(format_args!("{} : {} ;", LibKey::TimingType, v))?;
        }
        for (key, lut) in timing.luts() {
            self.write_lut(timing_table_key(key.tran, key.kind), lut)?;
        }
        self.indent -= 1;
        self.write_line(format_args!("}}"))?;
        Ok(())
    }
    /// Write a [Lut] under keyword `key`.
    /// Indices are always written explicitly, so the table does not depend on its template's defaults.
    fn write_lut(&mut self, key: LibKey, lut: &Lut) -> LibResult<()> {
        self.write_line(format_args!("{} ({}) {{", key, name(&lut.template)))?;
        self.indent += 1;
        for (axis, idx) in lut.indices.iter().enumerate() {
            self.write_line(format_args!("{} (\"{}\") ;", index_key(axis), join(idx)))?;
        }
        // One quoted row per run of the innermost axis
        let row_len = lut.indices.last().map_or(1, Vec::len).max(1);
        let rows: Vec<String> = lut
            .values
            .chunks(row_len)
            .map(|row| format!("\"{}\"", join(row)))
            .collect();
        let sep = format!(", \\\n{}        ", self.indent.state);
        self.write_line(format_args!("{} ({}) ;", LibKey::Values, rows.join(&sep)))?;
        self.indent -= 1;
        self.write_line(format_args!("}}"))?;
        Ok(())
    }
    /// Helper function writing a single line at the current indentation level
    fn write_line(&mut self, args: std::fmt::Arguments) -> std::io::Result<()> {
        writeln!(self.dest, "{}{}", self.indent.state, args)
    }
}

/// Render a name, quoting it unless it lexes as a single bare word
fn name(s: &str) -> String {
    let bare = !s.is_empty()
        && !s.contains("//")
        && !s.contains("/*")
        && !s
            .chars()
            .any(|c| c.is_whitespace() || "(){}:;,\"\\".contains(c));
    if bare {
        s.to_string()
    } else {
        format!("\"{}\"", s)
    }
}
/// Comma-separated list of `vals`
fn join(vals: &[LibDecimal]) -> String {
    let strs: Vec<String> = vals.iter().map(|v| v.to_string()).collect();
    strs.join(", ")
}
/// The `variable_N` keyword for zero-based `axis`
fn variable_key(axis: usize) -> LibKey {
    match axis {
        0 => LibKey::Variable1,
        1 => LibKey::Variable2,
        _ => LibKey::Variable3,
    }
}
/// The `index_N` keyword for zero-based `axis`
fn index_key(axis: usize) -> LibKey {
    match axis {
        0 => LibKey::Index1,
        1 => LibKey::Index2,
        _ => LibKey::Index3,
    }
}

/// Indentation Helper
struct Indent {
    unit: String,
    level: usize,
    state: String,
}
impl Indent {
    /// Create a new [Indent], initially at level 0
    fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            level: 0,
            state: String::new(),
        }
    }
}
impl AddAssign<usize> for Indent {
    fn add_assign(&mut self, rhs: usize) {
        self.level += rhs;
        self.state = self.unit.repeat(self.level);
    }
}
impl SubAssign<usize> for Indent {
    fn sub_assign(&mut self, rhs: usize) {
        self.level = self.level.saturating_sub(rhs);
        self.state = self.unit.repeat(self.level);
    }
}
