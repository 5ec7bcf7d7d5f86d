//!
//! # Liberty Reading Module
//!
//! Facilities for reading Liberty-format content from file or string.
//! Includes the recursive-descent [LibParser], its [ReadOptions],
//! and the non-fatal [Diagnostic]s it reports alongside a successful load.
//!

// Std-Lib
use std::path::Path;
use std::str::FromStr;

// Crates.io Imports
use derive_builder::Builder;
use indexmap::IndexMap;
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::data::*;
use crate::error::*;
use crate::lex::{self, Cursor, TokenStream, TokenType};
use crate::units::{Quantity, ScaledUnit, UnitSet};
use crate::utils::{EnumStr, KeyCase};

/// # Reader Options
#[derive(Debug, Clone, Builder, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct ReadOptions {
    /// Corner of the library being read. Tags every timing table.
    pub split: Split,
    /// Keyword case-matching. Names are always case-sensitive.
    #[serde(default)]
    #[builder(default)]
    pub key_case: KeyCase,
}
impl ReadOptions {
    /// Default options for corner `split`
    pub fn new(split: Split) -> Self {
        Self {
            split,
            key_case: KeyCase::default(),
        }
    }
}
impl crate::utils::SerdeFile for ReadOptions {}

/// # Diagnostic Kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Attribute not modeled by this reader. Skipped.
    UnrecognizedAttribute,
    /// Group not modeled by this reader. Skipped, with all its content.
    UnrecognizedGroup,
    /// Re-definition of an earlier name. The later definition wins.
    DuplicateName,
}

/// # Load Diagnostic
///
/// A non-fatal event encountered while reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Attribute, group, or entity name
    pub name: String,
    /// Innermost enclosing group
    pub context: Option<LibParseContext>,
    /// Line number
    pub line: usize,
    /// Byte offset
    pub pos: usize,
}

/// # Load Report
///
/// A successfully loaded [Celllib], and the [Diagnostic]s of its load.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub celllib: Celllib,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse Liberty content from file `fname`
pub fn parse_file(fname: impl AsRef<Path>, opts: &ReadOptions) -> LibResult<Celllib> {
    Ok(read_with_diagnostics(fname, opts)?.celllib)
}
/// Parse Liberty content from file `fname`, also returning its load [Diagnostic]s
pub fn read_with_diagnostics(fname: impl AsRef<Path>, opts: &ReadOptions) -> LibResult<LoadReport> {
    let path = fname.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LibertyError::FileNotFound { path: path.into() },
        _ => LibertyError::FileNotReadable {
            path: path.into(),
            source: e,
        },
    })?;
    let src = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            warn!("{:?} is not valid UTF-8; replacing invalid bytes", path);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    parse_str_with_diagnostics(&src, opts)
}
/// Parse Liberty content `src` from string
pub fn parse_str(src: &str, opts: &ReadOptions) -> LibResult<Celllib> {
    Ok(parse_str_with_diagnostics(src, opts)?.celllib)
}
/// Parse Liberty content `src` from string, also returning its load [Diagnostic]s
pub fn parse_str_with_diagnostics(src: &str, opts: &ReadOptions) -> LibResult<LoadReport> {
    let ts = lex::lex(src)?;
    LibParser::new(&ts, opts.clone()).parse_lib()
}

/// # Statement
///
/// The three syntactic forms of Liberty content, classified before dispatch on their keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Stmt {
    /// `name : value ;`
    Simple { name: Cursor, value: Vec<Cursor> },
    /// `name ( args ) ;`
    Complex { name: Cursor, args: Vec<Cursor> },
    /// `name ( args ) { body }`
    Group {
        name: Cursor,
        args: Vec<Cursor>,
        open: Cursor,
        close: Cursor,
    },
}
impl Stmt {
    fn name(&self) -> Cursor {
        match self {
            Self::Simple { name, .. } | Self::Complex { name, .. } | Self::Group { name, .. } => *name,
        }
    }
}

/// Header of a group statement
#[derive(Debug, Clone)]
struct GroupSpan {
    args: Vec<Cursor>,
    /// Opening brace
    open: Cursor,
    /// Closing brace
    close: Cursor,
}
impl GroupSpan {
    /// First statement of the body
    fn body(&self) -> Cursor {
        self.open.ahead(1)
    }
}

/// # Liberty Parser
///
/// Extracts a [Celllib] from a [TokenStream].
/// Each `extract_*` method takes the cursor of its group's keyword and the bound of the enclosing group,
/// and returns the extracted entity along with the cursor just past it.
/// Entities are inserted into the library only once fully extracted.
pub struct LibParser<'ts> {
    /// Token Arena
    ts: &'ts TokenStream,
    /// Options
    opts: ReadOptions,
    /// Library under construction
    lib: CelllibBuilder,
    /// Declared units
    units: UnitSet,
    /// Context Stack
    ctx: Vec<LibParseContext>,
    /// Non-fatal diagnostics
    diagnostics: Vec<Diagnostic>,
}
impl<'ts> LibParser<'ts> {
    /// Construct a [LibParser] over token-stream `ts`
    pub fn new(ts: &'ts TokenStream, opts: ReadOptions) -> Self {
        let lib = CelllibBuilder::new("", opts.split);
        Self {
            ts,
            opts,
            lib,
            units: UnitSet::default(),
            ctx: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
    /// Parse the whole stream, resolve default values, and freeze the result
    pub fn parse_lib(mut self) -> LibResult<LoadReport> {
        self.ctx.push(LibParseContext::Library);
        let end = self.ts.end();
        self.extract_units(Cursor(0), end)?;
        let at = self.extract_library_body(Cursor(0), end)?;
        if at != end {
            return self.fail_msg(ParseErrorType::Malformed, "Trailing content", at);
        }
        let celllib = self.lib.build();
        info!(
            "Loaded library `{}` ({}): {} cells, {} templates, {} diagnostics",
            celllib.name(),
            celllib.split(),
            celllib.num_cells(),
            celllib.lut_templates().count(),
            self.diagnostics.len(),
        );
        Ok(LoadReport {
            celllib,
            diagnostics: self.diagnostics,
        })
    }
    /// Extract library-level content from `at` up to `end`, into our library.
    /// Serves both the top level of a file and the body of its `library` group.
    pub(crate) fn extract_library_body(&mut self, mut at: Cursor, end: Cursor) -> LibResult<Cursor> {
        while at < end {
            if self.is(at, TokenType::SemiColon) {
                at = at.ahead(1);
                continue;
            }
            at = match self.peek_key(at) {
                Some(LibKey::Library) => {
                    let (grp, next) = self.group(at, end)?;
                    if let Some(name) = grp.args.first() {
                        let name = self.txt(*name).to_string();
                        self.lib.set_name(name);
                    }
                    self.extract_library_body(grp.body(), grp.close)?;
                    next
                }
                Some(LibKey::LuTableTemplate) => {
                    let (t, next) = self.extract_lut_template(at, end)?;
                    if let Some(old) = self.lib.lut_template(&t.name) {
                        // Tables already extracted carry the earlier axis variables
                        if old.variables != t.variables {
                            let tp = ParseErrorType::StructuralMismatch {
                                expected: old.num_axes(),
                                found: t.num_axes(),
                            };
                            let msg = format!("Template `{}` redefined with different variables", t.name);
                            return self.fail_msg(tp, msg, at);
                        }
                    }
                    let name = t.name.clone();
                    if self.lib.insert_lut_template(t).is_some() {
                        self.diagnose(DiagnosticKind::DuplicateName, name, at);
                    }
                    next
                }
                Some(LibKey::Cell) => {
                    let (cell, next) = self.extract_cell(at, end)?;
                    let name = cell.name.clone();
                    if self.lib.insert_cell(cell).is_some() {
                        self.diagnose(DiagnosticKind::DuplicateName, name, at);
                    }
                    next
                }
                Some(LibKey::DelayModel) => {
                    let (model, next) = self.simple_enum::<DelayModel>(at, end)?;
                    self.lib.set_delay_model(model);
                    next
                }
                Some(key @ LibKey::DefaultCellLeakagePower)
                | Some(key @ LibKey::DefaultInoutPinCap)
                | Some(key @ LibKey::DefaultInputPinCap)
                | Some(key @ LibKey::DefaultOutputPinCap)
                | Some(key @ LibKey::DefaultFanoutLoad)
                | Some(key @ LibKey::DefaultMaxFanout)
                | Some(key @ LibKey::DefaultMaxTransition) => self.extract_default(key, at, end)?,
                // Declared ahead of the main pass, by `extract_units`
                Some(key) if unit_quantity(key).is_some() => self.next_stmt(at, end)?.1,
                _ => self.skip_unrecognized(at, end)?,
            };
        }
        Ok(at)
    }
    /// Extract one of the library-level `default_*` attributes
    fn extract_default(&mut self, key: LibKey, at: Cursor, end: Cursor) -> LibResult<Cursor> {
        let quantity = match key {
            LibKey::DefaultCellLeakagePower => Some(Quantity::Power),
            LibKey::DefaultInoutPinCap | LibKey::DefaultInputPinCap | LibKey::DefaultOutputPinCap => {
                Some(Quantity::Capacitance)
            }
            LibKey::DefaultMaxTransition => Some(Quantity::Time),
            _ => None,
        };
        let (val, next) = self.simple_number(at, end, quantity)?;
        if let Some(slot) = self.lib.defaults_mut().get_mut(key) {
            *slot = Some(val);
        }
        Ok(next)
    }
    /// Declare the library-level units found from `at` up to `end`.
    /// Runs before any values are extracted, so units apply to the whole library wherever they are declared.
    /// Malformed statements end the scan, and are reported by the main pass.
    fn extract_units(&mut self, mut at: Cursor, end: Cursor) -> LibResult<()> {
        while at < end {
            if self.is(at, TokenType::SemiColon) {
                at = at.ahead(1);
                continue;
            }
            let (stmt, next) = match self.next_stmt(at, end) {
                Ok(s) => s,
                Err(_) => return Ok(()),
            };
            match (self.peek_key(at), stmt) {
                (Some(LibKey::Library), Stmt::Group { open, close, .. }) => {
                    self.extract_units(open.ahead(1), close)?;
                }
                (Some(key), _) => {
                    if let Some(quantity) = unit_quantity(key) {
                        self.extract_unit(quantity, at, end)?;
                    }
                }
                (None, _) => (),
            }
            at = next;
        }
        Ok(())
    }
    /// Extract a unit declaration of `quantity`
    fn extract_unit(&mut self, quantity: Quantity, at: Cursor, end: Cursor) -> LibResult<Cursor> {
        let (stmt, next) = self.next_stmt(at, end)?;
        let (vals, val_at) = match &stmt {
            Stmt::Simple { value, .. } => (value.clone(), value[0]),
            Stmt::Complex { args, .. } if !args.is_empty() => (args.clone(), args[0]),
            _ => return self.fail(ParseErrorType::InvalidValue, at),
        };
        let unit = match vals.as_slice() {
            [one] => ScaledUnit::parse(quantity, self.txt(*one)),
            [mult, unit] => ScaledUnit::from_parts(quantity, self.txt(*mult), self.txt(*unit)),
            _ => None,
        };
        match unit {
            Some(unit) => self.units.declare(unit),
            None => return self.fail_msg(ParseErrorType::InvalidValue, "Invalid unit", val_at),
        }
        Ok(next)
    }
    /// Extract a `lu_table_template` group
    pub(crate) fn extract_lut_template(&mut self, at: Cursor, end: Cursor) -> LibResult<(LutTemplate, Cursor)> {
        let (grp, next) = self.group(at, end)?;
        self.ctx.push(LibParseContext::LutTemplate);
        let name = self.group_name(&grp, at)?;
        let mut vars: [Option<LutVar>; 3] = [None; 3];
        let mut idxs: [Option<(Vec<LibDecimal>, Cursor)>; 3] = Default::default();
        let mut cur = grp.body();
        while cur < grp.close {
            if self.is(cur, TokenType::SemiColon) {
                cur = cur.ahead(1);
                continue;
            }
            cur = match self.peek_key(cur) {
                Some(key @ LibKey::Variable1) | Some(key @ LibKey::Variable2) | Some(key @ LibKey::Variable3) => {
                    let (var, next) = self.simple_enum::<LutVar>(cur, grp.close)?;
                    vars[key.axis().unwrap_or_default()] = Some(var);
                    next
                }
                Some(key @ LibKey::Index1) | Some(key @ LibKey::Index2) | Some(key @ LibKey::Index3) => {
                    let (args, next) = self.complex(cur, grp.close)?;
                    let vals = self.parse_numbers(&args, cur)?;
                    idxs[key.axis().unwrap_or_default()] = Some((vals, cur));
                    next
                }
                _ => self.skip_unrecognized(cur, grp.close)?,
            };
        }
        // Variables and indices are each declared from the first axis, without gaps
        let nvars = vars.iter().take_while(|v| v.is_some()).count();
        if vars[nvars..].iter().any(Option::is_some) {
            return self.fail_msg(ParseErrorType::Malformed, "Template variables must start at `variable_1`", at);
        }
        let nidx = idxs.iter().take_while(|i| i.is_some()).count();
        if let Some((_, c)) = idxs[nidx..].iter().flatten().next() {
            return self.fail_msg(ParseErrorType::Malformed, "Template indices must start at `index_1`", *c);
        }
        if nidx > nvars {
            let c = idxs[nvars].as_ref().map_or(at, |(_, c)| *c);
            let tp = ParseErrorType::StructuralMismatch {
                expected: nvars,
                found: nidx,
            };
            return self.fail_msg(tp, "More template indices than variables", c);
        }
        let variables: Vec<LutVar> = vars.iter().flatten().copied().collect();
        let indices = idxs
            .into_iter()
            .flatten()
            .zip(variables.iter())
            .map(|((vals, c), var)| self.normalize_axis(vals, *var, c))
            .collect::<LibResult<Vec<Vec<LibDecimal>>>>()?;
        let t = LutTemplateBuilder::default()
            .name(name)
            .variables(variables)
            .indices(indices)
            .build();
        let t = self.built(t, at)?;
        self.ctx.pop();
        Ok((t, next))
    }
    /// Extract a table group, e.g. `cell_rise (template) { ... }`
    pub(crate) fn extract_lut(&mut self, at: Cursor, end: Cursor) -> LibResult<(Lut, Cursor)> {
        let (grp, next) = self.group(at, end)?;
        self.ctx.push(LibParseContext::Lut);
        let tname_at = match grp.args.first() {
            Some(c) => *c,
            None => return self.fail_msg(ParseErrorType::MissingAttribute, "Table requires a template name", at),
        };
        let tname = self.txt(tname_at).to_string();
        let template = match self.lib.lut_template(&tname) {
            Some(t) => t.clone(),
            None if tname == Lut::SCALAR => LutTemplate::new(Lut::SCALAR),
            None => return self.fail(ParseErrorType::UnknownTemplate { name: tname }, tname_at),
        };
        let nvars = template.num_axes();
        let mut idxs: [Option<Vec<LibDecimal>>; 3] = Default::default();
        let mut values: Option<(Vec<LibDecimal>, Cursor)> = None;
        let mut cur = grp.body();
        while cur < grp.close {
            if self.is(cur, TokenType::SemiColon) {
                cur = cur.ahead(1);
                continue;
            }
            cur = match self.peek_key(cur) {
                Some(key @ LibKey::Index1) | Some(key @ LibKey::Index2) | Some(key @ LibKey::Index3) => {
                    let axis = key.axis().unwrap_or_default();
                    if axis >= nvars {
                        let tp = ParseErrorType::StructuralMismatch {
                            expected: nvars,
                            found: axis + 1,
                        };
                        return self.fail_msg(tp, "Index for an axis the template does not have", cur);
                    }
                    let (args, next) = self.complex(cur, grp.close)?;
                    let vals = self.parse_numbers(&args, cur)?;
                    idxs[axis] = Some(self.normalize_axis(vals, template.variables[axis], cur)?);
                    next
                }
                Some(LibKey::Values) => {
                    let (args, next) = self.complex(cur, grp.close)?;
                    let vals = self.parse_numbers(&args, cur)?;
                    let vals = vals
                        .into_iter()
                        .map(|v| self.scale(v, Quantity::Time, cur))
                        .collect::<LibResult<Vec<LibDecimal>>>()?;
                    values = Some((vals, cur));
                    next
                }
                _ => self.skip_unrecognized(cur, grp.close)?,
            };
        }
        // Resolve each axis: instance indices first, then the template's
        let mut indices = Vec::with_capacity(nvars);
        for (axis, idx) in idxs.into_iter().enumerate().take(nvars) {
            match idx.or_else(|| template.indices.get(axis).cloned()) {
                Some(idx) => indices.push(idx),
                None => {
                    let tp = ParseErrorType::StructuralMismatch {
                        expected: nvars,
                        found: axis,
                    };
                    return self.fail_msg(tp, format!("No indices for axis {}", axis + 1), at);
                }
            }
        }
        let (values, values_at) = match values {
            Some(v) => v,
            None => return self.fail_msg(ParseErrorType::MissingAttribute, "Table requires `values`", at),
        };
        let expected: usize = indices.iter().map(Vec::len).product();
        if values.len() != expected {
            let tp = ParseErrorType::StructuralMismatch {
                expected,
                found: values.len(),
            };
            return self.fail(tp, values_at);
        }
        self.ctx.pop();
        let lut = Lut {
            template: tname,
            variables: template.variables,
            indices,
            values,
        };
        Ok((lut, next))
    }
    /// Extract a `timing` group
    pub(crate) fn extract_timing(&mut self, at: Cursor, end: Cursor) -> LibResult<(Timing, Cursor)> {
        let (grp, next) = self.group(at, end)?;
        self.ctx.push(LibParseContext::Timing);
        let mut related_pin: Option<String> = None;
        let mut timing = Timing::new("", self.opts.split);
        let mut cur = grp.body();
        while cur < grp.close {
            if self.is(cur, TokenType::SemiColon) {
                cur = cur.ahead(1);
                continue;
            }
            cur = match self.peek_key(cur) {
                Some(LibKey::RelatedPin) => {
                    let (pin, next) = self.simple_text(cur, grp.close)?;
                    related_pin = Some(pin);
                    next
                }
                Some(LibKey::TimingSense) => {
                    let (sense, next) = self.simple_enum::<TimingSense>(cur, grp.close)?;
                    timing.sense = Some(sense);
                    next
                }
                Some(LibKey::TimingType) => {
                    let (tp, next) = self.simple_enum::<TimingType>(cur, grp.close)?;
                    timing.timing_type = Some(tp);
                    next
                }
                Some(key) => match key.timing_table() {
                    Some((tran, kind)) => {
                        let (lut, next) = self.extract_lut(cur, grp.close)?;
                        if timing.set_lut(tran, kind, lut).is_some() {
                            self.diagnose(DiagnosticKind::DuplicateName, key.to_str().to_string(), cur);
                        }
                        next
                    }
                    None => self.skip_unrecognized(cur, grp.close)?,
                },
                None => self.skip_unrecognized(cur, grp.close)?,
            };
        }
        match related_pin {
            Some(pin) => timing.related_pin = pin,
            None => return self.fail_msg(ParseErrorType::MissingAttribute, "Timing requires `related_pin`", at),
        }
        self.ctx.pop();
        Ok((timing, next))
    }
    /// Extract a `pin` group.
    /// Groups naming several pins, e.g. `pin (A, B)`, produce one [Cellpin] per name.
    pub(crate) fn extract_cellpin(&mut self, at: Cursor, end: Cursor) -> LibResult<(Vec<Cellpin>, Cursor)> {
        let (grp, next) = self.group(at, end)?;
        self.ctx.push(LibParseContext::Pin);
        if grp.args.is_empty() {
            return self.fail_msg(ParseErrorType::MissingAttribute, "Pin requires a name", at);
        }
        let mut pin = CellpinBuilder::default();
        let mut timings = Vec::new();
        let mut cur = grp.body();
        while cur < grp.close {
            if self.is(cur, TokenType::SemiColon) {
                cur = cur.ahead(1);
                continue;
            }
            let close = grp.close;
            let cap = Some(Quantity::Capacitance);
            let time = Some(Quantity::Time);
            cur = match self.peek_key(cur) {
                Some(LibKey::Timing) => {
                    let (timing, next) = self.extract_timing(cur, close)?;
                    timings.push(timing);
                    next
                }
                Some(LibKey::Direction) => {
                    let (dir, next) = self.simple_enum::<PinDirection>(cur, close)?;
                    pin = pin.direction(dir);
                    next
                }
                Some(LibKey::Capacitance) => {
                    let (v, next) = self.simple_number(cur, close, cap)?;
                    pin = pin.capacitance(v);
                    next
                }
                Some(LibKey::RiseCapacitance) => {
                    let (v, next) = self.simple_number(cur, close, cap)?;
                    pin = pin.rise_capacitance(v);
                    next
                }
                Some(LibKey::FallCapacitance) => {
                    let (v, next) = self.simple_number(cur, close, cap)?;
                    pin = pin.fall_capacitance(v);
                    next
                }
                Some(LibKey::MaxCapacitance) => {
                    let (v, next) = self.simple_number(cur, close, cap)?;
                    pin = pin.max_capacitance(v);
                    next
                }
                Some(LibKey::MinCapacitance) => {
                    let (v, next) = self.simple_number(cur, close, cap)?;
                    pin = pin.min_capacitance(v);
                    next
                }
                Some(LibKey::MaxTransition) => {
                    let (v, next) = self.simple_number(cur, close, time)?;
                    pin = pin.max_transition(v);
                    next
                }
                Some(LibKey::MinTransition) => {
                    let (v, next) = self.simple_number(cur, close, time)?;
                    pin = pin.min_transition(v);
                    next
                }
                Some(LibKey::FanoutLoad) => {
                    let (v, next) = self.simple_number(cur, close, None)?;
                    pin = pin.fanout_load(v);
                    next
                }
                Some(LibKey::MaxFanout) => {
                    let (v, next) = self.simple_number(cur, close, None)?;
                    pin = pin.max_fanout(v);
                    next
                }
                Some(LibKey::Clock) => {
                    let (v, next) = self.simple_bool(cur, close)?;
                    pin = pin.is_clock(v);
                    next
                }
                Some(LibKey::Function) => {
                    let (v, next) = self.simple_text(cur, close)?;
                    pin = pin.function(v);
                    next
                }
                _ => self.skip_unrecognized(cur, close)?,
            };
        }
        let pin = pin.timings(timings);
        let mut pins = Vec::with_capacity(grp.args.len());
        for name in grp.args.iter() {
            let built = pin.clone().name(self.txt(*name)).build();
            pins.push(self.built(built, *name)?);
        }
        self.ctx.pop();
        Ok((pins, next))
    }
    /// Extract a `cell` group
    pub(crate) fn extract_cell(&mut self, at: Cursor, end: Cursor) -> LibResult<(Cell, Cursor)> {
        let (grp, next) = self.group(at, end)?;
        self.ctx.push(LibParseContext::Cell);
        let name = self.group_name(&grp, at)?;
        let mut cell = CellBuilder::default().name(name);
        let mut pins: IndexMap<String, Cellpin> = IndexMap::new();
        let mut cur = grp.body();
        while cur < grp.close {
            if self.is(cur, TokenType::SemiColon) {
                cur = cur.ahead(1);
                continue;
            }
            cur = match self.peek_key(cur) {
                Some(LibKey::Pin) => {
                    let (newpins, next) = self.extract_cellpin(cur, grp.close)?;
                    for pin in newpins {
                        let name = pin.name.clone();
                        if pins.insert(name.clone(), pin).is_some() {
                            self.diagnose(DiagnosticKind::DuplicateName, name, cur);
                        }
                    }
                    next
                }
                Some(LibKey::Area) => {
                    let (v, next) = self.simple_number(cur, grp.close, None)?;
                    cell = cell.area(v);
                    next
                }
                Some(LibKey::CellLeakagePower) => {
                    let (v, next) = self.simple_number(cur, grp.close, Some(Quantity::Power))?;
                    cell = cell.leakage_power(v);
                    next
                }
                Some(LibKey::CellFootprint) => {
                    let (v, next) = self.simple_text(cur, grp.close)?;
                    cell = cell.footprint(v);
                    next
                }
                _ => self.skip_unrecognized(cur, grp.close)?,
            };
        }
        let cell = self.built(cell.pins(pins).build(), at)?;
        self.ctx.pop();
        Ok((cell, next))
    }
    /// Classify the statement starting at `at`, bounded by `end`.
    /// Returns the statement and the cursor just past it, including any trailing semicolon.
    pub(crate) fn next_stmt(&self, at: Cursor, end: Cursor) -> LibResult<(Stmt, Cursor)> {
        if self.ttype(at, end) != Some(TokenType::Word) {
            return self.fail(
                ParseErrorType::InvalidToken {
                    expected: TokenType::Word,
                },
                at,
            );
        }
        let name = at;
        let at = at.ahead(1);
        match self.ttype(at, end) {
            Some(TokenType::Colon) => {
                // Simple attribute. Its value runs to the semicolon or the end of its line.
                let mut value = Vec::new();
                let mut line = None;
                let mut cur = at.ahead(1);
                while let Some(tok) = self.ts.get(cur).filter(|_| cur < end) {
                    if !tok.ttype.is_value() {
                        break;
                    }
                    match line {
                        None => line = Some(tok.loc.line),
                        Some(l) if l != tok.loc.line => break,
                        Some(_) => (),
                    }
                    value.push(cur);
                    cur = cur.ahead(1);
                }
                if value.is_empty() {
                    return self.fail(
                        ParseErrorType::InvalidToken {
                            expected: TokenType::Word,
                        },
                        cur,
                    );
                }
                Ok((Stmt::Simple { name, value }, self.skip_semicolon(cur, end)))
            }
            Some(TokenType::LParen) => {
                let close = self.partner(at)?;
                let args = self.args(at, close)?;
                let after = close.ahead(1);
                if self.ttype(after, end) == Some(TokenType::LBrace) {
                    let body_close = self.partner(after)?;
                    let stmt = Stmt::Group {
                        name,
                        args,
                        open: after,
                        close: body_close,
                    };
                    Ok((stmt, self.skip_semicolon(body_close.ahead(1), end)))
                } else {
                    Ok((Stmt::Complex { name, args }, self.skip_semicolon(after, end)))
                }
            }
            _ => self.fail_msg(ParseErrorType::Malformed, "Expected `:` or `(` after attribute name", at),
        }
    }
    /// Collect the value tokens between parentheses `open` and `close`
    fn args(&self, open: Cursor, close: Cursor) -> LibResult<Vec<Cursor>> {
        let mut args = Vec::new();
        let mut cur = open.ahead(1);
        while cur < close {
            match self.ttype(cur, close) {
                Some(TokenType::Word) | Some(TokenType::Str) => args.push(cur),
                Some(TokenType::Comma) => (),
                _ => {
                    return self.fail(
                        ParseErrorType::InvalidToken {
                            expected: TokenType::Word,
                        },
                        cur,
                    )
                }
            }
            cur = cur.ahead(1);
        }
        Ok(args)
    }
    /// Skip a semicolon at `at`, if present
    fn skip_semicolon(&self, at: Cursor, end: Cursor) -> Cursor {
        match self.ttype(at, end) {
            Some(TokenType::SemiColon) => at.ahead(1),
            _ => at,
        }
    }
    /// Get the matching bracket of that at `at`
    fn partner(&self, at: Cursor) -> LibResult<Cursor> {
        match self.ts.partner(at) {
            Some(c) => Ok(c),
            None => self.fail_msg(ParseErrorType::Malformed, "Unbalanced bracket", at),
        }
    }
    /// Parse a simple attribute, returning its value tokens
    fn simple(&self, at: Cursor, end: Cursor) -> LibResult<(Vec<Cursor>, Cursor)> {
        match self.next_stmt(at, end)? {
            (Stmt::Simple { value, .. }, next) => Ok((value, next)),
            _ => self.fail_msg(ParseErrorType::Malformed, "Expected a `name : value` attribute", at),
        }
    }
    /// Parse a simple attribute, returning its value text
    fn simple_text(&self, at: Cursor, end: Cursor) -> LibResult<(String, Cursor)> {
        let (value, next) = self.simple(at, end)?;
        let txt = match value.as_slice() {
            [one] => self.txt(*one).to_string(),
            _ => {
                // Multiple bare words. Keep them as written.
                let first = self.ts.get(value[0]).map_or(0, |t| t.loc.start);
                let last = self.ts.get(value[value.len() - 1]).map_or(first, |t| t.loc.stop);
                self.ts.src()[first..last].to_string()
            }
        };
        Ok((txt, next))
    }
    /// Parse a simple numeric attribute, normalizing it as `quantity`
    fn simple_number(&self, at: Cursor, end: Cursor, quantity: Option<Quantity>) -> LibResult<(LibDecimal, Cursor)> {
        let (value, next) = self.simple(at, end)?;
        if value.len() != 1 {
            return self.fail(ParseErrorType::InvalidValue, value[0]);
        }
        let val = self.parse_number(self.txt(value[0]), value[0])?;
        let val = match quantity {
            Some(q) => self.scale(val, q, value[0])?,
            None => val,
        };
        Ok((val, next))
    }
    /// Parse a simple enumerated attribute
    fn simple_enum<T: EnumStr>(&self, at: Cursor, end: Cursor) -> LibResult<(T, Cursor)> {
        let (value, next) = self.simple(at, end)?;
        if value.len() != 1 {
            return self.fail(ParseErrorType::InvalidValue, value[0]);
        }
        match T::parse(self.txt(value[0]), self.opts.key_case) {
            Some(t) => Ok((t, next)),
            None => self.fail(ParseErrorType::InvalidValue, value[0]),
        }
    }
    /// Parse a simple boolean attribute
    fn simple_bool(&self, at: Cursor, end: Cursor) -> LibResult<(bool, Cursor)> {
        let (value, next) = self.simple(at, end)?;
        let txt = self.txt(value[0]);
        let same = |s: &str| match self.opts.key_case {
            KeyCase::Strict => txt == s,
            KeyCase::Lenient => txt.eq_ignore_ascii_case(s),
        };
        if value.len() == 1 && same("true") {
            Ok((true, next))
        } else if value.len() == 1 && same("false") {
            Ok((false, next))
        } else {
            self.fail(ParseErrorType::InvalidValue, value[0])
        }
    }
    /// Parse a complex attribute, returning its argument tokens
    fn complex(&self, at: Cursor, end: Cursor) -> LibResult<(Vec<Cursor>, Cursor)> {
        match self.next_stmt(at, end)? {
            (Stmt::Complex { args, .. }, next) => Ok((args, next)),
            _ => self.fail_msg(ParseErrorType::Malformed, "Expected a `name ( args )` attribute", at),
        }
    }
    /// Parse a group header
    fn group(&self, at: Cursor, end: Cursor) -> LibResult<(GroupSpan, Cursor)> {
        match self.next_stmt(at, end)? {
            (Stmt::Group { args, open, close, .. }, next) => Ok((GroupSpan { args, open, close }, next)),
            _ => self.fail_msg(ParseErrorType::Malformed, "Expected a `name ( args ) { ... }` group", at),
        }
    }
    /// Get the (required) name of a group, its first argument
    fn group_name(&self, grp: &GroupSpan, at: Cursor) -> LibResult<String> {
        match grp.args.first() {
            Some(c) => Ok(self.txt(*c).to_string()),
            None => self.fail_msg(ParseErrorType::MissingAttribute, "Group requires a name", at),
        }
    }
    /// Skip the statement at `at`, recording it as unrecognized
    fn skip_unrecognized(&mut self, at: Cursor, end: Cursor) -> LibResult<Cursor> {
        let (stmt, next) = self.next_stmt(at, end)?;
        let kind = match stmt {
            Stmt::Group { .. } => DiagnosticKind::UnrecognizedGroup,
            _ => DiagnosticKind::UnrecognizedAttribute,
        };
        let name = self.txt(stmt.name()).to_string();
        self.diagnose(kind, name, at);
        Ok(next)
    }
    /// Parse a list of comma- or space-separated numbers from argument tokens `args`
    fn parse_numbers(&self, args: &[Cursor], at: Cursor) -> LibResult<Vec<LibDecimal>> {
        let mut rv = Vec::new();
        for arg in args {
            let txt = self.txt(*arg);
            for s in txt.split(|c: char| c == ',' || c.is_whitespace()) {
                if !s.is_empty() {
                    rv.push(self.parse_number(s, *arg)?);
                }
            }
        }
        if rv.is_empty() {
            return self.fail_msg(ParseErrorType::InvalidValue, "Empty numeric list", at);
        }
        Ok(rv)
    }
    /// Parse a number from string `txt`, reporting failures at `at`
    fn parse_number(&self, txt: &str, at: Cursor) -> LibResult<LibDecimal> {
        let txt = txt.trim();
        let txt = txt.strip_prefix('+').unwrap_or(txt);
        let parsed = if txt.contains(|c| c == 'e' || c == 'E') {
            LibDecimal::from_scientific(txt)
        } else {
            LibDecimal::from_str(txt)
        };
        match parsed {
            Ok(v) => Ok(v.normalize()),
            Err(e) => self.fail_msg(ParseErrorType::InvalidValue, e.to_string(), at),
        }
    }
    /// Scale axis indices `vals` into internal units, per axis variable `var`
    fn normalize_axis(&self, vals: Vec<LibDecimal>, var: LutVar, at: Cursor) -> LibResult<Vec<LibDecimal>> {
        match Quantity::of_lut_var(var) {
            Some(q) => vals.into_iter().map(|v| self.scale(v, q, at)).collect(),
            None => Ok(vals),
        }
    }
    /// Scale `raw`, a value of `quantity`, into internal units
    fn scale(&self, raw: LibDecimal, quantity: Quantity, at: Cursor) -> LibResult<LibDecimal> {
        match self.units.normalize(raw, quantity) {
            Some(v) => Ok(v),
            None => {
                let msg = format!("{} exceeds the representable range in internal units", raw);
                self.fail_msg(ParseErrorType::InvalidValue, msg, at)
            }
        }
    }
    /// Record a [Diagnostic] of `kind` for `name`, at `at`
    fn diagnose(&mut self, kind: DiagnosticKind, name: String, at: Cursor) {
        let (line, pos) = self.ts.get(at).map_or((0, 0), |t| (t.loc.line, t.loc.start));
        match kind {
            DiagnosticKind::DuplicateName => warn!("Line {}: redefinition of `{}` replaces the earlier one", line, name),
            _ => debug!("Line {}: skipping unrecognized {:?} `{}`", line, kind, name),
        }
        self.diagnostics.push(Diagnostic {
            kind,
            name,
            context: self.ctx.last().copied(),
            line,
            pos,
        });
    }
    /// Get the [LibKey] of the token at `at`, if it is one
    fn peek_key(&self, at: Cursor) -> Option<LibKey> {
        match self.ts.get(at) {
            Some(tok) if tok.ttype == TokenType::Word => LibKey::parse(self.txt(at), self.opts.key_case),
            _ => None,
        }
    }
    /// Type of the token at `at`, if before `end`
    fn ttype(&self, at: Cursor, end: Cursor) -> Option<TokenType> {
        if at >= end {
            return None;
        }
        self.ts.get(at).map(|t| t.ttype)
    }
    /// Boolean indication of whether the token at `at` is of type `ttype`
    fn is(&self, at: Cursor, ttype: TokenType) -> bool {
        self.ts.get(at).map_or(false, |t| t.ttype == ttype)
    }
    /// Retrieve the text-content of the token at `at`
    #[inline(always)]
    fn txt(&self, at: Cursor) -> &'ts str {
        self.ts.text(at).unwrap_or_default()
    }
    /// Convert a builder result, reporting missing fields at `at`
    fn built<T, E: std::fmt::Display>(&self, res: Result<T, E>, at: Cursor) -> LibResult<T> {
        match res {
            Ok(t) => Ok(t),
            Err(e) => self.fail_msg(ParseErrorType::MissingAttribute, e.to_string(), at),
        }
    }
    /// Error-Generation Helper
    fn fail<T>(&self, tp: ParseErrorType, at: Cursor) -> LibResult<T> {
        Err(LibertyError::Parse {
            tp,
            msg: None,
            state: self.state(at),
        })
    }
    /// Error-Generation Helper
    fn fail_msg<T>(&self, tp: ParseErrorType, msg: impl Into<String>, at: Cursor) -> LibResult<T> {
        Err(LibertyError::Parse {
            tp,
            msg: Some(msg.into()),
            state: self.state(at),
        })
    }
    /// Extract the state of the parser at `at`. Generally for error reporting.
    fn state(&self, at: Cursor) -> ParserState {
        let src = self.ts.src();
        let (token, line_num, pos) = match self.ts.get(at) {
            Some(t) => (t.substr(src).to_string(), t.loc.line, t.loc.start),
            None => ("EOF".to_string(), src.lines().count().max(1), src.len()),
        };
        ParserState {
            ctx: self.ctx.clone(),
            token,
            line_content: self.ts.line_at(pos).to_string(),
            line_num,
            pos,
        }
    }
}

/// The quantity declared by unit keyword `key`, if it is one
fn unit_quantity(key: LibKey) -> Option<Quantity> {
    match key {
        LibKey::TimeUnit => Some(Quantity::Time),
        LibKey::CapacitiveLoadUnit => Some(Quantity::Capacitance),
        LibKey::LeakagePowerUnit => Some(Quantity::Power),
        LibKey::VoltageUnit => Some(Quantity::Voltage),
        LibKey::CurrentUnit => Some(Quantity::Current),
        LibKey::PullingResistanceUnit => Some(Quantity::Resistance),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_test<T>(
        src: &str,
        f: impl FnOnce(&mut LibParser, Cursor) -> LibResult<(T, Cursor)>,
    ) -> LibResult<T> {
        let ts = lex::lex(src)?;
        let mut parser = LibParser::new(&ts, ReadOptions::new(Split::Late));
        let (t, next) = f(&mut parser, Cursor(0))?;
        assert_eq!(next, ts.end());
        Ok(t)
    }

    #[test]
    fn it_classifies_statements() -> LibResult<()> {
        let ts = lex::lex("area : 1.5 ; index_1 (\"1, 2\") ; pin (A) { } next : 1")?;
        let parser = LibParser::new(&ts, ReadOptions::new(Split::Early));
        let (s, at) = parser.next_stmt(Cursor(0), ts.end())?;
        assert!(matches!(s, Stmt::Simple { ref value, .. } if value.len() == 1));
        let (s, at) = parser.next_stmt(at, ts.end())?;
        assert!(matches!(s, Stmt::Complex { ref args, .. } if args.len() == 1));
        let (s, at) = parser.next_stmt(at, ts.end())?;
        assert!(matches!(s, Stmt::Group { .. }));
        // Final semicolon is optional
        let (s, at) = parser.next_stmt(at, ts.end())?;
        assert!(matches!(s, Stmt::Simple { .. }));
        assert_eq!(at, ts.end());
        Ok(())
    }
    #[test]
    fn it_parses_lut_templates() -> LibResult<()> {
        let src = r#"
        lu_table_template (delay_template_2x3) {
            variable_1 : input_net_transition ;
            variable_2 : total_output_net_capacitance ;
            index_1 ("0.1, 0.2") ;
            index_2 ("1.0, 2.0, 4.0") ;
        }
        "#;
        let t = parser_test(src, |p, at| p.extract_lut_template(at, p.ts.end()))?;
        assert_eq!(t.name, "delay_template_2x3");
        assert_eq!(
            t.variables,
            vec![LutVar::InputNetTransition, LutVar::TotalOutputNetCapacitance]
        );
        assert_eq!(t.indices.len(), 2);
        assert_eq!(t.indices[1], vec![LibDecimal::from(1), LibDecimal::from(2), LibDecimal::from(4)]);
        Ok(())
    }
    #[test]
    fn it_rejects_excess_template_indices() -> LibResult<()> {
        let src = r#"
        lu_table_template (t) {
            variable_1 : input_net_transition ;
            index_1 ("0.1, 0.2") ;
            index_2 ("1.0, 2.0") ;
        }
        "#;
        let e = parser_test(src, |p, at| p.extract_lut_template(at, p.ts.end())).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::StructuralMismatch);
        Ok(())
    }
    #[test]
    fn it_parses_scalar_tables() -> LibResult<()> {
        let src = "cell_rise (scalar) { values (\"0.25\") ; }";
        let lut = parser_test(src, |p, at| p.extract_lut(at, p.ts.end()))?;
        assert!(lut.is_scalar());
        assert_eq!(lut.values, vec![LibDecimal::new(25, 2)]);
        Ok(())
    }
    #[test]
    fn it_parses_timing() -> LibResult<()> {
        let src = r#"
        timing () {
            related_pin : "CK" ;
            timing_type : rising_edge ;
            cell_rise (scalar) { values ("0.1") ; }
            cell_rise (scalar) { values ("0.2") ; }
            when : "!D" ;
        }
        "#;
        let ts = lex::lex(src)?;
        let mut parser = LibParser::new(&ts, ReadOptions::new(Split::Early));
        let (timing, _) = parser.extract_timing(Cursor(0), ts.end())?;
        assert_eq!(timing.related_pin, "CK");
        assert_eq!(timing.split, Split::Early);
        assert_eq!(timing.timing_type, Some(TimingType::RisingEdge));
        // Later tables replace earlier ones of the same kind
        assert_eq!(timing.cell_rise, Some(Lut::scalar(LibDecimal::new(2, 1))));
        let kinds: Vec<_> = parser.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::DuplicateName, DiagnosticKind::UnrecognizedAttribute]
        );
        assert_eq!(parser.diagnostics[1].name, "when");
        assert_eq!(parser.diagnostics[1].context, Some(LibParseContext::Timing));
        Ok(())
    }
    #[test]
    fn it_requires_related_pin() -> LibResult<()> {
        let src = "timing () { timing_sense : positive_unate ; }";
        let e = parser_test(src, |p, at| p.extract_timing(at, p.ts.end())).unwrap_err();
        match e {
            LibertyError::Parse { tp, .. } => assert_eq!(tp, ParseErrorType::MissingAttribute),
            _ => panic!("Unexpected error {:?}", e),
        }
        Ok(())
    }
    #[test]
    fn it_parses_pin_lists() -> LibResult<()> {
        let src = "pin (A1, A2) { direction : input ; capacitance : 0.0015 ; }";
        let pins = parser_test(src, |p, at| p.extract_cellpin(at, p.ts.end()))?;
        let names: Vec<_> = pins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A1", "A2"]);
        assert!(pins.iter().all(|p| p.direction == Some(PinDirection::Input)));
        assert!(pins.iter().all(|p| p.capacitance == Some(LibDecimal::new(15, 4))));
        Ok(())
    }
    #[test]
    fn it_parses_numbers() -> LibResult<()> {
        let ts = lex::lex("x")?;
        let parser = LibParser::new(&ts, ReadOptions::new(Split::Early));
        let n = |s| parser.parse_number(s, Cursor(0));
        assert_eq!(n("1.5e-3")?, LibDecimal::new(15, 4));
        assert_eq!(n("+2")?, LibDecimal::from(2));
        assert_eq!(n("-0.25")?, LibDecimal::new(-25, 2));
        assert!(n("abc").is_err());
        Ok(())
    }
}
