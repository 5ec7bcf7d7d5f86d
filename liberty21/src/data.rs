//!
//! # Liberty Data Model
//!
//! The typed, queryable form of one characterization (`.lib`) file.
//! A [Celllib] is produced by a single read per corner, and is read-only thereafter.
//! All mutation happens through [CelllibBuilder], either while loading or during later engineering changes.
//!

// Std-Lib
use std::path::Path;

// Crates.io Imports
use derive_builder::Builder;
use indexmap::IndexMap;
#[allow(unused_imports)]
use rust_decimal::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::error::LibResult;
use crate::read::ReadOptions;
use crate::utils::enumstr;

///
/// # LibDecimal
///
/// Internal type alias for all decimal-valued data.
/// Uses [rust_decimal](https://crates.io/crates/rust_decimal) internally,
/// keeping loaded tables exact and comparable (`Eq`) across loads.
///
pub type LibDecimal = rust_decimal::Decimal;

/// # Cell Library
///
/// Liberty's primary container: library-wide settings and defaults,
/// the table templates, and the cell definitions of one characterization corner.
///
/// Lookups by name are exact and case-sensitive, and return `None` for names never defined.
/// There are no mutating methods; see [CelllibBuilder] and [Celllib::into_builder].
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Celllib {
    /// Library Name
    pub(crate) name: String,
    /// Characterization corner this library was loaded as
    pub(crate) split: Split,
    /// Delay Model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) delay_model: Option<DelayModel>,
    /// Library-level `default_*` attribute values
    #[serde(default)]
    pub(crate) defaults: LibDefaults,
    /// Table Templates, keyed by name, in definition order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub(crate) lut_templates: IndexMap<String, LutTemplate>,
    /// Cell Definitions, keyed by name, in definition order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub(crate) cells: IndexMap<String, Cell>,
}
impl Celllib {
    /// Open a [Celllib] from file `fname`, as corner `split`
    pub fn open(fname: impl AsRef<Path>, split: Split) -> LibResult<Celllib> {
        Self::open_with(fname, &ReadOptions::new(split))
    }
    /// Open a [Celllib] from file `fname`, with reader options `opts`
    pub fn open_with(fname: impl AsRef<Path>, opts: &ReadOptions) -> LibResult<Celllib> {
        super::read::parse_file(fname, opts)
    }
    /// Write a [Celllib] to Liberty-format file `fname`
    pub fn save(&self, fname: impl AsRef<Path>) -> LibResult<()> {
        super::write::save(self, fname)
    }
    /// Library Name
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The corner this library characterizes
    pub fn split(&self) -> Split {
        self.split
    }
    /// Delay Model, if declared
    pub fn delay_model(&self) -> Option<DelayModel> {
        self.delay_model
    }
    /// Library-level default attribute values
    pub fn defaults(&self) -> &LibDefaults {
        &self.defaults
    }
    /// Get the [Cell] named `name`, if defined
    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }
    /// Get the [LutTemplate] named `name`, if defined
    pub fn lut_template(&self, name: &str) -> Option<&LutTemplate> {
        self.lut_templates.get(name)
    }
    /// Iterate over all [Cell]s, in definition order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }
    /// Iterate over all [LutTemplate]s, in definition order
    pub fn lut_templates(&self) -> impl Iterator<Item = &LutTemplate> {
        self.lut_templates.values()
    }
    /// Number of cells defined
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }
    /// Convert into a [CelllibBuilder] for further modification.
    /// The edited library is re-frozen with [CelllibBuilder::build].
    pub fn into_builder(self) -> CelllibBuilder {
        CelllibBuilder { lib: self }
    }
}

///
/// # Cell Library Builder
///
/// The mutable, load-phase (and engineering-change-phase) form of a [Celllib].
/// Entities are inserted only once fully constructed.
/// Re-inserting an existing name replaces the earlier definition, in its original position.
///
#[derive(Clone, Debug)]
pub struct CelllibBuilder {
    lib: Celllib,
}
impl CelllibBuilder {
    /// Create a new, empty builder for library `name` at corner `split`
    pub fn new(name: impl Into<String>, split: Split) -> Self {
        Self {
            lib: Celllib {
                name: name.into(),
                split,
                delay_model: None,
                defaults: LibDefaults::default(),
                lut_templates: IndexMap::new(),
                cells: IndexMap::new(),
            },
        }
    }
    /// Set the library name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.lib.name = name.into();
    }
    /// Set the delay model
    pub fn set_delay_model(&mut self, model: DelayModel) {
        self.lib.delay_model = Some(model);
    }
    /// Mutable access to the library-level defaults
    pub fn defaults_mut(&mut self) -> &mut LibDefaults {
        &mut self.lib.defaults
    }
    /// Insert [LutTemplate] `t`. Returns the definition it replaced, if any.
    pub fn insert_lut_template(&mut self, t: LutTemplate) -> Option<LutTemplate> {
        self.lib.lut_templates.insert(t.name.clone(), t)
    }
    /// Insert [Cell] `c`. Returns the definition it replaced, if any.
    pub fn insert_cell(&mut self, c: Cell) -> Option<Cell> {
        self.lib.cells.insert(c.name.clone(), c)
    }
    /// Remove the [Cell] named `name`, preserving the order of those remaining
    pub fn remove_cell(&mut self, name: &str) -> Option<Cell> {
        self.lib.cells.shift_remove(name)
    }
    /// Get the [LutTemplate] named `name`, if defined
    pub fn lut_template(&self, name: &str) -> Option<&LutTemplate> {
        self.lib.lut_templates.get(name)
    }
    /// Get a mutable reference to the [LutTemplate] named `name`, if defined
    pub fn lut_template_mut(&mut self, name: &str) -> Option<&mut LutTemplate> {
        self.lib.lut_templates.get_mut(name)
    }
    /// Get the [Cell] named `name`, if defined
    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.lib.cells.get(name)
    }
    /// Get a mutable reference to the [Cell] named `name`, if defined
    pub fn cell_mut(&mut self, name: &str) -> Option<&mut Cell> {
        self.lib.cells.get_mut(name)
    }
    /// Fill unset pin and cell attributes from the library-level defaults.
    ///
    /// Only attributes without an explicit value are touched, so repeated application is a no-op.
    pub fn apply_default_values(&mut self) {
        let defaults = self.lib.defaults.clone();
        for cell in self.lib.cells.values_mut() {
            if cell.leakage_power.is_none() {
                cell.leakage_power = defaults.default_cell_leakage_power;
            }
            for pin in cell.pins.values_mut() {
                let (cap, fanout_load, max_fanout, max_transition) = match pin.direction {
                    Some(PinDirection::Input) => (
                        defaults.default_input_pin_cap,
                        defaults.default_fanout_load,
                        None,
                        None,
                    ),
                    Some(PinDirection::Output) => (
                        defaults.default_output_pin_cap,
                        None,
                        defaults.default_max_fanout,
                        defaults.default_max_transition,
                    ),
                    Some(PinDirection::Inout) => (
                        defaults.default_inout_pin_cap,
                        defaults.default_fanout_load,
                        defaults.default_max_fanout,
                        defaults.default_max_transition,
                    ),
                    Some(PinDirection::Internal) | None => (None, None, None, None),
                };
                if pin.capacitance.is_none() {
                    pin.capacitance = cap;
                }
                if pin.fanout_load.is_none() {
                    pin.fanout_load = fanout_load;
                }
                if pin.max_fanout.is_none() {
                    pin.max_fanout = max_fanout;
                }
                if pin.max_transition.is_none() {
                    pin.max_transition = max_transition;
                }
            }
        }
    }
    /// Resolve default values, and freeze into a read-only [Celllib]
    pub fn build(mut self) -> Celllib {
        self.apply_default_values();
        self.lib
    }
}

/// # Library-Level Default Values
///
/// Applied to pins and cells which do not set the same attribute themselves.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct LibDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cell_leakage_power: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_inout_pin_cap: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_input_pin_cap: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_output_pin_cap: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_fanout_load: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_fanout: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_transition: Option<LibDecimal>,
}
impl LibDefaults {
    /// Each default, paired with the keyword that sets it
    pub fn entries(&self) -> [(LibKey, Option<LibDecimal>); 7] {
        [
            (LibKey::DefaultCellLeakagePower, self.default_cell_leakage_power),
            (LibKey::DefaultInoutPinCap, self.default_inout_pin_cap),
            (LibKey::DefaultInputPinCap, self.default_input_pin_cap),
            (LibKey::DefaultOutputPinCap, self.default_output_pin_cap),
            (LibKey::DefaultFanoutLoad, self.default_fanout_load),
            (LibKey::DefaultMaxFanout, self.default_max_fanout),
            (LibKey::DefaultMaxTransition, self.default_max_transition),
        ]
    }
    /// Mutable access to the default set by `key`, if `key` is a `default_*` keyword
    pub fn get_mut(&mut self, key: LibKey) -> Option<&mut Option<LibDecimal>> {
        match key {
            LibKey::DefaultCellLeakagePower => Some(&mut self.default_cell_leakage_power),
            LibKey::DefaultInoutPinCap => Some(&mut self.default_inout_pin_cap),
            LibKey::DefaultInputPinCap => Some(&mut self.default_input_pin_cap),
            LibKey::DefaultOutputPinCap => Some(&mut self.default_output_pin_cap),
            LibKey::DefaultFanoutLoad => Some(&mut self.default_fanout_load),
            LibKey::DefaultMaxFanout => Some(&mut self.default_max_fanout),
            LibKey::DefaultMaxTransition => Some(&mut self.default_max_transition),
            _ => None,
        }
    }
}

/// # Lookup-Table Template
///
/// A named axis schema shared by many [Lut]s: an ordered list of variables,
/// and optionally the default index values of each axis.
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct LutTemplate {
    /// Template Name
    pub name: String,
    /// Axis Variables, `variable_1` first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub variables: Vec<LutVar>,
    /// Per-Axis Default Indices, `index_1` first.
    /// May be shorter than `variables`, in which case tables must supply the remainder.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub indices: Vec<Vec<LibDecimal>>,
}
impl LutTemplate {
    /// Create a new and empty [LutTemplate] named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Number of table axes
    pub fn num_axes(&self) -> usize {
        self.variables.len()
    }
}

/// # Lookup Table
///
/// One characterized table: a template reference, its resolved per-axis indices,
/// and the row-major flattened values.
/// The length of `values` always equals the product of the axis lengths,
/// which for the zero-axis `scalar` table is one.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Lut {
    /// Template Name
    pub template: String,
    /// Axis Variables, copied from the template
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<LutVar>,
    /// Resolved Axis Indices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<Vec<LibDecimal>>,
    /// Table Values, row-major
    pub values: Vec<LibDecimal>,
}
impl Lut {
    /// Name of Liberty's built-in zero-axis template
    pub const SCALAR: &'static str = "scalar";

    /// Create a scalar [Lut] of value `val`
    pub fn scalar(val: impl Into<LibDecimal>) -> Self {
        Self {
            template: Self::SCALAR.into(),
            variables: Vec::new(),
            indices: Vec::new(),
            values: vec![val.into()],
        }
    }
    /// Boolean indication of a zero-axis table
    pub fn is_scalar(&self) -> bool {
        self.indices.is_empty()
    }
    /// Number of table axes
    pub fn num_axes(&self) -> usize {
        self.indices.len()
    }
    /// Per-axis lengths
    pub fn shape(&self) -> Vec<usize> {
        self.indices.iter().map(Vec::len).collect()
    }
    /// Number of values implied by the axis lengths
    pub fn expected_len(&self) -> usize {
        self.indices.iter().map(Vec::len).product()
    }
    /// Boolean indication of whether `values` agrees with the axis lengths
    pub fn is_consistent(&self) -> bool {
        self.values.len() == self.expected_len()
    }
}

/// # Cell Definition
///
/// One gate variant: its area, leakage, and pins.
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct Cell {
    /// Cell Name
    pub name: String,
    /// Pins, keyed by name, in definition order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[builder(default)]
    pub pins: IndexMap<String, Cellpin>,

    // Optional
    /// Area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub area: Option<LibDecimal>,
    /// Leakage Power, `cell_leakage_power`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub leakage_power: Option<LibDecimal>,
    /// Footprint class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub footprint: Option<String>,
}
impl Cell {
    /// Create a new and initially empty [Cell] with name `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Get the [Cellpin] named `name`, if defined
    pub fn pin(&self, name: &str) -> Option<&Cellpin> {
        self.pins.get(name)
    }
    /// Get a mutable reference to the [Cellpin] named `name`, if defined
    pub fn pin_mut(&mut self, name: &str) -> Option<&mut Cellpin> {
        self.pins.get_mut(name)
    }
    /// Add [Cellpin] `pin`. Returns the definition it replaced, if any.
    pub fn add_pin(&mut self, pin: Cellpin) -> Option<Cellpin> {
        self.pins.insert(pin.name.clone(), pin)
    }
    /// Iterate over all [Cellpin]s, in definition order
    pub fn pins(&self) -> impl Iterator<Item = &Cellpin> {
        self.pins.values()
    }
}

/// # Cell Pin
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into), derive(Clone))]
pub struct Cellpin {
    /// Pin Name
    pub name: String,
    /// Timing Arcs, in definition order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub timings: Vec<Timing>,

    // Optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub direction: Option<PinDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub capacitance: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub rise_capacitance: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub fall_capacitance: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub max_capacitance: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub min_capacitance: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub max_transition: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub min_transition: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub fanout_load: Option<LibDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub max_fanout: Option<LibDecimal>,
    /// Clock Pin Indicator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub is_clock: Option<bool>,
    /// Boolean Function, as written in the library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub function: Option<String>,
}
impl Cellpin {
    /// Create a new and initially empty [Cellpin] with name `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Iterate over the [Timing] arcs related to pin `related`, in definition order
    pub fn timings_from<'a>(&'a self, related: &'a str) -> impl Iterator<Item = &'a Timing> + 'a {
        self.timings.iter().filter(move |t| t.related_pin == related)
    }
    /// Boolean indication of whether the pin can drive, i.e. is an output or inout
    pub fn is_output_capable(&self) -> bool {
        matches!(
            self.direction,
            Some(PinDirection::Output) | Some(PinDirection::Inout)
        )
    }
}

/// # Timing Arc
///
/// The delay, slew, or constraint relationship from `related_pin` into the enclosing pin.
/// Each table is characterized for the library's corner (`split`),
/// and is addressable by [LutKey] through [Timing::lut].
#[derive(Clone, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct Timing {
    /// Related (Input) Pin Name
    pub related_pin: String,
    /// Corner
    pub split: Split,

    // Optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub sense: Option<TimingSense>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub timing_type: Option<TimingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub cell_rise: Option<Lut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub cell_fall: Option<Lut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub rise_transition: Option<Lut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub fall_transition: Option<Lut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub rise_constraint: Option<Lut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub fall_constraint: Option<Lut>,
}
impl Timing {
    /// Create a new [Timing] from `related_pin`, at corner `split`, with no tables
    pub fn new(related_pin: impl Into<String>, split: Split) -> Self {
        Self {
            related_pin: related_pin.into(),
            split,
            sense: None,
            timing_type: None,
            cell_rise: None,
            cell_fall: None,
            rise_transition: None,
            fall_transition: None,
            rise_constraint: None,
            fall_constraint: None,
        }
    }
    /// Get the [Lut] at `key`, if characterized.
    /// Keys for a corner other than our own are never characterized.
    pub fn lut(&self, key: LutKey) -> Option<&Lut> {
        if key.split != self.split {
            return None;
        }
        self.slot(key.tran, key.kind).as_ref()
    }
    /// Set the [Lut] for (`tran`, `kind`) at our own corner. Returns the table it replaced, if any.
    pub fn set_lut(&mut self, tran: Tran, kind: ArcKind, lut: Lut) -> Option<Lut> {
        self.slot_mut(tran, kind).replace(lut)
    }
    /// All characterized tables and their keys, in (kind, transition) order
    pub fn luts(&self) -> Vec<(LutKey, &Lut)> {
        let mut rv = Vec::new();
        for kind in [ArcKind::Delay, ArcKind::Slew, ArcKind::Constraint] {
            for tran in [Tran::Rise, Tran::Fall] {
                if let Some(lut) = self.slot(tran, kind) {
                    let key = LutKey::new(self.split, tran, kind);
                    rv.push((key, lut));
                }
            }
        }
        rv
    }
    fn slot(&self, tran: Tran, kind: ArcKind) -> &Option<Lut> {
        match (kind, tran) {
            (ArcKind::Delay, Tran::Rise) => &self.cell_rise,
            (ArcKind::Delay, Tran::Fall) => &self.cell_fall,
            (ArcKind::Slew, Tran::Rise) => &self.rise_transition,
            (ArcKind::Slew, Tran::Fall) => &self.fall_transition,
            (ArcKind::Constraint, Tran::Rise) => &self.rise_constraint,
            (ArcKind::Constraint, Tran::Fall) => &self.fall_constraint,
        }
    }
    fn slot_mut(&mut self, tran: Tran, kind: ArcKind) -> &mut Option<Lut> {
        match (kind, tran) {
            (ArcKind::Delay, Tran::Rise) => &mut self.cell_rise,
            (ArcKind::Delay, Tran::Fall) => &mut self.cell_fall,
            (ArcKind::Slew, Tran::Rise) => &mut self.rise_transition,
            (ArcKind::Slew, Tran::Fall) => &mut self.fall_transition,
            (ArcKind::Constraint, Tran::Rise) => &mut self.rise_constraint,
            (ArcKind::Constraint, Tran::Fall) => &mut self.fall_constraint,
        }
    }
    /// Boolean indication of a combinational arc. An unspecified type is combinational.
    pub fn is_combinational(&self) -> bool {
        use TimingType::*;
        matches!(
            self.timing_type,
            None | Some(Combinational) | Some(CombinationalRise) | Some(CombinationalFall)
        )
    }
    /// Boolean indication of a timing-check (setup, hold, and the like) arc
    pub fn is_constraint(&self) -> bool {
        use TimingType::*;
        matches!(
            self.timing_type,
            Some(SetupRising)
                | Some(SetupFalling)
                | Some(HoldRising)
                | Some(HoldFalling)
                | Some(RecoveryRising)
                | Some(RecoveryFalling)
                | Some(RemovalRising)
                | Some(RemovalFalling)
                | Some(SkewRising)
                | Some(SkewFalling)
                | Some(NonSeqSetupRising)
                | Some(NonSeqSetupFalling)
                | Some(NonSeqHoldRising)
                | Some(NonSeqHoldFalling)
                | Some(NochangeHighHigh)
                | Some(NochangeHighLow)
                | Some(NochangeLowHigh)
                | Some(NochangeLowLow)
        )
    }
    /// Boolean indication of an arc triggered by the rising edge of its related pin
    pub fn is_rising_edge_triggered(&self) -> bool {
        use TimingType::*;
        matches!(
            self.timing_type,
            Some(RisingEdge)
                | Some(SetupRising)
                | Some(HoldRising)
                | Some(RecoveryRising)
                | Some(RemovalRising)
                | Some(SkewRising)
                | Some(NonSeqSetupRising)
                | Some(NonSeqHoldRising)
        )
    }
    /// Boolean indication of an arc triggered by the falling edge of its related pin
    pub fn is_falling_edge_triggered(&self) -> bool {
        use TimingType::*;
        matches!(
            self.timing_type,
            Some(FallingEdge)
                | Some(SetupFalling)
                | Some(HoldFalling)
                | Some(RecoveryFalling)
                | Some(RemovalFalling)
                | Some(SkewFalling)
                | Some(NonSeqSetupFalling)
                | Some(NonSeqHoldFalling)
        )
    }
    /// Boolean indication of whether an `input` transition on the related pin
    /// can produce an `output` transition on ours.
    ///
    /// Edge-triggered arcs follow the triggering edge; all others follow the timing sense.
    pub fn is_transition_defined(&self, input: Tran, output: Tran) -> bool {
        if self.is_rising_edge_triggered() {
            return input == Tran::Rise;
        }
        if self.is_falling_edge_triggered() {
            return input == Tran::Fall;
        }
        match self.sense {
            Some(TimingSense::PositiveUnate) => input == output,
            Some(TimingSense::NegativeUnate) => input != output,
            Some(TimingSense::NonUnate) | None => true,
        }
    }
}

/// # Lookup-Table Key
///
/// Addresses one table of a [Timing] arc: corner, output transition, and arc kind.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct LutKey {
    pub split: Split,
    pub tran: Tran,
    pub kind: ArcKind,
}
impl LutKey {
    /// Create a new [LutKey]
    pub fn new(split: Split, tran: Tran, kind: ArcKind) -> Self {
        Self { split, tran, kind }
    }
}

enumstr!(
    /// # Analysis Corner ("Split")
    /// Early (min) or late (max) characterization.
    Split {
        Early: "early",
        Late: "late",
    }
);
enumstr!(
    /// # Signal Transition
    Tran {
        Rise: "rise",
        Fall: "fall",
    }
);
enumstr!(
    /// # Timing-Arc Table Kinds
    ArcKind {
        Delay: "delay",
        Slew: "slew",
        Constraint: "constraint",
    }
);
enumstr!(
    /// # Delay Models
    DelayModel {
        GenericCmos: "generic_cmos",
        TableLookup: "table_lookup",
        Cmos2: "cmos2",
        PiecewiseCmos: "piecewise_cmos",
        Dcm: "dcm",
        Polynomial: "polynomial",
    }
);
enumstr!(
    /// # Pin Directions
    PinDirection {
        Input: "input",
        Output: "output",
        Inout: "inout",
        Internal: "internal",
    }
);
enumstr!(
    /// # Timing Sense
    /// Relationship between the transition directions of an arc's input and output.
    TimingSense {
        PositiveUnate: "positive_unate",
        NegativeUnate: "negative_unate",
        NonUnate: "non_unate",
    }
);
enumstr!(
    /// # Timing Types
    TimingType {
        Combinational: "combinational",
        CombinationalRise: "combinational_rise",
        CombinationalFall: "combinational_fall",
        ThreeStateDisable: "three_state_disable",
        ThreeStateDisableRise: "three_state_disable_rise",
        ThreeStateDisableFall: "three_state_disable_fall",
        ThreeStateEnable: "three_state_enable",
        ThreeStateEnableRise: "three_state_enable_rise",
        ThreeStateEnableFall: "three_state_enable_fall",
        RisingEdge: "rising_edge",
        FallingEdge: "falling_edge",
        Preset: "preset",
        Clear: "clear",
        HoldRising: "hold_rising",
        HoldFalling: "hold_falling",
        SetupRising: "setup_rising",
        SetupFalling: "setup_falling",
        RecoveryRising: "recovery_rising",
        RecoveryFalling: "recovery_falling",
        SkewRising: "skew_rising",
        SkewFalling: "skew_falling",
        RemovalRising: "removal_rising",
        RemovalFalling: "removal_falling",
        MinPulseWidth: "min_pulse_width",
        MinimumPeriod: "minimum_period",
        MaxClockTreePath: "max_clock_tree_path",
        MinClockTreePath: "min_clock_tree_path",
        NonSeqSetupRising: "non_seq_setup_rising",
        NonSeqSetupFalling: "non_seq_setup_falling",
        NonSeqHoldRising: "non_seq_hold_rising",
        NonSeqHoldFalling: "non_seq_hold_falling",
        NochangeHighHigh: "nochange_high_high",
        NochangeHighLow: "nochange_high_low",
        NochangeLowHigh: "nochange_low_high",
        NochangeLowLow: "nochange_low_low",
    }
);
enumstr!(
    /// # Lookup-Table Variables
    /// The physical quantity indexing each table axis.
    LutVar {
        TotalOutputNetCapacitance: "total_output_net_capacitance",
        InputNetTransition: "input_net_transition",
        ConstrainedPinTransition: "constrained_pin_transition",
        RelatedPinTransition: "related_pin_transition",
        InputTransitionTime: "input_transition_time",
        OutputNetLength: "output_net_length",
        OutputNetWireCap: "output_net_wire_cap",
        OutputNetPinCap: "output_net_pin_cap",
        RelatedOutTotalOutputNetCapacitance: "related_out_total_output_net_capacitance",
    }
);
impl LutVar {
    /// Boolean indication of a transition-time (slew) variable
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            Self::InputNetTransition
                | Self::ConstrainedPinTransition
                | Self::RelatedPinTransition
                | Self::InputTransitionTime
        )
    }
    /// Boolean indication of a capacitance (load) variable
    pub fn is_capacitance(&self) -> bool {
        matches!(
            self,
            Self::TotalOutputNetCapacitance
                | Self::OutputNetWireCap
                | Self::OutputNetPinCap
                | Self::RelatedOutTotalOutputNetCapacitance
        )
    }
}

enumstr!(
    /// # Liberty Key(Word)s
    ///
    /// Enumerated keywords used in Liberty parsing and generation.
    ///
    /// As in most attribute-and-group formats, these are not reserved words:
    /// their meaning depends on the enclosing group, and a cell is free to name a pin `timing`.
    /// Keys are written in the conventional lower-case form, and parsed per the reader's [crate::utils::KeyCase].
    ///
    LibKey {
        // Groups
        Library: "library",
        LuTableTemplate: "lu_table_template",
        Cell: "cell",
        Pin: "pin",
        Timing: "timing",

        // Library attributes
        DelayModel: "delay_model",
        DefaultCellLeakagePower: "default_cell_leakage_power",
        DefaultInoutPinCap: "default_inout_pin_cap",
        DefaultInputPinCap: "default_input_pin_cap",
        DefaultOutputPinCap: "default_output_pin_cap",
        DefaultFanoutLoad: "default_fanout_load",
        DefaultMaxFanout: "default_max_fanout",
        DefaultMaxTransition: "default_max_transition",
        TimeUnit: "time_unit",
        CapacitiveLoadUnit: "capacitive_load_unit",
        LeakagePowerUnit: "leakage_power_unit",
        VoltageUnit: "voltage_unit",
        CurrentUnit: "current_unit",
        PullingResistanceUnit: "pulling_resistance_unit",

        // Table attributes
        Variable1: "variable_1",
        Variable2: "variable_2",
        Variable3: "variable_3",
        Index1: "index_1",
        Index2: "index_2",
        Index3: "index_3",
        Values: "values",

        // Cell attributes
        Area: "area",
        CellLeakagePower: "cell_leakage_power",
        CellFootprint: "cell_footprint",

        // Pin attributes
        Direction: "direction",
        Capacitance: "capacitance",
        RiseCapacitance: "rise_capacitance",
        FallCapacitance: "fall_capacitance",
        MaxCapacitance: "max_capacitance",
        MinCapacitance: "min_capacitance",
        MaxTransition: "max_transition",
        MinTransition: "min_transition",
        FanoutLoad: "fanout_load",
        MaxFanout: "max_fanout",
        Clock: "clock",
        Function: "function",

        // Timing attributes and tables
        RelatedPin: "related_pin",
        TimingSense: "timing_sense",
        TimingType: "timing_type",
        CellRise: "cell_rise",
        CellFall: "cell_fall",
        RiseTransition: "rise_transition",
        FallTransition: "fall_transition",
        RiseConstraint: "rise_constraint",
        FallConstraint: "fall_constraint",
    }
);
impl LibKey {
    /// Index into table axes (zero-based) of the `index_N` and `variable_N` keys
    pub fn axis(&self) -> Option<usize> {
        match self {
            Self::Index1 | Self::Variable1 => Some(0),
            Self::Index2 | Self::Variable2 => Some(1),
            Self::Index3 | Self::Variable3 => Some(2),
            _ => None,
        }
    }
    /// The (transition, kind) pair of the [Timing] table keys, e.g. `cell_rise`
    pub fn timing_table(&self) -> Option<(Tran, ArcKind)> {
        match self {
            Self::CellRise => Some((Tran::Rise, ArcKind::Delay)),
            Self::CellFall => Some((Tran::Fall, ArcKind::Delay)),
            Self::RiseTransition => Some((Tran::Rise, ArcKind::Slew)),
            Self::FallTransition => Some((Tran::Fall, ArcKind::Slew)),
            Self::RiseConstraint => Some((Tran::Rise, ArcKind::Constraint)),
            Self::FallConstraint => Some((Tran::Fall, ArcKind::Constraint)),
            _ => None,
        }
    }
}
/// The keyword naming the [Timing] table at (`tran`, `kind`)
pub(crate) fn timing_table_key(tran: Tran, kind: ArcKind) -> LibKey {
    match (kind, tran) {
        (ArcKind::Delay, Tran::Rise) => LibKey::CellRise,
        (ArcKind::Delay, Tran::Fall) => LibKey::CellFall,
        (ArcKind::Slew, Tran::Rise) => LibKey::RiseTransition,
        (ArcKind::Slew, Tran::Fall) => LibKey::FallTransition,
        (ArcKind::Constraint, Tran::Rise) => LibKey::RiseConstraint,
        (ArcKind::Constraint, Tran::Fall) => LibKey::FallConstraint,
    }
}

// Implement the serialization to/from file trait for libraries and cells
impl crate::utils::SerdeFile for Celllib {}
impl crate::utils::SerdeFile for Cell {}
