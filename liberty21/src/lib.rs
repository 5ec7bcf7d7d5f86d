//!
//! # Liberty21 Cell-Timing Library Parser & Writer
//!
//! Reads Liberty-format (`.lib`) cell libraries into a typed, queryable [Celllib]:
//! table templates, cells, pins, timing arcs and their lookup tables,
//! with library-level default values resolved once, after the whole file is read.
//!
//! A [Celllib] is produced by one read per analysis corner ([Split]),
//! and is read-only thereafter. It is `Send + Sync`, and can be shared among any number of
//! timing-propagation workers without locks. Edits go through [CelllibBuilder].
//!
//! ```no_run
//! use liberty21::{Celllib, Split};
//!
//! let lib = Celllib::open("my_typ.lib", Split::Late).unwrap();
//! let inv = lib.cell("INV_X1").unwrap();
//! let zn = inv.pin("ZN").unwrap();
//! for arc in zn.timings_from("A") {
//!     println!("{:?}", arc.sense);
//! }
//! ```
//!

// Re-exports
pub use liberty21utils as utils;

// Modules
mod data;
pub use data::*;
mod error;
pub use error::*;
mod interp;
pub mod lex;
pub mod read;
pub use read::{
    parse_file, parse_str, parse_str_with_diagnostics, read_with_diagnostics, Diagnostic,
    DiagnosticKind, LoadReport, ReadOptions, ReadOptionsBuilder,
};
pub mod units;
pub mod write;
