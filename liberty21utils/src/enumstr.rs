//!
//! # Enum-String Mapping Module
//!
//! Primarily defines the [enumstr] macro and paired [EnumStr] trait,
//! for pairing an enum with the keyword strings that name its variants in text formats.
//! Liberty is full of these: attribute names, pin directions, timing senses and types,
//! table-variable names, delay models.
//!
//! The [EnumStr] trait defines three central methods:
//! * `to_str(&self) -> &'static str` converts the enum to its string value.
//! * `from_str(&str) -> Option<Self>` does the opposite, matching exactly.
//! * `from_str_nocase(&str) -> Option<Self>` matches ASCII-case-insensitively.
//!
//! And the provided `parse` method picks between the latter two per a [KeyCase] setting.
//!
//! Example:
//!
//! ```rs
//! use liberty21utils::enumstr;
//!
//! enumstr!(
//! /// # Pin Directions
//! Direction {
//!     Input: "input",
//!     Output: "output",
//!  }
//! );
//! ```
//!

// Crates.io
use serde::{Deserialize, Serialize};

///
/// # Keyword Case-Matching Mode
///
/// Liberty keywords are conventionally lower-case, and vendors are not always consistent about it.
/// [KeyCase::Strict] demands exact matches; [KeyCase::Lenient] ignores ASCII case.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, schemars::JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    /// Keywords must match exactly
    Strict,
    /// Keywords match regardless of ASCII case
    #[default]
    Lenient,
}

///
/// # String-Enumeration Trait
///
/// While [EnumStr] can be implemented by any type, its primary intent is
/// for implementation by the [enumstr] macro.
///
pub trait EnumStr: std::marker::Sized {
    fn to_str(&self) -> &'static str;
    fn from_str(txt: &str) -> Option<Self>;
    fn from_str_nocase(txt: &str) -> Option<Self>;

    /// Parse `txt` under case-matching mode `case`
    fn parse(txt: &str, case: KeyCase) -> Option<Self> {
        match case {
            KeyCase::Strict => Self::from_str(txt),
            KeyCase::Lenient => Self::from_str_nocase(txt),
        }
    }
}

///
/// # Enum-String Pairing Macro
///
/// For creating an `enum` which:
/// * (a) Has paired string-values, as commonly arrive in text-format fields.
/// * (b) Automatically implement the [EnumStr] trait for conversions to and from these strings.
/// * (c) Automatically implement [std::fmt::Display] writing the string-values
///
/// All variants are fieldless. Derived implementations include `serde::{Serialize,Deserialize}`,
/// `schemars::JsonSchema`, and `Hash`, so generated enums can sit inside serialized data models and serve as map keys.
/// Invoking crates must depend on `serde` and `schemars`.
///
#[macro_export]
macro_rules! enumstr {
    (   $(#[$meta: meta])*
        $enum_name: ident {
        $( $variant: ident : $strval: literal ),* $(,)?
    }) => {
        $(#[$meta])*
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, ::serde::Deserialize, ::serde::Serialize, ::schemars::JsonSchema, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $( #[doc=$strval]
               #[serde(rename = $strval)]
                $variant ),*
        }
        impl $crate::EnumStr for $enum_name {
            /// Convert a [$enum_name] variant to its paired (static) string value.
            fn to_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $strval),*,
                }
            }
            /// Create a [$enum_name] from one of its string-values.
            /// Returns `None` if input `txt` does not match one of [$enum_name]'s variants.
            /// Note `from_str` is case *sensitive*.
            fn from_str(txt: &str) -> Option<Self> {
                match txt {
                    $( $strval => Some(Self::$variant)),*,
                    _ => None,
                }
            }
            /// Create a [$enum_name] from one of its string-values, ignoring ASCII case.
            fn from_str_nocase(txt: &str) -> Option<Self> {
                $( if txt.eq_ignore_ascii_case($strval) {
                    return Some(Self::$variant);
                } )*
                None
            }
        }
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                let s = match self {
                    $( Self::$variant => $strval),*,
                };
                write!(f, "{}", s)
            }
        }
    }
}
