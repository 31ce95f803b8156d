//! The closed argument value model.
//!
//! Every coerced command argument is a [`Value`], whichever contract the
//! command targets. Each variant holds its raw datum and renders a canonical
//! string through `Display`. The rendering re-parses to the same fragment
//! shape, so values can be written back into scenario text.
//!
//! Coercion is pure: the same fragment always yields the same value or the
//! same [`TypeMismatch`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::command::{Fragment, write_list, write_quoted, write_text};
use crate::number::{Number, NumberError};

/// The kinds of [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// A 20-byte account or contract address.
    Address,
    /// Free-form text.
    Str,
    /// An exact decimal number.
    Number,
    /// A boolean flag.
    Bool,
    /// An ordered list of values.
    List,
    /// A record of named values.
    Struct,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Address => "Address",
            Self::Str => "String",
            Self::Number => "Number",
            Self::Bool => "Bool",
            Self::List => "List",
            Self::Struct => "Struct",
        };
        f.write_str(name)
    }
}

/// Why a fragment did not coerce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    /// The fragment is not written as the requested kind.
    WrongKind,
    /// The fragment has the right syntax but a value the kind cannot hold.
    OutOfRange,
}

/// A fragment could not be interpreted as the requested kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    /// The kind the fragment was coerced to.
    pub expected: ValueKind,
    /// Canonical rendering of the offending fragment.
    pub fragment: String,
    /// What was wrong with it.
    pub reason: MismatchReason,
}

impl TypeMismatch {
    /// Build a mismatch for `fragment`.
    pub fn new(expected: ValueKind, fragment: &Fragment) -> Self {
        Self {
            expected,
            fragment: fragment.to_string(),
            reason: MismatchReason::WrongKind,
        }
    }

    /// Build a mismatch for a well-formed `fragment` whose value is out of range.
    pub fn out_of_range(expected: ValueKind, fragment: &Fragment) -> Self {
        Self {
            reason: MismatchReason::OutOfRange,
            ..Self::new(expected, fragment)
        }
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            MismatchReason::WrongKind => {
                write!(f, "expected {}, found `{}`", self.expected, self.fragment)
            }
            MismatchReason::OutOfRange => {
                write!(f, "{} `{}` is out of range", self.expected, self.fragment)
            }
        }
    }
}

impl std::error::Error for TypeMismatch {}

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// An address.
    Address(Address),
    /// A string.
    Str(String),
    /// An exact decimal number.
    Number(Number),
    /// A boolean.
    Bool(bool),
    /// A list of values.
    List(Vec<Value>),
    /// A record of named values.
    Struct(BTreeMap<String, Value>),
}

impl Value {
    /// The kind of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Address(_) => ValueKind::Address,
            Self::Str(_) => ValueKind::Str,
            Self::Number(_) => ValueKind::Number,
            Self::Bool(_) => ValueKind::Bool,
            Self::List(_) => ValueKind::List,
            Self::Struct(_) => ValueKind::Struct,
        }
    }

    /// The address, if this is an address value.
    pub const fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(address) => Some(*address),
            _ => None,
        }
    }

    /// The text, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    /// The number, if this is a number value.
    pub const fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// The flag, if this is a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// The items, if this is a list value.
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The fields, if this is a struct value.
    pub const fn as_struct(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Interpret a fragment without a declared kind.
    ///
    /// Words are tried as bool, number, then address, falling back to a
    /// string. Quoted text is always a string and lists recurse.
    pub fn infer(fragment: &Fragment) -> Self {
        match fragment {
            Fragment::Word(word) => parse_bool(word)
                .map(Self::Bool)
                .or_else(|| parse_number(word).map(Self::Number))
                .or_else(|| parse_address(word).map(Self::Address))
                .unwrap_or_else(|| Self::Str(word.clone())),
            Fragment::Quoted(text) => Self::Str(text.clone()),
            Fragment::List(items) => Self::List(items.iter().map(Self::infer).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address:#x}"),
            Self::Str(text) => write_str_value(f, text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::List(items) => write_list(f, items),
            Self::Struct(fields) => {
                let pairs: Vec<Field<'_>> = fields.iter().map(|(k, v)| Field(k, v)).collect();
                write_list(f, &pairs)
            }
        }
    }
}

/// Write text bare only when it would re-parse as the same string.
fn write_str_value(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if matches!(Value::infer(&Fragment::word(text)), Value::Str(_)) {
        write_text(f, text)
    } else {
        write_quoted(f, text)
    }
}

/// One `(key value)` pair of a rendered struct.
struct Field<'a>(&'a str, &'a Value);

impl fmt::Display for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_text(f, self.0)?;
        write!(f, " {})", self.1)
    }
}

impl From<Address> for Value {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        Self::Number(number)
    }
}

impl From<Decimal> for Value {
    fn from(number: Decimal) -> Self {
        Self::Number(number.into())
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Str(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Str(text)
    }
}

fn parse_bool(word: &str) -> Option<bool> {
    if word.eq_ignore_ascii_case("true") {
        Some(true)
    } else if word.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_number(word: &str) -> Option<Number> {
    Number::from_str(word).ok()
}

fn parse_address(word: &str) -> Option<Address> {
    Address::from_str(word).ok()
}

/// Coerce a fragment to the given kind.
pub fn coerce(kind: ValueKind, fragment: &Fragment) -> Result<Value, TypeMismatch> {
    match kind {
        ValueKind::Address => coerce_address(fragment),
        ValueKind::Str => coerce_string(fragment),
        ValueKind::Number => coerce_number(fragment),
        ValueKind::Bool => coerce_bool(fragment),
        ValueKind::List => coerce_list(fragment),
        ValueKind::Struct => coerce_struct(fragment),
    }
}

/// Coerce a bare hex word to an address.
pub fn coerce_address(fragment: &Fragment) -> Result<Value, TypeMismatch> {
    fragment
        .as_word()
        .and_then(parse_address)
        .map(Value::Address)
        .ok_or_else(|| TypeMismatch::new(ValueKind::Address, fragment))
}

/// Coerce a word or quoted string to a string.
pub fn coerce_string(fragment: &Fragment) -> Result<Value, TypeMismatch> {
    match fragment {
        Fragment::Word(text) | Fragment::Quoted(text) => Ok(Value::Str(text.clone())),
        Fragment::List(_) => Err(TypeMismatch::new(ValueKind::Str, fragment)),
    }
}

/// Coerce a decimal or scientific-notation word to a number.
///
/// A well-formed literal that does not fit reports
/// [`MismatchReason::OutOfRange`].
pub fn coerce_number(fragment: &Fragment) -> Result<Value, TypeMismatch> {
    let word = fragment
        .as_word()
        .ok_or_else(|| TypeMismatch::new(ValueKind::Number, fragment))?;
    match Number::from_str(word) {
        Ok(number) => Ok(Value::Number(number)),
        Err(NumberError::OutOfRange(_)) => Err(TypeMismatch::out_of_range(ValueKind::Number, fragment)),
        Err(NumberError::Malformed(_)) => Err(TypeMismatch::new(ValueKind::Number, fragment)),
    }
}

/// Coerce `true` or `false` (any case) to a boolean.
pub fn coerce_bool(fragment: &Fragment) -> Result<Value, TypeMismatch> {
    fragment
        .as_word()
        .and_then(parse_bool)
        .map(Value::Bool)
        .ok_or_else(|| TypeMismatch::new(ValueKind::Bool, fragment))
}

/// Coerce a list fragment, inferring each element.
pub fn coerce_list(fragment: &Fragment) -> Result<Value, TypeMismatch> {
    match fragment {
        Fragment::List(items) => Ok(Value::List(items.iter().map(Value::infer).collect())),
        Fragment::Word(_) | Fragment::Quoted(_) => Err(TypeMismatch::new(ValueKind::List, fragment)),
    }
}

/// Coerce a list fragment whose elements must all be of `kind`.
///
/// A bad element reports that element's mismatch.
pub fn coerce_list_of(kind: ValueKind, fragment: &Fragment) -> Result<Value, TypeMismatch> {
    let Fragment::List(items) = fragment else {
        return Err(TypeMismatch::new(ValueKind::List, fragment));
    };
    items
        .iter()
        .map(|item| coerce(kind, item))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

/// Coerce a list of `(key value)` pairs to a struct.
///
/// Keys must be words or quoted strings and unique; values are inferred.
pub fn coerce_struct(fragment: &Fragment) -> Result<Value, TypeMismatch> {
    let mismatch = || TypeMismatch::new(ValueKind::Struct, fragment);
    let Fragment::List(items) = fragment else {
        return Err(mismatch());
    };

    let mut fields = BTreeMap::new();
    for item in items {
        let Fragment::List(pair) = item else {
            return Err(mismatch());
        };
        let [key, value] = pair.as_slice() else {
            return Err(mismatch());
        };
        let (Fragment::Word(key) | Fragment::Quoted(key)) = key else {
            return Err(mismatch());
        };
        if fields.insert(key.clone(), Value::infer(value)).is_some() {
            return Err(mismatch());
        }
    }
    Ok(Value::Struct(fields))
}
