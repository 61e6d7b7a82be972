//! Type-enforcing properties.
//!
//! A [`Property`] has a declared [`PropertyKind`] and stores a
//! [`PropertyValue`] that always matches that kind (or is unset). Incoming
//! loosely typed [`Value`]s are coerced on [`Property::set`], and a bad
//! coercion is reported as a [`ValidatorError`] without touching the stored
//! value.
//!
//! ```rust
//! use burger::validators::{Property, PropertyValue};
//!
//! let mut debug = Property::boolean("debug");
//! debug.set("FALSE").unwrap();
//! assert_eq!(debug.value(), &PropertyValue::Bool(false));
//! assert!(debug.set("skldjsk").is_err());
//! ```

use crate::strutils::string_to_bool;
use std::fmt;

/// Loosely typed input accepted by [`Property::set`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

/// Renders the way the build scripts print values: `True`, `0.0`, `[1, 2]`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&float_repr(*x)),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

fn float_repr(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:?}", x)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v.into())
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::Int(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i128)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

/// Coercion failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorError {
    /// Can't be read as a boolean
    NotABool(String),
    /// Can't be read as a number
    NotANumber(String),
    /// Outside of the signed 64 bit range
    OutOfRange(String),
    /// Negative enumeration index
    NegativeIndex(String),
    /// Enumeration index past the end of the table
    IndexTooLarge { value: String, len: usize },
    /// No entry in the enumeration table matches
    NotInEnum { value: String, entries: String },
    /// A `None` property was given a value
    OnlyNone { name: String, value: String },
}

impl fmt::Display for ValidatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorError::NotABool(v) => write!(f, "Can't convert {} to bool", v),
            ValidatorError::NotANumber(v) => write!(f, "Value \"{}\" is not a number", v),
            ValidatorError::OutOfRange(v) => {
                write!(f, "Value \"{}\" must fit in signed 64 bits", v)
            }
            ValidatorError::NegativeIndex(v) => write!(f, "Value \"{}\" is less than zero", v),
            ValidatorError::IndexTooLarge { value, len } => {
                write!(f, "Value {} is greater than or equal to {}", value, len)
            }
            ValidatorError::NotInEnum { value, entries } => {
                write!(f, "Value \"{}\" is not found in the list \"{}\"", value, entries)
            }
            ValidatorError::OnlyNone { name, value } => {
                write!(f, "\"{}\" can only be set to None, not \"{}\"", name, value)
            }
        }
    }
}

impl std::error::Error for ValidatorError {}

/// One row of an enumeration table: a single name or a group of aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumEntry {
    Scalar(String),
    Group(Vec<String>),
}

impl EnumEntry {
    pub fn group<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumEntry::Group(names.into_iter().map(Into::into).collect())
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            EnumEntry::Scalar(s) => s == value,
            EnumEntry::Group(names) => names.iter().any(|n| n == value),
        }
    }
}

impl From<&str> for EnumEntry {
    fn from(v: &str) -> Self {
        EnumEntry::Scalar(v.to_string())
    }
}

impl fmt::Display for EnumEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumEntry::Scalar(s) => write!(f, "'{}'", s),
            EnumEntry::Group(names) => {
                let parts: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

fn entries_repr(entries: &[EnumEntry]) -> String {
    let parts: Vec<String> = entries.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

/// Declared kind of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Boolean,
    Integer,
    String,
    StringList,
    Enum(Vec<EnumEntry>),
    None,
}

/// Stored, already coerced value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    StrList(Vec<String>),
    Enum(usize),
}

/// A named, type-enforcing slot.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    kind: PropertyKind,
    value: PropertyValue,
    enums_override: Option<Vec<EnumEntry>>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: PropertyValue::None,
            enums_override: None,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Boolean)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Integer)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::String)
    }

    pub fn string_list(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::StringList)
    }

    pub fn enumeration<I, E>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EnumEntry>,
    {
        Self::new(
            name,
            PropertyKind::Enum(entries.into_iter().map(Into::into).collect()),
        )
    }

    pub fn none(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::None)
    }

    /// Builder form of [`Property::set`] for an initial value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Result<Self, ValidatorError> {
        self.set(value)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Replace the enumeration table for this instance only.
    pub fn set_enums_override(&mut self, entries: Option<Vec<EnumEntry>>) {
        self.enums_override = entries;
    }

    /// Coerce and store `value`. The stored value is unchanged on error.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<(), ValidatorError> {
        let value = value.into();
        let coerced = match &self.kind {
            PropertyKind::Boolean => coerce_bool(&value)?,
            PropertyKind::Integer => coerce_int(&value)?,
            PropertyKind::String => coerce_string(value),
            PropertyKind::StringList => coerce_string_list(value),
            PropertyKind::Enum(entries) => {
                let table = self.enums_override.as_deref().unwrap_or(entries);
                coerce_enum(&value, table)?
            }
            PropertyKind::None => {
                if value != Value::None {
                    return Err(ValidatorError::OnlyNone {
                        name: self.name.clone(),
                        value: value.to_string(),
                    });
                }
                PropertyValue::None
            }
        };
        self.value = coerced;
        Ok(())
    }

    /// Forget the stored value.
    pub fn clear(&mut self) {
        self.value = PropertyValue::None;
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            PropertyValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            PropertyValue::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// String list contents, empty when unset.
    pub fn as_str_list(&self) -> &[String] {
        match &self.value {
            PropertyValue::StrList(list) => list,
            _ => &[],
        }
    }

    pub fn as_enum_index(&self) -> Option<usize> {
        match self.value {
            PropertyValue::Enum(i) => Some(i),
            _ => None,
        }
    }
}

fn coerce_bool(value: &Value) -> Result<PropertyValue, ValidatorError> {
    Ok(match value {
        Value::None => PropertyValue::None,
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Int(i) => PropertyValue::Bool(*i != 0),
        Value::Float(x) => PropertyValue::Bool(*x != 0.0),
        Value::Str(s) => PropertyValue::Bool(
            string_to_bool(s).map_err(|_| ValidatorError::NotABool(s.clone()))?,
        ),
        Value::List(_) => return Err(ValidatorError::NotABool(value.to_string())),
    })
}

fn coerce_int(value: &Value) -> Result<PropertyValue, ValidatorError> {
    let wide: i128 = match value {
        Value::None => return Ok(PropertyValue::None),
        Value::Bool(b) => i128::from(*b),
        Value::Int(i) => *i,
        Value::Float(x) => float_to_int(*x, value)?,
        Value::Str(s) => match parse_int_literal(s) {
            Some(i) => i,
            None => {
                let x: f64 = s
                    .trim()
                    .parse()
                    .map_err(|_| ValidatorError::NotANumber(s.clone()))?;
                float_to_int(x, value)?
            }
        },
        Value::List(_) => return Err(ValidatorError::NotANumber(value.to_string())),
    };
    i64::try_from(wide)
        .map(PropertyValue::Int)
        .map_err(|_| ValidatorError::OutOfRange(value.to_string()))
}

fn float_to_int(x: f64, original: &Value) -> Result<i128, ValidatorError> {
    if x.is_nan() {
        return Err(ValidatorError::NotANumber(original.to_string()));
    }
    // Both bounds are exact in f64.
    if x < -9_223_372_036_854_775_808.0 || x >= 9_223_372_036_854_775_808.0 {
        return Err(ValidatorError::OutOfRange(original.to_string()));
    }
    Ok(x.trunc() as i128)
}

/// Parse an integer literal with an optional `0x`, `0o` or `0b` prefix.
///
/// Underscores may separate digits. A decimal literal with a leading zero is
/// rejected unless it is all zeros.
fn parse_int_literal(text: &str) -> Option<i128> {
    let text = text.trim();
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else {
        (10, lower.as_str())
    };
    let digits = digits.strip_prefix('_').filter(|_| radix != 10).unwrap_or(digits);
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__")
    {
        return None;
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if !cleaned.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    if radix == 10 && cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.chars().any(|c| c != '0')
    {
        return None;
    }
    let magnitude = i128::from_str_radix(&cleaned, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn coerce_string(value: Value) -> PropertyValue {
    match value {
        Value::None => PropertyValue::None,
        Value::Str(s) => PropertyValue::Str(s),
        other => PropertyValue::Str(other.to_string()),
    }
}

fn coerce_string_list(value: Value) -> PropertyValue {
    match value {
        Value::None => PropertyValue::StrList(Vec::new()),
        Value::List(items) => {
            PropertyValue::StrList(items.into_iter().map(|i| i.to_string()).collect())
        }
        scalar => PropertyValue::StrList(vec![scalar.to_string()]),
    }
}

fn coerce_enum(value: &Value, entries: &[EnumEntry]) -> Result<PropertyValue, ValidatorError> {
    let index = match value {
        Value::None => return Ok(PropertyValue::None),
        Value::Int(i) => *i,
        Value::Float(x) => float_to_int(*x, value)?,
        Value::Bool(b) => i128::from(*b),
        Value::Str(s) => {
            return entries
                .iter()
                .position(|e| e.matches(s))
                .map(PropertyValue::Enum)
                .ok_or_else(|| ValidatorError::NotInEnum {
                    value: s.clone(),
                    entries: entries_repr(entries),
                });
        }
        other => {
            return Err(ValidatorError::NotInEnum {
                value: other.to_string(),
                entries: entries_repr(entries),
            });
        }
    };
    if index < 0 {
        return Err(ValidatorError::NegativeIndex(value.to_string()));
    }
    if index >= entries.len() as i128 {
        return Err(ValidatorError::IndexTooLarge {
            value: value.to_string(),
            len: entries.len(),
        });
    }
    Ok(PropertyValue::Enum(index as usize))
}

/// Ordered collection of properties owned by one object.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    items: Vec<Property>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property, replacing any existing one with the same name.
    pub fn declare(&mut self, property: Property) {
        match self.items.iter_mut().find(|p| p.name == property.name) {
            Some(slot) => *slot = property,
            None => self.items.push(property),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.items.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.items.iter_mut().find(|p| p.name == name)
    }

    /// Set a declared property. Undeclared names are stored as untyped
    /// strings, so the call never loses data.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ValidatorError> {
        if self.get(name).is_none() {
            self.items.push(Property::string(name));
        }
        match self.get_mut(name) {
            Some(property) => property.set(value),
            None => Ok(()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.items.iter()
    }
}
