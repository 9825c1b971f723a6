//! Typed values: conversion from raw argument text at parse time and
//! extraction into field types at bind time.

use std::{any, convert::TryFrom, ffi::OsString, fmt, path::PathBuf, str::FromStr};

use crate::error::ConfigError;

#[derive(Clone)]
pub enum ValueType {
    Text,
    Path,
    Bool,
    Int,
    UInt,
    Float,
    /// One of a fixed set of names, matched case-insensitively.
    Choice(Vec<String>),
    /// Any `FromStr` type; the text is checked while parsing and kept as is.
    Custom { name: String, check: fn(&str) -> Result<(), String> },
}

impl ValueType {
    pub fn choice(names: &[&str]) -> ValueType {
        ValueType::Choice(names.iter().map(|it| it.to_string()).collect())
    }

    pub fn custom<T>() -> ValueType
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let name = any::type_name::<T>();
        let name = name.rsplit("::").next().unwrap_or(name);
        ValueType::Custom { name: name.to_string(), check: check_from_str::<T> }
    }

    /// Human readable description of what the type accepts.
    pub fn describe(&self) -> String {
        match self {
            ValueType::Text => "a string".to_string(),
            ValueType::Path => "a path".to_string(),
            ValueType::Bool => "`true` or `false`".to_string(),
            ValueType::Int => "an integer".to_string(),
            ValueType::UInt => "a non-negative integer".to_string(),
            ValueType::Float => "a number".to_string(),
            ValueType::Choice(names) => {
                let names = names.iter().map(|it| format!("`{}`", it)).collect::<Vec<_>>();
                format!("one of {}", names.join(", "))
            }
            ValueType::Custom { name, .. } => format!("a valid `{}`", name),
        }
    }

    pub fn convert(&self, raw: &str) -> Option<Value> {
        let value = match self {
            ValueType::Text => Value::Text(raw.to_string()),
            ValueType::Path => Value::Path(PathBuf::from(raw)),
            ValueType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return None,
            },
            ValueType::Int => Value::Int(raw.parse().ok()?),
            ValueType::UInt => Value::UInt(raw.parse().ok()?),
            ValueType::Float => Value::Float(raw.parse().ok()?),
            ValueType::Choice(names) => {
                let name = names.iter().find(|it| it.eq_ignore_ascii_case(raw))?;
                Value::Text(name.clone())
            }
            ValueType::Custom { check, .. } => {
                check(raw).ok()?;
                Value::Text(raw.to_string())
            }
        };
        Some(value)
    }
}

fn check_from_str<T>(raw: &str) -> Result<(), String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>().map(drop).map_err(|err| err.to_string())
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Text => f.write_str("Text"),
            ValueType::Path => f.write_str("Path"),
            ValueType::Bool => f.write_str("Bool"),
            ValueType::Int => f.write_str("Int"),
            ValueType::UInt => f.write_str("UInt"),
            ValueType::Float => f.write_str("Float"),
            ValueType::Choice(names) => f.debug_tuple("Choice").field(names).finish(),
            ValueType::Custom { name, .. } => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Path(PathBuf),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(it) => fmt::Display::fmt(it, f),
            Value::Path(it) => fmt::Display::fmt(&it.display(), f),
            Value::Bool(it) => fmt::Display::fmt(it, f),
            Value::Int(it) => fmt::Display::fmt(it, f),
            Value::UInt(it) => fmt::Display::fmt(it, f),
            Value::Float(it) => fmt::Display::fmt(it, f),
        }
    }
}

/// Field types a [`Value`] can be bound to.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, String>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(it) => Ok(it),
            Value::Path(it) => it.into_os_string().into_string().map_err(|it| format!("{:?} is not utf-8", it)),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Path(it) => Ok(it),
            Value::Text(it) => Ok(it.into()),
            other => Err(format!("expected a path, got `{}`", other)),
        }
    }
}

impl FromValue for OsString {
    fn from_value(value: Value) -> Result<Self, String> {
        PathBuf::from_value(value).map(PathBuf::into_os_string)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(it) => Ok(it),
            other => Err(format!("expected a boolean, got `{}`", other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Float(it) => Ok(it),
            Value::Int(it) => Ok(it as f64),
            Value::UInt(it) => Ok(it as f64),
            other => Err(format!("expected a number, got `{}`", other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, String> {
        f64::from_value(value).map(|it| it as f32)
    }
}

macro_rules! from_value_int {
    ($($ty:ty)*) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, String> {
                let res = match &value {
                    Value::Int(it) => <$ty>::try_from(*it).ok(),
                    Value::UInt(it) => <$ty>::try_from(*it).ok(),
                    _ => None,
                };
                res.ok_or_else(|| format!("`{}` doesn't fit into `{}`", value, stringify!($ty)))
            }
        }
    )*};
}

from_value_int!(i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);

/// Everything the parser resolved for one member, handed to
/// [`Command::assign`](crate::Command::assign).
///
/// `occurrences` counts how often an option was given on the command line;
/// a value filled in from a declared default has no occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    member: String,
    occurrences: usize,
    values: Vec<Value>,
}

impl Resolved {
    pub fn new(member: &str, occurrences: usize, values: Vec<Value>) -> Resolved {
        Resolved { member: member.to_string(), occurrences, values }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn occurrences(&self) -> usize {
        self.occurrences
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn switch(&self) -> bool {
        self.occurrences > 0
    }

    pub fn count(&self) -> u32 {
        u32::try_from(self.occurrences).unwrap_or(u32::MAX)
    }

    pub fn single<T: FromValue>(self) -> Result<T, ConfigError> {
        let member = self.member;
        let mut values = self.values;
        if values.len() != 1 {
            return Err(bind_error(&member, format!("expected one value, got {}", values.len())));
        }
        let value = values.remove(0);
        T::from_value(value).map_err(|message| bind_error(&member, message))
    }

    pub fn optional<T: FromValue>(self) -> Result<Option<T>, ConfigError> {
        if self.values.is_empty() {
            return Ok(None);
        }
        self.single().map(Some)
    }

    pub fn many<T: FromValue>(self) -> Result<Vec<T>, ConfigError> {
        let member = self.member;
        self.values
            .into_iter()
            .map(|value| T::from_value(value).map_err(|message| bind_error(&member, message)))
            .collect()
    }

    pub fn single_parsed<T>(self) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let member = self.member.clone();
        let text = self.single::<Value>()?.to_string();
        parse_text(&member, &text)
    }

    pub fn optional_parsed<T>(self) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        if self.values.is_empty() {
            return Ok(None);
        }
        self.single_parsed().map(Some)
    }

    pub fn many_parsed<T>(self) -> Result<Vec<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let member = self.member;
        self.values.iter().map(|value| parse_text(&member, &value.to_string())).collect()
    }
}

fn parse_text<T>(member: &str, text: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>().map_err(|err| bind_error(member, format!("can't parse `{}`, {}", text, err)))
}

fn bind_error(member: &str, message: String) -> ConfigError {
    ConfigError::Bind { member: member.to_string(), message }
}
