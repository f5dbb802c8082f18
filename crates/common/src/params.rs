//! Step parameter bags
//!
//! Documents carry parameters as loosely typed JSON objects. Actions read
//! them through the typed accessors here so every action states its own
//! schema (required keys, types, defaults) up front, before touching the
//! session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::{Error, Result};

/// Parameters attached to a single step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful in tests and programmatic documents
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Fail with every missing or blank name at once.
    ///
    /// A parameter counts as missing when it is absent, null, or a string that
    /// is empty after trimming.
    pub fn require(&self, action: &str, names: &[&str]) -> Result<()> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !self.is_present(name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingParameters {
                action: action.to_string(),
                names: missing,
            })
        }
    }

    fn is_present(&self, name: &str) -> bool {
        match self.value(name) {
            None => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// String view of a parameter. Numbers and booleans are rendered.
    pub fn str(&self, name: &str) -> Option<String> {
        match self.value(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn required_str(&self, action: &str, name: &str) -> Result<String> {
        self.require(action, &[name])?;
        self.str(name).ok_or_else(|| Error::InvalidParameter {
            action: action.to_string(),
            name: name.to_string(),
            reason: "expected a string".to_string(),
        })
    }

    /// Integer parameter; accepts JSON numbers and numeric strings.
    pub fn i64(&self, action: &str, name: &str) -> Result<Option<i64>> {
        let invalid = |reason: &str| Error::InvalidParameter {
            action: action.to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
        };

        match self.value(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| invalid("expected an integer")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid("expected an integer")),
            Some(_) => Err(invalid("expected an integer")),
        }
    }

    /// Non-negative integer parameter
    pub fn u64(&self, action: &str, name: &str) -> Result<Option<u64>> {
        match self.i64(action, name)? {
            None => Ok(None),
            Some(n) if n >= 0 => Ok(Some(n as u64)),
            Some(_) => Err(Error::InvalidParameter {
                action: action.to_string(),
                name: name.to_string(),
                reason: "must not be negative".to_string(),
            }),
        }
    }

    /// Millisecond duration with a default
    pub fn duration_ms(&self, action: &str, name: &str, default_ms: u64) -> Result<Duration> {
        Ok(Duration::from_millis(
            self.u64(action, name)?.unwrap_or(default_ms),
        ))
    }

    /// Boolean parameter; accepts `true`/`false` and their string forms.
    pub fn bool(&self, action: &str, name: &str) -> Result<Option<bool>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(Error::InvalidParameter {
                    action: action.to_string(),
                    name: name.to_string(),
                    reason: format!("expected a boolean, got \"{}\"", s),
                }),
            },
            Some(_) => Err(Error::InvalidParameter {
                action: action.to_string(),
                name: name.to_string(),
                reason: "expected a boolean".to_string(),
            }),
        }
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Parameters> for Value {
    fn from(params: Parameters) -> Self {
        Value::Object(params.0)
    }
}
