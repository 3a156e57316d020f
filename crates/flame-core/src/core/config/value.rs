use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single configuration value: a scalar, a numeric vector, or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Vector(Vec<f64>),
    Text(String),
}

impl ConfigValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Number(_) => "number",
            ConfigValue::Vector(_) => "vector",
            ConfigValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Number(x) => write!(f, "{x}"),
            ConfigValue::Vector(v) => {
                write!(f, "[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
            ConfigValue::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(x: f64) -> Self {
        ConfigValue::Number(x)
    }
}

impl From<i32> for ConfigValue {
    fn from(x: i32) -> Self {
        ConfigValue::Number(f64::from(x))
    }
}

impl From<Vec<f64>> for ConfigValue {
    fn from(v: Vec<f64>) -> Self {
        ConfigValue::Vector(v)
    }
}

impl From<&[f64]> for ConfigValue {
    fn from(v: &[f64]) -> Self {
        ConfigValue::Vector(v.to_vec())
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Text(s)
    }
}

pub type ParamMap = BTreeMap<String, ConfigValue>;

/// Typed, scoped lookup over an element's parameters with fallback to the
/// lattice-wide globals. Errors name the element and key.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    element: &'a str,
    local: &'a ParamMap,
    globals: Option<&'a ParamMap>,
}

impl<'a> Params<'a> {
    pub fn new(element: &'a str, local: &'a ParamMap, globals: Option<&'a ParamMap>) -> Self {
        Self {
            element,
            local,
            globals,
        }
    }

    pub fn element(&self) -> &'a str {
        self.element
    }

    pub fn get(&self, key: &str) -> Option<&'a ConfigValue> {
        self.local
            .get(key)
            .or_else(|| self.globals.and_then(|g| g.get(key)))
    }

    /// View of the element's own parameters without the lattice-wide fallback.
    pub fn local_only(&self) -> Params<'a> {
        Params {
            globals: None,
            ..*self
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn number_opt(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Number(x)) if x.is_finite() => Ok(Some(*x)),
            Some(ConfigValue::Number(_)) => Err(ConfigError::invalid(
                self.element,
                key,
                "value is not finite",
            )),
            Some(_) => Err(self.wrong_type(key, "number")),
        }
    }

    pub fn number(&self, key: &str) -> Result<f64, ConfigError> {
        self.number_opt(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn number_or(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        Ok(self.number_opt(key)?.unwrap_or(default))
    }

    pub fn vector_opt(&self, key: &str) -> Result<Option<&'a [f64]>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Vector(v)) => {
                if v.iter().all(|x| x.is_finite()) {
                    Ok(Some(v.as_slice()))
                } else {
                    Err(ConfigError::invalid(
                        self.element,
                        key,
                        "vector contains non-finite values",
                    ))
                }
            }
            Some(_) => Err(self.wrong_type(key, "vector")),
        }
    }

    pub fn vector(&self, key: &str) -> Result<&'a [f64], ConfigError> {
        self.vector_opt(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn text_opt(&self, key: &str) -> Result<Option<&'a str>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Text(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.wrong_type(key, "string")),
        }
    }

    pub fn text(&self, key: &str) -> Result<&'a str, ConfigError> {
        self.text_opt(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn missing(&self, key: &str) -> ConfigError {
        ConfigError::MissingParameter {
            element: self.element.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::invalid(self.element, key, reason)
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> ConfigError {
        ConfigError::WrongType {
            element: self.element.to_string(),
            key: key.to_string(),
            expected,
        }
    }
}
