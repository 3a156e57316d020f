use super::error::ConfigError;
use super::value::{ConfigValue, ParamMap, Params};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scope name used in error messages for lattice-wide parameters.
pub const GLOBAL_SCOPE: &str = "<global>";

/// Descriptor of one lattice element: its name, type tag and parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub params: ParamMap,
}

impl ElementConfig {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            params: ParamMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.params.insert(key.into(), value.into());
    }

    /// Parameter view for this element, falling back to `globals`.
    pub fn params<'a>(&'a self, globals: Option<&'a ParamMap>) -> Params<'a> {
        Params::new(&self.name, &self.params, globals)
    }

    /// Returns a copy with `overrides` merged over the current parameters.
    pub fn merged(&self, overrides: &ParamMap) -> Self {
        let mut merged = self.clone();
        for (key, value) in overrides {
            merged.params.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// A complete machine description: lattice-wide parameters (beam species,
/// initial moments, data directories) followed by the ordered element list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    #[serde(default)]
    pub elements: Vec<ElementConfig>,
    #[serde(flatten)]
    pub globals: ParamMap,
}

impl LatticeConfig {
    pub fn builder() -> LatticeConfigBuilder {
        LatticeConfigBuilder::new()
    }

    pub fn global_params(&self) -> Params<'_> {
        Params::new(GLOBAL_SCOPE, &self.globals, None)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Loads an already-structured lattice document. Files ending in `.json` are
    /// read as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content).map_err(|e| ConfigError::Json {
                path: path.to_string_lossy().to_string(),
                source: e,
            })
        } else {
            Self::from_toml_str(&content).map_err(|e| ConfigError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })
        }
    }
}

#[derive(Default)]
pub struct LatticeConfigBuilder {
    globals: ParamMap,
    elements: Vec<ElementConfig>,
}

impl LatticeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.globals.insert(key.into(), value.into());
        self
    }

    pub fn element(mut self, element: ElementConfig) -> Self {
        self.elements.push(element);
        self
    }

    pub fn elements(mut self, elements: impl IntoIterator<Item = ElementConfig>) -> Self {
        self.elements.extend(elements);
        self
    }

    pub fn build(self) -> LatticeConfig {
        LatticeConfig {
            elements: self.elements,
            globals: self.globals,
        }
    }
}
