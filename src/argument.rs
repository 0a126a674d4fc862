use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named value handed to the templates.
///
/// In a manifest `value` is the default; after an argument handler ran it is
/// the value that gets rendered.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Same argument, different value.
    pub fn resolved(&self, value: Value) -> Self {
        Self {
            name: self.name.clone(),
            value,
            description: self.description.clone(),
        }
    }

    /// Text shown when asking for this argument.
    pub fn prompt(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered `name -> value` map used as the rendering context.
pub fn to_context(args: &[Argument]) -> IndexMap<String, Value> {
    args.iter()
        .map(|arg| (arg.name.clone(), arg.value.clone()))
        .collect()
}
