use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// A property value carried by a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandValue {
    String(String),
    Bool(bool),
}

impl From<&str> for CommandValue {
    fn from(value: &str) -> Self {
        CommandValue::String(value.to_string())
    }
}

impl From<String> for CommandValue {
    fn from(value: String) -> Self {
        CommandValue::String(value)
    }
}

impl From<bool> for CommandValue {
    fn from(value: bool) -> Self {
        CommandValue::Bool(value)
    }
}

/// A named command for the external engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    name: String,
    properties: BTreeMap<String, CommandValue>,
}

impl Command {
    pub const START_PLAY: &'static str = "start_play";
    pub const START_RECORDING: &'static str = "start_recording";
    pub const STOP_RECORDING: &'static str = "stop_recording";

    /// Create a command with no properties
    ///
    /// The name becomes part of a message subject, so it must be non-empty and
    /// free of whitespace and subject separators.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            bail!("Command name must not be empty");
        }
        if name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '.' | '*' | '>'))
        {
            bail!("Invalid command name: {:?}", name);
        }

        Ok(Self {
            name,
            properties: BTreeMap::new(),
        })
    }

    /// Set a property, replacing any previous value with the same key
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<CommandValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &BTreeMap<String, CommandValue> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&CommandValue> {
        self.properties.get(key)
    }
}
