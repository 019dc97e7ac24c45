//! Input handling.
//!
//! In a real host this would integrate with windowing and raw keyboard
//! events. The viewer reads lines from stdin instead: a line that is exactly
//! a bound key counts as a key press, anything else is a console command.

use std::collections::BTreeMap;

use anyhow::bail;

/// Key to console command bindings.
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
    binds: BTreeMap<String, String>,
}

impl KeyBindings {
    /// Default bindings: `regen_key` runs `regen`.
    pub fn with_regen_key(regen_key: &str) -> Self {
        let mut b = Self::default();
        b.binds.insert(normalize_key(regen_key), "regen".to_string());
        b
    }

    pub fn bind(&mut self, key: &str, command: &str) -> anyhow::Result<()> {
        let key = normalize_key(key);
        if key.is_empty() || key.contains(char::is_whitespace) {
            bail!("invalid key: {:?}", key);
        }
        if command.trim().is_empty() {
            bail!("empty command for key {}", key);
        }
        self.binds.insert(key, command.trim().to_string());
        Ok(())
    }

    /// Removes a binding, returning the command it ran.
    pub fn unbind(&mut self, key: &str) -> Option<String> {
        self.binds.remove(&normalize_key(key))
    }

    pub fn command_for(&self, key: &str) -> Option<&str> {
        self.binds.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.binds.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// One unit of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A bound key was pressed; carries the key name.
    Key(String),
    /// A console command line.
    Command(String),
}

impl InputEvent {
    /// Classifies a raw input line. Returns `None` for blank lines.
    pub fn classify(line: &str, bindings: &KeyBindings) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if bindings.command_for(line).is_some() {
            Some(InputEvent::Key(normalize_key(line)))
        } else {
            Some(InputEvent::Command(line.to_string()))
        }
    }
}
