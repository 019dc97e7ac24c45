//! Console system.
//!
//! Provides:
//! - Console variables (cvars) with typed values and optional numeric bounds
//! - Command registration and execution
//! - Command history
//! - Input parsing
//!
//! # Usage
//! ```ignore
//! let mut console = Console::new();
//! console.register_cvar("pyr_v3_frac", CvarValue::Float(10.0), "Base to step ratio", CvarFlags::ARCHIVE);
//! console.set_bounds("pyr_v3_frac", 6.0, 100.0)?;
//! console.exec("pyr_v3_frac 250")?; // clamped to 100
//! ```

use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Context};

/// Console variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl CvarValue {
    /// Parses user input: int, then float, then bool, then string.
    pub fn parse(s: &str) -> Self {
        if let Ok(v) = s.parse::<i64>() {
            CvarValue::Int(v)
        } else if let Ok(v) = s.parse::<f64>() {
            CvarValue::Float(v)
        } else if s == "true" {
            CvarValue::Bool(true)
        } else if s == "false" {
            CvarValue::Bool(false)
        } else {
            CvarValue::String(s.trim_matches('"').to_string())
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CvarValue::Int(v) => Some(*v),
            CvarValue::Float(v) => Some(*v as i64),
            CvarValue::Bool(v) => Some(i64::from(*v)),
            CvarValue::String(s) => s.parse().ok(),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CvarValue::Float(v) => Some(*v),
            CvarValue::Int(v) => Some(*v as f64),
            CvarValue::String(s) => s.parse().ok(),
            CvarValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            CvarValue::Bool(v) => *v,
            CvarValue::Int(v) => *v != 0,
            CvarValue::Float(v) => *v != 0.0,
            CvarValue::String(s) => !s.is_empty() && s != "0" && s.to_lowercase() != "false",
        }
    }

    /// Converts `self` to the variant of `like`, if the conversion is lossless enough.
    fn coerce_to(&self, like: &CvarValue) -> Option<CvarValue> {
        match like {
            CvarValue::Int(_) => self.as_int().map(CvarValue::Int),
            CvarValue::Float(_) => self.as_float().map(CvarValue::Float),
            CvarValue::Bool(_) => Some(CvarValue::Bool(self.as_bool())),
            CvarValue::String(_) => Some(CvarValue::String(self.to_plain_string())),
        }
    }

    fn to_plain_string(&self) -> String {
        match self {
            CvarValue::String(s) => s.clone(),
            CvarValue::Int(v) => v.to_string(),
            CvarValue::Float(v) => v.to_string(),
            CvarValue::Bool(v) => v.to_string(),
        }
    }
}

impl std::fmt::Display for CvarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CvarValue::Int(v) => write!(f, "{}", v),
            CvarValue::Float(v) => write!(f, "{}", v),
            CvarValue::String(v) => write!(f, "\"{}\"", v),
            CvarValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

bitflags::bitflags! {
    /// Cvar flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CvarFlags: u32 {
        const NONE = 0;
        const ARCHIVE = 1 << 0;   // Mirrored into GeneratorConfig
        const READ_ONLY = 1 << 1; // Set by the host only
    }
}

impl Default for CvarFlags {
    fn default() -> Self {
        Self::NONE
    }
}

/// Console variable metadata.
#[derive(Debug, Clone)]
pub struct Cvar {
    pub name: String,
    pub value: CvarValue,
    pub default: CvarValue,
    pub description: String,
    pub flags: CvarFlags,
    /// Inclusive numeric bounds; values are clamped into them.
    pub bounds: Option<(f64, f64)>,
}

impl Cvar {
    /// Coerces and clamps `raw` to this cvar's type and bounds.
    fn accept(&self, raw: &CvarValue) -> anyhow::Result<CvarValue> {
        let Some(value) = raw.coerce_to(&self.default) else {
            bail!("{} expects a value like {}, got {}", self.name, self.default, raw);
        };
        if let CvarValue::Float(v) = value {
            if !v.is_finite() {
                bail!("{} must be a finite number, got {}", self.name, v);
            }
        }
        let Some((lo, hi)) = self.bounds else {
            return Ok(value);
        };
        Ok(match value {
            CvarValue::Float(v) => CvarValue::Float(v.clamp(lo, hi)),
            CvarValue::Int(v) => CvarValue::Int((v as f64).clamp(lo, hi).round() as i64),
            other => other,
        })
    }
}

/// Command handler function type.
pub type CommandHandler = Box<dyn Fn(&[&str], &mut ConsoleContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Context passed to command handlers.
pub struct ConsoleContext<'a> {
    /// Output buffer for command responses.
    pub output: Vec<String>,
    cvars: &'a mut BTreeMap<String, Cvar>,
}

impl ConsoleContext<'_> {
    pub fn print(&mut self, msg: impl Into<String>) {
        self.output.push(msg.into());
    }

    pub fn get_cvar(&self, name: &str) -> Option<CvarValue> {
        self.cvars.get(name).map(|c| c.value.clone())
    }

    /// Sets a cvar from user input, honoring flags and bounds. Returns the stored value.
    pub fn set_cvar(&mut self, name: &str, value: CvarValue) -> anyhow::Result<CvarValue> {
        let Some(cvar) = self.cvars.get_mut(name) else {
            bail!("unknown cvar: {}", name);
        };
        if cvar.flags.contains(CvarFlags::READ_ONLY) {
            bail!("{} is read-only", name);
        }
        cvar.value = cvar.accept(&value)?;
        Ok(cvar.value.clone())
    }
}

/// The console.
pub struct Console {
    cvars: BTreeMap<String, Cvar>,
    commands: HashMap<String, CommandHandler>,
    history: Vec<String>,
    max_history: usize,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let mut console = Self {
            cvars: BTreeMap::new(),
            commands: HashMap::new(),
            history: Vec::new(),
            max_history: 100,
        };

        console.register_builtin_commands();
        console
    }

    fn register_builtin_commands(&mut self) {
        // echo <text>
        self.register_command("echo", |args, ctx| {
            ctx.print(args.join(" "));
            Ok(())
        });

        // help
        self.register_command("help", |_args, ctx| {
            ctx.print("Available commands: echo, help, cvarlist, set");
            Ok(())
        });

        // cvarlist
        self.register_command("cvarlist", |_args, ctx| {
            let lines: Vec<String> = ctx
                .cvars
                .values()
                .map(|cvar| {
                    let mut line = format!("  {} = {} (default: {})", cvar.name, cvar.value, cvar.default);
                    if let Some((lo, hi)) = cvar.bounds {
                        line.push_str(&format!(" [{}..{}]", lo, hi));
                    }
                    if cvar.flags.contains(CvarFlags::READ_ONLY) {
                        line.push_str(" (read-only)");
                    }
                    line
                })
                .collect();
            for line in lines {
                ctx.print(line);
            }
            Ok(())
        });

        // set <cvar> <value>
        self.register_command("set", |args, ctx| {
            if args.len() < 2 {
                bail!("usage: set <cvar> <value>");
            }
            let name = args[0];
            let value = CvarValue::parse(&args[1..].join(" "));
            let stored = ctx.set_cvar(name, value)?;
            ctx.print(format!("{} = {}", name, stored));
            Ok(())
        });
    }

    /// Registers a console variable.
    pub fn register_cvar(&mut self, name: &str, default: CvarValue, description: &str, flags: CvarFlags) {
        let cvar = Cvar {
            name: name.to_string(),
            value: default.clone(),
            default,
            description: description.to_string(),
            flags,
            bounds: None,
        };
        self.cvars.insert(name.to_string(), cvar);
    }

    /// Restricts a numeric cvar to `[lo, hi]`, clamping its current value.
    pub fn set_bounds(&mut self, name: &str, lo: f64, hi: f64) -> anyhow::Result<()> {
        let cvar = self
            .cvars
            .get_mut(name)
            .with_context(|| format!("unknown cvar: {}", name))?;
        cvar.bounds = Some((lo, hi));
        let current = cvar.value.clone();
        cvar.value = cvar.accept(&current)?;
        Ok(())
    }

    /// Registers a command.
    pub fn register_command<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[&str], &mut ConsoleContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.commands.insert(name.to_string(), Box::new(handler));
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Executes a console command line.
    pub fn exec(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(Vec::new());
        }

        self.history.push(line.to_string());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        let tokens = parse_command_line(line);
        let Some((cmd_name, rest)) = tokens.split_first() else {
            return Ok(Vec::new());
        };
        let args: Vec<&str> = rest.iter().map(|s| s.as_str()).collect();

        let mut ctx = ConsoleContext {
            output: Vec::new(),
            cvars: &mut self.cvars,
        };

        if let Some(handler) = self.commands.get(cmd_name.as_str()) {
            handler(&args, &mut ctx).with_context(|| format!("command '{}'", cmd_name))?;
            return Ok(ctx.output);
        }

        // Bare cvar name: query, or set with the remaining arguments.
        match ctx.get_cvar(cmd_name) {
            Some(value) if args.is_empty() => {
                let default = ctx.cvars.get(cmd_name.as_str()).map(|c| c.default.clone());
                match default {
                    Some(default) => ctx.print(format!("{} = {} (default: {})", cmd_name, value, default)),
                    None => ctx.print(format!("{} = {}", cmd_name, value)),
                }
            }
            Some(_) => {
                let stored = ctx.set_cvar(cmd_name, CvarValue::parse(&args.join(" ")))?;
                ctx.print(format!("{} = {}", cmd_name, stored));
            }
            None => ctx.print(format!("Unknown command: {}", cmd_name)),
        }

        Ok(ctx.output)
    }

    /// Gets a cvar value.
    pub fn get_cvar(&self, name: &str) -> Option<CvarValue> {
        self.cvars.get(name).map(|c| c.value.clone())
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get_cvar(name).and_then(|v| v.as_float())
    }

    /// Sets a cvar from the host, bypassing `READ_ONLY` but not bounds.
    pub fn force_cvar(&mut self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        let cvar = self
            .cvars
            .get_mut(name)
            .with_context(|| format!("unknown cvar: {}", name))?;
        cvar.value = cvar.accept(&value)?;
        Ok(())
    }

    /// Gets command history.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

/// Parses a command line into tokens, respecting quotes.
pub fn parse_command_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> Console {
        let mut console = Console::new();
        console.register_cvar("pyr_v3_frac", CvarValue::Float(10.0), "ratio", CvarFlags::ARCHIVE);
        console.set_bounds("pyr_v3_frac", 6.0, 100.0).unwrap();
        console.register_cvar("pyr_steps", CvarValue::Int(0), "steps", CvarFlags::READ_ONLY);
        console
    }

    #[test]
    fn set_coerces_to_declared_type() {
        let mut console = console();
        console.exec("set pyr_v3_frac 20").unwrap();
        assert_eq!(console.get_cvar("pyr_v3_frac"), Some(CvarValue::Float(20.0)));
    }

    #[test]
    fn bounded_cvar_is_clamped() {
        let mut console = console();
        let out = console.exec("pyr_v3_frac 250").unwrap();
        assert_eq!(out, vec!["pyr_v3_frac = 100".to_string()]);
        console.exec("set pyr_v3_frac 1.5").unwrap();
        assert_eq!(console.get_float("pyr_v3_frac"), Some(6.0));
    }

    #[test]
    fn read_only_cvar_rejects_user_set() {
        let mut console = console();
        assert!(console.exec("set pyr_steps 4").is_err());
        console.force_cvar("pyr_steps", CvarValue::Int(4)).unwrap();
        assert_eq!(console.get_cvar("pyr_steps"), Some(CvarValue::Int(4)));
    }

    #[test]
    fn bare_name_queries_value() {
        let mut console = console();
        let out = console.exec("pyr_v3_frac").unwrap();
        assert_eq!(out, vec!["pyr_v3_frac = 10 (default: 10)".to_string()]);
        assert_eq!(console.history().len(), 1);
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut console = console();
        let out = console.exec("frobnicate").unwrap();
        assert_eq!(out, vec!["Unknown command: frobnicate".to_string()]);
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let mut console = console();
        assert!(console.exec("pyr_v3_frac nan").is_err());
        assert!(console.exec("set pyr_v3_frac inf").is_err());
        assert!(console.exec("set pyr_v3_frac -inf").is_err());
        assert_eq!(console.get_float("pyr_v3_frac"), Some(10.0));
    }

    #[test]
    fn parse_quoted_args() {
        let tokens = parse_command_line(r#"bind r "regen now" test"#);
        assert_eq!(tokens, vec!["bind", "r", "regen now", "test"]);
    }
}
