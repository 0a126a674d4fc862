use dialoguer::{Confirm, Input};
use serde_json::{Number, Value};

use crate::{argument::Argument, Error, Result};

pub const DEFAULT_HANDLER_NAME: &str = "__default__";
pub const INTERACTIVE_HANDLER_NAME: &str = "interactive";
pub const SCRIPTED_HANDLER_NAME: &str = "scripted";

/// Strategy turning the argument specs of a manifest into resolved arguments.
///
/// Implementations return the same arguments, in the same order, with their
/// values filled in.
pub trait ArgsHandler {
    fn name(&self) -> &str;
    fn handle_args(&self, args: &[Argument]) -> Result<Vec<Argument>>;
}

/// Handlers known to the process, built once at startup.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn ArgsHandler>>,
    overrides: Option<String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default, interactive and scripted handlers. `overrides` feeds the
    /// scripted one and is only parsed when that handler runs.
    pub fn builtin(overrides: &str) -> Self {
        let mut registry = Self::new()
            .register(DefaultArgsHandler)
            .register(InteractiveArgsHandler)
            .register(ScriptedArgsHandler::new(overrides));
        if !overrides.trim().is_empty() {
            registry.overrides = Some(overrides.to_string());
        }
        registry
    }

    /// Overrides handed to [`HandlerRegistry::builtin`], if any.
    pub fn overrides(&self) -> Option<&str> {
        self.overrides.as_deref()
    }

    pub fn register(mut self, handler: impl ArgsHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|handler| handler.name())
    }

    /// The single handler registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&dyn ArgsHandler> {
        let candidates: Vec<&dyn ArgsHandler> = self
            .handlers
            .iter()
            .filter(|handler| handler.name() == name)
            .map(|handler| handler.as_ref())
            .collect();
        tracing::debug!(name, matches = candidates.len(), "resolving argument handler");
        match candidates.as_slice() {
            [handler] => Ok(*handler),
            [] => Err(Error::HandlerNotFound {
                name: name.to_string(),
            }),
            _ => Err(Error::AmbiguousHandler {
                name: name.to_string(),
                count: candidates.len(),
            }),
        }
    }
}

/// Keeps every manifest value as it is.
pub struct DefaultArgsHandler;

impl ArgsHandler for DefaultArgsHandler {
    fn name(&self) -> &str {
        DEFAULT_HANDLER_NAME
    }

    fn handle_args(&self, args: &[Argument]) -> Result<Vec<Argument>> {
        Ok(args.to_vec())
    }
}

/// Asks for every argument on the terminal, offering the manifest value as
/// the default.
pub struct InteractiveArgsHandler;

impl InteractiveArgsHandler {
    fn ask(arg: &Argument) -> Result<Value> {
        let prompt = arg.prompt().to_string();
        let value = match &arg.value {
            Value::Bool(default) => Value::Bool(
                Confirm::new()
                    .with_prompt(prompt)
                    .default(*default)
                    .interact()?,
            ),
            Value::Number(number) if number.is_i64() => {
                let mut input = Input::<i64>::new().with_prompt(prompt);
                if let Some(default) = number.as_i64() {
                    input = input.default(default);
                }
                Value::from(input.interact_text()?)
            }
            Value::Number(number) if number.is_u64() => {
                let mut input = Input::<u64>::new().with_prompt(prompt);
                if let Some(default) = number.as_u64() {
                    input = input.default(default);
                }
                Value::from(input.interact_text()?)
            }
            Value::Number(number) => {
                let mut input = Input::<f64>::new()
                    .with_prompt(prompt)
                    .validate_with(|value: &f64| -> std::result::Result<(), &'static str> {
                        if value.is_finite() {
                            Ok(())
                        } else {
                            Err("enter a finite number")
                        }
                    });
                if let Some(default) = number.as_f64() {
                    input = input.default(default);
                }
                let entered = input.interact_text()?;
                finite(entered).ok_or_else(|| Error::InvalidValue {
                    name: arg.name.clone(),
                    value: entered.to_string(),
                    expected: "finite number",
                })?
            }
            other => {
                let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
                if let Value::String(default) = other {
                    input = input.default(default.clone());
                }
                Value::String(input.interact_text()?)
            }
        };
        Ok(value)
    }
}

impl ArgsHandler for InteractiveArgsHandler {
    fn name(&self) -> &str {
        INTERACTIVE_HANDLER_NAME
    }

    fn handle_args(&self, args: &[Argument]) -> Result<Vec<Argument>> {
        args.iter()
            .map(|arg| Ok(arg.resolved(Self::ask(arg)?)))
            .collect()
    }
}

/// JSON number for a finite float.
fn finite(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

/// Fills arguments from `name=value` pairs given up front, for unattended runs.
#[derive(Debug, Default)]
pub struct ScriptedArgsHandler {
    script: String,
}

impl ScriptedArgsHandler {
    /// `script` is a shell-quoted list such as `name=demo "author=Jane Doe"`.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }

    fn overrides(&self) -> Result<Vec<(String, String)>> {
        let tokens = shell_words::split(&self.script).map_err(|_| Error::InvalidOverride {
            token: self.script.clone(),
        })?;
        tokens
            .into_iter()
            .map(|token| {
                let pair = token
                    .split_once('=')
                    .filter(|(name, _)| !name.is_empty())
                    .map(|(name, value)| (name.to_string(), value.to_string()));
                pair.ok_or(Error::InvalidOverride { token })
            })
            .collect()
    }

    fn coerce(arg: &Argument, raw: &str) -> Result<Value> {
        let invalid = |expected| Error::InvalidValue {
            name: arg.name.clone(),
            value: raw.to_string(),
            expected,
        };
        let value = match &arg.value {
            Value::Bool(_) => Value::Bool(raw.parse().map_err(|_| invalid("boolean"))?),
            Value::Number(number) if number.is_i64() || number.is_u64() => raw
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| raw.parse::<u64>().map(Value::from))
                .map_err(|_| invalid("integer"))?,
            Value::Number(_) => raw
                .parse::<f64>()
                .ok()
                .and_then(finite)
                .ok_or_else(|| invalid("finite number"))?,
            _ => Value::String(raw.to_string()),
        };
        Ok(value)
    }
}

impl ArgsHandler for ScriptedArgsHandler {
    fn name(&self) -> &str {
        SCRIPTED_HANDLER_NAME
    }

    fn handle_args(&self, args: &[Argument]) -> Result<Vec<Argument>> {
        let overrides = self.overrides()?;
        if let Some((name, _)) = overrides
            .iter()
            .find(|(name, _)| !args.iter().any(|arg| &arg.name == name))
        {
            return Err(Error::UnknownArgument { name: name.clone() });
        }
        args.iter()
            .map(|arg| {
                // last occurrence wins
                match overrides.iter().rev().find(|(name, _)| name == &arg.name) {
                    Some((_, raw)) => Ok(arg.resolved(Self::coerce(arg, raw)?)),
                    None => Ok(arg.clone()),
                }
            })
            .collect()
    }
}
