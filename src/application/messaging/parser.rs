//! Message parser - Turns raw text into commands and arguments

use std::collections::HashMap;

use crate::application::errors::CommandError;
use crate::domain::entities::{CommandKind, Content};

/// Classifies message text as a prefix command, a slash command or plain text
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse message text; commands are split into name and quoted-aware tokens
    pub fn parse(&self, text: &str) -> (Option<CommandKind>, Content) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return (None, Content::Empty);
        }

        let (kind, body) = if let Some(body) = trimmed.strip_prefix('/') {
            (CommandKind::Slash, body)
        } else if let Some(body) = trimmed.strip_prefix(self.command_prefix.as_str()) {
            (CommandKind::Prefix, body)
        } else {
            return (None, Content::Text(text.to_string()));
        };

        let mut tokens = tokenize(body).into_iter();
        match tokens.next() {
            Some(name) => (
                Some(kind),
                Content::Command {
                    name: name.to_lowercase(),
                    args: tokens.collect(),
                },
            ),
            None => (None, Content::Text(text.to_string())),
        }
    }
}

/// Split on whitespace, keeping double-quoted runs together
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;

    for c in input.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        tokens.push(current);
    }
    tokens
}

/// Arguments of one command invocation.
///
/// Slash commands take `key:value` options; prefix commands are positional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    positional: Vec<String>,
    named: HashMap<String, String>,
}

impl CommandArgs {
    pub fn new(kind: CommandKind, tokens: Vec<String>) -> Self {
        let mut args = Self::default();
        for token in tokens {
            let option = match kind {
                CommandKind::Slash => token.split_once(':').filter(|(key, _)| is_option_key(key)),
                CommandKind::Prefix => None,
            };
            match option {
                Some((key, value)) => {
                    args.named.insert(key.to_lowercase(), value.to_string());
                }
                None => args.positional.push(token),
            }
        }
        args
    }

    /// Named option, falling back to the positional slot
    pub fn get(&self, name: &str, position: usize) -> Option<&str> {
        self.named
            .get(name)
            .or_else(|| self.positional.get(position))
            .map(String::as_str)
    }

    /// Positional tokens from `position` on, joined by spaces
    pub fn rest(&self, position: usize) -> Option<String> {
        let rest = self.positional.get(position..)?;
        if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        }
    }

    pub fn bool(&self, name: &str, position: usize, default: bool) -> Result<bool, CommandError> {
        match self.get(name, position) {
            Some(raw) => parse_bool(raw)
                .ok_or_else(|| CommandError::InvalidArgs(format!("`{}` expects true or false, got `{}`.", name, raw))),
            None => Ok(default),
        }
    }

    pub fn int(&self, name: &str, position: usize) -> Result<Option<i64>, CommandError> {
        self.get(name, position)
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| CommandError::InvalidArgs(format!("`{}` expects a number, got `{}`.", name, raw)))
            })
            .transpose()
    }
}

fn is_option_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" | "enable" | "enabled" => Some(true),
        "false" | "no" | "n" | "off" | "0" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

/// Channel or category id from a raw id or a `<#id>` mention
pub fn parse_channel_ref(raw: &str) -> Option<String> {
    let id = raw
        .strip_prefix("<#")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw);
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}
