use std::collections::BTreeMap;

/// How a command is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `/name key:value ...`
    Slash,
    /// `!name args...`
    Prefix,
}

/// Guild permission required to run a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Everyone,
    ManageChannels,
    Administrator,
}

/// Represents a bot command
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub kind: CommandKind,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub permission: Permission,
    /// Name of the cog that handles the command
    pub cog: String,
}

impl Command {
    pub fn slash(name: impl Into<String>) -> Self {
        Self::new(name, CommandKind::Slash)
    }

    pub fn prefix(name: impl Into<String>) -> Self {
        Self::new(name, CommandKind::Prefix)
    }

    fn new(name: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            aliases: Vec::new(),
            usage: None,
            permission: Permission::Everyone,
            cog: String::new(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub fn owned_by(mut self, cog: impl Into<String>) -> Self {
        self.cog = cog.into();
        self
    }

    pub fn matches(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.name.to_lowercase() == input_lower ||
            self.aliases.iter().any(|a| a.to_lowercase() == input_lower)
    }
}

/// Command registry for managing available commands
#[derive(Default)]
pub struct CommandRegistry {
    slash: BTreeMap<String, Command>,
    prefix: BTreeMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: CommandKind) -> &BTreeMap<String, Command> {
        match kind {
            CommandKind::Slash => &self.slash,
            CommandKind::Prefix => &self.prefix,
        }
    }

    pub fn register(&mut self, command: Command) {
        let table = match command.kind {
            CommandKind::Slash => &mut self.slash,
            CommandKind::Prefix => &mut self.prefix,
        };
        table.insert(command.name.clone(), command);
    }

    pub fn get(&self, kind: CommandKind, name: &str) -> Option<&Command> {
        self.table(kind).get(name)
    }

    pub fn find(&self, kind: CommandKind, input: &str) -> Option<&Command> {
        self.table(kind).values().find(|c| c.matches(input))
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.slash.values().chain(self.prefix.values())
    }

    pub fn len(&self) -> usize {
        self.slash.len() + self.prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_alias_and_kind() {
        let mut registry = CommandRegistry::new();
        registry.register(
            Command::prefix("spree_cat_add").with_aliases(vec!["spree_add".to_string()]),
        );
        registry.register(Command::slash("heist_summary"));
        registry.register(Command::prefix("heist_summary"));

        assert_eq!(registry.len(), 3);
        assert!(registry.find(CommandKind::Prefix, "SPREE_ADD").is_some());
        assert!(registry.find(CommandKind::Slash, "spree_add").is_none());
        assert_eq!(
            registry.get(CommandKind::Slash, "heist_summary").map(|c| c.kind),
            Some(CommandKind::Slash)
        );
    }
}
