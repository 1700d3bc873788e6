//! Cog manager - owns the cogs and routes events to them

use tracing::{error, info, warn};

use crate::application::errors::{BotError, CommandError};
use crate::cogs::trait_def::{ButtonPress, Cog, CogContext, Invocation, Reply};
use crate::domain::entities::{ChannelInfo, Command, CommandRegistry, Message, Permission, User};

/// Manages all cogs for the bot
pub struct CogManager {
    cogs: Vec<Box<dyn Cog>>,
    registry: CommandRegistry,
}

impl CogManager {
    pub fn new() -> Self {
        Self {
            cogs: Vec::new(),
            registry: CommandRegistry::new(),
        }
    }

    /// Register a cog and its commands
    pub fn register<C: Cog + 'static>(&mut self, cog: C) -> Result<(), BotError> {
        let name = cog.name().to_string();

        if self.has_cog(&name) {
            return Err(BotError::Internal(format!("Cog '{}' already registered", name)));
        }

        for command in cog.commands() {
            self.registry.register(command.owned_by(&name));
        }
        info!("Registering cog: {}", name);
        self.cogs.push(Box::new(cog));
        Ok(())
    }

    /// Restore every cog's persisted state
    pub async fn load_all(&mut self) -> Result<(), BotError> {
        for cog in self.cogs.iter_mut() {
            cog.load().await?;
        }
        Ok(())
    }

    pub fn has_cog(&self, name: &str) -> bool {
        self.cogs.iter().any(|c| c.name() == name)
    }

    /// List all registered cogs
    pub fn list_cogs(&self) -> Vec<CogInfo> {
        self.cogs
            .iter()
            .map(|cog| CogInfo {
                name: cog.name().to_string(),
                description: cog.description().to_string(),
                commands: self
                    .registry
                    .all()
                    .filter(|c| c.cog == cog.name())
                    .map(|c| c.name.clone())
                    .collect(),
            })
            .collect()
    }

    /// Run a command through its cog after the permission check
    pub async fn dispatch_command(&mut self, ctx: &CogContext<'_>, invocation: &Invocation) -> Result<Reply, BotError> {
        let command = self
            .registry
            .find(invocation.kind, &invocation.name)
            .ok_or_else(|| CommandError::NotFound(invocation.name.clone()))?;

        check_permission(command, &invocation.invoker)?;

        let cog_name = command.cog.clone();
        let cog = self
            .cogs
            .iter_mut()
            .find(|c| c.name() == cog_name)
            .ok_or_else(|| BotError::Internal(format!("Cog '{}' not found", cog_name)))?;

        let mut invocation = invocation.clone();
        invocation.name = command.name.clone();
        cog.on_command(ctx, &invocation).await
    }

    /// Listener errors are logged; one cog failing never stops the others
    pub async fn on_message(&mut self, ctx: &CogContext<'_>, message: &Message) {
        for cog in self.cogs.iter_mut() {
            if let Err(e) = cog.on_message(ctx, message).await {
                error!("Cog '{}' failed on message {}: {}", cog.name(), message.id, e);
            }
        }
    }

    pub async fn on_channel_create(&mut self, ctx: &CogContext<'_>, channel: &ChannelInfo) {
        for cog in self.cogs.iter_mut() {
            if let Err(e) = cog.on_channel_create(ctx, channel).await {
                error!("Cog '{}' failed on channel {}: {}", cog.name(), channel.id, e);
            }
        }
    }

    /// First cog that claims the button answers it
    pub async fn on_button(&mut self, ctx: &CogContext<'_>, press: &ButtonPress) -> Result<Option<Reply>, BotError> {
        for cog in self.cogs.iter_mut() {
            if let Some(reply) = cog.on_button(ctx, press).await? {
                return Ok(Some(reply));
            }
        }
        warn!("No cog handles button '{}'", press.custom_id);
        Ok(None)
    }

    pub async fn on_tick(&mut self, ctx: &CogContext<'_>) {
        for cog in self.cogs.iter_mut() {
            if let Err(e) = cog.on_tick(ctx).await {
                error!("Cog '{}' tick failed: {}", cog.name(), e);
            }
        }
    }
}

impl Default for CogManager {
    fn default() -> Self {
        Self::new()
    }
}

fn check_permission(command: &Command, user: &User) -> Result<(), CommandError> {
    match command.permission {
        Permission::Everyone => Ok(()),
        Permission::ManageChannels if user.can_manage_channels || user.is_admin => Ok(()),
        Permission::ManageChannels => Err(CommandError::PermissionDenied(
            "You need the Manage Channels permission to use this command.".to_string(),
        )),
        Permission::Administrator if user.is_admin => Ok(()),
        Permission::Administrator => Err(CommandError::PermissionDenied(
            "Admin permissions required.".to_string(),
        )),
    }
}

/// Cog information for listing
#[derive(Debug, Clone, serde::Serialize)]
pub struct CogInfo {
    pub name: String,
    pub description: String,
    pub commands: Vec<String>,
}
