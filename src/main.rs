// This is the entry point of the GP spending bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (ledger files/databases, Discord API)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;
mod settings;

use crate::core::reaction_roles::{ReactionRoleMap, ReactionRoleService};
use crate::core::spending::{RankTable, SpendingService};
use crate::discord::commands::presence;
use crate::discord::reactions::events as reaction_events;
use crate::discord::{Data, Error};
use crate::infra::directory::SerenityDirectory;
use crate::infra::spending::{JsonLedgerStore, LedgerBackend, SqliteLedgerStore};
use crate::settings::{LedgerBackendKind, Settings};
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// Reactions drive the reaction-role toggles.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            if let Err(e) = reaction_events::handle_reaction_add(ctx, data, add_reaction).await {
                tracing::error!("Error handling reaction add: {}", e);
            }
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            if let Err(e) = reaction_events::handle_reaction_remove(data, removed_reaction).await {
                tracing::error!("Error handling reaction remove: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}

/// Command errors are reported privately to the invoker; everything else goes
/// to poise's default handler.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(command = %ctx.command().name, "Command failed: {}", error);
            let reply = poise::CreateReply::default()
                .content(format!("Something went wrong: {}", error))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::warn!("Failed to report command error: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn open_ledger(settings: &Settings) -> anyhow::Result<LedgerBackend> {
    let path = settings.ledger_path();
    let backend = match settings.backend {
        LedgerBackendKind::Json => LedgerBackend::Json(
            JsonLedgerStore::open(&path)
                .with_context(|| format!("Failed to load ledger from {}", path.display()))?,
        ),
        LedgerBackendKind::Sqlite => LedgerBackend::Sqlite(
            SqliteLedgerStore::new(&path.to_string_lossy())
                .await
                .with_context(|| format!("Failed to open ledger database {}", path.display()))?,
        ),
    };
    Ok(backend)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;
    tracing::info!(?settings, "Loaded settings");

    // Keep runtime state in a dedicated folder so the repo root stays tidy.
    std::fs::create_dir_all(&settings.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            settings.data_dir.display()
        )
    })?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // The ledger is loaded up front so a broken ledger file stops start-up.
    // Services that need the Discord API are wired in `setup`, once the
    // client's HTTP handle and cache exist.

    let ledger = open_ledger(&settings).await?;
    let dev_guild_id = settings.dev_guild_id;

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::spending::spent(),
                discord::commands::spending::checkspending(),
                discord::commands::spending::leaderboard(),
                discord::commands::reaction_roles::react(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                match dev_guild_id {
                    // Guild registration is instant; global can take up to an hour
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?
                    }
                }

                tracing::info!("Commands registered");
                presence::on_ready(ctx);

                let directory = || SerenityDirectory::new(ctx.http.clone(), ctx.cache.clone());

                Ok(Data {
                    spending: Arc::new(SpendingService::new(
                        ledger,
                        directory(),
                        RankTable::gp_tiers(),
                    )),
                    reaction_roles: Arc::new(ReactionRoleService::new(
                        directory(),
                        ReactionRoleMap::community_roles(),
                    )),
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&settings.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;

    Ok(())
}
