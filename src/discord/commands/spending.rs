// Discord commands for GP spending and ranks.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use crate::core::reaction_roles::ReactionRoleService;
use crate::core::spending::{LedgerError, SpenderTotal, SpendingError, SpendingService};
use crate::infra::directory::SerenityDirectory;
use crate::infra::spending::LedgerBackend;
use poise::serenity_prelude::{self as serenity, Mentionable};
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub spending: Arc<SpendingService<LedgerBackend, SerenityDirectory>>,
    pub reaction_roles: Arc<ReactionRoleService<SerenityDirectory>>,
}

const LEADERBOARD_SIZE: usize = 10;
const INVALID_AMOUNT: &str =
    "Invalid amount format! Use numbers with optional 'k', 'm', or 'b' suffix.";

/// Log spending for a member (admin only)
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn spent(
    ctx: Context<'_>,
    #[description = "Amount of GP spent (e.g. 100m, 1b)"] amount: String,
    #[description = "Member to log spending for"] user: serenity::Member,
) -> Result<(), Error> {
    // Resolving a Member (not a User) means poise rejects non-members before we run.
    let guild_id = ctx.guild_id().map(|id| id.get());
    let result = ctx
        .data()
        .spending
        .log_spend(guild_id, user.user.id.get(), &amount)
        .await;

    match result {
        Ok(receipt) => {
            tracing::info!(
                user_id = receipt.user_id,
                amount = receipt.amount,
                rank = ?receipt.rank,
                rank_sync = ?receipt.rank_sync,
                "Logged spend via /spent"
            );
            ctx.say(format!(
                "{} has now spent **{} GP**.",
                user.mention(),
                format_number(receipt.new_total)
            ))
            .await?;
        }
        Err(SpendingError::InvalidAmount(_))
        | Err(SpendingError::Ledger(LedgerError::NonPositiveAmount)) => {
            say_private(ctx, INVALID_AMOUNT).await?;
        }
        Err(SpendingError::NotInGuild) => {
            say_private(ctx, "This command can only be used in a server.").await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Check OSRS GP spending for yourself or another member
#[poise::command(slash_command)]
pub async fn checkspending(
    ctx: Context<'_>,
    #[description = "Member to check spending for (optional)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    let spending = &ctx.data().spending;

    let total = spending.total_for(target.id.get()).await?;
    let role_text = match spending.rank_for(total) {
        Some(rank) => format!(" and holds the **{}** role!", rank.name),
        None => " and has no assigned role.".to_string(),
    };

    ctx.say(format!(
        "{} has spent **{} GP**{}",
        target.mention(),
        format_number(total),
        role_text
    ))
    .await?;

    Ok(())
}

/// Show the top OSRS GP spenders
#[poise::command(slash_command, guild_only)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    if ctx.guild_id().is_none() {
        say_private(ctx, "This command can only be used in a server.").await?;
        return Ok(());
    }

    let spenders = ctx.data().spending.leaderboard(LEADERBOARD_SIZE).await?;
    if spenders.is_empty() {
        say_private(ctx, "No spending data available.").await?;
        return Ok(());
    }

    ctx.say(leaderboard_text(&spenders)).await?;

    Ok(())
}

fn leaderboard_text(spenders: &[SpenderTotal]) -> String {
    let lines = spenders
        .iter()
        .enumerate()
        .map(|(i, spender)| {
            format!(
                "**{}.** <@{}> — **{} GP**",
                i + 1,
                spender.user_id,
                format_number(spender.total)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("**Top OSRS GP Spenders:**\n{}", lines)
}

async fn say_private(ctx: Context<'_>, content: &str) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Format a number with commas for readability
fn format_number(n: u64) -> String {
    let s = n.to_string();

    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }

    result
}
