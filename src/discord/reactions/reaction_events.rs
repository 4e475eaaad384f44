// Gateway reaction events -> ReactionRoleService.
//
// Only unicode reactions inside guilds are considered; custom emojis are never
// bound to roles.

use crate::core::reaction_roles::ReactionOutcome;
use crate::discord::Data;
use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context};

struct ReactionTarget<'a> {
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    symbol: &'a str,
}

fn target(reaction: &serenity::Reaction) -> Option<ReactionTarget<'_>> {
    let symbol = match &reaction.emoji {
        serenity::ReactionType::Unicode(symbol) => symbol.as_str(),
        _ => return None,
    };

    Some(ReactionTarget {
        guild_id: reaction.guild_id?,
        user_id: reaction.user_id?,
        symbol,
    })
}

/// Best-effort bot check: event payload, then cache, then the API.
async fn is_bot(ctx: &Context, reaction: &serenity::Reaction, user_id: serenity::UserId) -> bool {
    if let Some(member) = reaction.member.as_ref() {
        return member.user.bot;
    }
    if let Some(user) = ctx.cache.user(user_id) {
        return user.bot;
    }
    user_id.to_user(ctx).await.map(|u| u.bot).unwrap_or(false)
}

pub async fn handle_reaction_add(
    ctx: &Context,
    data: &Data,
    reaction: &serenity::Reaction,
) -> Result<()> {
    let Some(target) = target(reaction) else {
        return Ok(());
    };
    if data.reaction_roles.map().role_for(target.symbol).is_none() {
        return Ok(());
    }

    let bot = is_bot(ctx, reaction, target.user_id).await;
    let outcome = data
        .reaction_roles
        .reaction_added(target.guild_id.get(), target.user_id.get(), bot, target.symbol)
        .await?;

    log_outcome(target.guild_id.get(), target.user_id.get(), &outcome);
    Ok(())
}

pub async fn handle_reaction_remove(
    data: &Data,
    reaction: &serenity::Reaction,
) -> Result<()> {
    let Some(target) = target(reaction) else {
        return Ok(());
    };

    let outcome = data
        .reaction_roles
        .reaction_removed(target.guild_id.get(), target.user_id.get(), target.symbol)
        .await?;

    log_outcome(target.guild_id.get(), target.user_id.get(), &outcome);
    Ok(())
}

fn log_outcome(guild_id: u64, user_id: u64, outcome: &ReactionOutcome) {
    match outcome {
        ReactionOutcome::AlreadyInSync(role) => {
            tracing::debug!(guild_id, user_id, role = %role, "Reaction role already in sync")
        }
        ReactionOutcome::Ignored => {}
        _ => tracing::debug!(guild_id, user_id, ?outcome, "Reaction handled"),
    }
}
