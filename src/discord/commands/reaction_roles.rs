// Command that posts the reaction-role message.

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Create a reaction role message (admin only)
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn react(ctx: Context<'_>) -> Result<(), Error> {
    // Adding several reactions can outlast the interaction deadline
    ctx.defer_ephemeral().await?;

    let message = ctx.channel_id().say(ctx.http(), "React here").await?;

    for binding in ctx.data().reaction_roles.map().bindings() {
        message
            .react(ctx.serenity_context(), serenity::ReactionType::Unicode(binding.symbol.clone()))
            .await?;
    }

    ctx.send(
        poise::CreateReply::default()
            .content("Reaction role message created!")
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
