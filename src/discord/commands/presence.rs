// Bot presence. Discord-layer glue only: it works with serenity types and
// never calls into the core.

use poise::serenity_prelude as serenity;

/// Called once the bot is ready so members can see what it does.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("GP spending");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
