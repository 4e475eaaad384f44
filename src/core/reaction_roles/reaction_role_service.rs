// Reaction roles: react with an emoji to toggle a self-assignable role.
//
// Each binding is an independent toggle. Nothing here touches rank roles or
// the spending ledger.

use crate::core::directory::{DirectoryClient, DirectoryError};

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// A reaction symbol bound to a role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionBinding {
    pub symbol: String,
    pub role_name: String,
}

/// Static mapping from reaction symbol to role name.
#[derive(Debug, Clone)]
pub struct ReactionRoleMap {
    bindings: Vec<ReactionBinding>,
}

impl ReactionRoleMap {
    pub fn new(bindings: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            bindings: bindings
                .into_iter()
                .map(|(symbol, role_name)| ReactionBinding { symbol, role_name })
                .collect(),
        }
    }

    /// The community roles offered on the reaction post.
    pub fn community_roles() -> Self {
        Self::new(
            [
                ("🎉", "Giveaways"),
                ("💀", "PvP"),
                ("⚔️", "PvM"),
                ("🤖", "Botters"),
            ]
            .map(|(symbol, role)| (symbol.to_string(), role.to_string())),
        )
    }

    /// Role bound to `symbol`. "⚔" and "⚔️" are treated as the same symbol.
    pub fn role_for(&self, symbol: &str) -> Option<&str> {
        let wanted = strip_variation(symbol);
        self.bindings
            .iter()
            .find(|b| strip_variation(&b.symbol) == wanted)
            .map(|b| b.role_name.as_str())
    }

    pub fn bindings(&self) -> &[ReactionBinding] {
        &self.bindings
    }
}

impl Default for ReactionRoleMap {
    fn default() -> Self {
        Self::community_roles()
    }
}

fn strip_variation(symbol: &str) -> String {
    symbol.chars().filter(|c| *c != VARIATION_SELECTOR).collect()
}

/// Result of handling one reaction event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Symbol isn't bound, or the reactor is a bot.
    Ignored,
    Granted(String),
    Revoked(String),
    /// Member already had (or already lacked) the role.
    AlreadyInSync(String),
    /// The bound role doesn't exist in the guild.
    MissingRole(String),
}

pub struct ReactionRoleService<D: DirectoryClient> {
    directory: D,
    map: ReactionRoleMap,
}

impl<D: DirectoryClient> ReactionRoleService<D> {
    pub fn new(directory: D, map: ReactionRoleMap) -> Self {
        Self { directory, map }
    }

    pub fn map(&self) -> &ReactionRoleMap {
        &self.map
    }

    pub async fn reaction_added(
        &self,
        guild_id: u64,
        user_id: u64,
        is_bot: bool,
        symbol: &str,
    ) -> Result<ReactionOutcome, DirectoryError> {
        if is_bot {
            return Ok(ReactionOutcome::Ignored);
        }
        self.toggle(guild_id, user_id, symbol, true).await
    }

    pub async fn reaction_removed(
        &self,
        guild_id: u64,
        user_id: u64,
        symbol: &str,
    ) -> Result<ReactionOutcome, DirectoryError> {
        self.toggle(guild_id, user_id, symbol, false).await
    }

    async fn toggle(
        &self,
        guild_id: u64,
        user_id: u64,
        symbol: &str,
        grant: bool,
    ) -> Result<ReactionOutcome, DirectoryError> {
        let Some(role_name) = self.map.role_for(symbol) else {
            return Ok(ReactionOutcome::Ignored);
        };

        let Some(role) = self.directory.find_role_by_name(guild_id, role_name).await? else {
            tracing::warn!(guild_id, role = role_name, "Reaction role does not exist in guild, skipping");
            return Ok(ReactionOutcome::MissingRole(role_name.to_string()));
        };

        let held = self
            .directory
            .current_roles(guild_id, user_id)
            .await?
            .iter()
            .any(|r| r.id == role.id);

        match (grant, held) {
            (true, false) => {
                self.directory.grant_role(guild_id, user_id, role.id).await?;
                tracing::info!(user_id, guild_id, role = %role.name, "Reaction role granted");
                Ok(ReactionOutcome::Granted(role.name))
            }
            (false, true) => {
                self.directory.revoke_role(guild_id, user_id, role.id).await?;
                tracing::info!(user_id, guild_id, role = %role.name, "Reaction role removed");
                Ok(ReactionOutcome::Revoked(role.name))
            }
            _ => Ok(ReactionOutcome::AlreadyInSync(role.name)),
        }
    }
}
