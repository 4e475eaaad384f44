// DirectoryClient backed by the Discord API.
//
// Reads go to serenity's cache first and fall back to HTTP, because the cache
// may not have every guild or member (e.g. right after start-up). Writes always
// go through HTTP.

use crate::core::directory::{DirectoryClient, DirectoryError, RoleRef};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const AUDIT_REASON: &str = "GP spending bot";

pub struct SerenityDirectory {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityDirectory {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }

    async fn guild_roles(&self, guild_id: serenity::GuildId) -> Result<Vec<RoleRef>, DirectoryError> {
        // Copy out of the cache guard before awaiting anything.
        let cached: Option<Vec<RoleRef>> = self.cache.guild(guild_id).map(|guild| {
            guild
                .roles
                .values()
                .map(|role| RoleRef::new(role.id.get(), role.name.clone()))
                .collect()
        });

        if let Some(roles) = cached {
            return Ok(roles);
        }

        let roles = self
            .http
            .get_guild_roles(guild_id)
            .await
            .map_err(|_| DirectoryError::UnknownGuild(guild_id.get()))?;

        Ok(roles
            .into_iter()
            .map(|role| RoleRef::new(role.id.get(), role.name))
            .collect())
    }

    async fn member_role_ids(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
    ) -> Result<Vec<serenity::RoleId>, DirectoryError> {
        let cached = self
            .cache
            .member(guild_id, user_id)
            .map(|member| member.roles.clone());

        if let Some(roles) = cached {
            return Ok(roles);
        }

        let member = self
            .http
            .get_member(guild_id, user_id)
            .await
            .map_err(|_| DirectoryError::UnknownMember {
                guild_id: guild_id.get(),
                user_id: user_id.get(),
            })?;

        Ok(member.roles)
    }
}

fn request_error(e: serenity::Error) -> DirectoryError {
    DirectoryError::Request(e.to_string())
}

#[async_trait]
impl DirectoryClient for SerenityDirectory {
    async fn find_role_by_name(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<RoleRef>, DirectoryError> {
        let roles = self.guild_roles(serenity::GuildId::new(guild_id)).await?;
        Ok(roles.into_iter().find(|role| role.name == name))
    }

    async fn current_roles(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<RoleRef>, DirectoryError> {
        let guild = serenity::GuildId::new(guild_id);
        let held = self
            .member_role_ids(guild, serenity::UserId::new(user_id))
            .await?;
        let roles = self.guild_roles(guild).await?;

        Ok(roles
            .into_iter()
            .filter(|role| held.iter().any(|id| id.get() == role.id))
            .collect())
    }

    async fn grant_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), DirectoryError> {
        self.http
            .add_member_role(
                serenity::GuildId::new(guild_id),
                serenity::UserId::new(user_id),
                serenity::RoleId::new(role_id),
                Some(AUDIT_REASON),
            )
            .await
            .map_err(request_error)
    }

    async fn revoke_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), DirectoryError> {
        self.http
            .remove_member_role(
                serenity::GuildId::new(guild_id),
                serenity::UserId::new(user_id),
                serenity::RoleId::new(role_id),
                Some(AUDIT_REASON),
            )
            .await
            .map_err(request_error)
    }
}
