// The member/role directory is owned by the chat platform, not by us.
//
// This is the "port" both features talk through. The core only ever sees role
// ids and names; the infra layer decides how those map to real API calls.

use async_trait::async_trait;
use thiserror::Error;

/// A role as the directory reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleRef {
    pub id: u64,
    pub name: String,
}

impl RoleRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Guild {0} is not available")]
    UnknownGuild(u64),

    #[error("Member {user_id} not found in guild {guild_id}")]
    UnknownMember { guild_id: u64, user_id: u64 },

    #[error("Directory request failed: {0}")]
    Request(String),
}

/// Read and mutate role assignments in the external directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Look up a guild role by its exact name. `None` if no such role exists.
    async fn find_role_by_name(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<RoleRef>, DirectoryError>;

    /// Roles the member currently holds.
    async fn current_roles(&self, guild_id: u64, user_id: u64)
        -> Result<Vec<RoleRef>, DirectoryError>;

    /// Give a role to a member. Granting a held role is a no-op.
    async fn grant_role(&self, guild_id: u64, user_id: u64, role_id: u64)
        -> Result<(), DirectoryError>;

    /// Take a role from a member. Revoking a role that isn't held is a no-op.
    async fn revoke_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), DirectoryError>;
}

#[cfg(test)]
pub mod fake {
    //! Recording directory shared by the core tests.

    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Grant { user_id: u64, role: String },
        Revoke { user_id: u64, role: String },
    }

    #[derive(Default)]
    pub struct FakeDirectory {
        roles: Vec<RoleRef>,
        members: Mutex<HashMap<u64, HashSet<u64>>>,
        calls: Mutex<Vec<Call>>,
        fail_mutations: bool,
        absent: HashSet<u64>,
    }

    impl FakeDirectory {
        /// Guild with one role per name; ids are assigned in order starting at 1.
        pub fn with_roles(names: &[&str]) -> Self {
            Self {
                roles: names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| RoleRef::new(i as u64 + 1, *name))
                    .collect(),
                ..Default::default()
            }
        }

        pub fn failing(mut self) -> Self {
            self.fail_mutations = true;
            self
        }

        /// Treat `user_id` as someone who is not in the guild.
        pub fn without_member(mut self, user_id: u64) -> Self {
            self.absent.insert(user_id);
            self
        }

        fn check_member(&self, guild_id: u64, user_id: u64) -> Result<(), DirectoryError> {
            if self.absent.contains(&user_id) {
                return Err(DirectoryError::UnknownMember { guild_id, user_id });
            }
            Ok(())
        }

        pub fn give(&self, user_id: u64, name: &str) {
            let id = self.role_id(name);
            self.members
                .lock()
                .unwrap()
                .entry(user_id)
                .or_default()
                .insert(id);
        }

        pub fn role_names(&self, user_id: u64) -> Vec<String> {
            let members = self.members.lock().unwrap();
            let mut names: Vec<String> = self
                .roles
                .iter()
                .filter(|r| members.get(&user_id).is_some_and(|held| held.contains(&r.id)))
                .map(|r| r.name.clone())
                .collect();
            names.sort();
            names
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn role_id(&self, name: &str) -> u64 {
            self.roles
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.id)
                .unwrap_or_else(|| panic!("test role {name} not configured"))
        }

        fn role_name(&self, id: u64) -> String {
            self.roles
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.name.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl DirectoryClient for FakeDirectory {
        async fn find_role_by_name(
            &self,
            _guild_id: u64,
            name: &str,
        ) -> Result<Option<RoleRef>, DirectoryError> {
            Ok(self.roles.iter().find(|r| r.name == name).cloned())
        }

        async fn current_roles(
            &self,
            guild_id: u64,
            user_id: u64,
        ) -> Result<Vec<RoleRef>, DirectoryError> {
            self.check_member(guild_id, user_id)?;
            let members = self.members.lock().unwrap();
            let held = members.get(&user_id).cloned().unwrap_or_default();
            Ok(self
                .roles
                .iter()
                .filter(|r| held.contains(&r.id))
                .cloned()
                .collect())
        }

        async fn grant_role(
            &self,
            guild_id: u64,
            user_id: u64,
            role_id: u64,
        ) -> Result<(), DirectoryError> {
            self.check_member(guild_id, user_id)?;
            if self.fail_mutations {
                return Err(DirectoryError::Request("missing permissions".into()));
            }
            self.calls.lock().unwrap().push(Call::Grant {
                user_id,
                role: self.role_name(role_id),
            });
            self.members
                .lock()
                .unwrap()
                .entry(user_id)
                .or_default()
                .insert(role_id);
            Ok(())
        }

        async fn revoke_role(
            &self,
            guild_id: u64,
            user_id: u64,
            role_id: u64,
        ) -> Result<(), DirectoryError> {
            self.check_member(guild_id, user_id)?;
            if self.fail_mutations {
                return Err(DirectoryError::Request("missing permissions".into()));
            }
            self.calls.lock().unwrap().push(Call::Revoke {
                user_id,
                role: self.role_name(role_id),
            });
            if let Some(held) = self.members.lock().unwrap().get_mut(&user_id) {
                held.remove(&role_id);
            }
            Ok(())
        }
    }
}
