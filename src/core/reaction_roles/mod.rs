pub mod reaction_role_service;

pub use reaction_role_service::{ReactionOutcome, ReactionRoleMap, ReactionRoleService};
