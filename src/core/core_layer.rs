// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "directory/mod.rs"]
pub mod directory;

#[path = "spending/mod.rs"]
pub mod spending;

#[path = "reaction_roles/mod.rs"]
pub mod reaction_roles;
