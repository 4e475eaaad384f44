// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "spending/mod.rs"]
pub mod spending;

#[path = "directory/mod.rs"]
pub mod directory;
