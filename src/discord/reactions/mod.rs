// Reaction-role event adapters.

#[path = "reaction_events.rs"]
pub mod events;
