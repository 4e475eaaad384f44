// Discord commands module.
// Each feature gets its own command file.

pub mod spending;

pub mod reaction_roles;

// Bot presence management
pub mod presence;
