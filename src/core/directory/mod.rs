pub mod directory_client;

pub use directory_client::{DirectoryClient, DirectoryError, RoleRef};

#[cfg(test)]
pub use directory_client::fake;
