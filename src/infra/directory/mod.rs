pub mod serenity_directory;

pub use serenity_directory::SerenityDirectory;
