pub mod gitignore;
pub mod paths;
pub mod state;
