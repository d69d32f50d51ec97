pub mod todo;
pub mod project;
pub mod config;

pub use todo::*;
pub use project::*;
pub use config::*;
