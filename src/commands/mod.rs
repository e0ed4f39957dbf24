mod compare;
mod import;
mod list;

pub use compare::compare;
pub use import::import;
pub use list::{elections, regions};

pub type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;
