pub mod error;
pub mod misc;
pub mod command_file;
pub mod intent;
pub mod script;
pub mod fixtures;

pub use error::{PersistenceError, Result};
