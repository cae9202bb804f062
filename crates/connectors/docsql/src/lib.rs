pub mod cli;
pub mod state;
pub mod store;

pub use store::{Collection, DocumentStore};
