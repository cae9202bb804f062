pub mod fixtures;
pub mod store;
