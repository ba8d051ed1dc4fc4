mod loader;
mod types;

pub use loader::{ConfigLoader, PolicyList};
pub use types::HatchConfig;
