mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::HeraldConfig;
#[cfg(test)]
pub use types::{DEFAULT_HOST, DEFAULT_PORT};
