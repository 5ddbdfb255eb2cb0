mod types;

pub use types::BootstrapConfig;
