pub mod catalog;
pub mod config;
pub mod gateway;
pub mod state;
pub mod sync;
pub mod testing;

mod fs_util;

pub use catalog::{CardEntry, CatalogError, CatalogPolicy, CatalogSnapshot, SetEntry};
pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config, ConfigError,
};
pub use gateway::{CatalogSource, GatewayError, MtgjsonSource, RemoteGateway, ScryfallGateway};
pub use state::{StateError, StateStore};
pub use sync::{
    FixedVersionGate, RunOutcome, RunReport, SyncError, SyncOrchestrator, VersionGate,
};
