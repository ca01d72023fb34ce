pub mod engine_config;
pub mod events;
pub mod ledger;

pub use engine_config::*;
pub use events::*;
pub use ledger::*;
