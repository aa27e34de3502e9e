pub mod config;
pub mod error;
pub mod record;
pub mod table;

pub use config::MatchConfig;
pub use error::*;
pub use record::*;
pub use table::{Group, TruthTable};
