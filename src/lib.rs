pub mod collab;
pub mod config;
pub mod error;
#[cfg(feature = "runtime")]
pub mod runtime;
pub mod station;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use collab::Collaborators;
pub use config::StationPolicy;
pub use error::CommandError;
#[cfg(feature = "policy-file")]
pub use error::PolicyError;
pub use station::{Disposition, StateId, StationEngine, StationSnapshot};
