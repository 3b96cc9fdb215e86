pub(crate) mod auth;
pub mod debounce;
pub mod diag;
mod engine;
pub mod events;
mod machine;
mod records;
mod snapshot;
mod state_id;
mod timers;
pub mod watchdog;

#[cfg(test)]
mod tests;

pub use debounce::{qualified_rssi, should_debounce, DebounceInput};
pub use engine::{Disposition, StationEngine};
pub use events::{
    Command, ConnectTarget, IpEvent, Notification, Reply, ReplyValue, Request, StationEvent,
    TimerEvent, UnwantedReason,
};
pub use records::{AttemptKind, ConnectionAttempt, LinkRecord};
pub use snapshot::{SharedSnapshot, StationSnapshot};
pub use state_id::{StateId, StateTrace};
pub use timers::TimerQueue;
pub use watchdog::{WatchdogClass, WatchdogToken, Watchdogs};
