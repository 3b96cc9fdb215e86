use core::sync::atomic::{AtomicU32, Ordering};

use log::info;

use super::state_id::StateId;

static STATION_TRANSITIONS: AtomicU32 = AtomicU32::new(0);
static STATION_DEFERRALS: AtomicU32 = AtomicU32::new(0);
static STATION_UNHANDLED: AtomicU32 = AtomicU32::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Counters {
    pub transitions: u32,
    pub deferrals: u32,
    pub unhandled: u32,
}

// Process-wide; every engine in the process adds to the same counters.
pub fn counters() -> Counters {
    Counters {
        transitions: STATION_TRANSITIONS.load(Ordering::Relaxed),
        deferrals: STATION_DEFERRALS.load(Ordering::Relaxed),
        unhandled: STATION_UNHANDLED.load(Ordering::Relaxed),
    }
}

pub(crate) fn note_deferral() {
    STATION_DEFERRALS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_unhandled() {
    STATION_UNHANDLED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn emit_transition(from: StateId, to: StateId, trigger: &str, at_ms: u64) {
    STATION_TRANSITIONS.fetch_add(1, Ordering::Relaxed);
    info!(
        "NET_EVENT {{\"from\":\"{}\",\"to\":\"{}\",\"trigger\":\"{}\",\"at_ms\":{}}}",
        from.as_str(),
        to.as_str(),
        trigger,
        at_ms
    );
}
