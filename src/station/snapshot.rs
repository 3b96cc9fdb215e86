use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::types::{ApState, OperationalMode, SupplicantState, WifiState};

use super::machine::StationHsm;
use super::records::{ConnectionAttempt, LinkRecord};
use super::state_id::StateId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationSnapshot {
    pub state: StateId,
    pub wifi_state: WifiState,
    pub ap_state: ApState,
    pub supplicant_state: SupplicantState,
    pub mode: OperationalMode,
    pub link: LinkRecord,
    pub attempt: Option<ConnectionAttempt>,
    pub teardowns: u32,
    pub at_ms: u64,
}

impl StationSnapshot {
    pub(super) fn capture(hsm: &StationHsm, at_ms: u64) -> Self {
        Self {
            state: hsm.leaf,
            wifi_state: hsm.wifi_state,
            ap_state: hsm.ap_state,
            supplicant_state: hsm.l2_state,
            mode: hsm.mode,
            link: hsm.link.clone(),
            attempt: hsm.attempt,
            teardowns: hsm.teardowns,
            at_ms,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == StateId::Connected
    }
}

// Last published snapshot, readable from any thread without touching the
// station loop.
pub struct SharedSnapshot {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<StationSnapshot>>>,
}

impl SharedSnapshot {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn publish(&self, snapshot: StationSnapshot) {
        self.inner.lock(|cell| {
            *cell.borrow_mut() = Some(snapshot);
        });
    }

    pub fn latest(&self) -> Option<StationSnapshot> {
        self.inner.lock(|cell| cell.borrow().clone())
    }
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
