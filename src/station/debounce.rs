use crate::config::StationPolicy;
use crate::types::{Band, DisconnectReason};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceInput {
    pub screen_on: bool,
    pub already_debouncing: bool,
    pub user_disconnect_pending: bool,
    pub network_enabled: bool,
    pub last_user_selected: bool,
    pub reason: DisconnectReason,
    // Time since the lower layer last started a roam on its own, if ever.
    pub driver_roam_elapsed_ms: Option<u64>,
    pub rssi: Option<i32>,
    pub frequency_mhz: Option<u32>,
}

pub fn qualified_rssi(
    policy: &StationPolicy,
    rssi: Option<i32>,
    frequency_mhz: Option<u32>,
) -> bool {
    let (Some(rssi), Some(band)) = (rssi, frequency_mhz.and_then(Band::from_frequency)) else {
        return false;
    };
    match band {
        Band::TwoPointFourGhz => rssi > policy.qualified_rssi_24g,
        Band::FiveGhz => rssi > policy.qualified_rssi_5g,
    }
}

// A locally generated reason still debounces when the driver was mid-roam
// within the window; that race is accepted as is.
pub fn should_debounce(input: &DebounceInput, policy: &StationPolicy) -> bool {
    let driver_roaming = input
        .driver_roam_elapsed_ms
        .is_some_and(|elapsed| elapsed < u64::from(policy.driver_roam_window_ms));
    input.screen_on
        && !input.already_debouncing
        && !input.user_disconnect_pending
        && input.network_enabled
        && !input.last_user_selected
        && (!input.reason.is_locally_generated() || driver_roaming)
        && qualified_rssi(policy, input.rssi, input.frequency_mhz)
}
