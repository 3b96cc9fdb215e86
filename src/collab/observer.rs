use crate::station::LinkRecord;
use crate::types::{ApState, DetailedState, IpConfiguration, SupplicantState, WifiState};

// Outbound broadcasts. Every hook defaults to a no-op so consumers only
// implement what they listen to.
pub trait StationObserver {
    fn wifi_state_changed(&mut self, _state: WifiState) {}
    fn ap_state_changed(&mut self, _state: ApState) {}
    fn supplicant_connection_changed(&mut self, _connected: bool) {}
    fn supplicant_state_changed(&mut self, _state: SupplicantState) {}
    fn network_state_changed(&mut self, _state: DetailedState, _link: &LinkRecord) {}
    fn link_properties_changed(&mut self, _ip: &IpConfiguration) {}
    fn scan_results_available(&mut self, _ok: bool) {}
    fn register_helpers(&mut self) {}
    fn request_p2p_disable(&mut self) {}
}
