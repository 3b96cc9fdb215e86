use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::info;
use station_fsm::collab::{
    ConfigStore, DisableReason, IpProvisioner, ProvisioningRequest, RadioControl,
    ScanOffloadSettings, StationObserver,
};
use station_fsm::station::LinkRecord;
use station_fsm::types::{
    ApConfig, ApState, Bssid, CallerIdentity, DetailedState, FrequencyBand, IpConfiguration,
    NetworkConfig, NetworkId, SupplicantState, WifiState,
};

const DEFAULT_SIGNAL_POLL: &str = "RSSI=-55\nLINKSPEED=72\nFREQUENCY=2437";
const DEFAULT_WPS_PIN: &str = "12345670";
const FIRST_SAVED_ID: u32 = 100;

fn lock<T>(shared: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct RadioScriptState {
    calls: Vec<String>,
    failing: Vec<String>,
    signal: Option<String>,
    hal_down: bool,
}

// Radio that accepts everything except commands matching a scripted failure
// prefix, and keeps every call for the report.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRadio {
    state: Arc<Mutex<RadioScriptState>>,
}

impl ScriptedRadio {
    pub fn new(failing: Vec<String>, signal: Option<String>, hal_down: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(RadioScriptState {
                calls: Vec::new(),
                failing,
                signal,
                hal_down,
            })),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    fn call(&mut self, name: String) -> bool {
        let mut state = lock(&self.state);
        let ok = !state
            .failing
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()));
        state.calls.push(name);
        ok
    }
}

impl RadioControl for ScriptedRadio {
    fn load_driver(&mut self) -> bool {
        self.call("load_driver".into())
    }

    fn unload_driver(&mut self) -> bool {
        self.call("unload_driver".into())
    }

    fn start_supplicant(&mut self) -> bool {
        self.call("start_supplicant".into())
    }

    fn kill_supplicant(&mut self) -> bool {
        self.call("kill_supplicant".into())
    }

    fn start_monitoring(&mut self) -> bool {
        self.call("start_monitoring".into())
    }

    fn stop_monitoring(&mut self) {
        self.call("stop_monitoring".into());
    }

    fn bool_command(&mut self, command: &str) -> bool {
        self.call(command.to_string())
    }

    fn string_command(&mut self, command: &str) -> Option<String> {
        if !self.call(command.to_string()) {
            return None;
        }
        if command == "SIGNAL_POLL" {
            let signal = lock(&self.state).signal.clone();
            return Some(signal.unwrap_or_else(|| DEFAULT_SIGNAL_POLL.to_string()));
        }
        if command.starts_with("WPS_PIN") {
            return Some(DEFAULT_WPS_PIN.to_string());
        }
        Some("OK".to_string())
    }

    fn start_soft_ap(&mut self, config: &ApConfig) -> bool {
        self.call(format!("start_soft_ap {} {}", config.ssid, config.channel))
    }

    fn stop_soft_ap(&mut self) -> bool {
        self.call("stop_soft_ap".into())
    }

    fn hal_started(&self) -> bool {
        !lock(&self.state).hal_down
    }

    fn hal_start_scan_offload(&mut self, settings: &ScanOffloadSettings) -> bool {
        self.call(format!("hal_start_scan_offload {}", settings.interval_ms))
    }

    fn hal_stop_scan_offload(&mut self) -> bool {
        self.call("hal_stop_scan_offload".into())
    }

    fn hal_start_rssi_monitoring(&mut self, max_rssi: i8, min_rssi: i8) -> bool {
        self.call(format!("hal_start_rssi_monitoring {max_rssi} {min_rssi}"))
    }

    fn hal_stop_rssi_monitoring(&mut self) -> bool {
        self.call("hal_stop_rssi_monitoring".into())
    }

    fn hal_install_packet_filter(&mut self, program: &[u8]) -> bool {
        self.call(format!("hal_install_packet_filter {}", program.len()))
    }

    fn hal_channels_for_band(&mut self, band: FrequencyBand) -> Option<Vec<u32>> {
        if !self.call(format!("hal_channels_for_band {}", band.as_u8())) {
            return None;
        }
        Some(match band {
            FrequencyBand::FiveGhzOnly => vec![5180, 5200, 5220, 5240],
            FrequencyBand::TwoGhzOnly => vec![2412, 2437, 2462],
            FrequencyBand::Auto => vec![2412, 2437, 2462, 5180, 5200, 5220, 5240],
        })
    }
}

#[derive(Debug, Default)]
struct StoreScriptState {
    networks: BTreeMap<NetworkId, NetworkConfig>,
    disabled: Vec<NetworkId>,
    channels: BTreeMap<NetworkId, Vec<u32>>,
    last_selected: Option<NetworkId>,
    next_id: u32,
}

// In-memory network list seeded from the scenario file.
#[derive(Clone, Debug, Default)]
pub struct ScriptedStore {
    state: Arc<Mutex<StoreScriptState>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        let store = Self::default();
        lock(&store.state).next_id = FIRST_SAVED_ID;
        store
    }

    pub fn seed(&self, id: NetworkId, mut config: NetworkConfig, channels: Vec<u32>) {
        config.id = Some(id);
        let mut state = lock(&self.state);
        state.networks.insert(id, config);
        state.channels.insert(id, channels);
    }

    pub fn disable(&self, id: NetworkId) {
        lock(&self.state).disabled.push(id);
    }
}

impl ConfigStore for ScriptedStore {
    fn load_networks(&mut self) {
        info!("store: {} networks loaded", lock(&self.state).networks.len());
    }

    fn network(&self, id: NetworkId) -> Option<NetworkConfig> {
        lock(&self.state).networks.get(&id).cloned()
    }

    fn save_network(
        &mut self,
        mut config: NetworkConfig,
        _caller: CallerIdentity,
    ) -> Option<NetworkId> {
        let mut state = lock(&self.state);
        let id = match config.id {
            Some(id) => id,
            None => {
                let id = NetworkId(state.next_id);
                state.next_id += 1;
                id
            }
        };
        config.id = Some(id);
        state.networks.insert(id, config);
        Some(id)
    }

    fn forget_network(&mut self, id: NetworkId) -> bool {
        let mut state = lock(&self.state);
        state.disabled.retain(|disabled| *disabled != id);
        state.networks.remove(&id).is_some()
    }

    fn select_network(&mut self, id: NetworkId) -> bool {
        let mut state = lock(&self.state);
        if !state.networks.contains_key(&id) {
            return false;
        }
        state.disabled.retain(|disabled| *disabled != id);
        true
    }

    fn enable_network(&mut self, id: NetworkId, disable_others: bool) -> bool {
        let mut state = lock(&self.state);
        if !state.networks.contains_key(&id) {
            return false;
        }
        if disable_others {
            state.disabled = state.networks.keys().copied().filter(|other| *other != id).collect();
        } else {
            state.disabled.retain(|disabled| *disabled != id);
        }
        true
    }

    fn disable_network(&mut self, id: NetworkId, reason: DisableReason) -> bool {
        let mut state = lock(&self.state);
        if !state.networks.contains_key(&id) {
            return false;
        }
        info!("store: network {id} disabled ({reason:?})");
        if !state.disabled.contains(&id) {
            state.disabled.push(id);
        }
        true
    }

    fn enable_all_networks(&mut self) {
        lock(&self.state).disabled.clear();
    }

    fn disable_all_networks(&mut self) {
        let mut state = lock(&self.state);
        state.disabled = state.networks.keys().copied().collect();
    }

    fn is_network_enabled(&self, id: NetworkId) -> bool {
        let state = lock(&self.state);
        state.networks.contains_key(&id) && !state.disabled.contains(&id)
    }

    fn last_selected(&self) -> Option<NetworkId> {
        lock(&self.state).last_selected
    }

    fn set_last_selected(&mut self, id: Option<NetworkId>) {
        lock(&self.state).last_selected = id;
    }

    fn known_channels(&self, id: NetworkId) -> Vec<u32> {
        lock(&self.state)
            .channels
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    fn note_connected(&mut self, id: NetworkId, bssid: Option<Bssid>) {
        match bssid {
            Some(bssid) => info!("store: network {id} connected via {bssid}"),
            None => info!("store: network {id} connected"),
        }
    }

    fn note_association_rejection(&mut self, id: Option<NetworkId>, bssid: Option<Bssid>) {
        info!("store: association rejected id={id:?} bssid={bssid:?}");
    }

    fn note_authentication_failure(&mut self, id: NetworkId) {
        info!("store: authentication failure on network {id}");
    }

    fn note_ip_failure(&mut self, id: NetworkId) {
        info!("store: ip failure on network {id}");
    }

    fn note_no_internet(&mut self, id: NetworkId) {
        info!("store: no internet on network {id}");
    }
}

// The scenario drives provisioning results itself through `ip` steps.
#[derive(Debug, Default)]
pub struct ScriptedIp;

impl IpProvisioner for ScriptedIp {
    fn start(&mut self, request: ProvisioningRequest) {
        match request {
            ProvisioningRequest::Dhcp { network_id } => {
                info!("ip: dhcp started for network {network_id}")
            }
            ProvisioningRequest::Static(ip) => {
                info!("ip: static {}/{}", ip.address, ip.prefix_len)
            }
        }
    }

    fn stop(&mut self) {
        info!("ip: stopped");
    }

    fn complete_pre_dhcp_action(&mut self) {
        info!("ip: pre-dhcp acknowledged");
    }
}

// Broadcast sink that prints every change the station announces.
#[derive(Debug, Default)]
pub struct LogObserver;

impl StationObserver for LogObserver {
    fn wifi_state_changed(&mut self, state: WifiState) {
        info!("broadcast: wifi {}", state.as_str());
    }

    fn ap_state_changed(&mut self, state: ApState) {
        info!("broadcast: ap {}", state.as_str());
    }

    fn supplicant_connection_changed(&mut self, connected: bool) {
        info!("broadcast: supplicant connection {connected}");
    }

    fn supplicant_state_changed(&mut self, state: SupplicantState) {
        info!("broadcast: supplicant {}", state.as_str());
    }

    fn network_state_changed(&mut self, state: DetailedState, link: &LinkRecord) {
        match link.network_id {
            Some(id) => info!("broadcast: network {} ({id})", state.as_str()),
            None => info!("broadcast: network {}", state.as_str()),
        }
    }

    fn link_properties_changed(&mut self, ip: &IpConfiguration) {
        info!("broadcast: link {}/{}", ip.address, ip.prefix_len);
    }

    fn scan_results_available(&mut self, ok: bool) {
        info!("broadcast: scan results ok={ok}");
    }

    fn request_p2p_disable(&mut self) {
        info!("broadcast: p2p disable requested");
    }
}
