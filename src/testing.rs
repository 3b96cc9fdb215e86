use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::collab::{
    Collaborators, ConfigStore, DisableReason, IpProvisioner, ProvisioningRequest, RadioControl,
    ScanOffloadSettings, SimAuthenticator, StationObserver,
};
use crate::config::StationPolicy;
use crate::error::CommandError;
use crate::station::{
    Command, IpEvent, LinkRecord, Notification, Reply, ReplyValue, StateId, StationEngine,
    StationEvent,
};
use crate::types::{
    ApConfig, ApState, Bssid, CallerIdentity, DetailedState, DisconnectReason, FrequencyBand,
    IpConfiguration, NetworkConfig, NetworkId, RequestId, SimAuthRequest, SupplicantState,
    WifiState,
};

fn lock<T>(shared: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    shared.lock().expect("fake state poisoned")
}

pub(crate) const HOME: NetworkId = NetworkId(1);
pub(crate) const OFFICE: NetworkId = NetworkId(2);
pub(crate) const AP_A: Bssid = Bssid([0x02, 0x11, 0x22, 0x33, 0x44, 0x01]);
pub(crate) const AP_B: Bssid = Bssid([0x02, 0x11, 0x22, 0x33, 0x44, 0x02]);

#[derive(Debug, Default)]
pub(crate) struct RadioState {
    pub(crate) calls: Vec<String>,
    pub(crate) failing: Vec<String>,
    pub(crate) signal: Option<String>,
    pub(crate) hal_down: bool,
}

// Records every primitive and command by name; any call whose name starts
// with an entry of `failing` reports failure.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakeRadio {
    pub(crate) state: Arc<Mutex<RadioState>>,
}

impl FakeRadio {
    fn record(&self, call: &str) -> bool {
        let mut state = lock(&self.state);
        state.calls.push(call.to_string());
        !state.failing.iter().any(|prefix| call.starts_with(prefix.as_str()))
    }

    pub(crate) fn fail(&self, prefix: &str) {
        lock(&self.state).failing.push(prefix.to_string());
    }

    pub(crate) fn heal(&self) {
        lock(&self.state).failing.clear();
    }

    pub(crate) fn set_signal(&self, reply: &str) {
        lock(&self.state).signal = Some(reply.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|recorded| recorded.as_str() == call)
            .count()
    }

    pub(crate) fn count_prefix(&self, prefix: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|recorded| recorded.starts_with(prefix))
            .count()
    }

    pub(crate) fn clear(&self) {
        lock(&self.state).calls.clear();
    }
}

impl RadioControl for FakeRadio {
    fn load_driver(&mut self) -> bool {
        self.record("load_driver")
    }

    fn unload_driver(&mut self) -> bool {
        self.record("unload_driver")
    }

    fn start_supplicant(&mut self) -> bool {
        self.record("start_supplicant")
    }

    fn kill_supplicant(&mut self) -> bool {
        self.record("kill_supplicant")
    }

    fn start_monitoring(&mut self) -> bool {
        self.record("start_monitoring")
    }

    fn stop_monitoring(&mut self) {
        self.record("stop_monitoring");
    }

    fn bool_command(&mut self, command: &str) -> bool {
        self.record(command)
    }

    fn string_command(&mut self, command: &str) -> Option<String> {
        if !self.record(command) {
            return None;
        }
        if command == "SIGNAL_POLL" {
            let signal = lock(&self.state).signal.clone();
            return Some(signal.unwrap_or_else(|| "RSSI=-55\nLINKSPEED=72\nFREQUENCY=2437".into()));
        }
        if command.starts_with("WPS_PIN") {
            return Some("12345670".into());
        }
        Some("OK".into())
    }

    fn start_soft_ap(&mut self, _config: &ApConfig) -> bool {
        self.record("start_soft_ap")
    }

    fn stop_soft_ap(&mut self) -> bool {
        self.record("stop_soft_ap")
    }

    fn hal_started(&self) -> bool {
        !lock(&self.state).hal_down
    }

    fn hal_start_scan_offload(&mut self, _settings: &ScanOffloadSettings) -> bool {
        self.record("hal_start_scan_offload")
    }

    fn hal_stop_scan_offload(&mut self) -> bool {
        self.record("hal_stop_scan_offload")
    }

    fn hal_start_rssi_monitoring(&mut self, max_rssi: i8, min_rssi: i8) -> bool {
        self.record(&format!("hal_start_rssi_monitoring {max_rssi} {min_rssi}"))
    }

    fn hal_stop_rssi_monitoring(&mut self) -> bool {
        self.record("hal_stop_rssi_monitoring")
    }

    fn hal_install_packet_filter(&mut self, program: &[u8]) -> bool {
        self.record(&format!("hal_install_packet_filter {}", program.len()))
    }

    fn hal_channels_for_band(&mut self, _band: FrequencyBand) -> Option<Vec<u32>> {
        self.record("hal_channels_for_band")
            .then(|| vec![2412, 2437, 2462])
    }
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) networks: BTreeMap<u32, NetworkConfig>,
    pub(crate) disabled: Vec<NetworkId>,
    pub(crate) last_selected: Option<NetworkId>,
    pub(crate) notes: Vec<String>,
    pub(crate) loads: usize,
    pub(crate) enable_all: usize,
    pub(crate) disable_all: usize,
    pub(crate) next_id: u32,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct FakeStore {
    pub(crate) state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    pub(crate) fn seeded() -> Self {
        let store = Self::default();
        {
            let mut state = lock(&store.state);
            state.next_id = 10;
            let home = NetworkConfig::wpa_psk("home", "correct horse").expect("home config");
            let office = NetworkConfig::open("office").expect("office config");
            state.networks.insert(HOME.0, home);
            state.networks.insert(OFFICE.0, office);
        }
        store
    }

    pub(crate) fn notes(&self) -> Vec<String> {
        lock(&self.state).notes.clone()
    }

    pub(crate) fn last_selected_id(&self) -> Option<NetworkId> {
        lock(&self.state).last_selected
    }

    pub(crate) fn insert(&self, id: NetworkId, config: NetworkConfig) {
        lock(&self.state).networks.insert(id.0, config);
    }

    pub(crate) fn contains(&self, id: NetworkId) -> bool {
        lock(&self.state).networks.contains_key(&id.0)
    }

    pub(crate) fn is_disabled(&self, id: NetworkId) -> bool {
        lock(&self.state).disabled.contains(&id)
    }
}

impl ConfigStore for FakeStore {
    fn load_networks(&mut self) {
        lock(&self.state).loads += 1;
    }

    fn network(&self, id: NetworkId) -> Option<NetworkConfig> {
        lock(&self.state).networks.get(&id.0).cloned()
    }

    fn save_network(
        &mut self,
        mut config: NetworkConfig,
        _caller: CallerIdentity,
    ) -> Option<NetworkId> {
        let mut state = lock(&self.state);
        let id = config.id.unwrap_or_else(|| {
            state.next_id += 1;
            NetworkId(state.next_id)
        });
        config.id = Some(id);
        state.networks.insert(id.0, config);
        Some(id)
    }

    fn forget_network(&mut self, id: NetworkId) -> bool {
        lock(&self.state).networks.remove(&id.0).is_some()
    }

    fn select_network(&mut self, id: NetworkId) -> bool {
        let state = lock(&self.state);
        state.networks.contains_key(&id.0)
    }

    fn enable_network(&mut self, id: NetworkId, disable_others: bool) -> bool {
        let mut state = lock(&self.state);
        if !state.networks.contains_key(&id.0) {
            return false;
        }
        if disable_others {
            state.disabled = state.networks.keys().map(|key| NetworkId(*key)).collect();
        }
        state.disabled.retain(|disabled| *disabled != id);
        true
    }

    fn disable_network(&mut self, id: NetworkId, _reason: DisableReason) -> bool {
        let mut state = lock(&self.state);
        if !state.networks.contains_key(&id.0) {
            return false;
        }
        if !state.disabled.contains(&id) {
            state.disabled.push(id);
        }
        true
    }

    fn enable_all_networks(&mut self) {
        let mut state = lock(&self.state);
        state.enable_all += 1;
        state.disabled.clear();
    }

    fn disable_all_networks(&mut self) {
        let mut state = lock(&self.state);
        state.disable_all += 1;
        state.disabled = state.networks.keys().map(|key| NetworkId(*key)).collect();
    }

    fn is_network_enabled(&self, id: NetworkId) -> bool {
        let state = lock(&self.state);
        state.networks.contains_key(&id.0) && !state.disabled.contains(&id)
    }

    fn last_selected(&self) -> Option<NetworkId> {
        lock(&self.state).last_selected
    }

    fn set_last_selected(&mut self, id: Option<NetworkId>) {
        lock(&self.state).last_selected = id;
    }

    fn known_channels(&self, _id: NetworkId) -> Vec<u32> {
        vec![2437, 5180]
    }

    fn note_connected(&mut self, id: NetworkId, _bssid: Option<Bssid>) {
        lock(&self.state).notes.push(format!("connected {id}"));
    }

    fn note_association_rejection(&mut self, id: Option<NetworkId>, _bssid: Option<Bssid>) {
        let id = id.map_or_else(|| String::from("-"), |id| id.to_string());
        lock(&self.state).notes.push(format!("assoc_reject {id}"));
    }

    fn note_authentication_failure(&mut self, id: NetworkId) {
        lock(&self.state).notes.push(format!("auth_failure {id}"));
    }

    fn note_ip_failure(&mut self, id: NetworkId) {
        lock(&self.state).notes.push(format!("ip_failure {id}"));
    }

    fn note_no_internet(&mut self, id: NetworkId) {
        lock(&self.state).notes.push(format!("no_internet {id}"));
    }
}

#[derive(Debug, Default)]
pub(crate) struct IpState {
    pub(crate) starts: Vec<ProvisioningRequest>,
    pub(crate) stops: usize,
    pub(crate) pre_dhcp_done: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct FakeIp {
    pub(crate) state: Arc<Mutex<IpState>>,
}

impl FakeIp {
    pub(crate) fn starts(&self) -> Vec<ProvisioningRequest> {
        lock(&self.state).starts.clone()
    }

    pub(crate) fn stops(&self) -> usize {
        lock(&self.state).stops
    }

    pub(crate) fn pre_dhcp_done(&self) -> usize {
        lock(&self.state).pre_dhcp_done
    }
}

impl IpProvisioner for FakeIp {
    fn start(&mut self, request: ProvisioningRequest) {
        lock(&self.state).starts.push(request);
    }

    fn stop(&mut self) {
        lock(&self.state).stops += 1;
    }

    fn complete_pre_dhcp_action(&mut self) {
        lock(&self.state).pre_dhcp_done += 1;
    }
}

#[derive(Debug, Default)]
pub(crate) struct ObserverState {
    pub(crate) wifi: Vec<WifiState>,
    pub(crate) ap: Vec<ApState>,
    pub(crate) supplicant_connection: Vec<bool>,
    pub(crate) supplicant: Vec<SupplicantState>,
    pub(crate) network: Vec<(DetailedState, Option<NetworkId>)>,
    pub(crate) link_properties: usize,
    pub(crate) scan_results: Vec<bool>,
    pub(crate) helpers_registered: usize,
    pub(crate) p2p_disable_requests: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct FakeObserver {
    pub(crate) state: Arc<Mutex<ObserverState>>,
}

impl FakeObserver {
    pub(crate) fn wifi(&self) -> Vec<WifiState> {
        lock(&self.state).wifi.clone()
    }

    pub(crate) fn ap(&self) -> Vec<ApState> {
        lock(&self.state).ap.clone()
    }

    pub(crate) fn network(&self) -> Vec<(DetailedState, Option<NetworkId>)> {
        lock(&self.state).network.clone()
    }

    pub(crate) fn detailed_count(&self, detailed: DetailedState) -> usize {
        lock(&self.state)
            .network
            .iter()
            .filter(|(state, _)| *state == detailed)
            .count()
    }

    pub(crate) fn view(&self) -> MutexGuard<'_, ObserverState> {
        lock(&self.state)
    }
}

impl StationObserver for FakeObserver {
    fn wifi_state_changed(&mut self, state: WifiState) {
        lock(&self.state).wifi.push(state);
    }

    fn ap_state_changed(&mut self, state: ApState) {
        lock(&self.state).ap.push(state);
    }

    fn supplicant_connection_changed(&mut self, connected: bool) {
        lock(&self.state).supplicant_connection.push(connected);
    }

    fn supplicant_state_changed(&mut self, state: SupplicantState) {
        lock(&self.state).supplicant.push(state);
    }

    fn network_state_changed(&mut self, state: DetailedState, link: &LinkRecord) {
        lock(&self.state).network.push((state, link.network_id));
    }

    fn link_properties_changed(&mut self, _ip: &IpConfiguration) {
        lock(&self.state).link_properties += 1;
    }

    fn scan_results_available(&mut self, ok: bool) {
        lock(&self.state).scan_results.push(ok);
    }

    fn register_helpers(&mut self) {
        lock(&self.state).helpers_registered += 1;
    }

    fn request_p2p_disable(&mut self) {
        lock(&self.state).p2p_disable_requests += 1;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FakeSim;

impl SimAuthenticator for FakeSim {
    fn identity(&mut self, network_id: NetworkId) -> Option<String> {
        Some(format!("1001010123456789@wlan.{network_id}"))
    }

    fn authenticate(&mut self, request: &SimAuthRequest) -> Option<String> {
        (!request.challenges.is_empty()).then(|| String::from("kc:sres"))
    }
}

// Engine wired to recording fakes, with a few shortcuts for driving it.
pub(crate) struct Harness {
    pub(crate) engine: StationEngine,
    pub(crate) radio: FakeRadio,
    pub(crate) store: FakeStore,
    pub(crate) ip: FakeIp,
    pub(crate) observer: FakeObserver,
    pub(crate) replies: Vec<Reply>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_policy(StationPolicy::defaults())
    }

    pub(crate) fn with_policy(policy: StationPolicy) -> Self {
        let radio = FakeRadio::default();
        let store = FakeStore::seeded();
        let ip = FakeIp::default();
        let observer = FakeObserver::default();
        let services = Collaborators::new(radio.clone(), store.clone(), ip.clone(), observer.clone())
            .with_sim(FakeSim);
        Self {
            engine: StationEngine::new(policy, services),
            radio,
            store,
            ip,
            observer,
            replies: Vec::new(),
        }
    }

    pub(crate) fn state(&self) -> StateId {
        self.engine.state()
    }

    fn settle(&mut self) {
        self.engine.run_until_idle();
        self.replies.extend(self.engine.take_replies());
    }

    pub(crate) fn submit(&mut self, command: Command) -> RequestId {
        self.submit_as(CallerIdentity::SYSTEM, command)
    }

    pub(crate) fn submit_as(&mut self, caller: CallerIdentity, command: Command) -> RequestId {
        let id = self.engine.submit(caller, command);
        self.settle();
        id
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.engine.post(StationEvent::Supplicant(notification));
        self.settle();
    }

    pub(crate) fn ip_event(&mut self, event: IpEvent) {
        self.engine.post(StationEvent::Provisioning(event));
        self.settle();
    }

    pub(crate) fn advance(&mut self, delta_ms: u64) {
        self.engine.advance_by(delta_ms);
        self.replies.extend(self.engine.take_replies());
    }

    pub(crate) fn outcomes(&self, id: RequestId) -> Vec<Result<ReplyValue, CommandError>> {
        self.replies
            .iter()
            .filter(|reply| reply.id == id)
            .map(|reply| reply.outcome.clone())
            .collect()
    }

    pub(crate) fn outcome(&self, id: RequestId) -> Option<Result<ReplyValue, CommandError>> {
        self.outcomes(id).into_iter().next()
    }

    pub(crate) fn boot(&mut self) {
        self.submit(Command::StartSupplicant);
        self.notify(Notification::SupplicantConnected);
    }

    pub(crate) fn associate(&mut self, network_id: NetworkId, bssid: Bssid) {
        self.notify(Notification::NetworkConnected { network_id, bssid });
    }

    pub(crate) fn connect(&mut self, network_id: NetworkId, bssid: Bssid) {
        self.associate(network_id, bssid);
        self.ip_event(IpEvent::ProvisioningSuccess(lease()));
    }

    pub(crate) fn drop_link(&mut self, reason: u16) {
        self.notify(Notification::NetworkDisconnected {
            bssid: None,
            reason: DisconnectReason(reason),
        });
    }

    pub(crate) fn supplicant_state(&mut self, state: SupplicantState, bssid: Option<Bssid>) {
        self.notify(Notification::SupplicantStateChanged {
            state,
            bssid,
            network_id: None,
        });
    }
}

pub(crate) fn lease() -> IpConfiguration {
    let mut ip = IpConfiguration::new(std::net::Ipv4Addr::new(192, 168, 1, 20), 24);
    ip.gateway = Some(std::net::Ipv4Addr::new(192, 168, 1, 1));
    ip.lease_secs = Some(3_600);
    ip
}
