use crate::types::{Bssid, CallerIdentity, NetworkConfig, NetworkId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisableReason {
    ByUser,
    AssociationRejected,
    AuthenticationFailure,
    DhcpFailure,
}

// Saved networks live outside the station; calls are synchronous and cheap.
pub trait ConfigStore {
    fn load_networks(&mut self);
    fn network(&self, id: NetworkId) -> Option<NetworkConfig>;
    fn save_network(&mut self, config: NetworkConfig, caller: CallerIdentity)
        -> Option<NetworkId>;
    fn forget_network(&mut self, id: NetworkId) -> bool;
    fn select_network(&mut self, id: NetworkId) -> bool;
    fn enable_network(&mut self, id: NetworkId, disable_others: bool) -> bool;
    fn disable_network(&mut self, id: NetworkId, reason: DisableReason) -> bool;
    fn enable_all_networks(&mut self);
    fn disable_all_networks(&mut self);
    fn is_network_enabled(&self, id: NetworkId) -> bool;
    fn last_selected(&self) -> Option<NetworkId>;
    fn set_last_selected(&mut self, id: Option<NetworkId>);
    fn known_channels(&self, id: NetworkId) -> Vec<u32>;

    fn note_connected(&mut self, _id: NetworkId, _bssid: Option<Bssid>) {}
    fn note_association_rejection(&mut self, _id: Option<NetworkId>, _bssid: Option<Bssid>) {}
    fn note_authentication_failure(&mut self, _id: NetworkId) {}
    fn note_ip_failure(&mut self, _id: NetworkId) {}
    fn note_no_internet(&mut self, _id: NetworkId) {}
}
