use crate::types::{Band, Bssid, DetailedState, IpConfiguration, NetworkId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptKind {
    Fresh,
    Roam,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub network_id: NetworkId,
    // `None` means any BSSID of the network.
    pub bssid: Option<Bssid>,
    pub started_at_ms: u64,
    pub kind: AttemptKind,
}

impl ConnectionAttempt {
    pub const fn is_roam(&self) -> bool {
        matches!(self.kind, AttemptKind::Roam)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkRecord {
    pub network_id: Option<NetworkId>,
    pub bssid: Option<Bssid>,
    pub rssi: Option<i32>,
    pub link_speed_mbps: Option<u32>,
    pub frequency_mhz: Option<u32>,
    pub ip: Option<IpConfiguration>,
    pub detailed: DetailedState,
    pub debouncing: bool,
}

impl LinkRecord {
    pub fn band(&self) -> Option<Band> {
        self.frequency_mhz.and_then(Band::from_frequency)
    }

    pub fn is_empty(&self) -> bool {
        self.network_id.is_none() && self.bssid.is_none() && self.ip.is_none()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self {
            detailed: DetailedState::Disconnected,
            ..Self::default()
        };
    }
}
