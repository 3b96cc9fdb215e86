use std::net::Ipv4Addr;

use heapless::{String, Vec};

use super::ids::{Bssid, NetworkId};
use super::supplicant::Band;

pub const WIFI_SSID_MAX: usize = 32;
pub const WIFI_PASSWORD_MAX: usize = 64;
const WPS_PIN_MAX: usize = 8;
const DNS_SERVERS_MAX: usize = 4;

pub type Ssid = String<WIFI_SSID_MAX>;
pub type Psk = String<WIFI_PASSWORD_MAX>;
pub type CountryCode = String<2>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyManagement {
    #[default]
    Open,
    WpaPsk,
    WpaEap,
    EapSim,
}

impl KeyManagement {
    pub const fn needs_psk(self) -> bool {
        matches!(self, Self::WpaPsk)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "NONE",
            Self::WpaPsk => "WPA-PSK",
            Self::WpaEap => "WPA-EAP",
            Self::EapSim => "WPA-EAP-SIM",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpConfiguration {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    pub gateway: Option<Ipv4Addr>,
    pub dns: Vec<Ipv4Addr, DNS_SERVERS_MAX>,
    pub lease_secs: Option<u32>,
}

impl IpConfiguration {
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Self {
        Self {
            address,
            prefix_len: prefix_len.min(32),
            gateway: None,
            dns: Vec::new(),
            lease_secs: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub id: Option<NetworkId>,
    pub ssid: Ssid,
    pub key_mgmt: KeyManagement,
    pub psk: Option<Psk>,
    pub hidden: bool,
    pub static_ip: Option<IpConfiguration>,
}

impl NetworkConfig {
    pub fn open(ssid: &str) -> Option<Self> {
        let mut config = Self::default();
        config.ssid.push_str(ssid).ok()?;
        Some(config)
    }

    pub fn wpa_psk(ssid: &str, passphrase: &str) -> Option<Self> {
        let mut config = Self::open(ssid)?;
        let mut psk = Psk::new();
        psk.push_str(passphrase).ok()?;
        config.key_mgmt = KeyManagement::WpaPsk;
        config.psk = Some(psk);
        Some(config)
    }

    pub fn has_credential(&self) -> bool {
        !self.key_mgmt.needs_psk() || self.psk.as_ref().is_some_and(|psk| !psk.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApConfig {
    pub ssid: Ssid,
    pub psk: Option<Psk>,
    pub band: Band,
    pub channel: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WpsSetup {
    PushButton,
    PinFromDevice,
    PinFromAccessPoint(String<WPS_PIN_MAX>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WpsInfo {
    pub setup: WpsSetup,
    pub bssid: Option<Bssid>,
}
