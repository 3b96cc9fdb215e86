mod ids;
mod modes;
mod network;
mod supplicant;

pub use ids::{Bssid, BssidParseError, CallerIdentity, NetworkId, RequestId};
pub use modes::{ApFailureReason, ApState, DetailedState, OperationalMode, WifiState};
pub use network::{
    ApConfig, CountryCode, IpConfiguration, KeyManagement, NetworkConfig, Psk, Ssid, WpsInfo,
    WpsSetup, WIFI_PASSWORD_MAX, WIFI_SSID_MAX,
};
pub use supplicant::{
    Band, DisconnectReason, FrequencyBand, SignalPoll, SimAuthKind, SimAuthRequest,
    SupplicantState,
};
