use crate::error::CommandError;
use crate::types::{
    ApConfig, ApFailureReason, Bssid, CallerIdentity, DisconnectReason, FrequencyBand,
    IpConfiguration, NetworkConfig, NetworkId, OperationalMode, RequestId, SimAuthRequest,
    SupplicantState, WpsInfo,
};

use super::watchdog::WatchdogToken;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StationEvent {
    Command(Request),
    Supplicant(Notification),
    Provisioning(IpEvent),
    Timer(TimerEvent),
}

impl StationEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command(request) => request.command.label(),
            Self::Supplicant(notification) => notification.label(),
            Self::Provisioning(event) => event.label(),
            Self::Timer(event) => event.label(),
        }
    }

    pub(crate) fn internal(command: Command) -> Self {
        Self::Command(Request {
            id: RequestId::INTERNAL,
            caller: CallerIdentity::SYSTEM,
            command,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub id: RequestId,
    pub caller: CallerIdentity,
    pub command: Command,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectTarget {
    Saved(NetworkId),
    New(NetworkConfig),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnwantedReason {
    Explicit,
    ValidationFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    StartSupplicant,
    StopSupplicant,
    StartDriver,
    StopDriver,
    StartAp(ApConfig),
    StopAp,
    SetOperationalMode(OperationalMode),
    SetHighPerfMode(bool),
    SetPowerSave(bool),
    SetFrequencyBand(FrequencyBand),
    SetCountryCode(String),
    SetScreenState(bool),
    SetForegroundUser(u32),
    StartScan,
    Connect(ConnectTarget),
    Save(NetworkConfig),
    Forget(NetworkId),
    Disconnect,
    Reconnect,
    Reassociate,
    EnableNetwork { id: NetworkId, exclusive: bool },
    DisableNetwork(NetworkId),
    StartWps(WpsInfo),
    CancelWps,
    AutoConnect {
        network_id: NetworkId,
        bssid: Option<Bssid>,
    },
    AutoRoam {
        network_id: NetworkId,
        bssid: Bssid,
    },
    NetworkUnwanted(UnwantedReason),
}

impl Command {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::StartSupplicant => "cmd.start_supplicant",
            Self::StopSupplicant => "cmd.stop_supplicant",
            Self::StartDriver => "cmd.start_driver",
            Self::StopDriver => "cmd.stop_driver",
            Self::StartAp(_) => "cmd.start_ap",
            Self::StopAp => "cmd.stop_ap",
            Self::SetOperationalMode(_) => "cmd.set_operational_mode",
            Self::SetHighPerfMode(_) => "cmd.set_high_perf_mode",
            Self::SetPowerSave(_) => "cmd.set_power_save",
            Self::SetFrequencyBand(_) => "cmd.set_frequency_band",
            Self::SetCountryCode(_) => "cmd.set_country_code",
            Self::SetScreenState(_) => "cmd.set_screen_state",
            Self::SetForegroundUser(_) => "cmd.set_foreground_user",
            Self::StartScan => "cmd.start_scan",
            Self::Connect(_) => "cmd.connect",
            Self::Save(_) => "cmd.save",
            Self::Forget(_) => "cmd.forget",
            Self::Disconnect => "cmd.disconnect",
            Self::Reconnect => "cmd.reconnect",
            Self::Reassociate => "cmd.reassociate",
            Self::EnableNetwork { .. } => "cmd.enable_network",
            Self::DisableNetwork(_) => "cmd.disable_network",
            Self::StartWps(_) => "cmd.start_wps",
            Self::CancelWps => "cmd.cancel_wps",
            Self::AutoConnect { .. } => "cmd.auto_connect",
            Self::AutoRoam { .. } => "cmd.auto_roam",
            Self::NetworkUnwanted(_) => "cmd.network_unwanted",
        }
    }

    // Commands that change what the radio is associated to.
    pub(crate) const fn alters_connection(&self) -> bool {
        matches!(
            self,
            Self::Connect(_)
                | Self::EnableNetwork { .. }
                | Self::Reconnect
                | Self::Reassociate
                | Self::AutoConnect { .. }
                | Self::AutoRoam { .. }
                | Self::SetOperationalMode(_)
                | Self::StopDriver
                | Self::StopSupplicant
        )
    }

    // Lifecycle and radio-configuration commands that must wait out bring-up.
    pub(crate) const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::StartSupplicant
                | Self::StopSupplicant
                | Self::StartDriver
                | Self::StopDriver
                | Self::StartAp(_)
                | Self::StopAp
                | Self::SetOperationalMode(_)
                | Self::SetFrequencyBand(_)
                | Self::SetCountryCode(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    SupplicantConnected,
    SupplicantDisconnected,
    DriverHung,
    DriverStateChanged {
        active: bool,
    },
    SupplicantStateChanged {
        state: SupplicantState,
        bssid: Option<Bssid>,
        network_id: Option<NetworkId>,
    },
    NetworkConnected {
        network_id: NetworkId,
        bssid: Bssid,
    },
    NetworkDisconnected {
        bssid: Option<Bssid>,
        reason: DisconnectReason,
    },
    ScanResultsReady,
    ScanFailed,
    AssociationRejected {
        bssid: Option<Bssid>,
        status: u16,
    },
    AuthenticationFailed,
    WpsSuccess,
    WpsFailed {
        config_error: u16,
        reason: u16,
    },
    WpsOverlap,
    WpsTimeout,
    SimIdentityRequest {
        network_id: NetworkId,
    },
    SimAuthRequest(SimAuthRequest),
    RssiThresholdBreach {
        rssi: i8,
    },
    P2pStateChanged {
        enabled: bool,
    },
    P2pDisabled,
    SoftApFailed(ApFailureReason),
}

impl Notification {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SupplicantConnected => "sup.connected",
            Self::SupplicantDisconnected => "sup.disconnected",
            Self::DriverHung => "sup.driver_hung",
            Self::DriverStateChanged { .. } => "sup.driver_state",
            Self::SupplicantStateChanged { .. } => "sup.state_change",
            Self::NetworkConnected { .. } => "sup.network_connected",
            Self::NetworkDisconnected { .. } => "sup.network_disconnected",
            Self::ScanResultsReady => "sup.scan_results",
            Self::ScanFailed => "sup.scan_failed",
            Self::AssociationRejected { .. } => "sup.assoc_reject",
            Self::AuthenticationFailed => "sup.auth_failure",
            Self::WpsSuccess => "sup.wps_success",
            Self::WpsFailed { .. } => "sup.wps_fail",
            Self::WpsOverlap => "sup.wps_overlap",
            Self::WpsTimeout => "sup.wps_timeout",
            Self::SimIdentityRequest { .. } => "sup.sim_identity",
            Self::SimAuthRequest(_) => "sup.sim_auth",
            Self::RssiThresholdBreach { .. } => "sup.rssi_breach",
            Self::P2pStateChanged { .. } => "p2p.state",
            Self::P2pDisabled => "p2p.disabled",
            Self::SoftApFailed(_) => "ap.failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IpEvent {
    PreDhcpAction,
    PostDhcpAction,
    ProvisioningSuccess(IpConfiguration),
    ProvisioningFailure,
    LinkPropertiesChanged(IpConfiguration),
    ReachabilityLost,
    InstallPacketFilter(Vec<u8>),
}

impl IpEvent {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PreDhcpAction => "ip.pre_dhcp",
            Self::PostDhcpAction => "ip.post_dhcp",
            Self::ProvisioningSuccess(_) => "ip.success",
            Self::ProvisioningFailure => "ip.failure",
            Self::LinkPropertiesChanged(_) => "ip.link_properties",
            Self::ReachabilityLost => "ip.reachability_lost",
            Self::InstallPacketFilter(_) => "ip.packet_filter",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    Expired(WatchdogToken),
}

impl TimerEvent {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Expired(token) => token.class.label(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyValue {
    Done,
    Saved(NetworkId),
    WpsStarted { pin: Option<String> },
    WpsCompleted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub id: RequestId,
    pub outcome: Result<ReplyValue, CommandError>,
}
