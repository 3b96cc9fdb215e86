#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OperationalMode {
    #[default]
    Connect,
    ScanOnly,
    ScanOnlyRadioOff,
}

impl OperationalMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::ScanOnly => "scan_only",
            Self::ScanOnlyRadioOff => "scan_only_radio_off",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WifiState {
    Disabling,
    #[default]
    Disabled,
    Enabling,
    Enabled,
    Unknown,
}

impl WifiState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabling => "disabling",
            Self::Disabled => "disabled",
            Self::Enabling => "enabling",
            Self::Enabled => "enabled",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApFailureReason {
    General,
    NoChannel,
}

impl ApFailureReason {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::General => 0,
            Self::NoChannel => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApState {
    Disabling,
    #[default]
    Disabled,
    Enabling,
    Enabled,
    Failed(ApFailureReason),
}

impl ApState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabling => "disabling",
            Self::Disabled => "disabled",
            Self::Enabling => "enabling",
            Self::Enabled => "enabled",
            Self::Failed(_) => "failed",
        }
    }
}

// Externally visible network state. Only the station core changes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetailedState {
    #[default]
    Idle,
    Connecting,
    ObtainingIpAddr,
    Connected,
    Disconnected,
}

impl DetailedState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::ObtainingIpAddr => "obtaining_ipaddr",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}
