use super::ids::NetworkId;

// Link-layer states as reported by the supplicant control interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupplicantState {
    Disconnected,
    InterfaceDisabled,
    Inactive,
    Scanning,
    Authenticating,
    Associating,
    Associated,
    FourWayHandshake,
    GroupHandshake,
    Completed,
    Dormant,
    #[default]
    Uninitialized,
    Invalid,
}

impl SupplicantState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::InterfaceDisabled => "INTERFACE_DISABLED",
            Self::Inactive => "INACTIVE",
            Self::Scanning => "SCANNING",
            Self::Authenticating => "AUTHENTICATING",
            Self::Associating => "ASSOCIATING",
            Self::Associated => "ASSOCIATED",
            Self::FourWayHandshake => "4WAY_HANDSHAKE",
            Self::GroupHandshake => "GROUP_HANDSHAKE",
            Self::Completed => "COMPLETED",
            Self::Dormant => "DORMANT",
            Self::Uninitialized => "UNINITIALIZED",
            Self::Invalid => "INVALID",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        const ALL: [SupplicantState; 13] = [
            SupplicantState::Disconnected,
            SupplicantState::InterfaceDisabled,
            SupplicantState::Inactive,
            SupplicantState::Scanning,
            SupplicantState::Authenticating,
            SupplicantState::Associating,
            SupplicantState::Associated,
            SupplicantState::FourWayHandshake,
            SupplicantState::GroupHandshake,
            SupplicantState::Completed,
            SupplicantState::Dormant,
            SupplicantState::Uninitialized,
            SupplicantState::Invalid,
        ];
        ALL.into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(value))
    }

    pub const fn is_driver_active(self) -> bool {
        !matches!(
            self,
            Self::InterfaceDisabled | Self::Uninitialized | Self::Invalid
        )
    }

    pub const fn is_connecting(self) -> bool {
        matches!(
            self,
            Self::Authenticating
                | Self::Associating
                | Self::Associated
                | Self::FourWayHandshake
                | Self::GroupHandshake
        )
    }

    pub const fn is_link_down(self) -> bool {
        matches!(
            self,
            Self::Disconnected | Self::Inactive | Self::InterfaceDisabled | Self::Dormant
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    TwoPointFourGhz,
    FiveGhz,
}

impl Band {
    pub const fn from_frequency(mhz: u32) -> Option<Self> {
        match mhz {
            2_400..=2_500 => Some(Self::TwoPointFourGhz),
            4_900..=5_900 => Some(Self::FiveGhz),
            _ => None,
        }
    }
}

// Driver band preference, encoded as the `DRIVER SETBAND` argument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrequencyBand {
    #[default]
    Auto,
    FiveGhzOnly,
    TwoGhzOnly,
}

impl FrequencyBand {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::FiveGhzOnly => 1,
            Self::TwoGhzOnly => 2,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Auto),
            1 => Some(Self::FiveGhzOnly),
            2 => Some(Self::TwoGhzOnly),
            _ => None,
        }
    }
}

// IEEE 802.11 reason code carried by a disconnect notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisconnectReason(pub u16);

impl DisconnectReason {
    pub const DEAUTH_LEAVING: Self = Self(3);
    pub const STA_HAS_LEFT: Self = Self(8);

    pub const fn is_locally_generated(self) -> bool {
        self.0 == Self::DEAUTH_LEAVING.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignalPoll {
    pub rssi: Option<i32>,
    pub link_speed_mbps: Option<u32>,
    pub frequency_mhz: Option<u32>,
}

impl SignalPoll {
    // `SIGNAL_POLL` answers with KEY=VALUE lines; unknown keys are skipped.
    pub fn parse(reply: &str) -> Self {
        let mut poll = Self::default();
        for line in reply.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "RSSI" => {
                    // Drivers report -9999 when the value is unavailable.
                    poll.rssi = value.parse().ok().filter(|rssi: &i32| *rssi > -200);
                }
                "LINKSPEED" => poll.link_speed_mbps = value.parse().ok(),
                "FREQUENCY" => poll.frequency_mhz = value.parse().ok(),
                _ => {}
            }
        }
        poll
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimAuthKind {
    Gsm,
    Umts,
}

impl SimAuthKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gsm => "GSM-AUTH",
            Self::Umts => "UMTS-AUTH",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimAuthRequest {
    pub network_id: NetworkId,
    pub kind: SimAuthKind,
    pub challenges: Vec<String>,
}
