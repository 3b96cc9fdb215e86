#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateId {
    Default,
    Initial,
    SupplicantStarting,
    SupplicantStarted,
    DriverStarting,
    DriverStarted,
    ScanMode,
    ConnectMode,
    L2Connected,
    ObtainingIp,
    Connected,
    Roaming,
    Disconnecting,
    Disconnected,
    WpsRunning,
    WaitForP2pDisable,
    DriverStopping,
    DriverStopped,
    SupplicantStopping,
    SoftAp,
}

impl StateId {
    pub const COUNT: usize = 20;

    pub const ALL: [StateId; Self::COUNT] = [
        Self::Default,
        Self::Initial,
        Self::SupplicantStarting,
        Self::SupplicantStarted,
        Self::DriverStarting,
        Self::DriverStarted,
        Self::ScanMode,
        Self::ConnectMode,
        Self::L2Connected,
        Self::ObtainingIp,
        Self::Connected,
        Self::Roaming,
        Self::Disconnecting,
        Self::Disconnected,
        Self::WpsRunning,
        Self::WaitForP2pDisable,
        Self::DriverStopping,
        Self::DriverStopped,
        Self::SupplicantStopping,
        Self::SoftAp,
    ];

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Initial => "Initial",
            Self::SupplicantStarting => "SupplicantStarting",
            Self::SupplicantStarted => "SupplicantStarted",
            Self::DriverStarting => "DriverStarting",
            Self::DriverStarted => "DriverStarted",
            Self::ScanMode => "ScanMode",
            Self::ConnectMode => "ConnectMode",
            Self::L2Connected => "L2Connected",
            Self::ObtainingIp => "ObtainingIp",
            Self::Connected => "Connected",
            Self::Roaming => "Roaming",
            Self::Disconnecting => "Disconnecting",
            Self::Disconnected => "Disconnected",
            Self::WpsRunning => "WpsRunning",
            Self::WaitForP2pDisable => "WaitForP2pDisable",
            Self::DriverStopping => "DriverStopping",
            Self::DriverStopped => "DriverStopped",
            Self::SupplicantStopping => "SupplicantStopping",
            Self::SoftAp => "SoftAp",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == name)
    }

    pub const fn parent(self) -> Option<StateId> {
        match self {
            Self::Default => None,
            Self::Initial
            | Self::SupplicantStarting
            | Self::SupplicantStarted
            | Self::SupplicantStopping
            | Self::SoftAp => Some(Self::Default),
            Self::DriverStarting
            | Self::DriverStarted
            | Self::WaitForP2pDisable
            | Self::DriverStopping
            | Self::DriverStopped => Some(Self::SupplicantStarted),
            Self::ScanMode | Self::ConnectMode => Some(Self::DriverStarted),
            Self::L2Connected | Self::Disconnecting | Self::Disconnected | Self::WpsRunning => {
                Some(Self::ConnectMode)
            }
            Self::ObtainingIp | Self::Connected | Self::Roaming => Some(Self::L2Connected),
        }
    }

    pub const fn is_leaf(self) -> bool {
        !matches!(
            self,
            Self::Default
                | Self::SupplicantStarted
                | Self::DriverStarted
                | Self::ConnectMode
                | Self::L2Connected
        )
    }

    pub fn is_within(self, ancestor: StateId) -> bool {
        let mut current = Some(self);
        while let Some(state) = current {
            if state == ancestor {
                return true;
            }
            current = state.parent();
        }
        false
    }

    pub fn depth(self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(state) = current {
            depth += 1;
            current = state.parent();
        }
        depth
    }
}

// Per-state enter/exit counters maintained by the entry and exit actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateTrace {
    entries: [u32; StateId::COUNT],
    exits: [u32; StateId::COUNT],
}

impl StateTrace {
    pub(crate) fn enter(&mut self, state: StateId) {
        self.entries[state.as_u8() as usize] += 1;
    }

    pub(crate) fn exit(&mut self, state: StateId) {
        self.exits[state.as_u8() as usize] += 1;
    }

    pub fn entries(&self, state: StateId) -> u32 {
        self.entries[state.as_u8() as usize]
    }

    pub fn exits(&self, state: StateId) -> u32 {
        self.exits[state.as_u8() as usize]
    }

    // States entered more often than exited, i.e. currently active.
    pub fn active(&self) -> impl Iterator<Item = StateId> + '_ {
        StateId::ALL
            .into_iter()
            .filter(|state| self.entries(*state) > self.exits(*state))
    }

    // Balanced means every active state is on the path of `leaf` and was
    // entered exactly once more than exited; all others are even.
    pub fn is_balanced_for(&self, leaf: StateId) -> bool {
        StateId::ALL.into_iter().all(|state| {
            let open = i64::from(self.entries(state)) - i64::from(self.exits(state));
            if leaf.is_within(state) {
                open == 1
            } else {
                open == 0
            }
        })
    }
}
