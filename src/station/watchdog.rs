#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WatchdogClass {
    DriverStart,
    SupplicantStop,
    SupplicantRestart,
    P2pDisable,
    Roam,
    Disconnecting,
    ObtainingIp,
    Debounce,
    RssiPoll,
}

impl WatchdogClass {
    pub const COUNT: usize = 9;

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::DriverStart => 0,
            Self::SupplicantStop => 1,
            Self::SupplicantRestart => 2,
            Self::Roam => 3,
            Self::Disconnecting => 4,
            Self::ObtainingIp => 5,
            Self::Debounce => 6,
            Self::RssiPoll => 7,
            Self::P2pDisable => 8,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::DriverStart => "timer.driver_start",
            Self::SupplicantStop => "timer.supplicant_stop",
            Self::SupplicantRestart => "timer.supplicant_restart",
            Self::Roam => "timer.roam",
            Self::Disconnecting => "timer.disconnecting",
            Self::ObtainingIp => "timer.obtaining_ip",
            Self::Debounce => "timer.debounce",
            Self::RssiPoll => "timer.rssi_poll",
            Self::P2pDisable => "timer.p2p_disable",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchdogToken {
    pub class: WatchdogClass,
    pub generation: u32,
}

// One generation counter per class. Arming or invalidating bumps it, so any
// timer scheduled under an older generation is dead on arrival.
#[derive(Clone, Copy, Debug, Default)]
pub struct Watchdogs {
    generations: [u32; WatchdogClass::COUNT],
}

impl Watchdogs {
    pub fn arm(&mut self, class: WatchdogClass) -> WatchdogToken {
        let generation = self.bump(class);
        WatchdogToken { class, generation }
    }

    pub fn invalidate(&mut self, class: WatchdogClass) {
        self.bump(class);
    }

    pub fn is_live(&self, token: WatchdogToken) -> bool {
        self.generations[token.class.as_u8() as usize] == token.generation
    }

    pub fn generation(&self, class: WatchdogClass) -> u32 {
        self.generations[class.as_u8() as usize]
    }

    fn bump(&mut self, class: WatchdogClass) -> u32 {
        let slot = &mut self.generations[class.as_u8() as usize];
        *slot = slot.wrapping_add(1);
        *slot
    }
}
