use core::cell::RefCell;
use core::fmt::Write as _;
use std::sync::Arc;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use log::{debug, trace, warn};

use crate::error::CommandError;
use crate::types::{
    ApConfig, Bssid, FrequencyBand, NetworkId, SignalPoll, SimAuthKind, WpsInfo, WpsSetup,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOffloadSettings {
    pub interval_ms: u32,
    pub max_ap_per_scan: u8,
}

impl ScanOffloadSettings {
    pub const SCREEN_OFF: Self = Self {
        interval_ms: 160_000,
        max_ap_per_scan: 16,
    };
}

// Raw driver, supplicant and vendor HAL surface. Implementations talk to the
// real control sockets; none of these calls may re-enter the station.
pub trait RadioControl {
    fn load_driver(&mut self) -> bool;
    fn unload_driver(&mut self) -> bool;
    fn start_supplicant(&mut self) -> bool;
    fn kill_supplicant(&mut self) -> bool;
    fn start_monitoring(&mut self) -> bool;
    fn stop_monitoring(&mut self);

    fn bool_command(&mut self, command: &str) -> bool;
    fn string_command(&mut self, command: &str) -> Option<String>;

    fn start_soft_ap(&mut self, config: &ApConfig) -> bool;
    fn stop_soft_ap(&mut self) -> bool;

    fn hal_started(&self) -> bool;
    fn hal_start_scan_offload(&mut self, settings: &ScanOffloadSettings) -> bool;
    fn hal_stop_scan_offload(&mut self) -> bool;
    fn hal_start_rssi_monitoring(&mut self, max_rssi: i8, min_rssi: i8) -> bool;
    fn hal_stop_rssi_monitoring(&mut self) -> bool;
    fn hal_install_packet_filter(&mut self, program: &[u8]) -> bool;
    fn hal_channels_for_band(&mut self, band: FrequencyBand) -> Option<Vec<u32>>;
}

type SharedRadio = Mutex<CriticalSectionRawMutex, RefCell<Box<dyn RadioControl + Send>>>;

// Every native call goes through this one lock: the supplicant control
// channel is not reentrant.
#[derive(Clone)]
pub struct RadioHandle {
    inner: Arc<SharedRadio>,
}

impl RadioHandle {
    pub fn new(radio: impl RadioControl + Send + 'static) -> Self {
        let boxed: Box<dyn RadioControl + Send> = Box::new(radio);
        Self {
            inner: Arc::new(Mutex::new(RefCell::new(boxed))),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut dyn RadioControl) -> T) -> T {
        self.inner.lock(|cell| {
            let mut radio = cell.borrow_mut();
            f(&mut **radio)
        })
    }

    // HAL calls fail closed while the vendor HAL is down.
    fn with_hal<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut dyn RadioControl) -> T,
    ) -> Option<T> {
        self.with(|radio| {
            if radio.hal_started() {
                Some(f(radio))
            } else {
                debug!("radio: hal not started, skip {op}");
                None
            }
        })
    }

    fn bool_command(&self, command: &str) -> bool {
        let ok = self.with(|radio| radio.bool_command(command));
        if ok {
            trace!("radio: {command} -> OK");
        } else {
            warn!("radio: {command} -> FAIL");
        }
        ok
    }

    fn string_command(&self, command: &str) -> Option<String> {
        let reply = self.with(|radio| radio.string_command(command));
        trace!("radio: {command} -> {:?}", reply.as_deref());
        reply
    }

    pub fn load_driver(&self) -> bool {
        self.with(|radio| radio.load_driver())
    }

    pub fn unload_driver(&self) -> bool {
        self.with(|radio| radio.unload_driver())
    }

    pub fn start_supplicant(&self) -> bool {
        self.with(|radio| radio.start_supplicant())
    }

    pub fn kill_supplicant(&self) -> bool {
        self.with(|radio| radio.kill_supplicant())
    }

    pub fn start_monitoring(&self) -> bool {
        self.with(|radio| radio.start_monitoring())
    }

    pub fn stop_monitoring(&self) {
        self.with(|radio| radio.stop_monitoring());
    }

    pub fn terminate_supplicant(&self) -> bool {
        self.bool_command("TERMINATE")
    }

    pub fn start_driver(&self) -> bool {
        self.bool_command("DRIVER START")
    }

    pub fn stop_driver(&self) -> bool {
        self.bool_command("DRIVER STOP")
    }

    pub fn scan(&self, channels: Option<&[u32]>) -> bool {
        match channels {
            Some(channels) if !channels.is_empty() => {
                let mut command = String::from("SCAN freq=");
                for (index, mhz) in channels.iter().enumerate() {
                    if index > 0 {
                        command.push(',');
                    }
                    let _ = write!(command, "{mhz}");
                }
                self.bool_command(&command)
            }
            _ => self.bool_command("SCAN TYPE=ONLY"),
        }
    }

    pub fn disconnect(&self) -> bool {
        self.bool_command("DISCONNECT")
    }

    pub fn reconnect(&self) -> bool {
        self.bool_command("RECONNECT")
    }

    pub fn reassociate(&self) -> bool {
        self.bool_command("REASSOCIATE")
    }

    pub fn select_network(&self, id: NetworkId) -> bool {
        self.bool_command(&format!("SELECT_NETWORK {id}"))
    }

    pub fn enable_network(&self, id: NetworkId) -> bool {
        self.bool_command(&format!("ENABLE_NETWORK {id}"))
    }

    pub fn disable_network(&self, id: NetworkId) -> bool {
        self.bool_command(&format!("DISABLE_NETWORK {id}"))
    }

    pub fn set_bssid(&self, id: NetworkId, bssid: Option<Bssid>) -> bool {
        match bssid {
            Some(bssid) => self.bool_command(&format!("SET_NETWORK {id} bssid {bssid}")),
            None => self.bool_command(&format!("SET_NETWORK {id} bssid any")),
        }
    }

    pub fn signal_poll(&self) -> Option<SignalPoll> {
        self.string_command("SIGNAL_POLL")
            .map(|reply| SignalPoll::parse(&reply))
    }

    pub fn set_scan_interval(&self, seconds: u32) -> bool {
        self.bool_command(&format!("SCAN_INTERVAL {seconds}"))
    }

    pub fn set_country_code(&self, code: &str) -> bool {
        self.bool_command(&format!("DRIVER COUNTRY {code}"))
    }

    pub fn set_band(&self, band: FrequencyBand) -> bool {
        self.bool_command(&format!("DRIVER SETBAND {}", band.as_u8()))
    }

    pub fn bss_flush(&self) -> bool {
        self.bool_command("BSS_FLUSH 0")
    }

    pub fn stop_filtering_multicast_v4(&self) -> bool {
        self.bool_command("DRIVER RXFILTER-STOP")
            && self.bool_command("DRIVER RXFILTER-ADD 2")
            && self.bool_command("DRIVER RXFILTER-START")
    }

    pub fn set_power_save(&self, enabled: bool) -> bool {
        self.bool_command(if enabled { "SET ps 1" } else { "SET ps 0" })
    }

    pub fn set_suspend_optimizations(&self, enabled: bool) -> bool {
        self.bool_command(if enabled {
            "DRIVER SETSUSPENDMODE 1"
        } else {
            "DRIVER SETSUSPENDMODE 0"
        })
    }

    // Mode 1 parks bluetooth so DHCP frames are not starved; 2 restores sensing.
    pub fn set_bluetooth_coexistence(&self, favor_wifi: bool) -> bool {
        self.bool_command(if favor_wifi {
            "DRIVER BTCOEXMODE 1"
        } else {
            "DRIVER BTCOEXMODE 2"
        })
    }

    pub fn enable_save_config(&self) -> bool {
        self.bool_command("SET update_config 1")
    }

    pub fn initialize_identity(&self, device_name: &str) -> bool {
        let named = device_name.is_empty()
            || self.bool_command(&format!("SET device_name {device_name}"));
        named && self.bool_command("SET config_methods physical_display virtual_push_button")
    }

    pub fn start_wps(&self, info: &WpsInfo) -> Result<Option<String>, CommandError> {
        let target = info
            .bssid
            .map_or_else(|| String::from("any"), |bssid| bssid.to_string());
        match &info.setup {
            WpsSetup::PushButton => self
                .bool_command(&format!("WPS_PBC {target}"))
                .then_some(None)
                .ok_or(CommandError::PrimitiveFailed("wps_pbc")),
            WpsSetup::PinFromDevice => self
                .string_command(&format!("WPS_PIN {target}"))
                .filter(|pin| !pin.is_empty())
                .map(Some)
                .ok_or(CommandError::PrimitiveFailed("wps_pin")),
            WpsSetup::PinFromAccessPoint(pin) => self
                .bool_command(&format!("WPS_REG {target} {pin}"))
                .then_some(None)
                .ok_or(CommandError::PrimitiveFailed("wps_reg")),
        }
    }

    pub fn cancel_wps(&self) -> bool {
        self.bool_command("WPS_CANCEL")
    }

    pub fn sim_identity_response(&self, id: NetworkId, identity: &str) -> bool {
        self.bool_command(&format!("CTRL-RSP-IDENTITY-{id}:{identity}"))
    }

    pub fn sim_auth_response(&self, id: NetworkId, kind: SimAuthKind, response: &str) -> bool {
        self.bool_command(&format!("CTRL-RSP-SIM-{id}:{}:{response}", kind.as_str()))
    }

    pub fn sim_auth_failure(&self, id: NetworkId) -> bool {
        self.bool_command(&format!("CTRL-RSP-SIM-{id}:GSM-FAIL"))
    }

    pub fn start_soft_ap(&self, config: &ApConfig) -> bool {
        self.with(|radio| radio.start_soft_ap(config))
    }

    pub fn stop_soft_ap(&self) -> bool {
        self.with(|radio| radio.stop_soft_ap())
    }

    pub fn start_scan_offload(&self, settings: ScanOffloadSettings) -> bool {
        self.with_hal("scan_offload_start", |radio| {
            radio.hal_start_scan_offload(&settings)
        })
        .unwrap_or(false)
    }

    pub fn stop_scan_offload(&self) -> bool {
        self.with_hal("scan_offload_stop", |radio| radio.hal_stop_scan_offload())
            .unwrap_or(false)
    }

    pub fn start_rssi_monitoring(&self, max_rssi: i8, min_rssi: i8) -> bool {
        self.with_hal("rssi_monitor_start", |radio| {
            radio.hal_start_rssi_monitoring(max_rssi, min_rssi)
        })
        .unwrap_or(false)
    }

    pub fn stop_rssi_monitoring(&self) -> bool {
        self.with_hal("rssi_monitor_stop", |radio| radio.hal_stop_rssi_monitoring())
            .unwrap_or(false)
    }

    pub fn install_packet_filter(&self, program: &[u8]) -> bool {
        self.with_hal("packet_filter", |radio| {
            radio.hal_install_packet_filter(program)
        })
        .unwrap_or(false)
    }

    pub fn channels_for_band(&self, band: FrequencyBand) -> Option<Vec<u32>> {
        self.with_hal("channel_list", |radio| radio.hal_channels_for_band(band))
            .flatten()
    }
}
