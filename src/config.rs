#[cfg(feature = "policy-file")]
use std::path::Path;

#[cfg(feature = "policy-file")]
use serde::Deserialize;

#[cfg(feature = "policy-file")]
use crate::error::PolicyError;

pub const SUPPLICANT_RESTART_BACKOFF_DEFAULT_MS: u32 = 5_000;
pub const SUPPLICANT_STOP_TIMEOUT_DEFAULT_MS: u32 = 5_000;
pub const P2P_DISABLE_TIMEOUT_DEFAULT_MS: u32 = 5_000;
// Driver start is a firmware download plus chip init; slow parts need most of this.
pub const DRIVER_START_TIMEOUT_DEFAULT_MS: u32 = 10_000;
pub const ROAM_TIMEOUT_DEFAULT_MS: u32 = 15_000;
pub const DISCONNECTING_TIMEOUT_DEFAULT_MS: u32 = 5_000;
// Several DHCP discover/request rounds with backoff fit inside 40s.
pub const OBTAINING_IP_TIMEOUT_DEFAULT_MS: u32 = 40_000;
pub const OBTAINING_IP_TIMEOUT_MAX_MS: u32 = 120_000;
pub const DEBOUNCE_DEFAULT_MS: u32 = 4_000;
pub const DRIVER_ROAM_WINDOW_DEFAULT_MS: u32 = 2_000;
pub const QUALIFIED_RSSI_24G_DEFAULT: i32 = -73;
pub const QUALIFIED_RSSI_5G_DEFAULT: i32 = -70;
// Scans inside the cooldown would land mid-handshake; they are pushed out instead.
pub const SCAN_COOLDOWN_DEFAULT_MS: u32 = 3_000;
pub const SCAN_DEFER_DEFAULT_MS: u32 = 11_000;
pub const RSSI_POLL_INTERVAL_DEFAULT_MS: u32 = 3_000;
pub const SUPPLICANT_SCAN_INTERVAL_DEFAULT_S: u32 = 15;
pub const SYSTEM_UID: u32 = 1_000;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "policy-file", derive(Deserialize))]
#[cfg_attr(feature = "policy-file", serde(default, deny_unknown_fields))]
pub struct StationPolicy {
    pub supplicant_restart_max: u8,
    pub supplicant_restart_backoff_ms: u32,
    pub supplicant_stop_timeout_ms: u32,
    pub p2p_disable_timeout_ms: u32,
    pub driver_start_timeout_ms: u32,
    pub driver_start_retry_max: u8,
    pub roam_timeout_ms: u32,
    pub disconnecting_timeout_ms: u32,
    pub obtaining_ip_timeout_ms: u32,
    pub debounce_ms: u32,
    pub driver_roam_window_ms: u32,
    pub qualified_rssi_24g: i32,
    pub qualified_rssi_5g: i32,
    pub scan_cooldown_ms: u32,
    pub scan_defer_ms: u32,
    pub rssi_poll_interval_ms: u32,
    pub supplicant_scan_interval_s: u32,
    pub country_code: Option<String>,
    pub device_name: String,
    pub trusted_uids: Vec<u32>,
    pub rssi_thresholds: Vec<i32>,
    pub disconnect_on_reachability_loss: bool,
}

impl Default for StationPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}

impl StationPolicy {
    pub const fn defaults() -> Self {
        Self {
            supplicant_restart_max: 5,
            supplicant_restart_backoff_ms: SUPPLICANT_RESTART_BACKOFF_DEFAULT_MS,
            supplicant_stop_timeout_ms: SUPPLICANT_STOP_TIMEOUT_DEFAULT_MS,
            p2p_disable_timeout_ms: P2P_DISABLE_TIMEOUT_DEFAULT_MS,
            driver_start_timeout_ms: DRIVER_START_TIMEOUT_DEFAULT_MS,
            driver_start_retry_max: 2,
            roam_timeout_ms: ROAM_TIMEOUT_DEFAULT_MS,
            disconnecting_timeout_ms: DISCONNECTING_TIMEOUT_DEFAULT_MS,
            obtaining_ip_timeout_ms: OBTAINING_IP_TIMEOUT_DEFAULT_MS,
            debounce_ms: DEBOUNCE_DEFAULT_MS,
            driver_roam_window_ms: DRIVER_ROAM_WINDOW_DEFAULT_MS,
            qualified_rssi_24g: QUALIFIED_RSSI_24G_DEFAULT,
            qualified_rssi_5g: QUALIFIED_RSSI_5G_DEFAULT,
            scan_cooldown_ms: SCAN_COOLDOWN_DEFAULT_MS,
            scan_defer_ms: SCAN_DEFER_DEFAULT_MS,
            rssi_poll_interval_ms: RSSI_POLL_INTERVAL_DEFAULT_MS,
            supplicant_scan_interval_s: SUPPLICANT_SCAN_INTERVAL_DEFAULT_S,
            country_code: None,
            device_name: String::new(),
            trusted_uids: Vec::new(),
            rssi_thresholds: Vec::new(),
            disconnect_on_reachability_loss: true,
        }
    }

    pub fn sanitized(self) -> Self {
        let scan_cooldown_ms = clamp_u32(self.scan_cooldown_ms, 0, 30_000);
        let mut scan_defer_ms = clamp_u32(self.scan_defer_ms, 0, 60_000);
        // A deferred scan must land after the cooldown or it would be deferred again.
        if scan_defer_ms <= scan_cooldown_ms {
            scan_defer_ms = scan_cooldown_ms + 1;
        }
        let country_code = self
            .country_code
            .filter(|code| code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()))
            .map(|code| code.to_ascii_uppercase());
        let mut device_name = self.device_name;
        device_name.retain(|c| c.is_ascii_graphic() || c == ' ');
        device_name.truncate(32);
        let mut trusted_uids = self.trusted_uids;
        if !trusted_uids.contains(&SYSTEM_UID) {
            trusted_uids.push(SYSTEM_UID);
        }
        let mut rssi_thresholds: Vec<i32> = self
            .rssi_thresholds
            .into_iter()
            .map(|rssi| rssi.clamp(-126, -1))
            .collect();
        rssi_thresholds.sort_unstable();
        rssi_thresholds.dedup();

        Self {
            supplicant_restart_max: clamp_u8(self.supplicant_restart_max, 1, 16),
            supplicant_restart_backoff_ms: clamp_u32(
                self.supplicant_restart_backoff_ms,
                100,
                60_000,
            ),
            supplicant_stop_timeout_ms: clamp_u32(self.supplicant_stop_timeout_ms, 500, 30_000),
            p2p_disable_timeout_ms: clamp_u32(self.p2p_disable_timeout_ms, 500, 30_000),
            driver_start_timeout_ms: clamp_u32(self.driver_start_timeout_ms, 1_000, 60_000),
            driver_start_retry_max: clamp_u8(self.driver_start_retry_max, 1, 8),
            roam_timeout_ms: clamp_u32(self.roam_timeout_ms, 1_000, 60_000),
            disconnecting_timeout_ms: clamp_u32(self.disconnecting_timeout_ms, 500, 30_000),
            obtaining_ip_timeout_ms: clamp_u32(
                self.obtaining_ip_timeout_ms,
                5_000,
                OBTAINING_IP_TIMEOUT_MAX_MS,
            ),
            debounce_ms: clamp_u32(self.debounce_ms, 500, 30_000),
            driver_roam_window_ms: clamp_u32(self.driver_roam_window_ms, 0, 10_000),
            qualified_rssi_24g: self.qualified_rssi_24g.clamp(-100, -30),
            qualified_rssi_5g: self.qualified_rssi_5g.clamp(-100, -30),
            scan_cooldown_ms,
            scan_defer_ms,
            rssi_poll_interval_ms: clamp_u32(self.rssi_poll_interval_ms, 500, 60_000),
            supplicant_scan_interval_s: clamp_u32(self.supplicant_scan_interval_s, 5, 300),
            country_code,
            device_name,
            trusted_uids,
            rssi_thresholds,
            disconnect_on_reachability_loss: self.disconnect_on_reachability_loss,
        }
    }

    pub fn is_trusted_uid(&self, uid: u32) -> bool {
        uid == SYSTEM_UID || self.trusted_uids.contains(&uid)
    }

    // Grows by a fixed step per consecutive IP-acquisition timeout so one slow
    // lease does not exhaust the budget of the next attempt.
    pub fn obtaining_ip_timeout_for(&self, timeout_streak: u8) -> u32 {
        const OBTAINING_IP_TIMEOUT_STEP_MS: u32 = 8_000;
        const OBTAINING_IP_TIMEOUT_MAX_STEPS: u8 = 4;

        let steps = u32::from(timeout_streak.min(OBTAINING_IP_TIMEOUT_MAX_STEPS));
        self.obtaining_ip_timeout_ms
            .saturating_add(steps.saturating_mul(OBTAINING_IP_TIMEOUT_STEP_MS))
            .min(OBTAINING_IP_TIMEOUT_MAX_MS)
    }
}

#[cfg(feature = "policy-file")]
impl StationPolicy {
    pub fn from_toml_str(source: &str) -> Result<Self, PolicyError> {
        let policy: Self = toml::from_str(source).map_err(PolicyError::Parse)?;
        Ok(policy.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let source = std::fs::read_to_string(path).map_err(PolicyError::Io)?;
        Self::from_toml_str(&source)
    }
}

const fn clamp_u32(value: u32, min: u32, max: u32) -> u32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

const fn clamp_u8(value: u8, min: u8, max: u8) -> u8 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
