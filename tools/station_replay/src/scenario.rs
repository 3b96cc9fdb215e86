use std::{fs, net::Ipv4Addr, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use station_fsm::station::{Command, ConnectTarget, IpEvent, Notification, UnwantedReason};
use station_fsm::types::{
    ApConfig, ApFailureReason, Band, Bssid, CallerIdentity, DisconnectReason, FrequencyBand,
    IpConfiguration, NetworkConfig, NetworkId, OperationalMode, SupplicantState, WpsInfo,
    WpsSetup,
};
use station_fsm::{StateId, StationPolicy};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: Option<String>,
    pub policy: Option<StationPolicy>,
    #[serde(default)]
    pub radio: RadioScript,
    #[serde(default, rename = "network")]
    pub networks: Vec<NetworkEntry>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
    pub expect_final: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadioScript {
    pub fail: Vec<String>,
    pub signal: Option<String>,
    pub hal_down: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkEntry {
    pub id: u32,
    pub ssid: String,
    pub psk: Option<String>,
    #[serde(default)]
    pub channels: Vec<u32>,
    #[serde(default)]
    pub disabled: bool,
}

impl NetworkEntry {
    pub fn config(&self) -> Result<NetworkConfig> {
        network_config(&self.ssid, self.psk.as_deref())
    }
}

// One scenario step. Exactly one of `command`, `notify`, `ip` or
// `advance_ms` is set; `args` carries whatever that action needs.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub command: Option<String>,
    pub notify: Option<String>,
    pub ip: Option<String>,
    pub advance_ms: Option<u64>,
    #[serde(default)]
    pub args: StepArgs,
    pub uid: Option<u32>,
    pub expect_state: Option<String>,
    pub expect_reply: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepArgs {
    pub network: Option<u32>,
    pub bssid: Option<String>,
    pub ssid: Option<String>,
    pub psk: Option<String>,
    pub enabled: Option<bool>,
    pub exclusive: bool,
    pub value: Option<String>,
    pub state: Option<String>,
    pub reason: Option<u16>,
    pub status: Option<u16>,
    pub rssi: Option<i8>,
    pub uid: Option<u32>,
    pub channel: Option<u8>,
    pub address: Option<String>,
    pub gateway: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Command(CallerIdentity, Command),
    Notify(Notification),
    Ip(IpEvent),
    Advance(u64),
}

impl Step {
    pub fn action(&self) -> Result<Action> {
        let set = [
            self.command.is_some(),
            self.notify.is_some(),
            self.ip.is_some(),
            self.advance_ms.is_some(),
        ];
        if set.iter().filter(|is_set| **is_set).count() != 1 {
            bail!("step must set exactly one of command, notify, ip or advance_ms");
        }

        if let Some(name) = &self.command {
            let caller = self
                .uid
                .map(CallerIdentity::from_uid)
                .unwrap_or(CallerIdentity::SYSTEM);
            return Ok(Action::Command(caller, parse_command(name, &self.args)?));
        }
        if let Some(name) = &self.notify {
            return Ok(Action::Notify(parse_notification(name, &self.args)?));
        }
        if let Some(name) = &self.ip {
            return Ok(Action::Ip(parse_ip_event(name, &self.args)?));
        }
        Ok(Action::Advance(self.advance_ms.unwrap_or_default()))
    }

    pub fn expected_state(&self) -> Result<Option<StateId>> {
        self.expect_state.as_deref().map(parse_state).transpose()
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading scenario {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed parsing scenario {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(raw)?;
        for (index, step) in scenario.steps.iter().enumerate() {
            step.action()
                .and_then(|_| step.expected_state())
                .with_context(|| format!("step {}", index + 1))?;
        }
        scenario.expected_final()?;
        Ok(scenario)
    }

    pub fn expected_final(&self) -> Result<Option<StateId>> {
        self.expect_final.as_deref().map(parse_state).transpose()
    }

    pub fn policy(&self) -> StationPolicy {
        self.policy.clone().unwrap_or_default().sanitized()
    }
}

pub fn parse_state(name: &str) -> Result<StateId> {
    StateId::parse(name).ok_or_else(|| anyhow!("unknown state `{name}`"))
}

fn network_config(ssid: &str, psk: Option<&str>) -> Result<NetworkConfig> {
    let config = match psk {
        Some(psk) => NetworkConfig::wpa_psk(ssid, psk),
        None => NetworkConfig::open(ssid),
    };
    config.ok_or_else(|| anyhow!("ssid or passphrase too long for `{ssid}`"))
}

fn network(args: &StepArgs) -> Result<NetworkId> {
    args.network
        .map(NetworkId)
        .ok_or_else(|| anyhow!("missing args.network"))
}

fn bssid(args: &StepArgs) -> Result<Option<Bssid>> {
    args.bssid
        .as_deref()
        .map(|raw| {
            raw.parse::<Bssid>()
                .with_context(|| format!("bad bssid `{raw}`"))
        })
        .transpose()
}

fn required_bssid(args: &StepArgs) -> Result<Bssid> {
    bssid(args)?.ok_or_else(|| anyhow!("missing args.bssid"))
}

fn enabled(args: &StepArgs) -> Result<bool> {
    args.enabled.ok_or_else(|| anyhow!("missing args.enabled"))
}

fn value(args: &StepArgs) -> Result<&str> {
    args.value
        .as_deref()
        .ok_or_else(|| anyhow!("missing args.value"))
}

fn parse_mode(raw: &str) -> Result<OperationalMode> {
    match raw {
        "connect" => Ok(OperationalMode::Connect),
        "scan_only" => Ok(OperationalMode::ScanOnly),
        "scan_only_radio_off" => Ok(OperationalMode::ScanOnlyRadioOff),
        _ => Err(anyhow!(
            "invalid mode `{raw}` (use connect|scan_only|scan_only_radio_off)"
        )),
    }
}

fn parse_band(raw: &str) -> Result<FrequencyBand> {
    match raw {
        "auto" => Ok(FrequencyBand::Auto),
        "5ghz" => Ok(FrequencyBand::FiveGhzOnly),
        "2ghz" => Ok(FrequencyBand::TwoGhzOnly),
        _ => Err(anyhow!("invalid band `{raw}` (use auto|5ghz|2ghz)")),
    }
}

fn parse_wps(args: &StepArgs) -> Result<WpsInfo> {
    let raw = value(args)?;
    let setup = match raw {
        "pbc" => WpsSetup::PushButton,
        "display" => WpsSetup::PinFromDevice,
        _ => match raw.strip_prefix("pin:") {
            Some(pin) => WpsSetup::PinFromAccessPoint(
                pin.parse()
                    .map_err(|_| anyhow!("wps pin `{pin}` too long"))?,
            ),
            None => bail!("invalid wps setup `{raw}` (use pbc|display|pin:<digits>)"),
        },
    };
    Ok(WpsInfo {
        setup,
        bssid: bssid(args)?,
    })
}

fn parse_ap(args: &StepArgs) -> Result<ApConfig> {
    let ssid = args
        .ssid
        .as_deref()
        .ok_or_else(|| anyhow!("missing args.ssid"))?;
    let channel = args.channel.unwrap_or(6);
    let psk = args
        .psk
        .as_deref()
        .map(|psk| psk.parse().map_err(|_| anyhow!("ap passphrase too long")))
        .transpose()?;
    Ok(ApConfig {
        ssid: ssid
            .parse()
            .map_err(|_| anyhow!("ap ssid `{ssid}` too long"))?,
        psk,
        band: if channel <= 14 {
            Band::TwoPointFourGhz
        } else {
            Band::FiveGhz
        },
        channel,
    })
}

pub fn parse_command(name: &str, args: &StepArgs) -> Result<Command> {
    let command = match name {
        "start_supplicant" => Command::StartSupplicant,
        "stop_supplicant" => Command::StopSupplicant,
        "start_driver" => Command::StartDriver,
        "stop_driver" => Command::StopDriver,
        "start_ap" => Command::StartAp(parse_ap(args)?),
        "stop_ap" => Command::StopAp,
        "set_operational_mode" => Command::SetOperationalMode(parse_mode(value(args)?)?),
        "set_high_perf_mode" => Command::SetHighPerfMode(enabled(args)?),
        "set_power_save" => Command::SetPowerSave(enabled(args)?),
        "set_frequency_band" => Command::SetFrequencyBand(parse_band(value(args)?)?),
        "set_country_code" => Command::SetCountryCode(value(args)?.to_string()),
        "set_screen_state" => Command::SetScreenState(enabled(args)?),
        "set_foreground_user" => Command::SetForegroundUser(
            args.uid.ok_or_else(|| anyhow!("missing args.uid"))?,
        ),
        "start_scan" => Command::StartScan,
        "connect" => match args.ssid.as_deref() {
            Some(ssid) => Command::Connect(ConnectTarget::New(network_config(
                ssid,
                args.psk.as_deref(),
            )?)),
            None => Command::Connect(ConnectTarget::Saved(network(args)?)),
        },
        "save" => {
            let ssid = args
                .ssid
                .as_deref()
                .ok_or_else(|| anyhow!("missing args.ssid"))?;
            Command::Save(network_config(ssid, args.psk.as_deref())?)
        }
        "forget" => Command::Forget(network(args)?),
        "disconnect" => Command::Disconnect,
        "reconnect" => Command::Reconnect,
        "reassociate" => Command::Reassociate,
        "enable_network" => Command::EnableNetwork {
            id: network(args)?,
            exclusive: args.exclusive,
        },
        "disable_network" => Command::DisableNetwork(network(args)?),
        "start_wps" => Command::StartWps(parse_wps(args)?),
        "cancel_wps" => Command::CancelWps,
        "auto_connect" => Command::AutoConnect {
            network_id: network(args)?,
            bssid: bssid(args)?,
        },
        "auto_roam" => Command::AutoRoam {
            network_id: network(args)?,
            bssid: required_bssid(args)?,
        },
        "network_unwanted" => Command::NetworkUnwanted(match value(args)? {
            "explicit" => UnwantedReason::Explicit,
            "validation_failed" => UnwantedReason::ValidationFailed,
            other => bail!("invalid unwanted reason `{other}`"),
        }),
        _ => bail!("unknown command `{name}`"),
    };
    Ok(command)
}

pub fn parse_notification(name: &str, args: &StepArgs) -> Result<Notification> {
    let notification = match name {
        "supplicant_connected" => Notification::SupplicantConnected,
        "supplicant_disconnected" => Notification::SupplicantDisconnected,
        "driver_hung" => Notification::DriverHung,
        "driver_state" => Notification::DriverStateChanged {
            active: enabled(args)?,
        },
        "state_change" => {
            let raw = args
                .state
                .as_deref()
                .ok_or_else(|| anyhow!("missing args.state"))?;
            Notification::SupplicantStateChanged {
                state: SupplicantState::parse(raw)
                    .ok_or_else(|| anyhow!("unknown supplicant state `{raw}`"))?,
                bssid: bssid(args)?,
                network_id: args.network.map(NetworkId),
            }
        }
        "network_connected" => Notification::NetworkConnected {
            network_id: network(args)?,
            bssid: required_bssid(args)?,
        },
        "network_disconnected" => Notification::NetworkDisconnected {
            bssid: bssid(args)?,
            reason: DisconnectReason(args.reason.unwrap_or(0)),
        },
        "scan_results" => Notification::ScanResultsReady,
        "scan_failed" => Notification::ScanFailed,
        "assoc_reject" => Notification::AssociationRejected {
            bssid: bssid(args)?,
            status: args.status.unwrap_or(1),
        },
        "auth_failure" => Notification::AuthenticationFailed,
        "wps_success" => Notification::WpsSuccess,
        "wps_failed" => Notification::WpsFailed {
            config_error: args.status.unwrap_or(0),
            reason: args.reason.unwrap_or(0),
        },
        "wps_overlap" => Notification::WpsOverlap,
        "wps_timeout" => Notification::WpsTimeout,
        "sim_identity" => Notification::SimIdentityRequest {
            network_id: network(args)?,
        },
        "rssi_breach" => Notification::RssiThresholdBreach {
            rssi: args.rssi.ok_or_else(|| anyhow!("missing args.rssi"))?,
        },
        "p2p_state" => Notification::P2pStateChanged {
            enabled: enabled(args)?,
        },
        "p2p_disabled" => Notification::P2pDisabled,
        "ap_failed" => Notification::SoftApFailed(match args.value.as_deref() {
            Some("no_channel") => ApFailureReason::NoChannel,
            Some("general") | None => ApFailureReason::General,
            Some(other) => bail!("invalid ap failure `{other}` (use general|no_channel)"),
        }),
        _ => bail!("unknown notification `{name}`"),
    };
    Ok(notification)
}

fn parse_ip_config(args: &StepArgs) -> Result<IpConfiguration> {
    let raw = args
        .address
        .as_deref()
        .ok_or_else(|| anyhow!("missing args.address"))?;
    let (address, prefix) = raw.split_once('/').unwrap_or((raw, "24"));
    let address: Ipv4Addr = address
        .parse()
        .with_context(|| format!("bad address `{raw}`"))?;
    let prefix: u8 = prefix
        .parse()
        .with_context(|| format!("bad prefix `{raw}`"))?;
    let mut ip = IpConfiguration::new(address, prefix);
    ip.gateway = args
        .gateway
        .as_deref()
        .map(|gateway| {
            gateway
                .parse::<Ipv4Addr>()
                .with_context(|| format!("bad gateway `{gateway}`"))
        })
        .transpose()?;
    Ok(ip)
}

pub fn parse_ip_event(name: &str, args: &StepArgs) -> Result<IpEvent> {
    let event = match name {
        "pre_dhcp" => IpEvent::PreDhcpAction,
        "post_dhcp" => IpEvent::PostDhcpAction,
        "success" => IpEvent::ProvisioningSuccess(parse_ip_config(args)?),
        "failure" => IpEvent::ProvisioningFailure,
        "link_properties" => IpEvent::LinkPropertiesChanged(parse_ip_config(args)?),
        "reachability_lost" => IpEvent::ReachabilityLost,
        _ => bail!("unknown ip event `{name}`"),
    };
    Ok(event)
}
