use super::*;

use crate::types::{ApConfig, ApFailureReason};

// Commands that make no sense until the driver settles one way or the other.
pub(super) fn waits_for_driver(command: &Command) -> bool {
    matches!(
        command,
        Command::StartDriver
            | Command::StopDriver
            | Command::StartScan
            | Command::SetOperationalMode(_)
            | Command::SetFrequencyBand(_)
            | Command::SetCountryCode(_)
            | Command::SetHighPerfMode(_)
            | Command::SetPowerSave(_)
            | Command::Connect(_)
            | Command::Disconnect
            | Command::Reconnect
            | Command::Reassociate
            | Command::EnableNetwork { .. }
            | Command::AutoConnect { .. }
            | Command::AutoRoam { .. }
            | Command::StartWps(_)
    )
}

const fn suspend_wanted(screen_on: bool, high_perf: bool) -> bool {
    !screen_on && !high_perf
}

impl StationHsm {
    pub(super) fn start_supplicant(
        &mut self,
        context: &mut DispatchContext,
        id: RequestId,
    ) -> Outcome<State> {
        if !self.services.radio.load_driver() {
            error!("station: driver load failed");
            self.set_wifi_state(WifiState::Unknown);
            context.reply(id, Err(CommandError::PrimitiveFailed("load_driver")));
            return Handled;
        }

        // A supplicant left behind by a crash still holds the control socket.
        self.services.radio.kill_supplicant();
        if !self.services.radio.start_supplicant() {
            error!("station: supplicant launch failed");
            self.services.radio.unload_driver();
            self.set_wifi_state(WifiState::Unknown);
            context.reply(id, Err(CommandError::PrimitiveFailed("start_supplicant")));
            return Handled;
        }

        self.set_wifi_state(WifiState::Enabling);
        if !self.services.radio.start_monitoring() {
            warn!("station: monitor did not attach yet");
        }
        context.reply(id, Ok(ReplyValue::Done));
        Transition(State::supplicant_starting())
    }

    pub(super) fn supplicant_ready(&mut self) {
        info!("station: supplicant connected");
        self.supplicant_restarts = 0;
        self.set_wifi_state(WifiState::Enabled);
        self.services
            .radio
            .initialize_identity(&self.policy.device_name);
        self.services.radio.enable_save_config();
        self.services.store.load_networks();
        self.services.observer.supplicant_connection_changed(true);
    }

    pub(super) fn supplicant_start_failed(&mut self, context: &mut DispatchContext) {
        self.supplicant_restarts = self.supplicant_restarts.saturating_add(1);
        self.services.radio.stop_monitoring();
        self.services.radio.kill_supplicant();

        if self.supplicant_restarts <= self.policy.supplicant_restart_max {
            warn!(
                "station: supplicant did not come up, restart {}/{}",
                self.supplicant_restarts, self.policy.supplicant_restart_max
            );
            let delay = self.policy.supplicant_restart_backoff_ms;
            self.arm(context, WatchdogClass::SupplicantRestart, delay);
        } else {
            error!(
                "station: supplicant failed {} times, giving up",
                self.supplicant_restarts
            );
            self.supplicant_restarts = 0;
            self.watchdogs.invalidate(WatchdogClass::SupplicantRestart);
            self.set_wifi_state(WifiState::Unknown);
        }
    }

    pub(super) fn supplicant_lost(&mut self) {
        self.services.radio.stop_monitoring();
        self.services.radio.kill_supplicant();
        self.l2_state = SupplicantState::Uninitialized;
        self.services.observer.supplicant_connection_changed(false);
    }

    // Where a freshly started driver lands: connect mode kicks auto-join,
    // scan-only modes park in ScanMode.
    pub(super) fn driver_started_target(&mut self) -> State {
        if self.mode == OperationalMode::Connect {
            self.services.radio.reconnect();
            State::disconnected()
        } else {
            State::scan_mode()
        }
    }

    pub(super) fn stop_target(&mut self, target: P2pTarget) -> State {
        self.p2p_target = target;
        if self.p2p_enabled {
            info!("station: waiting for p2p to release the interface");
            State::wait_for_p2p_disable()
        } else {
            self.p2p_target_state()
        }
    }

    pub(super) fn p2p_target_state(&self) -> State {
        match self.p2p_target {
            P2pTarget::SupplicantStopping => State::supplicant_stopping(),
            P2pTarget::DriverStopping => State::driver_stopping(),
            P2pTarget::Initial => State::initial(),
        }
    }

    pub(super) fn driver_start_timed_out(&mut self, context: &mut DispatchContext) {
        if self.driver_start_tries >= self.policy.driver_start_retry_max {
            error!(
                "station: driver failed to start after {} tries, restarting supplicant",
                self.driver_start_tries
            );
            self.driver_start_tries = 0;
            context.post(StationEvent::internal(Command::StopSupplicant));
            context.post(StationEvent::internal(Command::StartSupplicant));
            return;
        }

        self.driver_start_tries += 1;
        warn!(
            "station: driver start timed out, try {}",
            self.driver_start_tries
        );
        self.services.radio.start_driver();
        let timeout = self.policy.driver_start_timeout_ms;
        self.arm(context, WatchdogClass::DriverStart, timeout);
    }

    pub(super) fn configure_started_driver(&mut self) {
        if !self.helpers_registered {
            self.services.observer.register_helpers();
            self.helpers_registered = true;
        }

        let radio = &self.services.radio;
        radio.set_scan_interval(self.policy.supplicant_scan_interval_s);
        if let Some(code) = self.country_code.as_deref() {
            radio.set_country_code(code);
        }
        radio.set_band(self.band);
        radio.stop_filtering_multicast_v4();
        radio.set_power_save(self.power_save);
        radio.set_suspend_optimizations(suspend_wanted(self.screen_on, self.high_perf));
    }

    // Radio-side settings are applied here; the root state records the
    // preference and answers the caller.
    pub(super) fn driver_command(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
    ) -> Outcome<State> {
        let radio = &self.services.radio;
        match &request.command {
            Command::StartScan => {
                if radio.scan(None) {
                    context.done(request);
                } else {
                    context.fail(request, CommandError::PrimitiveFailed("scan"));
                }
                Handled
            }
            Command::StartDriver => {
                context.done(request);
                Handled
            }
            Command::StopDriver => {
                context.done(request);
                Transition(self.stop_target(P2pTarget::DriverStopping))
            }
            Command::SetHighPerfMode(enabled) => {
                radio.set_suspend_optimizations(suspend_wanted(self.screen_on, *enabled));
                Super
            }
            Command::SetScreenState(on) => {
                radio.set_suspend_optimizations(suspend_wanted(*on, self.high_perf));
                Super
            }
            Command::SetPowerSave(enabled) => {
                radio.set_power_save(*enabled);
                Super
            }
            Command::SetFrequencyBand(band) => {
                if radio.set_band(*band) {
                    radio.bss_flush();
                    Super
                } else {
                    context.fail(request, CommandError::PrimitiveFailed("set_band"));
                    Handled
                }
            }
            Command::SetCountryCode(code) => {
                if radio.set_country_code(&code.to_ascii_uppercase()) {
                    Super
                } else {
                    context.fail(request, CommandError::PrimitiveFailed("set_country_code"));
                    Handled
                }
            }
            _ => Super,
        }
    }

    pub(super) fn scan_mode_change(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        mode: OperationalMode,
    ) -> Outcome<State> {
        let previous = self.mode;
        self.mode = mode;
        context.done(request);
        info!(
            "station: operational mode {} -> {}",
            previous.as_str(),
            mode.as_str()
        );

        match mode {
            OperationalMode::Connect => {
                if previous == OperationalMode::ScanOnlyRadioOff {
                    self.set_wifi_state(WifiState::Enabled);
                }
                self.services.store.enable_all_networks();
                self.services.radio.reconnect();
                Transition(State::disconnected())
            }
            OperationalMode::ScanOnlyRadioOff => {
                if previous != OperationalMode::ScanOnlyRadioOff {
                    self.set_wifi_state(WifiState::Disabled);
                }
                Handled
            }
            OperationalMode::ScanOnly => {
                if previous == OperationalMode::ScanOnlyRadioOff {
                    self.set_wifi_state(WifiState::Enabled);
                }
                Handled
            }
        }
    }

    pub(super) fn start_soft_ap(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        config: &ApConfig,
    ) -> Outcome<State> {
        if !self.services.radio.load_driver() {
            error!("station: driver load failed, soft ap not started");
            self.set_ap_state(ApState::Failed(ApFailureReason::General));
            context.fail(request, CommandError::PrimitiveFailed("load_driver"));
            return Handled;
        }

        self.set_ap_state(ApState::Enabling);
        if self.services.radio.start_soft_ap(config) {
            self.set_ap_state(ApState::Enabled);
            context.done(request);
            Transition(State::soft_ap())
        } else {
            error!("station: soft ap start failed");
            self.set_ap_state(ApState::Failed(ApFailureReason::General));
            context.fail(request, CommandError::PrimitiveFailed("start_soft_ap"));
            Handled
        }
    }
}
