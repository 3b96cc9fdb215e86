use log::{debug, error, info, warn};
use statig::prelude::*;

use crate::collab::Collaborators;
use crate::config::StationPolicy;
use crate::error::CommandError;
use crate::types::{
    ApState, Bssid, DetailedState, FrequencyBand, OperationalMode, RequestId, SupplicantState,
    WifiState,
};

use super::events::{
    Command, IpEvent, Notification, Reply, ReplyValue, Request, StationEvent, TimerEvent,
};
use super::records::{ConnectionAttempt, LinkRecord};
use super::state_id::{StateId, StateTrace};
use super::watchdog::{WatchdogClass, Watchdogs};

mod bringup;
mod connect;
mod link;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum P2pTarget {
    SupplicantStopping,
    DriverStopping,
    Initial,
}

pub(super) struct DispatchContext {
    pub(super) now_ms: u64,
    pub(super) replies: Vec<Reply>,
    pub(super) deferred: Vec<StationEvent>,
    pub(super) posts: Vec<StationEvent>,
    pub(super) delayed: Vec<(u32, StationEvent)>,
    pub(super) unhandled: bool,
    pub(super) entered: u32,
}

impl DispatchContext {
    pub(super) fn new(now_ms: u64) -> Self {
        Self {
            now_ms,
            replies: Vec::new(),
            deferred: Vec::new(),
            posts: Vec::new(),
            delayed: Vec::new(),
            unhandled: false,
            entered: 0,
        }
    }

    fn reply(&mut self, id: RequestId, outcome: Result<ReplyValue, CommandError>) {
        self.replies.push(Reply { id, outcome });
    }

    fn done(&mut self, request: &Request) {
        self.reply(request.id, Ok(ReplyValue::Done));
    }

    fn fail(&mut self, request: &Request, err: CommandError) {
        self.reply(request.id, Err(err));
    }

    fn hold(&mut self, event: &StationEvent) {
        debug!("station: defer {}", event.label());
        self.deferred.push(event.clone());
    }

    fn defer(&mut self, event: &StationEvent) -> Outcome<State> {
        self.hold(event);
        Handled
    }

    fn post(&mut self, event: StationEvent) {
        self.posts.push(event);
    }

    fn post_delayed(&mut self, delay_ms: u32, event: StationEvent) {
        self.delayed.push((delay_ms, event));
    }
}

pub(super) struct StationHsm {
    pub(super) policy: StationPolicy,
    pub(super) services: Collaborators,
    pub(super) watchdogs: Watchdogs,
    pub(super) leaf: StateId,
    pub(super) trace: StateTrace,
    pub(super) wifi_state: WifiState,
    pub(super) ap_state: ApState,
    pub(super) l2_state: SupplicantState,
    pub(super) mode: OperationalMode,
    pub(super) screen_on: bool,
    pub(super) foreground_user: u32,
    pub(super) band: FrequencyBand,
    pub(super) country_code: Option<String>,
    pub(super) power_save: bool,
    pub(super) high_perf: bool,
    pub(super) p2p_enabled: bool,
    pub(super) p2p_target: P2pTarget,
    pub(super) helpers_registered: bool,
    pub(super) supplicant_restarts: u8,
    pub(super) driver_start_tries: u8,
    pub(super) link: LinkRecord,
    pub(super) attempt: Option<ConnectionAttempt>,
    pub(super) last_connect_attempt_ms: Option<u64>,
    pub(super) driver_roam_started_ms: Option<u64>,
    pub(super) roam_target: Option<Bssid>,
    pub(super) roam_associated: bool,
    pub(super) wps_request: Option<RequestId>,
    pub(super) user_disconnect_pending: bool,
    pub(super) scan_offload_active: bool,
    pub(super) ip_timeout_streak: u8,
    pub(super) teardowns: u32,
}

impl StationHsm {
    pub(super) fn new(policy: StationPolicy, services: Collaborators) -> Self {
        let policy = policy.sanitized();
        let country_code = policy.country_code.clone();
        Self {
            policy,
            services,
            watchdogs: Watchdogs::default(),
            leaf: StateId::Initial,
            trace: StateTrace::default(),
            wifi_state: WifiState::Disabled,
            ap_state: ApState::Disabled,
            l2_state: SupplicantState::Uninitialized,
            mode: OperationalMode::Connect,
            screen_on: true,
            foreground_user: 0,
            band: FrequencyBand::Auto,
            country_code,
            power_save: true,
            high_perf: false,
            p2p_enabled: false,
            p2p_target: P2pTarget::Initial,
            helpers_registered: false,
            supplicant_restarts: 0,
            driver_start_tries: 0,
            link: LinkRecord::default(),
            attempt: None,
            last_connect_attempt_ms: None,
            driver_roam_started_ms: None,
            roam_target: None,
            roam_associated: false,
            wps_request: None,
            user_disconnect_pending: false,
            scan_offload_active: false,
            ip_timeout_streak: 0,
            teardowns: 0,
        }
    }

    fn entered(&mut self, context: &mut DispatchContext, state: StateId) {
        self.trace.enter(state);
        if state.is_leaf() {
            self.leaf = state;
            context.entered += 1;
        }
    }

    fn exited(&mut self, state: StateId) {
        self.trace.exit(state);
    }

    fn set_wifi_state(&mut self, state: WifiState) {
        info!("station: wifi state {}", state.as_str());
        self.wifi_state = state;
        self.services.observer.wifi_state_changed(state);
    }

    fn set_ap_state(&mut self, state: ApState) {
        info!("station: ap state {}", state.as_str());
        self.ap_state = state;
        self.services.observer.ap_state_changed(state);
    }

    fn note_l2_state(&mut self, state: SupplicantState) {
        if self.l2_state != state {
            debug!(
                "station: supplicant {} -> {}",
                self.l2_state.as_str(),
                state.as_str()
            );
        }
        self.l2_state = state;
        self.services.observer.supplicant_state_changed(state);
    }

    fn publish_detailed(&mut self, state: DetailedState) {
        self.link.detailed = state;
        self.services
            .observer
            .network_state_changed(state, &self.link);
    }

    fn arm(&mut self, context: &mut DispatchContext, class: WatchdogClass, delay_ms: u32) {
        let token = self.watchdogs.arm(class);
        context.post_delayed(delay_ms, StationEvent::Timer(TimerEvent::Expired(token)));
    }

    fn live_timer(&self, event: &StationEvent, class: WatchdogClass) -> bool {
        match event {
            StationEvent::Timer(TimerEvent::Expired(token)) => {
                token.class == class && self.watchdogs.is_live(*token)
            }
            _ => false,
        }
    }

    fn handle_root_command(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
    ) -> Outcome<State> {
        match &request.command {
            Command::SetOperationalMode(mode) => self.mode = *mode,
            Command::SetScreenState(on) => self.screen_on = *on,
            Command::SetForegroundUser(user) => self.foreground_user = *user,
            Command::SetHighPerfMode(enabled) => self.high_perf = *enabled,
            Command::SetPowerSave(enabled) => self.power_save = *enabled,
            Command::SetFrequencyBand(band) => self.band = *band,
            Command::SetCountryCode(code) => self.country_code = Some(code.to_ascii_uppercase()),
            command => {
                debug!(
                    "station: {} not handled in {}",
                    command.label(),
                    self.leaf.as_str()
                );
                context.unhandled = true;
                context.fail(request, CommandError::NotInState(self.leaf));
                return Handled;
            }
        }
        context.done(request);
        Handled
    }
}

#[state_machine(initial = "State::initial()")]
impl StationHsm {
    #[superstate(entry_action = "enter_default", exit_action = "exit_default")]
    fn default_state(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => self.handle_root_command(context, request),
            StationEvent::Supplicant(Notification::SupplicantStateChanged { state, .. }) => {
                self.note_l2_state(*state);
                Handled
            }
            StationEvent::Supplicant(Notification::P2pStateChanged { enabled }) => {
                self.p2p_enabled = *enabled;
                Handled
            }
            StationEvent::Supplicant(Notification::P2pDisabled) => {
                self.p2p_enabled = false;
                Handled
            }
            // Stale or superseded timers land here and do nothing.
            StationEvent::Timer(_) => Handled,
            _ => {
                debug!(
                    "station: {} unhandled in {}",
                    event.label(),
                    self.leaf.as_str()
                );
                context.unhandled = true;
                Handled
            }
        }
    }

    #[action]
    fn enter_default(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::Default);
    }

    #[action]
    fn exit_default(&mut self) {
        self.exited(StateId::Default);
    }

    #[state(
        superstate = "default_state",
        entry_action = "enter_initial",
        exit_action = "exit_initial"
    )]
    fn initial(&mut self, context: &mut DispatchContext, event: &StationEvent) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => match &request.command {
                Command::StartSupplicant => self.start_supplicant(context, request.id),
                Command::StopSupplicant => {
                    self.watchdogs.invalidate(WatchdogClass::SupplicantRestart);
                    context.done(request);
                    Handled
                }
                Command::StartAp(config) => self.start_soft_ap(context, request, config),
                Command::StopAp => {
                    context.done(request);
                    Handled
                }
                _ => Super,
            },
            event if self.live_timer(event, WatchdogClass::SupplicantRestart) => {
                info!("station: restarting supplicant");
                self.start_supplicant(context, RequestId::INTERNAL)
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_initial(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::Initial);
        self.services.radio.unload_driver();
    }

    #[action]
    fn exit_initial(&mut self) {
        self.exited(StateId::Initial);
    }

    #[state(
        superstate = "default_state",
        entry_action = "enter_supplicant_starting",
        exit_action = "exit_supplicant_starting"
    )]
    fn supplicant_starting(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Supplicant(Notification::SupplicantConnected) => {
                self.supplicant_ready();
                Transition(self.driver_started_target())
            }
            StationEvent::Supplicant(Notification::SupplicantDisconnected) => {
                self.supplicant_start_failed(context);
                Transition(State::initial())
            }
            StationEvent::Command(request) if request.command.is_lifecycle() => {
                context.defer(event)
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_supplicant_starting(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::SupplicantStarting);
    }

    #[action]
    fn exit_supplicant_starting(&mut self) {
        self.exited(StateId::SupplicantStarting);
    }

    #[superstate(
        superstate = "default_state",
        entry_action = "enter_supplicant_started",
        exit_action = "exit_supplicant_started"
    )]
    fn supplicant_started(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => match &request.command {
                Command::StartSupplicant => {
                    context.done(request);
                    Handled
                }
                Command::StopSupplicant => {
                    context.done(request);
                    Transition(self.stop_target(P2pTarget::SupplicantStopping))
                }
                _ => Super,
            },
            StationEvent::Supplicant(Notification::SupplicantDisconnected) => {
                warn!("station: supplicant connection lost");
                self.supplicant_lost();
                let delay = self.policy.supplicant_restart_backoff_ms;
                self.arm(context, WatchdogClass::SupplicantRestart, delay);
                Transition(self.stop_target(P2pTarget::Initial))
            }
            StationEvent::Supplicant(Notification::DriverHung) => {
                error!("station: driver hung, restarting supplicant");
                context.post(StationEvent::internal(Command::StopSupplicant));
                context.post(StationEvent::internal(Command::StartSupplicant));
                Handled
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_supplicant_started(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::SupplicantStarted);
    }

    #[action]
    fn exit_supplicant_started(&mut self) {
        self.exited(StateId::SupplicantStarted);
    }

    #[state(
        superstate = "supplicant_started",
        entry_action = "enter_driver_starting",
        exit_action = "exit_driver_starting"
    )]
    fn driver_starting(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Supplicant(Notification::DriverStateChanged { active: true }) => {
                Transition(self.driver_started_target())
            }
            StationEvent::Supplicant(Notification::SupplicantStateChanged { state, .. })
                if state.is_driver_active() =>
            {
                self.note_l2_state(*state);
                Transition(self.driver_started_target())
            }
            StationEvent::Command(request) if bringup::waits_for_driver(&request.command) => {
                context.defer(event)
            }
            event if self.live_timer(event, WatchdogClass::DriverStart) => {
                self.driver_start_timed_out(context);
                Handled
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_driver_starting(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::DriverStarting);
        let timeout = self.policy.driver_start_timeout_ms;
        self.arm(context, WatchdogClass::DriverStart, timeout);
    }

    #[action]
    fn exit_driver_starting(&mut self) {
        self.exited(StateId::DriverStarting);
        self.watchdogs.invalidate(WatchdogClass::DriverStart);
    }

    #[superstate(
        superstate = "supplicant_started",
        entry_action = "enter_driver_started",
        exit_action = "exit_driver_started"
    )]
    fn driver_started(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => self.driver_command(context, request),
            StationEvent::Supplicant(Notification::ScanResultsReady) => {
                self.services.observer.scan_results_available(true);
                Handled
            }
            StationEvent::Supplicant(Notification::ScanFailed) => {
                self.services.observer.scan_results_available(false);
                Handled
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_driver_started(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::DriverStarted);
        self.configure_started_driver();
    }

    #[action]
    fn exit_driver_started(&mut self) {
        self.exited(StateId::DriverStarted);
    }

    #[state(
        superstate = "driver_started",
        entry_action = "enter_scan_mode",
        exit_action = "exit_scan_mode"
    )]
    fn scan_mode(&mut self, context: &mut DispatchContext, event: &StationEvent) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => match &request.command {
                Command::SetOperationalMode(mode) => self.scan_mode_change(context, request, *mode),
                _ => Super,
            },
            _ => Super,
        }
    }

    #[action]
    fn enter_scan_mode(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::ScanMode);
        if self.mode != OperationalMode::Connect {
            self.services.radio.disconnect();
            self.services.store.disable_all_networks();
            if self.mode == OperationalMode::ScanOnlyRadioOff {
                self.set_wifi_state(WifiState::Disabled);
            }
        }
    }

    #[action]
    fn exit_scan_mode(&mut self) {
        self.exited(StateId::ScanMode);
    }

    #[superstate(
        superstate = "driver_started",
        entry_action = "enter_connect_mode",
        exit_action = "exit_connect_mode"
    )]
    fn connect_mode(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => self.connect_mode_command(context, event, request),
            StationEvent::Supplicant(notification) => {
                self.connect_mode_notification(context, notification)
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_connect_mode(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::ConnectMode);
    }

    #[action]
    fn exit_connect_mode(&mut self) {
        self.exited(StateId::ConnectMode);
        self.attempt = None;
    }

    #[superstate(
        superstate = "connect_mode",
        entry_action = "enter_l2_connected",
        exit_action = "exit_l2_connected"
    )]
    fn l2_connected(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Provisioning(ip_event) => self.l2_provisioning(ip_event),
            StationEvent::Supplicant(notification) => {
                self.l2_notification(context, notification)
            }
            event if self.live_timer(event, WatchdogClass::RssiPoll) => {
                self.refresh_signal();
                let interval = self.policy.rssi_poll_interval_ms;
                self.arm(context, WatchdogClass::RssiPoll, interval);
                Handled
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_l2_connected(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::L2Connected);
        self.begin_l2_link(context);
    }

    #[action]
    fn exit_l2_connected(&mut self) {
        self.exited(StateId::L2Connected);
        self.tear_down_link();
    }

    #[state(
        superstate = "l2_connected",
        entry_action = "enter_obtaining_ip",
        exit_action = "exit_obtaining_ip"
    )]
    fn obtaining_ip(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Provisioning(IpEvent::ProvisioningSuccess(ip)) => {
                self.ip_timeout_streak = 0;
                self.apply_ip_configuration(ip);
                Transition(State::connected())
            }
            StationEvent::Command(Request {
                command: Command::SetPowerSave(_) | Command::SetHighPerfMode(_) | Command::StartScan,
                ..
            }) => context.defer(event),
            event if self.live_timer(event, WatchdogClass::ObtainingIp) => {
                self.obtaining_ip_timed_out();
                Transition(State::disconnecting())
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_obtaining_ip(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::ObtainingIp);
        self.start_provisioning(context);
    }

    #[action]
    fn exit_obtaining_ip(&mut self) {
        self.exited(StateId::ObtainingIp);
        self.watchdogs.invalidate(WatchdogClass::ObtainingIp);
    }

    #[state(
        superstate = "l2_connected",
        entry_action = "enter_connected",
        exit_action = "exit_connected"
    )]
    fn connected(&mut self, context: &mut DispatchContext, event: &StationEvent) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => match &request.command {
                Command::NetworkUnwanted(reason) => self.network_unwanted(context, request, *reason),
                Command::AutoRoam { network_id, bssid } => {
                    self.auto_roam(context, request, *network_id, *bssid)
                }
                _ => Super,
            },
            StationEvent::Supplicant(Notification::NetworkDisconnected { bssid, reason }) => {
                self.connected_link_lost(context, *bssid, *reason)
            }
            event if self.live_timer(event, WatchdogClass::Debounce) => {
                if self.link.debouncing {
                    warn!("station: link did not come back, disconnecting");
                    Transition(State::disconnected())
                } else {
                    Handled
                }
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_connected(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::Connected);
        self.commit_link();
    }

    #[action]
    fn exit_connected(&mut self) {
        self.exited(StateId::Connected);
        self.watchdogs.invalidate(WatchdogClass::Debounce);
        self.link.debouncing = false;
    }

    #[state(
        superstate = "l2_connected",
        entry_action = "enter_roaming",
        exit_action = "exit_roaming"
    )]
    fn roaming(&mut self, context: &mut DispatchContext, event: &StationEvent) -> Outcome<State> {
        let _ = context;
        match event {
            StationEvent::Supplicant(notification) => self.roaming_notification(notification),
            event if self.live_timer(event, WatchdogClass::Roam) => {
                warn!("station: roam timed out");
                self.services.radio.disconnect();
                Transition(State::disconnected())
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_roaming(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::Roaming);
        self.roam_associated = false;
        let timeout = self.policy.roam_timeout_ms;
        self.arm(context, WatchdogClass::Roam, timeout);
    }

    #[action]
    fn exit_roaming(&mut self) {
        self.exited(StateId::Roaming);
        self.watchdogs.invalidate(WatchdogClass::Roam);
        self.roam_associated = false;
        self.roam_target = None;
    }

    #[state(
        superstate = "connect_mode",
        entry_action = "enter_disconnecting",
        exit_action = "exit_disconnecting"
    )]
    fn disconnecting(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Supplicant(Notification::NetworkDisconnected { .. }) => {
                Transition(State::disconnected())
            }
            StationEvent::Supplicant(Notification::SupplicantStateChanged { state, .. })
                if state.is_link_down() =>
            {
                self.note_l2_state(*state);
                Transition(State::disconnected())
            }
            StationEvent::Command(Request {
                command: Command::SetOperationalMode(_) | Command::StartScan,
                ..
            }) => context.defer(event),
            event if self.live_timer(event, WatchdogClass::Disconnecting) => {
                warn!("station: disconnect never confirmed, forcing teardown");
                Transition(State::disconnected())
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_disconnecting(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::Disconnecting);
        let timeout = self.policy.disconnecting_timeout_ms;
        self.arm(context, WatchdogClass::Disconnecting, timeout);
    }

    #[action]
    fn exit_disconnecting(&mut self) {
        self.exited(StateId::Disconnecting);
        self.watchdogs.invalidate(WatchdogClass::Disconnecting);
    }

    #[state(
        superstate = "connect_mode",
        entry_action = "enter_disconnected",
        exit_action = "exit_disconnected"
    )]
    fn disconnected(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => match &request.command {
                Command::StartScan => self.admit_scan(context, event, request),
                Command::SetOperationalMode(mode) if *mode != OperationalMode::Connect => {
                    self.mode = *mode;
                    context.done(request);
                    Transition(State::scan_mode())
                }
                Command::SetScreenState(on) => {
                    self.update_scan_offload(*on);
                    Super
                }
                _ => Super,
            },
            StationEvent::Supplicant(Notification::NetworkDisconnected { .. }) => Handled,
            _ => Super,
        }
    }

    #[action]
    fn enter_disconnected(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::Disconnected);
        self.user_disconnect_pending = false;
        self.update_scan_offload(self.screen_on);
    }

    #[action]
    fn exit_disconnected(&mut self) {
        self.exited(StateId::Disconnected);
        self.update_scan_offload(true);
    }

    #[state(
        superstate = "connect_mode",
        entry_action = "enter_wps_running",
        exit_action = "exit_wps_running"
    )]
    fn wps_running(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => match &request.command {
                Command::StartWps(_) => {
                    context.fail(request, CommandError::WpsInProgress);
                    Handled
                }
                Command::CancelWps => {
                    if self.services.radio.cancel_wps() {
                        context.done(request);
                    } else {
                        context.fail(request, CommandError::PrimitiveFailed("wps_cancel"));
                    }
                    Transition(State::disconnected())
                }
                command if command.alters_connection() => context.defer(event),
                _ => Super,
            },
            StationEvent::Supplicant(notification) => {
                self.wps_notification(context, event, notification)
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_wps_running(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::WpsRunning);
    }

    #[action]
    fn exit_wps_running(&mut self, context: &mut DispatchContext) {
        self.exited(StateId::WpsRunning);
        if let Some(id) = self.wps_request.take() {
            context.reply(id, Err(CommandError::WpsCancelled));
        }
        self.services.store.enable_all_networks();
        self.services.store.load_networks();
    }

    #[state(
        superstate = "supplicant_started",
        entry_action = "enter_wait_for_p2p_disable",
        exit_action = "exit_wait_for_p2p_disable"
    )]
    fn wait_for_p2p_disable(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Supplicant(Notification::P2pDisabled) => {
                self.p2p_enabled = false;
                Transition(self.p2p_target_state())
            }
            StationEvent::Command(_) => context.defer(event),
            // A crash restart armed on the way in belongs to Initial.
            event if self.live_timer(event, WatchdogClass::SupplicantRestart) => {
                context.defer(event)
            }
            event if self.live_timer(event, WatchdogClass::P2pDisable) => {
                warn!("station: p2p did not release the interface, proceeding");
                Transition(self.p2p_target_state())
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_wait_for_p2p_disable(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::WaitForP2pDisable);
        self.services.observer.request_p2p_disable();
        let timeout = self.policy.p2p_disable_timeout_ms;
        self.arm(context, WatchdogClass::P2pDisable, timeout);
    }

    #[action]
    fn exit_wait_for_p2p_disable(&mut self) {
        self.exited(StateId::WaitForP2pDisable);
        self.watchdogs.invalidate(WatchdogClass::P2pDisable);
    }

    #[state(
        superstate = "supplicant_started",
        entry_action = "enter_driver_stopping",
        exit_action = "exit_driver_stopping"
    )]
    fn driver_stopping(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Supplicant(Notification::DriverStateChanged { active: false }) => {
                Transition(State::driver_stopped())
            }
            StationEvent::Supplicant(Notification::SupplicantStateChanged {
                state: SupplicantState::InterfaceDisabled,
                ..
            }) => {
                self.note_l2_state(SupplicantState::InterfaceDisabled);
                Transition(State::driver_stopped())
            }
            StationEvent::Command(request) if bringup::waits_for_driver(&request.command) => {
                context.defer(event)
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_driver_stopping(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::DriverStopping);
        self.services.radio.stop_driver();
    }

    #[action]
    fn exit_driver_stopping(&mut self) {
        self.exited(StateId::DriverStopping);
    }

    #[state(
        superstate = "supplicant_started",
        entry_action = "enter_driver_stopped",
        exit_action = "exit_driver_stopped"
    )]
    fn driver_stopped(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Command(Request {
                id,
                command: Command::StartDriver,
                ..
            }) => {
                if self.services.radio.start_driver() {
                    self.driver_start_tries = 1;
                    context.reply(*id, Ok(ReplyValue::Done));
                    Transition(State::driver_starting())
                } else {
                    context.reply(*id, Err(CommandError::PrimitiveFailed("driver_start")));
                    Handled
                }
            }
            StationEvent::Supplicant(Notification::DriverStateChanged { active: true }) => {
                Transition(self.driver_started_target())
            }
            StationEvent::Supplicant(Notification::SupplicantStateChanged { state, .. })
                if state.is_driver_active() =>
            {
                self.note_l2_state(*state);
                Transition(self.driver_started_target())
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_driver_stopped(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::DriverStopped);
    }

    #[action]
    fn exit_driver_stopped(&mut self) {
        self.exited(StateId::DriverStopped);
    }

    #[state(
        superstate = "default_state",
        entry_action = "enter_supplicant_stopping",
        exit_action = "exit_supplicant_stopping"
    )]
    fn supplicant_stopping(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
    ) -> Outcome<State> {
        match event {
            StationEvent::Supplicant(Notification::SupplicantDisconnected) => {
                self.supplicant_lost();
                self.set_wifi_state(WifiState::Disabled);
                Transition(State::initial())
            }
            StationEvent::Supplicant(Notification::SupplicantConnected) => Handled,
            StationEvent::Command(request) if request.command.is_lifecycle() => {
                context.defer(event)
            }
            event if self.live_timer(event, WatchdogClass::SupplicantStop) => {
                warn!("station: supplicant ignored terminate, killing it");
                self.supplicant_lost();
                self.set_wifi_state(WifiState::Disabled);
                Transition(State::initial())
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_supplicant_stopping(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::SupplicantStopping);
        self.set_wifi_state(WifiState::Disabling);
        self.services.radio.terminate_supplicant();
        let timeout = self.policy.supplicant_stop_timeout_ms;
        self.arm(context, WatchdogClass::SupplicantStop, timeout);
    }

    #[action]
    fn exit_supplicant_stopping(&mut self) {
        self.exited(StateId::SupplicantStopping);
        self.watchdogs.invalidate(WatchdogClass::SupplicantStop);
    }

    #[state(
        superstate = "default_state",
        entry_action = "enter_soft_ap",
        exit_action = "exit_soft_ap"
    )]
    fn soft_ap(&mut self, context: &mut DispatchContext, event: &StationEvent) -> Outcome<State> {
        match event {
            StationEvent::Command(request) => match &request.command {
                Command::StopAp => {
                    self.services.radio.stop_soft_ap();
                    self.set_ap_state(ApState::Disabling);
                    self.set_ap_state(ApState::Disabled);
                    context.done(request);
                    Transition(State::initial())
                }
                Command::StartAp(_) => {
                    context.done(request);
                    Handled
                }
                command if command.is_lifecycle() => context.defer(event),
                _ => Super,
            },
            StationEvent::Supplicant(Notification::SoftApFailed(reason)) => {
                error!("station: soft ap failed (reason {})", reason.as_u8());
                self.services.radio.stop_soft_ap();
                self.set_ap_state(ApState::Failed(*reason));
                Transition(State::initial())
            }
            _ => Super,
        }
    }

    #[action]
    fn enter_soft_ap(&mut self, context: &mut DispatchContext) {
        self.entered(context, StateId::SoftAp);
    }

    #[action]
    fn exit_soft_ap(&mut self) {
        self.exited(StateId::SoftAp);
    }
}
