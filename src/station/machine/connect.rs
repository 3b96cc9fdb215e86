use super::*;

use crate::collab::{DisableReason, ScanOffloadSettings};
use crate::station::auth::authorize_config_change;
use crate::station::events::ConnectTarget;
use crate::station::records::AttemptKind;
use crate::types::{NetworkConfig, NetworkId, WpsInfo};

fn validate_config(config: &NetworkConfig) -> Result<(), CommandError> {
    if config.ssid.is_empty() {
        return Err(CommandError::MissingConfig);
    }
    if !config.has_credential() {
        return Err(CommandError::EmptyCredential);
    }
    Ok(())
}

impl StationHsm {
    fn authorize(&self, request: &Request) -> Result<(), CommandError> {
        authorize_config_change(request.caller, self.foreground_user, &self.policy)
    }

    fn in_l2(&self) -> bool {
        self.leaf.is_within(StateId::L2Connected)
    }

    fn begin_attempt(
        &mut self,
        now_ms: u64,
        network_id: NetworkId,
        bssid: Option<Bssid>,
        kind: AttemptKind,
    ) {
        self.attempt = Some(ConnectionAttempt {
            network_id,
            bssid,
            started_at_ms: now_ms,
            kind,
        });
        self.last_connect_attempt_ms = Some(now_ms);
    }

    pub(super) fn connect_mode_command(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
        request: &Request,
    ) -> Outcome<State> {
        match &request.command {
            Command::Connect(target) => self.connect_network(context, request, target),
            Command::Save(config) => {
                let saved = self
                    .authorize(request)
                    .and_then(|()| validate_config(config))
                    .and_then(|()| {
                        self.services
                            .store
                            .save_network(config.clone(), request.caller)
                            .ok_or(CommandError::PrimitiveFailed("save_network"))
                    });
                match saved {
                    Ok(id) => context.reply(request.id, Ok(ReplyValue::Saved(id))),
                    Err(err) => context.fail(request, err),
                }
                Handled
            }
            Command::Forget(id) => self.forget_network(context, request, *id),
            Command::EnableNetwork { id, exclusive } => {
                self.enable_network(context, request, *id, *exclusive)
            }
            Command::DisableNetwork(id) => {
                if let Err(err) = self.authorize(request) {
                    context.fail(request, err);
                } else if self.services.store.disable_network(*id, DisableReason::ByUser) {
                    // The supplicant drops the link itself if this was the
                    // current network; teardown follows its notification.
                    self.services.radio.disable_network(*id);
                    context.done(request);
                } else {
                    context.fail(request, CommandError::InvalidNetwork);
                }
                Handled
            }
            Command::Disconnect => {
                self.attempt = None;
                self.user_disconnect_pending = true;
                self.services.radio.disconnect();
                context.done(request);
                if self.in_l2() {
                    Transition(State::disconnecting())
                } else {
                    Handled
                }
            }
            Command::Reconnect => {
                if self.services.radio.reconnect() {
                    context.done(request);
                } else {
                    context.fail(request, CommandError::PrimitiveFailed("reconnect"));
                }
                Handled
            }
            Command::Reassociate => {
                self.last_connect_attempt_ms = Some(context.now_ms);
                if self.services.radio.reassociate() {
                    context.done(request);
                } else {
                    context.fail(request, CommandError::PrimitiveFailed("reassociate"));
                }
                Handled
            }
            Command::AutoConnect { network_id, bssid } => {
                self.auto_connect(context, request, *network_id, *bssid)
            }
            Command::AutoRoam { .. } => {
                context.fail(request, CommandError::NotConnected);
                Handled
            }
            Command::StartWps(info) => self.start_wps(context, request, info),
            Command::NetworkUnwanted(_) => {
                context.done(request);
                Handled
            }
            Command::SetOperationalMode(OperationalMode::Connect) => {
                context.done(request);
                Handled
            }
            Command::SetOperationalMode(_) if self.in_l2() => {
                // Leave the link first; the mode change replays from Disconnected.
                self.services.radio.disconnect();
                context.hold(event);
                Transition(State::disconnecting())
            }
            _ => Super,
        }
    }

    fn resolve_target(
        &mut self,
        request: &Request,
        target: &ConnectTarget,
    ) -> Result<NetworkId, CommandError> {
        match target {
            ConnectTarget::Saved(id) => {
                let config = self
                    .services
                    .store
                    .network(*id)
                    .ok_or(CommandError::InvalidNetwork)?;
                if !config.has_credential() {
                    return Err(CommandError::EmptyCredential);
                }
                Ok(*id)
            }
            ConnectTarget::New(config) => {
                validate_config(config)?;
                self.services
                    .store
                    .save_network(config.clone(), request.caller)
                    .ok_or(CommandError::PrimitiveFailed("save_network"))
            }
        }
    }

    fn connect_network(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        target: &ConnectTarget,
    ) -> Outcome<State> {
        let resolved = self
            .authorize(request)
            .and_then(|()| self.resolve_target(request, target));
        let network_id = match resolved {
            Ok(id) => id,
            Err(err) => {
                context.fail(request, err);
                return Handled;
            }
        };

        if self.in_l2() && self.link.network_id == Some(network_id) {
            debug!("station: already on network {network_id}");
            context.done(request);
            return Handled;
        }

        if !self.services.store.select_network(network_id) {
            context.fail(request, CommandError::InvalidNetwork);
            return Handled;
        }
        self.services.store.set_last_selected(Some(network_id));

        let switching = self.in_l2();
        if switching {
            self.services.radio.disconnect();
        }
        if !(self.services.radio.select_network(network_id) && self.services.radio.reconnect()) {
            context.fail(request, CommandError::PrimitiveFailed("reconnect"));
            return Handled;
        }

        info!("station: connecting to network {network_id}");
        self.begin_attempt(context.now_ms, network_id, None, AttemptKind::Fresh);
        context.done(request);
        if switching {
            Transition(State::disconnecting())
        } else {
            Handled
        }
    }

    pub(super) fn auto_connect(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        network_id: NetworkId,
        bssid: Option<Bssid>,
    ) -> Outcome<State> {
        if self.services.store.network(network_id).is_none() {
            context.fail(request, CommandError::InvalidNetwork);
            return Handled;
        }

        let debouncing = self.link.debouncing;
        let did_disconnect = self.in_l2() && !debouncing;
        if did_disconnect {
            self.services.radio.disconnect();
        }

        let radio = &self.services.radio;
        radio.set_bssid(network_id, bssid);
        if !(radio.select_network(network_id) && radio.reconnect()) {
            context.fail(request, CommandError::PrimitiveFailed("reconnect"));
            return Handled;
        }

        debug!("station: auto-connect to network {network_id}");
        self.begin_attempt(context.now_ms, network_id, bssid, AttemptKind::Fresh);
        context.done(request);
        if debouncing {
            self.roam_target = bssid;
            Transition(State::roaming())
        } else if did_disconnect {
            Transition(State::disconnecting())
        } else {
            Handled
        }
    }

    fn forget_network(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        id: NetworkId,
    ) -> Outcome<State> {
        if let Err(err) = self.authorize(request) {
            context.fail(request, err);
            return Handled;
        }
        if self.services.store.network(id).is_none() {
            context.fail(request, CommandError::InvalidNetwork);
            return Handled;
        }
        if !self.services.store.forget_network(id) {
            context.fail(request, CommandError::PrimitiveFailed("forget_network"));
            return Handled;
        }

        if self.services.store.last_selected() == Some(id) {
            self.services.store.set_last_selected(None);
        }
        if self.attempt.is_some_and(|attempt| attempt.network_id == id) {
            self.attempt = None;
        }
        context.done(request);

        if self.in_l2() && self.link.network_id == Some(id) {
            info!("station: forgot current network {id}, disconnecting");
            self.services.radio.disconnect();
            Transition(State::disconnecting())
        } else {
            Handled
        }
    }

    fn enable_network(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        id: NetworkId,
        exclusive: bool,
    ) -> Outcome<State> {
        if let Err(err) = self.authorize(request) {
            context.fail(request, err);
            return Handled;
        }
        if self.services.store.network(id).is_none() {
            context.fail(request, CommandError::InvalidNetwork);
            return Handled;
        }
        if !self.services.store.enable_network(id, exclusive) {
            context.fail(request, CommandError::PrimitiveFailed("enable_network"));
            return Handled;
        }

        let ok = if exclusive {
            self.begin_attempt(context.now_ms, id, None, AttemptKind::Fresh);
            self.services.radio.select_network(id)
        } else {
            self.services.radio.enable_network(id)
        };
        if ok {
            context.done(request);
        } else {
            context.fail(request, CommandError::PrimitiveFailed("enable_network"));
        }
        Handled
    }

    fn start_wps(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        info: &WpsInfo,
    ) -> Outcome<State> {
        if let Err(err) = self.authorize(request) {
            context.fail(request, err);
            return Handled;
        }

        self.services.store.disable_all_networks();
        match self.services.radio.start_wps(info) {
            Ok(pin) => {
                info!("station: wps session started");
                self.wps_request = Some(request.id);
                context.reply(request.id, Ok(ReplyValue::WpsStarted { pin }));
                Transition(State::wps_running())
            }
            Err(err) => {
                self.services.store.enable_all_networks();
                context.fail(request, err);
                Handled
            }
        }
    }

    pub(super) fn connect_mode_notification(
        &mut self,
        context: &mut DispatchContext,
        notification: &Notification,
    ) -> Outcome<State> {
        let _ = context;
        match notification {
            Notification::NetworkConnected { network_id, bssid } => {
                info!("station: associated with {bssid} on network {network_id}");
                self.link.network_id = Some(*network_id);
                self.link.bssid = Some(*bssid);
                if let Some(attempt) = self.attempt.as_mut() {
                    if attempt.network_id == *network_id {
                        attempt.bssid = Some(*bssid);
                    }
                }
                Transition(State::obtaining_ip())
            }
            Notification::AssociationRejected { bssid, status } => {
                warn!("station: association rejected (status {status})");
                let network_id = self.attempt.map(|attempt| attempt.network_id);
                self.services
                    .store
                    .note_association_rejection(network_id, *bssid);
                Handled
            }
            Notification::AuthenticationFailed => {
                warn!("station: authentication failed");
                if let Some(attempt) = self.attempt.take() {
                    self.services
                        .store
                        .note_authentication_failure(attempt.network_id);
                }
                Handled
            }
            Notification::SimIdentityRequest { network_id } => {
                match self.services.sim.identity(*network_id) {
                    Some(identity) => {
                        self.services
                            .radio
                            .sim_identity_response(*network_id, &identity);
                    }
                    None => warn!("station: no sim identity for network {network_id}"),
                }
                Handled
            }
            Notification::SimAuthRequest(auth) => {
                match self.services.sim.authenticate(auth) {
                    Some(response) => {
                        self.services
                            .radio
                            .sim_auth_response(auth.network_id, auth.kind, &response);
                    }
                    None => {
                        warn!("station: sim authentication failed");
                        self.services.radio.sim_auth_failure(auth.network_id);
                    }
                }
                Handled
            }
            _ => Super,
        }
    }

    pub(super) fn admit_scan(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
        request: &Request,
    ) -> Outcome<State> {
        let since_attempt = self
            .last_connect_attempt_ms
            .map(|at| context.now_ms.saturating_sub(at));
        let cooldown = u64::from(self.policy.scan_cooldown_ms);
        if let Some(elapsed) = since_attempt.filter(|elapsed| *elapsed < cooldown) {
            let delay = u64::from(self.policy.scan_defer_ms).saturating_sub(elapsed);
            debug!("station: scan too close to connect attempt, retry in {delay}ms");
            context.post_delayed(u32::try_from(delay).unwrap_or(u32::MAX), event.clone());
            return Handled;
        }

        if self.services.radio.scan(None) {
            context.done(request);
        } else {
            context.fail(request, CommandError::PrimitiveFailed("scan"));
        }
        Handled
    }

    // Screen-off scanning in Disconnected is handed to the firmware.
    pub(super) fn update_scan_offload(&mut self, screen_on: bool) {
        if !screen_on && !self.scan_offload_active {
            self.scan_offload_active = self
                .services
                .radio
                .start_scan_offload(ScanOffloadSettings::SCREEN_OFF);
        } else if screen_on && self.scan_offload_active {
            self.services.radio.stop_scan_offload();
            self.scan_offload_active = false;
        }
    }

    pub(super) fn wps_notification(
        &mut self,
        context: &mut DispatchContext,
        event: &StationEvent,
        notification: &Notification,
    ) -> Outcome<State> {
        match notification {
            Notification::WpsSuccess => {
                info!("station: wps credentials received");
                if let Some(id) = self.wps_request.take() {
                    context.reply(id, Ok(ReplyValue::WpsCompleted));
                }
                Handled
            }
            Notification::NetworkConnected { .. } => {
                context.hold(event);
                Transition(State::disconnected())
            }
            Notification::WpsOverlap => self.wps_finished(context, CommandError::WpsOverlap),
            Notification::WpsTimeout => self.wps_finished(context, CommandError::WpsTimedOut),
            Notification::WpsFailed {
                config_error,
                reason,
            } => {
                let code = if *config_error != 0 {
                    *config_error
                } else {
                    *reason
                };
                if code == 0 {
                    debug!("station: ignoring unspecified wps failure");
                    Handled
                } else {
                    self.wps_finished(context, CommandError::WpsFailed(code))
                }
            }
            _ => Super,
        }
    }

    fn wps_finished(&mut self, context: &mut DispatchContext, err: CommandError) -> Outcome<State> {
        warn!("station: wps ended: {err}");
        if let Some(id) = self.wps_request.take() {
            context.reply(id, Err(err));
        }
        Transition(State::disconnected())
    }
}
