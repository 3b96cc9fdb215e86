use super::*;

use crate::collab::ProvisioningRequest;
use crate::station::debounce::{should_debounce, DebounceInput};
use crate::station::events::UnwantedReason;
use crate::station::records::AttemptKind;
use crate::types::{DisconnectReason, IpConfiguration, NetworkId};

fn rssi_bound(value: Option<i32>, fallback: i8) -> i8 {
    value
        .and_then(|rssi| i8::try_from(rssi).ok())
        .unwrap_or(fallback)
}

impl StationHsm {
    pub(super) fn refresh_signal(&mut self) {
        let Some(poll) = self.services.radio.signal_poll() else {
            return;
        };
        if poll.rssi.is_some() {
            self.link.rssi = poll.rssi;
        }
        if poll.link_speed_mbps.is_some() {
            self.link.link_speed_mbps = poll.link_speed_mbps;
        }
        if poll.frequency_mhz.is_some() {
            self.link.frequency_mhz = poll.frequency_mhz;
        }
    }

    // Brackets the current RSSI between the nearest configured thresholds so
    // the firmware wakes us only when a boundary is crossed.
    fn restart_rssi_monitor(&mut self) {
        let thresholds = &self.policy.rssi_thresholds;
        let Some(rssi) = self.link.rssi else {
            return;
        };
        if thresholds.is_empty() {
            return;
        }
        let max = thresholds.iter().copied().find(|t| *t > rssi);
        let min = thresholds.iter().rev().copied().find(|t| *t <= rssi);
        let radio = &self.services.radio;
        radio.stop_rssi_monitoring();
        radio.start_rssi_monitoring(rssi_bound(max, i8::MAX), rssi_bound(min, i8::MIN));
    }

    pub(super) fn begin_l2_link(&mut self, context: &mut DispatchContext) {
        if let Some(id) = self.link.network_id {
            // Pins from a roam or auto-connect must not outlive the association.
            self.services.radio.set_bssid(id, None);
        }
        self.publish_detailed(DetailedState::Connecting);
        self.refresh_signal();
        self.restart_rssi_monitor();
        let interval = self.policy.rssi_poll_interval_ms;
        self.arm(context, WatchdogClass::RssiPoll, interval);
    }

    // The only place a link is torn down; every path out of L2Connected ends here.
    pub(super) fn tear_down_link(&mut self) {
        let network_id = self.link.network_id;
        self.services.ip.stop();
        self.services.radio.stop_rssi_monitoring();
        self.watchdogs.invalidate(WatchdogClass::RssiPoll);
        self.watchdogs.invalidate(WatchdogClass::Debounce);
        self.link.reset();
        self.driver_roam_started_ms = None;
        self.teardowns = self.teardowns.wrapping_add(1);
        self.services
            .observer
            .network_state_changed(DetailedState::Disconnected, &self.link);
        match network_id {
            Some(id) => info!("station: link to network {id} torn down"),
            None => info!("station: link torn down"),
        }
    }

    pub(super) fn start_provisioning(&mut self, context: &mut DispatchContext) {
        self.publish_detailed(DetailedState::ObtainingIpAddr);
        match self.link.network_id {
            Some(network_id) => {
                let request = match self
                    .services
                    .store
                    .network(network_id)
                    .and_then(|config| config.static_ip)
                {
                    Some(ip) => ProvisioningRequest::Static(ip),
                    None => ProvisioningRequest::Dhcp { network_id },
                };
                self.services.ip.start(request);
            }
            None => warn!("station: associated without a network id, waiting out ip timeout"),
        }
        let timeout = self.policy.obtaining_ip_timeout_for(self.ip_timeout_streak);
        self.arm(context, WatchdogClass::ObtainingIp, timeout);
    }

    pub(super) fn obtaining_ip_timed_out(&mut self) {
        self.ip_timeout_streak = self.ip_timeout_streak.saturating_add(1);
        warn!(
            "station: no ip configuration in time (streak {})",
            self.ip_timeout_streak
        );
        if let Some(id) = self.link.network_id {
            self.services.store.note_ip_failure(id);
        }
        self.services.radio.disconnect();
    }

    pub(super) fn apply_ip_configuration(&mut self, ip: &IpConfiguration) {
        debug!("station: ip {}/{}", ip.address, ip.prefix_len);
        self.link.ip = Some(ip.clone());
        self.services.observer.link_properties_changed(ip);
    }

    pub(super) fn commit_link(&mut self) {
        self.user_disconnect_pending = false;
        self.attempt = None;
        self.roam_target = None;
        self.roam_associated = false;
        self.publish_detailed(DetailedState::Connected);
        if let Some(id) = self.link.network_id {
            self.services.store.note_connected(id, self.link.bssid);
        }
        self.services.store.enable_all_networks();
    }

    pub(super) fn l2_provisioning(&mut self, event: &IpEvent) -> Outcome<State> {
        match event {
            IpEvent::PreDhcpAction => {
                self.services.radio.set_bluetooth_coexistence(true);
                self.services.radio.set_power_save(false);
                self.services.ip.complete_pre_dhcp_action();
                Handled
            }
            IpEvent::PostDhcpAction => {
                self.services.radio.set_power_save(self.power_save);
                self.services.radio.set_bluetooth_coexistence(false);
                Handled
            }
            IpEvent::ProvisioningSuccess(ip) | IpEvent::LinkPropertiesChanged(ip) => {
                self.apply_ip_configuration(ip);
                Handled
            }
            IpEvent::ProvisioningFailure => {
                warn!("station: ip provisioning failed");
                if let Some(id) = self.link.network_id {
                    self.services.store.note_ip_failure(id);
                }
                self.services.radio.disconnect();
                Transition(State::disconnecting())
            }
            IpEvent::ReachabilityLost => {
                if self.policy.disconnect_on_reachability_loss {
                    warn!("station: gateway unreachable, disconnecting");
                    self.services.radio.disconnect();
                    Transition(State::disconnecting())
                } else {
                    Handled
                }
            }
            IpEvent::InstallPacketFilter(program) => {
                self.services.radio.install_packet_filter(program);
                Handled
            }
        }
    }

    fn clear_debounce(&mut self) {
        if self.link.debouncing {
            info!("station: link restored within debounce window");
            self.link.debouncing = false;
            self.watchdogs.invalidate(WatchdogClass::Debounce);
        }
    }

    pub(super) fn l2_notification(
        &mut self,
        context: &mut DispatchContext,
        notification: &Notification,
    ) -> Outcome<State> {
        match notification {
            Notification::NetworkConnected { network_id, bssid } => {
                if self.link.network_id != Some(*network_id) {
                    // Leave the old link first; the replay brings up the new one.
                    info!("station: lower layer switched to network {network_id}");
                    context.hold(&StationEvent::Supplicant(notification.clone()));
                    return Transition(State::disconnected());
                }
                self.clear_debounce();
                self.link.bssid = Some(*bssid);
                self.refresh_signal();
                Handled
            }
            Notification::SupplicantStateChanged { state, .. } => {
                self.note_l2_state(*state);
                if state.is_connecting() {
                    self.driver_roam_started_ms = Some(context.now_ms);
                }
                if *state == SupplicantState::Completed {
                    self.clear_debounce();
                }
                Handled
            }
            Notification::NetworkDisconnected { reason, .. } => {
                info!("station: link lost (reason {})", reason.0);
                Transition(State::disconnected())
            }
            Notification::RssiThresholdBreach { rssi } => {
                self.link.rssi = Some(i32::from(*rssi));
                self.restart_rssi_monitor();
                Handled
            }
            _ => Super,
        }
    }

    pub(super) fn connected_link_lost(
        &mut self,
        context: &mut DispatchContext,
        bssid: Option<Bssid>,
        reason: DisconnectReason,
    ) -> Outcome<State> {
        if self.link.debouncing {
            debug!("station: repeated disconnect while debouncing");
            return Handled;
        }

        let network_id = self.link.network_id;
        let store = &self.services.store;
        let input = DebounceInput {
            screen_on: self.screen_on,
            already_debouncing: self.link.debouncing,
            user_disconnect_pending: self.user_disconnect_pending,
            network_enabled: network_id.is_some_and(|id| store.is_network_enabled(id)),
            last_user_selected: network_id.is_some() && store.last_selected() == network_id,
            reason,
            driver_roam_elapsed_ms: self
                .driver_roam_started_ms
                .map(|at| context.now_ms.saturating_sub(at)),
            rssi: self.link.rssi,
            frequency_mhz: self.link.frequency_mhz,
        };

        if !should_debounce(&input, &self.policy) {
            info!(
                "station: disconnected from {} (reason {})",
                bssid.map_or_else(|| String::from("any"), |b| b.to_string()),
                reason.0
            );
            return Transition(State::disconnected());
        }

        info!("station: debouncing disconnect (reason {})", reason.0);
        let channels = network_id
            .map(|id| self.services.store.known_channels(id))
            .unwrap_or_default();
        self.services.radio.scan(Some(&channels));
        self.link.debouncing = true;
        let delay = self.policy.debounce_ms;
        self.arm(context, WatchdogClass::Debounce, delay);
        Handled
    }

    pub(super) fn network_unwanted(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        reason: UnwantedReason,
    ) -> Outcome<State> {
        context.done(request);
        match reason {
            UnwantedReason::Explicit => {
                warn!("station: network declared unwanted, disconnecting");
                self.services.radio.disconnect();
                Transition(State::disconnecting())
            }
            UnwantedReason::ValidationFailed => {
                if let Some(id) = self.link.network_id {
                    self.services.store.note_no_internet(id);
                }
                Handled
            }
        }
    }

    pub(super) fn auto_roam(
        &mut self,
        context: &mut DispatchContext,
        request: &Request,
        network_id: NetworkId,
        bssid: Bssid,
    ) -> Outcome<State> {
        if self.link.network_id != Some(network_id) {
            return self.auto_connect(context, request, network_id, Some(bssid));
        }
        if self.link.bssid == Some(bssid) {
            context.done(request);
            return Handled;
        }

        let radio = &self.services.radio;
        if !(radio.set_bssid(network_id, Some(bssid)) && radio.reassociate()) {
            context.fail(request, CommandError::PrimitiveFailed("reassociate"));
            return Handled;
        }

        info!("station: roaming to {bssid}");
        self.attempt = Some(ConnectionAttempt {
            network_id,
            bssid: Some(bssid),
            started_at_ms: context.now_ms,
            kind: AttemptKind::Roam,
        });
        self.last_connect_attempt_ms = Some(context.now_ms);
        self.roam_target = Some(bssid);
        context.done(request);
        Transition(State::roaming())
    }

    pub(super) fn roaming_notification(&mut self, notification: &Notification) -> Outcome<State> {
        match notification {
            Notification::SupplicantStateChanged { state, bssid, .. } => {
                self.note_l2_state(*state);
                if *state == SupplicantState::Associated {
                    self.roam_associated = true;
                    if bssid.is_some() {
                        self.roam_target = *bssid;
                    }
                    Handled
                } else if state.is_link_down() {
                    warn!("station: link went down during roam");
                    Transition(State::disconnected())
                } else {
                    Handled
                }
            }
            Notification::NetworkConnected { network_id, bssid } => {
                if !self.roam_associated {
                    debug!("station: connect event before association, ignored");
                    return Handled;
                }
                info!("station: roam to {bssid} complete");
                self.link.network_id = Some(*network_id);
                self.link.bssid = Some(*bssid);
                self.refresh_signal();
                Transition(State::connected())
            }
            Notification::NetworkDisconnected { bssid, .. } => {
                let expected = bssid.is_none()
                    || *bssid == self.roam_target
                    || *bssid == self.link.bssid;
                if expected {
                    Transition(State::disconnected())
                } else {
                    debug!("station: disconnect from {bssid:?} is not the roam, ignored");
                    Handled
                }
            }
            Notification::AuthenticationFailed => {
                warn!("station: authentication failed during roam");
                if let Some(id) = self.link.network_id {
                    self.services.store.note_authentication_failure(id);
                }
                Transition(State::disconnected())
            }
            _ => Super,
        }
    }
}
