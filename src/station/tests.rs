use super::*;

use crate::config::StationPolicy;
use crate::error::CommandError;
use crate::testing::{Harness, AP_A, HOME, OFFICE};
use crate::types::{
    ApConfig, ApFailureReason, ApState, Band, CallerIdentity, KeyManagement, NetworkConfig,
    NetworkId, OperationalMode, RequestId, Ssid, WifiState, WpsInfo, WpsSetup,
};

fn booted() -> Harness {
    let mut h = Harness::new();
    h.boot();
    assert_eq!(h.state(), StateId::Disconnected);
    h
}

fn lab_ap() -> ApConfig {
    let mut ssid = Ssid::new();
    ssid.push_str("lab-ap").unwrap();
    ApConfig {
        ssid,
        psk: None,
        band: Band::TwoPointFourGhz,
        channel: 6,
    }
}

fn wps(setup: WpsSetup) -> Command {
    Command::StartWps(WpsInfo { setup, bssid: None })
}

fn request(id: u32, command: Command) -> StationEvent {
    StationEvent::Command(Request {
        id: RequestId(id),
        caller: CallerIdentity::SYSTEM,
        command,
    })
}

#[test]
fn boot_reaches_disconnected_and_configures_driver() {
    let h = booted();

    assert_eq!(h.observer.wifi(), vec![WifiState::Enabling, WifiState::Enabled]);
    assert_eq!(h.observer.view().helpers_registered, 1);
    assert_eq!(h.observer.view().supplicant_connection, vec![true]);
    assert_eq!(h.store.state.lock().unwrap().loads, 1);

    let calls = h.radio.calls();
    let position = |call: &str| calls.iter().position(|c| c == call);
    assert!(position("load_driver") < position("start_supplicant"));
    assert!(position("start_supplicant") < position("SCAN_INTERVAL 15"));
    assert!(position("SET update_config 1").is_some());
    assert!(position("DRIVER SETBAND 0").is_some());
    assert!(position("RECONNECT").is_some());
    assert!(h.engine.trace().is_balanced_for(StateId::Disconnected));
}

#[test]
fn start_supplicant_reply_is_done() {
    let mut h = Harness::new();
    let id = h.submit(Command::StartSupplicant);
    assert_eq!(h.outcome(id), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::SupplicantStarting);
}

#[test]
fn supplicant_launch_failure_stays_initial() {
    let mut h = Harness::new();
    h.radio.fail("start_supplicant");

    let id = h.submit(Command::StartSupplicant);

    assert_eq!(
        h.outcome(id),
        Some(Err(CommandError::PrimitiveFailed("start_supplicant")))
    );
    assert_eq!(h.state(), StateId::Initial);
    assert_eq!(h.observer.wifi(), vec![WifiState::Unknown]);
}

#[test]
fn supplicant_restarts_are_bounded() {
    let mut h = Harness::new();
    h.submit(Command::StartSupplicant);

    for _ in 0..5 {
        h.notify(Notification::SupplicantDisconnected);
        assert_eq!(h.state(), StateId::Initial);
        h.advance(5_000);
        assert_eq!(h.state(), StateId::SupplicantStarting);
    }
    h.notify(Notification::SupplicantDisconnected);
    h.advance(60_000);

    assert_eq!(h.state(), StateId::Initial);
    assert_eq!(h.radio.count("start_supplicant"), 6);
    assert_eq!(h.observer.wifi().last(), Some(&WifiState::Unknown));
    assert_eq!(h.engine.next_deadline(), None);
}

#[test]
fn stop_supplicant_in_initial_cancels_pending_restart() {
    let mut h = Harness::new();
    h.submit(Command::StartSupplicant);
    h.notify(Notification::SupplicantDisconnected);

    let id = h.submit(Command::StopSupplicant);
    h.advance(5_000);

    assert_eq!(h.outcome(id), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::Initial);
    assert_eq!(h.radio.count("start_supplicant"), 1);
}

#[test]
fn supplicant_crash_tears_down_link_once_and_restarts() {
    let mut h = booted();
    h.connect(HOME, AP_A);
    assert_eq!(h.state(), StateId::Connected);

    h.notify(Notification::SupplicantDisconnected);
    assert_eq!(h.state(), StateId::Initial);
    assert_eq!(h.engine.teardowns(), 1);
    assert_eq!(h.observer.view().supplicant_connection, vec![true, false]);

    h.advance(5_000);
    assert_eq!(h.state(), StateId::SupplicantStarting);
    assert!(h.engine.trace().is_balanced_for(StateId::SupplicantStarting));
}

#[test]
fn stop_supplicant_terminates_and_waits_for_exit() {
    let mut h = booted();

    let id = h.submit(Command::StopSupplicant);
    assert_eq!(h.outcome(id), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::SupplicantStopping);
    assert_eq!(h.radio.count("TERMINATE"), 1);

    h.notify(Notification::SupplicantDisconnected);
    assert_eq!(h.state(), StateId::Initial);
    assert_eq!(
        h.observer.wifi()[2..],
        [WifiState::Disabling, WifiState::Disabled]
    );
}

#[test]
fn supplicant_ignoring_terminate_is_killed_after_timeout() {
    let mut h = booted();
    h.submit(Command::StopSupplicant);
    h.radio.clear();

    h.advance(5_000);

    assert_eq!(h.state(), StateId::Initial);
    assert_eq!(h.radio.count("kill_supplicant"), 1);
    assert_eq!(h.observer.wifi().last(), Some(&WifiState::Disabled));
}

#[test]
fn stop_then_start_driver_defers_until_driver_reports() {
    let mut h = booted();

    h.submit(Command::StopDriver);
    assert_eq!(h.state(), StateId::DriverStopping);
    assert_eq!(h.radio.count("DRIVER STOP"), 1);

    // Held while stopping, then refused once the driver is down.
    let early_scan = h.submit(Command::StartScan);
    assert_eq!(h.outcome(early_scan), None);

    h.notify(Notification::DriverStateChanged { active: false });
    assert_eq!(h.state(), StateId::DriverStopped);
    assert_eq!(
        h.outcome(early_scan),
        Some(Err(CommandError::NotInState(StateId::DriverStopped)))
    );

    let start = h.submit(Command::StartDriver);
    assert_eq!(h.outcome(start), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::DriverStarting);

    let scan = h.submit(Command::StartScan);
    let power = h.submit(Command::SetPowerSave(false));
    assert_eq!(h.engine.deferred(), 2);

    h.notify(Notification::DriverStateChanged { active: true });

    assert_eq!(h.state(), StateId::Disconnected);
    assert_eq!(h.engine.deferred(), 0);
    let order: Vec<RequestId> = h.replies.iter().map(|reply| reply.id).collect();
    let at = |id: RequestId| order.iter().position(|seen| *seen == id);
    assert!(at(scan) < at(power));
    assert_eq!(h.outcome(power), Some(Ok(ReplyValue::Done)));
}

#[test]
fn driver_start_watchdog_retries_then_restarts_supplicant() {
    let mut h = booted();
    h.submit(Command::StopDriver);
    h.notify(Notification::DriverStateChanged { active: false });
    h.submit(Command::StartDriver);
    assert_eq!(h.radio.count("DRIVER START"), 1);

    h.advance(10_000);
    assert_eq!(h.state(), StateId::DriverStarting);
    assert_eq!(h.radio.count("DRIVER START"), 2);

    h.advance(10_000);
    assert_eq!(h.state(), StateId::SupplicantStopping);
    assert_eq!(h.radio.count("TERMINATE"), 1);

    h.notify(Notification::SupplicantDisconnected);
    assert_eq!(h.state(), StateId::SupplicantStarting);
}

#[test]
fn driver_start_watchdog_is_stale_once_driver_is_up() {
    let mut h = booted();
    h.submit(Command::StopDriver);
    h.notify(Notification::DriverStateChanged { active: false });
    h.submit(Command::StartDriver);
    h.notify(Notification::SupplicantStateChanged {
        state: crate::types::SupplicantState::Disconnected,
        bssid: None,
        network_id: None,
    });
    assert_eq!(h.state(), StateId::Disconnected);

    h.advance(30_000);

    assert_eq!(h.state(), StateId::Disconnected);
    assert_eq!(h.radio.count("DRIVER START"), 1);
}

#[test]
fn driver_hung_restarts_supplicant() {
    let mut h = booted();

    h.notify(Notification::DriverHung);
    assert_eq!(h.state(), StateId::SupplicantStopping);

    h.notify(Notification::SupplicantDisconnected);
    assert_eq!(h.state(), StateId::SupplicantStarting);
    assert_eq!(h.radio.count("start_supplicant"), 2);
}

#[test]
fn lifecycle_commands_wait_out_supplicant_start() {
    let mut h = Harness::new();
    h.submit(Command::StartSupplicant);

    let disposition = h
        .engine
        .dispatch(request(40, Command::SetCountryCode("de".into())));
    assert_eq!(disposition, Disposition::Deferred);

    h.notify(Notification::SupplicantConnected);

    assert_eq!(h.outcome(RequestId(40)), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.radio.count("DRIVER COUNTRY DE"), 1);
    assert_eq!(h.engine.snapshot().state, StateId::Disconnected);
}

#[test]
fn command_outside_its_state_is_rejected() {
    let mut h = Harness::new();

    let disposition = h.engine.dispatch(request(77, Command::Disconnect));

    assert_eq!(disposition, Disposition::Unhandled);
    let replies = h.engine.take_replies();
    assert_eq!(
        replies,
        vec![Reply {
            id: RequestId(77),
            outcome: Err(CommandError::NotInState(StateId::Initial)),
        }]
    );
}

#[test]
fn internal_requests_get_no_reply() {
    let mut h = booted();
    h.engine
        .post(StationEvent::internal(Command::SetHighPerfMode(true)));
    h.engine.run_until_idle();
    assert!(h.engine.take_replies().is_empty());
}

#[test]
fn radio_off_scan_mode_round_trip() {
    let mut h = booted();

    let id = h.submit(Command::SetOperationalMode(OperationalMode::ScanOnlyRadioOff));
    assert_eq!(h.outcome(id), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::ScanMode);
    assert_eq!(h.observer.wifi().last(), Some(&WifiState::Disabled));
    assert_eq!(h.store.state.lock().unwrap().disable_all, 1);

    h.submit(Command::SetOperationalMode(OperationalMode::Connect));
    assert_eq!(h.state(), StateId::Disconnected);
    assert_eq!(h.observer.wifi().last(), Some(&WifiState::Enabled));
    assert!(h.store.state.lock().unwrap().disabled.is_empty());
}

#[test]
fn scan_mode_leaving_a_link_waits_for_disconnect() {
    let mut h = booted();
    h.connect(HOME, AP_A);

    let id = h.submit(Command::SetOperationalMode(OperationalMode::ScanOnly));
    assert_eq!(h.state(), StateId::Disconnecting);
    assert_eq!(h.outcome(id), None);

    h.drop_link(3);

    assert_eq!(h.state(), StateId::ScanMode);
    assert_eq!(h.outcomes(id), vec![Ok(ReplyValue::Done)]);
    assert_eq!(h.engine.teardowns(), 1);
}

#[test]
fn scan_right_after_connect_is_postponed() {
    let mut h = booted();
    h.submit(Command::Connect(ConnectTarget::Saved(HOME)));

    let scan = h.submit(Command::StartScan);
    assert_eq!(h.outcome(scan), None);
    assert_eq!(h.radio.count("SCAN TYPE=ONLY"), 0);

    h.advance(10_999);
    assert_eq!(h.outcome(scan), None);

    h.advance(1);
    assert_eq!(h.outcome(scan), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.radio.count("SCAN TYPE=ONLY"), 1);
}

#[test]
fn scan_without_recent_attempt_runs_at_once() {
    let mut h = booted();
    let scan = h.submit(Command::StartScan);
    assert_eq!(h.outcome(scan), Some(Ok(ReplyValue::Done)));
    h.notify(Notification::ScanResultsReady);
    assert_eq!(h.observer.view().scan_results, vec![true]);
}

#[test]
fn connect_to_saved_network_selects_and_reconnects() {
    let mut h = booted();
    h.radio.clear();

    let id = h.submit(Command::Connect(ConnectTarget::Saved(HOME)));

    assert_eq!(h.outcome(id), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.radio.calls(), vec!["SELECT_NETWORK 1", "RECONNECT"]);
    assert_eq!(h.store.last_selected_id(), Some(HOME));
    let attempt = h.engine.snapshot().attempt.unwrap();
    assert_eq!(attempt.network_id, HOME);
    assert_eq!(attempt.kind, AttemptKind::Fresh);
}

#[test]
fn connect_rejects_unknown_and_incomplete_networks() {
    let mut h = booted();

    let unknown = h.submit(Command::Connect(ConnectTarget::Saved(NetworkId(99))));
    let no_ssid = h.submit(Command::Connect(ConnectTarget::New(NetworkConfig::default())));
    let no_psk = h.submit(Command::Connect(ConnectTarget::New(NetworkConfig {
        key_mgmt: KeyManagement::WpaPsk,
        ..NetworkConfig::open("cafe").unwrap()
    })));

    assert_eq!(h.outcome(unknown), Some(Err(CommandError::InvalidNetwork)));
    assert_eq!(h.outcome(no_ssid), Some(Err(CommandError::MissingConfig)));
    assert_eq!(h.outcome(no_psk), Some(Err(CommandError::EmptyCredential)));
    assert_eq!(h.engine.snapshot().attempt, None);
}

#[test]
fn switching_networks_leaves_the_current_link_first() {
    let mut h = booted();
    h.connect(HOME, AP_A);

    h.submit(Command::Connect(ConnectTarget::Saved(OFFICE)));

    assert_eq!(h.state(), StateId::Disconnecting);
    assert_eq!(h.engine.teardowns(), 1);
    assert_eq!(h.engine.snapshot().attempt.unwrap().network_id, OFFICE);
}

#[test]
fn connect_to_current_network_is_a_no_op() {
    let mut h = booted();
    h.connect(HOME, AP_A);
    h.radio.clear();

    let id = h.submit(Command::Connect(ConnectTarget::Saved(HOME)));

    assert_eq!(h.outcome(id), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::Connected);
    assert!(h.radio.calls().is_empty());
}

#[test]
fn save_requires_foreground_user_or_trusted_uid() {
    let mut h = booted();
    h.submit(Command::SetForegroundUser(10));
    let config = NetworkConfig::wpa_psk("guest", "letmein!").unwrap();

    let background = h.submit_as(
        CallerIdentity::from_uid(10_050),
        Command::Save(config.clone()),
    );
    let foreground = h.submit_as(
        CallerIdentity::from_uid(1_010_050),
        Command::Save(config.clone()),
    );
    let system = h.submit(Command::Save(config));

    assert_eq!(h.outcome(background), Some(Err(CommandError::NotAuthorized)));
    assert_eq!(h.outcome(foreground), Some(Ok(ReplyValue::Saved(NetworkId(11)))));
    assert_eq!(h.outcome(system), Some(Ok(ReplyValue::Saved(NetworkId(12)))));
}

#[test]
fn forget_current_network_disconnects() {
    let mut h = booted();
    h.submit(Command::Connect(ConnectTarget::Saved(HOME)));
    h.connect(HOME, AP_A);

    let id = h.submit(Command::Forget(HOME));

    assert_eq!(h.outcome(id), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::Disconnecting);
    assert!(!h.store.contains(HOME));
    assert_eq!(h.store.last_selected_id(), None);
}

#[test]
fn enable_and_disable_network() {
    let mut h = booted();

    let disable = h.submit(Command::DisableNetwork(OFFICE));
    assert_eq!(h.outcome(disable), Some(Ok(ReplyValue::Done)));
    assert!(h.store.is_disabled(OFFICE));
    assert_eq!(h.radio.count("DISABLE_NETWORK 2"), 1);

    let enable = h.submit(Command::EnableNetwork {
        id: OFFICE,
        exclusive: true,
    });
    assert_eq!(h.outcome(enable), Some(Ok(ReplyValue::Done)));
    assert!(!h.store.is_disabled(OFFICE));
    assert!(h.store.is_disabled(HOME));
    assert_eq!(h.radio.count("SELECT_NETWORK 2"), 1);

    let missing = h.submit(Command::DisableNetwork(NetworkId(42)));
    assert_eq!(h.outcome(missing), Some(Err(CommandError::InvalidNetwork)));
}

#[test]
fn disconnect_while_idle_stays_disconnected() {
    let mut h = booted();
    h.submit(Command::Connect(ConnectTarget::Saved(HOME)));

    let id = h.submit(Command::Disconnect);

    assert_eq!(h.outcome(id), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::Disconnected);
    assert_eq!(h.engine.snapshot().attempt, None);
}

#[test]
fn sim_requests_are_answered() {
    let mut h = booted();
    h.notify(Notification::SimIdentityRequest { network_id: HOME });
    h.notify(Notification::SimAuthRequest(crate::types::SimAuthRequest {
        network_id: HOME,
        kind: crate::types::SimAuthKind::Gsm,
        challenges: vec!["00112233".into()],
    }));

    assert_eq!(
        h.radio.count("CTRL-RSP-IDENTITY-1:1001010123456789@wlan.1"),
        1
    );
    assert_eq!(h.radio.count("CTRL-RSP-SIM-1:GSM-AUTH:kc:sres"), 1);
}

#[test]
fn wps_pin_session_completes_and_replays_held_work() {
    let mut h = booted();

    let id = h.submit(wps(WpsSetup::PinFromDevice));
    assert_eq!(
        h.outcomes(id),
        vec![Ok(ReplyValue::WpsStarted {
            pin: Some("12345670".into())
        })]
    );
    assert_eq!(h.state(), StateId::WpsRunning);

    let again = h.submit(wps(WpsSetup::PushButton));
    assert_eq!(h.outcome(again), Some(Err(CommandError::WpsInProgress)));

    let connect = h.submit(Command::Connect(ConnectTarget::Saved(HOME)));
    assert_eq!(h.outcome(connect), None);

    h.notify(Notification::WpsSuccess);
    assert_eq!(h.outcomes(id).last(), Some(&Ok(ReplyValue::WpsCompleted)));

    h.associate(HOME, AP_A);

    assert_eq!(h.state(), StateId::ObtainingIp);
    assert_eq!(h.outcome(connect), Some(Ok(ReplyValue::Done)));
    assert!(h.store.state.lock().unwrap().disabled.is_empty());
}

#[test]
fn wps_timeout_fails_the_session() {
    let mut h = booted();
    let id = h.submit(wps(WpsSetup::PushButton));

    h.notify(Notification::WpsTimeout);

    assert_eq!(
        h.outcomes(id),
        vec![
            Ok(ReplyValue::WpsStarted { pin: None }),
            Err(CommandError::WpsTimedOut)
        ]
    );
    assert_eq!(h.state(), StateId::Disconnected);
}

#[test]
fn wps_failure_without_code_is_ignored() {
    let mut h = booted();
    let id = h.submit(wps(WpsSetup::PushButton));

    h.notify(Notification::WpsFailed {
        config_error: 0,
        reason: 0,
    });
    assert_eq!(h.state(), StateId::WpsRunning);

    h.notify(Notification::WpsFailed {
        config_error: 0,
        reason: 18,
    });
    assert_eq!(h.outcomes(id).last(), Some(&Err(CommandError::WpsFailed(18))));
    assert_eq!(h.state(), StateId::Disconnected);
}

#[test]
fn cancel_wps_answers_both_requests() {
    let mut h = booted();
    let id = h.submit(wps(WpsSetup::PushButton));

    let cancel = h.submit(Command::CancelWps);

    assert_eq!(h.outcome(cancel), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.outcomes(id).last(), Some(&Err(CommandError::WpsCancelled)));
    assert_eq!(h.radio.count("WPS_CANCEL"), 1);
    assert_eq!(h.state(), StateId::Disconnected);
}

#[test]
fn wps_start_failure_restores_networks() {
    let mut h = booted();
    h.radio.fail("WPS_PBC");

    let id = h.submit(wps(WpsSetup::PushButton));

    assert_eq!(
        h.outcome(id),
        Some(Err(CommandError::PrimitiveFailed("wps_pbc")))
    );
    assert_eq!(h.state(), StateId::Disconnected);
    assert!(h.store.state.lock().unwrap().disabled.is_empty());
}

#[test]
fn soft_ap_start_stop_replays_deferred_supplicant_start() {
    let mut h = Harness::new();

    let ap = h.submit(Command::StartAp(lab_ap()));
    assert_eq!(h.outcome(ap), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::SoftAp);

    let sta = h.submit(Command::StartSupplicant);
    assert_eq!(h.outcome(sta), None);

    let stop = h.submit(Command::StopAp);
    assert_eq!(h.outcome(stop), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.outcome(sta), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::SupplicantStarting);
    assert_eq!(
        h.observer.ap(),
        vec![
            ApState::Enabling,
            ApState::Enabled,
            ApState::Disabling,
            ApState::Disabled
        ]
    );
}

#[test]
fn soft_ap_failure_returns_to_initial() {
    let mut h = Harness::new();
    h.submit(Command::StartAp(lab_ap()));

    h.notify(Notification::SoftApFailed(ApFailureReason::NoChannel));

    assert_eq!(h.state(), StateId::Initial);
    assert_eq!(
        h.observer.ap().last(),
        Some(&ApState::Failed(ApFailureReason::NoChannel))
    );
    assert_eq!(h.radio.count("stop_soft_ap"), 1);
}

#[test]
fn stop_waits_for_p2p_to_release_interface() {
    let mut h = booted();
    h.notify(Notification::P2pStateChanged { enabled: true });

    let stop = h.submit(Command::StopSupplicant);
    assert_eq!(h.outcome(stop), Some(Ok(ReplyValue::Done)));
    assert_eq!(h.state(), StateId::WaitForP2pDisable);
    assert_eq!(h.observer.view().p2p_disable_requests, 1);

    let scan = h.submit(Command::StartScan);
    assert_eq!(h.outcome(scan), None);

    h.notify(Notification::P2pDisabled);

    assert_eq!(h.state(), StateId::SupplicantStopping);
    assert_eq!(
        h.outcome(scan),
        Some(Err(CommandError::NotInState(StateId::SupplicantStopping)))
    );
}

#[test]
fn p2p_that_never_answers_is_given_up_on() {
    let mut h = booted();
    h.notify(Notification::P2pStateChanged { enabled: true });
    h.submit(Command::StopSupplicant);
    let scan = h.submit(Command::StartScan);

    h.advance(4_999);
    assert_eq!(h.state(), StateId::WaitForP2pDisable);
    assert_eq!(h.outcome(scan), None);

    h.advance(1);
    assert_eq!(h.state(), StateId::SupplicantStopping);
    assert_eq!(
        h.outcome(scan),
        Some(Err(CommandError::NotInState(StateId::SupplicantStopping)))
    );
    assert!(h.engine.trace().is_balanced_for(StateId::WaitForP2pDisable));
}

#[test]
fn supplicant_crash_behind_p2p_still_restarts() {
    let mut h = Harness::with_policy(StationPolicy {
        p2p_disable_timeout_ms: 20_000,
        ..StationPolicy::defaults()
    });
    h.boot();
    h.notify(Notification::P2pStateChanged { enabled: true });

    h.notify(Notification::SupplicantDisconnected);
    assert_eq!(h.state(), StateId::WaitForP2pDisable);

    // The restart backoff runs out while p2p still holds the interface.
    h.advance(6_000);
    assert_eq!(h.state(), StateId::WaitForP2pDisable);
    assert_eq!(h.radio.count("start_supplicant"), 1);

    h.notify(Notification::P2pDisabled);
    assert_eq!(h.state(), StateId::SupplicantStarting);
    assert_eq!(h.radio.count("start_supplicant"), 2);

    h.advance(60_000);
    assert_eq!(h.radio.count("start_supplicant"), 2);
}

#[test]
fn screen_off_in_disconnected_hands_scanning_to_firmware() {
    let mut h = booted();

    h.submit(Command::SetScreenState(false));
    assert_eq!(h.radio.count("hal_start_scan_offload"), 1);
    assert_eq!(h.radio.count("DRIVER SETSUSPENDMODE 1"), 1);

    h.submit(Command::SetScreenState(true));
    assert_eq!(h.radio.count("hal_stop_scan_offload"), 1);
}

#[test]
fn transitions_keep_entry_and_exit_balanced() {
    let mut h = booted();
    h.connect(HOME, AP_A);
    h.submit(Command::Disconnect);
    h.drop_link(3);
    h.submit(Command::StopDriver);
    h.notify(Notification::DriverStateChanged { active: false });
    h.submit(Command::StartDriver);
    h.notify(Notification::DriverStateChanged { active: true });
    h.submit(Command::StopSupplicant);
    h.notify(Notification::SupplicantDisconnected);

    let trace = h.engine.trace();
    assert_eq!(h.state(), StateId::Initial);
    assert!(trace.is_balanced_for(StateId::Initial));
    assert_eq!(trace.entries(StateId::L2Connected), 1);
    assert_eq!(trace.exits(StateId::L2Connected), 1);
    assert_eq!(h.engine.teardowns(), 1);
}

#[test]
fn snapshot_tracks_state_and_policy_clamps_apply() {
    let policy = StationPolicy {
        supplicant_restart_max: 0,
        ..StationPolicy::defaults()
    };
    let mut h = Harness::with_policy(policy);
    h.submit(Command::StartSupplicant);
    h.notify(Notification::SupplicantDisconnected);

    // Clamped to a single restart.
    h.advance(5_000);
    assert_eq!(h.state(), StateId::SupplicantStarting);
    h.notify(Notification::SupplicantDisconnected);
    h.advance(5_000);

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.state, StateId::Initial);
    assert_eq!(snapshot.wifi_state, WifiState::Unknown);
    assert!(!snapshot.is_connected());
    assert_eq!(snapshot.at_ms, 10_000);
}
