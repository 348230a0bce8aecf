//! Integration tests for the agent lifecycle against the simulated wearable.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use synheart_wear_agent::{
    sensor::{GroupListener, ListenerState},
    simulated::{DeviceProfile, PromptMode, SimulatedDevice, SimulatedPrivacy},
    transparency::{create_shared_log, SharedTransparencyLog},
    Config, ConsentOutcome, ConsentState, GroupId, PrivacyScope, SensorAgent, SensorType,
    UsabilityResult,
};

struct Harness {
    agent: SensorAgent,
    device: Arc<SimulatedDevice>,
    privacy: Arc<SimulatedPrivacy>,
    log: SharedTransparencyLog,
}

fn harness_with(profile: DeviceProfile, mode: PromptMode) -> Harness {
    let device = Arc::new(SimulatedDevice::new(profile.clone()));
    let privacy = Arc::new(SimulatedPrivacy::new(&profile, mode));
    let log = create_shared_log();
    let agent = SensorAgent::new(
        device.clone(),
        privacy.clone(),
        &Config::default(),
        log.clone(),
    )
    .expect("Failed to start agent");

    Harness {
        agent,
        device,
        privacy,
        log,
    }
}

fn harness(profile: DeviceProfile) -> Harness {
    harness_with(profile, PromptMode::Manual)
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_second_activation_does_no_work() {
    let h = harness(DeviceProfile::all_allowed());

    let first = h.agent.on_activated();
    assert!(first.all());
    for group in GroupId::ALL {
        assert!(h.agent.orchestrator().is_launched(group));
    }
    let before = h.device.stats();

    let second = h.agent.on_activated();

    let after = h.device.stats();
    assert!(second.all());
    assert_eq!(after.opens, before.opens);
    assert_eq!(after.listener_creates, before.listener_creates);
    assert_eq!(after.listener_starts, before.listener_starts);
}

#[test]
fn test_undetermined_scope_is_requested_once_per_cycle() {
    let profile =
        DeviceProfile::default().with_consent(PrivacyScope::Storage, ConsentState::Allowed);
    let h = harness(profile);

    let result = h.agent.on_activated();
    assert!(!result.vital);
    assert!(result.motion);
    assert!(result.ambient);
    assert_eq!(h.privacy.request_count(PrivacyScope::Vital), 1);
    assert_eq!(h.privacy.request_count(PrivacyScope::Storage), 0);
    // motion and ambient only
    assert_eq!(h.device.stats().opens, 9);

    // the prompt is still showing; the repeated request is benign
    let result = h.agent.on_activated();
    assert!(!result.vital);
    assert_eq!(h.privacy.request_count(PrivacyScope::Vital), 2);
    assert_eq!(h.log.stats().consent_prompts, 1);
    assert_eq!(
        h.agent.orchestrator().listener_state(GroupId::Vital),
        ListenerState::Uninitialized
    );

    assert!(h
        .privacy
        .respond(PrivacyScope::Vital, ConsentOutcome::AllowedForever));

    assert!(h.agent.orchestrator().is_launched(GroupId::Vital));
    assert!(h.agent.usability().all());
    assert_eq!(h.device.stats().opens, 11);
}

#[test]
fn test_storage_grant_with_gyroscope_failure() {
    let profile = DeviceProfile::default()
        .with_consent(PrivacyScope::Vital, ConsentState::Allowed)
        .with_open_failure(SensorType::Gyroscope);
    let h = harness(profile);

    h.agent.on_activated();
    assert_eq!(h.device.stats().opens, 2);

    h.privacy
        .respond(PrivacyScope::Storage, ConsentOutcome::AllowedForever);

    // every motion sensor was attempted despite the gyroscope failing
    assert_eq!(h.device.stats().opens, 11);
    let usability = h.agent.usability();
    assert!(usability.vital);
    assert!(!usability.motion);
    assert!(usability.ambient);
    assert!(!h.agent.orchestrator().is_launched(GroupId::Motion));
    assert!(h.agent.orchestrator().is_launched(GroupId::Ambient));
    assert_eq!(
        h.agent.orchestrator().listener_state(GroupId::Motion),
        ListenerState::Uninitialized
    );
    assert_eq!(h.log.stats().acquisition_failures, 1);
}

#[test]
fn test_denied_forever_is_not_requested_again() {
    let h = harness(DeviceProfile::default());

    h.agent.on_activated();
    h.privacy
        .respond(PrivacyScope::Vital, ConsentOutcome::DeniedForever);
    h.agent.on_activated();
    h.agent.on_activated();

    assert_eq!(h.privacy.request_count(PrivacyScope::Vital), 1);
    assert!(!h.agent.orchestrator().is_launched(GroupId::Vital));
    assert!(!h.agent.usability().vital);
    assert_eq!(h.log.stats().consent_declines, 1);
}

#[test]
fn test_denied_once_is_not_requested_again_this_session() {
    let h = harness(DeviceProfile::default());

    h.agent.on_activated();
    h.privacy
        .respond(PrivacyScope::Storage, ConsentOutcome::DeniedOnce);
    // the platform still reports the scope as undetermined
    assert_eq!(
        h.privacy.consent(PrivacyScope::Storage),
        ConsentState::Undetermined
    );

    h.agent.on_activated();

    assert_eq!(h.privacy.request_count(PrivacyScope::Storage), 1);
    let usability = h.agent.usability();
    assert!(!usability.motion);
    assert!(!usability.ambient);
}

#[test]
fn test_consent_error_is_treated_as_decline() {
    let h = harness(DeviceProfile::default());

    h.agent.on_activated();
    h.privacy.respond(PrivacyScope::Vital, ConsentOutcome::Error);
    h.agent.on_activated();

    assert_eq!(h.privacy.request_count(PrivacyScope::Vital), 1);
    assert!(!h.agent.usability().vital);
}

#[test]
fn test_stop_and_destroy_on_uninitialized_listener() {
    let device = Arc::new(SimulatedDevice::initialized(DeviceProfile::default()));
    let mut listener = GroupListener::new(GroupId::Vital, device.clone());

    listener.stop();
    listener.destroy();

    assert_eq!(listener.state(), ListenerState::Uninitialized);
    let stats = device.stats();
    assert_eq!(stats.listener_stops, 0);
    assert_eq!(stats.listener_destroys, 0);
}

#[test]
fn test_missing_pressure_disables_ambient() {
    let profile = DeviceProfile::all_allowed().without_sensor(SensorType::Pressure);
    let h = harness(profile);

    let result = h.agent.on_activated();

    assert!(result.vital);
    assert!(result.motion);
    assert!(!result.ambient);
    // no ambient sensor was opened
    assert_eq!(h.device.stats().opens, 7);
    assert_eq!(
        h.agent.orchestrator().listener_state(GroupId::Ambient),
        ListenerState::Uninitialized
    );
}

#[test]
fn test_unsupported_scope_is_not_checked() {
    let profile = DeviceProfile::default()
        .with_consent(PrivacyScope::Storage, ConsentState::Allowed)
        .without_sensor(SensorType::HeartRateLed);
    let h = harness(profile);

    let result = h.agent.on_activated();

    assert!(!result.vital);
    assert_eq!(h.privacy.check_count(PrivacyScope::Vital), 0);
    assert_eq!(h.privacy.request_count(PrivacyScope::Vital), 0);
}

#[test]
fn test_callback_after_terminate_is_ignored() {
    let h = harness(DeviceProfile::default());

    h.agent.on_activated();
    h.agent.on_terminate();

    // the platform still delivers the answer
    assert!(h
        .privacy
        .respond(PrivacyScope::Vital, ConsentOutcome::AllowedForever));

    let stats = h.log.stats();
    assert_eq!(stats.consent_grants, 0);
    assert_eq!(stats.acquisitions, 0);
    assert_eq!(stats.acquisition_failures, 0);
    assert!(!h.agent.orchestrator().is_launched(GroupId::Vital));
    assert_eq!(h.agent.usability(), UsabilityResult::default());
}

#[test]
fn test_callback_after_drop_is_ignored() {
    let h = harness(DeviceProfile::default());
    h.agent.on_activated();
    let Harness {
        agent,
        privacy,
        log,
        ..
    } = h;

    drop(agent);

    assert!(privacy.respond(PrivacyScope::Storage, ConsentOutcome::AllowedForever));
    assert_eq!(log.stats().acquisitions, 0);
}

#[test]
fn test_terminate_releases_every_listener() {
    let h = harness(DeviceProfile::all_allowed());
    h.agent.on_activated();
    assert_eq!(h.device.stats().listeners_alive, 11);

    h.agent.on_terminate();

    assert_eq!(h.device.stats().listeners_alive, 0);
    for group in GroupId::ALL {
        assert_eq!(
            h.agent.orchestrator().listener_state(group),
            ListenerState::Uninitialized
        );
    }
    assert_eq!(h.agent.on_activated(), UsabilityResult::default());
}

#[test]
fn test_readings_flow_to_group_channel() {
    let h = harness(DeviceProfile::all_allowed());
    h.agent.on_activated();
    let motion = h.agent.readings(GroupId::Motion);
    let vital = h.agent.readings(GroupId::Vital);

    assert_eq!(h.device.emit_readings(), 11);

    let readings: Vec<_> = motion.try_iter().collect();
    assert_eq!(readings.len(), 5);
    assert!(readings.iter().all(|r| r.group() == GroupId::Motion));
    assert_eq!(vital.try_iter().count(), 2);
}

#[test]
fn test_readings_from_background_pump() {
    let h = harness(DeviceProfile::all_allowed());
    h.agent.on_activated();
    let ambient = h.agent.readings(GroupId::Ambient);

    let _pump = SimulatedDevice::spawn_pump(h.device.clone(), Duration::from_millis(10));

    let reading = ambient
        .recv_timeout(Duration::from_secs(2))
        .expect("no ambient reading delivered");
    assert_eq!(reading.group(), GroupId::Ambient);
}

#[test]
fn test_prompt_answered_on_background_thread() {
    let profile = DeviceProfile::default()
        .with_prompt_answer(PrivacyScope::Storage, ConsentOutcome::DeniedForever)
        .with_prompt_delay_ms(20);
    let h = harness_with(profile.clone(), PromptMode::from_profile(&profile));

    let result = h.agent.on_activated();
    assert_eq!(result, UsabilityResult::default());

    assert!(wait_until(Duration::from_secs(2), || {
        h.agent.usability().vital && h.log.stats().consent_declines == 1
    }));
    let usability = h.agent.usability();
    assert!(!usability.motion);
    assert!(!usability.ambient);
}

#[test]
fn test_unreachable_privacy_service_leaves_groups_unusable() {
    let h = harness(DeviceProfile::default().with_authority_offline());

    let result = h.agent.on_activated();

    assert_eq!(result, UsabilityResult::default());
    assert_eq!(h.device.stats().opens, 0);
}

#[test]
fn test_offline_framework_fails_startup() {
    let profile = DeviceProfile::all_allowed().with_framework_offline();
    let device = Arc::new(SimulatedDevice::new(profile.clone()));
    let privacy = Arc::new(SimulatedPrivacy::new(&profile, PromptMode::Manual));

    let result = SensorAgent::new(device, privacy, &Config::default(), create_shared_log());
    assert!(result.is_err());
}

#[test]
fn test_revoked_scope_keeps_launched_group_usable() {
    let profile = DeviceProfile::all_allowed().with_open_failure(SensorType::Gyroscope);
    let h = harness(profile);

    let first = h.agent.on_activated();
    assert!(first.ambient);
    assert!(!first.motion);

    // the user turns the storage privilege off in the system settings
    h.privacy
        .set_consent(PrivacyScope::Storage, ConsentState::Denied);
    let second = h.agent.on_activated();

    assert!(second.vital);
    assert!(second.ambient);
    assert!(!second.motion);
    assert!(h.agent.usability().ambient);
    assert!(!h.agent.orchestrator().is_launched(GroupId::Motion));

    let ambient = h.agent.readings(GroupId::Ambient);
    h.device.emit_readings();
    assert_eq!(ambient.try_iter().count(), 4);
}

#[test]
fn test_concurrent_activation_and_consent_acquire_each_group_once() {
    for _ in 0..50 {
        let h = harness(DeviceProfile::default());
        h.agent.on_activated();
        assert!(h.privacy.has_pending(PrivacyScope::Vital));
        assert!(h.privacy.has_pending(PrivacyScope::Storage));

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..20 {
                    h.agent.on_activated();
                }
            });
            assert!(h
                .privacy
                .respond(PrivacyScope::Storage, ConsentOutcome::AllowedForever));
            assert!(h
                .privacy
                .respond(PrivacyScope::Vital, ConsentOutcome::AllowedForever));
        });

        let stats = h.device.stats();
        assert_eq!(stats.listener_creates, 11);
        assert_eq!(stats.listener_starts, 11);
        assert_eq!(h.log.stats().acquisitions, 3);
        assert!(h.agent.usability().all());
    }
}

#[test]
fn test_unsupported_group_is_queried_once() {
    let profile = DeviceProfile::all_allowed().without_sensor(SensorType::Pressure);
    let h = harness(profile);

    h.agent.on_activated();
    let queries = h.device.stats().probes;
    assert!(queries > 0);

    for _ in 0..3 {
        let result = h.agent.on_activated();
        assert!(!result.ambient);
    }

    assert_eq!(h.device.stats().probes, queries);
}
