//! The instrument driving the reference engine end to end.

use approx::assert_relative_eq;
use pwmbank::engine::NoteStage;
use pwmbank::prelude::*;
use pwmbank::InstrumentConfig;
use std::time::Duration;
use tokio::runtime::Handle;

#[tokio::test]
async fn test_engine_initializes_with_pending_values() {
    let factory = BankEngineFactory::new();
    let bank = PwmOscillatorBank::builder()
        .value(ParameterId::PulseWidth, 0.5)
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    bank.set(ParameterId::PulseWidth, 0.7);
    bank.set(ParameterId::FilterCutoffFrequency, 880.0);

    assert!(bank.wait_until_bound().await);
    let engine = factory.last_engine().unwrap();
    let kernel = engine.allocate_render_resources().unwrap();

    assert_relative_eq!(kernel.parameter(ParameterId::PulseWidth), 0.7);
    assert_eq!(kernel.parameter(ParameterId::FilterCutoffFrequency), 880.0);
    assert!(!kernel.is_ramping(ParameterId::PulseWidth));
}

#[tokio::test]
async fn test_changes_after_bind_ramp_in_kernel() {
    let factory = BankEngineFactory::new();
    let bank = PwmOscillatorBank::builder()
        .config(InstrumentConfig {
            ramp_time: 0.01,
            sample_rate: 8000.0,
        })
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    assert!(bank.wait_until_bound().await);

    let mut kernel = factory
        .last_engine()
        .unwrap()
        .allocate_render_resources()
        .unwrap();
    assert_eq!(kernel.ramp_samples(), 80);

    bank.set(ParameterId::PulseWidth, 0.9);
    kernel.process(40);
    assert!(kernel.is_ramping(ParameterId::PulseWidth));
    assert_relative_eq!(kernel.parameter(ParameterId::PulseWidth), 0.7, epsilon = 1e-4);

    kernel.process(40);
    assert_relative_eq!(kernel.parameter(ParameterId::PulseWidth), 0.9);
    assert!(!kernel.is_ramping(ParameterId::PulseWidth));
}

#[tokio::test]
async fn test_ramp_time_reaches_running_kernel() {
    let factory = BankEngineFactory::new();
    let bank = PwmOscillatorBank::builder()
        .sample_rate(8000.0)
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    assert!(bank.wait_until_bound().await);

    let mut kernel = factory
        .last_engine()
        .unwrap()
        .allocate_render_resources()
        .unwrap();

    bank.set_ramp_time(0.0);
    bank.set(ParameterId::FilterResonance, 0.6);
    kernel.process(1);

    assert_eq!(kernel.ramp_samples(), 0);
    assert_relative_eq!(kernel.parameter(ParameterId::FilterResonance), 0.6);
}

#[tokio::test]
async fn test_notes_reach_kernel_once_bound() {
    let factory = BankEngineFactory::new();
    let bank = PwmOscillatorBank::builder()
        .sample_rate(8000.0)
        .value(ParameterId::ReleaseDuration, 0.05)
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    bank.note_on_midi(48, 100);
    assert!(bank.wait_until_bound().await);

    let mut kernel = factory
        .last_engine()
        .unwrap()
        .allocate_render_resources()
        .unwrap();

    bank.note_on_midi(60, 127);
    kernel.process(10);
    assert_eq!(kernel.active_notes().count(), 1);
    assert_eq!(kernel.note(48).unwrap().stage, NoteStage::Off);

    let state = kernel.note(60).unwrap();
    assert_eq!(state.stage, NoteStage::On);
    assert_relative_eq!(state.frequency, 261.6256, epsilon = 1e-3);

    // 0.05 s at 8 kHz
    bank.note_off(60);
    kernel.process(200);
    assert_eq!(kernel.note(60).unwrap().stage, NoteStage::Release);
    kernel.process(200);
    assert_eq!(kernel.note(60).unwrap().stage, NoteStage::Off);
}

#[tokio::test]
async fn test_pitch_bend_ramps_note_frequency() {
    let factory = BankEngineFactory::new();
    let bank = PwmOscillatorBank::builder()
        .ramp_time(0.0)
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    assert!(bank.wait_until_bound().await);

    let mut kernel = factory
        .last_engine()
        .unwrap()
        .allocate_render_resources()
        .unwrap();

    bank.note_on(69, 100, 440.0);
    bank.set(ParameterId::PitchBend, -12.0);
    kernel.process(1);

    assert_relative_eq!(kernel.bent_frequency(69).unwrap(), 220.0, max_relative = 1e-5);
}

#[tokio::test]
async fn test_hidden_parameter_is_reported_missing() {
    let factory = BankEngineFactory::new().without_parameter(ParameterId::VibratoRate);
    let bank = PwmOscillatorBank::builder()
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    assert!(bank.wait_until_bound().await);
    assert_eq!(bank.missing_parameters(), vec![ParameterId::VibratoRate]);

    bank.set(ParameterId::VibratoRate, 5.0);
    assert_eq!(bank.value(ParameterId::VibratoRate), 5.0);

    let engine = factory.last_engine().unwrap();
    let mut kernel = engine.allocate_render_resources().unwrap();
    kernel.process(64);
    assert_eq!(kernel.parameter(ParameterId::VibratoRate), 0.0);
}

#[tokio::test]
async fn test_engine_without_tree_takes_direct_writes() {
    let factory = BankEngineFactory::new().without_parameter_tree();
    let bank = PwmOscillatorBank::builder()
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    assert!(bank.wait_until_bound().await);

    let engine = factory.last_engine().unwrap();
    let mut kernel = engine.allocate_render_resources().unwrap();

    bank.set(ParameterId::PulseWidth, 0.1);
    kernel.process(1);
    assert_relative_eq!(kernel.parameter(ParameterId::PulseWidth), 0.1);
    assert!(!kernel.is_ramping(ParameterId::PulseWidth));
}

#[tokio::test]
async fn test_observer_released_on_drop() {
    let factory = BankEngineFactory::new();
    let bank = PwmOscillatorBank::builder()
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    assert!(bank.wait_until_bound().await);

    let engine = factory.last_engine().unwrap();
    assert_eq!(engine.tree().unwrap().observer_count(), 1);
    drop(bank);
    assert_eq!(engine.tree().unwrap().observer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_drop_during_slow_construction() {
    let factory = BankEngineFactory::new().latency(Duration::from_secs(1));
    let bank = PwmOscillatorBank::builder()
        .spawn(factory.clone(), &Handle::current())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(bank.phase(), BindingPhase::Binding);

    drop(bank);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(factory.last_engine().is_none());
}

#[tokio::test]
async fn test_foreign_component_fails_to_bind() {
    let description = pwmbank::ComponentDescription::instrument(*b"sawb");
    let bank = PwmOscillatorBank::builder()
        .description(description)
        .spawn(BankEngineFactory::new(), &Handle::current())
        .unwrap();

    assert!(!bank.wait_until_bound().await);
    assert_eq!(bank.phase(), BindingPhase::Unbound);
}

#[test]
fn test_preset_roundtrip_through_instrument() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let preset: ParameterValues =
        serde_json::from_str(r#"{ "pulseWidth": 0.25, "filterResonance": 0.5 }"#).unwrap();

    let bank = PwmOscillatorBank::builder()
        .values(preset)
        .spawn(BankEngineFactory::new(), runtime.handle())
        .unwrap();
    bank.set(ParameterId::VibratoDepth, 2.0);

    let json = serde_json::to_value(bank.values()).unwrap();
    assert_eq!(json["pulseWidth"], 0.25);
    assert_eq!(json["filterResonance"], 0.5);
    assert_eq!(json["vibratoDepth"], 2.0);
    assert_eq!(json["attackDuration"], 0.1);
}
