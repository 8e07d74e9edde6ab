//! Integration tests for sonant-core: a small voice graph built on the
//! simulated backend.

use sonant_core::{
    AudioBackend, BackendError, FilterType, ParamKind, RampShape, SimBackend, SimNodeKind,
    Waveform, frequency_from_note,
};

// ---------------------------------------------------------------------------
// Voice lifecycle on the simulated backend
// ---------------------------------------------------------------------------

#[test]
fn voice_attack_release_teardown() {
    let mut sim = SimBackend::new();
    let dest = sim.destination();

    let out = sim.create_gain(1.0);
    sim.connect(out, dest).unwrap();

    let osc = sim.create_oscillator(Waveform::Sine, frequency_from_note(49));
    let env = sim.create_gain(0.0);
    sim.connect(osc, env).unwrap();
    sim.connect(env, out).unwrap();
    sim.start(osc).unwrap();
    sim.ramp(env, ParamKind::Gain, 0.75, 0.1, RampShape::Linear)
        .unwrap();

    sim.advance(0.1);
    assert_eq!(sim.param_value(env, ParamKind::Gain), Some(0.75));

    // Release over 0.2s, then tear the voice down.
    sim.ramp(env, ParamKind::Gain, 0.0, 0.2, RampShape::Linear)
        .unwrap();
    let end = sim.current_time() + 0.2;
    sim.stop(osc, end).unwrap();
    sim.stop(env, end).unwrap();

    sim.advance(0.1);
    let mid = sim.param_value(env, ParamKind::Gain).unwrap();
    assert!((mid - 0.375).abs() < 1e-4, "Half-released gain, got {}", mid);
    assert_eq!(sim.running_oscillators(), vec![osc]);

    sim.advance(0.1);
    assert!(sim.running_oscillators().is_empty());
    assert!(sim.inputs(out).is_empty(), "Voice should be detached");
    assert_eq!(sim.live_node_count(), 2, "Only destination and output remain");
}

#[test]
fn filter_in_signal_path() {
    let mut sim = SimBackend::new();
    let dest = sim.destination();
    let filter = sim.create_filter(FilterType::Lowpass);
    sim.connect(filter, dest).unwrap();

    sim.ramp(filter, ParamKind::Frequency, 10000.0, 0.0, RampShape::Linear)
        .unwrap();
    sim.ramp(filter, ParamKind::Q, 4.0, 0.05, RampShape::Linear)
        .unwrap();
    sim.ramp(filter, ParamKind::FilterGain, -6.0, 0.0, RampShape::Linear)
        .unwrap();

    assert_eq!(sim.param_value(filter, ParamKind::Frequency), Some(10000.0));
    assert_eq!(sim.param_target(filter, ParamKind::Q), Some(4.0));
    assert_eq!(sim.param_value(filter, ParamKind::FilterGain), Some(-6.0));
    assert_eq!(sim.kind(filter), Some(SimNodeKind::Filter(FilterType::Lowpass)));
    assert!(sim.is_connected(filter, dest));
}

#[test]
fn rewire_source_between_destinations() {
    let mut sim = SimBackend::new();
    let dest = sim.destination();
    let filter = sim.create_filter(FilterType::Highpass);
    let out = sim.create_gain(0.75);
    sim.connect(filter, dest).unwrap();
    sim.connect(out, dest).unwrap();

    sim.disconnect(out, dest).unwrap();
    sim.connect(out, filter).unwrap();
    assert_eq!(sim.outputs(out), vec![filter]);
    assert_eq!(sim.inputs(dest), vec![filter]);
}

#[test]
fn glide_is_exponential_and_lands() {
    let mut sim = SimBackend::new();
    let osc = sim.create_oscillator(Waveform::Triangle, 220.0);
    sim.start(osc).unwrap();
    sim.ramp(osc, ParamKind::Frequency, 440.0, 0.05, RampShape::Exponential)
        .unwrap();

    sim.advance(0.01);
    let early = sim.param_value(osc, ParamKind::Frequency).unwrap();
    assert!(early > 330.0 && early < 440.0, "got {}", early);

    sim.advance(0.04);
    let settled = sim.param_value(osc, ParamKind::Frequency).unwrap();
    assert!((settled - 440.0).abs() < 1e-3, "got {}", settled);
}

#[test]
fn operations_on_dead_nodes_fail() {
    let mut sim = SimBackend::new();
    let g = sim.create_gain(1.0);
    sim.stop(g, 0.0).unwrap();

    assert_eq!(
        sim.ramp(g, ParamKind::Gain, 0.0, 0.0, RampShape::Linear),
        Err(BackendError::UnknownNode(g))
    );
    assert_eq!(
        sim.connect(g, sim.destination()),
        Err(BackendError::UnknownNode(g))
    );
}

#[test]
fn destination_cannot_be_stopped() {
    let mut sim = SimBackend::new();
    let dest = sim.destination();
    assert!(sim.stop(dest, 0.0).is_err());
    assert!(sim.is_live(dest));
}
