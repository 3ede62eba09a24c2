use voxstream_core::{ModelConfig, RecognitionError};
use voxstream_engine::{DecodeStateMachine, DecoderState, Endpointer, ModelRegistry};

fn null_machine() -> DecodeStateMachine {
    let registry = ModelRegistry::new();
    let model = registry.load(&ModelConfig::named("null"), 16000).unwrap();
    DecodeStateMachine::new(model)
}

#[test]
fn test_registry_to_decoder_window_matches_model() {
    let machine = null_machine();
    assert_eq!(machine.required_chunk_size(), 1600);
    assert_eq!(machine.sample_rate(), 16000);
}

#[test]
fn test_partial_window_waits_for_flush() {
    let mut machine = null_machine();
    let audio = vec![0.2f32; 3500];

    let mut consumed = 0;
    while audio.len() - consumed >= machine.required_chunk_size() {
        let end = consumed + machine.required_chunk_size();
        machine.step(&audio[consumed..end]).unwrap();
        consumed = end;
    }
    assert_eq!(machine.total_steps(), 2);
    assert_eq!(audio.len() - consumed, 300);

    let hyp = machine.flush(&audio[consumed..]).unwrap();
    assert_eq!(machine.total_steps(), 3);
    assert_eq!(machine.state(), DecoderState::Flushed);
    assert!(!hyp.tokens.is_empty());
    assert_eq!(
        machine.step(&[0.0; 1600]),
        Err(RecognitionError::SessionFinished)
    );
}

#[test]
fn test_silence_after_speech_reaches_endpoint() {
    let mut machine = null_machine();
    let endpointer = Endpointer::default();
    let window = machine.required_chunk_size();

    let hyp = machine.step(&vec![0.5; window]).unwrap();
    assert!(!hyp.is_empty());

    let mut fired_at = None;
    for i in 0..20 {
        let hyp = machine.step(&vec![0.0; window]).unwrap();
        if endpointer.is_endpoint(
            !hyp.tokens.is_empty(),
            hyp.num_trailing_blanks,
            machine.steps_since_reset(),
            window,
            machine.sample_rate(),
        ) {
            fired_at = Some(i + 1);
            break;
        }
    }
    // 1.2 s of trailing blanks at 0.1 s per step
    assert_eq!(fired_at, Some(12));

    machine.reset().unwrap();
    assert_eq!(machine.steps_since_reset(), 0);
}
