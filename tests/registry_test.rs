use kittentts_web::audio::AudioPayload;
use kittentts_web::engines::{TtsEngine, Voice};
use kittentts_web::error::TtsError;
use kittentts_web::registry::EngineRegistry;

mockall::mock! {
    pub Engine {}
    impl TtsEngine for Engine {
        fn name(&self) -> &'static str;
        fn description(&self) -> &'static str;
        fn is_available(&self) -> bool;
        fn voices(&self) -> Vec<Voice>;
        fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioPayload, TtsError>;
    }
}

fn ready_engine(name: &'static str) -> MockEngine {
    let mut engine = MockEngine::new();
    engine.expect_name().return_const(name);
    engine.expect_description().return_const("mock engine");
    engine.expect_is_available().times(1).return_const(true);
    engine
}

#[test]
fn unavailable_candidates_are_skipped() {
    let mut down = MockEngine::new();
    down.expect_name().return_const("Azure TTS");
    down.expect_is_available().times(1).return_const(false);

    let up = ready_engine("Kitten TTS");

    let registry = EngineRegistry::register_all(vec![Box::new(down), Box::new(up)], "azure");
    let engines = registry.list_engines();
    assert_eq!(engines.len(), 1);
    assert_eq!(engines[0].id, "kitten");
    // Preferred engine never registered, so the first survivor is active.
    assert!(engines[0].current);
}

#[test]
fn switch_marks_exactly_one_engine_current() {
    let registry = EngineRegistry::register_all(
        vec![
            Box::new(ready_engine("Google TTS")),
            Box::new(ready_engine("Coqui TTS")),
            Box::new(ready_engine("Kitten TTS")),
        ],
        "google",
    );

    for id in ["coqui", "kitten", "google"] {
        assert!(registry.switch_to(id));
        let engines = registry.list_engines();
        assert_eq!(
            engines
                .iter()
                .filter(|e| e.current)
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>(),
            vec![id]
        );
    }
}

#[test]
fn switch_to_unknown_id_is_false_and_keeps_active() {
    let registry =
        EngineRegistry::register_all(vec![Box::new(ready_engine("Kitten TTS"))], "kitten");
    assert!(!registry.switch_to("nope"));
    assert_eq!(registry.active_id().as_deref(), Some("kitten"));
}

#[test]
fn synthesize_delegates_to_active_engine() {
    let mut engine = ready_engine("Kitten TTS");
    engine
        .expect_synthesize()
        .withf(|text, voice| text == "hello" && voice == "v1")
        .times(1)
        .returning(|_, _| Ok(AudioPayload::new(vec![0.1, 0.2], 24_000)));

    let registry = EngineRegistry::register_all(vec![Box::new(engine)], "kitten");
    let payload = registry.synthesize("hello", "v1", None).unwrap();
    assert_eq!(payload.samples.len(), 2);
    assert_eq!(payload.sample_rate, 24_000);
}

#[test]
fn synthesis_errors_propagate_unchanged() {
    let mut engine = ready_engine("Google TTS");
    engine
        .expect_synthesize()
        .returning(|_, _| Err(TtsError::synthesis("quota exceeded")));

    let registry = EngineRegistry::register_all(vec![Box::new(engine)], "google");
    match registry.synthesize("hello", "v1", None) {
        Err(TtsError::Synthesis(msg)) => assert_eq!(msg, "quota exceeded"),
        other => panic!("expected Synthesis error, got {:?}", other),
    }
}

#[test]
fn explicit_engine_id_overrides_active() {
    let mut active = ready_engine("Google TTS");
    active.expect_synthesize().times(0);

    let mut other = ready_engine("Kitten TTS");
    other
        .expect_synthesize()
        .times(1)
        .returning(|_, _| Ok(AudioPayload::new(vec![0.0], 24_000)));

    let registry =
        EngineRegistry::register_all(vec![Box::new(active), Box::new(other)], "google");
    registry.synthesize("hello", "v1", Some("kitten")).unwrap();
}

#[test]
fn id_collision_keeps_later_registration() {
    let mut first = ready_engine("Kitten TTS");
    first.expect_voices().times(0);

    let mut second = ready_engine("Kitten TTS");
    second
        .expect_voices()
        .times(1)
        .returning(|| vec![Voice::new("v2", "Second")]);

    let registry =
        EngineRegistry::register_all(vec![Box::new(first), Box::new(second)], "kitten");
    let engines = registry.list_engines();
    assert_eq!(engines.len(), 1);

    let voices = registry.list_voices(Some("kitten"));
    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0].id, "v2");
}

#[test]
fn voices_without_engines_is_empty_not_error() {
    let registry = EngineRegistry::register_all(Vec::new(), "google");
    assert!(registry.list_voices(None).is_empty());
    assert!(registry.list_voices(Some("kitten")).is_empty());
}
