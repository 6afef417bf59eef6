use core_config::EngineConfig;
use core_engine::EditEngine;
use core_history::ManualClock;

/// Engine over `text` with a hand-driven clock, so tests control exactly
/// when the idle window elapses.
pub fn engine_with_clock(text: &str) -> (EditEngine, ManualClock) {
    let clock = ManualClock::new();
    let eng = EditEngine::with_clock(text, &EngineConfig::default(), Box::new(clock.clone()));
    (eng, clock)
}

/// Type each char of `s` as its own keystroke.
pub fn type_str(eng: &mut EditEngine, s: &str) {
    for ch in s.chars() {
        eng.type_char(&ch.to_string()).unwrap();
    }
}
