//! Undo batching behavior through the engine: idle-window coalescing,
//! explicit batches, and paste isolation.

mod common;

use common::{engine_with_clock, type_str};
use core_buffer::Position;
use core_engine::EditEngine;
use std::time::Duration;

#[test]
fn rapid_typing_undoes_as_one_step() {
    let (mut eng, clock) = engine_with_clock("");
    for ch in ["h", "e", "l", "l", "o"] {
        eng.type_char(ch).unwrap();
        clock.advance(Duration::from_millis(50));
    }
    assert_eq!(eng.text(), "hello");
    assert!(eng.undo().unwrap());
    assert_eq!(eng.text(), "");
    assert!(!eng.can_undo());
}

#[test]
fn pause_splits_typing_into_two_steps() {
    let (mut eng, clock) = engine_with_clock("");
    type_str(&mut eng, "foo");
    clock.advance(Duration::from_millis(600));
    type_str(&mut eng, "bar");
    assert_eq!(eng.text(), "foobar");

    assert!(eng.undo().unwrap());
    assert_eq!(eng.text(), "foo");
    assert!(eng.undo().unwrap());
    assert_eq!(eng.text(), "");
}

#[test]
fn redo_restores_steps_in_order() {
    let (mut eng, clock) = engine_with_clock("");
    type_str(&mut eng, "one");
    clock.advance(Duration::from_millis(600));
    type_str(&mut eng, " two");

    eng.undo().unwrap();
    eng.undo().unwrap();
    assert_eq!(eng.text(), "");

    assert!(eng.redo().unwrap());
    assert_eq!(eng.text(), "one");
    assert!(eng.redo().unwrap());
    assert_eq!(eng.text(), "one two");
    assert!(!eng.can_redo());
}

#[test]
fn new_edit_clears_redo() {
    let (mut eng, _clock) = engine_with_clock("");
    type_str(&mut eng, "abc");
    eng.undo().unwrap();
    assert!(eng.can_redo());
    eng.type_char("z").unwrap();
    assert!(!eng.can_redo());
    assert_eq!(eng.text(), "z");
}

#[test]
fn paste_never_merges_with_surrounding_typing() {
    let (mut eng, _clock) = engine_with_clock("");
    // No clock advance at all: without the explicit batch boundaries the
    // whole sequence would coalesce into one step.
    type_str(&mut eng, "ab");
    eng.paste("XYZ").unwrap();
    type_str(&mut eng, "cd");
    assert_eq!(eng.text(), "abXYZcd");

    eng.undo().unwrap();
    assert_eq!(eng.text(), "abXYZ");
    eng.undo().unwrap();
    assert_eq!(eng.text(), "ab");
    eng.undo().unwrap();
    assert_eq!(eng.text(), "");
}

#[test]
fn explicit_batch_undoes_atomically() {
    let (mut eng, _clock) = engine_with_clock("");
    eng.begin_batch();
    type_str(&mut eng, "ab");
    eng.insert_newline().unwrap();
    type_str(&mut eng, "cd");
    eng.end_batch();

    assert_eq!(eng.text(), "ab\ncd");
    assert!(eng.undo().unwrap());
    assert_eq!(eng.text(), "");
    assert!(!eng.can_undo());
}

#[test]
fn idle_gap_closes_an_explicit_batch() {
    let (mut eng, clock) = engine_with_clock("");
    eng.begin_batch();
    type_str(&mut eng, "a");
    clock.advance(Duration::from_secs(10));
    type_str(&mut eng, "b");
    eng.end_batch();

    assert!(eng.undo().unwrap());
    assert_eq!(eng.text(), "a");
    assert!(eng.undo().unwrap());
    assert_eq!(eng.text(), "");
}

#[test]
fn paste_over_selection_is_one_step() {
    let mut eng = EditEngine::new("hello world");
    eng.select(Position::new(0, 6), Position::new(0, 11)).unwrap();
    eng.paste("there, general").unwrap();
    assert_eq!(eng.text(), "hello there, general");

    assert!(eng.undo().unwrap());
    assert_eq!(eng.text(), "hello world");
    let span = eng.selection().expect("selection restored by undo");
    assert_eq!(span.anchor, Position::new(0, 6));
    assert_eq!(span.active, Position::new(0, 11));

    assert!(eng.redo().unwrap());
    assert_eq!(eng.text(), "hello there, general");
}

#[test]
fn undo_then_redo_keeps_multiline_paste_intact() {
    let (mut eng, _clock) = engine_with_clock("start");
    eng.set_cursor(Position::new(0, 5)).unwrap();
    eng.paste("\nmiddle\nend").unwrap();
    assert_eq!(eng.text(), "start\nmiddle\nend");
    assert_eq!(eng.cursor(), Position::new(2, 3));

    eng.undo().unwrap();
    assert_eq!(eng.text(), "start");
    assert_eq!(eng.cursor(), Position::new(0, 5));

    eng.redo().unwrap();
    assert_eq!(eng.text(), "start\nmiddle\nend");
    assert_eq!(eng.cursor(), Position::new(2, 3));
}
