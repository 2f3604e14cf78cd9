// libkhiin/tests/composition.rs
//
// Keystroke-level scenarios driven through the public Engine API with the
// built-in demo lexicon.
//
// Tests cover:
// - Tone and khin rendering while composing
// - Autokhin and the khin display style
// - Caret movement and erasing, including inside converted words
// - Conversion, focus navigation and commit
// - Learning from committed text

use khiin_core::Lexicon;
use libkhiin::{CursorDirection, EditState, Engine, InputMode, KhiinConfig, SegmentStatus};

fn engine_with(config: KhiinConfig) -> Engine {
    Engine::in_memory(Lexicon::load_demo(), config).unwrap()
}

fn engine() -> Engine {
    engine_with(KhiinConfig::default())
}

fn type_keys(engine: &mut Engine, keys: &str) {
    for ch in keys.chars() {
        assert!(engine.insert(ch), "key '{}' was not consumed", ch);
    }
}

fn text(engine: &Engine) -> String {
    engine.build_preedit().text()
}

fn backspace(engine: &mut Engine) {
    engine.erase(CursorDirection::Left);
}

#[test]
fn test_tone_digit_becomes_diacritic() {
    let mut e = engine();
    type_keys(&mut e, "ho2");
    assert_eq!(text(&e), "hó");
    assert_eq!(e.build_preedit().caret, 2);
    assert_eq!(e.edit_state(), EditState::Composing);
}

#[test]
fn test_caret_after_tone_key_is_at_syllable_end() {
    // The mark lands on the "o", but the caret stays after the whole syllable.
    let mut e = engine();
    type_keys(&mut e, "goa2");
    assert_eq!(text(&e), "góa");
    assert_eq!(e.build_preedit().caret, 3);

    type_keys(&mut e, "si7");
    assert_eq!(text(&e), "góa sī");
    assert_eq!(e.build_preedit().caret, 6);
}

#[test]
fn test_multi_syllable_word_is_spaced() {
    let mut e = engine();
    type_keys(&mut e, "tai7chi");
    assert_eq!(text(&e), "tāi chi");
    assert_eq!(e.build_preedit().caret, 7);
    assert_eq!(e.raw_text(), "tai7chi");
}

#[test]
fn test_khin_typed_and_erased() {
    let mut e = engine();
    type_keys(&mut e, "--a");
    assert_eq!(text(&e), "·a");
    assert_eq!(e.build_preedit().caret, 2);

    backspace(&mut e);
    assert_eq!(text(&e), "·");
    backspace(&mut e);
    assert_eq!(text(&e), "");
    assert!(e.is_empty());
    assert_eq!(e.edit_state(), EditState::Empty);
}

#[test]
fn test_triple_hyphen_keeps_one() {
    let mut e = engine();
    type_keys(&mut e, "ho2---a");
    assert_eq!(text(&e), "hó-·a");
    assert_eq!(e.raw_text(), "ho2---a");
}

#[test]
fn test_autokhin_carries_forward() {
    let mut e = engine();
    type_keys(&mut e, "a--bobobobo");
    assert_eq!(text(&e), "a ·bo ·bo ·bo ·bo");

    let mut e = engine();
    type_keys(&mut e, "--aa");
    assert_eq!(text(&e), "·a ·a");
    backspace(&mut e);
    assert_eq!(text(&e), "·a");
}

#[test]
fn test_autokhin_disabled() {
    let mut e = engine_with(KhiinConfig {
        autokhin: false,
        ..KhiinConfig::default()
    });
    type_keys(&mut e, "--aa");
    assert_eq!(text(&e), "·a a");
}

#[test]
fn test_hyphen_khin_style() {
    let config = KhiinConfig {
        dotted_khin: false,
        ..KhiinConfig::default()
    };

    let mut e = engine_with(config.clone());
    type_keys(&mut e, "--a");
    assert_eq!(text(&e), "--a");

    let mut e = engine_with(config);
    type_keys(&mut e, "--aa");
    assert_eq!(text(&e), "--a--a");
}

#[test]
fn test_caret_skips_combining_marks() {
    let mut e = engine();
    type_keys(&mut e, "chiah8");
    assert_eq!(text(&e), "chia\u{030d}h");
    assert_eq!(e.build_preedit().caret, 6);
    e.handle_left_right(CursorDirection::Left);
    assert_eq!(e.build_preedit().caret, 5);
    e.handle_left_right(CursorDirection::Left);
    assert_eq!(e.build_preedit().caret, 3);
}

#[test]
fn test_convert_then_erase() {
    let mut e = engine();
    type_keys(&mut e, "ho2");
    e.handle_select_or_focus();
    assert_eq!(e.edit_state(), EditState::Converted);
    assert_eq!(text(&e), "好");

    backspace(&mut e);
    assert!(e.is_empty());
    assert_eq!(text(&e), "");
}

#[test]
fn test_erase_one_hanji_from_converted_word() {
    let mut e = engine();
    type_keys(&mut e, "taichi");
    e.handle_select_or_focus();
    assert_eq!(text(&e), "代誌");
    assert_eq!(e.build_preedit().caret, 2);

    backspace(&mut e);
    assert_eq!(text(&e), "代");
    assert_eq!(e.raw_text(), "代");
    assert_eq!(e.edit_state(), EditState::Converted);
    assert_eq!(e.build_preedit().caret, 1);
    assert!(!e.build_preedit().has_status(SegmentStatus::Composing));

    backspace(&mut e);
    assert!(e.is_empty());
    assert_eq!(text(&e), "");
    assert_eq!(e.edit_state(), EditState::Empty);
}

#[test]
fn test_select_first_candidate_converts_everything() {
    let mut e = engine();
    type_keys(&mut e, "taichi");
    assert!(!e.get_candidates().is_empty());

    e.select_candidate(0);
    assert_eq!(e.edit_state(), EditState::Converted);
    assert_eq!(text(&e), "代誌");
    assert!(e.get_candidates().is_empty());
    assert!(!e.build_preedit().has_status(SegmentStatus::Composing));
}

#[test]
fn test_segment_navigation_after_conversion() {
    let mut e = engine();
    type_keys(&mut e, "goa2si7");
    e.handle_select_or_focus();
    assert_eq!(text(&e), "我是");

    let preedit = e.build_preedit();
    assert_eq!(preedit.segments[0].status, SegmentStatus::Focused);
    assert_eq!(preedit.focused_caret, 0);

    e.handle_left_right(CursorDirection::Right);
    let preedit = e.build_preedit();
    assert_eq!(preedit.segments[1].status, SegmentStatus::Focused);
    assert_eq!(preedit.segments[1].value, "是");
    assert_eq!(preedit.focused_caret, 1);

    e.handle_left_right(CursorDirection::Left);
    assert_eq!(e.build_preedit().focused_caret, 0);
}

#[test]
fn test_space_cycles_then_enter_selects_then_commits() {
    let mut e = engine();
    type_keys(&mut e, "ho2");

    e.handle_select_or_focus();
    assert_eq!(e.edit_state(), EditState::Converted);
    e.handle_select_or_focus();
    assert_eq!(e.edit_state(), EditState::Selecting);
    assert_eq!(text(&e), "號");
    assert_eq!(e.get_candidates().focused, Some(1));

    assert_eq!(e.handle_select_or_commit(), None);
    assert_eq!(e.edit_state(), EditState::Converted);
    assert_eq!(e.handle_select_or_commit().as_deref(), Some("號"));
    assert!(e.is_empty());
}

#[test]
fn test_revert_from_composing_clears() {
    let mut e = engine();
    type_keys(&mut e, "bo");
    e.revert();
    assert!(e.is_empty());
    assert_eq!(e.edit_state(), EditState::Empty);
}

#[test]
fn test_committed_choice_is_learned() {
    let mut e = engine();
    type_keys(&mut e, "li2");
    assert_eq!(e.get_candidates().values()[0], "你");

    e.focus_next_candidate();
    e.focus_next_candidate();
    assert_eq!(text(&e), "理");
    assert_eq!(e.handle_select_or_commit(), None);
    assert_eq!(e.handle_select_or_commit().as_deref(), Some("理"));

    type_keys(&mut e, "li2");
    assert_eq!(e.get_candidates().values()[0], "理");
}

#[test]
fn test_punctuation_converts() {
    let mut e = engine();
    type_keys(&mut e, "ho2.");
    assert_eq!(e.raw_text(), "ho2.");
    e.handle_select_or_focus();
    assert_eq!(text(&e), "好。");
}

#[test]
fn test_manual_mode_only_composes() {
    let mut e = engine_with(KhiinConfig {
        input_mode: InputMode::Manual,
        ..KhiinConfig::default()
    });
    type_keys(&mut e, "tai7chi");
    assert_eq!(text(&e), "tāi chi");
    assert!(e.get_candidates().is_empty());
}
