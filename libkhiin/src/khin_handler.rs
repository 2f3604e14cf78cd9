//! Khin (neutral tone) markers typed as a doubled hyphen.
//!
//! The segmenter leaves a run of hyphens as its own plain text element.
//! Here each run of two or more is folded into the syllable run that
//! follows it, which gets a typed khin marker. With autokhin on, the
//! syllables after that one get a virtual marker too, until one refuses it.

use khiin_core::unicode::{char_len, prefix, suffix};

use crate::buffer::Buffer;
use crate::buffer_element::BufferElement;
use crate::parser::SyllableParser;
use crate::syllable::KhinKeyPosition;
use crate::tai_text::TaiText;

fn is_khin_trigger(parser: &SyllableParser<'_>, raw: &str) -> bool {
    char_len(raw) >= 2 && raw.chars().all(|c| parser.keyconfig().is_hyphen(c))
}

/// Index of the next element at or after `from` that is not a virtual space.
fn next_visible(buffer: &Buffer, from: usize) -> usize {
    (from..buffer.len())
        .find(|&i| buffer.get(i).is_some_and(|e| !e.is_virtual_space()))
        .unwrap_or(buffer.len())
}

/// Apply khin markers to `buffer` wherever a hyphen run asks for one.
pub fn autokhin_buffer(buffer: &mut Buffer, autokhin_enabled: bool, parser: &SyllableParser<'_>) {
    let mut autokhin = false;
    let mut i = 0;

    while i < buffer.len() {
        let Some(element) = buffer.get(i) else {
            break;
        };
        if element.is_virtual_space() {
            i += 1;
            continue;
        }

        let raw = element.raw();
        if is_khin_trigger(parser, &raw) {
            autokhin = true;
            let size = char_len(&raw);
            let remainder = prefix(&raw, size - 2).to_string();
            let marker = suffix(&raw, size - 2);
            let key = marker.chars().last();

            let next = next_visible(buffer, i + 1);
            let next_is_syllable = buffer.get(next).is_some_and(|e| e.is_tai_text());

            if next == buffer.len() {
                let khin = BufferElement::tai_text(TaiText::from_raw_syllable(parser, marker));
                if remainder.is_empty() {
                    buffer.replace(i..i + 1, khin.into());
                } else {
                    buffer.replace(
                        i..i + 1,
                        Buffer::from(vec![BufferElement::plaintext(remainder), khin]),
                    );
                }
                break;
            }

            if !next_is_syllable {
                autokhin = false;
                i += 1;
                continue;
            }

            let target = if remainder.is_empty() {
                buffer.remove(i);
                next - 1
            } else {
                if let Some(el) = buffer.get_mut(i) {
                    el.replace_with_plaintext(remainder);
                }
                next
            };

            let applied = buffer
                .get_mut(target)
                .is_some_and(|el| el.set_khin(KhinKeyPosition::Start, key));
            if !applied {
                autokhin = false;
            }
            i = target + 1;
            continue;
        }

        if autokhin_enabled && autokhin {
            let applied = buffer
                .get_mut(i)
                .is_some_and(|el| el.set_khin(KhinKeyPosition::Virtual, None));
            if !applied {
                autokhin = false;
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyconfig::KeyConfig;

    fn syllables(parser: &SyllableParser<'_>, raws: &[&str]) -> Buffer {
        raws.iter()
            .map(|raw| {
                if is_khin_trigger(parser, raw) || raw.chars().all(|c| c == '-') {
                    BufferElement::plaintext(*raw)
                } else {
                    BufferElement::tai_text(TaiText::from_raw_syllable(parser, raw))
                }
            })
            .collect()
    }

    fn composed(buffer: &Buffer) -> Vec<String> {
        buffer.iter().map(|e| e.composed()).collect()
    }

    #[test]
    fn test_khin_on_next_syllable() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let mut buf = syllables(&parser, &["--", "a"]);
        autokhin_buffer(&mut buf, true, &parser);
        assert_eq!(composed(&buf), vec!["·a"]);
        assert_eq!(buf.raw_text(), "--a");
    }

    #[test]
    fn test_autokhin_propagates() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let mut buf = syllables(&parser, &["a", "--", "bo", "bo", "bo"]);
        autokhin_buffer(&mut buf, true, &parser);
        assert_eq!(composed(&buf), vec!["a", "·bo", "·bo", "·bo"]);
        assert_eq!(buf.raw_text(), "a--bobobo");

        let mut buf = syllables(&parser, &["--", "a", "a"]);
        autokhin_buffer(&mut buf, false, &parser);
        assert_eq!(composed(&buf), vec!["·a", "a"]);
    }

    #[test]
    fn test_autokhin_stops_at_plaintext() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let mut buf = syllables(&parser, &["--", "a"]);
        buf.push(BufferElement::plaintext("xx"));
        buf.push(BufferElement::tai_text(TaiText::from_raw_syllable(&parser, "bo")));
        autokhin_buffer(&mut buf, true, &parser);
        assert_eq!(composed(&buf), vec!["·a", "xx", "bo"]);
        assert_eq!(buf.raw_text(), "--axxbo");
    }

    #[test]
    fn test_longer_hyphen_runs() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let mut buf = syllables(&parser, &["ho2", "---", "a"]);
        autokhin_buffer(&mut buf, true, &parser);
        assert_eq!(composed(&buf), vec!["hó", "-", "·a"]);
        assert_eq!(buf.raw_text(), "ho2---a");
    }

    #[test]
    fn test_trailing_hyphens_become_khin_syllable() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let mut buf = syllables(&parser, &["a", "--"]);
        autokhin_buffer(&mut buf, true, &parser);
        assert_eq!(composed(&buf), vec!["a", "·"]);
        assert_eq!(buf.raw_text(), "a--");

        let mut buf = syllables(&parser, &["---"]);
        autokhin_buffer(&mut buf, true, &parser);
        assert_eq!(composed(&buf), vec!["-", "·"]);
        assert_eq!(buf.raw_text(), "---");
    }

    #[test]
    fn test_single_hyphen_is_left_alone() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, true);

        let mut buf = syllables(&parser, &["a", "-", "a"]);
        autokhin_buffer(&mut buf, true, &parser);
        assert_eq!(composed(&buf), vec!["a", "-", "a"]);
    }

    #[test]
    fn test_hyphen_khin_style() {
        let kc = KeyConfig::new();
        let parser = SyllableParser::new(&kc, false);

        let mut buf = syllables(&parser, &["--", "a", "a"]);
        autokhin_buffer(&mut buf, true, &parser);
        assert_eq!(composed(&buf), vec!["--a", "--a"]);
    }
}
