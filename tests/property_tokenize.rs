use proptest::prelude::*;

use quiz_backend::services::tokenize::{tokenize_cloze, tokenize_particles, BLANK_TEXT};

/// Mix of kana, kanji, particles, ASCII, punctuation and parens — the kind of
/// text that actually shows up in the sentence column.
fn sentence_char() -> impl Strategy<Value = char> {
    prop::sample::select(
        "あいうえおかきくけこがぎぐげごさしすせそたちつてとだでどなにぬねのはひふへほ\
         まみむめもやゆよらりるれろわをんではにとがもからまでくらいなんて\
         学校行食飲見書日本語先生 ABCabc123。、！？（）()　 "
            .chars()
            .collect::<Vec<char>>(),
    )
}

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(sentence_char(), 0..40).prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    /// Concatenating particle segments must reproduce the input byte for
    /// byte, for arbitrary unicode input, not just plausible sentences.
    #[test]
    fn pt_particle_round_trip_any_string(input in "\\PC*") {
        let joined: String = tokenize_particles(&input)
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        prop_assert_eq!(joined, input);
    }

    #[test]
    fn pt_particle_round_trip_sentences(input in sentence()) {
        let segments = tokenize_particles(&input);
        let joined: String = segments.iter().map(|s| s.text.as_str()).collect();
        prop_assert_eq!(joined, input);
    }

    #[test]
    fn pt_particle_segments_never_empty(input in sentence()) {
        for seg in tokenize_particles(&input) {
            prop_assert!(!seg.text.is_empty());
        }
    }

    /// Adjacent non-particle segments would mean a run was split needlessly.
    #[test]
    fn pt_plain_runs_are_maximal(input in sentence()) {
        let segments = tokenize_particles(&input);
        for pair in segments.windows(2) {
            prop_assert!(
                pair[0].is_particle || pair[1].is_particle,
                "two adjacent plain segments: {:?}",
                pair
            );
        }
    }

    /// Every blank renders as the fixed marker and plain segments are single
    /// characters containing no closing parenthesis consumed by a blank.
    #[test]
    fn pt_cloze_segments_well_formed(input in sentence()) {
        for seg in tokenize_cloze(&input) {
            if seg.is_blank {
                prop_assert_eq!(seg.text.as_str(), BLANK_TEXT);
            } else {
                prop_assert_eq!(seg.text.chars().count(), 1);
            }
        }
    }

    /// Cloze tokenization never panics and never loses non-blank characters
    /// that sit outside parenthesis spans.
    #[test]
    fn pt_cloze_total_on_any_string(input in "\\PC*") {
        let _ = tokenize_cloze(&input);
    }
}
