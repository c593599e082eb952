//! Particle and cloze tokenization for sentence rendering.
//!
//! This is a boundary heuristic, not a morphological analyzer: matching is a
//! greedy longest-first scan over a fixed particle table, so particle-looking
//! substrings inside ordinary words can be mis-tagged. Good enough for
//! highlighting, nothing more.

use serde::{Deserialize, Serialize};

/// Common particles and auxiliary chunks, longest first so the greedy scan
/// never takes `で` where `では` applies.
const PARTICLES: &[&str] = &[
    "くらい",
    "なんて",
    "では",
    "には",
    "とは",
    "へと",
    "から",
    "まで",
    "より",
    "だけ",
    "ほど",
    "など",
    "で",
    "に",
    "へ",
    "と",
    "が",
    "を",
    "は",
    "も",
    "や",
    "の",
    "か",
];

/// Normalized display text for a cloze blank.
pub const BLANK_TEXT: &str = "（　）";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleSegment {
    pub text: String,
    pub is_particle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClozeSegment {
    pub text: String,
    pub is_blank: bool,
}

/// Combined token for rendering: cloze segmentation first, then particle
/// tagging over the plain runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderToken {
    pub text: String,
    pub is_particle: bool,
    pub is_blank: bool,
}

/// Splits `text` into particle / non-particle segments.
///
/// Invariants: concatenating the segment texts in order reproduces `text`
/// exactly; no empty segments; a maximal run of non-particle characters is one
/// segment.
pub fn tokenize_particles(text: &str) -> Vec<ParticleSegment> {
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        if let Some(particle) = PARTICLES.iter().find(|p| rest.starts_with(**p)) {
            if plain_start < pos {
                segments.push(ParticleSegment {
                    text: text[plain_start..pos].to_string(),
                    is_particle: false,
                });
            }
            segments.push(ParticleSegment {
                text: (*particle).to_string(),
                is_particle: true,
            });
            pos += particle.len();
            plain_start = pos;
        } else {
            // Safe: pos always sits on a char boundary.
            pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    if plain_start < text.len() {
        segments.push(ParticleSegment {
            text: text[plain_start..].to_string(),
            is_particle: false,
        });
    }
    segments
}

fn is_open_paren(c: char) -> bool {
    c == '（' || c == '('
}

fn is_close_paren(c: char) -> bool {
    c == '）' || c == ')'
}

/// Splits a cloze sentence into per-character plain segments and normalized
/// blank segments, one per parenthesis pair (full- or half-width, mixed widths
/// accepted). An opening parenthesis with no closer falls through to plain
/// emission.
pub fn tokenize_cloze(text: &str) -> Vec<ClozeSegment> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if is_open_paren(chars[i]) {
            if let Some(offset) = chars[i + 1..].iter().position(|&c| is_close_paren(c)) {
                segments.push(ClozeSegment {
                    text: BLANK_TEXT.to_string(),
                    is_blank: true,
                });
                i += offset + 2;
                continue;
            }
        }
        segments.push(ClozeSegment {
            text: chars[i].to_string(),
            is_blank: false,
        });
        i += 1;
    }
    segments
}

/// Render tokens for a cloze sentence: blanks stay blanks, runs of plain
/// characters between blanks get particle tagging.
pub fn tokenize_cloze_with_particles(text: &str) -> Vec<RenderToken> {
    let mut tokens = Vec::new();
    let mut run = String::new();

    let flush = |run: &mut String, tokens: &mut Vec<RenderToken>| {
        if run.is_empty() {
            return;
        }
        for seg in tokenize_particles(run) {
            tokens.push(RenderToken {
                text: seg.text,
                is_particle: seg.is_particle,
                is_blank: false,
            });
        }
        run.clear();
    };

    for seg in tokenize_cloze(text) {
        if seg.is_blank {
            flush(&mut run, &mut tokens);
            tokens.push(RenderToken {
                text: seg.text,
                is_particle: false,
                is_blank: true,
            });
        } else {
            run.push_str(&seg.text);
        }
    }
    flush(&mut run, &mut tokens);
    tokens
}
