//! Program parser and validator
//!
//! Validation order matters: the first failing rule wins, and nothing is
//! returned unless the whole program is accepted.

use super::{Action, InvalidCode, LaneDir, Program};
use crate::consts::{DEFAULT_SPEED, MAX_ACTIONS, MAX_PROGRAM_CHARS, SPEED_MAX, SPEED_MIN};

/// One element of a whitespace-tolerant pattern
#[derive(Debug, Clone, Copy)]
enum Tok {
    /// Literal text (matched against lower-cased input)
    Lit(&'static str),
    /// Any single byte from the set
    OneOf(&'static [u8]),
    /// Unsigned decimal: `\d+(\.\d+)?`
    Num,
}

/// Token sequence with optional whitespace between tokens
struct Pattern {
    name: &'static str,
    /// Require a word boundary before the first token
    boundary: bool,
    toks: &'static [Tok],
}

const LOOP_PATTERNS: &[Pattern] = &[
    Pattern {
        name: "while(true)",
        boundary: false,
        toks: &[Tok::Lit("while"), Tok::Lit("("), Tok::Lit("true"), Tok::Lit(")")],
    },
    Pattern {
        name: "for(;;)",
        boundary: false,
        toks: &[Tok::Lit("for"), Tok::Lit("("), Tok::Lit(";"), Tok::Lit(";"), Tok::Lit(")")],
    },
    Pattern {
        name: "repeat forever",
        boundary: false,
        toks: &[Tok::Lit("repeat"), Tok::Lit("forever")],
    },
    Pattern {
        name: "loop forever",
        boundary: false,
        toks: &[Tok::Lit("loop"), Tok::Lit("forever")],
    },
];

const SPEED_PATTERNS: &[Pattern] = &[
    Pattern {
        name: "speed=",
        boundary: true,
        toks: &[Tok::Lit("speed"), Tok::OneOf(b":="), Tok::Num],
    },
    Pattern {
        name: "set speed()",
        boundary: true,
        toks: &[Tok::Lit("set"), Tok::Lit("speed"), Tok::Lit("("), Tok::Num, Tok::Lit(")")],
    },
    Pattern {
        name: "setSpeed()",
        boundary: true,
        toks: &[Tok::Lit("setspeed"), Tok::Lit("("), Tok::Num, Tok::Lit(")")],
    },
];

const ATTACK_WORDS: &[&str] = &["attack", "shoot", "hit"];
const BOOST_WORDS: &[&str] = &["forward", "boost", "accelerate"];
const BRAKE_WORDS: &[&str] = &["back", "brake", "slow"];

/// Parse and validate a player program
pub fn parse_program(code: &str) -> Result<Program, InvalidCode> {
    let chars = code.chars().count();
    if chars > MAX_PROGRAM_CHARS {
        return Err(InvalidCode::TooLong {
            chars,
            max: MAX_PROGRAM_CHARS,
        });
    }

    // ASCII lowering keeps byte offsets stable for the scanner
    let lowered = code.to_ascii_lowercase();
    let bytes = lowered.as_bytes();

    if let Some(pattern) = LOOP_PATTERNS.iter().find(|p| find_pattern(bytes, p).is_some()) {
        return Err(InvalidCode::InfiniteLoop {
            pattern: pattern.name.to_string(),
        });
    }

    let speed = extract_speed(bytes).unwrap_or(DEFAULT_SPEED);

    let actions: Vec<Action> = code
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(line_action)
        .collect();

    if actions.is_empty() && code.to_lowercase().contains("if") {
        return Err(InvalidCode::UnsupportedConditional);
    }

    if actions.len() > MAX_ACTIONS {
        return Err(InvalidCode::TooManyActions {
            count: actions.len(),
            max: MAX_ACTIONS,
        });
    }

    Ok(Program { speed, actions })
}

/// Keyword lookup for a single trimmed line
fn line_action(line: &str) -> Option<Action> {
    let l = line.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| l.contains(w));

    if l.contains("left") {
        Some(Action::Lane(LaneDir::Left))
    } else if l.contains("right") {
        Some(Action::Lane(LaneDir::Right))
    } else if has_any(ATTACK_WORDS) {
        Some(Action::Attack)
    } else if has_any(BOOST_WORDS) {
        Some(Action::Boost)
    } else if has_any(BRAKE_WORDS) {
        Some(Action::Brake)
    } else {
        None
    }
}

/// First speed override, clamped. Non-finite values are ignored.
fn extract_speed(bytes: &[u8]) -> Option<f32> {
    SPEED_PATTERNS
        .iter()
        .find_map(|p| find_pattern(bytes, p).flatten())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(SPEED_MIN, SPEED_MAX))
}

/// Leftmost match of a pattern. The inner option is the captured number, if any.
fn find_pattern(bytes: &[u8], pattern: &Pattern) -> Option<Option<f32>> {
    (0..bytes.len()).find_map(|start| {
        if pattern.boundary && start > 0 && is_word_byte(bytes[start - 1]) {
            return None;
        }
        match_at(bytes, start, pattern.toks)
    })
}

fn match_at(bytes: &[u8], start: usize, toks: &[Tok]) -> Option<Option<f32>> {
    let mut pos = start;
    let mut captured = None;

    for (i, tok) in toks.iter().enumerate() {
        if i > 0 {
            pos = skip_ws(bytes, pos);
        }
        match *tok {
            Tok::Lit(lit) => {
                if !bytes[pos..].starts_with(lit.as_bytes()) {
                    return None;
                }
                pos += lit.len();
            }
            Tok::OneOf(set) => {
                let b = *bytes.get(pos)?;
                if !set.contains(&b) {
                    return None;
                }
                pos += 1;
            }
            Tok::Num => {
                let (value, end) = scan_number(bytes, pos)?;
                captured = Some(value);
                pos = end;
            }
        }
    }

    Some(captured)
}

fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// `\d+(\.\d+)?` starting at `pos`
fn scan_number(bytes: &[u8], pos: usize) -> Option<(f32, usize)> {
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let int_len = digits(pos);
    if int_len == 0 {
        return None;
    }
    let mut end = pos + int_len;

    if bytes.get(end) == Some(&b'.') {
        let frac_len = digits(end + 1);
        if frac_len > 0 {
            end += 1 + frac_len;
        }
    }

    // Slice is pure ASCII digits and at most one dot
    let text = std::str::from_utf8(&bytes[pos..end]).ok()?;
    let value = text.parse::<f32>().ok()?;
    Some((value, end))
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
