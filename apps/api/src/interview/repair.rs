//! Repair normalizer — turns raw grader output into a structured grade.
//!
//! A layered pipeline of fallible transforms rather than nested error
//! handling: strict parse → syntactic repair → one remote repair round-trip
//! → malformed. Each stage is independently testable, and the attempt number
//! of the stage that succeeded is recorded on the answer.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::grading::GradingClient;

/// Attempt budget: strict parse (1), syntactic repair (2), remote repair (3).
pub const MAX_ATTEMPTS: u32 = 3;

/// Scores just outside [0,100] are rounded in; anything beyond this band is
/// a parse failure, not a value to clamp.
const SCORE_BAND_MIN: f64 = -1.0;
const SCORE_BAND_MAX: f64 = 101.0;

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("Grader output unusable after {attempts} attempts")]
    Malformed { attempts: u32 },
}

/// A successfully normalized grade.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub score: u32,
    pub feedback: String,
}

/// Wire shape the grader is instructed to produce.
#[derive(Debug, Deserialize)]
struct RawGrade {
    score: f64,
    feedback: Option<String>,
}

/// Runs the full pipeline. Returns the grade plus the attempt number that
/// produced it. Issues at most one remote call.
pub async fn normalize(grader: &dyn GradingClient, raw: &str) -> Result<(Grade, u32), RepairError> {
    if let Some(grade) = parse_strict(raw) {
        return Ok((grade, 1));
    }

    let repaired = repair_syntactic(raw);
    if let Some(grade) = parse_strict(&repaired) {
        return Ok((grade, 2));
    }

    match grader.repair(raw).await {
        Ok(remote) => {
            if let Some(grade) = parse_strict(&remote) {
                return Ok((grade, 3));
            }
            if let Some(grade) = parse_strict(&repair_syntactic(&remote)) {
                return Ok((grade, 3));
            }
            Err(RepairError::Malformed {
                attempts: MAX_ATTEMPTS,
            })
        }
        Err(e) => {
            warn!("Remote repair call failed: {e}");
            Err(RepairError::Malformed {
                attempts: MAX_ATTEMPTS,
            })
        }
    }
}

/// Strict parse of one grade object. Scores must be finite and within the
/// tolerance band; accepted values are rounded and clamped into [0,100].
fn parse_strict(text: &str) -> Option<Grade> {
    let raw: RawGrade = serde_json::from_str(text.trim()).ok()?;
    if !raw.score.is_finite() || raw.score < SCORE_BAND_MIN || raw.score > SCORE_BAND_MAX {
        return None;
    }
    let score = raw.score.round().clamp(0.0, 100.0) as u32;
    Some(Grade {
        score,
        feedback: raw.feedback.unwrap_or_default(),
    })
}

/// Syntactic repair pass: strip Markdown fences, cut down to the first
/// brace-balanced object, drop trailing prose, close unterminated strings
/// and braces.
pub fn repair_syntactic(text: &str) -> String {
    let stripped = strip_code_fences(text);
    let object = extract_object(stripped);
    balance_delimiters(object)
}

/// Strips ```json ... ``` or ``` ... ``` fences, tolerating prose before the
/// opening fence and after the closing one.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    // Skip an optional language tag up to the end of its line.
    let body = match after_open.find('\n') {
        Some(nl) if after_open[..nl].chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after_open[nl + 1..]
        }
        _ => after_open,
    };
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Returns the first brace-balanced JSON object in `text`, or everything
/// from the first `{` onward when the object never closes (the balancing
/// pass finishes it). String-aware: braces inside quoted values are ignored.
fn extract_object(text: &str) -> &str {
    let Some(start) = text.find('{') else {
        return text.trim();
    };
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return &text[start..=i];
                }
            }
            _ => {}
        }
    }
    &text[start..]
}

/// Appends the closers a truncated object is missing: an unterminated string
/// gets its quote, then open braces/brackets are closed innermost-first.
fn balance_delimiters(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                stack.pop();
            }
            _ => {}
        }
    }
    let mut out = text.trim_end().to_string();
    if in_string {
        out.push('"');
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}
