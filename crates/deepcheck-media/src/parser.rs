//! Strict decoding of the model's free-text answer into an [`AnalysisResult`].

use serde::Deserialize;
use serde_json::Value;

use deepcheck_types::{AnalysisResult, RiskLevel};

use crate::error::ParseError;

#[derive(Deserialize)]
struct RawAnalysis {
    authenticity_score: Value,
    risk_level: String,
    explanation: String,
}

/// Extract the first balanced `{ ... }` object from `text`, decode and validate it.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, ParseError> {
    let object = first_json_object(text).ok_or(ParseError::NoObject)?;
    let raw: RawAnalysis = serde_json::from_str(object)?;

    let score = match raw.authenticity_score.as_i64() {
        Some(n) => n,
        None => return Err(ParseError::ScoreNotInteger(raw.authenticity_score)),
    };
    let authenticity_score = u8::try_from(score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or(ParseError::ScoreOutOfRange(score))?;

    let risk_level = RiskLevel::from_literal(&raw.risk_level)
        .ok_or(ParseError::UnknownRiskLevel(raw.risk_level))?;

    if raw.explanation.trim().is_empty() {
        return Err(ParseError::EmptyExplanation);
    }

    Ok(AnalysisResult {
        authenticity_score,
        risk_level,
        explanation: raw.explanation,
    })
}

/// Slice from the first `{` to the `}` that closes it.
///
/// Braces inside JSON string literals are skipped. Returns `None` when no
/// opening brace exists or it is never closed.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
