//! Fixed instruction sent to the multimodal model.

const ANALYSIS_PROMPT: &str = "\
Analyze this media for deepfake manipulation.
Check for:
- Face distortion
- Frame blending artifacts
- Lip sync mismatch
- Audio irregularities
- Temporal inconsistencies

Return ONLY structured JSON:
{
  \"authenticity_score\": number (0-100),
  \"risk_level\": \"Low\" | \"Medium\" | \"High\",
  \"explanation\": \"start verification reason with 'Based on ...'\"
}
";

/// The analysis instruction. Constant across requests.
pub fn analysis_prompt() -> &'static str {
    ANALYSIS_PROMPT
}
