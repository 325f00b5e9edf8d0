/// Qualifiers that mark a prompt as already quality-tuned.
pub const QUALITY_KEYWORDS: [&str; 4] = ["high quality", "professional", "detailed", "4k"];

pub const ENHANCEMENT_SUFFIX: &str = ", high quality, professional, detailed";

pub fn has_quality_keywords(prompt: &str) -> bool {
    let lower = prompt.to_lowercase();
    QUALITY_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Append quality qualifiers unless the prompt already carries one.
///
/// The suffix itself contains the keywords, so `enhance(enhance(p)) == enhance(p)`.
pub fn enhance(prompt: &str) -> String {
    if has_quality_keywords(prompt) {
        prompt.to_string()
    } else {
        format!("{}{}", prompt, ENHANCEMENT_SUFFIX)
    }
}
