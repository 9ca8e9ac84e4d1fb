use super::language::{classify, normalize_language, LanguageClass};

/// Compute the weighted character cost for a request.
///
/// High-resource languages are charged at a configured multiplier
/// (fractional results truncate toward zero); everything else is
/// charged at face value. The result is computed once at admission and
/// frozen into the job and its usage record.
pub fn weighted_cost(char_count: usize, language: &str, high_cost_multiplier: f64) -> i64 {
    let lang = normalize_language(language);
    match classify(&lang) {
        LanguageClass::HighResource => (char_count as f64 * high_cost_multiplier) as i64,
        LanguageClass::Standard => char_count as i64,
    }
}
