/// Languages routed through the high-fidelity synthesis path.
///
/// These require the large Indic model served by the distributed worker
/// pool; everything else is cheap enough to synthesize in-process.
pub const HIGH_RESOURCE_LANGUAGES: &[&str] = &[
    "hi", "bn", "ta", "te", "mr", "gu", "kn", "ml", "pa", "or", "as", "ur", "sa", "ks", "ne",
    "sd", "bo", "doi", "kok", "mai", "mni", "sat",
];

/// Synthesis routing class for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageClass {
    /// Needs the high-fidelity, high-latency engine (distributed queue).
    HighResource,
    /// Acceptable to run on the fast in-process engine.
    Standard,
}

/// Normalize a language code: trim, lowercase, strip region/script
/// suffixes (`hi-IN` -> `hi`), and map common language names to codes
/// (`Hindi` -> `hi`). Empty input defaults to English.
pub fn normalize_language(raw: &str) -> String {
    let lang = raw.trim().to_lowercase();
    if lang.is_empty() {
        return "en".to_string();
    }

    let base = lang
        .split(['-', '_'])
        .next()
        .unwrap_or(&lang)
        .to_string();

    match base.as_str() {
        "hindi" => "hi",
        "bengali" => "bn",
        "tamil" => "ta",
        "telugu" => "te",
        "marathi" => "mr",
        "gujarati" => "gu",
        "kannada" => "kn",
        "malayalam" => "ml",
        "punjabi" => "pa",
        "urdu" => "ur",
        "english" => "en",
        other => other,
    }
    .to_string()
}

/// Classify a normalized language code into its routing class.
pub fn classify(lang: &str) -> LanguageClass {
    if HIGH_RESOURCE_LANGUAGES.contains(&lang) {
        LanguageClass::HighResource
    } else {
        LanguageClass::Standard
    }
}
