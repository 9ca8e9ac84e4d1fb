use serde::{Deserialize, Serialize};

/// One entry in the voice catalog clients pick `voice_id` from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    pub language: String,
    pub gender: String,
    pub accent: String,
    pub preview_url: Option<String>,
}

/// Display names for the high-resource language set, in catalog order.
const INDIC_LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("mr", "Marathi"),
    ("gu", "Gujarati"),
    ("kn", "Kannada"),
    ("ml", "Malayalam"),
    ("pa", "Punjabi"),
    ("or", "Odia"),
    ("as", "Assamese"),
    ("ur", "Urdu"),
    ("sa", "Sanskrit"),
    ("ks", "Kashmiri"),
    ("ne", "Nepali"),
    ("sd", "Sindhi"),
    ("bo", "Bodo"),
    ("doi", "Dogri"),
    ("kok", "Konkani"),
    ("mai", "Maithili"),
    ("mni", "Manipuri"),
    ("sat", "Santali"),
];

const STANDARD_VOICES: &[(&str, &str, &str)] = &[
    ("en_1", "Sky", "female"),
    ("en_2", "Adam", "male"),
    ("en_3", "Bella", "female"),
    ("en_4", "Michael", "male"),
];

/// The full static voice catalog: the standard-engine English presets
/// plus a female and a male voice per high-resource language.
pub fn catalog() -> Vec<Voice> {
    let mut voices = Vec::with_capacity(STANDARD_VOICES.len() + INDIC_LANGUAGE_NAMES.len() * 2);

    for (voice_id, name, gender) in STANDARD_VOICES {
        voices.push(Voice {
            voice_id: (*voice_id).to_string(),
            name: (*name).to_string(),
            language: "en".to_string(),
            gender: (*gender).to_string(),
            accent: "American".to_string(),
            preview_url: None,
        });
    }

    for (code, name) in INDIC_LANGUAGE_NAMES {
        for (slot, gender) in [(1, "female"), (2, "male")] {
            voices.push(Voice {
                voice_id: format!("indic_{code}_{slot}"),
                name: format!(
                    "{name} {}",
                    if gender == "female" { "Female" } else { "Male" }
                ),
                language: (*code).to_string(),
                gender: gender.to_string(),
                accent: "Indian".to_string(),
                preview_url: None,
            });
        }
    }

    voices
}
