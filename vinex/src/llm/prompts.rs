//! Prompt templates for the generator
//!
//! Templates use plain `format!()` interpolation. Every prompt asks for a
//! bare JSON object; what actually comes back still goes through
//! [`crate::recovery::recover`].

use crate::recovery::schemas::{language_name, VIN_FIELD_KEYS};

pub const VIN_SYSTEM_PROMPT: &str = "You are a precise OCR extraction model.";

pub const TRANSLATION_SYSTEM_PROMPT: &str = "You are a professional translator. Always return valid JSON with language codes as keys and translated text as values. Do not include any explanations or markdown formatting.";

pub const CONSIGNEE_SYSTEM_PROMPT: &str =
    "You generate localized consignee data in English using Latin alphabet.";

/// Prompt sent alongside an enhanced registration document image.
///
/// # Example
/// ```
/// use vinex::llm::prompts::vin_extraction_prompt;
///
/// let prompt = vin_extraction_prompt();
/// assert!(prompt.contains("\"manufacture_date\""));
/// ```
pub fn vin_extraction_prompt() -> String {
    let fields = VIN_FIELD_KEYS
        .iter()
        .map(|key| format!("    \"{key}\": \"...\""))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"You are an OCR assistant. Analyze the uploaded car registration or inspection image.
Extract and return JSON with fields:
{{
{fields}
}}
Use null for any field that is not visible in the image.
Return ONLY valid JSON, no markdown or explanations."#
    )
}

fn describe(code: &str) -> String {
    match language_name(code) {
        Some(name) => format!("{code} ({name})"),
        None => code.to_string(),
    }
}

/// Translate `text` from `source` into each of `targets`.
///
/// # Example
/// ```
/// use vinex::llm::prompts::translation_prompt;
///
/// let prompt = translation_prompt("ru", "Мерседес", &["en".to_string(), "ko".to_string()]);
/// assert!(prompt.contains("en (English), ko (Korean)"));
/// ```
pub fn translation_prompt(source: &str, text: &str, targets: &[String]) -> String {
    let source_name = language_name(source).unwrap_or(source);
    let target_languages = targets
        .iter()
        .map(|code| describe(code))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Translate the following text from {source_name} to the specified target languages.

Source text: "{text}"
Source language: {source_description}
Target languages: {target_languages}

Requirements:
- Output must be in pure JSON format (no explanations, no markdown, no code blocks).
- Return a JSON object where keys are language codes and values are the translated text.
- Ensure translations are accurate and natural for each target language.
- Preserve proper names and brand names when appropriate (e.g., "Mercedes" may remain "Mercedes" in some languages).
- For languages that use different scripts (Cyrillic, Latin, Hangul), use the appropriate script.

Example output format:
{{
  "en": "Mercedes",
  "uz": "Mercedes",
  "kz": "Мерседес",
  "ko": "메르세데스"
}}

Return ONLY the JSON object, nothing else."#,
        source_description = describe(source),
    )
}

/// Ask for one plausible consignee name and address for `country`.
pub fn consignee_prompt(country: &str) -> String {
    format!(
        r#"Generate one realistic consignee record for {country}.
Requirements:
- Output must be in English (default language).
- Use only Latin alphabet, no Cyrillic or special characters.
- Return ONLY valid JSON with these two fields:
  {{
    "consignee_name": "...",
    "consignee_address": "..."
  }}
- The name and address should look natural for {country} (e.g., common local person name
  and city/street transliterated into English).
- Do not include explanations or any text outside the JSON object."#
    )
}
