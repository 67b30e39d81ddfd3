use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalises a description into a history lookup key: lowercase, diacritics
/// stripped, whitespace collapsed and trimmed. "  Padaria  São João " and
/// "PADARIA SAO JOAO" share the key "padaria sao joao".
pub fn normalize_description(s: &str) -> String {
    let folded: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
