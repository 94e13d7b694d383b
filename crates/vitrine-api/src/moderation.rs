/// Denylist applied to product submissions. Matching is case-insensitive
/// substring search, so "Cheapest" trips on "cheap".
pub const BANNED_WORDS: &[&str] = &[
    "casino",
    "cryptocurrency",
    "crypto",
    "exchange",
    "cheap",
    "free",
    "scam",
    "police",
    "radar",
    "казино",
    "криптовалюта",
    "крипта",
    "биржа",
    "дешево",
    "бесплатно",
    "обман",
    "полиция",
    "радар",
];

/// First banned word found in `text`, if any. Runs on product creation only.
pub fn find_banned_word(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    BANNED_WORDS.iter().copied().find(|word| lowered.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_passes() {
        assert_eq!(find_banned_word("A perfectly ordinary smartphone"), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(find_banned_word("Visit our CASINO today"), Some("casino"));
        assert_eq!(find_banned_word("CrYpTo wallet"), Some("crypto"));
    }

    #[test]
    fn substrings_count_as_matches() {
        assert_eq!(find_banned_word("the cheapest laptop"), Some("cheap"));
        assert_eq!(find_banned_word("freeform speaker"), Some("free"));
    }

    #[test]
    fn russian_words_are_caught() {
        assert_eq!(find_banned_word("лучшее Казино города"), Some("казино"));
        assert_eq!(find_banned_word("всё Бесплатно"), Some("бесплатно"));
    }

    #[test]
    fn reports_the_offending_word() {
        let hit = find_banned_word("police radar detector").unwrap();
        assert!(hit == "police" || hit == "radar");
    }
}
