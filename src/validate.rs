//! Keyword-based confidence check for generated answers.
//!
//! [`validate_answer`] lowercases the answer and looks for any of the
//! language's uncertainty phrases as a plain substring. A hit downgrades
//! the answer to [`Confidence::Low`] and appends the language's warning
//! suffix; otherwise the answer is labelled [`Confidence::High`].
//!
//! This is a lexical heuristic, not a semantic classifier:
//!
//! - synonyms that are not in the phrase list go unnoticed (false negatives);
//! - a grounded answer that merely quotes a listed phrase, e.g. an answer
//!   about HTTP 404 "not found" responses, is flagged (false positives).

use crate::models::Confidence;
use crate::prompt::Language;

/// Label `answer` and return the (possibly amended) answer text.
pub fn validate_answer(answer: &str, language: Language) -> (Confidence, String) {
    match find_uncertainty(answer, language) {
        Some(_) => (
            Confidence::Low,
            format!("{}{}", answer, language.warning_suffix()),
        ),
        None => (Confidence::High, answer.to_string()),
    }
}

/// First uncertainty phrase contained in `answer`, case-insensitively.
pub fn find_uncertainty(answer: &str, language: Language) -> Option<&'static str> {
    let lowered = answer.to_lowercase();
    language
        .uncertainty_phrases()
        .iter()
        .copied()
        .find(|phrase| lowered.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confident_answer_is_high_and_unchanged() {
        let answer = "Machine learning is a subset of AI.";
        let (confidence, text) = validate_answer(answer, Language::English);
        assert_eq!(confidence, Confidence::High);
        assert_eq!(text, answer);
    }

    #[test]
    fn test_every_phrase_downgrades_in_any_case() {
        for lang in [Language::English, Language::Russian] {
            for phrase in lang.uncertainty_phrases() {
                let answer = format!("Well, {} about that.", phrase.to_uppercase());
                let (confidence, text) = validate_answer(&answer, lang);
                assert_eq!(confidence, Confidence::Low, "phrase {:?}", phrase);
                assert!(text.ends_with(lang.warning_suffix()));
                assert!(text.starts_with(&answer));
            }
        }
    }

    #[test]
    fn test_russian_mixed_case() {
        let (confidence, _) = validate_answer("Я Не Уверен в этом.", Language::Russian);
        assert_eq!(confidence, Confidence::Low);
    }

    #[test]
    fn test_phrases_do_not_cross_languages() {
        let (confidence, _) = validate_answer("Извините, не знаю.", Language::English);
        assert_eq!(confidence, Confidence::High);
    }

    #[test]
    fn test_incidental_phrase_is_a_false_positive() {
        let answer = "A 404 status means the resource was not found on the server.";
        assert_eq!(find_uncertainty(answer, Language::English), Some("not found"));
    }
}
