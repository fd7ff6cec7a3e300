//! Language packs for answer generation.
//!
//! A [`Language`] bundles everything that must agree on one target
//! language: the instruction template sent to the model, the fixed
//! "no information" answer, the uncertainty phrases the validator looks
//! for, and the warning appended to low-confidence answers.

use serde::Deserialize;

use crate::models::Document;

/// Target language of generated answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "ru", alias = "russian")]
    Russian,
}

const EN_UNCERTAINTY: &[&str] = &[
    "i don't know",
    "not found",
    "no information",
    "not sure",
    "i cannot",
    "i can't",
    "sorry",
];

const RU_UNCERTAINTY: &[&str] = &[
    "не знаю",
    "не найдено",
    "нет информации",
    "не уверен",
    "не могу",
    "извините",
];

impl Language {
    /// Answer returned when retrieval produced no documents.
    pub fn no_information_answer(&self) -> &'static str {
        match self {
            Language::English => "Sorry, my knowledge base has no information on this question.",
            Language::Russian => "Извините, в моей базе знаний нет информации по этому вопросу.",
        }
    }

    /// Lowercase phrases that mark an answer as uncertain.
    pub fn uncertainty_phrases(&self) -> &'static [&'static str] {
        match self {
            Language::English => EN_UNCERTAINTY,
            Language::Russian => RU_UNCERTAINTY,
        }
    }

    /// Suffix appended to answers downgraded to low confidence.
    pub fn warning_suffix(&self) -> &'static str {
        match self {
            Language::English => {
                "\n\n⚠️ Note: the answer may be incomplete or require verification."
            }
            Language::Russian => {
                "\n\n⚠️ Примечание: Ответ может быть неполным или требовать проверки."
            }
        }
    }

    /// Build the grounded-answer prompt for `question` over `context`.
    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        match self {
            Language::English => format!(
                r#"You are a helpful AI assistant. Answer the user's question based on the provided context.

Context:
{context}

Question: {question}

Answer requirements:
- Be accurate and informative
- Use only information from the context
- If the information is insufficient, say so
- The answer must be in English

Answer:"#
            ),
            Language::Russian => format!(
                r#"Ты - полезный AI-ассистент. Ответь на вопрос пользователя на основе предоставленного контекста.

Контекст:
{context}

Вопрос: {question}

Требования к ответу:
- Будь точным и информативным
- Используй только информацию из контекста
- Если информации недостаточно, скажи об этом
- Ответ должен быть на русском языке

Ответ:"#
            ),
        }
    }
}

/// Join document contents into one context block, in rank order.
pub fn build_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(Document::content)
        .collect::<Vec<_>>()
        .join("\n\n")
}
