/*!
 * Offline entity recognizer.
 *
 * Picks out the spans most likely to survive translation unchanged:
 * - Numerals (`2024`, `3.5`, `10:30`)
 * - Capitalized word runs and acronyms in cased scripts (`John Smith`, `NASA`)
 * - Capitalized Latin-script runs inside caseless scripts (`我在Google工作`)
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{EntityRecognizer, EntitySet};

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]+(?:[.,:][0-9]+)*").unwrap()
});

// Acronyms, or capitalized words chained by whitespace, in a cased script
static CASED_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\p{Lu}{2,}|\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)*)\b").unwrap()
});

// Latin runs that start uppercase; no word boundaries since CJK letters are word characters too
static EMBEDDED_LATIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Latin}&&\p{Lu}][\p{Latin}]*(?:\s+[\p{Latin}&&\p{Lu}][\p{Latin}]*)*").unwrap()
});

const ENGLISH_STOP_WORDS: &[&str] = &[
    "I", "The", "A", "An", "This", "That", "These", "Those", "It", "He", "She", "They",
    "We", "You", "My", "Your", "His", "Her", "Our", "Their", "What", "Who", "Where",
    "When", "Why", "How", "Yes", "No", "Oh", "Ah", "Hey", "Well", "Now", "Then", "Here",
    "There", "Please", "Thank", "Thanks", "Sorry", "Hello", "Hi", "Goodbye", "Bye",
    "Mr", "Mrs", "Ms", "Dr", "Sir", "OK", "Okay", "And", "But", "So", "If", "Is", "Are",
    "Do", "Don", "Did", "Can", "Let", "Come", "Look", "Wait", "Good", "Just",
];

const FRENCH_STOP_WORDS: &[&str] = &[
    "Je", "Tu", "Il", "Elle", "Nous", "Vous", "Ils", "Elles", "Le", "La", "Les", "Un", "Une",
    "Des", "Ce", "Cette", "Mais", "Et", "Oui", "Non", "Bonjour", "Salut", "Merci", "Quoi",
    "Qui", "Comment", "Pourquoi", "Est", "Allez", "Alors", "Monsieur", "Madame",
];

const GERMAN_STOP_WORDS: &[&str] = &[
    "Ich", "Du", "Er", "Sie", "Es", "Wir", "Ihr", "Der", "Die", "Das", "Ein", "Eine",
    "Und", "Aber", "Ja", "Nein", "Hallo", "Danke", "Was", "Wer", "Wie", "Warum", "Wo",
    "Herr", "Frau", "Gut", "Nun", "Also",
];

const SPANISH_STOP_WORDS: &[&str] = &[
    "Yo", "Tú", "Él", "Ella", "Nosotros", "Ellos", "El", "La", "Los", "Las", "Un", "Una",
    "Pero", "Sí", "No", "Hola", "Gracias", "Qué", "Quién", "Cómo", "Por", "Señor", "Señora",
    "Bueno", "Vamos",
];

/// Regex-based recognizer configured for one language
#[derive(Debug, Clone)]
pub struct HeuristicEntityRecognizer {
    cased: bool,
    stop_words: HashSet<&'static str>,
}

impl HeuristicEntityRecognizer {
    /// Create a recognizer suited to the script and stop words of a language
    pub fn for_language(language: &str) -> Self {
        let part2t = language_utils::normalize_to_part2t(language).unwrap_or_default();
        let stop_words: &[&str] = match part2t.as_str() {
            "eng" => ENGLISH_STOP_WORDS,
            "fra" => FRENCH_STOP_WORDS,
            "deu" => GERMAN_STOP_WORDS,
            "spa" => SPANISH_STOP_WORDS,
            _ => &[],
        };

        Self {
            cased: language_utils::uses_letter_case(language),
            stop_words: stop_words.iter().copied().collect(),
        }
    }

    /// Extract entities synchronously
    pub fn extract(&self, text: &str) -> EntitySet {
        let mut entities: EntitySet = NUMBER_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();

        let name_pattern = if self.cased { &*CASED_NAME_PATTERN } else { &*EMBEDDED_LATIN_PATTERN };

        for candidate in name_pattern.find_iter(text) {
            if let Some(name) = self.strip_stop_words(candidate.as_str()) {
                entities.insert(name);
            }
        }

        entities
    }

    // Drop leading function words: "Hello John" -> "John", "The" -> nothing
    fn strip_stop_words(&self, run: &str) -> Option<String> {
        let words: Vec<&str> = run.split_whitespace().collect();
        let first_kept = words.iter().position(|w| !self.stop_words.contains(w))?;
        Some(words[first_kept..].join(" "))
    }
}

#[async_trait]
impl EntityRecognizer for HeuristicEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<EntitySet, ProviderError> {
        Ok(self.extract(text))
    }
}
