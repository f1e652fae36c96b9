//! Address and zone-name normalization.
//!
//! Customer-provided text and operator-configured zone names both pass
//! through [`normalize`] before any comparison or cache lookup, so matching
//! is insensitive to case, accents, punctuation, and the common Brazilian
//! street-type abbreviations.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Street-type abbreviations expanded to their full words.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("r", "rua"),
    ("av", "avenida"),
    ("al", "alameda"),
    ("tr", "travessa"),
];

/// Standalone tokens dropped entirely: house-number markers (`nº 123`) and
/// the filler preposition in forms like "no Centro".
const DROPPED_TOKENS: &[&str] = &["n", "no"];

/// An address or zone-name string in canonical comparison form.
///
/// Produced only by [`normalize`]; used as the match key for zone lookups and
/// as the cache key for geocoded addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    /// The normalized text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization left nothing to match on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the wrapper.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for NormalizedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for NormalizedAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize free-text addresses and zone names for comparison.
///
/// Lowercases, folds accented characters to their base letters, maps
/// punctuation to spaces, collapses whitespace, expands street-type
/// abbreviations, and drops house-number markers. Idempotent: normalizing
/// already-normalized text returns it unchanged.
#[must_use]
pub fn normalize(input: &str) -> NormalizedAddress {
    let mut cleaned = String::with_capacity(input.len());

    for c in input.trim().chars() {
        // Ordinal indicators survive `is_alphanumeric`, but "nº" must become
        // a bare "n" so the marker token can be dropped below.
        if matches!(c, 'º' | 'ª' | '°') {
            cleaned.push(' ');
            continue;
        }

        for lower in c.to_lowercase() {
            let folded = fold_diacritic(lower);
            if folded.is_alphanumeric() {
                cleaned.push(folded);
            } else {
                cleaned.push(' ');
            }
        }
    }

    let mut out = String::with_capacity(cleaned.len());

    for token in cleaned.split_whitespace() {
        if DROPPED_TOKENS.contains(&token) {
            continue;
        }

        let expanded = ABBREVIATIONS
            .iter()
            .find(|(short, _)| *short == token)
            .map_or(token, |(_, full)| *full);

        if !out.is_empty() {
            out.push(' ');
        }

        out.push_str(expanded);
    }

    NormalizedAddress(out)
}

/// Fold the accented characters common in Brazilian addresses.
const fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize("  Centro  ").as_str(), "centro");
    }

    #[test]
    fn folds_accented_characters() {
        assert_eq!(normalize("São João").as_str(), "sao joao");
        assert_eq!(normalize("Conceição").as_str(), "conceicao");
    }

    #[test]
    fn maps_punctuation_to_spaces_and_collapses_whitespace() {
        assert_eq!(
            normalize("Rua   Sete de Setembro,140").as_str(),
            "rua sete de setembro 140"
        );
    }

    #[test]
    fn expands_street_type_abbreviations() {
        assert_eq!(
            normalize("R. Sete de Setembro, 140").as_str(),
            "rua sete de setembro 140"
        );
        assert_eq!(normalize("Av Paulista 1000").as_str(), "avenida paulista 1000");
    }

    #[test]
    fn drops_house_number_markers() {
        assert_eq!(normalize("Rua Nova nº 123").as_str(), "rua nova 123");
        assert_eq!(normalize("Rua Nova n° 123").as_str(), "rua nova 123");
    }

    #[test]
    fn whole_word_abbreviations_only() {
        // "Travessa" must not be re-expanded, nor "Alvorada" mistaken for "al".
        assert_eq!(normalize("Travessa Alvorada").as_str(), "travessa alvorada");
    }

    #[test]
    fn empty_and_symbol_only_input_normalizes_to_empty() {
        assert!(normalize("").is_empty());
        assert!(normalize("  ,,, !!! ").is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "  Centro  ",
            "São João",
            "R. Sete de Setembro, 140",
            "Av Paulista, nº 1000 - Bela Vista",
            "Jardim das Acácias",
            "no bairro Centro",
        ];

        for sample in samples {
            let once = normalize(sample);
            let twice = normalize(once.as_str());

            assert_eq!(once, twice, "normalize must be idempotent for {sample:?}");
        }
    }
}
