//! Locale-aware string collation for sorted queries.
//!
//! Backends with native collation support (MongoDB) receive the [`Collation`] as part of
//! the query; the in-memory backend compares strings with [`Collation::compare`], which
//! orders by base letters first, then accents, then case (lowercase first).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Collation settings carried by sorted queries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Collation {
    /// Locale identifier such as `en`, `de` or `sv`. `simple` means binary ordering.
    pub locale: String,
}

impl Collation {
    pub fn new(locale: impl Into<String>) -> Self {
        Self { locale: locale.into() }
    }

    /// Language part of the locale (`de_DE` and `de-AT` both yield `de`).
    pub fn language(&self) -> &str {
        self.locale
            .split(['_', '-'])
            .next()
            .unwrap_or_default()
    }

    /// Compares two strings under this collation.
    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        let lang = self.language();

        if lang == "simple" {
            return left.cmp(right);
        }

        primary_key(left, lang)
            .cmp(&primary_key(right, lang))
            .then_with(|| secondary_key(left).cmp(&secondary_key(right)))
            .then_with(|| tertiary_key(left).cmp(&tertiary_key(right)))
    }
}

impl Default for Collation {
    fn default() -> Self {
        Self::new("en")
    }
}

fn primary_key(s: &str, lang: &str) -> Vec<u32> {
    s.chars()
        .flat_map(|ch| primary_weights(ch, lang))
        .collect()
}

// Accent level: case folded, diacritics kept.
fn secondary_key(s: &str) -> Vec<char> {
    s.chars()
        .flat_map(char::to_lowercase)
        .collect()
}

// Case level: lowercase sorts before uppercase.
fn tertiary_key(s: &str) -> Vec<(bool, char)> {
    s.chars()
        .map(|ch| (ch.is_uppercase(), ch))
        .collect()
}

// Letters are spaced apart so tailored letters can sort between them.
fn weight(ch: char) -> u32 {
    u32::from(ch) << 8
}

fn lower(ch: char) -> u32 {
    weight(ch.to_lowercase().next().unwrap_or(ch))
}

fn primary_weights(ch: char, lang: &str) -> Vec<u32> {
    match lang {
        "de" => match ch {
            '\u{00E4}' | '\u{00C4}' => vec![weight('a'), weight('e')],
            '\u{00F6}' | '\u{00D6}' => vec![weight('o'), weight('e')],
            '\u{00FC}' | '\u{00DC}' => vec![weight('u'), weight('e')],
            '\u{00DF}' => vec![weight('s'), weight('s')],
            _ => vec![lower(strip_diacritic(ch))],
        },
        "sv" | "fi" => match ch {
            // å, ä, ö sort after z
            '\u{00E5}' | '\u{00C5}' => vec![weight('z') + 1],
            '\u{00E4}' | '\u{00C4}' => vec![weight('z') + 2],
            '\u{00F6}' | '\u{00D6}' => vec![weight('z') + 3],
            _ => vec![lower(strip_diacritic(ch))],
        },
        "es" => match ch {
            '\u{00F1}' | '\u{00D1}' => vec![weight('n') + 1],
            _ => vec![lower(strip_diacritic(ch))],
        },
        _ => vec![lower(strip_diacritic(ch))],
    }
}

/// Maps Latin-1 accented letters to their base letter.
fn strip_diacritic(ch: char) -> char {
    let base = match ch.to_lowercase().next().unwrap_or(ch) {
        '\u{00E0}'..='\u{00E5}' | '\u{00E6}' => 'a',
        '\u{00E7}' => 'c',
        '\u{00E8}'..='\u{00EB}' => 'e',
        '\u{00EC}'..='\u{00EF}' => 'i',
        '\u{00F1}' => 'n',
        '\u{00F2}'..='\u{00F6}' | '\u{00F8}' => 'o',
        '\u{00F9}'..='\u{00FC}' => 'u',
        '\u{00FD}' | '\u{00FF}' => 'y',
        _ => return ch,
    };

    if ch.is_uppercase() {
        base.to_ascii_uppercase()
    } else {
        base
    }
}
