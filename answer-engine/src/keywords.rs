//! Keyword matching over German question text.
//!
//! The text is lower-cased and split into words (letters incl. umlauts/ß and
//! digits). A single-word stem of at least [`INFIX_MIN_CHARS`] characters
//! matches anywhere inside a word, so compounds are found (`ruhezeit` in
//! `tagesruhezeit`). Stems of [`PREFIX_MIN_CHARS`] characters must start a
//! word; shorter ones (`ehe`, `ahv`) must be the whole word. Multi-word
//! phrases match as substrings of the normalised text.

/// Minimum stem length for matching inside a word.
pub const INFIX_MIN_CHARS: usize = 5;
/// Minimum stem length for matching at the start of a word.
pub const PREFIX_MIN_CHARS: usize = 4;

/// Lower-cased text split into words.
#[derive(Debug, Clone)]
pub struct Tokens {
    normalised: String,
    words: Vec<String>,
}

impl Tokens {
    pub fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words: Vec<String> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            normalised: words.join(" "),
            words,
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Whether `keyword` occurs according to the matching rules above.
    pub fn matches(&self, keyword: &str) -> bool {
        let kw = Tokens::new(keyword);
        match kw.words.as_slice() {
            [] => false,
            [stem] if stem.chars().count() >= INFIX_MIN_CHARS => {
                self.words.iter().any(|w| w.contains(stem.as_str()))
            }
            [stem] if stem.chars().count() >= PREFIX_MIN_CHARS => {
                self.words.iter().any(|w| w.starts_with(stem.as_str()))
            }
            [stem] => self.words.iter().any(|w| w == stem),
            _ => format!(" {} ", self.normalised).contains(&format!(" {} ", kw.normalised)),
        }
    }

    pub fn matches_any<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        keywords.iter().any(|k| self.matches(k.as_ref()))
    }

    pub fn count_matches<S: AsRef<str>>(&self, keywords: &[S]) -> usize {
        keywords.iter().filter(|k| self.matches(k.as_ref())).count()
    }
}
