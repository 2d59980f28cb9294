//! Batch TF-IDF text similarity between the brand and each candidate.
//!
//! The vocabulary and document frequencies are fitted once over every text in
//! the run (brand plus all scored candidates), then each candidate vector is
//! compared to the brand vector with cosine similarity.
//!
//! Tokenization is case-insensitive and does not rely on whitespace alone:
//! Latin-style scripts split on non-alphanumeric characters, while scripts
//! written without word separators (Thai, Lao, Khmer, Myanmar, CJK) are cut
//! into overlapping character bigrams.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{clamp01, BrandProfile};

/// Sorted so lookups can binary search.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself",
    "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Times each brand target keyword is appended to the brand document.
    pub keyword_boost: usize,
    /// Drop common English function words from word tokens.
    pub stop_words: bool,
    /// Minimum length, in characters, of a word token.
    pub min_token_chars: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            keyword_boost: 1,
            stop_words: true,
            min_token_chars: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Word,
    Unsegmented,
}

fn classify(ch: char) -> Option<Script> {
    let code = ch as u32;
    let unsegmented = matches!(
        code,
        0x0E00..=0x0E7F     // Thai
            | 0x0E80..=0x0EFF // Lao
            | 0x1000..=0x109F // Myanmar
            | 0x1780..=0x17FF // Khmer
            | 0x3040..=0x30FF // Hiragana, Katakana
            | 0x3400..=0x4DBF // CJK extension A
            | 0x4E00..=0x9FFF // CJK unified
    );
    if unsegmented {
        Some(Script::Unsegmented)
    } else if ch.is_alphanumeric() {
        Some(Script::Word)
    } else {
        None
    }
}

/// Nonspacing and spacing combining marks that `is_alphanumeric` rejects,
/// such as the Devanagari virama or a decomposed acute accent. They belong
/// to the letter before them.
fn is_combining_mark(ch: char) -> bool {
    let code = ch as u32;
    match code {
        0x0300..=0x036F     // combining diacritical marks
            | 0x0483..=0x0489 // Cyrillic
            | 0x0591..=0x05BD // Hebrew points
            | 0x064B..=0x065F // Arabic harakat
            | 0x1AB0..=0x1AFF
            | 0x1DC0..=0x1DFF
            | 0x200C..=0x200D // zero-width (non-)joiner
            | 0x20D0..=0x20FF
            | 0xFE20..=0xFE2F => true,
        // Indic blocks, Devanagari through Malayalam and Sinhala. Dandas and
        // abbreviation signs are punctuation and still end the word.
        0x0900..=0x0DFF => !ch.is_alphanumeric() && !matches!(code, 0x0964 | 0x0965 | 0x0970 | 0x0DF4),
        _ => false,
    }
}

pub fn tokenize(text: &str, config: &SimilarityConfig) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut run: Vec<char> = Vec::new();
    let mut run_script = Script::Word;

    for ch in text.chars().flat_map(char::to_lowercase) {
        match classify(ch) {
            Some(script) => {
                if script != run_script && !run.is_empty() {
                    flush_run(&mut run, run_script, config, &mut tokens);
                }
                run_script = script;
                run.push(ch);
            }
            None if run_script == Script::Word && !run.is_empty() && is_combining_mark(ch) => {
                run.push(ch);
            }
            None => flush_run(&mut run, run_script, config, &mut tokens),
        }
    }
    flush_run(&mut run, run_script, config, &mut tokens);

    tokens
}

fn flush_run(run: &mut Vec<char>, script: Script, config: &SimilarityConfig, out: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    match script {
        Script::Word => {
            if run.len() >= config.min_token_chars {
                let word: String = run.iter().collect();
                if !(config.stop_words && is_stop_word(&word)) {
                    out.push(word);
                }
            }
        }
        Script::Unsegmented => {
            if run.len() == 1 {
                out.push(run[0].to_string());
            } else {
                out.extend(run.windows(2).map(|pair| pair.iter().collect::<String>()));
            }
        }
    }
    run.clear();
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// L2-normalised TF-IDF weights keyed by term. Ordered so that every sum
/// over a vector runs in the same order regardless of input order.
pub type TermVector = BTreeMap<String, f64>;

#[derive(Debug, Clone)]
pub struct TfIdfSpace {
    idf: BTreeMap<String, f64>,
}

impl TfIdfSpace {
    /// Smoothed inverse document frequency: `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        let mut document_count = 0usize;

        for tokens in documents {
            document_count += 1;
            let unique: BTreeSet<&String> = tokens.iter().collect();
            for term in unique {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let n = document_count as f64;
        let idf = document_frequency
            .into_iter()
            .map(|(term, df)| {
                let weight = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term, weight)
            })
            .collect();

        Self { idf }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Terms outside the fitted vocabulary are ignored.
    pub fn vectorize(&self, tokens: &[String]) -> TermVector {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for token in tokens {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let mut vector: TermVector = counts
            .into_iter()
            .filter_map(|(term, count)| {
                self.idf
                    .get(term)
                    .map(|idf| (term.to_string(), count as f64 * idf))
            })
            .collect();

        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

/// Cosine similarity of two normalised term vectors, in [0, 1].
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
        .sum();
    clamp01(dot)
}

#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    space: TfIdfSpace,
    brand_vector: TermVector,
}

impl SimilarityScorer {
    /// Fits the batch vocabulary over the brand document and every candidate
    /// document, then caches the brand vector.
    pub fn fit(brand_tokens: &[String], candidate_tokens: &[Vec<String>]) -> Self {
        let documents = std::iter::once(brand_tokens).chain(candidate_tokens.iter().map(Vec::as_slice));
        let space = TfIdfSpace::fit(documents);
        let brand_vector = space.vectorize(brand_tokens);
        Self {
            space,
            brand_vector,
        }
    }

    pub fn brand_has_content(&self) -> bool {
        !self.brand_vector.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.space.vocabulary_size()
    }

    pub fn score(&self, candidate_tokens: &[String]) -> f64 {
        let candidate_vector = self.space.vectorize(candidate_tokens);
        cosine_similarity(&self.brand_vector, &candidate_vector)
    }
}

/// Brand document: the description followed by keywords and key themes,
/// each repeated `keyword_boost` times.
pub fn brand_tokens(brand: &BrandProfile, config: &SimilarityConfig) -> Vec<String> {
    let mut tokens = tokenize(&brand.description_text, config);
    let terms = brand.target_keywords.iter().chain(brand.key_themes.iter());
    for _ in 0..config.keyword_boost {
        for term in terms.clone() {
            tokens.extend(tokenize(term, config));
        }
    }
    tokens
}
