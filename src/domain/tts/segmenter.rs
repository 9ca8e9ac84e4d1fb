use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalize raw input text for synthesis.
///
/// Applies canonical Unicode composition (NFC), drops non-printable
/// characters, and collapses whitespace runs: horizontal whitespace
/// becomes a single space, newline runs become a single newline
/// (newlines are kept because they act as sentence delimiters).
pub fn normalize(text: &str) -> String {
    let composed: String = text.nfc().collect();

    let printable: String = composed
        .chars()
        .map(|ch| match ch {
            '\n' | '\r' => '\n',
            c if c.is_whitespace() => ' ',
            c => c,
        })
        .filter(|ch| *ch == '\n' || !ch.is_control())
        .collect();

    let newline_runs = Regex::new(r" *\n[ \n]*").unwrap();
    let collapsed = newline_runs.replace_all(&printable, "\n");
    let space_runs = Regex::new(r" +").unwrap();
    let collapsed = space_runs.replace_all(&collapsed, " ");

    collapsed.trim().to_string()
}

/// Splits normalized text into synthesis-safe chunks for an engine
/// with a bounded context window.
///
/// The budget is measured in characters, not bytes, so Devanagari and
/// other multi-byte scripts are counted the way the models see them.
/// A single word longer than the whole budget is never split mid-word
/// and therefore produces an over-budget chunk.
pub struct Segmenter {
    budget: usize,
}

impl Segmenter {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    /// Segment text into an ordered sequence of chunks.
    ///
    /// Sentences are merged greedily while the running chunk stays
    /// within the budget; a sentence that alone exceeds the budget is
    /// split at word boundaries. Joining the chunks with single spaces
    /// reconstructs the normalized input up to whitespace differences.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in split_sentences(&normalized) {
            let sentence_len = sentence.chars().count();

            if sentence_len > self.budget {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                chunks.extend(self.split_words(&sentence));
                continue;
            }

            let current_len = current.chars().count();
            if !current.is_empty() && current_len + 1 + sentence_len > self.budget {
                chunks.push(std::mem::take(&mut current));
            }

            if current.is_empty() {
                current = sentence;
            } else {
                current.push(' ');
                current.push_str(&sentence);
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Split an oversize sentence at word boundaries.
    fn split_words(&self, sentence: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = String::new();

        for word in sentence.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current.chars().count();

            if !current.is_empty() && current_len + 1 + word_len > self.budget {
                out.push(std::mem::take(&mut current));
            }

            if current.is_empty() {
                current = word.to_string();
            } else {
                current.push(' ');
                current.push_str(word);
            }
        }

        if !current.is_empty() {
            out.push(current);
        }

        out
    }
}

/// Split normalized text into sentences, retaining each delimiter with
/// its preceding sentence. The delimiter set covers Latin punctuation
/// plus the Devanagari danda so Indic scripts segment correctly.
fn split_sentences(text: &str) -> Vec<String> {
    let delimiters = Regex::new(r"[.!?।]+ ?|\n").unwrap();

    let mut sentences = Vec::new();
    let mut last_end = 0;

    for mat in delimiters.find_iter(text) {
        let sentence = text[last_end..mat.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        last_end = mat.end();
    }

    if last_end < text.len() {
        let tail = text[last_end..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
    }

    sentences
}
