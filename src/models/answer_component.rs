use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single choice in a multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McqOption {
    pub id: Uuid,
    pub text: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub position: i32,
}

/// A single blank in a cloze question. `char_position` is a byte offset into
/// the question's `full_text` and must land on the start of a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClozeBlank {
    pub id: Uuid,
    pub correct_answer: String,
    #[serde(default)]
    pub alternates: Vec<String>,
    pub char_position: usize,
    #[serde(default)]
    pub position: i32,
}

/// A left/right pair in a word-matching question. Each side carries text,
/// an image, or both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordPair {
    pub id: Uuid,
    pub left_word: Option<String>,
    pub left_image_url: Option<String>,
    pub right_word: Option<String>,
    pub right_image_url: Option<String>,
    #[serde(default)]
    pub position: i32,
}

/// Outcome of checking one submitted blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankOutcome {
    Correct,
    Typo,
    Incorrect,
}

impl ClozeBlank {
    /// Check a submitted string against the canonical answer and alternates.
    /// Whitespace and surrounding punctuation never count against the user;
    /// near-misses within a small edit distance are reported as typos.
    pub fn check(&self, submitted: &str, case_sensitive: bool) -> BlankOutcome {
        let user = normalize(submitted, case_sensitive);
        if user.is_empty() {
            return BlankOutcome::Incorrect;
        }

        let canonical = normalize(&self.correct_answer, case_sensitive);
        if user == canonical {
            return BlankOutcome::Correct;
        }
        for alt in &self.alternates {
            if user == normalize(alt, case_sensitive) {
                return BlankOutcome::Correct;
            }
        }

        if is_typo(&user, &canonical) {
            return BlankOutcome::Typo;
        }
        for alt in &self.alternates {
            if is_typo(&user, &normalize(alt, case_sensitive)) {
                return BlankOutcome::Typo;
            }
        }

        BlankOutcome::Incorrect
    }
}

impl WordPair {
    pub fn left_is_empty(&self) -> bool {
        side_is_empty(&self.left_word, &self.left_image_url)
    }

    pub fn right_is_empty(&self) -> bool {
        side_is_empty(&self.right_word, &self.right_image_url)
    }

    /// Human-readable handle for feedback messages. Falls back to the pair id
    /// for image-only sides.
    pub fn left_label(&self) -> String {
        match self.left_word.as_deref() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => self.id.to_string(),
        }
    }
}

fn side_is_empty(word: &Option<String>, image_url: &Option<String>) -> bool {
    let has_word = word.as_deref().map_or(false, |w| !w.trim().is_empty());
    let has_image = image_url.as_deref().map_or(false, |u| !u.trim().is_empty());
    !has_word && !has_image
}

/// Strip surrounding whitespace/punctuation; fold case unless the question
/// is case-sensitive.
fn normalize(text: &str, case_sensitive: bool) -> String {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation());
    if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Distance 1 is a typo at any length; distance 2 only for answers longer
/// than 5 characters.
fn is_typo(user: &str, correct: &str) -> bool {
    if user == correct || correct.is_empty() {
        return false;
    }
    let distance = levenshtein(user, correct);
    let max_len = user.chars().count().max(correct.chars().count());
    distance == 1 || (distance == 2 && max_len > 5)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1];
        for (j, cb) in b.iter().enumerate() {
            let insertion = previous[j + 1] + 1;
            let deletion = current[j] + 1;
            let substitution = previous[j] + usize::from(ca != cb);
            current.push(insertion.min(deletion).min(substitution));
        }
        previous = current;
    }
    previous[b.len()]
}
