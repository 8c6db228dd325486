use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer_component::{BlankOutcome, ClozeBlank, McqOption, WordPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Cloze,
    WordMatch,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Cloze => "cloze",
            QuestionType::WordMatch => "word_match",
        }
    }
}

/// A question as stored and served. Variant fields are flattened into the
/// serialized object next to the shared attributes, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt_text: String,
    pub prompt_image_url: Option<String>,
    pub answer_explanation: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum QuestionDetails {
    MultipleChoice(MultipleChoiceDetails),
    Cloze(ClozeDetails),
    WordMatch(WordMatchDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultipleChoiceDetails {
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default = "default_true")]
    pub randomize_order: bool,
    pub options: Vec<McqOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClozeDetails {
    pub full_text: String,
    #[serde(default)]
    pub show_word_bank: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    pub blanks: Vec<ClozeBlank>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordMatchDetails {
    #[serde(default = "default_true")]
    pub randomize_right: bool,
    pub pairs: Vec<WordPair>,
}

fn default_true() -> bool {
    true
}

/// Result of validating one submitted answer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Verdict {
    pub is_correct: bool,
    pub feedback: String,
    /// Per-blank breakdown, present for cloze questions only.
    pub details: Option<BTreeMap<String, BlankDetail>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BlankDetail {
    pub result: BlankOutcome,
    pub user_answer: String,
    pub correct_answer: String,
}

impl QuestionDetails {
    pub fn kind(&self) -> QuestionType {
        match self {
            QuestionDetails::MultipleChoice(_) => QuestionType::MultipleChoice,
            QuestionDetails::Cloze(_) => QuestionType::Cloze,
            QuestionDetails::WordMatch(_) => QuestionType::WordMatch,
        }
    }
}

impl Question {
    /// Validate a raw submitted response against this question. Dispatches on
    /// the variant; callers never branch on the question type themselves.
    ///
    /// Shape and reference errors reject the submission outright; an empty
    /// selection or mapping is a scored (incorrect) answer, not an error.
    pub fn validate_answer(&self, response: &JsonValue) -> Result<Verdict> {
        let explanation = self.answer_explanation.as_deref();
        match &self.details {
            QuestionDetails::MultipleChoice(mc) => mc.validate_answer(response, explanation),
            QuestionDetails::Cloze(cloze) => cloze.validate_answer(response, explanation),
            QuestionDetails::WordMatch(wm) => wm.validate_answer(response, explanation),
        }
    }

    /// Uniform wire representation: shared fields plus variant fields keyed
    /// per the serialization contract (`options` / `full_text` + `blanks` /
    /// `pairs`). Unset optionals serialize as explicit nulls.
    pub fn serialize(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    /// Authoring-time invariants, checked before a definition is persisted.
    pub fn validate_definition(&self) -> Result<()> {
        if self.prompt_text.trim().is_empty() {
            return Err(Error::MalformedQuestionDefinition(
                "prompt_text must not be empty".to_string(),
            ));
        }
        if self.question_type != self.details.kind() {
            return Err(Error::MalformedQuestionDefinition(format!(
                "type tag '{}' does not match the variant fields provided",
                self.question_type.as_str()
            )));
        }

        match &self.details {
            QuestionDetails::MultipleChoice(mc) => mc.validate_definition(),
            QuestionDetails::Cloze(cloze) => cloze.validate_definition(),
            QuestionDetails::WordMatch(wm) => wm.validate_definition(),
        }
    }
}

impl MultipleChoiceDetails {
    fn validate_answer(&self, response: &JsonValue, explanation: Option<&str>) -> Result<Verdict> {
        let selected = response.as_array().ok_or_else(|| {
            Error::InvalidResponseShape(
                "a multiple choice answer must be a list of option ids".to_string(),
            )
        })?;

        let mut chosen: HashSet<Uuid> = HashSet::new();
        for value in selected {
            let id = parse_component_id(value, "option")?;
            if !self.options.iter().any(|o| o.id == id) {
                return Err(Error::UnknownComponentReference(format!(
                    "option {} does not belong to this question",
                    id
                )));
            }
            chosen.insert(id);
        }

        let correct: HashSet<Uuid> = self
            .options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.id)
            .collect();

        let is_correct = chosen == correct;
        let feedback = if is_correct {
            "Correct!".to_string()
        } else {
            with_explanation(
                format!(
                    "Incorrect. You selected {} option(s), but {} are correct.",
                    chosen.len(),
                    correct.len()
                ),
                explanation,
            )
        };

        Ok(Verdict {
            is_correct,
            feedback,
            details: None,
        })
    }

    fn validate_definition(&self) -> Result<()> {
        if self.options.len() < 2 {
            return Err(Error::MalformedQuestionDefinition(
                "a multiple choice question needs at least 2 options".to_string(),
            ));
        }
        if !self.options.iter().any(|o| o.is_correct) {
            return Err(Error::MalformedQuestionDefinition(
                "at least one option must be marked correct".to_string(),
            ));
        }
        for option in &self.options {
            let has_text = option.text.as_deref().map_or(false, |t| !t.trim().is_empty());
            if !has_text && option.image_url.is_none() {
                return Err(Error::MalformedQuestionDefinition(format!(
                    "option at position {} needs text or an image",
                    option.position
                )));
            }
        }
        Ok(())
    }
}

impl ClozeDetails {
    fn validate_answer(&self, response: &JsonValue, explanation: Option<&str>) -> Result<Verdict> {
        let map = response.as_object().ok_or_else(|| {
            Error::InvalidResponseShape(
                "a cloze answer must map blank ids to submitted strings".to_string(),
            )
        })?;

        let mut submitted: HashMap<Uuid, &str> = HashMap::new();
        for (key, value) in map {
            let id = Uuid::parse_str(key).map_err(|_| {
                Error::InvalidResponseShape(format!("'{}' is not a valid blank id", key))
            })?;
            let text = value.as_str().ok_or_else(|| {
                Error::InvalidResponseShape("blank answers must be strings".to_string())
            })?;
            if !self.blanks.iter().any(|b| b.id == id) {
                return Err(Error::UnknownComponentReference(format!(
                    "blank {} does not belong to this question",
                    id
                )));
            }
            submitted.insert(id, text);
        }

        let total = self.blanks.len();
        let mut correct_count = 0;
        let mut typo_count = 0;
        let mut details = BTreeMap::new();

        for blank in &self.blanks {
            let answer = submitted.get(&blank.id).copied().unwrap_or("");
            let outcome = blank.check(answer, self.case_sensitive);
            match outcome {
                BlankOutcome::Correct => correct_count += 1,
                BlankOutcome::Typo => {
                    typo_count += 1;
                    correct_count += 1;
                }
                BlankOutcome::Incorrect => {}
            }
            details.insert(
                blank.id.to_string(),
                BlankDetail {
                    result: outcome,
                    user_answer: answer.trim().to_string(),
                    correct_answer: blank.correct_answer.clone(),
                },
            );
        }

        let is_correct = correct_count == total;
        let counts = if typo_count > 0 {
            format!(
                "Got {} out of {} blanks correct ({} with minor typos).",
                correct_count, total, typo_count
            )
        } else {
            format!("Got {} out of {} blanks correct.", correct_count, total)
        };
        let feedback = if is_correct {
            counts
        } else {
            with_explanation(counts, explanation)
        };

        Ok(Verdict {
            is_correct,
            feedback,
            details: Some(details),
        })
    }

    fn validate_definition(&self) -> Result<()> {
        if self.full_text.trim().is_empty() {
            return Err(Error::MalformedQuestionDefinition(
                "a cloze question needs its full text".to_string(),
            ));
        }
        if self.blanks.is_empty() {
            return Err(Error::MalformedQuestionDefinition(
                "a cloze question needs at least 1 blank".to_string(),
            ));
        }
        for blank in &self.blanks {
            if blank.correct_answer.trim().is_empty() {
                return Err(Error::MalformedQuestionDefinition(format!(
                    "blank at position {} has no correct answer",
                    blank.position
                )));
            }
            if !is_token_boundary(&self.full_text, blank.char_position) {
                return Err(Error::MalformedQuestionDefinition(format!(
                    "blank offset {} is not a token boundary in the full text",
                    blank.char_position
                )));
            }
        }
        Ok(())
    }

    /// The full text with every blanked token replaced, for the taking view.
    pub fn masked_text(&self) -> String {
        let mut masked = self.full_text.clone();
        let mut blanks: Vec<&ClozeBlank> = self.blanks.iter().collect();
        blanks.sort_by_key(|b| std::cmp::Reverse(b.char_position));
        for blank in blanks {
            let start = blank.char_position;
            if start >= masked.len() || !masked.is_char_boundary(start) {
                continue;
            }
            let end = masked[start..]
                .find(char::is_whitespace)
                .map(|i| start + i)
                .unwrap_or(masked.len());
            masked.replace_range(start..end, "____");
        }
        masked
    }

    /// The canonical answers, in blank order. Shuffled by the caller when the
    /// word bank is shown.
    pub fn word_bank(&self) -> Vec<String> {
        self.blanks.iter().map(|b| b.correct_answer.clone()).collect()
    }
}

impl WordMatchDetails {
    fn validate_answer(&self, response: &JsonValue, explanation: Option<&str>) -> Result<Verdict> {
        let map = response.as_object().ok_or_else(|| {
            Error::InvalidResponseShape(
                "a word match answer must map left-item ids to right-item ids".to_string(),
            )
        })?;

        let mut chosen: HashMap<Uuid, Uuid> = HashMap::new();
        for (key, value) in map {
            let left = Uuid::parse_str(key).map_err(|_| {
                Error::InvalidResponseShape(format!("'{}' is not a valid pair id", key))
            })?;
            let right = parse_component_id(value, "pair")?;
            if !self.pairs.iter().any(|p| p.id == left) {
                return Err(Error::UnknownComponentReference(format!(
                    "left item {} does not belong to this question",
                    left
                )));
            }
            if !self.pairs.iter().any(|p| p.id == right) {
                return Err(Error::UnknownComponentReference(format!(
                    "right item {} does not belong to this question",
                    right
                )));
            }
            chosen.insert(left, right);
        }

        // The authored pairing is the identity mapping over pair ids.
        let mut wrong: Vec<&WordPair> = Vec::new();
        let mut correct_count = 0;
        for pair in &self.pairs {
            match chosen.get(&pair.id) {
                Some(right) if *right == pair.id => correct_count += 1,
                _ => wrong.push(pair),
            }
        }

        let total = self.pairs.len();
        let is_correct = correct_count == total;
        let mut feedback = format!("Got {} out of {} pairs correct.", correct_count, total);
        if !wrong.is_empty() {
            let labels: Vec<String> = wrong.iter().map(|p| p.left_label()).collect();
            feedback.push_str(&format!(" Mismatched: {}.", labels.join(", ")));
        }
        let feedback = if is_correct {
            feedback
        } else {
            with_explanation(feedback, explanation)
        };

        Ok(Verdict {
            is_correct,
            feedback,
            details: None,
        })
    }

    fn validate_definition(&self) -> Result<()> {
        if self.pairs.is_empty() {
            return Err(Error::MalformedQuestionDefinition(
                "a word match question needs at least 1 pair".to_string(),
            ));
        }
        for pair in &self.pairs {
            if pair.left_is_empty() || pair.right_is_empty() {
                return Err(Error::MalformedQuestionDefinition(format!(
                    "pair at position {} needs text or an image on each side",
                    pair.position
                )));
            }
        }
        Ok(())
    }
}

fn parse_component_id(value: &JsonValue, kind: &str) -> Result<Uuid> {
    let raw = value.as_str().ok_or_else(|| {
        Error::InvalidResponseShape(format!("{} ids must be strings", kind))
    })?;
    Uuid::parse_str(raw).map_err(|_| {
        Error::InvalidResponseShape(format!("'{}' is not a valid {} id", raw, kind))
    })
}

fn with_explanation(mut feedback: String, explanation: Option<&str>) -> String {
    if let Some(explanation) = explanation {
        if !explanation.trim().is_empty() {
            feedback.push(' ');
            feedback.push_str(explanation);
        }
    }
    feedback
}

/// A byte offset is a token boundary when it sits on a char boundary at the
/// start of a whitespace-delimited token.
fn is_token_boundary(text: &str, offset: usize) -> bool {
    if offset >= text.len() || !text.is_char_boundary(offset) {
        return false;
    }
    let at_start = offset == 0 || text[..offset].ends_with(char::is_whitespace);
    let on_token = !text[offset..].starts_with(char::is_whitespace);
    at_start && on_token
}

/// Row shape for the questions table; variant fields live in the details
/// jsonb column.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub question_type: String,
    pub prompt_text: String,
    pub prompt_image_url: Option<String>,
    pub answer_explanation: Option<String>,
    pub position: i32,
    pub details: JsonValue,
}

impl QuestionRow {
    pub fn into_question(self) -> Result<Question> {
        let question_type: QuestionType =
            serde_json::from_value(JsonValue::String(self.question_type.clone())).map_err(|_| {
                Error::Internal(format!(
                    "question {} has unknown type '{}'",
                    self.id, self.question_type
                ))
            })?;
        let details: QuestionDetails = serde_json::from_value(self.details).map_err(|e| {
            Error::Internal(format!("question {} has corrupt variant data: {}", self.id, e))
        })?;
        if details.kind() != question_type {
            return Err(Error::Internal(format!(
                "question {} variant data does not match its type tag",
                self.id
            )));
        }
        Ok(Question {
            id: self.id,
            quiz_id: self.quiz_id,
            question_type,
            prompt_text: self.prompt_text,
            prompt_image_url: self.prompt_image_url,
            answer_explanation: self.answer_explanation,
            position: self.position,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mcq(options: &[(&str, bool)]) -> Question {
        let options = options
            .iter()
            .enumerate()
            .map(|(idx, (text, is_correct))| McqOption {
                id: Uuid::new_v4(),
                text: Some(text.to_string()),
                image_url: None,
                is_correct: *is_correct,
                position: idx as i32,
            })
            .collect();
        Question {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            question_type: QuestionType::MultipleChoice,
            prompt_text: "Pick the right answer".to_string(),
            prompt_image_url: None,
            answer_explanation: None,
            position: 0,
            details: QuestionDetails::MultipleChoice(MultipleChoiceDetails {
                allow_multiple: false,
                randomize_order: true,
                options,
            }),
        }
    }

    fn cloze(full_text: &str, blanks: Vec<ClozeBlank>, case_sensitive: bool) -> Question {
        Question {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            question_type: QuestionType::Cloze,
            prompt_text: "Fill in the blanks".to_string(),
            prompt_image_url: None,
            answer_explanation: None,
            position: 0,
            details: QuestionDetails::Cloze(ClozeDetails {
                full_text: full_text.to_string(),
                show_word_bank: false,
                case_sensitive,
                blanks,
            }),
        }
    }

    fn word_match(pairs: &[(&str, &str)]) -> Question {
        let pairs = pairs
            .iter()
            .enumerate()
            .map(|(idx, (left, right))| WordPair {
                id: Uuid::new_v4(),
                left_word: Some(left.to_string()),
                left_image_url: None,
                right_word: Some(right.to_string()),
                right_image_url: None,
                position: idx as i32,
            })
            .collect();
        Question {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            question_type: QuestionType::WordMatch,
            prompt_text: "Match the words".to_string(),
            prompt_image_url: None,
            answer_explanation: None,
            position: 0,
            details: QuestionDetails::WordMatch(WordMatchDetails {
                randomize_right: true,
                pairs,
            }),
        }
    }

    fn option_ids(question: &Question) -> Vec<Uuid> {
        match &question.details {
            QuestionDetails::MultipleChoice(mc) => mc.options.iter().map(|o| o.id).collect(),
            _ => panic!("not a multiple choice question"),
        }
    }

    fn pair_ids(question: &Question) -> Vec<Uuid> {
        match &question.details {
            QuestionDetails::WordMatch(wm) => wm.pairs.iter().map(|p| p.id).collect(),
            _ => panic!("not a word match question"),
        }
    }

    #[test]
    fn mcq_exact_selection_is_correct() {
        let q = mcq(&[("A", true), ("B", false), ("C", false)]);
        let ids = option_ids(&q);
        let verdict = q.validate_answer(&json!([ids[0].to_string()])).unwrap();
        assert!(verdict.is_correct);
        assert_eq!(verdict.feedback, "Correct!");
    }

    #[test]
    fn mcq_superset_selection_is_incorrect() {
        let q = mcq(&[("A", true), ("B", false), ("C", false)]);
        let ids = option_ids(&q);
        let verdict = q
            .validate_answer(&json!([ids[0].to_string(), ids[1].to_string()]))
            .unwrap();
        assert!(!verdict.is_correct);
    }

    #[test]
    fn mcq_selection_is_order_independent() {
        let q = mcq(&[("A", true), ("B", true), ("C", false)]);
        let ids = option_ids(&q);
        let forward = q
            .validate_answer(&json!([ids[0].to_string(), ids[1].to_string()]))
            .unwrap();
        let reversed = q
            .validate_answer(&json!([ids[1].to_string(), ids[0].to_string()]))
            .unwrap();
        assert!(forward.is_correct);
        assert!(reversed.is_correct);
    }

    #[test]
    fn mcq_empty_selection_is_incorrect_not_an_error() {
        let q = mcq(&[("A", true), ("B", false)]);
        let verdict = q.validate_answer(&json!([])).unwrap();
        assert!(!verdict.is_correct);
    }

    #[test]
    fn mcq_scalar_response_is_rejected() {
        let q = mcq(&[("A", true), ("B", false)]);
        let ids = option_ids(&q);
        let err = q.validate_answer(&json!(ids[0].to_string())).unwrap_err();
        assert!(matches!(err, Error::InvalidResponseShape(_)));
    }

    #[test]
    fn mcq_foreign_option_id_is_rejected() {
        let q = mcq(&[("A", true), ("B", false)]);
        let err = q
            .validate_answer(&json!([Uuid::new_v4().to_string()]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownComponentReference(_)));
    }

    #[test]
    fn mcq_wrong_answer_feedback_includes_explanation() {
        let mut q = mcq(&[("A", true), ("B", false)]);
        q.answer_explanation = Some("A is the only irregular form.".to_string());
        let ids = option_ids(&q);
        let verdict = q.validate_answer(&json!([ids[1].to_string()])).unwrap();
        assert!(!verdict.is_correct);
        assert!(verdict.feedback.contains("A is the only irregular form."));
    }

    #[test]
    fn mcq_definition_needs_two_options_and_a_correct_one() {
        let one_option = mcq(&[("A", true)]);
        assert!(matches!(
            one_option.validate_definition().unwrap_err(),
            Error::MalformedQuestionDefinition(_)
        ));

        let none_correct = mcq(&[("A", false), ("B", false)]);
        assert!(matches!(
            none_correct.validate_definition().unwrap_err(),
            Error::MalformedQuestionDefinition(_)
        ));

        assert!(mcq(&[("A", true), ("B", false)]).validate_definition().is_ok());
    }

    #[test]
    fn cloze_case_insensitive_alternate_scenario() {
        // "le chat noir", blank over "chat" at byte offset 3.
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec!["Chat".to_string()],
            char_position: 3,
            position: 0,
        };
        let blank_id = blank.id;
        let q = cloze("le chat noir", vec![blank], false);
        assert!(q.validate_definition().is_ok());

        let verdict = q
            .validate_answer(&json!({ blank_id.to_string(): "CHAT" }))
            .unwrap();
        assert!(verdict.is_correct);

        let details = verdict.details.unwrap();
        let detail = details.get(&blank_id.to_string()).unwrap();
        assert_eq!(detail.result, BlankOutcome::Correct);
        assert_eq!(detail.correct_answer, "chat");
    }

    #[test]
    fn cloze_case_sensitive_rejects_folded_case() {
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let blank_id = blank.id;
        let q = cloze("le chat noir", vec![blank], true);
        let verdict = q
            .validate_answer(&json!({ blank_id.to_string(): "CHAT" }))
            .unwrap();
        assert!(!verdict.is_correct);
    }

    #[test]
    fn cloze_whitespace_only_answer_is_incorrect() {
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let blank_id = blank.id;
        let q = cloze("le chat noir", vec![blank], false);
        let verdict = q
            .validate_answer(&json!({ blank_id.to_string(): "   " }))
            .unwrap();
        assert!(!verdict.is_correct);
    }

    #[test]
    fn cloze_missing_blank_counts_as_incorrect() {
        let first = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let second = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "noir".to_string(),
            alternates: vec![],
            char_position: 8,
            position: 1,
        };
        let first_id = first.id;
        let q = cloze("le chat noir", vec![first, second], false);
        let verdict = q
            .validate_answer(&json!({ first_id.to_string(): "chat" }))
            .unwrap();
        assert!(!verdict.is_correct);
        assert!(verdict.feedback.contains("1 out of 2"));
    }

    #[test]
    fn cloze_empty_response_is_incorrect_not_an_error() {
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let q = cloze("le chat noir", vec![blank], false);
        let verdict = q.validate_answer(&json!({})).unwrap();
        assert!(!verdict.is_correct);
    }

    #[test]
    fn cloze_typo_counts_toward_score_and_is_reported() {
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let blank_id = blank.id;
        let q = cloze("le chat noir", vec![blank], false);
        let verdict = q
            .validate_answer(&json!({ blank_id.to_string(): "chut" }))
            .unwrap();
        assert!(verdict.is_correct);
        assert!(verdict.feedback.contains("minor typos"));
        let details = verdict.details.unwrap();
        assert_eq!(
            details.get(&blank_id.to_string()).unwrap().result,
            BlankOutcome::Typo
        );
    }

    #[test]
    fn cloze_list_response_is_rejected() {
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let q = cloze("le chat noir", vec![blank], false);
        let err = q.validate_answer(&json!(["chat"])).unwrap_err();
        assert!(matches!(err, Error::InvalidResponseShape(_)));
    }

    #[test]
    fn cloze_foreign_blank_id_is_rejected() {
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let q = cloze("le chat noir", vec![blank], false);
        let err = q
            .validate_answer(&json!({ Uuid::new_v4().to_string(): "chat" }))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownComponentReference(_)));
    }

    #[test]
    fn cloze_offset_must_be_a_token_boundary() {
        let mid_token = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "hat".to_string(),
            alternates: vec![],
            char_position: 4,
            position: 0,
        };
        let q = cloze("le chat noir", vec![mid_token], false);
        assert!(matches!(
            q.validate_definition().unwrap_err(),
            Error::MalformedQuestionDefinition(_)
        ));

        let on_space = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 2,
            position: 0,
        };
        let q = cloze("le chat noir", vec![on_space], false);
        assert!(q.validate_definition().is_err());
    }

    #[test]
    fn cloze_needs_at_least_one_blank() {
        let q = cloze("le chat noir", vec![], false);
        assert!(matches!(
            q.validate_definition().unwrap_err(),
            Error::MalformedQuestionDefinition(_)
        ));
    }

    #[test]
    fn cloze_masked_text_hides_blanked_tokens() {
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let q = cloze("le chat noir", vec![blank], false);
        match &q.details {
            QuestionDetails::Cloze(c) => assert_eq!(c.masked_text(), "le ____ noir"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn word_match_identity_mapping_is_correct() {
        let q = word_match(&[("dog", "chien"), ("cat", "chat")]);
        let ids = pair_ids(&q);
        let verdict = q
            .validate_answer(&json!({
                ids[0].to_string(): ids[0].to_string(),
                ids[1].to_string(): ids[1].to_string(),
            }))
            .unwrap();
        assert!(verdict.is_correct);
    }

    #[test]
    fn word_match_mismatch_cites_the_wrong_pair() {
        let q = word_match(&[("dog", "chien"), ("cat", "chat")]);
        let ids = pair_ids(&q);
        // dog -> chien, cat -> chien
        let verdict = q
            .validate_answer(&json!({
                ids[0].to_string(): ids[0].to_string(),
                ids[1].to_string(): ids[0].to_string(),
            }))
            .unwrap();
        assert!(!verdict.is_correct);
        assert!(verdict.feedback.contains("cat"));
        assert!(!verdict.feedback.contains("Mismatched: dog"));
    }

    #[test]
    fn word_match_swapped_rights_are_incorrect() {
        let q = word_match(&[("dog", "chien"), ("cat", "chat")]);
        let ids = pair_ids(&q);
        let verdict = q
            .validate_answer(&json!({
                ids[0].to_string(): ids[1].to_string(),
                ids[1].to_string(): ids[0].to_string(),
            }))
            .unwrap();
        assert!(!verdict.is_correct);
        assert!(verdict.feedback.contains("0 out of 2"));
    }

    #[test]
    fn word_match_unmatched_pair_is_incorrect() {
        let q = word_match(&[("dog", "chien"), ("cat", "chat")]);
        let ids = pair_ids(&q);
        let verdict = q
            .validate_answer(&json!({ ids[0].to_string(): ids[0].to_string() }))
            .unwrap();
        assert!(!verdict.is_correct);
        assert!(verdict.feedback.contains("1 out of 2"));
    }

    #[test]
    fn word_match_foreign_ids_are_rejected() {
        let q = word_match(&[("dog", "chien")]);
        let ids = pair_ids(&q);
        let err = q
            .validate_answer(&json!({ Uuid::new_v4().to_string(): ids[0].to_string() }))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownComponentReference(_)));
    }

    #[test]
    fn word_match_non_object_response_is_rejected() {
        let q = word_match(&[("dog", "chien")]);
        let err = q.validate_answer(&json!("dog")).unwrap_err();
        assert!(matches!(err, Error::InvalidResponseShape(_)));
    }

    #[test]
    fn word_match_definition_rejects_empty_sides() {
        let pair = WordPair {
            id: Uuid::new_v4(),
            left_word: None,
            left_image_url: None,
            right_word: Some("chien".to_string()),
            right_image_url: None,
            position: 0,
        };
        let q = Question {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            question_type: QuestionType::WordMatch,
            prompt_text: "Match".to_string(),
            prompt_image_url: None,
            answer_explanation: None,
            position: 0,
            details: QuestionDetails::WordMatch(WordMatchDetails {
                randomize_right: true,
                pairs: vec![pair],
            }),
        };
        assert!(matches!(
            q.validate_definition().unwrap_err(),
            Error::MalformedQuestionDefinition(_)
        ));
    }

    #[test]
    fn serialized_questions_round_trip_with_explicit_nulls() {
        let q = mcq(&[("A", true), ("B", false)]);
        let value = q.serialize().unwrap();

        assert_eq!(value["type"], json!("multiple_choice"));
        // Unset fields must be explicit nulls, not omitted keys.
        assert!(value.get("prompt_image_url").is_some());
        assert_eq!(value["prompt_image_url"], JsonValue::Null);
        assert_eq!(value["options"].as_array().unwrap().len(), 2);

        let back: Question = serde_json::from_value(value).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn serialized_cloze_keeps_empty_alternates() {
        let blank = ClozeBlank {
            id: Uuid::new_v4(),
            correct_answer: "chat".to_string(),
            alternates: vec![],
            char_position: 3,
            position: 0,
        };
        let q = cloze("le chat noir", vec![blank], false);
        let value = q.serialize().unwrap();

        assert_eq!(value["type"], json!("cloze"));
        assert_eq!(value["full_text"], json!("le chat noir"));
        assert_eq!(value["blanks"][0]["alternates"], json!([]));

        let back: Question = serde_json::from_value(value).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn serialized_word_match_round_trips() {
        let q = word_match(&[("dog", "chien"), ("cat", "chat")]);
        let value = q.serialize().unwrap();
        assert_eq!(value["type"], json!("word_match"));
        assert_eq!(value["pairs"].as_array().unwrap().len(), 2);
        let back: Question = serde_json::from_value(value).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn question_row_type_tag_must_match_details() {
        let q = mcq(&[("A", true), ("B", false)]);
        let row = QuestionRow {
            id: q.id,
            quiz_id: q.quiz_id,
            question_type: "cloze".to_string(),
            prompt_text: q.prompt_text.clone(),
            prompt_image_url: None,
            answer_explanation: None,
            position: 0,
            details: serde_json::to_value(&q.details).unwrap(),
        };
        assert!(row.into_question().is_err());
    }

    #[test]
    fn token_boundary_checks() {
        assert!(is_token_boundary("le chat noir", 0));
        assert!(is_token_boundary("le chat noir", 3));
        assert!(is_token_boundary("le chat noir", 8));
        assert!(!is_token_boundary("le chat noir", 2)); // on the space
        assert!(!is_token_boundary("le chat noir", 4)); // mid-token
        assert!(!is_token_boundary("le chat noir", 99)); // out of range
    }
}
