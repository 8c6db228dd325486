use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::answer_component::{ClozeBlank, McqOption, WordPair};
use crate::models::question::{
    ClozeDetails, MultipleChoiceDetails, Question, QuestionDetails, QuestionType, WordMatchDetails,
};

/// Authoring payload for a new or replaced question. One flat shape for all
/// variants; the `type` tag decides which component list is read.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionInput {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(length(min = 1, message = "prompt_text must not be empty"))]
    pub prompt_text: String,
    pub prompt_image_url: Option<String>,
    pub answer_explanation: Option<String>,
    #[serde(default)]
    pub mcq_options: Vec<McqOptionInput>,
    pub cloze_data: Option<ClozeDataInput>,
    #[serde(default)]
    pub word_pairs: Vec<WordPairInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct McqOptionInput {
    pub text: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClozeDataInput {
    pub full_text: String,
    #[serde(default)]
    pub word_bank: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    pub blanks: Vec<ClozeBlankInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClozeBlankInput {
    pub word: String,
    pub char_position: usize,
    #[serde(default)]
    pub alternates: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordPairInput {
    pub left: Option<String>,
    pub right: Option<String>,
    pub left_image_url: Option<String>,
    pub right_image_url: Option<String>,
}

impl QuestionInput {
    /// Build the domain question, minting fresh component ids. Definition
    /// invariants are checked separately via `Question::validate_definition`.
    pub fn into_question(self, quiz_id: Uuid, position: i32) -> Result<Question> {
        let details = match self.question_type {
            QuestionType::MultipleChoice => {
                let options = self
                    .mcq_options
                    .into_iter()
                    .enumerate()
                    .map(|(idx, opt)| McqOption {
                        id: Uuid::new_v4(),
                        text: opt.text,
                        image_url: opt.image_url,
                        is_correct: opt.is_correct,
                        position: idx as i32,
                    })
                    .collect();
                QuestionDetails::MultipleChoice(MultipleChoiceDetails {
                    allow_multiple: false,
                    randomize_order: true,
                    options,
                })
            }
            QuestionType::Cloze => {
                let data = self.cloze_data.ok_or_else(|| {
                    Error::MalformedQuestionDefinition(
                        "cloze_data is required for cloze questions".to_string(),
                    )
                })?;
                let blanks = data
                    .blanks
                    .into_iter()
                    .enumerate()
                    .map(|(idx, blank)| ClozeBlank {
                        id: Uuid::new_v4(),
                        correct_answer: blank.word,
                        alternates: blank.alternates,
                        char_position: blank.char_position,
                        position: idx as i32,
                    })
                    .collect();
                QuestionDetails::Cloze(ClozeDetails {
                    full_text: data.full_text,
                    show_word_bank: data.word_bank,
                    case_sensitive: data.case_sensitive,
                    blanks,
                })
            }
            QuestionType::WordMatch => {
                let pairs = self
                    .word_pairs
                    .into_iter()
                    .enumerate()
                    .map(|(idx, pair)| WordPair {
                        id: Uuid::new_v4(),
                        left_word: pair.left,
                        left_image_url: pair.left_image_url,
                        right_word: pair.right,
                        right_image_url: pair.right_image_url,
                        position: idx as i32,
                    })
                    .collect();
                QuestionDetails::WordMatch(WordMatchDetails {
                    randomize_right: true,
                    pairs,
                })
            }
        };

        Ok(Question {
            id: Uuid::new_v4(),
            quiz_id,
            question_type: self.question_type,
            prompt_text: self.prompt_text,
            prompt_image_url: self.prompt_image_url,
            answer_explanation: self.answer_explanation,
            position,
            details,
        })
    }
}
