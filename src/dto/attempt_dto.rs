use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{BlankDetail, Question, QuestionDetails};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartAttemptRequest {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartAttemptResponse {
    pub attempt_id: Uuid,
    pub quiz_id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub questions: Vec<JsonValue>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    pub response: JsonValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAnswerResponse {
    pub correct: bool,
    pub feedback: String,
    pub details: Option<BTreeMap<String, BlankDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishAttemptResponse {
    pub attempt_id: Uuid,
    pub score: f64,
    pub correct: i64,
    pub total: i64,
}

/// Test-taker projection of a question: correctness data stripped, cloze text
/// masked, presentation order shuffled per the question's flags.
pub fn player_question(question: &Question, rng: &mut impl Rng) -> JsonValue {
    let mut view = json!({
        "id": question.id,
        "type": question.question_type,
        "prompt_text": question.prompt_text,
        "prompt_image_url": question.prompt_image_url,
        "position": question.position,
    });

    match &question.details {
        QuestionDetails::MultipleChoice(mc) => {
            let mut options: Vec<JsonValue> = mc
                .options
                .iter()
                .map(|o| json!({ "id": o.id, "text": o.text, "image_url": o.image_url }))
                .collect();
            if mc.randomize_order {
                options.shuffle(rng);
            }
            view["allow_multiple"] = json!(mc.allow_multiple);
            view["options"] = JsonValue::Array(options);
        }
        QuestionDetails::Cloze(cloze) => {
            view["full_text"] = json!(cloze.masked_text());
            view["blanks"] = json!(cloze
                .blanks
                .iter()
                .map(|b| json!({ "id": b.id, "position": b.position }))
                .collect::<Vec<_>>());
            if cloze.show_word_bank {
                let mut bank = cloze.word_bank();
                bank.shuffle(rng);
                view["word_bank"] = json!(bank);
            }
        }
        QuestionDetails::WordMatch(wm) => {
            let left: Vec<JsonValue> = wm
                .pairs
                .iter()
                .map(|p| json!({ "id": p.id, "word": p.left_word, "image_url": p.left_image_url }))
                .collect();
            let mut right: Vec<JsonValue> = wm
                .pairs
                .iter()
                .map(|p| json!({ "id": p.id, "word": p.right_word, "image_url": p.right_image_url }))
                .collect();
            if wm.randomize_right {
                right.shuffle(rng);
            }
            view["left_items"] = JsonValue::Array(left);
            view["right_items"] = JsonValue::Array(right);
        }
    }

    view
}
