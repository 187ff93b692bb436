//! Builds the create and edit payloads sent to the persistence API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::answers::{AnswerSet, AnswerValue, WireAnswer};
use crate::error::FormError;
use crate::spec::form::FormTemplate;
use crate::spec::question::{Question, QuestionType};
use crate::validate::validate_with;
use crate::visibility::VisibilityMap;

/// Which record operation a submission targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    /// New record for a patient.
    Create { patient_id: String },
    /// Update of a saved record; needs persisted question ids.
    Edit,
}

/// POST body for a new form record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayload {
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
    pub patient_id: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditAnswer {
    pub question_id: String,
    pub answer: WireAnswer,
}

/// PUT body for an existing form record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EditPayload {
    pub questions: Vec<EditAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Submission {
    Create(CreatePayload),
    Edit(EditPayload),
}

/// Translates one in-memory value to the wire shape for `question`.
pub fn to_wire_answer(question: &Question, value: &AnswerValue) -> WireAnswer {
    let kind = question.question_type;
    match value {
        AnswerValue::Choices(selected) if kind.is_choice() => {
            let ids = selected
                .iter()
                .filter_map(|text| {
                    let id = question.option_id(text);
                    if id.is_none() {
                        warn!(
                            question_index = question.question_index,
                            option = %text,
                            "selected option is not in the current option list"
                        );
                    }
                    id
                })
                .collect::<Vec<_>>();
            WireAnswer::options(ids)
        }
        _ if kind.is_choice() => WireAnswer::options([]),
        AnswerValue::Text(text) if kind == QuestionType::String => WireAnswer::text(text.clone()),
        AnswerValue::Number(number) if kind.is_numeric() => WireAnswer::number(*number),
        _ if kind == QuestionType::String || kind.is_numeric() => WireAnswer::default(),
        _ => WireAnswer::blank(),
    }
}

/// Wire answers for every question, blanking category and hidden questions so
/// stale input on a collapsed branch is never persisted.
pub fn wire_answers(
    questions: &[Question],
    answers: &AnswerSet,
    visibility: &VisibilityMap,
) -> Result<Vec<WireAnswer>, FormError> {
    ensure_aligned(questions, answers)?;
    Ok(questions
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(position, (question, answer))| {
            if question.question_type == QuestionType::Category || visibility.is_hidden(position) {
                WireAnswer::blank()
            } else {
                to_wire_answer(question, &answer.value)
            }
        })
        .collect())
}

pub fn build_create_payload(
    template: &FormTemplate,
    answers: &AnswerSet,
    visibility: &VisibilityMap,
    patient_id: &str,
) -> Result<CreatePayload, FormError> {
    let wire = wire_answers(&template.questions, answers, visibility)?;
    let questions = template
        .questions
        .iter()
        .zip(wire)
        .map(|(question, answer)| submitted_question(question, answer))
        .collect();

    let mut metadata = match serde_json::to_value(template).map_err(FormError::Encode)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    metadata.remove("version");
    metadata.remove("questions");
    metadata.remove("patientId");

    debug!(patient_id, "built create payload");
    Ok(CreatePayload {
        metadata,
        patient_id: patient_id.to_string(),
        questions,
    })
}

pub fn build_edit_payload(
    questions: &[Question],
    answers: &AnswerSet,
    visibility: &VisibilityMap,
) -> Result<EditPayload, FormError> {
    let wire = wire_answers(questions, answers, visibility)?;
    let questions = questions
        .iter()
        .zip(wire)
        .enumerate()
        .map(|(position, (question, answer))| {
            let question_id = question
                .id
                .clone()
                .ok_or(FormError::MissingQuestionId(position))?;
            Ok(EditAnswer {
                question_id,
                answer,
            })
        })
        .collect::<Result<Vec<_>, FormError>>()?;
    debug!(answers = questions.len(), "built edit payload");
    Ok(EditPayload { questions })
}

/// Runs the submission gate, then serializes for `mode`.
pub fn build_submission(
    template: &FormTemplate,
    answers: &AnswerSet,
    visibility: &VisibilityMap,
    mode: &SubmitMode,
) -> Result<Submission, FormError> {
    let validation = validate_with(&template.questions, answers, visibility);
    if !validation.valid {
        return Err(FormError::SubmissionBlocked(validation));
    }
    match mode {
        SubmitMode::Create { patient_id } => {
            build_create_payload(template, answers, visibility, patient_id).map(Submission::Create)
        }
        SubmitMode::Edit => {
            build_edit_payload(&template.questions, answers, visibility).map(Submission::Edit)
        }
    }
}

fn submitted_question(question: &Question, answer: WireAnswer) -> Question {
    let mut submitted = question.clone();
    submitted.id = None;
    submitted.extra.remove("shouldHidden");
    if submitted.question_type == QuestionType::Integer {
        submitted.num_min = submitted.num_min.map(round_two_places);
        submitted.num_max = submitted.num_max.map(round_two_places);
    }
    submitted.answers = Some(answer);
    submitted
}

fn round_two_places(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ensure_aligned(questions: &[Question], answers: &AnswerSet) -> Result<(), FormError> {
    if questions.len() == answers.len() {
        Ok(())
    } else {
        Err(FormError::Misaligned {
            questions: questions.len(),
            answers: answers.len(),
        })
    }
}
