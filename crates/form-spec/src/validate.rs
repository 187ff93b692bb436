use serde::{Deserialize, Serialize};

use crate::answers::AnswerSet;
use crate::spec::question::{Question, QuestionType};
use crate::visibility::{VisibilityMap, resolve_visibility};

pub const REQUIRED_SELECTION_MESSAGE: &str = "Please select at least one option.";

/// Inline message for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub question_index: usize,
    pub message: String,
    pub code: String,
}

/// Outcome of the submission gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn error_for(&self, question_index: usize) -> Option<&ValidationError> {
        self.errors
            .iter()
            .find(|error| error.question_index == question_index)
    }
}

pub fn validate(questions: &[Question], answers: &AnswerSet) -> ValidationResult {
    let visibility = resolve_visibility(questions, answers);
    validate_with(questions, answers, &visibility)
}

/// Same as [`validate`], reusing an already computed visibility snapshot.
///
/// Only required, visible multi-select questions are enforced here; other
/// required-ness is left to the presentation layer.
pub fn validate_with(
    questions: &[Question],
    answers: &AnswerSet,
    visibility: &VisibilityMap,
) -> ValidationResult {
    let errors: Vec<ValidationError> = questions
        .iter()
        .zip(answers)
        .enumerate()
        .filter(|(position, (question, _))| {
            question.question_type == QuestionType::MultipleSelect
                && question.required
                && visibility.is_visible(*position)
        })
        .filter(|(_, (_, answer))| {
            answer
                .value
                .as_choices()
                .is_none_or(|selected| selected.is_empty())
        })
        .map(|(position, _)| ValidationError {
            question_index: position,
            message: REQUIRED_SELECTION_MESSAGE.into(),
            code: "required_selection".into(),
        })
        .collect();

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

pub fn can_submit(questions: &[Question], answers: &AnswerSet) -> bool {
    validate(questions, answers).valid
}
