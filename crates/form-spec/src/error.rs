use thiserror::Error;

use crate::spec::question::QuestionType;
use crate::validate::ValidationResult;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("question index {index} is out of range for a form of {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("question {index} ({question_type}) cannot hold a {value_kind} answer")]
    AnswerShape {
        index: usize,
        question_type: QuestionType,
        value_kind: &'static str,
    },
    #[error("form has {questions} questions but {answers} answer slots")]
    Misaligned { questions: usize, answers: usize },
    #[error("question {0} has no persisted id; edit submissions need one")]
    MissingQuestionId(usize),
    #[error("submission blocked by {} validation error(s)", .0.errors.len())]
    SubmissionBlocked(ValidationResult),
    #[error("failed to parse form template: {0}")]
    Template(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    Encode(#[source] serde_json::Error),
}
