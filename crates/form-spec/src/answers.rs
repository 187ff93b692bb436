use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FormError;
use crate::spec::question::{Question, QuestionType};

/// Answer in the shape the persistence API stores and conditions compare with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WireAnswer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mc_id_array: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
}

impl WireAnswer {
    /// Canonical empty answer sent for hidden and category questions.
    pub fn blank() -> Self {
        Self {
            mc_id_array: Some(Vec::new()),
            text: None,
            number: None,
        }
    }

    pub fn options(option_ids: impl IntoIterator<Item = usize>) -> Self {
        Self {
            mc_id_array: Some(option_ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn number(number: f64) -> Self {
        Self {
            number: Some(number),
            ..Self::default()
        }
    }
}

/// In-memory value of one answer slot.
///
/// Choice answers hold the selected option *texts*; translation to option ids
/// happens only when building wire payloads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choices(Vec<String>),
    Number(f64),
    Text(String),
    #[default]
    Empty,
    /// Slot of a question whose type the engine does not support.
    #[serde(skip_deserializing)]
    Unsupported,
}

impl AnswerValue {
    /// True when the value counts as "not answered" for visibility purposes.
    ///
    /// Mirrors the falsy check the form has always used: zero and NaN are
    /// blank numbers, the empty string is a blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Choices(selected) => selected.is_empty(),
            AnswerValue::Number(number) => *number == 0.0 || number.is_nan(),
            AnswerValue::Text(text) => text.is_empty(),
            AnswerValue::Empty | AnswerValue::Unsupported => true,
        }
    }

    pub fn as_choices(&self) -> Option<&[String]> {
        match self {
            AnswerValue::Choices(selected) => Some(selected),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnswerValue::Choices(_) => "choices",
            AnswerValue::Number(_) => "number",
            AnswerValue::Text(_) => "text",
            AnswerValue::Empty => "empty",
            AnswerValue::Unsupported => "unsupported",
        }
    }

    /// Whether this value may be stored for a question of `question_type`.
    pub fn fits(&self, question_type: QuestionType) -> bool {
        match (self, question_type) {
            (AnswerValue::Empty, QuestionType::Unsupported) => false,
            (AnswerValue::Empty, _) => true,
            (AnswerValue::Unsupported, QuestionType::Unsupported) => true,
            (AnswerValue::Choices(_), kind) => kind.is_choice(),
            (AnswerValue::Number(_), kind) => kind.is_numeric(),
            (AnswerValue::Text(_), QuestionType::String) => true,
            _ => false,
        }
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(selected: Vec<String>) -> Self {
        AnswerValue::Choices(selected)
    }
}

impl From<&str> for AnswerValue {
    fn from(text: &str) -> Self {
        AnswerValue::Text(text.to_string())
    }
}

impl From<f64> for AnswerValue {
    fn from(number: f64) -> Self {
        AnswerValue::Number(number)
    }
}

/// Current answer for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_index: usize,
    pub question_type: QuestionType,
    pub value: AnswerValue,
}

impl Answer {
    /// Builds the initial answer from whatever the record already stores.
    pub fn derive(question: &Question) -> Self {
        let stored = question.answers.as_ref();
        let value = match question.question_type {
            QuestionType::Category => AnswerValue::Empty,
            QuestionType::MultipleChoice | QuestionType::MultipleSelect => {
                let ids = stored
                    .and_then(|answer| answer.mc_id_array.as_deref())
                    .unwrap_or_default();
                AnswerValue::Choices(resolve_option_texts(question, ids))
            }
            QuestionType::String => stored
                .and_then(|answer| answer.text.clone())
                .map(AnswerValue::Text)
                .unwrap_or_default(),
            QuestionType::Integer | QuestionType::Date | QuestionType::Datetime => stored
                .and_then(|answer| answer.number)
                .map(AnswerValue::Number)
                .unwrap_or_default(),
            QuestionType::Unsupported => {
                warn!(
                    question_index = question.question_index,
                    "unsupported question type; answer left inert"
                );
                AnswerValue::Unsupported
            }
        };
        Self {
            question_index: question.question_index,
            question_type: question.question_type,
            value,
        }
    }
}

fn resolve_option_texts(question: &Question, ids: &[usize]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| {
            let text = question.option_text(*id);
            if text.is_none() {
                warn!(
                    question_index = question.question_index,
                    option_id = id,
                    "stored option id is not in the option list"
                );
            }
            text.map(str::to_string)
        })
        .collect()
}

/// Answer slots aligned with the question list: `answers[i]` belongs to
/// `questions[i]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(Vec<Answer>);

impl AnswerSet {
    /// Slot `i` belongs to `questions[i]` and carries `i` as its index, even
    /// when the template numbers its questions differently.
    pub fn initialize(questions: &[Question]) -> Self {
        Self(
            questions
                .iter()
                .enumerate()
                .map(|(position, question)| Answer {
                    question_index: position,
                    ..Answer::derive(question)
                })
                .collect(),
        )
    }

    /// Returns a new snapshot with slot `index` replaced. `self` is untouched.
    pub fn update(&self, index: usize, value: AnswerValue) -> Result<Self, FormError> {
        let len = self.0.len();
        let slot = self
            .0
            .get(index)
            .ok_or(FormError::IndexOutOfRange { index, len })?;
        if !value.fits(slot.question_type) {
            return Err(FormError::AnswerShape {
                index,
                question_type: slot.question_type,
                value_kind: value.kind(),
            });
        }
        let mut next = self.0.clone();
        next[index].value = value;
        Ok(Self(next))
    }

    pub fn get(&self, index: usize) -> Option<&Answer> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Answer> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Answer] {
        &self.0
    }

    pub(crate) fn as_mut_vec(&mut self) -> &mut Vec<Answer> {
        &mut self.0
    }

    pub fn into_inner(self) -> Vec<Answer> {
        self.0
    }
}

impl From<Vec<Answer>> for AnswerSet {
    fn from(answers: Vec<Answer>) -> Self {
        Self(answers)
    }
}

impl<'a> IntoIterator for &'a AnswerSet {
    type Item = &'a Answer;
    type IntoIter = std::slice::Iter<'a, Answer>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
