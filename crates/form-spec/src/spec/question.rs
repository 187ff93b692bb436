use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::answers::WireAnswer;

/// Kinds of questions a template can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// Section header; never answered, always shown.
    Category,
    MultipleChoice,
    MultipleSelect,
    Integer,
    /// Unix-epoch seconds.
    Date,
    /// Unix-epoch seconds.
    Datetime,
    String,
    /// Any type this engine does not understand. Such questions stay inert.
    #[serde(other)]
    Unsupported,
}

impl QuestionType {
    /// Whether answers are lists of option texts.
    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::MultipleSelect)
    }

    /// Whether answers are plain numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            QuestionType::Integer | QuestionType::Date | QuestionType::Datetime
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Category => "CATEGORY",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::MultipleSelect => "MULTIPLE_SELECT",
            QuestionType::Integer => "INTEGER",
            QuestionType::Date => "DATE",
            QuestionType::Datetime => "DATETIME",
            QuestionType::String => "STRING",
            QuestionType::Unsupported => "UNSUPPORTED",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One selectable option. Its position in the owning list is the wire id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct McOption {
    /// Authoring-time id, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcid: Option<u32>,
    #[serde(rename = "opt", alias = "text")]
    pub text: String,
}

impl McOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            mcid: None,
            text: text.into(),
        }
    }
}

/// Comparison used by a visibility condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionRelation {
    #[default]
    EqualTo,
    #[serde(other)]
    Unsupported,
}

/// Shows the owning question when the parent's answer equals `expected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisibleCondition {
    #[serde(rename = "qidx")]
    pub parent_index: usize,
    #[serde(default)]
    pub relation: ConditionRelation,
    #[serde(rename = "answers", default)]
    pub expected: WireAnswer,
}

impl VisibleCondition {
    pub fn options(parent_index: usize, option_ids: impl IntoIterator<Item = usize>) -> Self {
        Self::equal_to(parent_index, WireAnswer::options(option_ids))
    }

    pub fn text(parent_index: usize, text: impl Into<String>) -> Self {
        Self::equal_to(parent_index, WireAnswer::text(text))
    }

    pub fn number(parent_index: usize, number: f64) -> Self {
        Self::equal_to(parent_index, WireAnswer::number(number))
    }

    fn equal_to(parent_index: usize, expected: WireAnswer) -> Self {
        Self {
            parent_index,
            relation: ConditionRelation::EqualTo,
            expected,
        }
    }
}

/// An answerable question as delivered by the template service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Persisted id; only present on questions of a saved record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub question_index: usize,
    pub question_type: QuestionType,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mc_options: Vec<McOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_index: Option<usize>,
    /// Disjunction: any satisfied condition shows the question.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visible_condition: Vec<VisibleCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<WireAnswer>,
    /// Fields this engine does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn new(question_index: usize, question_type: QuestionType, text: impl Into<String>) -> Self {
        Self {
            id: None,
            question_index,
            question_type,
            question_text: text.into(),
            required: false,
            mc_options: Vec::new(),
            num_min: None,
            num_max: None,
            string_max_length: None,
            units: None,
            category_index: None,
            visible_condition: Vec::new(),
            answers: None,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mc_options = options.into_iter().map(McOption::new).collect();
        self
    }

    pub fn with_condition(mut self, condition: VisibleCondition) -> Self {
        self.visible_condition.push(condition);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.num_min = Some(min);
        self.num_max = Some(max);
        self
    }

    pub fn with_answers(mut self, answers: WireAnswer) -> Self {
        self.answers = Some(answers);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Text of the option at `option_id`, if the id is in range.
    pub fn option_text(&self, option_id: usize) -> Option<&str> {
        self.mc_options
            .get(option_id)
            .map(|option| option.text.as_str())
    }

    /// Position of the first option whose text equals `text`.
    pub fn option_id(&self, text: &str) -> Option<usize> {
        self.mc_options.iter().position(|option| option.text == text)
    }
}
