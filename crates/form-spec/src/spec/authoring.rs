//! Template-authoring question shapes.
//!
//! The builder works with questions that carry one text/option set per
//! language. They are kept apart from answerable [`Question`]s by an explicit
//! `shape` discriminant and converted before they reach the engine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::spec::form::FormTemplate;
use crate::spec::question::{McOption, Question, QuestionType, VisibleCondition};

/// Question text and options for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LangVersion {
    pub lang: String,
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mc_options: Vec<McOption>,
}

/// Question as edited in the template builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub question_index: usize,
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
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
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visible_condition: Vec<VisibleCondition>,
    #[serde(default)]
    pub lang_versions: Vec<LangVersion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateQuestion {
    /// Picks the version for `lang`, falling back to the first one.
    pub fn lang_version(&self, lang: &str) -> Option<&LangVersion> {
        self.lang_versions
            .iter()
            .find(|version| version.lang == lang)
            .or_else(|| self.lang_versions.first())
    }

    pub fn to_question(&self, lang: &str) -> Question {
        let version = self.lang_version(lang);
        if version.is_none() {
            warn!(
                question_index = self.question_index,
                "authoring question has no language versions"
            );
        }
        Question {
            id: self.id.clone(),
            question_index: self.question_index,
            question_type: self.question_type,
            question_text: version
                .map(|version| version.question_text.clone())
                .unwrap_or_default(),
            required: self.required,
            mc_options: version
                .map(|version| version.mc_options.clone())
                .unwrap_or_default(),
            num_min: self.num_min,
            num_max: self.num_max,
            string_max_length: self.string_max_length,
            units: self.units.clone(),
            category_index: self.category_index,
            visible_condition: self.visible_condition.clone(),
            answers: None,
            extra: self.extra.clone(),
        }
    }
}

/// Either shape of question, told apart by the `shape` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SchemaQuestion {
    Answerable(Question),
    Authoring(TemplateQuestion),
}

impl SchemaQuestion {
    pub fn question_index(&self) -> usize {
        match self {
            SchemaQuestion::Answerable(question) => question.question_index,
            SchemaQuestion::Authoring(question) => question.question_index,
        }
    }

    pub fn into_question(self, lang: &str) -> Question {
        match self {
            SchemaQuestion::Answerable(question) => question,
            SchemaQuestion::Authoring(question) => question.to_question(lang),
        }
    }
}

/// Template being authored; may mix both question shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormDraft {
    pub questions: Vec<SchemaQuestion>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl FormDraft {
    /// Resolves every question to `lang` so the draft can be previewed.
    pub fn into_template(mut self, lang: &str) -> FormTemplate {
        self.metadata.remove("lang");
        let questions = self
            .questions
            .into_iter()
            .map(|question| question.into_question(lang))
            .collect();
        let mut template = FormTemplate::from_questions(questions);
        template.id = take_string(&mut self.metadata, "id");
        template.version = take_string(&mut self.metadata, "version");
        template.classification = self
            .metadata
            .remove("classification")
            .and_then(|value| serde_json::from_value(value).ok());
        template.lang = Some(lang.to_string());
        template.extra = self.metadata;
        template
    }
}

fn take_string(metadata: &mut Map<String, Value>, key: &str) -> Option<String> {
    match metadata.remove(key)? {
        Value::String(text) => Some(text),
        other => {
            metadata.insert(key.to_string(), other);
            None
        }
    }
}
