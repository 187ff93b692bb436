pub mod authoring;
pub mod form;
pub mod question;

pub use authoring::{FormDraft, LangVersion, SchemaQuestion, TemplateQuestion};
pub use form::{FormClassification, FormTemplate};
pub use question::{ConditionRelation, McOption, Question, QuestionType, VisibleCondition};
