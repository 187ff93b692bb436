#![allow(missing_docs)]

pub mod answers;
pub mod error;
pub mod schema;
pub mod session;
pub mod spec;
pub mod submission;
pub mod validate;
pub mod visibility;

pub use answers::{Answer, AnswerSet, AnswerValue, WireAnswer};
pub use error::FormError;
pub use session::FormSession;
pub use spec::{
    ConditionRelation, FormClassification, FormDraft, FormTemplate, LangVersion, McOption,
    Question, QuestionType, SchemaQuestion, TemplateQuestion, VisibleCondition,
};
pub use submission::{
    CreatePayload, EditAnswer, EditPayload, Submission, SubmitMode, build_create_payload,
    build_edit_payload, build_submission, to_wire_answer, wire_answers,
};
pub use validate::{ValidationError, ValidationResult, can_submit, validate, validate_with};
pub use visibility::{VisibilityMap, condition_satisfied, resolve_visibility};
