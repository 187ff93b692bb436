use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    Answer, AnswerValue, FormError, FormSession, FormTemplate, QuestionType, SubmitMode,
    ValidationResult,
};

const DEFAULT_TEMPLATE: &str = include_str!("../../form-spec/tests/fixtures/antenatal_form.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse answers: {0}")]
    AnswersParse(#[source] serde_json::Error),
    #[error("failed to parse submission context: {0}")]
    ContextParse(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error("a patientId is required to create a record")]
    MissingPatientId,
    #[error(transparent)]
    Form(#[from] FormError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct ComponentConfig {
    #[serde(default)]
    template_json: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SubmissionContext {
    #[serde(default)]
    patient_id: Option<String>,
    #[serde(default)]
    editing: bool,
}

fn load_template(config_json: &str) -> Result<FormTemplate, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let template_json = config.template_json.as_deref().unwrap_or(DEFAULT_TEMPLATE);

    serde_json::from_str(template_json).map_err(ComponentError::ConfigParse)
}

fn parse_answers(answers_json: &str) -> Result<Vec<Answer>, ComponentError> {
    if answers_json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(answers_json).map_err(ComponentError::AnswersParse)
}

/// Opens the template and replays previously captured answers onto it.
///
/// Slots are matched to questions by their position in the list.
fn open_session(config_json: &str, answers_json: &str) -> Result<FormSession, ComponentError> {
    let mut session = FormSession::open(load_template(config_json)?);
    for (position, answer) in parse_answers(answers_json)?.into_iter().enumerate() {
        if answer.question_type == QuestionType::Unsupported {
            continue;
        }
        session.update_answer(position, answer.value)?;
    }
    Ok(session)
}

fn parse_context(ctx_json: &str) -> Result<SubmissionContext, ComponentError> {
    if ctx_json.trim().is_empty() {
        return Ok(SubmissionContext::default());
    }
    serde_json::from_str(ctx_json).map_err(ComponentError::ContextParse)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn session_state(session: &FormSession) -> Result<Value, ComponentError> {
    let answers = serde_json::to_value(session.answers()).map_err(ComponentError::JsonEncode)?;
    let hidden: Vec<usize> = session.visibility().hidden_indices().collect();
    Ok(json!({
        "answers": answers,
        "hidden": hidden,
        "progress": {
            "visible": session.visibility().visible_count(),
            "total": session.questions().len(),
        },
    }))
}

fn validation_error(validation: &ValidationResult) -> Result<Value, ComponentError> {
    let validation = serde_json::to_value(validation).map_err(ComponentError::JsonEncode)?;
    Ok(json!({
        "status": "error",
        "validation": validation,
    }))
}

pub fn describe(config_json: &str) -> String {
    respond(
        load_template(config_json)
            .and_then(|template| serde_json::to_value(template).map_err(ComponentError::JsonEncode)),
    )
}

pub fn initial_answers(config_json: &str) -> String {
    respond(open_session(config_json, "").and_then(|session| {
        serde_json::to_value(session.answers()).map_err(ComponentError::JsonEncode)
    }))
}

pub fn visibility(config_json: &str, answers_json: &str) -> String {
    respond(open_session(config_json, answers_json).and_then(|session| session_state(&session)))
}

pub fn validate_answers(config_json: &str, answers_json: &str) -> String {
    respond(open_session(config_json, answers_json).and_then(|session| {
        serde_json::to_value(session.validate()).map_err(ComponentError::JsonEncode)
    }))
}

/// Applies one widget edit and returns the new answers and visibility.
pub fn submit_patch(
    config_json: &str,
    answers_json: &str,
    question_index: usize,
    value_json: &str,
) -> String {
    respond(open_session(config_json, answers_json).and_then(|mut session| {
        let value: AnswerValue =
            serde_json::from_str(value_json).map_err(ComponentError::AnswersParse)?;
        debug!(question_index, kind = value.kind(), "applying answer patch");
        session.update_answer(question_index, value)?;
        let mut state = session_state(&session)?;
        state["status"] = Value::String("ok".into());
        Ok(state)
    }))
}

/// Validates and serializes the answers into a create or edit payload.
pub fn build_submission(config_json: &str, answers_json: &str, ctx_json: &str) -> String {
    respond(open_session(config_json, answers_json).and_then(|session| {
        let ctx = parse_context(ctx_json)?;
        let mode = if ctx.editing {
            SubmitMode::Edit
        } else {
            SubmitMode::Create {
                patient_id: ctx.patient_id.ok_or(ComponentError::MissingPatientId)?,
            }
        };
        match session.submission(&mode) {
            Ok(submission) => {
                let payload =
                    serde_json::to_value(submission).map_err(ComponentError::JsonEncode)?;
                Ok(json!({ "status": "ok", "payload": payload }))
            }
            Err(FormError::SubmissionBlocked(validation)) => validation_error(&validation),
            Err(err) => Err(err.into()),
        }
    }))
}
