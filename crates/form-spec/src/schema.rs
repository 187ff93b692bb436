//! JSON schemas for the documents this crate reads and writes.

use schemars::schema_for;
use serde_json::Value;

use crate::spec::authoring::FormDraft;
use crate::spec::form::FormTemplate;
use crate::submission::{CreatePayload, EditPayload};

pub fn template_schema() -> Value {
    schema_for!(FormTemplate).to_value()
}

pub fn draft_schema() -> Value {
    schema_for!(FormDraft).to_value()
}

pub fn create_payload_schema() -> Value {
    schema_for!(CreatePayload).to_value()
}

pub fn edit_payload_schema() -> Value {
    schema_for!(EditPayload).to_value()
}
