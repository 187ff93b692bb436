use serde_json::{Value, json};

use form_spec::{
    Answer, AnswerSet, AnswerValue, FormError, FormSession, Question, QuestionType, Submission,
    SubmitMode, VisibilityMap, WireAnswer, build_edit_payload, can_submit, to_wire_answer,
    wire_answers,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "antenatal_form" => include_str!("../tests/fixtures/antenatal_form.json"),
        "saved_record" => include_str!("../tests/fixtures/saved_record.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn choices(texts: &[&str]) -> AnswerValue {
    AnswerValue::Choices(texts.iter().map(|text| text.to_string()).collect())
}

fn create_mode() -> SubmitMode {
    SubmitMode::Create {
        patient_id: "patient-7".into(),
    }
}

fn submit_json(session: &FormSession, mode: &SubmitMode) -> Value {
    let submission = session.submission(mode).expect("submission");
    serde_json::to_value(submission).expect("json")
}

#[test]
fn option_texts_round_trip_through_ids() {
    let question =
        Question::new(0, QuestionType::MultipleSelect, "Pick").with_options(["A", "B", "C"]);
    let wire = to_wire_answer(&question, &choices(&["A", "C"]));
    assert_eq!(wire.mc_id_array, Some(vec![0, 2]));

    let persisted = question.with_answers(WireAnswer::options([0, 2]));
    assert_eq!(Answer::derive(&persisted).value, choices(&["A", "C"]));
}

#[test]
fn hidden_answers_are_blanked_on_submit() {
    let mut session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    session.update_answer(1, choices(&["Yes"])).expect("update");
    session.update_answer(2, AnswerValue::Number(20.0)).expect("update");
    session.update_answer(3, choices(&["Nausea"])).expect("update");
    session.update_answer(1, choices(&["No"])).expect("update");

    assert_eq!(
        session.answers().get(2).map(|answer| &answer.value),
        Some(&AnswerValue::Number(20.0)),
        "store keeps the stale value"
    );

    let payload = submit_json(&session, &create_mode());
    assert_eq!(payload["questions"][2]["answers"], json!({ "mcIdArray": [] }));
    assert_eq!(payload["questions"][3]["answers"], json!({ "mcIdArray": [] }));
    assert_eq!(payload["questions"][1]["answers"], json!({ "mcIdArray": [1] }));
}

#[test]
fn create_payload_strips_template_only_fields() {
    let mut session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    session.update_answer(0, "Latex".into()).expect("update");
    session.update_answer(1, choices(&["Yes"])).expect("update");
    session.update_answer(2, AnswerValue::Number(36.0)).expect("update");
    session.update_answer(3, choices(&["Headache", "Nausea"])).expect("update");
    session.update_answer(6, AnswerValue::Number(1_700_600_000.0)).expect("update");

    let payload = submit_json(&session, &create_mode());
    assert_eq!(payload["patientId"], "patient-7");
    assert_eq!(payload["id"], "tmpl-antenatal");
    assert_eq!(payload["classification"]["name"], "Antenatal intake");
    assert!(payload.get("version").is_none());

    let questions = payload["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 7);
    for question in questions {
        assert!(question.get("id").is_none());
        assert!(question.get("shouldHidden").is_none());
        assert!(question.get("answers").is_some());
    }
    assert_eq!(questions[0]["answers"], json!({ "text": "Latex" }));
    assert_eq!(questions[2]["answers"], json!({ "number": 36.0 }));
    assert_eq!(questions[2]["numMax"], json!(45.0));
    assert_eq!(questions[3]["answers"], json!({ "mcIdArray": [2, 0] }));
    assert_eq!(questions[4]["answers"], json!({ "mcIdArray": [] }));
    assert_eq!(questions[5]["answers"], json!({ "mcIdArray": [] }));
    assert_eq!(questions[6]["answers"], json!({ "number": 1_700_600_000.0 }));
}

#[test]
fn edit_payload_pairs_persisted_ids_with_answers() {
    let session = FormSession::from_json(fixture("saved_record")).expect("record");
    let payload = submit_json(&session, &SubmitMode::Edit);
    assert_eq!(
        payload,
        json!({
            "questions": [
                { "questionId": "q-allergies", "answer": { "text": "Penicillin" } },
                { "questionId": "q-pregnant", "answer": { "mcIdArray": [0] } },
                { "questionId": "q-weeks", "answer": { "number": 12.0 } },
                { "questionId": "q-symptoms", "answer": { "mcIdArray": [0, 2] } },
                { "questionId": "q-referral", "answer": { "mcIdArray": [] } }
            ]
        })
    );
}

#[test]
fn edit_payload_requires_persisted_ids() {
    let questions = vec![Question::new(0, QuestionType::String, "Notes")];
    let answers = AnswerSet::initialize(&questions);
    let err = build_edit_payload(&questions, &answers, &VisibilityMap::default()).unwrap_err();
    assert!(matches!(err, FormError::MissingQuestionId(0)));
}

#[test]
fn misaligned_answers_are_rejected() {
    let questions = vec![Question::new(0, QuestionType::String, "Notes")];
    let err = wire_answers(&questions, &AnswerSet::default(), &VisibilityMap::default())
        .unwrap_err();
    assert!(matches!(
        err,
        FormError::Misaligned {
            questions: 1,
            answers: 0
        }
    ));
}

#[test]
fn required_visible_multi_select_blocks_submission() {
    let mut session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    session.update_answer(1, choices(&["Yes"])).expect("update");

    let validation = session.validate();
    assert!(!validation.valid);
    let error = validation.error_for(3).expect("inline error");
    assert_eq!(error.code, "required_selection");

    let err = session.submission(&create_mode()).unwrap_err();
    assert!(matches!(err, FormError::SubmissionBlocked(result) if result.errors.len() == 1));
    assert!(!can_submit(session.questions(), session.answers()));
}

#[test]
fn hidden_required_multi_select_does_not_block() {
    let mut session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    session.update_answer(1, choices(&["No"])).expect("update");

    assert!(session.validate().valid);
    let submission = session.submission(&create_mode()).expect("submission");
    assert!(matches!(submission, Submission::Create(_)));
}

#[test]
fn required_multiple_choice_is_not_enforced_by_engine() {
    let session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    assert!(session.questions()[1].required);
    assert!(session.validate().valid);
}
