use form_spec::{
    AnswerValue, FormDraft, FormError, FormSession, FormTemplate, Question, QuestionType,
    SchemaQuestion, VisibleCondition, WireAnswer,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "antenatal_form" => include_str!("../tests/fixtures/antenatal_form.json"),
        "saved_record" => include_str!("../tests/fixtures/saved_record.json"),
        "antenatal_draft" => include_str!("../tests/fixtures/antenatal_draft.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn choices(texts: &[&str]) -> AnswerValue {
    AnswerValue::Choices(texts.iter().map(|text| text.to_string()).collect())
}

fn value(session: &FormSession, index: usize) -> &AnswerValue {
    &session.answers().get(index).expect("answer slot").value
}

#[test]
fn saved_record_answers_are_derived() {
    let session = FormSession::from_json(fixture("saved_record")).expect("record");
    assert_eq!(session.answers().len(), session.questions().len());
    assert_eq!(value(&session, 0), &AnswerValue::Text("Penicillin".into()));
    assert_eq!(value(&session, 1), &choices(&["Yes"]));
    assert_eq!(value(&session, 2), &AnswerValue::Number(12.0));
    assert_eq!(value(&session, 3), &choices(&["Nausea", "Headache"]));
    assert_eq!(value(&session, 4), &AnswerValue::Unsupported);
    assert!(!session.is_hidden(2));
}

#[test]
fn fresh_template_starts_blank() {
    let session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    assert_eq!(value(&session, 0), &AnswerValue::Empty);
    assert_eq!(value(&session, 1), &choices(&[]));
    assert_eq!(value(&session, 4), &AnswerValue::Empty);
    assert_eq!(value(&session, 6), &AnswerValue::Empty);
}

#[test]
fn answer_slots_are_numbered_by_position() {
    let questions = vec![
        Question::new(1, QuestionType::String, "Notes"),
        Question::new(2, QuestionType::Integer, "Count"),
    ];
    let mut session = FormSession::open(FormTemplate::from_questions(questions));
    let indices: Vec<usize> = session
        .answers()
        .iter()
        .map(|answer| answer.question_index)
        .collect();
    assert_eq!(indices, vec![0, 1]);

    session.update_answer(0, "hi".into()).expect("update");
    assert_eq!(value(&session, 0), &AnswerValue::Text("hi".into()));
    assert_eq!(session.questions()[0].question_index, 1);
}

#[test]
fn stale_option_ids_are_skipped() {
    let question = Question::new(0, QuestionType::MultipleSelect, "Pick")
        .with_options(["A", "B"])
        .with_answers(WireAnswer::options([1, 5]));
    let session = FormSession::open(FormTemplate::from_questions(vec![question]));
    assert_eq!(value(&session, 0), &choices(&["B"]));
}

#[test]
fn update_produces_a_new_snapshot() {
    let mut session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    let before = session.answers().clone();

    session.update_answer(1, choices(&["Yes"])).expect("update");

    assert_eq!(before.get(1).map(|answer| &answer.value), Some(&choices(&[])));
    assert_eq!(value(&session, 1), &choices(&["Yes"]));
    for index in [0, 2, 3, 4, 5, 6] {
        assert_eq!(before.get(index), session.answers().get(index));
    }
}

#[test]
fn update_rejects_bad_index_and_shape() {
    let mut session = FormSession::from_json(fixture("antenatal_form")).expect("template");

    let err = session.update_answer(42, AnswerValue::Empty).unwrap_err();
    assert!(matches!(err, FormError::IndexOutOfRange { index: 42, len: 7 }));

    let err = session.update_answer(2, "twelve".into()).unwrap_err();
    assert!(matches!(
        err,
        FormError::AnswerShape {
            index: 2,
            question_type: QuestionType::Integer,
            ..
        }
    ));

    let err = session.update_answer(4, "x".into()).unwrap_err();
    assert!(matches!(err, FormError::AnswerShape { index: 4, .. }));
}

#[test]
fn visible_questions_follow_answers() {
    let mut session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    session.update_answer(1, choices(&["Yes"])).expect("update");
    let titles: Vec<&str> = session
        .visible_questions()
        .map(|(question, _)| question.question_text.as_str())
        .collect();
    assert_eq!(
        titles,
        vec!["Allergies", "Pregnant?", "Weeks pregnant", "Symptoms", "Follow up"]
    );
}

#[test]
fn removing_a_question_keeps_slots_aligned() {
    let mut session = FormSession::from_json(fixture("antenatal_form")).expect("template");
    session.update_answer(0, "Latex".into()).expect("update");
    session.update_answer(1, choices(&["Yes"])).expect("update");
    session.update_answer(3, choices(&["Bleeding"])).expect("update");

    let removed = session.remove_question(2).expect("remove");
    assert_eq!(removed.question_text, "Weeks pregnant");
    assert_eq!(session.questions().len(), 6);
    assert_eq!(session.answers().len(), 6);

    for (position, (question, answer)) in session
        .questions()
        .iter()
        .zip(session.answers())
        .enumerate()
    {
        assert_eq!(question.question_index, position);
        assert_eq!(answer.question_index, position);
        assert_eq!(answer.question_type, question.question_type);
    }

    // symptoms moved to 2, bleeding detail to 4 and still follows symptoms
    assert_eq!(session.questions()[4].visible_condition[0].parent_index, 2);
    assert!(!session.is_hidden(4));
    assert_eq!(session.questions()[4].category_index, Some(3));

    // next visit lost its weeks condition but keeps the allergy one
    let next_visit = &session.questions()[5];
    assert_eq!(next_visit.visible_condition.len(), 1);
    assert_eq!(next_visit.visible_condition[0].parent_index, 0);
    assert!(!session.is_hidden(5));
}

#[test]
fn moving_a_question_rewrites_parent_indices() {
    let questions = vec![
        Question::new(0, QuestionType::MultipleChoice, "Smoker?").with_options(["Yes", "No"]),
        Question::new(1, QuestionType::Integer, "Packs per day")
            .with_condition(VisibleCondition::options(0, [0])),
        Question::new(2, QuestionType::String, "Notes"),
    ];
    let mut session = FormSession::open(FormTemplate::from_questions(questions));
    session.update_answer(0, choices(&["Yes"])).expect("update");
    session.update_answer(1, AnswerValue::Number(2.0)).expect("update");

    session.move_question(0, 2).expect("move");

    let texts: Vec<&str> = session
        .questions()
        .iter()
        .map(|question| question.question_text.as_str())
        .collect();
    assert_eq!(texts, vec!["Packs per day", "Notes", "Smoker?"]);
    assert_eq!(session.questions()[0].visible_condition[0].parent_index, 2);
    assert_eq!(value(&session, 0), &AnswerValue::Number(2.0));
    assert_eq!(value(&session, 2), &choices(&["Yes"]));
    assert!(!session.is_hidden(0));

    let err = session.move_question(0, 3).unwrap_err();
    assert!(matches!(err, FormError::IndexOutOfRange { index: 3, len: 3 }));
}

#[test]
fn draft_previews_in_the_requested_language() {
    let draft: FormDraft = serde_json::from_str(fixture("antenatal_draft")).expect("draft");
    assert!(matches!(draft.questions[0], SchemaQuestion::Authoring(_)));
    assert!(matches!(draft.questions[1], SchemaQuestion::Answerable(_)));

    let template = draft.into_template("French");
    assert_eq!(template.lang.as_deref(), Some("French"));
    assert_eq!(template.questions[0].question_text, "Enceinte ?");

    let mut session = FormSession::open(template);
    assert!(session.is_hidden(1));
    session.update_answer(0, choices(&["Oui"])).expect("update");
    assert!(!session.is_hidden(1));
}

#[test]
fn draft_falls_back_to_first_language() {
    let draft: FormDraft = serde_json::from_str(fixture("antenatal_draft")).expect("draft");
    let template = draft.into_template("Swahili");
    assert_eq!(template.questions[0].question_text, "Pregnant?");
    assert_eq!(template.questions[0].mc_options[1].text, "No");
}
