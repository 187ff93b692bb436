use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::answers::{AnswerSet, AnswerValue};
use crate::spec::question::{ConditionRelation, Question, QuestionType, VisibleCondition};

/// Hidden flag per question position; `true` means hidden.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityMap(BTreeMap<usize, bool>);

impl VisibilityMap {
    pub fn is_hidden(&self, index: usize) -> bool {
        self.0.get(&index).copied().unwrap_or(false)
    }

    pub fn is_visible(&self, index: usize) -> bool {
        !self.is_hidden(index)
    }

    pub fn hidden_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .filter(|(_, hidden)| **hidden)
            .map(|(index, _)| *index)
    }

    pub fn visible_count(&self) -> usize {
        self.0.values().filter(|hidden| !**hidden).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(usize, bool)> for VisibilityMap {
    fn from_iter<T: IntoIterator<Item = (usize, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Recomputes every question's hidden flag from scratch.
///
/// Pure: the questions and answers are only read. Conditions may point at any
/// question, so the whole list is evaluated on every call.
pub fn resolve_visibility(questions: &[Question], answers: &AnswerSet) -> VisibilityMap {
    let map: VisibilityMap = questions
        .iter()
        .enumerate()
        .map(|(position, question)| (position, is_hidden(questions, answers, question)))
        .collect();
    debug!(
        questions = questions.len(),
        visible = map.visible_count(),
        "visibility recomputed"
    );
    map
}

fn is_hidden(questions: &[Question], answers: &AnswerSet, question: &Question) -> bool {
    if question.question_type == QuestionType::Category || question.visible_condition.is_empty() {
        return false;
    }
    !question
        .visible_condition
        .iter()
        .any(|condition| condition_satisfied(questions, answers, condition))
}

/// Evaluates one condition against the parent's current answer.
///
/// Satisfaction is value equality whatever `relation` says. A dangling,
/// unanswered or unsupported parent never satisfies a condition.
pub fn condition_satisfied(
    questions: &[Question],
    answers: &AnswerSet,
    condition: &VisibleCondition,
) -> bool {
    if condition.relation != ConditionRelation::EqualTo {
        debug!(
            parent = condition.parent_index,
            "condition relation is not EQUAL_TO; comparing for equality"
        );
    }
    let index = condition.parent_index;
    let (Some(parent), Some(answer)) = (questions.get(index), answers.get(index)) else {
        warn!(parent = index, "condition refers to a missing question");
        return false;
    };
    if answer.value.is_blank() {
        return false;
    }

    let expected = &condition.expected;
    match parent.question_type {
        QuestionType::MultipleChoice | QuestionType::MultipleSelect => {
            let AnswerValue::Choices(selected) = &answer.value else {
                return false;
            };
            let expected_ids = expected.mc_id_array.as_deref().unwrap_or_default();
            !expected_ids.is_empty()
                && expected_ids.len() == selected.len()
                && expected_ids.iter().all(|id| {
                    parent
                        .option_text(*id)
                        .is_some_and(|text| selected.iter().any(|choice| choice == text))
                })
        }
        QuestionType::String => match (&answer.value, expected.text.as_deref()) {
            (AnswerValue::Text(text), Some(expected_text)) => text == expected_text,
            _ => false,
        },
        QuestionType::Integer | QuestionType::Date | QuestionType::Datetime => {
            match (&answer.value, expected.number) {
                (AnswerValue::Number(number), Some(expected_number)) => *number == expected_number,
                _ => false,
            }
        }
        QuestionType::Category | QuestionType::Unsupported => {
            debug!(
                parent = index,
                parent_type = %parent.question_type,
                "condition parent type cannot satisfy conditions"
            );
            false
        }
    }
}
