use tracing::debug;

use crate::answers::{Answer, AnswerSet, AnswerValue};
use crate::error::FormError;
use crate::spec::form::FormTemplate;
use crate::spec::question::Question;
use crate::submission::{Submission, SubmitMode, build_submission};
use crate::validate::{ValidationResult, validate_with};
use crate::visibility::{VisibilityMap, resolve_visibility};

/// One open form: the template, the current answers and the visibility
/// derived from them.
///
/// Every mutation re-runs the visibility pass before returning, so
/// [`FormSession::visibility`] always matches [`FormSession::answers`].
#[derive(Debug, Clone)]
pub struct FormSession {
    template: FormTemplate,
    answers: AnswerSet,
    visibility: VisibilityMap,
}

impl FormSession {
    pub fn open(template: FormTemplate) -> Self {
        let answers = AnswerSet::initialize(&template.questions);
        let visibility = resolve_visibility(&template.questions, &answers);
        Self {
            template,
            answers,
            visibility,
        }
    }

    pub fn from_json(template_json: &str) -> Result<Self, FormError> {
        let template: FormTemplate =
            serde_json::from_str(template_json).map_err(FormError::Template)?;
        Ok(Self::open(template))
    }

    /// Reopens `template` with previously captured answer slots.
    pub fn with_answers(template: FormTemplate, answers: AnswerSet) -> Result<Self, FormError> {
        if template.questions.len() != answers.len() {
            return Err(FormError::Misaligned {
                questions: template.questions.len(),
                answers: answers.len(),
            });
        }
        let visibility = resolve_visibility(&template.questions, &answers);
        Ok(Self {
            template,
            answers,
            visibility,
        })
    }

    pub fn template(&self) -> &FormTemplate {
        &self.template
    }

    pub fn questions(&self) -> &[Question] {
        &self.template.questions
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.visibility.is_hidden(index)
    }

    pub fn update_answer(
        &mut self,
        index: usize,
        value: AnswerValue,
    ) -> Result<&AnswerSet, FormError> {
        self.answers = self.answers.update(index, value)?;
        self.refresh();
        Ok(&self.answers)
    }

    /// Questions currently shown, with their answers, in template order.
    pub fn visible_questions(&self) -> impl Iterator<Item = (&Question, &Answer)> {
        self.template
            .questions
            .iter()
            .zip(&self.answers)
            .enumerate()
            .filter(move |(position, _)| self.visibility.is_visible(*position))
            .map(|(_, pair)| pair)
    }

    pub fn validate(&self) -> ValidationResult {
        validate_with(&self.template.questions, &self.answers, &self.visibility)
    }

    pub fn submission(&self, mode: &SubmitMode) -> Result<Submission, FormError> {
        build_submission(&self.template, &self.answers, &self.visibility, mode)
    }

    /// Deletes a question and its answer slot.
    ///
    /// Later questions shift down by one; conditions on the removed question
    /// are dropped and the remaining parent indices follow the shift.
    pub fn remove_question(&mut self, index: usize) -> Result<Question, FormError> {
        let len = self.template.questions.len();
        if index >= len {
            return Err(FormError::IndexOutOfRange { index, len });
        }
        let removed = self.template.questions.remove(index);
        self.answers.as_mut_vec().remove(index);
        self.remap(|old| match old.cmp(&index) {
            std::cmp::Ordering::Less => Some(old),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(old - 1),
        });
        debug!(index, "question removed");
        Ok(removed)
    }

    /// Moves a question (and its answer slot) from `from` to `to`.
    pub fn move_question(&mut self, from: usize, to: usize) -> Result<(), FormError> {
        let len = self.template.questions.len();
        for index in [from, to] {
            if index >= len {
                return Err(FormError::IndexOutOfRange { index, len });
            }
        }
        let question = self.template.questions.remove(from);
        self.template.questions.insert(to, question);
        let answers = self.answers.as_mut_vec();
        let answer = answers.remove(from);
        answers.insert(to, answer);

        let mut order: Vec<usize> = (0..len).collect();
        let moved = order.remove(from);
        order.insert(to, moved);
        let mut new_position = vec![0; len];
        for (position, old) in order.into_iter().enumerate() {
            new_position[old] = position;
        }
        self.remap(|old| Some(new_position.get(old).copied().unwrap_or(old)));
        debug!(from, to, "question moved");
        Ok(())
    }

    fn remap(&mut self, new_index: impl Fn(usize) -> Option<usize>) {
        for (position, question) in self.template.questions.iter_mut().enumerate() {
            question.question_index = position;
            question
                .visible_condition
                .retain(|condition| new_index(condition.parent_index).is_some());
            for condition in &mut question.visible_condition {
                if let Some(parent) = new_index(condition.parent_index) {
                    condition.parent_index = parent;
                }
            }
            question.category_index = question.category_index.and_then(&new_index);
        }
        for (position, answer) in self.answers.as_mut_vec().iter_mut().enumerate() {
            answer.question_index = position;
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.visibility = resolve_visibility(&self.template.questions, &self.answers);
    }
}
