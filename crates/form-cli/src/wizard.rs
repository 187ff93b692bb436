use form_spec::{
    AnswerValue, FormSession, FormTemplate, Question, QuestionType, ValidationResult,
};
use serde_json::Value;

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: progress, hidden questions, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and results while a form is filled in.
pub struct WizardPresenter {
    verbosity: Verbosity,
    current_category: Option<usize>,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            current_category: None,
        }
    }

    pub fn show_header(&self, template: &FormTemplate) {
        let title = template
            .classification
            .as_ref()
            .map(|classification| classification.name.as_str())
            .or(template.id.as_deref())
            .unwrap_or("Untitled form");
        println!("Form: {}", title);
        if self.verbosity.is_verbose() {
            if let Some(version) = &template.version {
                println!("Version: {}", version);
            }
            println!("Questions: {}", template.questions.len());
        }
    }

    /// Prints the section header once when the prompt moves into a new category.
    pub fn enter_category(&mut self, session: &FormSession, question: &Question) {
        let Some(category) = question.category_index else {
            return;
        };
        if self.current_category == Some(category) {
            return;
        }
        self.current_category = Some(category);
        if let Some(header) = session.questions().get(category) {
            println!("== {} ==", header.question_text);
        }
    }

    pub fn show_status(&self, session: &FormSession) {
        if !self.verbosity.is_verbose() {
            return;
        }
        let hidden: Vec<String> = session
            .visibility()
            .hidden_indices()
            .map(|index| index.to_string())
            .collect();
        println!(
            "Visible: {}/{}; hidden: [{}]",
            session.visibility().visible_count(),
            session.questions().len(),
            hidden.join(", ")
        );
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.title);
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if !prompt.choices.is_empty() {
            for (position, choice) in prompt.choices.iter().enumerate() {
                println!("  {}) {}", position + 1, choice);
            }
        }
        if let Some(current) = &prompt.current {
            println!("Current: {} (press enter to keep)", current);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_validation(&self, session: &FormSession, validation: &ValidationResult) {
        for error in &validation.errors {
            let title = session
                .questions()
                .get(error.question_index)
                .map(|question| question.question_text.as_str())
                .unwrap_or("?");
            eprintln!("{}: {}", title, error.message);
        }
    }

    pub fn show_completion(&self, payload: &Value) {
        println!("Done ✅");
        match serde_json::to_string_pretty(payload) {
            Ok(pretty) => println!("{}", pretty),
            Err(err) => eprintln!("Failed to serialize payload: {}", err),
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
    pub current: Option<String>,
}

impl PromptContext {
    pub fn new(question: &Question, current: &AnswerValue, index: usize, total: usize) -> Self {
        Self {
            index,
            total,
            title: question.question_text.clone(),
            required: question.required,
            hint: hint(question),
            choices: question
                .mc_options
                .iter()
                .map(|option| option.text.clone())
                .collect(),
            current: describe_value(current),
        }
    }
}

fn hint(question: &Question) -> Option<String> {
    match question.question_type {
        QuestionType::MultipleChoice => Some("(pick one: number or text)".to_string()),
        QuestionType::MultipleSelect => Some("(comma separated numbers or texts)".to_string()),
        QuestionType::Integer => match (question.num_min, question.num_max) {
            (Some(min), Some(max)) => Some(format!("(integer {}..{})", min, max)),
            _ => Some("(integer)".to_string()),
        },
        QuestionType::Date | QuestionType::Datetime => {
            Some("(unix timestamp in seconds)".to_string())
        }
        QuestionType::String => question
            .string_max_length
            .map(|max| format!("(up to {} characters)", max)),
        QuestionType::Category | QuestionType::Unsupported => None,
    }
}

fn describe_value(value: &AnswerValue) -> Option<String> {
    match value {
        AnswerValue::Choices(selected) if selected.is_empty() => None,
        AnswerValue::Text(text) if text.is_empty() => None,
        AnswerValue::Choices(selected) => Some(selected.join(", ")),
        AnswerValue::Number(number) => Some(number.to_string()),
        AnswerValue::Text(text) => Some(text.clone()),
        AnswerValue::Empty | AnswerValue::Unsupported => None,
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}
