mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_form::submit_patch;
use form_spec::{
    Answer, AnswerValue, FormDraft, FormError, FormSession, FormTemplate, Question, QuestionType,
    SubmitMode, ValidationResult, schema,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wizard::{AnswerParseError, PromptContext, Verbosity, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const DEFAULT_LOG_FILTER: &str = "form_spec=warn,component_form=warn,form_engine=info";
const VERBOSE_LOG_FILTER: &str = "form_spec=debug,component_form=debug,form_engine=debug";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Questionnaire engine CLI",
    long_about = "Fills, checks and serializes data-driven questionnaires whose questions show or hide based on earlier answers"
)]
struct Cli {
    /// Log engine decisions (visibility passes, dropped options) to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

/// Where a template file comes from.
#[derive(clap::Args)]
struct TemplateArgs {
    /// Path to the template (or saved record) JSON.
    #[arg(long, value_name = "TEMPLATE")]
    template: PathBuf,
    /// Treat the template as a builder draft and preview it in this language.
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,
    /// Optional JSON file with answers, either `{"<index>": value}` or a list of answer slots.
    #[arg(long, value_name = "ANSWERS")]
    answers: Option<PathBuf>,
}

#[derive(clap::Args)]
struct SubmitArgs {
    /// Patient the new record belongs to.
    #[arg(long, value_name = "ID", conflicts_with = "edit")]
    patient_id: Option<String>,
    /// Build the edit payload for a saved record instead of a create payload.
    #[arg(long)]
    edit: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaTarget {
    Template,
    Draft,
    Create,
    Edit,
}

#[derive(Subcommand)]
enum Command {
    /// Fill in a form question by question, then print the payload.
    Fill {
        #[command(flatten)]
        source: TemplateArgs,
        #[command(flatten)]
        submit: SubmitArgs,
    },
    /// Show which questions are visible for the given answers.
    Visibility {
        #[command(flatten)]
        source: TemplateArgs,
    },
    /// Check the submission rules for the given answers.
    Validate {
        #[command(flatten)]
        source: TemplateArgs,
    },
    /// Print the create or edit payload for the given answers.
    Submit {
        #[command(flatten)]
        source: TemplateArgs,
        #[command(flatten)]
        submit: SubmitArgs,
    },
    /// Apply one answer and print the resulting answer slots and hidden questions.
    Patch {
        #[command(flatten)]
        source: TemplateArgs,
        /// Position of the question to answer.
        #[arg(long)]
        index: usize,
        /// Answer value as JSON, e.g. '["Yes"]', 12 or '"text"'.
        #[arg(long, value_name = "JSON")]
        value: String,
    },
    /// Print the JSON schema of a document this tool reads or writes.
    Schema {
        #[arg(value_enum)]
        target: SchemaTarget,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Fill { source, submit } => run_fill(source, submit, cli.verbose),
        Command::Visibility { source } => run_visibility(source),
        Command::Validate { source } => run_validate(source),
        Command::Submit { source, submit } => run_submit(source, submit),
        Command::Patch {
            source,
            index,
            value,
        } => run_patch(source, index, &value),
        Command::Schema { target } => run_schema(target),
    }
}

fn init_logging(verbose: bool) -> CliResult<()> {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()?;
    Ok(())
}

/// Answers file layouts accepted on the command line.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswersFile {
    Slots(Vec<Answer>),
    ByIndex(BTreeMap<String, AnswerValue>),
}

fn load_template(path: &Path, lang: Option<&str>) -> CliResult<FormTemplate> {
    let contents = fs::read_to_string(path)?;
    let template = match lang {
        Some(lang) => {
            let draft: FormDraft = serde_json::from_str(&contents)?;
            draft.into_template(lang)
        }
        None => serde_json::from_str(&contents)?,
    };
    Ok(template)
}

fn open_session(source: &TemplateArgs) -> CliResult<FormSession> {
    let template = load_template(&source.template, source.lang.as_deref())?;
    let mut session = FormSession::open(template);
    let Some(path) = &source.answers else {
        return Ok(session);
    };

    let contents = fs::read_to_string(path)?;
    let updates: Vec<(usize, AnswerValue)> = match serde_json::from_str(&contents)? {
        AnswersFile::Slots(slots) => slots
            .into_iter()
            .enumerate()
            .filter(|(_, slot)| slot.question_type != QuestionType::Unsupported)
            .map(|(position, slot)| (position, slot.value))
            .collect(),
        AnswersFile::ByIndex(map) => map
            .into_iter()
            .map(|(key, value)| {
                key.parse::<usize>()
                    .map(|index| (index, value))
                    .map_err(|_| format!("answer key '{}' is not a question index", key))
            })
            .collect::<Result<_, _>>()?,
    };
    debug!(answers = updates.len(), "replaying answers");
    for (index, value) in updates {
        session.update_answer(index, value)?;
    }
    Ok(session)
}

fn submit_mode(submit: &SubmitArgs) -> Option<SubmitMode> {
    if submit.edit {
        Some(SubmitMode::Edit)
    } else {
        submit
            .patient_id
            .clone()
            .map(|patient_id| SubmitMode::Create { patient_id })
    }
}

fn run_visibility(source: TemplateArgs) -> CliResult<()> {
    let session = open_session(&source)?;
    for (position, question) in session.questions().iter().enumerate() {
        let state = if session.is_hidden(position) {
            "hidden"
        } else {
            "shown"
        };
        println!(
            "{:>3} {:<6} {:<15} {}",
            position, state, question.question_type, question.question_text
        );
    }
    Ok(())
}

fn run_validate(source: TemplateArgs) -> CliResult<()> {
    let session = open_session(&source)?;
    let result = session.validate();
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&session, &result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(session: &FormSession, result: &ValidationResult) {
    for error in &result.errors {
        let title = session
            .questions()
            .get(error.question_index)
            .map(|question| question.question_text.as_str())
            .unwrap_or("?");
        println!(
            " - question {} ({}): {} [{}]",
            error.question_index, title, error.message, error.code
        );
    }
}

fn run_submit(source: TemplateArgs, submit: SubmitArgs) -> CliResult<()> {
    let session = open_session(&source)?;
    let mode = submit_mode(&submit).ok_or("either --patient-id or --edit is required")?;
    match session.submission(&mode) {
        Ok(submission) => {
            println!("{}", serde_json::to_string_pretty(&submission)?);
            Ok(())
        }
        Err(FormError::SubmissionBlocked(result)) => {
            println!("Validation result: invalid");
            describe_validation(&session, &result);
            Err("submission blocked".into())
        }
        Err(err) => Err(err.into()),
    }
}

fn run_patch(source: TemplateArgs, index: usize, value_json: &str) -> CliResult<()> {
    let session = open_session(&source)?;
    let template_json = serde_json::to_string(session.template())?;
    let config_json = json!({ "templateJson": template_json }).to_string();
    let answers_json = serde_json::to_string(session.answers())?;
    let response = submit_patch(&config_json, &answers_json, index, value_json);
    let parsed: Value = serde_json::from_str(&response)?;
    if let Some(error) = parsed.get("error").and_then(Value::as_str) {
        return Err(error.to_string().into());
    }
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

fn run_schema(target: SchemaTarget) -> CliResult<()> {
    let value = match target {
        SchemaTarget::Template => schema::template_schema(),
        SchemaTarget::Draft => schema::draft_schema(),
        SchemaTarget::Create => schema::create_payload_schema(),
        SchemaTarget::Edit => schema::edit_payload_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn run_fill(source: TemplateArgs, submit: SubmitArgs, verbose: bool) -> CliResult<()> {
    let mut session = open_session(&source)?;
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose));
    presenter.show_header(session.template());

    let mut asked = BTreeSet::new();
    loop {
        while let Some(position) = next_question(&session, &asked) {
            presenter.show_status(&session);
            let question = session.questions()[position].clone();
            presenter.enter_category(&session, &question);

            let total = session
                .visible_questions()
                .filter(|(question, _)| is_promptable(question))
                .count();
            let current = session
                .answers()
                .get(position)
                .map(|answer| answer.value.clone())
                .unwrap_or_default();
            let prompt = PromptContext::new(&question, &current, asked.len() + 1, total);
            presenter.show_prompt(&prompt);

            let raw = prompt_line("> ")?;
            if raw.is_empty() {
                asked.insert(position);
                continue;
            }
            match parse_answer(&question, &raw) {
                Ok(value) => {
                    session.update_answer(position, value)?;
                    asked.insert(position);
                }
                Err(err) => presenter.show_parse_error(&err),
            }
        }

        let validation = session.validate();
        if validation.valid {
            break;
        }
        presenter.show_validation(&session, &validation);
        for error in &validation.errors {
            asked.remove(&error.question_index);
        }
    }

    let payload = match submit_mode(&submit) {
        Some(mode) => serde_json::to_value(session.submission(&mode)?)?,
        None => {
            info!("no --patient-id or --edit given; printing answers only");
            serde_json::to_value(session.answers())?
        }
    };
    presenter.show_completion(&payload);
    Ok(())
}

fn is_promptable(question: &Question) -> bool {
    !matches!(
        question.question_type,
        QuestionType::Category | QuestionType::Unsupported
    )
}

/// First visible, answerable question not prompted yet.
///
/// Re-scanned from the top each time because an answer can reveal questions
/// anywhere in the form.
fn next_question(session: &FormSession, asked: &BTreeSet<usize>) -> Option<usize> {
    session
        .questions()
        .iter()
        .enumerate()
        .find(|(position, question)| {
            is_promptable(question) && !session.is_hidden(*position) && !asked.contains(position)
        })
        .map(|(position, _)| position)
}

fn prompt_line(prompt: &str) -> CliResult<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Err("input closed before the form was complete".into());
    }
    Ok(line.trim().to_string())
}

fn parse_answer(question: &Question, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    match question.question_type {
        QuestionType::MultipleChoice | QuestionType::MultipleSelect => parse_choices(question, raw),
        QuestionType::Integer => parse_integer(question, raw),
        QuestionType::Date | QuestionType::Datetime => parse_timestamp(raw),
        QuestionType::String => parse_text(question, raw),
        QuestionType::Category | QuestionType::Unsupported => Err(AnswerParseError::new(
            "this question cannot be answered",
            Some(question.question_type.to_string()),
        )),
    }
}

fn parse_choices(question: &Question, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    let mut selected: Vec<String> = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        let text = resolve_choice(question, token).ok_or_else(|| {
            let choices = question
                .mc_options
                .iter()
                .map(|option| option.text.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            AnswerParseError::new(format!("'{}' is not one of the options", token), Some(choices))
        })?;
        if !selected.contains(&text) {
            selected.push(text);
        }
    }
    if question.question_type == QuestionType::MultipleChoice && selected.len() > 1 {
        return Err(AnswerParseError::new(
            "pick a single option",
            Some("one option number or text".into()),
        ));
    }
    Ok(AnswerValue::Choices(selected))
}

/// Accepts a 1-based option number or the option text (case-insensitive).
fn resolve_choice(question: &Question, token: &str) -> Option<String> {
    if let Ok(number) = token.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|id| question.option_text(id))
            .map(str::to_string);
    }
    question
        .mc_options
        .iter()
        .find(|option| option.text.eq_ignore_ascii_case(token))
        .map(|option| option.text.clone())
}

fn parse_integer(question: &Question, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    let value = raw.parse::<i64>().map_err(|_| {
        AnswerParseError::new("Please enter a whole number.", Some("integer".into()))
    })? as f64;
    let below = question.num_min.is_some_and(|min| value < min);
    let above = question.num_max.is_some_and(|max| value > max);
    if below || above {
        return Err(AnswerParseError::new(
            "Value is out of range.",
            Some(format!(
                "between {} and {}",
                question.num_min.unwrap_or(f64::MIN),
                question.num_max.unwrap_or(f64::MAX)
            )),
        ));
    }
    Ok(AnswerValue::Number(value))
}

fn parse_timestamp(raw: &str) -> Result<AnswerValue, AnswerParseError> {
    raw.parse::<i64>()
        .map(|seconds| AnswerValue::Number(seconds as f64))
        .map_err(|_| {
            AnswerParseError::new(
                "Please enter a unix timestamp in seconds.",
                Some("integer seconds since 1970-01-01".into()),
            )
        })
}

fn parse_text(question: &Question, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    if let Some(max) = question.string_max_length
        && raw.chars().count() > max as usize
    {
        return Err(AnswerParseError::new(
            format!("Answer is longer than {} characters.", max),
            None,
        ));
    }
    Ok(AnswerValue::Text(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symptoms() -> Question {
        Question::new(0, QuestionType::MultipleSelect, "Symptoms")
            .with_options(["Nausea", "Bleeding", "Headache"])
    }

    #[test]
    fn choices_accept_numbers_and_texts() {
        let value = parse_choices(&symptoms(), "1, headache, 1").expect("choices");
        assert_eq!(
            value,
            AnswerValue::Choices(vec!["Nausea".into(), "Headache".into()])
        );
    }

    #[test]
    fn choices_reject_unknown_option() {
        let err = parse_choices(&symptoms(), "Fever").unwrap_err();
        assert!(err.user_message.contains("Fever"));
    }

    #[test]
    fn single_choice_rejects_two_options() {
        let question = Question::new(0, QuestionType::MultipleChoice, "Pregnant?")
            .with_options(["Yes", "No"]);
        assert!(parse_choices(&question, "1,2").is_err());
    }

    #[test]
    fn integer_respects_range() {
        let question = Question::new(0, QuestionType::Integer, "Weeks").with_range(0.0, 45.0);
        assert_eq!(
            parse_integer(&question, "12").expect("value"),
            AnswerValue::Number(12.0)
        );
        assert!(parse_integer(&question, "46").is_err());
        assert!(parse_integer(&question, "twelve").is_err());
    }
}
