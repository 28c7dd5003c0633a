//! Turns the Markdown a chat model returns into a [`Quiz`].
//!
//! The expected shape is:
//!
//! ```text
//! # Quiz title
//! 1. Question text
//! - [ ] wrong option
//! - [x] right option
//! Explanation: why the right option is right
//! ```
//!
//! Anything the classifier does not recognise is skipped, so stray headers or
//! chatter from the model don't break the parse.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Question, Quiz};

static QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.\s(.*)$").unwrap());
static CORRECT_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^- \[x\](.*)$").unwrap());
static INCORRECT_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^- \[\s+\](.*)$").unwrap());

const EXPLANATION_PREFIX: &str = "explanation:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("quiz markdown has no title line")]
    MissingTitle,
    #[error("quiz markdown contains no questions")]
    NoQuestions,
}

/// One classified line of the quiz body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Question(&'a str),
    CorrectOption(&'a str),
    IncorrectOption(&'a str),
    Explanation(&'a str),
    Ignored,
}

/// Classifies a single body line. Earlier rules win, so a line like
/// `1. foo` is always a question even if it was meant as explanation text.
pub fn classify_line(line: &str) -> Line<'_> {
    if let Some(caps) = QUESTION_MARKER.captures(line) {
        return Line::Question(capture_text(&caps));
    }
    if let Some(caps) = CORRECT_OPTION.captures(line) {
        return Line::CorrectOption(capture_text(&caps));
    }
    if let Some(caps) = INCORRECT_OPTION.captures(line) {
        return Line::IncorrectOption(capture_text(&caps));
    }
    if let Some(rest) = strip_explanation_prefix(line) {
        return Line::Explanation(rest.trim());
    }
    Line::Ignored
}

fn capture_text<'a>(caps: &regex::Captures<'a>) -> &'a str {
    caps.get(1).map_or("", |m| m.as_str()).trim()
}

fn strip_explanation_prefix(line: &str) -> Option<&str> {
    let prefix = line.get(..EXPLANATION_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(EXPLANATION_PREFIX) {
        line.get(EXPLANATION_PREFIX.len()..)
    } else {
        None
    }
}

fn parse_title(line: &str) -> &str {
    line.trim().trim_start_matches('#').trim()
}

/// Questions already closed plus the one still collecting options.
#[derive(Debug, Default)]
struct Accumulator {
    finished: Vec<Question>,
    in_progress: Option<Question>,
}

impl Accumulator {
    /// Options and explanations before the first question marker have no
    /// question to attach to and are dropped.
    fn feed(mut self, line: Line<'_>) -> Self {
        match line {
            Line::Question(text) => {
                self.flush();
                self.in_progress = Some(Question::new(text.to_string()));
            }
            Line::CorrectOption(text) => {
                if let Some(question) = self.in_progress.as_mut() {
                    question.push_option(text.to_string(), true);
                }
            }
            Line::IncorrectOption(text) => {
                if let Some(question) = self.in_progress.as_mut() {
                    question.push_option(text.to_string(), false);
                }
            }
            Line::Explanation(text) => {
                if let Some(question) = self.in_progress.as_mut() {
                    question.set_explanation(text.to_string());
                }
            }
            Line::Ignored => {}
        }
        self
    }

    fn flush(&mut self) {
        if let Some(question) = self.in_progress.take() {
            self.finished.push(question);
        }
    }

    fn finish(mut self) -> Vec<Question> {
        self.flush();
        self.finished
    }
}

/// Parses a Markdown quiz. Blank lines are dropped before anything else, and
/// the first remaining line is always taken as the title.
pub fn parse_quiz(markdown: &str) -> Result<Quiz, ParseError> {
    let mut lines = markdown.lines().filter(|line| !line.trim().is_empty());

    let title = lines.next().map(parse_title).unwrap_or_default();
    if title.is_empty() {
        return Err(ParseError::MissingTitle);
    }

    let questions = lines
        .map(classify_line)
        .fold(Accumulator::default(), Accumulator::feed)
        .finish();
    if questions.is_empty() {
        return Err(ParseError::NoQuestions);
    }

    Ok(Quiz::new(title.to_string(), questions))
}
