use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::quiz::Question;

/// Telegram rejects messages longer than this many UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;

pub const TAKE_QUIZ: &str = "Take a quiz";
pub const REVIEW_WRITEUP: &str = "Review a write-up";
const RETRY_TOPIC_PREFIX: &str = "Another quiz on ";
pub const PROGRESS_COMMAND: &str = "/progress";
const NOTE_COMMAND: &str = "/note";

pub fn activity_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(TAKE_QUIZ),
        KeyboardButton::new(REVIEW_WRITEUP),
    ]])
}

/// The activity keyboard with an extra row for repeating the last topic.
pub fn after_quiz_keyboard(topic: &str) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(format!("{}{}", RETRY_TOPIC_PREFIX, topic))],
        vec![
            KeyboardButton::new(TAKE_QUIZ),
            KeyboardButton::new(REVIEW_WRITEUP),
        ],
    ])
}

pub fn repeated_topic(text: &str) -> Option<&str> {
    text.strip_prefix(RETRY_TOPIC_PREFIX)
}

/// The text of a `/note` command, possibly empty. `None` for anything else.
pub fn note_command(text: &str) -> Option<&str> {
    let rest = text.trim_start().strip_prefix(NOTE_COMMAND)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// The options a user can actually pick. Telegram refuses buttons with no
/// text, so blank options are left out.
pub fn choices(question: &Question) -> Vec<&str> {
    question
        .options()
        .iter()
        .map(String::as_str)
        .filter(|option| !option.trim().is_empty())
        .collect()
}

/// One button per choice, one choice per row so long answers stay readable.
pub fn options_keyboard(question: &Question) -> KeyboardMarkup {
    KeyboardMarkup::new(
        choices(question)
            .into_iter()
            .map(|option| vec![KeyboardButton::new(option)])
            .collect::<Vec<_>>(),
    )
}

pub fn answer_feedback(question: &Question, reply: &str) -> String {
    let verdict = if question.is_answered_by(reply) {
        "Correct!".to_string()
    } else {
        match question.answer().filter(|answer| !answer.is_empty()) {
            Some(answer) => format!("Not quite. The correct answer is: {}", answer),
            None => "This question had no marked answer, so it can't be scored.".to_string(),
        }
    };
    match question.explanation() {
        Some(explanation) if !explanation.is_empty() => {
            format!("{}\n\nExplanation: {}", verdict, explanation)
        }
        _ => verdict,
    }
}

/// Splits `text` into pieces that each fit in one message, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = utf16_len(line);
        if current_len + line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        // A single line longer than the limit is cut at character boundaries.
        for c in line.chars() {
            let c_len = c.len_utf16();
            if current_len + c_len > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(c);
            current_len += c_len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}
