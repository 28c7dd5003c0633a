//! Telegram bot for a security learning roadmap: AI-generated quizzes on a
//! chosen topic and AI feedback on pasted write-ups.
//!
//! The quiz pipeline lives in [`quiz`]: a chat model writes the quiz as
//! Markdown, [`quiz::markdown::parse_quiz`] turns it into a [`quiz::Quiz`], and
//! [`quiz::generator::QuizGenerator`] retries the whole thing once on failure.

pub mod ai_helper;
pub mod config;
pub mod progress;
pub mod quiz;
pub mod telegram;
pub mod writeup;
