use async_trait::async_trait;

use super::markdown::{parse_quiz, ParseError};
use super::retry::{retry, ExhaustedRetriesError, RetryPolicy};
use super::topic::Topic;
use super::Quiz;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("chat completion failed: {0}")]
    ChatGpt(#[from] chatgpt::err::Error),
    #[error("chat completion returned no content")]
    EmptyCompletion,
}

/// A single failed attempt at getting a quiz.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("quiz generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("generated quiz could not be parsed: {0}")]
    Parse(#[from] ParseError),
}

/// Something that can write a Markdown quiz about a topic, usually a chat model.
#[async_trait]
pub trait QuizSource: Send + Sync {
    async fn quiz_markdown(&self, topic: &str) -> Result<String, GenerationError>;
}

#[async_trait]
impl<T: QuizSource + ?Sized> QuizSource for std::sync::Arc<T> {
    async fn quiz_markdown(&self, topic: &str) -> Result<String, GenerationError> {
        (**self).quiz_markdown(topic).await
    }
}

pub struct QuizGenerator<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: QuizSource> QuizGenerator<S> {
    pub fn new(source: S) -> Self {
        Self::with_policy(source, RetryPolicy::default())
    }

    pub fn with_policy(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Asks the source for a quiz and parses it. A failed call and an
    /// unparseable reply are both retried under the same policy.
    pub async fn generate(&self, topic: &Topic) -> Result<Quiz, ExhaustedRetriesError<QuizError>> {
        let result = retry(self.policy, |attempt| async move {
            log::debug!("Generating quiz about {:?} (attempt {})", topic.as_str(), attempt);
            let markdown = self.source.quiz_markdown(topic.as_str()).await?;
            let quiz = parse_quiz(&markdown)?;
            Ok::<_, QuizError>(quiz)
        })
        .await;

        if let Ok(quiz) = &result {
            log::info!(
                "Generated quiz {:?} with {} questions",
                quiz.title(),
                quiz.len()
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const WELL_FORMED: &str = "# SQL Injection Showdown
1. Which input is a classic SQL injection payload?
- [ ] <script>alert(1)</script>
- [x] ' OR '1'='1
- [ ] ../../etc/passwd
- [ ] %00
Explanation: It closes the string literal and adds an always-true condition.
";

    /// Replays canned replies in order and counts how often it was called.
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<String, GenerationError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuizSource for ScriptedSource {
        async fn quiz_markdown(&self, _topic: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::EmptyCompletion))
        }
    }

    fn topic() -> Topic {
        Topic::parse("SQL injection").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_successful_quiz() {
        let source = ScriptedSource::new(vec![Ok(WELL_FORMED.to_string())]);
        let generator = QuizGenerator::new(source.clone());

        let quiz = generator.generate(&topic()).await.unwrap();

        assert_eq!(quiz.title(), "SQL Injection Showdown");
        assert_eq!(quiz.questions()[0].answer(), Some("' OR '1'='1"));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_when_second_call_succeeds() {
        let source = ScriptedSource::new(vec![
            Err(GenerationError::EmptyCompletion),
            Ok(WELL_FORMED.to_string()),
        ]);
        let generator = QuizGenerator::new(source.clone());

        let quiz = generator.generate(&topic()).await.unwrap();

        assert_eq!(quiz.len(), 1);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unparseable_reply_is_retried() {
        let source = ScriptedSource::new(vec![
            Ok("Sorry, I can't help with that.".to_string()),
            Ok(WELL_FORMED.to_string()),
        ]);
        let generator = QuizGenerator::new(source.clone());

        let quiz = generator.generate(&topic()).await.unwrap();

        assert_eq!(quiz.title(), "SQL Injection Showdown");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_two_failed_calls() {
        let source = ScriptedSource::new(vec![
            Err(GenerationError::EmptyCompletion),
            Err(GenerationError::EmptyCompletion),
            Ok(WELL_FORMED.to_string()),
        ]);
        let generator = QuizGenerator::new(source.clone());

        let err = generator.generate(&topic()).await.unwrap_err();

        assert_eq!(err.attempts, 2);
        assert!(matches!(
            err.last,
            QuizError::Generation(GenerationError::EmptyCompletion)
        ));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_last_error_when_mixed_failures() {
        let source = ScriptedSource::new(vec![
            Err(GenerationError::EmptyCompletion),
            Ok("# Title only".to_string()),
        ]);
        let generator = QuizGenerator::new(source.clone());

        let err = generator.generate(&topic()).await.unwrap_err();

        assert!(matches!(err.last, QuizError::Parse(ParseError::NoQuestions)));
        assert_eq!(source.calls(), 2);
    }
}
