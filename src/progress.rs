//! Per-chat learning progress: the best result for every quiz topic and a
//! short note the learner keeps next to it.

use std::collections::BTreeMap;

use crate::quiz::topic::Topic;

pub const MAX_NOTE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("Finish a quiz first, notes are kept per quiz topic.")]
    NoTopic,
    #[error("The note is empty. Send /note followed by your text.")]
    Empty,
    #[error("Notes are limited to {max} characters, yours has {len}.")]
    TooLong { len: usize, max: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TopicProgress {
    pub best_score: usize,
    pub total: usize,
    pub attempts: usize,
    pub note: Option<String>,
}

impl TopicProgress {
    pub fn is_mastered(&self) -> bool {
        self.total > 0 && self.best_score == self.total
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Progress {
    topics: BTreeMap<String, TopicProgress>,
    last_topic: Option<String>,
}

impl Progress {
    pub fn topic(&self, topic: &str) -> Option<&TopicProgress> {
        self.topics.get(topic)
    }

    pub fn last_topic(&self) -> Option<&str> {
        self.last_topic.as_deref()
    }

    /// Stores a finished quiz. Only a better share of right answers replaces
    /// the best result, a retake with a worse score just counts as an attempt.
    pub fn record_result(&mut self, topic: &Topic, score: usize, total: usize) {
        let entry = self.topics.entry(topic.as_str().to_string()).or_default();
        let first = entry.attempts == 0;
        entry.attempts += 1;
        // score/total > best/best_total, without dividing.
        if first || score * entry.total > entry.best_score * total {
            entry.best_score = score;
            entry.total = total;
        }
        self.last_topic = Some(topic.as_str().to_string());
    }

    /// Attaches `text` to the topic of the most recent quiz and returns that topic.
    pub fn set_note(&mut self, text: &str) -> Result<&str, NoteError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NoteError::Empty);
        }
        let len = text.chars().count();
        if len > MAX_NOTE_CHARS {
            return Err(NoteError::TooLong {
                len,
                max: MAX_NOTE_CHARS,
            });
        }

        let topic = self.last_topic.as_deref().ok_or(NoteError::NoTopic)?;
        let entry = self.topics.get_mut(topic).ok_or(NoteError::NoTopic)?;
        entry.note = Some(text.to_string());
        Ok(topic)
    }

    pub fn practised(&self) -> usize {
        self.topics.len()
    }

    pub fn mastered(&self) -> usize {
        self.topics.values().filter(|t| t.is_mastered()).count()
    }

    /// Share of practised topics finished with full marks, rounded down.
    pub fn mastered_percent(&self) -> usize {
        match self.practised() {
            0 => 0,
            practised => self.mastered() * 100 / practised,
        }
    }

    pub fn summary(&self) -> String {
        if self.topics.is_empty() {
            return "No quizzes finished yet. Take one and your results will show up here."
                .to_string();
        }

        let mut text = format!(
            "Topics practised: {}\nMastered with full marks: {} ({}%)\n",
            self.practised(),
            self.mastered(),
            self.mastered_percent()
        );
        for (topic, progress) in &self.topics {
            text.push_str(&format!(
                "\n{} {}: best {}/{} after {} attempt(s)",
                if progress.is_mastered() { "✅" } else { "▫️" },
                topic,
                progress.best_score,
                progress.total,
                progress.attempts
            ));
            if let Some(note) = &progress.note {
                text.push_str(&format!("\n    Note: {}", note));
            }
        }
        text
    }
}
