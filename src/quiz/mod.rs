pub mod generator;
pub mod markdown;
pub mod retry;
pub mod topic;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Quiz {
    title: String,
    questions: Vec<Question>,
}

impl Quiz {
    pub(crate) fn new(title: String, questions: Vec<Question>) -> Self {
        Self { title, questions }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, idx: usize) -> Option<&Question> {
        self.questions.get(idx)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Counts the replies that match the answer of the question at the
    /// same position. Missing replies count as wrong.
    pub fn score<S: AsRef<str>>(&self, replies: &[S]) -> usize {
        self.questions
            .iter()
            .zip(replies)
            .filter(|(question, reply)| question.is_answered_by(reply.as_ref()))
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    text: String,
    options: Vec<String>,
    answer: Option<String>,
    explanation: Option<String>,
}

impl Question {
    pub(crate) fn new(text: String) -> Self {
        Self {
            text,
            ..Default::default()
        }
    }

    pub(crate) fn push_option(&mut self, option: String, is_correct: bool) {
        if is_correct {
            self.answer = Some(option.clone());
        }
        self.options.push(option);
    }

    pub(crate) fn set_explanation(&mut self, explanation: String) {
        self.explanation = Some(explanation);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// A question without a marked answer can't be answered correctly.
    pub fn is_answered_by(&self, reply: &str) -> bool {
        self.answer
            .as_deref()
            .map_or(false, |answer| answer == reply.trim())
    }
}
