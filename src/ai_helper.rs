use async_trait::async_trait;
use chatgpt::client::ChatGPT;
use chatgpt::types::CompletionResponse;

use crate::quiz::generator::{GenerationError, QuizSource};
use crate::writeup::WriteUp;

pub const QUESTIONS_PER_QUIZ: usize = 5;

pub struct AiHelper {
    chat_gpt: ChatGPT,
}

impl AiHelper {
    pub fn new(chat_gpt: ChatGPT) -> Self {
        Self { chat_gpt }
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        log::debug!("Prompt: {:?}", prompt);

        let response: CompletionResponse = self.chat_gpt.send_message(prompt).await?;
        let content = response.message().content.trim().to_string();

        log::debug!("Completion: {:?}", content);

        if content.is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }
        Ok(content)
    }

    pub async fn review_writeup(&self, writeup: &WriteUp) -> Result<String, GenerationError> {
        log::info!(
            "Reviewing write-up ({} characters)",
            writeup.as_str().chars().count()
        );
        self.complete(&writeup_prompt(writeup)).await
    }
}

#[async_trait]
impl QuizSource for AiHelper {
    async fn quiz_markdown(&self, topic: &str) -> Result<String, GenerationError> {
        self.complete(&quiz_prompt(topic)).await
    }
}

fn quiz_prompt(topic: &str) -> String {
    format!(
        "You are a senior cybersecurity mentor who likes to turn lessons into games.
Write a multiple-choice quiz for a student training to become a security professional.

Topic: {topic}

Write exactly {QUESTIONS_PER_QUIZ} questions: mostly technical knowledge (concepts, tools, commands),
one or two short scenarios asking for the best course of action, and one about professional
ethics or client communication. Every question has exactly 4 options and exactly one of them is correct.

Reply with Markdown only, in exactly this layout and nothing else:

# <catchy quiz title>
1. <question text>
- [ ] <wrong option>
- [x] <correct option>
- [ ] <wrong option>
- [ ] <wrong option>
Explanation: <one or two sentences on why the correct option is right>

Number the questions 1 to {QUESTIONS_PER_QUIZ}. Mark the correct option with [x] and the others with [ ]."
    )
}

fn writeup_prompt(writeup: &WriteUp) -> String {
    format!(
        "You review cybersecurity write-ups and give constructive, specific feedback.

Check the write-up below for:
- Completeness: are the Executive Summary, Reconnaissance, Enumeration, Exploitation,
  Post-Exploitation and Remediation sections all there?
- Clarity: are the steps easy to follow and the technical terms introduced?
- Remediation: are the fixes concrete and actionable?

Answer with a short, well-structured list of suggestions.

Write-up:
{}",
        writeup.as_str()
    )
}
