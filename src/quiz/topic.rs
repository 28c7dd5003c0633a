pub const MAX_TOPIC_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTopic {
    #[error("topic is empty")]
    Empty,
    #[error("topic is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// A quiz topic that passed validation and is safe to hand to the generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Topic(String);

impl Topic {
    pub fn parse(raw: &str) -> Result<Self, InvalidTopic> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidTopic::Empty);
        }
        let len = trimmed.chars().count();
        if len > MAX_TOPIC_CHARS {
            return Err(InvalidTopic::TooLong {
                len,
                max: MAX_TOPIC_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(Topic::parse("  Privilege escalation \n").unwrap().as_str(), "Privilege escalation");
    }

    #[test]
    fn rejects_blank_topic() {
        assert_eq!(Topic::parse(" \t "), Err(InvalidTopic::Empty));
    }

    #[test]
    fn rejects_overlong_topic() {
        let raw = "a".repeat(MAX_TOPIC_CHARS + 1);

        assert_eq!(
            Topic::parse(&raw),
            Err(InvalidTopic::TooLong {
                len: MAX_TOPIC_CHARS + 1,
                max: MAX_TOPIC_CHARS
            })
        );
        assert!(Topic::parse(&"a".repeat(MAX_TOPIC_CHARS)).is_ok());
    }
}
