pub const MIN_WRITEUP_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteUpError {
    #[error("Please provide a more detailed write-up (at least {min} characters, got {len}).")]
    TooShort { len: usize, min: usize },
}

/// A penetration-test or CTF write-up long enough to be worth reviewing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteUp(String);

impl WriteUp {
    pub fn parse(raw: &str) -> Result<Self, WriteUpError> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if len < MIN_WRITEUP_CHARS {
            return Err(WriteUpError::TooShort {
                len,
                min: MIN_WRITEUP_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_writeup_is_rejected() {
        let err = WriteUp::parse("Found an open port. Got root.").unwrap_err();

        assert_eq!(err, WriteUpError::TooShort { len: 29, min: MIN_WRITEUP_CHARS });
        assert!(err.to_string().starts_with("Please provide a more detailed write-up"));
    }

    #[test]
    fn surrounding_whitespace_does_not_count() {
        let padded = format!("{}{}{}", " ".repeat(40), "x".repeat(MIN_WRITEUP_CHARS - 1), "\n".repeat(10));

        assert!(WriteUp::parse(&padded).is_err());
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(MIN_WRITEUP_CHARS);

        assert_eq!(WriteUp::parse(&text).unwrap().as_str(), text);
    }
}
