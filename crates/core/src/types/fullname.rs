use std::fmt;

use crate::error::CoreError;

/// Kind prefixes of Reddit "thing" identifiers: comment, account, link,
/// message, subreddit and award.
const THING_PREFIXES: [&str; 6] = ["t1", "t2", "t3", "t4", "t5", "t6"];

/// A validated thing identifier such as `t3_15bfi0`, used as a pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fullname {
    value: String,
}

impl Fullname {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl TryFrom<&str> for Fullname {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let (prefix, id) = trimmed
            .split_once('_')
            .ok_or_else(|| CoreError::InvalidFullname(trimmed.to_string()))?;
        if !THING_PREFIXES.contains(&prefix)
            || id.is_empty()
            || !id
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        {
            return Err(CoreError::InvalidFullname(trimmed.to_string()));
        }
        Ok(Fullname {
            value: trimmed.to_string(),
        })
    }
}

impl fmt::Display for Fullname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
