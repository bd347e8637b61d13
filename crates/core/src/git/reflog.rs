//! Parsing of git reflog lines (`.git/logs/refs/heads/<branch>`).
//!
//! A reflog line looks like
//!
//! ```text
//! <old-sha> <new-sha> <name> <<email>> <timestamp> <tz>\t<message>
//! ```
//!
//! Only the first two fields are positional in practice since author names
//! may contain spaces. When the tab separator is present the message is the
//! text after it; otherwise the message is every field from
//! [`MESSAGE_FIELD_OFFSET`] onward.

use crate::errors::LocalError;

/// Minimum number of whitespace-delimited fields: old id and new id.
pub const MIN_FIELDS: usize = 2;

/// Field index where the message starts on lines without a tab separator.
pub const MESSAGE_FIELD_OFFSET: usize = 5;

/// One parsed reflog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflogEntry {
    pub old_id: String,
    pub new_id: String,
    pub message: String,
}

impl ReflogEntry {
    /// Parse a single reflog line belonging to `branch`.
    pub fn parse(branch: &str, line: &str) -> Result<Self, LocalError> {
        let (header, tail) = match line.split_once('\t') {
            Some((header, tail)) => (header, Some(tail)),
            None => (line, None),
        };
        let fields: Vec<&str> = header.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Err(LocalError::MalformedLogLine {
                branch: branch.to_string(),
                line: line.to_string(),
                expected: MIN_FIELDS,
                found: fields.len(),
            });
        }

        let message = match tail {
            Some(tail) => join_words(tail.split_whitespace()),
            None => join_words(fields.iter().skip(MESSAGE_FIELD_OFFSET).copied()),
        };

        Ok(Self {
            old_id: fields[0].to_string(),
            new_id: fields[1].to_string(),
            message,
        })
    }
}

fn join_words<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.collect::<Vec<_>>().join(" ")
}
