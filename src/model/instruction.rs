//! Instruction: the atomic content unit

use serde::{Deserialize, Serialize};

/// Identifier assigned by the backing store. Never generated client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionId(i64);

impl InstructionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for InstructionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for InstructionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for InstructionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single piece of advice with optional attribution and labels.
///
/// Two instructions are the same entity iff their ids match; see
/// [`Instruction::same_entity`]. The remaining fields are a snapshot taken at
/// fetch time and are never re-validated against the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub id: InstructionId,
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Set only when the instruction entered the session through a shared link.
    #[serde(default, skip_serializing_if = "is_false")]
    pub was_external: bool,
}

impl Instruction {
    pub fn new(id: impl Into<InstructionId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: None,
            tags: Vec::new(),
            categories: Vec::new(),
            was_external: false,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Mark as loaded from a deep link.
    pub fn external(mut self) -> Self {
        self.was_external = true;
        self
    }

    /// Entity identity: ids only.
    pub fn same_entity(&self, other: &Instruction) -> bool {
        self.id == other.id
    }

    /// Attributed quote for sharing: the quoted text, a dash, then the author.
    pub fn share_text(&self) -> String {
        match &self.author {
            Some(author) => format!("\"{}\" — {}", self.text, author),
            None => format!("\"{}\"", self.text),
        }
    }

    /// Lenient decoding used when hydrating persisted history.
    ///
    /// Accepts only objects with a numeric `id` and a string `text`; every other
    /// field falls back to its default when missing or mistyped.
    pub fn from_persisted(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id")?.as_i64()?;
        let text = obj.get("text")?.as_str()?;

        let strings = |key: &str| -> Vec<String> {
            obj.get(key)
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default()
        };

        Some(Self {
            id: InstructionId(id),
            text: text.to_string(),
            author: obj
                .get("author")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            tags: strings("tags"),
            categories: strings("categories"),
            was_external: obj
                .get("wasExternal")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        })
    }
}
