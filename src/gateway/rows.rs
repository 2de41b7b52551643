//! Wire row shapes and their normalization into [`Instruction`]
//!
//! The service answers in two shapes: flat RPC rows (random batch and filter
//! endpoint) and nested table rows (by-id lookups and direct scans). Both end
//! up as the same `Instruction`.

use crate::model::{Instruction, InstructionId};
use serde::{Deserialize, Serialize};

/// Row returned by `get_random_instructions` and `search_instructions_secure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRow {
    pub instruction_id: i64,
    pub text: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagLink {
    #[serde(default)]
    pub tags: Option<NameRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLink {
    #[serde(default)]
    pub categories: Option<NameRef>,
}

/// Row from `instructions` with embedded author, tags and categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub authors: Option<NameRef>,
    #[serde(default)]
    pub instruction_tags: Vec<TagLink>,
    #[serde(default)]
    pub instruction_categories: Vec<CategoryLink>,
}

/// PostgREST `select` clause that yields [`TableRow`]s.
pub const TABLE_ROW_SELECT: &str =
    "id,text,authors(name),instruction_tags(tags(name)),instruction_categories(categories(name))";

fn non_empty(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

impl RpcRow {
    /// `None` when the row carries no text.
    pub fn into_instruction(self) -> Option<Instruction> {
        if self.text.trim().is_empty() {
            return None;
        }
        Some(Instruction {
            id: InstructionId::new(self.instruction_id),
            text: self.text,
            author: non_empty(self.author_name),
            tags: self.tags.unwrap_or_default(),
            categories: self.categories.unwrap_or_default(),
            was_external: false,
        })
    }
}

impl TableRow {
    pub fn into_instruction(self) -> Option<Instruction> {
        if self.text.trim().is_empty() {
            return None;
        }
        Some(Instruction {
            id: InstructionId::new(self.id),
            text: self.text,
            author: non_empty(self.authors.map(|a| a.name)),
            tags: self
                .instruction_tags
                .into_iter()
                .filter_map(|link| link.tags.map(|t| t.name))
                .collect(),
            categories: self
                .instruction_categories
                .into_iter()
                .filter_map(|link| link.categories.map(|c| c.name))
                .collect(),
            was_external: false,
        })
    }

    /// Inverse of [`TableRow::into_instruction`], used by in-memory services.
    pub fn from_instruction(instruction: &Instruction) -> Self {
        Self {
            id: instruction.id.get(),
            text: instruction.text.clone(),
            authors: instruction.author.clone().map(|name| NameRef { name }),
            instruction_tags: instruction
                .tags
                .iter()
                .map(|name| TagLink {
                    tags: Some(NameRef { name: name.clone() }),
                })
                .collect(),
            instruction_categories: instruction
                .categories
                .iter()
                .map(|name| CategoryLink {
                    categories: Some(NameRef { name: name.clone() }),
                })
                .collect(),
        }
    }
}

impl RpcRow {
    pub fn from_instruction(instruction: &Instruction) -> Self {
        Self {
            instruction_id: instruction.id.get(),
            text: instruction.text.clone(),
            author_name: instruction.author.clone(),
            tags: Some(instruction.tags.clone()),
            categories: Some(instruction.categories.clone()),
        }
    }
}

/// Normalize a batch, dropping rows without text.
pub fn normalize_rpc(rows: Vec<RpcRow>) -> Vec<Instruction> {
    rows.into_iter().filter_map(RpcRow::into_instruction).collect()
}

pub fn normalize_table(rows: Vec<TableRow>) -> Vec<Instruction> {
    rows.into_iter()
        .filter_map(TableRow::into_instruction)
        .collect()
}
