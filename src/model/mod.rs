//! Core data structures: instructions, labels, viewing history

mod history;
mod instruction;
mod label;


pub use history::{hydrate, reduce, HistoryAction, HistoryState};
pub use instruction::{Instruction, InstructionId};
pub use label::{Category, Label, LabelCatalog, Tag};
