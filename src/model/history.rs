//! Reducer-driven viewing history
//!
//! `HistoryState` is an ordered list of displayed instructions (oldest first)
//! with a cursor. All mutation goes through [`reduce`], a pure function of
//! `(state, action)`, so the consuming surface owns the side effects
//! (persistence, deep-link updates) and the transitions stay testable.

use super::instruction::Instruction;
use serde_json::Value;

/// History entries plus cursor. `index == -1` iff `entries` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    pub entries: Vec<Instruction>,
    pub index: isize,
}

/// The only ways history changes.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// Startup hydration; the index is clamped into range.
    Initialize { entries: Vec<Instruction>, index: isize },
    /// Show a new head item. `replace_forward` discards entries after the cursor.
    Append {
        instruction: Instruction,
        replace_forward: bool,
    },
    Back,
    Forward,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::empty()
    }
}

impl HistoryState {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            index: -1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The currently displayed instruction, if any.
    pub fn current(&self) -> Option<&Instruction> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index >= 0 && (self.index as usize) + 1 < self.entries.len()
    }

    /// One-based position of the cursor, 0 when empty.
    pub fn position(&self) -> usize {
        if self.entries.is_empty() {
            0
        } else {
            (self.index + 1) as usize
        }
    }

    /// Apply an action, consuming the old state.
    pub fn apply(self, action: HistoryAction) -> Self {
        reduce(self, action)
    }
}

/// Pure transition function for [`HistoryState`].
pub fn reduce(state: HistoryState, action: HistoryAction) -> HistoryState {
    match action {
        HistoryAction::Initialize { entries, index } => {
            if entries.is_empty() {
                return HistoryState::empty();
            }
            let last = entries.len() as isize - 1;
            HistoryState {
                index: index.clamp(0, last),
                entries,
            }
        }
        HistoryAction::Append {
            instruction,
            replace_forward,
        } => append(state, instruction, replace_forward),
        HistoryAction::Back => {
            if state.index <= 0 {
                return state;
            }
            HistoryState {
                index: state.index - 1,
                ..state
            }
        }
        HistoryAction::Forward => {
            if !state.can_go_forward() {
                return state;
            }
            HistoryState {
                index: state.index + 1,
                ..state
            }
        }
    }
}

fn append(state: HistoryState, instruction: Instruction, replace_forward: bool) -> HistoryState {
    let HistoryState {
        mut entries,
        index,
    } = state;

    // Re-fetching the entry just ahead of the cursor walks onto it and keeps
    // the forward history intact.
    if index >= 0 {
        let ahead = index as usize + 1;
        if entries
            .get(ahead)
            .is_some_and(|next| next.same_entity(&instruction))
        {
            entries[ahead] = instruction;
            return HistoryState {
                entries,
                index: ahead as isize,
            };
        }
    }

    if replace_forward && index >= 0 {
        entries.truncate(index as usize + 1);
    }

    match entries.last_mut() {
        Some(last) if last.same_entity(&instruction) => *last = instruction,
        _ => entries.push(instruction),
    }

    let index = entries.len() as isize - 1;
    HistoryState { entries, index }
}

/// Rebuild `(entries, index)` from whatever the store held.
///
/// Entries without a numeric id or string text are dropped one by one. An
/// index that is neither a number nor a numeric string defaults to the tail.
pub fn hydrate(entries: Option<&Value>, index: Option<&Value>) -> (Vec<Instruction>, isize) {
    let entries: Vec<Instruction> = entries
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Instruction::from_persisted).collect())
        .unwrap_or_default();

    let parsed = match index {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let index = parsed
        .map(|i| i as isize)
        .unwrap_or(entries.len() as isize - 1);

    (entries, index)
}
