//! Client-side matching of instructions against search criteria
//!
//! Shared by local-mode filtering and the direct-table fallback. Text is a
//! case-insensitive substring test. Tags are conjunctive: every selected tag
//! must be present. Categories are disjunctive: any one selected category is
//! enough. The asymmetry is long-standing product behavior and is kept as is.

use crate::model::Instruction;

/// What the user asked for, with labels already resolved to names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub text: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl Criteria {
    pub fn new(text: impl Into<String>, tags: Vec<String>, categories: Vec<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            tags,
            categories,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new(), Vec::new())
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

    /// No text, no tags, no categories.
    pub fn is_unfiltered(&self) -> bool {
        self.text.is_empty() && self.tags.is_empty() && self.categories.is_empty()
    }

    pub fn matches_text(&self, instruction: &Instruction) -> bool {
        self.text.is_empty()
            || instruction
                .text
                .to_lowercase()
                .contains(&self.text.to_lowercase())
    }

    /// Every selected tag appears on the instruction.
    pub fn matches_tags(&self, instruction: &Instruction) -> bool {
        self.tags
            .iter()
            .all(|wanted| contains_ignore_case(&instruction.tags, wanted))
    }

    /// At least one selected category appears on the instruction.
    pub fn matches_categories(&self, instruction: &Instruction) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|wanted| contains_ignore_case(&instruction.categories, wanted))
    }

    pub fn matches(&self, instruction: &Instruction) -> bool {
        self.matches_text(instruction)
            && self.matches_tags(instruction)
            && self.matches_categories(instruction)
    }

    /// Keep matching instructions, preserving order.
    pub fn apply<'a, I>(&self, instructions: I) -> Vec<Instruction>
    where
        I: IntoIterator<Item = &'a Instruction>,
    {
        instructions
            .into_iter()
            .filter(|i| self.matches(i))
            .cloned()
            .collect()
    }
}

fn contains_ignore_case(haystack: &[String], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    haystack.iter().any(|item| item.to_lowercase() == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten instructions: 3 tagged "growth", 2 of those also in "career",
    /// plus one "career" instruction without the tag.
    fn working_set() -> Vec<Instruction> {
        vec![
            Instruction::new(1, "Read every day.")
                .with_tags(["growth"])
                .with_categories(["career"]),
            Instruction::new(2, "Ask for feedback.")
                .with_tags(["growth", "humility"])
                .with_categories(["Career", "relationships"]),
            Instruction::new(3, "Learn a new skill each year.")
                .with_tags(["Growth"])
                .with_categories(["health"]),
            Instruction::new(4, "Negotiate your salary.")
                .with_tags(["money"])
                .with_categories(["career"]),
            Instruction::new(5, "Call your parents."),
            Instruction::new(6, "Drink water.").with_categories(["health"]),
            Instruction::new(7, "Say thank you.").with_tags(["kindness"]),
            Instruction::new(8, "Keep promises."),
            Instruction::new(9, "Save 10% of income.").with_tags(["money"]),
            Instruction::new(10, "Walk daily.").with_categories(["health"]),
        ]
    }

    fn ids(items: &[Instruction]) -> Vec<i64> {
        items.iter().map(|i| i.id.get()).collect()
    }

    #[test]
    fn test_tag_filter_selects_tagged_subset() {
        let set = working_set();
        let hits = Criteria::default().with_tags(["growth"]).apply(&set);
        assert_eq!(ids(&hits), vec![1, 2, 3]);
    }

    #[test]
    fn test_tag_and_category_filters_combine() {
        let set = working_set();
        let hits = Criteria::default()
            .with_tags(["growth"])
            .with_categories(["career"])
            .apply(&set);
        // 4 is in "career" but lacks the tag.
        assert_eq!(ids(&hits), vec![1, 2]);
    }

    #[test]
    fn test_tags_are_conjunctive() {
        let set = working_set();
        let hits = Criteria::default().with_tags(["growth", "humility"]).apply(&set);
        assert_eq!(ids(&hits), vec![2]);
    }

    #[test]
    fn test_categories_are_disjunctive() {
        let set = working_set();
        let hits = Criteria::default()
            .with_categories(["relationships", "health"])
            .apply(&set);
        assert_eq!(ids(&hits), vec![2, 3, 6, 10]);
    }

    #[test]
    fn test_text_match_is_case_insensitive_substring() {
        let set = working_set();
        assert_eq!(ids(&Criteria::text("DAILY").apply(&set)), vec![10]);
        assert_eq!(ids(&Criteria::text("10%").apply(&set)), vec![9]);
    }

    #[test]
    fn test_unfiltered_matches_everything() {
        let criteria = Criteria::new("   ", Vec::new(), Vec::new());
        assert!(criteria.is_unfiltered());
        assert_eq!(criteria.apply(&working_set()).len(), 10);
    }
}
