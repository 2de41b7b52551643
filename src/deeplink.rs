//! The `instruction` query parameter
//!
//! Read once at startup to open a shared instruction; rewritten after every
//! history change so the current address always points at what is shown.

use crate::model::InstructionId;
use url::Url;

pub const INSTRUCTION_PARAM: &str = "instruction";

/// Address of the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    url: Url,
}

impl DeepLink {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input).map(Self::new)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The linked instruction, if the parameter starts with an integer.
    ///
    /// Trailing garbage is ignored, so `?instruction=42abc` links to 42.
    pub fn instruction_id(&self) -> Option<InstructionId> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == INSTRUCTION_PARAM)
            .and_then(|(_, value)| leading_integer(&value))
            .map(InstructionId::new)
    }

    /// Point the link at `id`, keeping every other parameter.
    pub fn set_instruction(&mut self, id: InstructionId) {
        let others: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != INSTRUCTION_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut query = self.url.query_pairs_mut();
        query.clear();
        for (key, value) in &others {
            query.append_pair(key, value);
        }
        query.append_pair(INSTRUCTION_PARAM, &id.to_string());
    }
}

fn leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let sign_len = usize::from(value.starts_with(['-', '+']));
    let digits = value[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value.len(), |end| sign_len + end);
    if digits == sign_len {
        return None;
    }
    value[..digits].parse().ok()
}

/// `<origin>?instruction=<id>` for sharing.
pub fn share_url(base: &Url, id: InstructionId) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut()
        .append_pair(INSTRUCTION_PARAM, &id.to_string());
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_numeric_parameter() {
        let link = DeepLink::parse("https://www.daily-wisdom.com/?instruction=42").unwrap();
        assert_eq!(link.instruction_id(), Some(InstructionId::new(42)));
    }

    #[test]
    fn test_ignores_non_numeric_parameter() {
        let link = DeepLink::parse("https://www.daily-wisdom.com/?instruction=abc").unwrap();
        assert_eq!(link.instruction_id(), None);
        let bare = DeepLink::parse("https://www.daily-wisdom.com/").unwrap();
        assert_eq!(bare.instruction_id(), None);
    }

    #[test]
    fn test_reads_leading_digits_of_parameter() {
        let link = DeepLink::parse("https://www.daily-wisdom.com/?instruction=42abc").unwrap();
        assert_eq!(link.instruction_id(), Some(InstructionId::new(42)));
        let spaced = DeepLink::parse("https://www.daily-wisdom.com/?instruction=%207").unwrap();
        assert_eq!(spaced.instruction_id(), Some(InstructionId::new(7)));
        let signless = DeepLink::parse("https://www.daily-wisdom.com/?instruction=-").unwrap();
        assert_eq!(signless.instruction_id(), None);
    }

    #[test]
    fn test_set_instruction_replaces_and_preserves_others() {
        let mut link =
            DeepLink::parse("https://www.daily-wisdom.com/?ref=mail&instruction=1").unwrap();
        link.set_instruction(InstructionId::new(9));
        assert_eq!(link.instruction_id(), Some(InstructionId::new(9)));
        assert_eq!(
            link.url().as_str(),
            "https://www.daily-wisdom.com/?ref=mail&instruction=9"
        );
    }

    #[test]
    fn test_share_url() {
        let base = Url::parse("https://www.daily-wisdom.com").unwrap();
        assert_eq!(
            share_url(&base, InstructionId::new(314)).as_str(),
            "https://www.daily-wisdom.com/?instruction=314"
        );
    }
}
