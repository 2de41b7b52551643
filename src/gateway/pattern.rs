//! SQL `LIKE` pattern helpers
//!
//! User text has to match literally, so `%`, `_` and the escape character
//! itself are escaped before the term is wrapped in wildcards.

/// Escape character used in generated patterns (PostgreSQL default).
pub const LIKE_ESCAPE: char = '\\';

/// Escape `\`, `%` and `_` so the term matches only itself.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// `%term%` with the term escaped.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Evaluate a `ILIKE` pattern with `\` escapes against `text`.
///
/// Matches the semantics the database applies server-side, so in-memory
/// services behave like the real one.
pub fn ilike_matches(pattern: &str, text: &str) -> bool {
    let pattern = tokenize(&pattern.to_lowercase());
    let text: Vec<char> = text.to_lowercase().chars().collect();
    matches_from(&pattern, &text)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            LIKE_ESCAPE => Token::Literal(chars.next().unwrap_or(LIKE_ESCAPE)),
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            other => Token::Literal(other),
        };
        tokens.push(token);
    }
    tokens
}

/// Iterative wildcard match with single-star backtracking.
fn matches_from(pattern: &[Token], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(Token::AnyRun) => {
                star = Some((p, t));
                p += 1;
            }
            Some(Token::AnyOne) => {
                p += 1;
                t += 1;
            }
            Some(Token::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|token| *token == Token::AnyRun)
}
