//! Tokenizer for the condition language.
//!
//! Words are maximal runs of `[A-Za-z0-9_.]`, so a dot path is a single token and any
//! whitespace inside it splits it into invalid pieces.

use std::fmt;

use super::ast::{ComparisonOperator, DotPath};
use super::SyntaxError;

const KEYWORDS: [&str; 3] = ["not", "and", "or"];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Path(DotPath),
    /// A lone `snake_case` word. Valid lexically, never valid as an operand.
    Ident(String),
    Not,
    And,
    Or,
    Op(ComparisonOperator),
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Str(s) => write!(f, "string '{s}'"),
            TokenKind::Int(i) => write!(f, "integer {i}"),
            TokenKind::Float(x) => write!(f, "float {x}"),
            TokenKind::Bool(b) => write!(f, "'{b}'"),
            TokenKind::Path(path) => write!(f, "dot path '{path}'"),
            TokenKind::Ident(word) => write!(f, "identifier '{word}'"),
            TokenKind::Not => f.write_str("'not'"),
            TokenKind::And => f.write_str("'and'"),
            TokenKind::Or => f.write_str("'or'"),
            TokenKind::Op(op) => write!(f, "'{op}'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Character offset of the first character.
    pub position: usize,
}

/// Split `input` into tokens.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        let kind = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => {
                i += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                TokenKind::RParen
            }
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| SyntaxError::new("Unterminated string literal", start, input))?;
                let value: String = chars[i + 1..i + 1 + close].iter().collect();
                i += close + 2;
                TokenKind::Str(value)
            }
            '=' | '!' | '<' | '>' => {
                let next_is_eq = chars.get(i + 1) == Some(&'=');
                let op = match (c, next_is_eq) {
                    ('=', true) => ComparisonOperator::Eq,
                    ('!', true) => ComparisonOperator::Ne,
                    ('<', true) => ComparisonOperator::Le,
                    ('>', true) => ComparisonOperator::Ge,
                    ('<', false) => ComparisonOperator::Lt,
                    ('>', false) => ComparisonOperator::Gt,
                    _ => {
                        return Err(SyntaxError::new(
                            format!("Invalid operator '{c}', expected one of == != < <= > >= in"),
                            start,
                            input,
                        ))
                    }
                };
                i += if next_is_eq { 2 } else { 1 };
                TokenKind::Op(op)
            }
            c if is_word_char(c) => {
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                classify_word(&word).map_err(|message| SyntaxError::new(message, start, input))?
            }
            other => {
                return Err(SyntaxError::new(
                    format!("Unexpected character '{other}'"),
                    start,
                    input,
                ))
            }
        };

        tokens.push(Token {
            kind,
            position: start,
        });
    }

    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn classify_word(word: &str) -> Result<TokenKind, String> {
    if word.contains('.') {
        if let Some((int_part, frac_part)) = word.split_once('.') {
            if is_digits(int_part) && is_digits(frac_part) {
                return word
                    .parse::<f64>()
                    .map(TokenKind::Float)
                    .map_err(|_| format!("Invalid float literal '{word}'"));
            }
        }
        return parse_dot_path(word).map(TokenKind::Path);
    }

    if is_digits(word) {
        return word
            .parse::<i64>()
            .map(TokenKind::Int)
            .map_err(|_| format!("Integer literal out of range '{word}'"));
    }

    match word {
        "true" => Ok(TokenKind::Bool(true)),
        "false" => Ok(TokenKind::Bool(false)),
        "not" => Ok(TokenKind::Not),
        "and" => Ok(TokenKind::And),
        "or" => Ok(TokenKind::Or),
        "in" => Ok(TokenKind::Op(ComparisonOperator::In)),
        w if is_path_segment(w) => Ok(TokenKind::Ident(w.to_string())),
        w => Err(format!("Invalid token '{w}'")),
    }
}

fn parse_dot_path(word: &str) -> Result<DotPath, String> {
    let segments: Vec<&str> = word.split('.').collect();
    if let Some(bad) = segments.iter().find(|s| !is_path_segment(s)) {
        return Err(if bad.is_empty() {
            format!("Invalid dot path '{word}': empty segment")
        } else {
            format!("Invalid dot path '{word}': '{bad}' is not a snake_case identifier")
        });
    }
    match segments.split_first() {
        Some((entity_id, chain)) if !chain.is_empty() => {
            Ok(DotPath::new(*entity_id, chain.iter().copied()))
        }
        _ => Err(format!("Invalid dot path '{word}'")),
    }
}

/// `[a-z][a-z0-9]*(_[a-z0-9]+)*`, excluding the keywords `not`, `and` and `or`.
fn is_path_segment(segment: &str) -> bool {
    if KEYWORDS.contains(&segment) {
        return false;
    }
    if !segment.starts_with(|c: char| c.is_ascii_lowercase()) {
        return false;
    }
    segment.split('_').all(|part| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    })
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_literals() {
        assert_eq!(kinds("''"), vec![TokenKind::Str(String::new())]);
        assert_eq!(kinds("\" foo\""), vec![TokenKind::Str(" foo".to_string())]);
        assert_eq!(kinds("'it\"s'"), vec![TokenKind::Str("it\"s".to_string())]);
        assert_eq!(kinds("666"), vec![TokenKind::Int(666)]);
        assert_eq!(kinds("0.99"), vec![TokenKind::Float(0.99)]);
        assert_eq!(
            kinds("true false"),
            vec![TokenKind::Bool(true), TokenKind::Bool(false)]
        );
    }

    #[test]
    fn test_operators_without_whitespace() {
        assert_eq!(
            kinds("a.b<=1"),
            vec![
                TokenKind::Path(DotPath::new("a", ["b"])),
                TokenKind::Op(ComparisonOperator::Le),
                TokenKind::Int(1),
            ]
        );
        assert_eq!(kinds("!=")[0], TokenKind::Op(ComparisonOperator::Ne));
        assert_eq!(kinds("in")[0], TokenKind::Op(ComparisonOperator::In));
    }

    #[test]
    fn test_keywords_only_as_whole_words() {
        assert_eq!(kinds("not")[0], TokenKind::Not);
        assert_eq!(kinds("notary")[0], TokenKind::Ident("notary".to_string()));
        assert_eq!(
            kinds("notary.active")[0],
            TokenKind::Path(DotPath::new("notary", ["active"]))
        );
        assert_eq!(
            kinds("standard.item")[0],
            TokenKind::Path(DotPath::new("standard", ["item"]))
        );
        assert!(tokenize("not.b").is_err());
        assert!(tokenize("a.or").is_err());
    }

    #[test]
    fn test_path_segments() {
        assert!(is_path_segment("f"));
        assert!(is_path_segment("f_b_b"));
        assert!(is_path_segment("node_a"));
        assert!(is_path_segment("test_123"));
        assert!(!is_path_segment("_foo"));
        assert!(!is_path_segment("foo_"));
        assert!(!is_path_segment("foo__bar"));
        assert!(!is_path_segment("foo_Bar"));
        assert!(!is_path_segment("1foo"));
        assert!(!is_path_segment(""));
    }

    #[test]
    fn test_errors_carry_position() {
        let err = tokenize("a.b = 1").unwrap_err();
        assert_eq!(err.position, 4);

        let err = tokenize("foo.bar == 'open").unwrap_err();
        assert_eq!(err.position, 11);
        assert!(err.message.contains("Unterminated"));

        let err = tokenize("a.b > #").unwrap_err();
        assert_eq!(err.position, 6);
    }

    #[test]
    fn test_bad_words() {
        for input in ["a..b", ".a.b", "a.b.", "Foo.bar", "foo.Bar", "foo._bar", "1_0", "True"] {
            assert!(tokenize(input).is_err(), "{input:?} should not tokenize");
        }
    }
}
