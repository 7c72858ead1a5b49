//! Identifier normalization.
//!
//! Entity ids are `snake_case`, entity type ids are `PascalCase`. Both may be derived
//! from a human-readable `name`, in which case accents are folded to ASCII first.

use serde_json::Value;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Identifier format violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("Invalid normalized snake_case format: '{0}'")]
    NotSnakeCase(String),

    #[error("Invalid normalized PascalCase format: '{0}'")]
    NotPascalCase(String),
}

/// Decompose to NFKD and drop everything that is not ASCII.
pub fn normalize(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

/// Convert arbitrary text to normalized `snake_case`.
pub fn normalized_snake_case(text: &str) -> String {
    split_words(&normalize(text))
        .iter()
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Convert arbitrary text to normalized `PascalCase`.
///
/// A single-letter word followed by a word that does not continue in lowercase
/// (`X Y`, `A B2`) would read back as one acronym, so the pair is folded into a
/// single word (`Xy`, `Ab2`). The result is always a fixed point.
pub fn normalized_pascal_case(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    for word in split_words(&normalize(text)) {
        let word = capitalize(&word);
        match words.last_mut() {
            Some(prev) if is_single_letter(prev) && !opens_camel_hump(&word) => {
                prev.push_str(&word.to_ascii_lowercase());
            }
            _ => words.push(word),
        }
    }
    words.concat()
}

pub fn is_normalized_snake_case(value: &str) -> bool {
    !value.is_empty() && value == normalized_snake_case(value)
}

pub fn is_normalized_pascal_case(value: &str) -> bool {
    !value.is_empty() && value == normalized_pascal_case(value)
}

pub fn validate_snake_case(value: &str) -> Result<(), IdError> {
    if is_normalized_snake_case(value) {
        Ok(())
    } else {
        Err(IdError::NotSnakeCase(value.to_string()))
    }
}

pub fn validate_pascal_case(value: &str) -> Result<(), IdError> {
    if is_normalized_pascal_case(value) {
        Ok(())
    } else {
        Err(IdError::NotPascalCase(value.to_string()))
    }
}

/// Fill in a missing `id` from a string `name` on a definition object.
///
/// Returns `true` if an id was derived. Objects that already carry an `id`, or
/// have no string `name`, are left untouched.
pub fn id_from_name(data: &mut Value, generate_id: fn(&str) -> String) -> bool {
    let Value::Object(map) = data else {
        return false;
    };
    if map.contains_key("id") {
        return false;
    }
    let Some(Value::String(name)) = map.get("name") else {
        return false;
    };
    let id = generate_id(name);
    map.insert("id".to_string(), Value::String(id));
    true
}

/// Split ASCII text into words.
///
/// Boundaries are any non-alphanumeric character, a lowercase letter or digit followed
/// by an uppercase letter, and the last capital of an acronym run (`HTTPServer`).
fn split_words(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_ascii_uppercase() {
            if let Some(prev) = current.chars().last() {
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                let camel_hump = prev.is_ascii_lowercase() || prev.is_ascii_digit();
                let acronym_end = prev.is_ascii_uppercase() && next_is_lower;
                if camel_hump || acronym_end {
                    words.push(std::mem::take(&mut current));
                }
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn is_single_letter(word: &str) -> bool {
    word.len() == 1 && word.starts_with(|c: char| c.is_ascii_alphabetic())
}

/// Whether a capitalized word still splits off after an uppercase letter.
fn opens_camel_hump(word: &str) -> bool {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) => first.is_ascii_digit() || second.is_ascii_lowercase(),
        (Some(first), None) => first.is_ascii_digit(),
        _ => true,
    }
}

fn capitalize(word: &str) -> String {
    let mut word = word.to_ascii_lowercase();
    if let Some(first) = word.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_ascii() {
        assert_eq!(normalize("hello world"), "hello world");
        assert_eq!(normalize("Hello World"), "Hello World");
        assert_eq!(normalize("test_123"), "test_123");
    }

    #[test]
    fn test_normalize_unicode() {
        assert_eq!(normalize("café"), "cafe");
        assert_eq!(normalize("naïve"), "naive");
        assert_eq!(normalize("résumé"), "resume");
        assert_eq!(normalize("Héllo Wörld"), "Hello World");
        assert!(normalize("日本語").is_empty());
    }

    #[test]
    fn test_normalized_snake_case() {
        assert_eq!(normalized_snake_case("hello world"), "hello_world");
        assert_eq!(normalized_snake_case("Hello World"), "hello_world");
        assert_eq!(normalized_snake_case("test 123"), "test_123");
        assert_eq!(normalized_snake_case("fooBarBaz"), "foo_bar_baz");
        assert_eq!(normalized_snake_case("The Beginning"), "the_beginning");
        assert_eq!(normalized_snake_case("HTTPServer"), "http_server");
    }

    #[test]
    fn test_normalized_snake_case_with_unicode() {
        assert_eq!(normalized_snake_case("café coffee"), "cafe_coffee");
        assert_eq!(normalized_snake_case("Héllo Wörld"), "hello_world");
        assert_eq!(normalized_snake_case("naïve approach"), "naive_approach");
    }

    #[test]
    fn test_normalized_pascal_case() {
        assert_eq!(normalized_pascal_case("hello world"), "HelloWorld");
        assert_eq!(normalized_pascal_case("Hello World"), "HelloWorld");
        assert_eq!(normalized_pascal_case("test 123"), "Test123");
        assert_eq!(normalized_pascal_case("foo_bar"), "FooBar");
        assert_eq!(normalized_pascal_case("Story Arc"), "StoryArc");
        assert_eq!(normalized_pascal_case("café coffee"), "CafeCoffee");
    }

    #[test]
    fn test_derivation_is_idempotent() {
        for name in ["Living room", "The Leaflet", "HTTPServer", "café 2 go", "fooBar_baz 9x"] {
            let snake = normalized_snake_case(name);
            assert_eq!(normalized_snake_case(&snake), snake, "snake_case of {name:?}");
            assert!(is_normalized_snake_case(&snake));

            let pascal = normalized_pascal_case(name);
            assert_eq!(normalized_pascal_case(&pascal), pascal, "PascalCase of {name:?}");
            assert!(is_normalized_pascal_case(&pascal));
        }
    }

    #[test]
    fn test_single_letter_words_fold_into_one() {
        assert_eq!(normalized_pascal_case("X Y"), "Xy");
        assert_eq!(normalized_pascal_case("A B2"), "Ab2");
        assert_eq!(normalized_pascal_case("X Y Z"), "XyZ");
        assert_eq!(normalized_pascal_case("Plan B"), "PlanB");
        assert_eq!(normalized_pascal_case("Act 1 A"), "Act1A");
        assert_eq!(normalized_pascal_case("X Yard"), "XYard");
        assert!(validate_pascal_case(&normalized_pascal_case("X Y")).is_ok());
    }

    #[test]
    fn test_validators() {
        assert!(validate_snake_case("graph_node").is_ok());
        assert_eq!(
            validate_snake_case("InvalidName"),
            Err(IdError::NotSnakeCase("InvalidName".to_string()))
        );
        assert!(validate_snake_case("invalid-name").is_err());
        assert!(validate_snake_case("Invalid_Name").is_err());
        assert!(validate_snake_case("").is_err());

        assert!(validate_pascal_case("TestGraph").is_ok());
        assert!(validate_pascal_case("test_graph").is_err());
    }

    #[test]
    fn test_id_from_name() {
        let mut data = json!({ "name": "Node A" });
        assert!(id_from_name(&mut data, normalized_snake_case));
        assert_eq!(data["id"], "node_a");

        let mut existing = json!({ "id": "custom", "name": "Node A" });
        assert!(!id_from_name(&mut existing, normalized_snake_case));
        assert_eq!(existing["id"], "custom");

        let mut nameless = json!({ "description": "no name" });
        assert!(!id_from_name(&mut nameless, normalized_pascal_case));
        assert!(nameless.get("id").is_none());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn snake_case_is_a_fixed_point(text in "[ -~]{0,12}|\\PC{0,8}") {
                let snake = normalized_snake_case(&text);
                prop_assert_eq!(normalized_snake_case(&snake), snake.clone());
                if !snake.is_empty() {
                    prop_assert!(validate_snake_case(&snake).is_ok());
                }
            }

            #[test]
            fn pascal_case_is_a_fixed_point(text in "[ -~]{0,12}|\\PC{0,8}") {
                let pascal = normalized_pascal_case(&text);
                prop_assert_eq!(normalized_pascal_case(&pascal), pascal.clone());
                if !pascal.is_empty() {
                    prop_assert!(validate_pascal_case(&pascal).is_ok());
                }
            }

            #[test]
            fn short_capitalized_words(words in proptest::collection::vec("[A-Za-z0-9]{1,3}", 1..6)) {
                let pascal = normalized_pascal_case(&words.join(" "));
                prop_assert!(validate_pascal_case(&pascal).is_ok());
            }
        }
    }
}
