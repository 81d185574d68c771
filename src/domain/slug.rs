//! Utilities for deriving and checking URL-safe post slugs.
//!
//! The helpers here bridge ASCII slugification (`slug` crate) with Chinese
//! transliteration (`pinyin` crate) so inputs like “基线对齐” become
//! `ji-xian-dui-qi`. A slug is the storage key of every post view, so explicit
//! slugs supplied by an author are validated against the same alphabet.

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

/// Errors that can occur while deriving or validating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("slug `{slug}` contains `{character}`; only lowercase letters, digits and hyphens are allowed")]
    InvalidCharacter { slug: String, character: char },
    #[error("slug `{slug}` must start and end with a letter or digit")]
    EdgeHyphen { slug: String },
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let transliterated = transliterate_to_ascii(input);
    let candidate = slugify(&transliterated);

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Check that an author-supplied slug is URL-safe.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.is_empty() {
        return Err(SlugError::EmptyInput);
    }

    if let Some(character) = slug
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '-'))
    {
        return Err(SlugError::InvalidCharacter {
            slug: slug.to_string(),
            character,
        });
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(SlugError::EdgeHyphen {
            slug: slug.to_string(),
        });
    }

    Ok(())
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            // Punctuation is dropped, not turned into a separator.
            if !ch.is_ascii_punctuation() || ch == '-' {
                output.push(ch);
            }
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None if !ch.is_alphanumeric() => {}
            None => {
                // Preserve unhandled characters so slugify can decide how to filter them.
                output.push(ch);
            }
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        let slug = derive_slug("Hello World").expect("slug");
        assert_eq!(slug, "hello-world");
    }

    #[test]
    fn derive_slug_strips_punctuation() {
        let slug = derive_slug("Rust: Ownership, Borrowing & You!").expect("slug");
        assert_eq!(slug, "rust-ownership-borrowing-you");
        validate_slug(&slug).expect("derived slugs are always valid");
    }

    #[test]
    fn derive_slug_drops_apostrophes_inside_words() {
        assert_eq!(derive_slug("Don't stop").expect("slug"), "dont-stop");
        assert_eq!(derive_slug("Don’t stop").expect("slug"), "dont-stop");
        assert_eq!(derive_slug("Step-by-step: C++").expect("slug"), "step-by-step-c");
    }

    #[test]
    fn derive_slug_transliterates_chinese() {
        let slug = derive_slug("Rust 基础教程").expect("slug");
        assert_eq!(slug, "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn derive_slug_rejects_blank_titles() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn validate_slug_rejects_uppercase_and_punctuation() {
        assert_eq!(
            validate_slug("Hello-world"),
            Err(SlugError::InvalidCharacter {
                slug: "Hello-world".to_string(),
                character: 'H',
            })
        );
        assert!(matches!(
            validate_slug("hello_world"),
            Err(SlugError::InvalidCharacter { character: '_', .. })
        ));
        assert_eq!(validate_slug(""), Err(SlugError::EmptyInput));
        assert!(validate_slug("hello-world-2").is_ok());
    }

    #[test]
    fn validate_slug_rejects_edge_hyphens() {
        for slug in ["-", "---", "-hello", "hello-"] {
            assert_eq!(
                validate_slug(slug),
                Err(SlugError::EdgeHyphen {
                    slug: slug.to_string(),
                }),
                "{slug}"
            );
        }
    }
}
