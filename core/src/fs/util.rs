use std::cmp::Ordering;
use std::path::Path;

use crate::error::FsError;
use crate::types::Entry;

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Reject names that would escape or alias the parent directory.
pub fn validate_name(name: &str) -> Result<(), FsError> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid { Err(FsError::InvalidName(name.to_string())) } else { Ok(()) }
}

/// Fail when `destination` is `source` itself or lies somewhere below it.
pub fn ensure_not_nested(source: &Path, destination: &Path) -> Result<(), FsError> {
    if destination.starts_with(source) {
        return Err(FsError::DestinationInsideSource {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    Ok(())
}

pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| natural_cmp(&a.name.to_lowercase(), &b.name.to_lowercase()));
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_tokens = tokenize(a);
    let b_tokens = tokenize(b);

    for (a_tok, b_tok) in a_tokens.iter().zip(b_tokens.iter()) {
        let order = match (a_tok, b_tok) {
            (Token::Number(a_digits, a_val), Token::Number(b_digits, b_val)) => {
                a_val.cmp(b_val).then_with(|| a_digits.len().cmp(&b_digits.len()))
            }
            (Token::Text(a_text), Token::Text(b_text)) => a_text.cmp(b_text),
            (Token::Number(..), Token::Text(..)) => Ordering::Less,
            (Token::Text(..), Token::Number(..)) => Ordering::Greater,
        };
        if order != Ordering::Equal {
            return order;
        }
    }

    a_tokens.len().cmp(&b_tokens.len()).then_with(|| a.cmp(b))
}

#[derive(Debug, PartialEq)]
pub enum Token<'a> {
    Text(&'a str),
    Number(&'a str, u128),
}

pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut chars = input.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !ch.is_ascii_digit() {
            continue;
        }
        if start < idx {
            tokens.push(Token::Text(&input[start..idx]));
        }
        let mut end = idx + ch.len_utf8();
        while let Some(&(next_idx, next_ch)) = chars.peek() {
            if !next_ch.is_ascii_digit() {
                break;
            }
            chars.next();
            end = next_idx + next_ch.len_utf8();
        }
        let digits = &input[idx..end];
        tokens.push(Token::Number(digits, digits.parse::<u128>().unwrap_or(0)));
        start = end;
    }

    if start < input.len() {
        tokens.push(Token::Text(&input[start..]));
    }

    tokens
}
