//! `$Name` / `${Name}` placeholder expansion for deployment parameters.

use crate::error::{Error, Result};

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expand `$Name` and `${Name}` tokens in `text` using `resolver`.
///
/// The resolver is supplied by the caller, typically backed by the contracts
/// repository. Expansion is a single pass over the input: resolved values are
/// never re-scanned for tokens, and the function holds no state between
/// calls.
///
/// A `$` not followed by an identifier or `{` passes through literally. A
/// reference the resolver cannot satisfy (including an unterminated `${`) is
/// an [`Error::UnknownReference`] so a dangling name can never deploy with a
/// garbage address.
pub fn expand<F>(text: &str, resolver: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek() {
            Some(&(start, '{')) => {
                chars.next();
                let name_start = start + 1;
                let mut name_end = None;
                for (i, c) in chars.by_ref() {
                    if c == '}' {
                        name_end = Some(i);
                        break;
                    }
                }
                let name = match name_end {
                    Some(end) => &text[name_start..end],
                    None => {
                        // Unterminated `${`; report the dangling text.
                        return Err(Error::UnknownReference {
                            name: text[name_start..].to_string(),
                        });
                    }
                };
                out.push_str(&resolve(name, &resolver)?);
            }
            Some(&(start, c)) if is_ident_char(c) => {
                let mut end = text.len();
                while let Some(&(i, c)) = chars.peek() {
                    if is_ident_char(c) {
                        chars.next();
                    } else {
                        end = i;
                        break;
                    }
                }
                out.push_str(&resolve(&text[start..end], &resolver)?);
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}

fn resolve<F>(name: &str, resolver: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    resolver(name).ok_or_else(|| Error::UnknownReference {
        name: name.to_string(),
    })
}
