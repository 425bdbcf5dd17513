/// Utility functions for string processing, particularly SQL literal
/// escaping and placeholder scanning
use regex::Regex;

// Regex compiled once as a lazy static for performance
static PLACEHOLDER_REGEX: once_cell::sync::Lazy<Regex> =
    once_cell::sync::Lazy::new(|| Regex::new(r"\?").unwrap());

/// Escape a string for inclusion into an SQL query as a literal.
///
/// Every single-quote character is doubled; all other characters are
/// copied unchanged. When `add_surrounding_quotes` is true the result
/// is wrapped in one single quote on each side. This is the minimal
/// dialect-agnostic fallback for backends without native parameter
/// binding; no backslash or dialect-specific handling is performed.
///
/// Escaping is idempotent only for inputs containing no single quote:
/// doubled quotes are themselves valid input, so escaping twice is not
/// the same as escaping once.
pub fn escape_sql_literal(s: &str, add_surrounding_quotes: bool) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    if add_surrounding_quotes {
        out.push('\'');
    }
    for ch in s.chars() {
        if ch == '\'' {
            // Single quotes are escaped by repeating them
            out.push('\'');
        }
        out.push(ch);
    }
    if add_surrounding_quotes {
        out.push('\'');
    }
    out
}

/// Check if a position in SQL is inside quotes (handles both single and double quotes)
pub fn is_in_quotes(sql: &str, pos: usize) -> bool {
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escaped = false;

    for (i, ch) in sql.char_indices() {
        if i > pos {
            break;
        }
        if escaped {
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '\'' => {
                if !in_double_quote {
                    in_single_quote = !in_single_quote;
                }
            }
            '"' => {
                if !in_single_quote {
                    in_double_quote = !in_double_quote;
                }
            }
            _ => {}
        }
    }

    in_single_quote || in_double_quote
}

/// Count positional `?` placeholders in a statement, ignoring any that
/// appear inside quoted string literals
pub fn count_placeholders(sql: &str) -> usize {
    PLACEHOLDER_REGEX
        .find_iter(sql)
        .filter(|m| !is_in_quotes(sql, m.start()))
        .count()
}
