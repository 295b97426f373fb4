//! Line tokenizer.
//!
//! The DSL is whitespace-delimited, but a type may carry attached
//! parameters (`String(64)`, `Decimal[precision: 10, scale: 2]`,
//! `LineItem[]`) and an attribute block may contain spaces and quoted
//! strings. Brackets, parentheses and quotes are therefore tracked so that
//! neither splits a token.

/// A lexical token on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A bare word, including any directly attached `(...)` / `[...]`.
    Word(&'a str),
    /// A free-standing `[...]` attribute block; holds the inner text.
    Group(&'a str),
    Open,
    Close,
}

/// True for lines that carry no tokens: blank or `#` comments.
pub fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            c if c.is_ascii_whitespace() => i += 1,
            b'{' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b'}' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b'[' => {
                let end = skip_enclosed(bytes, i);
                let inner_end = if bytes.get(end - 1) == Some(&b']') {
                    end - 1
                } else {
                    end
                };
                tokens.push(Token::Group(&line[i + 1..inner_end]));
                i = end;
            }
            _ => {
                let start = i;
                while i < bytes.len() {
                    match bytes[i] {
                        c if c.is_ascii_whitespace() => break,
                        b'{' | b'}' => break,
                        b'[' | b'(' => i = skip_enclosed(bytes, i),
                        _ => i += 1,
                    }
                }
                tokens.push(Token::Word(&line[start..i]));
            }
        }
    }

    tokens
}

/// Given `bytes[open]` is `[` or `(`, return the index just past its
/// matching closer, or the end of input if it is never closed.
fn skip_enclosed(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                b'"' | b'\'' => quote = Some(c),
                b'[' | b'(' => depth += 1,
                b']' | b')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    bytes.len()
}

/// Split on `sep` outside quotes and brackets; items are trimmed and empty
/// items dropped.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '(' => depth += 1,
                ']' | ')' => depth = depth.saturating_sub(1),
                c if c == sep && depth == 0 => {
                    items.push(text[start..i].trim());
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    items.push(text[start..].trim());

    items.retain(|s| !s.is_empty());
    items
}

/// Strip one level of matching single or double quotes.
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    for q in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
            return inner;
        }
    }
    text
}

/// The declared name if `tokens` open a table (`table <Name> ...`).
pub fn table_header<'a>(tokens: &[Token<'a>]) -> Option<&'a str> {
    match tokens {
        [Token::Word("table"), Token::Word(name), ..] => Some(*name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Token::*;

    #[test]
    fn field_line() {
        assert_eq!(
            tokenize("  country_id Int [ref: > Country.id]"),
            vec![Word("country_id"), Word("Int"), Group("ref: > Country.id")]
        );
    }

    #[test]
    fn attached_parameters_stay_in_word() {
        assert_eq!(
            tokenize("rate Decimal(10, 2) [not null]"),
            vec![Word("rate"), Word("Decimal(10, 2)"), Group("not null")]
        );
        assert_eq!(
            tokenize("code String[length: 5]"),
            vec![Word("code"), Word("String[length: 5]")]
        );
        assert_eq!(
            tokenize("items LineItem[] [back_populates: \"manifest\"]"),
            vec![
                Word("items"),
                Word("LineItem[]"),
                Group("back_populates: \"manifest\"")
            ]
        );
    }

    #[test]
    fn braces_split_words() {
        assert_eq!(
            tokenize("table Country{ id Int }"),
            vec![Word("table"), Word("Country"), Open, Word("id"), Word("Int"), Close]
        );
    }

    #[test]
    fn brackets_inside_quotes() {
        assert_eq!(
            tokenize("note String [default: \"a ] b\"]"),
            vec![Word("note"), Word("String"), Group("default: \"a ] b\"")]
        );
    }

    #[test]
    fn unterminated_group_runs_to_end() {
        assert_eq!(
            tokenize("id Int [pk, increment"),
            vec![Word("id"), Word("Int"), Group("pk, increment")]
        );
    }

    #[test]
    fn split_respects_quotes() {
        assert_eq!(
            split_top_level("pk, default: \"a, b\", note: 'x'", ','),
            vec!["pk", "default: \"a, b\"", "note: 'x'"]
        );
        assert!(split_top_level(" , ", ',').is_empty());
    }

    #[test]
    fn header() {
        assert_eq!(table_header(&tokenize("table Port {")), Some("Port"));
        assert_eq!(table_header(&tokenize("table")), None);
        assert_eq!(table_header(&tokenize("tables Port")), None);
        assert_eq!(unquote("\"port_of_loading\""), "port_of_loading");
        assert!(is_blank_or_comment("   # comment"));
    }
}
