//! Source pre-check, run before any parsing.

use crate::error::ParseError;
use crate::lexer::{self, Token};

/// The source must open with a `table` declaration (blank and comment lines
/// may precede it) and its braces must balance.
pub fn check(source: &str) -> Result<(), ParseError> {
    let mut first = true;
    let mut opened = 0usize;
    let mut closed = 0usize;

    for (idx, line) in source.lines().enumerate() {
        if lexer::is_blank_or_comment(line) {
            continue;
        }
        let tokens = lexer::tokenize(line);

        if first {
            if !matches!(tokens.first(), Some(Token::Word("table"))) {
                return Err(ParseError::MissingTable {
                    line: idx + 1,
                    found: line.trim().to_string(),
                });
            }
            first = false;
        }

        for token in &tokens {
            match token {
                Token::Open => opened += 1,
                Token::Close => {
                    closed += 1;
                    if closed > opened {
                        return Err(ParseError::UnexpectedClose { line: idx + 1 });
                    }
                }
                _ => {}
            }
        }
    }

    if first {
        return Err(ParseError::Empty);
    }
    if opened != closed {
        return Err(ParseError::UnbalancedBraces { opened, closed });
    }
    Ok(())
}
