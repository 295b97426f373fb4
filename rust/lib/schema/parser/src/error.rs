use thiserror::Error;

/// Fatal source-level errors, raised before any model is built.
///
/// Everything else (unknown tables, bad indices, missing keys) is left to
/// the validator so that a schema author sees all of it at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("schema source is empty")]
    Empty,

    #[error("line {line}: expected a `table` declaration, found `{found}`")]
    MissingTable { line: usize, found: String },

    #[error("line {line}: `}}` without a matching `{{`")]
    UnexpectedClose { line: usize },

    #[error("unbalanced braces: {opened} opened, {closed} closed")]
    UnbalancedBraces { opened: usize, closed: usize },
}
