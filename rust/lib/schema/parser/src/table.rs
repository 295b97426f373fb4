//! Block scan: groups declaration lines under the table that owns them.

use tracing::{debug, warn};

use crate::lexer::{self, Token};

/// Raw declarations of one `table` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock<'a> {
    pub name: &'a str,
    pub line: usize,
    pub fields: Vec<FieldLine<'a>>,
    pub indices: Vec<IndexLine<'a>>,
}

/// `name Type [attributes]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLine<'a> {
    pub line: usize,
    pub name: &'a str,
    pub ty: &'a str,
    pub attrs: Option<&'a str>,
}

/// `index name [col, col]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLine<'a> {
    pub line: usize,
    pub name: &'a str,
    pub columns: Vec<&'a str>,
}

impl<'a> TableBlock<'a> {
    fn new(name: &'a str, line: usize) -> Self {
        Self {
            name,
            line,
            fields: Vec::new(),
            indices: Vec::new(),
        }
    }
}

/// Split the source into table blocks, one per `table` statement in source
/// order (the same statements `ModelMap::build` numbers).
///
/// A line may hold several declarations, so `table Country { id Int [pk]
/// name String }` is accepted. A `}` ends the current block; declarations
/// after it and before the next `table` are dropped.
pub fn scan(source: &str) -> Vec<TableBlock<'_>> {
    let mut blocks: Vec<TableBlock<'_>> = Vec::new();
    let mut open = false;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        if lexer::is_blank_or_comment(raw) {
            continue;
        }
        let tokens = lexer::tokenize(raw);

        let rest = if matches!(tokens.first(), Some(Token::Word("table"))) {
            match lexer::table_header(&tokens) {
                Some(name) => {
                    blocks.push(TableBlock::new(name, line));
                    open = true;
                    &tokens[2..]
                }
                None => {
                    warn!(line, "table statement without a name skipped");
                    continue;
                }
            }
        } else {
            &tokens[..]
        };

        let current = if open { blocks.last_mut() } else { None };
        declarations(rest, line, current, &mut open);
    }

    blocks
}

fn declarations<'a>(
    tokens: &[Token<'a>],
    line: usize,
    mut block: Option<&mut TableBlock<'a>>,
    open: &mut bool,
) {
    let mut i = 0;
    while i < tokens.len() {
        let name = match tokens[i] {
            Token::Open => {
                i += 1;
                continue;
            }
            Token::Close => {
                *open = false;
                block = None;
                i += 1;
                continue;
            }
            Token::Group(group) => {
                debug!(line, group, "attribute block without a field skipped");
                i += 1;
                continue;
            }
            Token::Word(word) => word,
        };

        let ty = match tokens.get(i + 1) {
            Some(Token::Word(ty)) => *ty,
            _ => {
                debug!(line, token = name, "declaration with fewer than two tokens skipped");
                i += 1;
                continue;
            }
        };
        let attrs = match tokens.get(i + 2) {
            Some(Token::Group(group)) => Some(*group),
            _ => None,
        };
        i += if attrs.is_some() { 3 } else { 2 };

        let Some(block) = block.as_deref_mut() else {
            warn!(line, field = name, "declaration outside a table block skipped");
            continue;
        };

        if name == "index" {
            match attrs {
                Some(columns) => block.indices.push(IndexLine {
                    line,
                    name: ty,
                    columns: lexer::split_top_level(columns, ','),
                }),
                None => debug!(line, index = ty, "index statement without columns skipped"),
            }
        } else {
            block.fields.push(FieldLine {
                line,
                name,
                ty,
                attrs,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_declaration_per_line() {
        let src = "table Port {\n  id Int [pk, increment]\n  name String\n}\n";
        let blocks = scan(src);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "Port");
        assert_eq!(
            blocks[0].fields,
            vec![
                FieldLine {
                    line: 2,
                    name: "id",
                    ty: "Int",
                    attrs: Some("pk, increment")
                },
                FieldLine {
                    line: 3,
                    name: "name",
                    ty: "String",
                    attrs: None
                },
            ]
        );
    }

    #[test]
    fn single_line_table() {
        let blocks = scan("table Country { id Int [pk, increment] name String }");
        let names: Vec<_> = blocks[0].fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn short_lines_are_skipped() {
        let blocks = scan("table Port {\n  id Int [pk]\n  orphan\n  name String\n}\n");
        let names: Vec<_> = blocks[0].fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn index_statement() {
        let blocks = scan("table Leg {\n  id Int [pk]\n  index ix_leg_route [voyage_id, leg_number]\n}\n");
        assert_eq!(
            blocks[0].indices,
            vec![IndexLine {
                line: 3,
                name: "ix_leg_route",
                columns: vec!["voyage_id", "leg_number"]
            }]
        );
    }

    #[test]
    fn declarations_after_close_are_dropped() {
        let blocks = scan("table A {\n  id Int [pk]\n}\nstray Int\ntable B\n  id Int [pk]\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].fields.len(), 1);
        assert_eq!(blocks[1].fields.len(), 1);
    }

    #[test]
    fn nameless_table_is_not_a_block() {
        let blocks = scan("table A\n  id Int [pk]\ntable\n  x Int\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].fields.len(), 2);
    }
}
