//! SQL text front end
//!
//! Turns SQL text, including `##name::type` placeholders, into statement
//! trees.

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;

use crate::error::Result;
use crate::stmt::Statement;
use tracing::trace;

/// Parse exactly one statement
///
/// A trailing semicolon is accepted; anything after it is an error. The
/// returned statement remembers the text it was parsed from.
pub fn parse(sql: &str) -> Result<Statement> {
    let mut parser = Parser::new(sql)?;
    let stmt = parser.parse()?;
    parser.expect_end()?;
    trace!(kind = %stmt.kind(), "parsed statement");

    let text = sql.trim().trim_end_matches(';').trim_end();
    Ok(stmt.with_sql(text))
}

/// Parse a semicolon separated script
pub fn parse_all(sql: &str) -> Result<Vec<Statement>> {
    let mut parser = Parser::new(sql)?;
    parser.parse_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::StatementKind;

    #[test]
    fn test_parse_keeps_source() {
        let stmt = parse("  DELETE FROM t WHERE id = 1 ;").unwrap();
        assert_eq!(stmt.kind(), StatementKind::Delete);
        assert_eq!(stmt.source_sql.as_deref(), Some("DELETE FROM t WHERE id = 1"));
    }

    #[test]
    fn test_parse_rejects_trailing_statement() {
        assert!(parse("SELECT 1; SELECT 2").is_err());
    }

    #[test]
    fn test_parse_all() {
        let stmts = parse_all("BEGIN; UPDATE t SET a = 1; COMMIT;").unwrap();
        let kinds: Vec<_> = stmts.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StatementKind::Begin,
                StatementKind::Update,
                StatementKind::Commit
            ]
        );
    }
}
