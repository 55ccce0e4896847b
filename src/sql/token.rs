//! SQL Token definitions
//!
//! Type names (`int`, `varchar`...) are not keywords: they lex as
//! identifiers and are resolved through the catalog's type table.

use std::fmt;

/// SQL Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========== Keywords ==========
    // DML Keywords
    Select,
    Insert,
    Update,
    Delete,
    Into,
    Values,
    Set,
    From,
    Where,

    // Clauses
    And,
    Or,
    Not,
    As,
    On,
    Join,
    Inner,
    Left,
    Right,
    Outer,
    Full,
    Cross,
    Natural,
    Using,

    // Ordering & Grouping
    Order,
    By,
    Asc,
    Desc,
    Collate,
    Group,
    Having,
    Limit,
    Offset,

    // Compound queries
    Union,
    Intersect,
    Except,

    Default,
    Null,

    // Boolean Literals
    True,
    False,

    // Other Keywords
    Distinct,
    All,
    Exists,
    In,
    Between,
    Like,
    Ilike,
    Similar,
    To,
    Is,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,

    // Transactions
    Begin,
    Commit,
    Rollback,
    Transaction,
    Savepoint,
    Release,

    // ========== Literals ==========
    /// Integer literal
    IntegerLiteral(i64),
    /// Float literal
    FloatLiteral(f64),
    /// String literal (single-quoted)
    StringLiteral(String),
    /// Binary literal `X'..'`
    BlobLiteral(Vec<u8>),
    /// Identifier; a double-quoted identifier keeps its quotes
    Identifier(String),
    /// `##name::type::null`, holding the text after `##`
    Placeholder(String),
    /// `## /* name:.. type:.. */`, holding the comment text
    LongPlaceholder(String),

    // ========== Operators ==========
    /// =
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Lte,
    /// >=
    Gte,
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Asterisk,
    /// /
    Slash,
    /// %
    Percent,
    /// ||
    Concat,
    /// &
    Ampersand,
    /// |
    Pipe,
    /// ~
    Tilde,
    /// ~*
    TildeStar,
    /// !~
    NotTilde,
    /// !~*
    NotTildeStar,
    /// ::
    DoubleColon,

    // ========== Delimiters ==========
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    // ========== Special ==========
    /// End of input
    Eof,
}

impl Token {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            Token::IntegerLiteral(_)
                | Token::FloatLiteral(_)
                | Token::StringLiteral(_)
                | Token::BlobLiteral(_)
                | Token::Identifier(_)
                | Token::Placeholder(_)
                | Token::LongPlaceholder(_)
                | Token::Eq
                | Token::Neq
                | Token::Lt
                | Token::Gt
                | Token::Lte
                | Token::Gte
                | Token::Plus
                | Token::Minus
                | Token::Asterisk
                | Token::Slash
                | Token::Percent
                | Token::Concat
                | Token::Ampersand
                | Token::Pipe
                | Token::Tilde
                | Token::TildeStar
                | Token::NotTilde
                | Token::NotTildeStar
                | Token::DoubleColon
                | Token::LParen
                | Token::RParen
                | Token::Comma
                | Token::Semicolon
                | Token::Dot
                | Token::Eof
        )
    }

    /// Try to parse a keyword from a string
    pub fn from_keyword(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            // DML
            "SELECT" => Some(Token::Select),
            "INSERT" => Some(Token::Insert),
            "UPDATE" => Some(Token::Update),
            "DELETE" => Some(Token::Delete),
            "INTO" => Some(Token::Into),
            "VALUES" => Some(Token::Values),
            "SET" => Some(Token::Set),
            "FROM" => Some(Token::From),
            "WHERE" => Some(Token::Where),

            // Clauses
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "NOT" => Some(Token::Not),
            "AS" => Some(Token::As),
            "ON" => Some(Token::On),
            "JOIN" => Some(Token::Join),
            "INNER" => Some(Token::Inner),
            "LEFT" => Some(Token::Left),
            "RIGHT" => Some(Token::Right),
            "OUTER" => Some(Token::Outer),
            "FULL" => Some(Token::Full),
            "CROSS" => Some(Token::Cross),
            "NATURAL" => Some(Token::Natural),
            "USING" => Some(Token::Using),

            // Ordering & Grouping
            "ORDER" => Some(Token::Order),
            "BY" => Some(Token::By),
            "ASC" => Some(Token::Asc),
            "DESC" => Some(Token::Desc),
            "COLLATE" => Some(Token::Collate),
            "GROUP" => Some(Token::Group),
            "HAVING" => Some(Token::Having),
            "LIMIT" => Some(Token::Limit),
            "OFFSET" => Some(Token::Offset),

            "UNION" => Some(Token::Union),
            "INTERSECT" => Some(Token::Intersect),
            "EXCEPT" => Some(Token::Except),

            "DEFAULT" => Some(Token::Default),
            "NULL" => Some(Token::Null),

            // Boolean Literals
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),

            // Other Keywords
            "DISTINCT" => Some(Token::Distinct),
            "ALL" => Some(Token::All),
            "EXISTS" => Some(Token::Exists),
            "IN" => Some(Token::In),
            "BETWEEN" => Some(Token::Between),
            "LIKE" => Some(Token::Like),
            "ILIKE" => Some(Token::Ilike),
            "SIMILAR" => Some(Token::Similar),
            "TO" => Some(Token::To),
            "IS" => Some(Token::Is),
            "CASE" => Some(Token::Case),
            "WHEN" => Some(Token::When),
            "THEN" => Some(Token::Then),
            "ELSE" => Some(Token::Else),
            "END" => Some(Token::End),
            "CAST" => Some(Token::Cast),

            "BEGIN" => Some(Token::Begin),
            "COMMIT" => Some(Token::Commit),
            "ROLLBACK" => Some(Token::Rollback),
            "TRANSACTION" => Some(Token::Transaction),
            "SAVEPOINT" => Some(Token::Savepoint),
            "RELEASE" => Some(Token::Release),

            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Select => write!(f, "SELECT"),
            Token::Insert => write!(f, "INSERT"),
            Token::Update => write!(f, "UPDATE"),
            Token::Delete => write!(f, "DELETE"),
            Token::Into => write!(f, "INTO"),
            Token::Values => write!(f, "VALUES"),
            Token::Set => write!(f, "SET"),
            Token::From => write!(f, "FROM"),
            Token::Where => write!(f, "WHERE"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::As => write!(f, "AS"),
            Token::On => write!(f, "ON"),
            Token::Join => write!(f, "JOIN"),
            Token::Inner => write!(f, "INNER"),
            Token::Left => write!(f, "LEFT"),
            Token::Right => write!(f, "RIGHT"),
            Token::Outer => write!(f, "OUTER"),
            Token::Full => write!(f, "FULL"),
            Token::Cross => write!(f, "CROSS"),
            Token::Natural => write!(f, "NATURAL"),
            Token::Using => write!(f, "USING"),
            Token::Order => write!(f, "ORDER"),
            Token::By => write!(f, "BY"),
            Token::Asc => write!(f, "ASC"),
            Token::Desc => write!(f, "DESC"),
            Token::Collate => write!(f, "COLLATE"),
            Token::Group => write!(f, "GROUP"),
            Token::Having => write!(f, "HAVING"),
            Token::Limit => write!(f, "LIMIT"),
            Token::Offset => write!(f, "OFFSET"),
            Token::Union => write!(f, "UNION"),
            Token::Intersect => write!(f, "INTERSECT"),
            Token::Except => write!(f, "EXCEPT"),
            Token::Default => write!(f, "DEFAULT"),
            Token::Null => write!(f, "NULL"),
            Token::True => write!(f, "TRUE"),
            Token::False => write!(f, "FALSE"),
            Token::Distinct => write!(f, "DISTINCT"),
            Token::All => write!(f, "ALL"),
            Token::Exists => write!(f, "EXISTS"),
            Token::In => write!(f, "IN"),
            Token::Between => write!(f, "BETWEEN"),
            Token::Like => write!(f, "LIKE"),
            Token::Ilike => write!(f, "ILIKE"),
            Token::Similar => write!(f, "SIMILAR"),
            Token::To => write!(f, "TO"),
            Token::Is => write!(f, "IS"),
            Token::Case => write!(f, "CASE"),
            Token::When => write!(f, "WHEN"),
            Token::Then => write!(f, "THEN"),
            Token::Else => write!(f, "ELSE"),
            Token::End => write!(f, "END"),
            Token::Cast => write!(f, "CAST"),
            Token::Begin => write!(f, "BEGIN"),
            Token::Commit => write!(f, "COMMIT"),
            Token::Rollback => write!(f, "ROLLBACK"),
            Token::Transaction => write!(f, "TRANSACTION"),
            Token::Savepoint => write!(f, "SAVEPOINT"),
            Token::Release => write!(f, "RELEASE"),
            Token::IntegerLiteral(n) => write!(f, "{}", n),
            Token::FloatLiteral(n) => write!(f, "{}", n),
            Token::StringLiteral(s) => write!(f, "'{}'", s),
            Token::BlobLiteral(bytes) => {
                write!(f, "X'")?;
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                write!(f, "'")
            }
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Placeholder(s) => write!(f, "##{}", s),
            Token::LongPlaceholder(s) => write!(f, "## /*{}*/", s),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "<>"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Lte => write!(f, "<="),
            Token::Gte => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Concat => write!(f, "||"),
            Token::Ampersand => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Tilde => write!(f, "~"),
            Token::TildeStar => write!(f, "~*"),
            Token::NotTilde => write!(f, "!~"),
            Token::NotTildeStar => write!(f, "!~*"),
            Token::DoubleColon => write!(f, "::"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_parsing() {
        assert_eq!(Token::from_keyword("SELECT"), Some(Token::Select));
        assert_eq!(Token::from_keyword("select"), Some(Token::Select));
        assert_eq!(Token::from_keyword("SeLeCt"), Some(Token::Select));
        assert_eq!(Token::from_keyword("savepoint"), Some(Token::Savepoint));
        assert_eq!(Token::from_keyword("int"), None);
        assert_eq!(Token::from_keyword("unknown"), None);
    }

    #[test]
    fn test_is_keyword() {
        assert!(Token::Select.is_keyword());
        assert!(Token::Union.is_keyword());
        assert!(!Token::Asterisk.is_keyword());
        assert!(!Token::IntegerLiteral(42).is_keyword());
        assert!(!Token::Placeholder("p".to_string()).is_keyword());
    }
}
