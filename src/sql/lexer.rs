//! SQL Lexer (Tokenizer)
//!
//! This module converts SQL strings into a stream of tokens. A leading `-`
//! is always an operator; the parser folds it into numeric literals.

use super::token::Token;
use crate::error::{Error, Result};

/// Characters allowed in a short placeholder spec after `##`
pub(crate) fn is_spec_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '+' | '-' | '.' | ':' | '|' | '@' | '?')
}

/// SQL Lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.skip_comments()?;

        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();
        let simple = match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '.' => Some(Token::Dot),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Asterisk),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '=' => Some(Token::Eq),
            '&' => Some(Token::Ampersand),
            _ => None,
        };
        if let Some(token) = simple {
            self.advance();
            return Ok(token);
        }

        match ch {
            '<' => {
                self.advance();
                if self.eat('=') {
                    Ok(Token::Lte)
                } else if self.eat('>') {
                    Ok(Token::Neq)
                } else {
                    Ok(Token::Lt)
                }
            }
            '>' => {
                self.advance();
                if self.eat('=') {
                    Ok(Token::Gte)
                } else {
                    Ok(Token::Gt)
                }
            }
            '!' => {
                let start = self.position;
                self.advance();
                if self.eat('=') {
                    Ok(Token::Neq)
                } else if self.eat('~') {
                    if self.eat('*') {
                        Ok(Token::NotTildeStar)
                    } else {
                        Ok(Token::NotTilde)
                    }
                } else {
                    Err(Error::UnexpectedCharacter('!', start))
                }
            }
            '~' => {
                self.advance();
                if self.eat('*') {
                    Ok(Token::TildeStar)
                } else {
                    Ok(Token::Tilde)
                }
            }
            '|' => {
                self.advance();
                if self.eat('|') {
                    Ok(Token::Concat)
                } else {
                    Ok(Token::Pipe)
                }
            }
            ':' => {
                let start = self.position;
                self.advance();
                if self.eat(':') {
                    Ok(Token::DoubleColon)
                } else {
                    Err(Error::UnexpectedCharacter(':', start))
                }
            }
            '#' if self.peek_char() == Some('#') => self.read_placeholder(),
            '\'' => self.read_string().map(Token::StringLiteral),
            '"' => self.read_quoted_identifier(),
            'x' | 'X' if self.peek_char() == Some('\'') => self.read_blob(),
            _ if ch.is_ascii_digit() => self.read_number(),
            _ if ch.is_alphabetic() || ch == '_' => self.read_identifier(),
            _ => Err(Error::UnexpectedCharacter(ch, self.position)),
        }
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get the current character
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Peek at the next character
    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consume `expected` if it is the current character
    fn eat(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.current_char() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Skip SQL comments (-- and /* */)
    fn skip_comments(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() {
                return Ok(());
            }

            if self.current_char() == '-' && self.peek_char() == Some('-') {
                while !self.is_at_end() && self.current_char() != '\n' {
                    self.advance();
                }
            } else if self.current_char() == '/' && self.peek_char() == Some('*') {
                self.read_block_comment()?;
            } else {
                return Ok(());
            }
            self.skip_whitespace();
        }
    }

    /// Read a `/* */` comment, returning its inner text
    fn read_block_comment(&mut self) -> Result<String> {
        let start_pos = self.position;
        self.advance(); // skip /
        self.advance(); // skip *

        let mut text = String::new();
        while !self.is_at_end() {
            if self.current_char() == '*' && self.peek_char() == Some('/') {
                self.advance();
                self.advance();
                return Ok(text);
            }
            text.push(self.current_char());
            self.advance();
        }

        Err(Error::UnterminatedComment(start_pos))
    }

    /// Read `##spec` or `## /* keyword spec */`
    fn read_placeholder(&mut self) -> Result<Token> {
        let start_pos = self.position;
        self.advance();
        self.advance();

        let after_marks = self.position;
        self.skip_whitespace();
        if !self.is_at_end() && self.current_char() == '/' && self.peek_char() == Some('*') {
            let text = self.read_block_comment()?;
            return Ok(Token::LongPlaceholder(text));
        }
        self.position = after_marks;

        let mut spec = String::new();
        while !self.is_at_end() {
            let ch = self.current_char();
            if ch == '"' {
                // quoted field, kept verbatim for the spec parser
                let quoted_start = self.position;
                spec.push(ch);
                self.advance();
                loop {
                    if self.is_at_end() {
                        return Err(Error::UnterminatedString(quoted_start));
                    }
                    let c = self.current_char();
                    spec.push(c);
                    self.advance();
                    if c == '"' {
                        break;
                    }
                }
            } else if is_spec_char(ch) {
                spec.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if spec.is_empty() {
            return Err(Error::UnexpectedCharacter('#', start_pos));
        }
        Ok(Token::Placeholder(spec))
    }

    /// Read a string literal (single-quoted)
    fn read_string(&mut self) -> Result<String> {
        let start_pos = self.position;
        self.advance(); // skip opening quote

        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch == '\'' {
                // Check for escaped quote ''
                if self.peek_char() == Some('\'') {
                    value.push('\'');
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    return Ok(value);
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(Error::UnterminatedString(start_pos))
    }

    /// Read `X'0A1B'`
    fn read_blob(&mut self) -> Result<Token> {
        let start_pos = self.position;
        self.advance(); // skip X
        let hex = self.read_string()?;
        if hex.len() % 2 != 0 {
            return Err(Error::InvalidNumber(start_pos));
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| {
                hex.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or(Error::InvalidNumber(start_pos))
            })
            .collect::<Result<Vec<u8>>>()
            .map(Token::BlobLiteral)
    }

    /// Read a quoted identifier (double-quoted); the quotes are kept
    fn read_quoted_identifier(&mut self) -> Result<Token> {
        let start_pos = self.position;
        self.advance(); // skip opening quote

        let mut value = String::from("\"");

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch == '"' {
                if self.peek_char() == Some('"') {
                    value.push_str("\"\"");
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    value.push('"');
                    return Ok(Token::Identifier(value));
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(Error::UnterminatedString(start_pos))
    }

    /// Read a number (integer or float)
    fn read_number(&mut self) -> Result<Token> {
        let start_pos = self.position;
        let mut value = String::new();
        let mut is_float = false;

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.' && !is_float {
                // Check if it's a float or a dot operator
                match self.peek_char() {
                    Some(next) if next.is_ascii_digit() => {
                        is_float = true;
                        value.push(ch);
                        self.advance();
                    }
                    _ => break,
                }
            } else if (ch == 'e' || ch == 'E') && !value.is_empty() {
                // Scientific notation
                is_float = true;
                value.push(ch);
                self.advance();

                if !self.is_at_end() && (self.current_char() == '+' || self.current_char() == '-') {
                    value.push(self.current_char());
                    self.advance();
                }
            } else {
                break;
            }
        }

        if is_float {
            value
                .parse::<f64>()
                .map(Token::FloatLiteral)
                .map_err(|_| Error::InvalidNumber(start_pos))
        } else {
            value
                .parse::<i64>()
                .map(Token::IntegerLiteral)
                .map_err(|_| Error::InvalidNumber(start_pos))
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Result<Token> {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '#' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Check if it's a keyword
        if let Some(keyword) = Token::from_keyword(&value) {
            Ok(keyword)
        } else {
            Ok(Token::Identifier(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(sql: &str) -> Vec<Token> {
        Lexer::new(sql).tokenize().unwrap()
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            lex("SELECT * FROM users"),
            vec![
                Token::Select,
                Token::Asterisk,
                Token::From,
                Token::Identifier("users".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            lex("id = ##theid::int::null AND x > ##+2::gint"),
            vec![
                Token::Identifier("id".to_string()),
                Token::Eq,
                Token::Placeholder("theid::int::null".to_string()),
                Token::And,
                Token::Identifier("x".to_string()),
                Token::Gt,
                Token::Placeholder("+2::gint".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_placeholder_and_long_form() {
        let tokens = lex(r#"##"my id"::int, ## /* name:"p" type:int */)"#);
        assert_eq!(tokens[0], Token::Placeholder("\"my id\"::int".to_string()));
        assert_eq!(
            tokens[2],
            Token::LongPlaceholder(r#" name:"p" type:int "#.to_string())
        );
        assert_eq!(tokens[3], Token::RParen);
    }

    #[test]
    fn test_empty_placeholder_fails() {
        assert!(matches!(
            Lexer::new("a = ## + 1").tokenize(),
            Err(Error::UnexpectedCharacter('#', 4))
        ));
    }

    #[test]
    fn test_minus_is_an_operator() {
        assert_eq!(
            lex("-5"),
            vec![Token::Minus, Token::IntegerLiteral(5), Token::Eof]
        );
    }

    #[test]
    fn test_escaped_string() {
        let tokens = lex("SELECT 'it''s a test'");
        assert_eq!(tokens[1], Token::StringLiteral("it's a test".to_string()));
    }

    #[test]
    fn test_quoted_identifier_keeps_quotes() {
        let tokens = lex(r#"SELECT "Order Id" FROM t"#);
        assert_eq!(tokens[1], Token::Identifier("\"Order Id\"".to_string()));
    }

    #[test]
    fn test_operators() {
        let tokens = lex("a < b <= c <> d != e ~ f ~* g !~ h !~* i || j | k & l :: m");
        for expected in [
            Token::Lt,
            Token::Lte,
            Token::Tilde,
            Token::TildeStar,
            Token::NotTilde,
            Token::NotTildeStar,
            Token::Concat,
            Token::Pipe,
            Token::Ampersand,
            Token::DoubleColon,
        ] {
            assert!(tokens.contains(&expected), "missing {}", expected);
        }
        assert_eq!(tokens.iter().filter(|t| **t == Token::Neq).count(), 2);
    }

    #[test]
    fn test_numbers_and_blobs() {
        let tokens = lex("SELECT 3.14, 2.5e10, X'0aFF'");
        assert_eq!(tokens[1], Token::FloatLiteral(3.14));
        assert_eq!(tokens[3], Token::FloatLiteral(2.5e10));
        assert_eq!(tokens[5], Token::BlobLiteral(vec![0x0a, 0xff]));
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex("SELECT -- this is a comment\n* /* other */ FROM users"),
            vec![
                Token::Select,
                Token::Asterisk,
                Token::From,
                Token::Identifier("users".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_input() {
        assert!(matches!(
            Lexer::new("SELECT 'abc").tokenize(),
            Err(Error::UnterminatedString(7))
        ));
        assert!(matches!(
            Lexer::new("SELECT /* abc").tokenize(),
            Err(Error::UnterminatedComment(7))
        ));
    }
}
