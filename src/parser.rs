//! Reader for textual presence conditions.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr  := and ('||' and)*
//! and   := unary ('&&' unary)*
//! unary := '!' unary | '(' expr ')' | 'defined' '(' IDENT ')' | 'defined' IDENT
//!        | 'true' | 'false' | '1' | '0' | IDENT
//! ```
//!
//! Single `&` and `|` are accepted as synonyms.

use crate::condition::ConditionOracle;
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => name.clone(),
            Token::Not => "!".to_string(),
            Token::And => "&&".to_string(),
            Token::Or => "||".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '!' => Token::Not,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '&' | '|' => {
                // `&&` and `&` mean the same, likewise for `|`.
                if chars.peek().map(|&(_, next)| next) == Some(c) {
                    chars.next();
                }
                if c == '&' {
                    Token::And
                } else {
                    Token::Or
                }
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut end = offset + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        end = i + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Ident(input[offset..end].to_string())
            }
            found => return Err(ParseError::UnexpectedChar { found, offset }),
        };
        tokens.push((token, offset));
    }

    Ok(tokens)
}

struct Parser<'a, O: ConditionOracle> {
    oracle: &'a O,
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl<O: ConditionOracle> Parser<'_, O> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn bump(&mut self) -> Result<(Token, usize), ParseError> {
        let next = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(next)
    }

    fn expect_rparen(&mut self, opened_at: usize) -> Result<(), ParseError> {
        match self.bump() {
            Ok((Token::RParen, _)) => Ok(()),
            Ok((token, offset)) => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                offset,
            }),
            Err(_) => Err(ParseError::UnclosedParen(opened_at)),
        }
    }

    fn expr(&mut self) -> Result<O::Condition, ParseError> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            lhs = self.oracle.or(&lhs, &rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<O::Condition, ParseError> {
        let mut lhs = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = self.oracle.and(&lhs, &rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<O::Condition, ParseError> {
        let (token, offset) = self.bump()?;
        match token {
            Token::Not => {
                let inner = self.unary()?;
                Ok(self.oracle.not(&inner))
            }
            Token::LParen => {
                let inner = self.expr()?;
                self.expect_rparen(offset)?;
                Ok(inner)
            }
            Token::Ident(name) => match name.as_str() {
                "true" | "1" => Ok(self.oracle.base()),
                "false" | "0" => Ok(self.oracle.dead()),
                "defined" => self.defined(),
                _ => Ok(self.oracle.option(&name)),
            },
            token => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                offset,
            }),
        }
    }

    fn defined(&mut self) -> Result<O::Condition, ParseError> {
        let (token, offset) = self.bump()?;
        match token {
            Token::Ident(name) => Ok(self.oracle.option(&name)),
            Token::LParen => {
                let name = match self.bump()? {
                    (Token::Ident(name), _) => name,
                    (token, offset) => {
                        return Err(ParseError::UnexpectedToken {
                            found: token.describe(),
                            offset,
                        })
                    }
                };
                self.expect_rparen(offset)?;
                Ok(self.oracle.option(&name))
            }
            token => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                offset,
            }),
        }
    }
}

/// Parse `input` into a condition of `oracle`.
pub fn parse<O: ConditionOracle>(oracle: &O, input: &str) -> Result<O::Condition, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        oracle,
        tokens,
        pos: 0,
    };
    let result = parser.expr()?;
    if let Some((token, offset)) = parser.tokens.get(parser.pos) {
        return Err(ParseError::UnexpectedToken {
            found: token.describe(),
            offset: *offset,
        });
    }
    Ok(result)
}
