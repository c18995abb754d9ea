// SPDX-License-Identifier: MIT

//! Tokenizer and token-sequence validation

use super::ast::Operator;
use crate::calc::error::ParseError;

/// A lexical unit of an arithmetic expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Operator(Operator),
    LeftParen,
    RightParen,
}

impl Token {
    fn is_operator(&self) -> bool {
        matches!(self, Token::Operator(_))
    }

    /// Can this token end an operand (`2`, `)`)
    fn ends_value(&self) -> bool {
        matches!(self, Token::Number(_) | Token::RightParen)
    }

    /// Can this token start an operand (`2`, `(`)
    fn starts_value(&self) -> bool {
        matches!(self, Token::Number(_) | Token::LeftParen)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Operator(op) => write!(f, "{}", op),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

/// Split expression text into tokens and validate the sequence.
///
/// Returns the first problem found; no partial token list is produced.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let tokens = scan(input)?;
    validate(&tokens)?;
    Ok(tokens)
}

fn scan(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().enumerate().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '0'..='9' | '.' => {
                let mut literal = String::from(c);
                while let Some((_, next)) =
                    chars.next_if(|(_, n)| n.is_ascii_digit() || *n == '.')
                {
                    literal.push(next);
                }
                // Digit runs too long for f64 parse to infinity
                let value = literal
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ParseError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            '(' => tokens.push(Token::LeftParen),
            ')' => tokens.push(Token::RightParen),
            c => match Operator::from_symbol(c) {
                Some(op) => tokens.push(Token::Operator(op)),
                None => return Err(ParseError::InvalidCharacter { ch: c, position }),
            },
        }
    }

    Ok(tokens)
}

fn validate(tokens: &[Token]) -> Result<(), ParseError> {
    let mut depth: usize = 0;
    for token in tokens {
        match token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ParseError::UnbalancedParentheses)?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::UnbalancedParentheses);
    }

    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return Err(ParseError::EmptyExpression);
    };

    for pair in tokens.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.is_operator() && next.is_operator() {
            return Err(ParseError::ConsecutiveOperators);
        }
        if prev.ends_value() && next.starts_value() {
            return Err(ParseError::ConsecutiveOperands);
        }
        if (prev.is_operator() && *next == Token::RightParen)
            || (*prev == Token::LeftParen && next.is_operator())
        {
            return Err(ParseError::DanglingOperator);
        }
    }

    if first.is_operator() || last.is_operator() {
        return Err(ParseError::DanglingOperator);
    }

    Ok(())
}
