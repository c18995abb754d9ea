// SPDX-License-Identifier: MIT

//! Infix to postfix conversion (shunting-yard)

use super::ast::Operator;
use super::token::Token;
use crate::calc::error::ParseError;

/// Reorder infix tokens into postfix order
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, ParseError> {
    let mut output: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) => output.push(*token),
            Token::Operator(op) => {
                while let Some(Token::Operator(top)) = stack.last() {
                    if !should_pop(*top, *op) {
                        break;
                    }
                    output.push(Token::Operator(*top));
                    stack.pop();
                }
                stack.push(*token);
            }
            Token::LeftParen => stack.push(*token),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(Token::LeftParen) => break,
                    Some(t) => output.push(t),
                    None => return Err(ParseError::UnbalancedParentheses),
                }
            },
        }
    }

    while let Some(token) = stack.pop() {
        if token == Token::LeftParen {
            return Err(ParseError::UnbalancedParentheses);
        }
        output.push(token);
    }

    Ok(output)
}

/// Whether `top` must leave the stack before `incoming` is pushed.
/// Equal precedence pops only for left-associative operators.
fn should_pop(top: Operator, incoming: Operator) -> bool {
    if incoming.is_right_associative() {
        top.precedence() > incoming.precedence()
    } else {
        top.precedence() >= incoming.precedence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::expression::token::tokenize;

    fn postfix(input: &str) -> String {
        let tokens = tokenize(input).unwrap();
        to_postfix(&tokens)
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_precedence() {
        assert_eq!(postfix("3 + 4 * 2"), "3 4 2 * +");
        assert_eq!(postfix("3 * 4 + 2"), "3 4 * 2 +");
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(postfix("8 - 3 - 2"), "8 3 - 2 -");
        assert_eq!(postfix("8 / 4 / 2"), "8 4 / 2 /");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(postfix("2 ^ 3 ^ 2"), "2 3 2 ^ ^");
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(postfix("( 1 + 2 ) * 3"), "1 2 + 3 *");
        assert_eq!(postfix("2 * (3 + (4 - 1))"), "2 3 4 1 - + *");
    }

    #[test]
    fn test_unbalanced_without_validation() {
        let tokens = vec![Token::Number(1.0), Token::RightParen];
        assert_eq!(to_postfix(&tokens), Err(ParseError::UnbalancedParentheses));

        let tokens = vec![Token::LeftParen, Token::Number(1.0)];
        assert_eq!(to_postfix(&tokens), Err(ParseError::UnbalancedParentheses));
    }
}
