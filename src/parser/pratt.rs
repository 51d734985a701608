//! Pratt parser for FHIRPath expressions
//!
//! Precedence ladder (loosest to tightest): implies, or/xor, and,
//! in/contains, equality, inequality, union, is/as, additive,
//! multiplicative, unary, postfix (`.`, `[]`).

use super::error::{ParseError, ParseResult};
use super::tokenizer::{Spanned, Token, Tokenizer};
use crate::ast::{ArgList, BinaryOperator, ExpressionNode, LiteralValue, UnaryOperator};

/// Operator precedence levels (higher = tighter binding)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Implies = 1,
    Or = 2,
    And = 3,
    Membership = 4,
    Equality = 5,
    Inequality = 6,
    Union = 7,
    Type = 8,
    Additive = 9,
    Multiplicative = 10,
    Postfix = 12,
}

fn precedence(token: &Token) -> Option<Precedence> {
    match token {
        Token::Dot | Token::LeftBracket => Some(Precedence::Postfix),
        Token::Star | Token::Slash | Token::Div | Token::Mod => Some(Precedence::Multiplicative),
        Token::Plus | Token::Minus | Token::Ampersand => Some(Precedence::Additive),
        Token::Is | Token::As => Some(Precedence::Type),
        Token::Pipe => Some(Precedence::Union),
        Token::LessThan
        | Token::LessThanOrEqual
        | Token::GreaterThan
        | Token::GreaterThanOrEqual => Some(Precedence::Inequality),
        Token::Equal | Token::NotEqual | Token::Equivalent | Token::NotEquivalent => {
            Some(Precedence::Equality)
        }
        Token::In | Token::Contains => Some(Precedence::Membership),
        Token::And => Some(Precedence::And),
        Token::Or | Token::Xor => Some(Precedence::Or),
        Token::Implies => Some(Precedence::Implies),
        _ => None,
    }
}

fn binary_operator(token: &Token) -> Option<BinaryOperator> {
    match token {
        Token::Equal => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::Equivalent => Some(BinaryOperator::Equivalent),
        Token::NotEquivalent => Some(BinaryOperator::NotEquivalent),
        Token::LessThan => Some(BinaryOperator::LessThan),
        Token::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
        Token::GreaterThan => Some(BinaryOperator::GreaterThan),
        Token::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
        Token::Pipe => Some(BinaryOperator::Union),
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        Token::Star => Some(BinaryOperator::Multiply),
        Token::Slash => Some(BinaryOperator::Divide),
        Token::Div => Some(BinaryOperator::IntegerDivide),
        Token::Mod => Some(BinaryOperator::Modulo),
        Token::Ampersand => Some(BinaryOperator::Concatenate),
        Token::In => Some(BinaryOperator::In),
        Token::Contains => Some(BinaryOperator::Contains),
        Token::And => Some(BinaryOperator::And),
        Token::Or => Some(BinaryOperator::Or),
        Token::Xor => Some(BinaryOperator::Xor),
        Token::Implies => Some(BinaryOperator::Implies),
        _ => None,
    }
}

/// Calendar duration words usable as quantity units without quotes.
const CALENDAR_UNITS: &[&str] = &[
    "year",
    "years",
    "month",
    "months",
    "week",
    "weeks",
    "day",
    "days",
    "hour",
    "hours",
    "minute",
    "minutes",
    "second",
    "seconds",
    "millisecond",
    "milliseconds",
];

/// Recursive-descent/Pratt parser over a token stream
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    /// Tokenize `source` and build a parser over it.
    pub fn new(source: &str) -> ParseResult<Self> {
        Ok(Parser {
            tokens: Tokenizer::new(source).tokenize()?,
            pos: 0,
        })
    }

    /// Parse a complete expression; trailing tokens are an error.
    pub fn parse(mut self) -> ParseResult<ExpressionNode> {
        let expr = self.parse_expression(0)?;
        match self.peek() {
            None => Ok(expr),
            Some(spanned) => Err(self.unexpected(spanned)),
        }
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> ParseResult<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(spanned)
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        let spanned = self.advance()?;
        if &spanned.token == expected {
            Ok(())
        } else {
            Err(self.unexpected(&spanned))
        }
    }

    fn consume(&mut self, expected: &Token) -> bool {
        if let Some(spanned) = self.peek()
            && &spanned.token == expected
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn unexpected(&self, spanned: &Spanned) -> ParseError {
        ParseError::UnexpectedToken {
            token: format!("{:?}", spanned.token),
            position: spanned.position,
        }
    }

    fn parse_expression(&mut self, min_prec: u8) -> ParseResult<ExpressionNode> {
        let mut left = self.parse_unary()?;

        while let Some(spanned) = self.peek() {
            let Some(prec) = precedence(&spanned.token) else {
                break;
            };
            if (prec as u8) < min_prec {
                break;
            }

            match spanned.token {
                Token::Dot => {
                    self.pos += 1;
                    left = self.parse_invocation(left)?;
                }
                Token::LeftBracket => {
                    self.pos += 1;
                    let index = self.parse_expression(0)?;
                    self.expect(&Token::RightBracket)?;
                    left = ExpressionNode::Index {
                        base: Box::new(left),
                        index: Box::new(index),
                    };
                }
                Token::Is => {
                    self.pos += 1;
                    let type_name = self.parse_type_specifier()?;
                    left = ExpressionNode::TypeCheck {
                        expression: Box::new(left),
                        type_name,
                    };
                }
                Token::As => {
                    self.pos += 1;
                    let type_name = self.parse_type_specifier()?;
                    left = ExpressionNode::TypeCast {
                        expression: Box::new(left),
                        type_name,
                    };
                }
                _ => {
                    let op = binary_operator(&spanned.token)
                        .ok_or_else(|| self.unexpected(spanned))?;
                    self.pos += 1;
                    // implies is right associative, everything else left
                    let next_min = if op == BinaryOperator::Implies {
                        prec as u8
                    } else {
                        prec as u8 + 1
                    };
                    let right = self.parse_expression(next_min)?;
                    left = ExpressionNode::binary(op, left, right);
                }
            }
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<ExpressionNode> {
        if let Some(spanned) = self.peek() {
            let op = match spanned.token {
                Token::Plus => Some(UnaryOperator::Plus),
                Token::Minus => Some(UnaryOperator::Minus),
                _ => None,
            };
            if let Some(op) = op {
                self.pos += 1;
                // polarity binds looser than postfix navigation: -a.b is -(a.b)
                let operand = self.parse_expression(Precedence::Postfix as u8)?;
                return Ok(ExpressionNode::UnaryOp {
                    op,
                    operand: Box::new(operand),
                });
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<ExpressionNode> {
        let spanned = self.advance()?;
        match spanned.token {
            Token::True => Ok(ExpressionNode::Literal(LiteralValue::Boolean(true))),
            Token::False => Ok(ExpressionNode::Literal(LiteralValue::Boolean(false))),
            Token::StringLit(s) => Ok(ExpressionNode::Literal(LiteralValue::String(s))),
            Token::Integer(n) => self.parse_quantity_tail(LiteralValue::Integer(n)),
            Token::Decimal(d) => self.parse_quantity_tail(LiteralValue::Decimal(d)),
            Token::Date(text) => Ok(ExpressionNode::Literal(LiteralValue::Date(text))),
            Token::DateTime(text) => Ok(ExpressionNode::Literal(LiteralValue::DateTime(text))),
            Token::Time(text) => Ok(ExpressionNode::Literal(LiteralValue::Time(text))),
            Token::Variable(name) => Ok(ExpressionNode::Variable(name)),
            Token::This => Ok(ExpressionNode::This),
            Token::IndexVar => Ok(ExpressionNode::IndexVar),
            Token::TotalVar => Ok(ExpressionNode::TotalVar),
            Token::LeftBrace => {
                self.expect(&Token::RightBrace)?;
                Ok(ExpressionNode::Literal(LiteralValue::Null))
            }
            Token::LeftParen => {
                let inner = self.parse_expression(0)?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Token::Identifier(name) => {
                if self.consume(&Token::LeftParen) {
                    let args = self.parse_arguments()?;
                    Ok(ExpressionNode::function(name, args))
                } else {
                    Ok(ExpressionNode::Identifier(name))
                }
            }
            ref token => Err(ParseError::UnexpectedToken {
                token: format!("{token:?}"),
                position: spanned.position,
            }),
        }
    }

    /// A number followed directly by a quoted unit or a calendar word forms
    /// a quantity literal.
    fn parse_quantity_tail(&mut self, value: LiteralValue) -> ParseResult<ExpressionNode> {
        let unit = match self.peek() {
            Some(Spanned {
                token: Token::StringLit(unit),
                ..
            }) => Some(unit.clone()),
            Some(Spanned {
                token: Token::Identifier(word),
                ..
            }) if CALENDAR_UNITS.contains(&word.as_str()) => Some(word.clone()),
            _ => None,
        };

        if let Some(unit) = unit {
            self.pos += 1;
            let value = match value {
                LiteralValue::Integer(n) => rust_decimal::Decimal::from(n),
                LiteralValue::Decimal(d) => d,
                _ => unreachable!("quantity tail only follows numeric literals"),
            };
            Ok(ExpressionNode::Literal(LiteralValue::Quantity { value, unit }))
        } else {
            Ok(ExpressionNode::Literal(value))
        }
    }

    /// Invocation after a dot: plain member, or method call when followed by
    /// parentheses. Operator keywords become ordinary names here.
    fn parse_invocation(&mut self, base: ExpressionNode) -> ParseResult<ExpressionNode> {
        let spanned = self.advance()?;
        let name = spanned
            .token
            .as_identifier_name()
            .map(str::to_string)
            .ok_or_else(|| self.unexpected(&spanned))?;

        if self.consume(&Token::LeftParen) {
            let args = self.parse_arguments()?;
            Ok(ExpressionNode::method(base, name, args))
        } else {
            Ok(ExpressionNode::Path {
                base: Box::new(base),
                path: name,
            })
        }
    }

    fn parse_arguments(&mut self) -> ParseResult<ArgList> {
        let mut args = ArgList::new();
        if self.consume(&Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression(0)?);
            if self.consume(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RightParen)?;
            return Ok(args);
        }
    }

    /// Qualified type name after `is` / `as`: `Patient`, `System.Integer`.
    fn parse_type_specifier(&mut self) -> ParseResult<String> {
        let spanned = self.advance()?;
        let mut name = match spanned.token {
            Token::Identifier(part) => part,
            ref other => {
                return Err(ParseError::UnexpectedToken {
                    token: format!("{other:?}"),
                    position: spanned.position,
                });
            }
        };
        while self.consume(&Token::Dot) {
            let part = self.advance()?;
            match part.token {
                Token::Identifier(segment) => {
                    name.push('.');
                    name.push_str(&segment);
                }
                ref other => {
                    return Err(ParseError::UnexpectedToken {
                        token: format!("{other:?}"),
                        position: part.position,
                    });
                }
            }
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn parses_simple_path() {
        let ast = parse("Patient.birthDate").unwrap();
        assert_eq!(
            ast,
            ExpressionNode::Path {
                base: Box::new(ExpressionNode::Identifier("Patient".into())),
                path: "birthDate".into(),
            }
        );
    }

    #[test]
    fn parses_where_with_predicate() {
        let ast = parse("Patient.identifier.where(use = 'official')").unwrap();
        let ExpressionNode::MethodCall(call) = ast else {
            panic!("expected method call, got {ast:?}");
        };
        assert_eq!(call.name, "where");
        assert_eq!(call.args.len(), 1);
    }

    #[test]
    fn indexer_binds_tighter_than_comparison() {
        let ast = parse("name[0] = 'x'").unwrap();
        let ExpressionNode::BinaryOp(op) = ast else {
            panic!("expected binary op");
        };
        assert_eq!(op.op, BinaryOperator::Equal);
        assert!(matches!(op.left, ExpressionNode::Index { .. }));
    }

    #[test]
    fn keyword_after_dot_is_member_name() {
        let ast = parse("substance.contains('x')").unwrap();
        let ExpressionNode::MethodCall(call) = ast else {
            panic!("expected method call");
        };
        assert_eq!(call.name, "contains");
    }

    #[test]
    fn parses_union_of_paths() {
        let ast = parse("name.given | name.family").unwrap();
        let ExpressionNode::BinaryOp(op) = ast else {
            panic!("expected binary op");
        };
        assert_eq!(op.op, BinaryOperator::Union);
    }

    #[test]
    fn parses_quantity_literal() {
        let ast = parse("4 days").unwrap();
        assert!(matches!(
            ast,
            ExpressionNode::Literal(LiteralValue::Quantity { .. })
        ));
    }

    #[test]
    fn parses_type_check() {
        let ast = parse("value is Quantity").unwrap();
        assert!(matches!(ast, ExpressionNode::TypeCheck { .. }));
    }

    #[test]
    fn implies_is_right_associative() {
        let ast = parse("a implies b implies c").unwrap();
        let ExpressionNode::BinaryOp(outer) = ast else {
            panic!("expected binary op");
        };
        assert_eq!(outer.op, BinaryOperator::Implies);
        assert!(matches!(outer.left, ExpressionNode::Identifier(_)));
    }

    #[test]
    fn empty_collection_literal() {
        assert_eq!(parse("{}").unwrap(), ExpressionNode::Literal(LiteralValue::Null));
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(parse("a b").is_err());
    }
}
