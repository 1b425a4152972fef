//! Pratt parser over the token stream produced by [`super::lexer`].

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{tokenize, Spanned, Token};
use super::{ParseError, Value};

const PREFIX_BINDING: u8 = 13;

/// Upper bound on both parser recursion and the height of the produced tree.
pub(crate) const MAX_DEPTH: usize = 256;

pub(crate) fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        source,
        tokens,
        position: 0,
        nesting: 0,
    };
    let node = parser.expression(0)?;
    match parser.tokens.get(parser.position) {
        None => Ok(node.expr),
        Some((_, span)) => Err(ParseError::UnexpectedToken {
            offset: span.start,
            found: source[span.clone()].to_string(),
        }),
    }
}

/// Subtree plus its height, so depth is checked as the tree is built.
struct Node {
    expr: Expr,
    height: usize,
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    position: usize,
    nesting: usize,
}

impl Parser<'_> {
    fn expression(&mut self, min_binding: u8) -> Result<Node, ParseError> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(self.too_deep());
        }

        let mut left = self.prefix()?;
        while let Some((op, left_binding, right_binding)) = self.peek_infix() {
            if left_binding < min_binding {
                break;
            }
            self.position += 1;
            let right = self.expression(right_binding)?;
            let height = left.height.max(right.height) + 1;
            left = self.node(
                Expr::Binary {
                    op,
                    left: Box::new(left.expr),
                    right: Box::new(right.expr),
                },
                height,
            )?;
        }

        self.nesting -= 1;
        Ok(left)
    }

    fn prefix(&mut self) -> Result<Node, ParseError> {
        let (token, span) = self.advance()?;
        match token {
            Token::Number(n) => self.leaf(Expr::Literal(Value::Number(n))),
            Token::Str(s) => self.leaf(Expr::Literal(Value::Str(s))),
            Token::True => self.leaf(Expr::Literal(Value::Bool(true))),
            Token::False => self.leaf(Expr::Literal(Value::Bool(false))),
            Token::Minus => self.unary(UnaryOp::Negate),
            Token::Plus => self.unary(UnaryOp::Plus),
            Token::Not => self.unary(UnaryOp::Not),
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect_close()?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.position += 1;
                    let args = self.arguments()?;
                    let height = args.iter().map(|arg| arg.height).max().unwrap_or(0) + 1;
                    let args = args.into_iter().map(|arg| arg.expr).collect();
                    self.node(
                        Expr::Call {
                            function: name,
                            args,
                        },
                        height,
                    )
                } else {
                    self.leaf(Expr::Variable(name))
                }
            }
            _ => Err(ParseError::UnexpectedToken {
                offset: span.start,
                found: self.source[span].to_string(),
            }),
        }
    }

    fn unary(&mut self, op: UnaryOp) -> Result<Node, ParseError> {
        let operand = self.expression(PREFIX_BINDING)?;
        self.node(
            Expr::Unary {
                op,
                operand: Box::new(operand.expr),
            },
            operand.height + 1,
        )
    }

    fn leaf(&self, expr: Expr) -> Result<Node, ParseError> {
        Ok(Node { expr, height: 1 })
    }

    fn node(&self, expr: Expr, height: usize) -> Result<Node, ParseError> {
        if height > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(Node { expr, height })
    }

    fn too_deep(&self) -> ParseError {
        let offset = self
            .tokens
            .get(self.position.saturating_sub(1))
            .map_or(self.source.len(), |(_, span)| span.start);
        ParseError::TooDeep { offset }
    }

    fn arguments(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.position += 1;
            return Ok(args);
        }

        loop {
            args.push(self.expression(0)?);
            let (token, span) = self.advance()?;
            match token {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        offset: span.start,
                        found: self.source[span].to_string(),
                    })
                }
            }
        }
    }

    fn expect_close(&mut self) -> Result<(), ParseError> {
        let (token, span) = self.advance()?;
        if token == Token::RParen {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                offset: span.start,
                found: self.source[span].to_string(),
            })
        }
    }

    /// Operator, left binding power, right binding power.
    fn peek_infix(&self) -> Option<(BinaryOp, u8, u8)> {
        let op = match self.peek()? {
            Token::Or => (BinaryOp::Or, 1, 2),
            Token::And => (BinaryOp::And, 3, 4),
            Token::EqEq => (BinaryOp::Eq, 5, 6),
            Token::NotEq => (BinaryOp::NotEq, 5, 6),
            Token::Lt => (BinaryOp::Lt, 7, 8),
            Token::LtEq => (BinaryOp::LtEq, 7, 8),
            Token::Gt => (BinaryOp::Gt, 7, 8),
            Token::GtEq => (BinaryOp::GtEq, 7, 8),
            Token::Plus => (BinaryOp::Add, 9, 10),
            Token::Minus => (BinaryOp::Sub, 9, 10),
            Token::Star => (BinaryOp::Mul, 11, 12),
            Token::Slash => (BinaryOp::Div, 11, 12),
            Token::Percent => (BinaryOp::Rem, 11, 12),
            // right associative and tighter than prefix operators
            Token::Caret => (BinaryOp::Pow, 16, 15),
            _ => return None,
        };
        Some(op)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Result<Spanned, ParseError> {
        let next = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd)?;
        self.position += 1;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Number(n)))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse("1 + 2 * 3").expect("parses");
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: num(1.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: num(2.0),
                    right: num(3.0),
                }),
            }
        );
    }

    #[test]
    fn exponent_is_right_associative_and_beats_negation() {
        let expr = parse("-2 ^ 3 ^ 2").expect("parses");
        assert_eq!(
            expr,
            Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: num(2.0),
                    right: Box::new(Expr::Binary {
                        op: BinaryOp::Pow,
                        left: num(3.0),
                        right: num(2.0),
                    }),
                }),
            }
        );
    }

    #[test]
    fn calls_collect_arguments() {
        let expr = parse("clamp(x, 0, 1)").expect("parses");
        match expr {
            Expr::Call { function, args } => {
                assert_eq!(function, "clamp");
                assert_eq!(args.len(), 3);
                assert_eq!(args[0], Expr::Variable("x".to_string()));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn comparison_without_left_operand_is_rejected() {
        match parse(">=95") {
            Err(ParseError::UnexpectedToken { offset, found }) => {
                assert_eq!(offset, 0);
                assert_eq!(found, ">=");
            }
            other => panic!("expected parse failure, got {other:?}"),
        }
    }

    #[test]
    fn trailing_tokens_and_truncated_input_are_errors() {
        assert!(matches!(
            parse("a b"),
            Err(ParseError::UnexpectedToken { offset: 2, .. })
        ));
        assert!(matches!(parse("(a + "), Err(ParseError::UnexpectedEnd)));
        assert!(matches!(parse("   "), Err(ParseError::Empty)));
    }

    #[test]
    fn nesting_limit_applies_to_parentheses_unary_chains_and_operator_chains() {
        let depth = MAX_DEPTH + 10;
        let parens = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        let negations = format!("{}1", "-".repeat(depth));
        let sums = vec!["1"; depth].join(" + ");
        let powers = vec!["2"; depth].join(" ^ ");

        for source in [parens, negations, sums, powers] {
            assert!(
                matches!(parse(&source), Err(ParseError::TooDeep { .. })),
                "{} chars accepted",
                source.len()
            );
        }
    }

    #[test]
    fn nesting_up_to_the_limit_still_parses() {
        let depth = MAX_DEPTH / 2;
        let parens = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse(&parens).expect("parses"), Expr::Variable("x".to_string()));
        assert!(parse(&vec!["1"; depth].join(" + ")).is_ok());
    }
}
