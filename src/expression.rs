//! Reduces the expression of an if-statement to a boolean.
//!
//! Expressions take one of these shapes:
//!
//! ```text
//! <value>                       truthiness of a literal
//! not <value>                   not supported
//! <value> <comparison> <value>  only `==` between integers, or an integer on
//!                               the left and a string holding an integer
//! ```
//!
//! Everything else fails with an [`EvalError`] rather than quietly
//! evaluating to `false`.

use crate::ast::{Node, Operator};
use crate::error::EvalError;

/// One side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand<'n> {
    Int(i64),
    String(&'n str),
    Identifier(&'n str),
}

impl<'n> Operand<'n> {
    fn from_node(node: &'n Node) -> Result<Self, EvalError> {
        match node {
            Node::Int(n) => Ok(Self::Int(n.value)),
            Node::String(n) => Ok(Self::String(&n.value)),
            Node::Identifier(n) => Ok(Self::Identifier(&n.name)),
            Node::Text(_) | Node::Comparison(_) | Node::Block(_) | Node::If(_) => {
                Err(EvalError::UnexpectedNode {
                    found: node.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{}", value),
            Self::String(value) => write!(f, "{:?}", value),
            Self::Identifier(name) => write!(f, "{}", name),
        }
    }
}

/// Evaluates `expression` to a boolean.
///
/// # Errors
/// Fails on empty expressions, on shapes and operators that are not
/// supported, and on string literals that cannot be read as the boolean or
/// integer the expression needs.
pub fn evaluate(expression: &[Node]) -> Result<bool, EvalError> {
    match expression {
        [] => Err(EvalError::EmptyExpression),
        [value] => truthy(value),
        [_, _] => Err(EvalError::NotSupported {
            what: "'not'".to_string(),
        }),
        [lhs, comparison, rhs] => compare(lhs, comparison, rhs),
        parts if parts.iter().any(is_connective) => Err(EvalError::NotSupported {
            what: "'and'/'or' combination".to_string(),
        }),
        parts => Err(EvalError::TooManyParts { count: parts.len() }),
    }
}

fn is_connective(node: &Node) -> bool {
    matches!(node, Node::Identifier(ident) if ident.name == "and" || ident.name == "or")
}

fn truthy(node: &Node) -> Result<bool, EvalError> {
    match Operand::from_node(node)? {
        Operand::Int(value) => Ok(value != 0),
        Operand::String("true") => Ok(true),
        Operand::String("false") => Ok(false),
        Operand::String(literal) => Err(EvalError::InvalidBool {
            literal: literal.to_string(),
        }),
        Operand::Identifier(_) => Err(unresolved_identifier()),
    }
}

fn compare(lhs: &Node, comparison: &Node, rhs: &Node) -> Result<bool, EvalError> {
    let Node::Comparison(comparison) = comparison else {
        return Err(EvalError::ExpectedComparison {
            found: comparison.to_string(),
        });
    };
    let lhs = Operand::from_node(lhs)?;
    let rhs = Operand::from_node(rhs)?;

    if matches!(lhs, Operand::Identifier(_)) || matches!(rhs, Operand::Identifier(_)) {
        return Err(unresolved_identifier());
    }

    let unsupported = || EvalError::UnsupportedComparison {
        operator: comparison.operator.to_string(),
        lhs: lhs.to_string(),
        rhs: rhs.to_string(),
    };

    if comparison.operator != Operator::Equal {
        return Err(unsupported());
    }

    match (lhs, rhs) {
        (Operand::Int(a), Operand::Int(b)) => Ok(a == b),
        (Operand::Int(a), Operand::String(s)) => Ok(parse_int(s)? == a),
        (Operand::String(_), Operand::Int(_) | Operand::String(_))
        | (Operand::Identifier(_), _)
        | (_, Operand::Identifier(_)) => Err(unsupported()),
    }
}

fn parse_int(literal: &str) -> Result<i64, EvalError> {
    literal.parse().map_err(|_| EvalError::InvalidInt {
        literal: literal.to_string(),
    })
}

fn unresolved_identifier() -> EvalError {
    EvalError::NotSupported {
        what: "identifier resolution".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Comparison, Identifier, IntValue, StringValue, TextValue};
    use crate::token::Pos;

    fn int(value: i64) -> Node {
        Node::Int(IntValue {
            start: Pos(0),
            value,
        })
    }

    fn string(value: &str) -> Node {
        Node::String(StringValue {
            start: Pos(0),
            value: value.to_string(),
        })
    }

    fn ident(name: &str) -> Node {
        Node::Identifier(Identifier {
            start: Pos(0),
            name: name.to_string(),
        })
    }

    fn op(symbol: &str) -> Node {
        Node::Comparison(Comparison {
            start: Pos(0),
            operator: Operator::parse(symbol).unwrap(),
        })
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_empty() {
        assert_eq!(evaluate(&[]), Err(EvalError::EmptyExpression));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_single_int() {
        assert_eq!(evaluate(&[int(0)]), Ok(false));
        assert_eq!(evaluate(&[int(1)]), Ok(true));
        assert_eq!(evaluate(&[int(-3)]), Ok(true));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_single_string() {
        assert_eq!(evaluate(&[string("true")]), Ok(true));
        assert_eq!(evaluate(&[string("false")]), Ok(false));
        assert_eq!(
            evaluate(&[string("True")]),
            Err(EvalError::InvalidBool {
                literal: "True".to_string()
            })
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_single_identifier_is_unsupported() {
        assert!(matches!(
            evaluate(&[ident("user")]),
            Err(EvalError::NotSupported { .. })
        ));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_single_text_is_unexpected() {
        let text = Node::Text(TextValue {
            start: Pos(0),
            text: "x".to_string(),
        });
        assert!(matches!(
            evaluate(&[text]),
            Err(EvalError::UnexpectedNode { .. })
        ));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_not_is_unsupported() {
        assert_eq!(
            evaluate(&[ident("not"), int(1)]),
            Err(EvalError::NotSupported {
                what: "'not'".to_string()
            })
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_int_equality() {
        assert_eq!(evaluate(&[int(3), op("=="), int(3)]), Ok(true));
        assert_eq!(evaluate(&[int(3), op("=="), int(4)]), Ok(false));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_int_string_equality() {
        assert_eq!(evaluate(&[int(1), op("=="), string("1")]), Ok(true));
        assert_eq!(evaluate(&[int(1), op("=="), string("2")]), Ok(false));
        assert_eq!(
            evaluate(&[int(1), op("=="), string("one")]),
            Err(EvalError::InvalidInt {
                literal: "one".to_string()
            })
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_string_on_the_left_is_unsupported() {
        assert_eq!(
            evaluate(&[string("7"), op("=="), int(7)]),
            Err(EvalError::UnsupportedComparison {
                operator: "==".to_string(),
                lhs: "\"7\"".to_string(),
                rhs: "7".to_string(),
            })
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_string_string_is_unsupported() {
        assert!(matches!(
            evaluate(&[string("a"), op("=="), string("a")]),
            Err(EvalError::UnsupportedComparison { .. })
        ));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_other_operators_are_unsupported() {
        for symbol in ["!=", ">", ">=", "<", "<="] {
            assert_eq!(
                evaluate(&[int(1), op(symbol), int(2)]),
                Err(EvalError::UnsupportedComparison {
                    operator: symbol.to_string(),
                    lhs: "1".to_string(),
                    rhs: "2".to_string(),
                }),
                "operator {symbol}"
            );
        }
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_identifier_operand_is_unsupported() {
        assert!(matches!(
            evaluate(&[ident("a"), op("=="), int(1)]),
            Err(EvalError::NotSupported { .. })
        ));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_middle_must_be_comparison() {
        assert!(matches!(
            evaluate(&[int(1), int(2), int(3)]),
            Err(EvalError::ExpectedComparison { .. })
        ));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_longer_expressions() {
        assert!(matches!(
            evaluate(&[int(1), op("=="), int(1), ident("and"), int(2)]),
            Err(EvalError::NotSupported { .. })
        ));
        assert_eq!(
            evaluate(&[int(1), int(2), int(3), int(4)]),
            Err(EvalError::TooManyParts { count: 4 })
        );
    }
}
