//! Symbolic expression trees over numeric inputs.
//!
//! An [`Expression`] is either an input variable, a constant, or an
//! [`Operator`] applied to sub-expressions. Expressions are the `Tree`
//! candidates of an [`ExpressionDomain`](crate::domain::ExpressionDomain)
//! and can also derive computed columns of a
//! [`DataTable`](crate::data::DataTable).
//!
//! Partial operators (division by zero, log of a non-positive value,
//! square root of a negative value) return `NaN`, which objectives and
//! tables treat as a missing value.
//!
//! Trees convert to and from postfix token sequences, which is how
//! rollout search builds them one action at a time.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::domain::ExpressionDomain;
use crate::{Error, Result};

/// Numeric operator usable in an expression tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Log,
    Exp,
    Sqrt,
    Min,
    Max,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Neg,
        Self::Log,
        Self::Exp,
        Self::Sqrt,
        Self::Min,
        Self::Max,
    ];

    /// Number of arguments the operator takes.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Neg | Self::Log | Self::Exp | Self::Sqrt => 1,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Min | Self::Max => 2,
        }
    }

    /// Short display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Neg => "neg",
            Self::Log => "log",
            Self::Exp => "exp",
            Self::Sqrt => "sqrt",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Applies the operator. `args.len()` must equal [`arity`](Self::arity).
    #[must_use]
    pub fn apply(self, args: &[f64]) -> f64 {
        debug_assert_eq!(args.len(), self.arity());
        match self {
            Self::Add => args[0] + args[1],
            Self::Sub => args[0] - args[1],
            Self::Mul => args[0] * args[1],
            Self::Div => {
                if args[1] == 0.0 {
                    f64::NAN
                } else {
                    args[0] / args[1]
                }
            }
            Self::Neg => -args[0],
            Self::Log => {
                if args[0] > 0.0 {
                    args[0].ln()
                } else {
                    f64::NAN
                }
            }
            Self::Exp => args[0].exp(),
            Self::Sqrt => {
                if args[0] >= 0.0 {
                    args[0].sqrt()
                } else {
                    f64::NAN
                }
            }
            Self::Min => args[0].min(args[1]),
            Self::Max => args[0].max(args[1]),
        }
    }
}

/// Expression tree node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expression {
    /// The input variable with this index.
    Input(usize),
    /// A literal constant.
    Constant(f64),
    /// An operator applied to its arguments.
    Apply {
        /// The operator.
        operator: Operator,
        /// One sub-expression per operator argument.
        arguments: Vec<Expression>,
    },
}

/// One element of a postfix expression sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PostfixToken {
    /// Push an input variable.
    Input(usize),
    /// Push a constant.
    Constant(f64),
    /// Pop `arity` operands and push the operator applied to them.
    Apply(Operator),
}

impl Expression {
    /// Convenience constructor for an operator node.
    #[must_use]
    pub fn apply(operator: Operator, arguments: Vec<Expression>) -> Self {
        debug_assert_eq!(arguments.len(), operator.arity());
        Self::Apply {
            operator,
            arguments,
        }
    }

    /// Evaluates the tree. Inputs out of range evaluate to `NaN`.
    #[must_use]
    pub fn evaluate(&self, inputs: &[f64]) -> f64 {
        match self {
            Self::Input(i) => inputs.get(*i).copied().unwrap_or(f64::NAN),
            Self::Constant(c) => *c,
            Self::Apply {
                operator,
                arguments,
            } => {
                let values: Vec<f64> = arguments.iter().map(|a| a.evaluate(inputs)).collect();
                operator.apply(&values)
            }
        }
    }

    /// Depth of the tree; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Input(_) | Self::Constant(_) => 1,
            Self::Apply { arguments, .. } => {
                1 + arguments.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Input(_) | Self::Constant(_) => 1,
            Self::Apply { arguments, .. } => 1 + arguments.iter().map(Self::size).sum::<usize>(),
        }
    }

    /// Largest input index referenced, if any.
    #[must_use]
    pub fn max_input(&self) -> Option<usize> {
        match self {
            Self::Input(i) => Some(*i),
            Self::Constant(_) => None,
            Self::Apply { arguments, .. } => arguments.iter().filter_map(Self::max_input).max(),
        }
    }

    /// Flattens the tree into postfix order.
    #[must_use]
    pub fn to_postfix(&self) -> Vec<PostfixToken> {
        let mut tokens = Vec::with_capacity(self.size());
        self.append_postfix(&mut tokens);
        tokens
    }

    fn append_postfix(&self, tokens: &mut Vec<PostfixToken>) {
        match self {
            Self::Input(i) => tokens.push(PostfixToken::Input(*i)),
            Self::Constant(c) => tokens.push(PostfixToken::Constant(*c)),
            Self::Apply {
                operator,
                arguments,
            } => {
                for a in arguments {
                    a.append_postfix(tokens);
                }
                tokens.push(PostfixToken::Apply(*operator));
            }
        }
    }

    /// Rebuilds a tree from a postfix sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if an operator lacks operands or the
    /// sequence does not reduce to exactly one tree.
    pub fn from_postfix(tokens: &[PostfixToken]) -> Result<Self> {
        let mut stack = Vec::new();
        for token in tokens {
            push_postfix(&mut stack, *token)?;
        }
        if stack.len() != 1 {
            return Err(Error::InvalidConfig(format!(
                "postfix sequence reduces to {} trees",
                stack.len()
            )));
        }
        stack
            .pop()
            .ok_or(Error::Internal("postfix stack emptied unexpectedly"))
    }
}

/// Applies one postfix token to a stack of partial trees.
pub(crate) fn push_postfix(stack: &mut Vec<Expression>, token: PostfixToken) -> Result<()> {
    match token {
        PostfixToken::Input(i) => stack.push(Expression::Input(i)),
        PostfixToken::Constant(c) => stack.push(Expression::Constant(c)),
        PostfixToken::Apply(operator) => {
            let arity = operator.arity();
            if stack.len() < arity {
                return Err(Error::InvalidConfig(format!(
                    "operator '{}' needs {arity} operands, stack has {}",
                    operator.name(),
                    stack.len()
                )));
            }
            let arguments = stack.split_off(stack.len() - arity);
            stack.push(Expression::Apply {
                operator,
                arguments,
            });
        }
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(i) => write!(f, "x{i}"),
            Self::Constant(c) => write!(f, "{c}"),
            Self::Apply {
                operator,
                arguments,
            } => match (operator, arguments.as_slice()) {
                (Operator::Add | Operator::Sub | Operator::Mul | Operator::Div, [a, b]) => {
                    write!(f, "({a} {} {b})", operator.name())
                }
                (_, args) => {
                    write!(f, "{}(", operator.name())?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ")")
                }
            },
        }
    }
}

/// Random tree ("grow" method): below `max_depth` each node is a leaf with
/// probability `leaf_probability`, otherwise an operator; at `max_depth`
/// nodes are always leaves.
pub(crate) fn grow(
    ctx: &mut ExecutionContext,
    domain: &ExpressionDomain,
    max_depth: usize,
    leaf_probability: f64,
) -> Result<Expression> {
    let n_terminals = domain.n_inputs() + domain.constants().len();
    if n_terminals == 0 {
        return Err(Error::EmptyDomain);
    }
    if max_depth <= 1 || domain.operators().is_empty() || ctx.sample_bool(leaf_probability) {
        let t = ctx.sample_index(n_terminals)?;
        return Ok(if t < domain.n_inputs() {
            Expression::Input(t)
        } else {
            Expression::Constant(domain.constants()[t - domain.n_inputs()])
        });
    }
    let operator = domain.operators()[ctx.sample_index(domain.operators().len())?];
    let arguments = (0..operator.arity())
        .map(|_| grow(ctx, domain, max_depth - 1, leaf_probability))
        .collect::<Result<Vec<_>>>()?;
    Ok(Expression::Apply {
        operator,
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Expression {
        // (x0 + 2) * x1
        Expression::apply(
            Operator::Mul,
            vec![
                Expression::apply(
                    Operator::Add,
                    vec![Expression::Input(0), Expression::Constant(2.0)],
                ),
                Expression::Input(1),
            ],
        )
    }

    #[test]
    fn evaluate_and_shape() {
        let e = sample_tree();
        assert!((e.evaluate(&[1.0, 4.0]) - 12.0).abs() < 1e-12);
        assert_eq!(e.depth(), 3);
        assert_eq!(e.size(), 5);
        assert_eq!(e.max_input(), Some(1));
        assert_eq!(e.to_string(), "((x0 + 2) * x1)");
    }

    #[test]
    fn postfix_round_trip_preserves_tree() {
        let e = sample_tree();
        let tokens = e.to_postfix();
        assert_eq!(tokens.len(), 5);
        assert_eq!(Expression::from_postfix(&tokens).unwrap(), e);
    }

    #[test]
    fn postfix_rejects_malformed_sequences() {
        assert!(Expression::from_postfix(&[PostfixToken::Apply(Operator::Add)]).is_err());
        assert!(
            Expression::from_postfix(&[PostfixToken::Input(0), PostfixToken::Input(1)]).is_err()
        );
    }

    #[test]
    fn partial_operators_yield_nan() {
        assert!(Operator::Div.apply(&[1.0, 0.0]).is_nan());
        assert!(Operator::Log.apply(&[0.0]).is_nan());
        assert!(Operator::Sqrt.apply(&[-1.0]).is_nan());
        assert!(Expression::Input(3).evaluate(&[1.0]).is_nan());
    }

    #[test]
    fn grow_respects_max_depth() {
        let domain = ExpressionDomain::new(2, vec![Operator::Add, Operator::Neg], vec![1.0], 4);
        let mut ctx = ExecutionContext::with_seed(9);
        for _ in 0..200 {
            let e = grow(&mut ctx, &domain, 4, 0.3).unwrap();
            assert!(e.depth() <= 4);
            assert!(e.max_input().is_none_or(|i| i < 2));
        }
    }
}
