//! Flattens nested applications of associative operators, so that
//! `$and: [{ $and: [a, b] }, c]` becomes `$and: [a, b, c]`. The rendered
//! output is the same either way; later passes have fewer shapes to match.

use super::Pass;
use crate::ast::{
    visitor::{Visitor, Walk},
    Expression, Nary,
};

pub(crate) struct FlattenVariadics;

impl Pass for FlattenVariadics {
    fn apply(&self, expression: Expression) -> Expression {
        FlattenVariadicsVisitor.visit_expression(expression)
    }
}

struct FlattenVariadicsVisitor;

impl Visitor for FlattenVariadicsVisitor {
    fn visit_expression(&mut self, node: Expression) -> Expression {
        match node.walk(self) {
            Expression::Nary(Nary { op, args }) => {
                let mut flattened = Vec::with_capacity(args.len());
                for arg in args {
                    match arg {
                        Expression::Nary(Nary {
                            op: inner,
                            args: inner_args,
                        }) if inner == op => flattened.extend(inner_args),
                        arg => flattened.push(arg),
                    }
                }
                Expression::Nary(Nary {
                    op,
                    args: flattened,
                })
            }
            other => other,
        }
    }
}
