//! Re-applies the folding constructors bottom-up and simplifies `$let`:
//! bindings to constants and current-document paths are substituted into
//! the body, unused bindings are dropped and an empty `$let` is replaced by
//! its body.

use super::{free_variables, Pass};
use crate::ast::{
    visitor::{Visitor, Walk},
    ArrayFilter, Binary, Cond, Expression, FieldPath, Let, LetVariable, Map, Nary, Unary,
};

pub(crate) struct ConstantFolding;

impl Pass for ConstantFolding {
    fn apply(&self, expression: Expression) -> Expression {
        ConstantFoldingVisitor.visit_expression(expression)
    }
}

struct ConstantFoldingVisitor;

impl Visitor for ConstantFoldingVisitor {
    fn visit_expression(&mut self, node: Expression) -> Expression {
        match node.walk(self) {
            Expression::Nary(Nary { op, args }) => Expression::nary(op, args),
            Expression::Unary(Unary { op, arg }) => Expression::unary(op, *arg),
            Expression::Binary(Binary { op, left, right }) => {
                Expression::binary(op, *left, *right)
            }
            Expression::Cond(Cond {
                if_expr,
                then_expr,
                else_expr,
            }) => Expression::cond(*if_expr, *then_expr, *else_expr),
            Expression::Let(l) => self.fold_let(l),
            other => other,
        }
    }
}

impl ConstantFoldingVisitor {
    fn fold_let(&mut self, node: Let) -> Expression {
        let mut inside = *node.inside;
        let mut kept = vec![];
        for var in node.vars {
            if let Some(substituted) = substitute(&var, inside.clone()) {
                inside = substituted;
            } else {
                kept.push(var);
            }
        }
        let used = free_variables(&inside);
        kept.retain(|var| used.contains(&var.name));
        let folded = Expression::let_in(kept, inside);
        // substitution can expose new folding opportunities in the body
        match folded {
            Expression::Let(l) => Expression::Let(l),
            body => self.visit_expression(body),
        }
    }
}

/// Substitutes a binding into `inside` when its value is cheap to repeat
/// and doing so cannot change meaning. Returns `None` when the binding has
/// to stay.
fn substitute(var: &LetVariable, inside: Expression) -> Option<Expression> {
    let value = var.value.as_ref();
    let substitutable = match value {
        Expression::Constant(_) | Expression::Literal(_) => !has_path_under(&var.name, &inside),
        Expression::FieldPath(FieldPath { root: None, .. }) => true,
        _ => false,
    };
    if !substitutable {
        return None;
    }
    Some(
        Substitute {
            name: &var.name,
            value,
        }
        .visit_expression(inside),
    )
}

fn has_path_under(name: &str, expression: &Expression) -> bool {
    match expression {
        Expression::FieldPath(FieldPath {
            root: Some(root), ..
        }) => root == name,
        other => other
            .children()
            .into_iter()
            .any(|child| has_path_under(name, child)),
    }
}

/// Replaces free references to `name`, stopping at binders that shadow it.
struct Substitute<'a> {
    name: &'a str,
    value: &'a Expression,
}

impl Visitor for Substitute<'_> {
    fn visit_expression(&mut self, node: Expression) -> Expression {
        match node {
            Expression::Variable(v) if v == self.name => self.value.clone(),
            Expression::FieldPath(FieldPath {
                root: Some(root),
                segments,
            }) if root == self.name => match self.value {
                Expression::FieldPath(FieldPath { root, segments: base }) => {
                    Expression::FieldPath(FieldPath {
                        root: root.clone(),
                        segments: base.iter().cloned().chain(segments).collect(),
                    })
                }
                _ => Expression::FieldPath(FieldPath {
                    root: Some(root),
                    segments,
                }),
            },
            Expression::Let(l) if l.vars.iter().any(|v| v.name == self.name) => {
                Expression::Let(Let {
                    vars: l
                        .vars
                        .into_iter()
                        .map(|v| LetVariable {
                            name: v.name,
                            value: Box::new(self.visit_expression(*v.value)),
                        })
                        .collect(),
                    inside: l.inside,
                })
            }
            Expression::Map(m) if m.as_name == self.name => Expression::Map(Map {
                input: Box::new(self.visit_expression(*m.input)),
                ..m
            }),
            Expression::Filter(f) if f.as_name == self.name => {
                Expression::Filter(ArrayFilter {
                    input: Box::new(self.visit_expression(*f.input)),
                    limit: f.limit.map(|l| Box::new(self.visit_expression(*l))),
                    ..f
                })
            }
            other => other.walk(self),
        }
    }
}
