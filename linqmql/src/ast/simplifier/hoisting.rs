//! Binds repeated complex sub-expressions to `$let` variables so each is
//! computed once. Only sub-expressions without free local variables are
//! hoisted, and only when at least one occurrence is evaluated
//! unconditionally, so hoisting never evaluates something the original
//! expression would have skipped.

use super::{free_variables, Pass};
use crate::ast::{
    visitor::{Visitor, Walk},
    BinaryOperator, Expression, LetVariable, NaryOperator, ROOT,
};
use std::collections::BTreeSet;

const MAX_HOISTED: usize = 16;
const GLOBAL_VARIABLES: [&str; 3] = [ROOT, "CURRENT", "NOW"];

pub(crate) struct HoistCommonSubexpressions;

impl Pass for HoistCommonSubexpressions {
    fn apply(&self, expression: Expression) -> Expression {
        let mut current = expression;
        let mut used = all_variable_names(&current);
        let mut counter = 0;
        for _ in 0..MAX_HOISTED {
            let candidate = match find_candidate(&current) {
                Some(c) => c.clone(),
                None => break,
            };
            let name = loop {
                let name = format!("cse{counter}");
                counter += 1;
                if used.insert(name.clone()) {
                    break name;
                }
            };
            let replaced = Replace {
                target: &candidate,
                name: &name,
            }
            .visit_expression(current);
            current = Expression::let_in(
                vec![LetVariable {
                    name,
                    value: Box::new(candidate),
                }],
                replaced,
            );
        }
        current
    }
}

fn size(expression: &Expression) -> usize {
    1 + expression.children().into_iter().map(size).sum::<usize>()
}

fn depends_on_data(expression: &Expression) -> bool {
    matches!(expression, Expression::FieldPath(_) | Expression::Variable(_))
        || expression.children().into_iter().any(depends_on_data)
}

fn is_eligible(expression: &Expression) -> bool {
    !expression.is_simple()
        && size(expression) > 1
        && depends_on_data(expression)
        && free_variables(expression)
            .iter()
            .all(|v| GLOBAL_VARIABLES.contains(&v.as_str()))
}

/// Records every node with whether it is always evaluated when the whole
/// expression is.
fn collect<'a>(expression: &'a Expression, unconditional: bool, out: &mut Vec<(&'a Expression, bool)>) {
    out.push((expression, unconditional));
    match expression {
        Expression::Cond(c) => {
            collect(&c.if_expr, unconditional, out);
            collect(&c.then_expr, false, out);
            collect(&c.else_expr, false, out);
        }
        Expression::Nary(n) if matches!(n.op, NaryOperator::And | NaryOperator::Or) => {
            for (i, arg) in n.args.iter().enumerate() {
                collect(arg, unconditional && i == 0, out);
            }
        }
        Expression::Binary(b) if b.op == BinaryOperator::IfNull => {
            collect(&b.left, unconditional, out);
            collect(&b.right, false, out);
        }
        Expression::Map(m) => {
            collect(&m.input, unconditional, out);
            collect(&m.inside, false, out);
        }
        Expression::Filter(f) => {
            collect(&f.input, unconditional, out);
            collect(&f.cond, false, out);
            if let Some(limit) = &f.limit {
                collect(limit, unconditional, out);
            }
        }
        Expression::Reduce(r) => {
            collect(&r.input, unconditional, out);
            collect(&r.initial_value, unconditional, out);
            collect(&r.inside, false, out);
        }
        Expression::Switch(s) => {
            for (i, branch) in s.branches.iter().enumerate() {
                collect(&branch.case, unconditional && i == 0, out);
                collect(&branch.then, false, out);
            }
            if let Some(default) = &s.default {
                collect(default, false, out);
            }
        }
        other => {
            for child in other.children() {
                collect(child, unconditional, out);
            }
        }
    }
}

/// The largest eligible sub-expression that occurs at least twice with one
/// unconditional occurrence. Ties go to the first occurrence.
fn find_candidate(expression: &Expression) -> Option<&Expression> {
    let mut occurrences = vec![];
    collect(expression, true, &mut occurrences);

    let mut best: Option<(&Expression, usize)> = None;
    for (i, (candidate, _)) in occurrences.iter().enumerate() {
        if occurrences[..i].iter().any(|(seen, _)| seen == candidate) || !is_eligible(candidate) {
            continue;
        }
        let matching = occurrences.iter().filter(|(e, _)| e == candidate);
        let count = matching.clone().count();
        let unconditional = matching.clone().any(|(_, u)| *u);
        if count < 2 || !unconditional {
            continue;
        }
        let candidate_size = size(candidate);
        if best.map_or(true, |(_, s)| candidate_size > s) {
            best = Some((*candidate, candidate_size));
        }
    }
    best.map(|(e, _)| e)
}

fn all_variable_names(expression: &Expression) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    match expression {
        Expression::Variable(v) => {
            names.insert(v.clone());
        }
        Expression::FieldPath(p) => names.extend(p.root.clone()),
        Expression::Let(l) => names.extend(l.vars.iter().map(|v| v.name.clone())),
        Expression::Map(m) => {
            names.insert(m.as_name.clone());
        }
        Expression::Filter(f) => {
            names.insert(f.as_name.clone());
        }
        _ => {}
    }
    for child in expression.children() {
        names.extend(all_variable_names(child));
    }
    names
}

struct Replace<'a> {
    target: &'a Expression,
    name: &'a str,
}

impl Visitor for Replace<'_> {
    fn visit_expression(&mut self, node: Expression) -> Expression {
        if &node == self.target {
            Expression::var(self.name)
        } else {
            node.walk(self)
        }
    }
}
