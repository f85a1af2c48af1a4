use crate::{
    ast::{visitor::Visitor, Expression, Filter, Pipeline},
    options::TranslationOptions,
};
use std::collections::BTreeSet;

mod constant_folding;
mod flatten_variadics;
mod hoisting;

#[cfg(test)]
mod test;

pub(crate) trait Pass {
    fn apply(&self, expression: Expression) -> Expression;
}

/// Passes in the order they must run. Hoisting runs last so it sees the
/// folded tree.
fn passes(options: &TranslationOptions) -> Vec<Box<dyn Pass>> {
    let mut passes: Vec<Box<dyn Pass>> = vec![];
    if options.simplify {
        passes.push(Box::new(flatten_variadics::FlattenVariadics));
        passes.push(Box::new(constant_folding::ConstantFolding));
    }
    if options.hoist_common_subexpressions {
        passes.push(Box::new(hoisting::HoistCommonSubexpressions));
    }
    passes
}

pub fn simplify_expression(expression: Expression, options: &TranslationOptions) -> Expression {
    passes(options)
        .iter()
        .fold(expression, |acc, pass| pass.apply(acc))
}

pub fn simplify_filter(filter: Filter, options: &TranslationOptions) -> Filter {
    passes(options).iter().fold(filter, |acc, pass| {
        TopLevelExpressions {
            pass: pass.as_ref(),
        }
        .visit_filter(acc)
    })
}

pub fn simplify_pipeline(pipeline: Pipeline, options: &TranslationOptions) -> Pipeline {
    passes(options).iter().fold(pipeline, |acc, pass| {
        TopLevelExpressions {
            pass: pass.as_ref(),
        }
        .visit_pipeline(acc)
    })
}

/// Applies a pass to each expression embedded in a filter or stage. The
/// passes recurse on their own, so this visitor does not descend into the
/// expressions it hands over.
struct TopLevelExpressions<'a> {
    pass: &'a dyn Pass,
}

impl Visitor for TopLevelExpressions<'_> {
    fn visit_expression(&mut self, node: Expression) -> Expression {
        self.pass.apply(node)
    }
}

/// Variables that appear free in an expression. `$reduce` binds `this`
/// and `value`; `$let`, `$map` and `$filter` bind their declared names.
pub(crate) fn free_variables(expression: &Expression) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    match expression {
        Expression::Variable(name) => {
            out.insert(name.clone());
        }
        Expression::FieldPath(path) => out.extend(path.root.clone()),
        Expression::Let(l) => {
            let mut inside = free_variables(&l.inside);
            for var in l.vars.iter() {
                inside.remove(&var.name);
                out.extend(free_variables(&var.value));
            }
            out.extend(inside);
        }
        Expression::Map(m) => {
            out.extend(free_variables(&m.input));
            let mut inside = free_variables(&m.inside);
            inside.remove(&m.as_name);
            out.extend(inside);
        }
        Expression::Filter(f) => {
            out.extend(free_variables(&f.input));
            if let Some(limit) = &f.limit {
                out.extend(free_variables(limit));
            }
            let mut cond = free_variables(&f.cond);
            cond.remove(&f.as_name);
            out.extend(cond);
        }
        Expression::Reduce(r) => {
            out.extend(free_variables(&r.input));
            out.extend(free_variables(&r.initial_value));
            let mut inside = free_variables(&r.inside);
            inside.remove("this");
            inside.remove("value");
            out.extend(inside);
        }
        other => {
            for child in other.children() {
                out.extend(free_variables(child));
            }
        }
    }
    out
}
