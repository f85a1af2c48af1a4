use crate::{
    ast::{
        simplifier::{free_variables, simplify_expression, simplify_filter, simplify_pipeline},
        Binary, BinaryOperator, Cond, Expression, FieldPath, Filter, Let, LetVariable, Nary,
        NaryOperator, Pipeline, Stage,
    },
    options::TranslationOptions,
};
use linqmql_datastructures::unchecked_unique_linked_hash_map;

fn field(name: &str) -> Expression {
    Expression::field(&[name])
}

fn nary(op: NaryOperator, args: Vec<Expression>) -> Expression {
    Expression::Nary(Nary { op, args })
}

fn binding(name: &str, value: Expression) -> LetVariable {
    LetVariable {
        name: name.to_string(),
        value: Box::new(value),
    }
}

fn raw_let(vars: Vec<LetVariable>, inside: Expression) -> Expression {
    Expression::Let(Let {
        vars,
        inside: Box::new(inside),
    })
}

fn eq(left: Expression, right: Expression) -> Expression {
    Expression::Binary(Binary {
        op: BinaryOperator::Eq,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn without_hoisting() -> TranslationOptions {
    TranslationOptions {
        hoist_common_subexpressions: false,
        ..Default::default()
    }
}

macro_rules! test_simplify {
    ($func_name:ident, expected = $expected:expr, input = $input:expr, options = $options:expr,) => {
        #[test]
        fn $func_name() {
            #[allow(unused_imports)]
            use super::*;
            let expected: Expression = $expected;
            assert_eq!(expected, simplify_expression($input, &$options));
        }
    };
}

mod flatten_and_fold {
    test_simplify!(
        nested_conjunctions_flatten,
        expected = nary(NaryOperator::And, vec![field("a"), field("b"), field("c")]),
        input = nary(
            NaryOperator::And,
            vec![nary(NaryOperator::And, vec![field("a"), field("b")]), field("c")],
        ),
        options = without_hoisting(),
    );

    test_simplify!(
        constant_operands_fold,
        expected = Expression::constant(3),
        input = nary(NaryOperator::Add, vec![Expression::constant(1), Expression::constant(2)]),
        options = without_hoisting(),
    );

    test_simplify!(
        folding_reaches_nested_nodes,
        expected = eq(field("a"), Expression::constant(false)),
        input = eq(
            field("a"),
            nary(NaryOperator::And, vec![Expression::constant(true), Expression::constant(false)]),
        ),
        options = without_hoisting(),
    );

    test_simplify!(
        disabled_simplification_keeps_tree,
        expected = nary(NaryOperator::Add, vec![Expression::constant(1), Expression::constant(2)]),
        input = nary(NaryOperator::Add, vec![Expression::constant(1), Expression::constant(2)]),
        options = TranslationOptions {
            simplify: false,
            hoist_common_subexpressions: false,
            ..Default::default()
        },
    );
}

mod lets {
    test_simplify!(
        constant_binding_is_substituted,
        expected = eq(Expression::constant(5), field("a")),
        input = raw_let(vec![binding("x", Expression::constant(5))], eq(Expression::var("x"), field("a"))),
        options = without_hoisting(),
    );

    test_simplify!(
        substitution_enables_folding,
        expected = Expression::constant(7),
        input = raw_let(
            vec![binding("x", Expression::constant(5))],
            nary(NaryOperator::Add, vec![Expression::var("x"), Expression::constant(2)]),
        ),
        options = without_hoisting(),
    );

    test_simplify!(
        constant_used_as_path_root_is_kept,
        expected = raw_let(
            vec![binding("x", Expression::constant(5))],
            Expression::FieldPath(FieldPath {
                root: Some("x".to_string()),
                segments: vec!["a".to_string()],
            }),
        ),
        input = raw_let(
            vec![binding("x", Expression::constant(5))],
            Expression::FieldPath(FieldPath {
                root: Some("x".to_string()),
                segments: vec!["a".to_string()],
            }),
        ),
        options = without_hoisting(),
    );

    test_simplify!(
        field_binding_extends_paths,
        expected = Expression::field(&["a", "b"]),
        input = raw_let(
            vec![binding("x", field("a"))],
            Expression::FieldPath(FieldPath {
                root: Some("x".to_string()),
                segments: vec!["b".to_string()],
            }),
        ),
        options = without_hoisting(),
    );

    test_simplify!(
        unused_binding_is_dropped,
        expected = field("b"),
        input = raw_let(vec![binding("x", Expression::size(field("a")))], field("b")),
        options = without_hoisting(),
    );

    test_simplify!(
        used_complex_binding_is_kept,
        expected = raw_let(
            vec![binding("x", Expression::size(field("a")))],
            eq(Expression::var("x"), Expression::var("x")),
        ),
        input = raw_let(
            vec![binding("x", Expression::size(field("a")))],
            eq(Expression::var("x"), Expression::var("x")),
        ),
        options = without_hoisting(),
    );

    test_simplify!(
        shadowing_binder_stops_substitution,
        expected = Expression::map(field("tags"), "x", Expression::var("x")),
        input = raw_let(
            vec![binding("x", Expression::constant(1))],
            Expression::map(field("tags"), "x", Expression::var("x")),
        ),
        options = without_hoisting(),
    );
}

mod hoisting {
    test_simplify!(
        repeated_subexpression_is_bound_once,
        expected = raw_let(
            vec![binding("cse0", Expression::size(field("Tags")))],
            eq(
                Expression::var("cse0"),
                nary(NaryOperator::Add, vec![Expression::var("cse0"), Expression::constant(1)]),
            ),
        ),
        input = eq(
            Expression::size(field("Tags")),
            nary(NaryOperator::Add, vec![Expression::size(field("Tags")), Expression::constant(1)]),
        ),
        options = TranslationOptions::default(),
    );

    test_simplify!(
        conditionally_evaluated_duplicates_stay,
        expected = Expression::Cond(Cond {
            if_expr: Box::new(field("a")),
            then_expr: Box::new(Expression::size(field("Tags"))),
            else_expr: Box::new(Expression::size(field("Tags"))),
        }),
        input = Expression::cond(
            field("a"),
            Expression::size(field("Tags")),
            Expression::size(field("Tags")),
        ),
        options = TranslationOptions::default(),
    );

    test_simplify!(
        expressions_over_local_variables_stay,
        expected = Expression::map(
            field("Tags"),
            "t",
            eq(Expression::str_len_cp(Expression::var("t")), Expression::str_len_cp(Expression::var("t"))),
        ),
        input = Expression::map(
            field("Tags"),
            "t",
            eq(Expression::str_len_cp(Expression::var("t")), Expression::str_len_cp(Expression::var("t"))),
        ),
        options = TranslationOptions::default(),
    );

    test_simplify!(
        generated_names_avoid_existing_variables,
        expected = raw_let(
            vec![binding("cse1", Expression::size(field("Tags")))],
            eq(
                Expression::var("cse1"),
                nary(NaryOperator::Add, vec![Expression::var("cse1"), Expression::var("cse0")]),
            ),
        ),
        input = eq(
            Expression::size(field("Tags")),
            nary(NaryOperator::Add, vec![Expression::size(field("Tags")), Expression::var("cse0")]),
        ),
        options = TranslationOptions::default(),
    );
}

#[test]
fn filters_simplify_embedded_expressions() {
    let filter = Filter::Expr(nary(
        NaryOperator::And,
        vec![
            nary(NaryOperator::And, vec![field("a"), field("b")]),
            Expression::constant(true),
        ],
    ));
    assert_eq!(
        Filter::Expr(nary(NaryOperator::And, vec![field("a"), field("b")])),
        simplify_filter(filter, &TranslationOptions::default())
    );
}

#[test]
fn pipelines_simplify_stage_expressions() {
    let pipeline = Pipeline {
        stages: vec![
            Stage::Project(unchecked_unique_linked_hash_map! {
                "n".to_string() => nary(NaryOperator::Add, vec![Expression::constant(1), Expression::constant(2)]),
            }),
            Stage::Limit(1),
        ],
    };
    assert_eq!(
        Pipeline {
            stages: vec![
                Stage::Project(unchecked_unique_linked_hash_map! {
                    "n".to_string() => Expression::constant(3),
                }),
                Stage::Limit(1),
            ],
        },
        simplify_pipeline(pipeline, &TranslationOptions::default())
    );
}

#[test]
fn let_and_map_bind_their_names() {
    let expression = raw_let(
        vec![binding("x", Expression::var("outer"))],
        Expression::map(
            Expression::var("x"),
            "t",
            nary(NaryOperator::Add, vec![Expression::var("t"), Expression::var("free")]),
        ),
    );
    assert_eq!(
        vec!["free".to_string(), "outer".to_string()],
        free_variables(&expression).into_iter().collect::<Vec<_>>()
    );
}
