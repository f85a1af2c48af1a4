macro_rules! test_constructor {
    ($func_name:ident, expected = $expected:expr, input = $input:expr,) => {
        #[test]
        fn $func_name() {
            #[allow(unused_imports)]
            use crate::ast::*;
            #[allow(unused_imports)]
            use bson::Bson;
            let expected: Expression = $expected;
            assert_eq!(expected, $input);
        }
    };
}

fn field(name: &str) -> super::Expression {
    super::Expression::field(&[name])
}

mod constants {
    use super::field;

    test_constructor!(
        dollar_string_becomes_literal,
        expected = Expression::Literal(Bson::String("$a".to_string())),
        input = Expression::constant("$a"),
    );

    test_constructor!(
        array_holding_dollar_string_becomes_literal,
        expected = Expression::Literal(Bson::Array(vec![Bson::String("$a".to_string())])),
        input = Expression::constant(vec![Bson::String("$a".to_string())]),
    );

    test_constructor!(
        plain_string_stays_constant,
        expected = Expression::Constant(Bson::String("a".to_string())),
        input = Expression::constant("a"),
    );

    #[test]
    fn literal_is_still_a_constant() {
        use crate::ast::Expression;
        assert_eq!(Some("$a"), Expression::constant("$a").as_str());
        assert_eq!(None, field("a").as_constant());
    }
}

mod arithmetic {
    use super::field;

    test_constructor!(
        integer_sum_folds,
        expected = Expression::constant(6),
        input = Expression::add(vec![
            Expression::constant(1),
            Expression::constant(2),
            Expression::constant(3),
        ]),
    );

    test_constructor!(
        zero_operands_are_dropped,
        expected = field("a"),
        input = Expression::add(vec![Expression::constant(0), field("a")]),
    );

    test_constructor!(
        nested_additions_flatten,
        expected = Expression::Nary(Nary {
            op: NaryOperator::Add,
            args: vec![field("a"), field("b"), field("c")],
        }),
        input = Expression::add(vec![
            Expression::add(vec![field("a"), field("b")]),
            field("c"),
        ]),
    );

    test_constructor!(
        overflowing_sum_is_not_folded,
        expected = Expression::Nary(Nary {
            op: NaryOperator::Add,
            args: vec![Expression::constant(i32::MAX), Expression::constant(1)],
        }),
        input = Expression::add(vec![Expression::constant(i32::MAX), Expression::constant(1)]),
    );

    test_constructor!(
        integer_difference_folds,
        expected = Expression::constant(3),
        input = Expression::subtract(Expression::constant(5), Expression::constant(2)),
    );

    test_constructor!(
        subtracting_zero_is_identity,
        expected = field("a"),
        input = Expression::subtract(field("a"), Expression::constant(0)),
    );
}

mod logical {
    use super::field;

    test_constructor!(
        and_drops_true_operands,
        expected = field("a"),
        input = Expression::and(vec![Expression::constant(true), field("a")]),
    );

    test_constructor!(
        and_with_false_is_false,
        expected = Expression::constant(false),
        input = Expression::and(vec![field("a"), Expression::constant(false)]),
    );

    test_constructor!(
        or_with_true_is_true,
        expected = Expression::constant(true),
        input = Expression::or(vec![field("a"), Expression::constant(true)]),
    );

    test_constructor!(
        empty_or_is_false,
        expected = Expression::constant(false),
        input = Expression::or(vec![]),
    );

    test_constructor!(
        not_of_constant_folds,
        expected = Expression::constant(false),
        input = Expression::not(Expression::constant(true)),
    );

    test_constructor!(
        cond_with_constant_test_picks_branch,
        expected = field("b"),
        input = Expression::cond(Expression::constant(false), field("a"), field("b")),
    );
}

mod strings {
    use super::field;

    test_constructor!(
        adjacent_constants_merge,
        expected = Expression::Nary(Nary {
            op: NaryOperator::Concat,
            args: vec![Expression::constant("ab"), field("c")],
        }),
        input = Expression::concat(vec![
            Expression::constant("a"),
            Expression::constant("b"),
            field("c"),
        ]),
    );

    test_constructor!(
        empty_strings_are_dropped,
        expected = Expression::constant("x"),
        input = Expression::concat(vec![Expression::constant(""), Expression::constant("x")]),
    );

    test_constructor!(
        single_field_concat_is_kept,
        expected = Expression::Nary(Nary {
            op: NaryOperator::Concat,
            args: vec![field("a")],
        }),
        input = Expression::concat(vec![field("a")]),
    );

    test_constructor!(
        string_length_folds_by_code_points,
        expected = Expression::constant(3),
        input = Expression::str_len_cp(Expression::constant("héé")),
    );

    test_constructor!(
        case_conversion_folds,
        expected = Expression::constant("abc"),
        input = Expression::to_lower(Expression::constant("AbC")),
    );

    test_constructor!(
        case_conversion_folds_ascii_letters_only,
        expected = Expression::constant("ÉCOLE éTé"),
        input = Expression::unary(UnaryOperator::ToUpper, Expression::constant("École été")),
    );
}

mod paths {
    use super::field;

    test_constructor!(
        field_access_on_root_starts_path,
        expected = field("a"),
        input = Expression::try_field_access(Expression::root(), "a").unwrap(),
    );

    test_constructor!(
        field_access_on_variable_roots_path,
        expected = Expression::FieldPath(FieldPath {
            root: Some("x".to_string()),
            segments: vec!["a".to_string()],
        }),
        input = Expression::try_field_access(Expression::var("x"), "a").unwrap(),
    );

    test_constructor!(
        field_access_extends_path,
        expected = Expression::field(&["a", "b"]),
        input = Expression::try_field_access(field("a"), "b").unwrap(),
    );

    #[test]
    fn computed_target_cannot_be_accessed() {
        use crate::ast::Expression;
        assert_eq!(
            None,
            Expression::try_field_access(Expression::size(field("a")), "b")
        );
    }

    #[test]
    fn complex_expression_is_bound_to_variable() {
        use crate::ast::{Expression, LetVariable};
        let complex = Expression::size(field("a"));
        assert_eq!(
            (
                Expression::var("v"),
                Some(LetVariable {
                    name: "v".to_string(),
                    value: Box::new(complex.clone()),
                })
            ),
            Expression::use_var_if_not_simple("v", complex)
        );
        assert_eq!(
            (field("a"), None),
            Expression::use_var_if_not_simple("v", field("a"))
        );
    }

    test_constructor!(
        let_without_bindings_is_its_body,
        expected = field("a"),
        input = Expression::let_in(vec![], field("a")),
    );
}
