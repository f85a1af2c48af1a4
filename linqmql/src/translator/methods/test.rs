use crate::expression::{builder::*, *};

fn enumerable(name: &str, arguments: Vec<Expression>, return_type: HostType) -> Expression {
    call_static(DeclaringType::Enumerable, name, arguments, return_type)
}

fn tags(p: &ParameterExpression) -> Expression {
    member(param(p), "Tags", HostType::list(HostType::String))
}

fn scores(p: &ParameterExpression) -> Expression {
    member(param(p), "Scores", HostType::array(HostType::Int32))
}

fn addresses(p: &ParameterExpression) -> Expression {
    member(param(p), "Addresses", HostType::list(HostType::class("Address")))
}

fn name(p: &ParameterExpression) -> Expression {
    member(param(p), "Name", HostType::String)
}

fn string_method(p: &ParameterExpression, method: &str, arguments: Vec<Expression>, return_type: HostType) -> Expression {
    call_instance(name(p), DeclaringType::String, method, arguments, return_type)
}

macro_rules! test_translate_method {
    ($func_name:ident, expected = $expected:expr, input = $input:expr) => {
        #[test]
        fn $func_name() {
            #[allow(unused_imports)]
            use super::*;
            #[allow(unused_imports)]
            use crate::{
                expression::{builder::*, *},
                options::{ServerVersion, TranslationOptions},
                result,
                translator::{test::*, Error},
            };
            #[allow(unused_imports)]
            use bson::{bson, Bson};
            let p = parameter("p", person_type());
            let input: Expression = $input(&p);
            assert_eq!($expected, translate(&p, &input));
        }
    };
    ($func_name:ident, expected = $expected:expr, options = $options:expr, input = $input:expr) => {
        #[test]
        fn $func_name() {
            #[allow(unused_imports)]
            use super::*;
            #[allow(unused_imports)]
            use crate::{
                expression::{builder::*, *},
                options::{ServerVersion, TranslationOptions},
                result,
                translator::{test::*, Error},
            };
            #[allow(unused_imports)]
            use bson::{bson, Bson};
            let p = parameter("p", person_type());
            let input: Expression = $input(&p);
            assert_eq!($expected, translate_with($options, &p, &input));
        }
    };
}

mod select_where {
    test_translate_method!(
        select_maps_items,
        expected = Ok(bson!({ "$map": {
            "input": "$Tags",
            "as": "t",
            "in": { "$strLenCP": "$$t" },
        } })),
        input = |p| {
            let t = parameter("t", HostType::String);
            enumerable(
                "Select",
                vec![tags(p), lambda(vec![t.clone()], member(param(&t), "Length", HostType::Int32))],
                HostType::enumerable(HostType::Int32),
            )
        }
    );

    test_translate_method!(
        nested_lambdas_reusing_a_name_get_distinct_variables,
        expected = Ok(bson!({ "$map": {
            "input": "$Addresses",
            "as": "x",
            "in": {
                "lengths": { "$map": {
                    "input": "$Tags",
                    "as": "x1",
                    "in": { "$strLenCP": "$$x1" },
                } },
                "city": "$$x.City",
            },
        } })),
        input = |p| {
            let outer = parameter("x", HostType::class("Address"));
            let inner = parameter("x", HostType::String);
            let lengths = enumerable(
                "Select",
                vec![
                    tags(p),
                    lambda(vec![inner.clone()], member(param(&inner), "Length", HostType::Int32)),
                ],
                HostType::enumerable(HostType::Int32),
            );
            let body = new_anonymous(vec![
                ("lengths", lengths),
                ("city", member(param(&outer), "City", HostType::String)),
            ]);
            let result_type = body.ty();
            enumerable(
                "Select",
                vec![addresses(p), lambda(vec![outer.clone()], body)],
                HostType::enumerable(result_type),
            )
        }
    );

    test_translate_method!(
        where_filters_items,
        expected = Ok(bson!({ "$filter": {
            "input": "$Scores",
            "as": "s",
            "cond": { "$gt": ["$$s", 0] },
        } })),
        input = |p| {
            let s = parameter("s", HostType::Int32);
            enumerable(
                "Where",
                vec![
                    scores(p),
                    lambda(
                        vec![s.clone()],
                        compare(BinaryOperator::GreaterThan, param(&s), int(0)),
                    ),
                ],
                HostType::enumerable(HostType::Int32),
            )
        }
    );

    test_translate_method!(
        where_with_index_zips_positions,
        expected = Ok(bson!({ "$map": {
            "input": { "$filter": {
                "input": { "$zip": { "inputs": [
                    "$Scores",
                    { "$range": [0, { "$size": "$Scores" }] },
                ] } },
                "as": "pair",
                "cond": { "$lt": [{ "$arrayElemAt": ["$$pair", 1] }, 2] },
            } },
            "as": "pair",
            "in": { "$arrayElemAt": ["$$pair", 0] },
        } })),
        input = |p| {
            let s = parameter("s", HostType::Int32);
            let i = parameter("i", HostType::Int32);
            enumerable(
                "Where",
                vec![
                    scores(p),
                    lambda(
                        vec![s.clone(), i.clone()],
                        compare(BinaryOperator::LessThan, param(&i), int(2)),
                    ),
                ],
                HostType::enumerable(HostType::Int32),
            )
        }
    );

    test_translate_method!(
        select_many_concatenates_arrays,
        expected = Ok(bson!({ "$reduce": {
            "input": { "$map": { "input": "$Addresses", "as": "a", "in": "$Tags" } },
            "initialValue": [],
            "in": { "$concatArrays": ["$$value", "$$this"] },
        } })),
        input = |p| {
            let a = parameter("a", HostType::class("Address"));
            enumerable(
                "SelectMany",
                vec![addresses(p), lambda(vec![a.clone()], tags(p))],
                HostType::enumerable(HostType::String),
            )
        }
    );
}

mod skip_take {
    test_translate_method!(
        take_after_skip_is_one_slice,
        expected = Ok(bson!({ "$slice": ["$Scores", 2, 3] })),
        input = |p| enumerable(
            "Take",
            vec![
                enumerable("Skip", vec![scores(p), int(2)], HostType::enumerable(HostType::Int32)),
                int(3),
            ],
            HostType::enumerable(HostType::Int32),
        )
    );

    test_translate_method!(
        take_alone_has_count_only,
        expected = Ok(bson!({ "$slice": ["$Scores", 3] })),
        input = |p| enumerable("Take", vec![scores(p), int(3)], HostType::enumerable(HostType::Int32))
    );

    test_translate_method!(
        skip_takes_the_rest,
        expected = Ok(bson!({ "$slice": ["$Scores", 2, 2147483647] })),
        input = |p| enumerable("Skip", vec![scores(p), int(2)], HostType::enumerable(HostType::Int32))
    );

    test_translate_method!(
        take_negative_is_empty,
        expected = Ok(bson!([])),
        input = |p| enumerable("Take", vec![scores(p), int(-1)], HostType::enumerable(HostType::Int32))
    );

    test_translate_method!(
        take_zero_is_empty,
        expected = Ok(bson!([])),
        input = |p| enumerable("Take", vec![scores(p), int(0)], HostType::enumerable(HostType::Int32))
    );

    test_translate_method!(
        skip_zero_is_the_source,
        expected = Ok(bson!("$Scores")),
        input = |p| enumerable("Skip", vec![scores(p), int(0)], HostType::enumerable(HostType::Int32))
    );

    test_translate_method!(
        take_after_negative_skip_takes_from_start,
        expected = Ok(bson!({ "$slice": ["$Scores", 3] })),
        input = |p| enumerable(
            "Take",
            vec![
                enumerable("Skip", vec![scores(p), int(-2)], HostType::enumerable(HostType::Int32)),
                int(3),
            ],
            HostType::enumerable(HostType::Int32),
        )
    );

    test_translate_method!(
        take_zero_after_skip_is_empty,
        expected = Ok(bson!([])),
        input = |p| enumerable(
            "Take",
            vec![
                enumerable("Skip", vec![scores(p), int(2)], HostType::enumerable(HostType::Int32)),
                int(0),
            ],
            HostType::enumerable(HostType::Int32),
        )
    );

    test_translate_method!(
        computed_take_is_clamped_at_zero,
        expected = Ok(bson!({ "$slice": ["$Scores", { "$max": [0, "$Age"] }] })),
        input = |p| enumerable(
            "Take",
            vec![scores(p), member(param(p), "Age", HostType::Int32)],
            HostType::enumerable(HostType::Int32),
        )
    );

    test_translate_method!(
        computed_skip_is_clamped_at_zero,
        expected = Ok(bson!({ "$slice": ["$Scores", { "$max": [0, "$Age"] }, 2147483647] })),
        input = |p| enumerable(
            "Skip",
            vec![scores(p), member(param(p), "Age", HostType::Int32)],
            HostType::enumerable(HostType::Int32),
        )
    );
}

mod aggregates {
    test_translate_method!(
        average_of_ints_as_decimal_converts,
        expected = Ok(bson!({ "$toDecimal": { "$avg": "$Scores" } })),
        input = |p| enumerable("Average", vec![scores(p)], HostType::Decimal)
    );

    test_translate_method!(
        average_of_ints_as_double_does_not_convert,
        expected = Ok(bson!({ "$avg": "$Scores" })),
        input = |p| enumerable("Average", vec![scores(p)], HostType::Double)
    );

    test_translate_method!(
        sum_of_ints_does_not_convert,
        expected = Ok(bson!({ "$sum": "$Scores" })),
        input = |p| enumerable("Sum", vec![scores(p)], HostType::Int32)
    );

    test_translate_method!(
        average_of_decimals_stays_decimal,
        expected = Ok(bson!({ "$avg": "$Prices" })),
        input = |p| enumerable(
            "Average",
            vec![member(param(p), "Prices", HostType::array(HostType::Decimal))],
            HostType::Decimal
        )
    );

    test_translate_method!(
        sum_with_selector_maps_first,
        expected = Ok(bson!({ "$sum": { "$map": {
            "input": "$Addresses",
            "as": "a",
            "in": { "$strLenCP": "$$a.City" },
        } } })),
        input = |p| {
            let a = parameter("a", HostType::class("Address"));
            enumerable(
                "Sum",
                vec![
                    addresses(p),
                    lambda(
                        vec![a.clone()],
                        member(member(param(&a), "City", HostType::String), "Length", HostType::Int32),
                    ),
                ],
                HostType::Int32,
            )
        }
    );

    test_translate_method!(
        population_standard_deviation,
        expected = Ok(bson!({ "$stdDevPop": "$Scores" })),
        input = |p| call_static(DeclaringType::Mql, "StandardDeviationPopulation", vec![scores(p)], HostType::Double)
    );

    test_translate_method!(
        sample_standard_deviation_of_selected_values_as_decimal,
        expected = Ok(bson!({ "$toDecimal": { "$stdDevSamp": { "$map": {
            "input": "$Addresses",
            "as": "a",
            "in": { "$strLenCP": "$$a.City" },
        } } } })),
        input = |p| {
            let a = parameter("a", HostType::class("Address"));
            call_static(
                DeclaringType::Mql,
                "StandardDeviationSample",
                vec![
                    addresses(p),
                    lambda(
                        vec![a.clone()],
                        member(member(param(&a), "City", HostType::String), "Length", HostType::Int32),
                    ),
                ],
                HostType::Decimal,
            )
        }
    );

    test_translate_method!(
        min_with_selector,
        expected = Ok(bson!({ "$min": { "$map": {
            "input": "$Addresses",
            "as": "a",
            "in": "$$a.City",
        } } })),
        input = |p| {
            let a = parameter("a", HostType::class("Address"));
            enumerable(
                "Min",
                vec![
                    addresses(p),
                    lambda(vec![a.clone()], member(param(&a), "City", HostType::String)),
                ],
                HostType::String,
            )
        }
    );

    test_translate_method!(
        max_of_items,
        expected = Ok(bson!({ "$max": "$Scores" })),
        input = |p| enumerable("Max", vec![scores(p)], HostType::Int32)
    );

    test_translate_method!(
        aggregate_without_seed_folds_the_rest,
        expected = Ok(bson!({ "$cond": {
            "if": { "$lte": [{ "$size": "$Scores" }, 1] },
            "then": { "$arrayElemAt": ["$Scores", 0] },
            "else": { "$reduce": {
                "input": { "$slice": ["$Scores", 1, 2147483647] },
                "initialValue": { "$arrayElemAt": ["$Scores", 0] },
                "in": { "$let": {
                    "vars": { "acc": "$$value", "s": "$$this" },
                    "in": { "$add": ["$$acc", "$$s"] },
                } },
            } },
        } })),
        input = |p| {
            let acc = parameter("acc", HostType::Int32);
            let s = parameter("s", HostType::Int32);
            enumerable(
                "Aggregate",
                vec![
                    scores(p),
                    lambda(
                        vec![acc.clone(), s.clone()],
                        arithmetic(BinaryOperator::Add, param(&acc), param(&s)),
                    ),
                ],
                HostType::Int32,
            )
        }
    );

    test_translate_method!(
        aggregate_with_seed_and_result_selector,
        expected = Ok(bson!({ "$let": {
            "vars": { "total": { "$reduce": {
                "input": "$Scores",
                "initialValue": 0,
                "in": { "$let": {
                    "vars": { "acc": "$$value", "s": "$$this" },
                    "in": { "$add": ["$$acc", "$$s"] },
                } },
            } } },
            "in": { "$multiply": ["$$total", 2] },
        } })),
        input = |p| {
            let acc = parameter("acc", HostType::Int32);
            let s = parameter("s", HostType::Int32);
            let total = parameter("total", HostType::Int32);
            enumerable(
                "Aggregate",
                vec![
                    scores(p),
                    int(0),
                    lambda(
                        vec![acc.clone(), s.clone()],
                        arithmetic(BinaryOperator::Add, param(&acc), param(&s)),
                    ),
                    lambda(
                        vec![total.clone()],
                        arithmetic(BinaryOperator::Multiply, param(&total), int(2)),
                    ),
                ],
                HostType::Int32,
            )
        }
    );

    test_translate_method!(
        nested_aggregate_keeps_outer_item,
        expected = Ok(bson!({ "$reduce": {
            "input": "$Scores",
            "initialValue": 0,
            "in": { "$let": {
                "vars": { "acc": "$$value", "x": "$$this" },
                "in": { "$reduce": {
                    "input": "$Scores",
                    "initialValue": "$$acc",
                    "in": { "$let": {
                        "vars": { "a": "$$value", "y": "$$this" },
                        "in": { "$add": ["$$a", "$$x"] },
                    } },
                } },
            } },
        } })),
        input = |p| {
            let acc = parameter("acc", HostType::Int32);
            let x = parameter("x", HostType::Int32);
            let a = parameter("a", HostType::Int32);
            let y = parameter("y", HostType::Int32);
            let inner = enumerable(
                "Aggregate",
                vec![
                    scores(p),
                    param(&acc),
                    lambda(
                        vec![a.clone(), y.clone()],
                        arithmetic(BinaryOperator::Add, param(&a), param(&x)),
                    ),
                ],
                HostType::Int32,
            );
            enumerable(
                "Aggregate",
                vec![scores(p), int(0), lambda(vec![acc.clone(), x.clone()], inner)],
                HostType::Int32,
            )
        }
    );

    test_translate_method!(
        any_without_predicate_checks_size,
        expected = Ok(bson!({ "$gt": [{ "$size": "$Tags" }, 0] })),
        input = |p| enumerable("Any", vec![tags(p)], HostType::Boolean)
    );

    test_translate_method!(
        all_maps_predicate,
        expected = Ok(bson!({ "$allElementsTrue": { "$map": {
            "input": "$Scores",
            "as": "s",
            "in": { "$gt": ["$$s", 0] },
        } } })),
        input = |p| {
            let s = parameter("s", HostType::Int32);
            enumerable(
                "All",
                vec![
                    scores(p),
                    lambda(
                        vec![s.clone()],
                        compare(BinaryOperator::GreaterThan, param(&s), int(0)),
                    ),
                ],
                HostType::Boolean,
            )
        }
    );

    test_translate_method!(
        count_with_predicate_filters,
        expected = Ok(bson!({ "$size": { "$filter": {
            "input": "$Tags",
            "as": "t",
            "cond": { "$eq": ["$$t", "a"] },
        } } })),
        input = |p| {
            let t = parameter("t", HostType::String);
            enumerable(
                "Count",
                vec![
                    tags(p),
                    lambda(vec![t.clone()], compare(BinaryOperator::Equal, param(&t), string("a"))),
                ],
                HostType::Int32,
            )
        }
    );
}

mod element_at {
    test_translate_method!(
        first_or_default_of_value_type_defaults,
        expected = Ok(bson!({ "$ifNull": [{ "$arrayElemAt": ["$Scores", 0] }, 0] })),
        input = |p| enumerable("FirstOrDefault", vec![scores(p)], HostType::Int32)
    );

    test_translate_method!(
        last_reads_from_the_end,
        expected = Ok(bson!({ "$arrayElemAt": ["$Tags", -1] })),
        input = |p| enumerable("Last", vec![tags(p)], HostType::String)
    );

    test_translate_method!(
        first_with_predicate_filters_first,
        expected = Ok(bson!({ "$arrayElemAt": [
            { "$filter": {
                "input": "$Addresses",
                "as": "a",
                "cond": { "$eq": ["$$a.City", "Paris"] },
            } },
            0,
        ] })),
        input = |p| {
            let a = parameter("a", HostType::class("Address"));
            enumerable(
                "First",
                vec![
                    addresses(p),
                    lambda(
                        vec![a.clone()],
                        compare(
                            BinaryOperator::Equal,
                            member(param(&a), "City", HostType::String),
                            string("Paris"),
                        ),
                    ),
                ],
                HostType::class("Address"),
            )
        }
    );

    test_translate_method!(
        element_at_uses_index,
        expected = Ok(bson!({ "$arrayElemAt": ["$Scores", "$Age"] })),
        input = |p| enumerable(
            "ElementAt",
            vec![scores(p), member(param(p), "Age", HostType::Int32)],
            HostType::Int32
        )
    );
}

mod contains_and_sets {
    test_translate_method!(
        list_contains_becomes_in,
        expected = Ok(bson!({ "$in": ["a", "$Tags"] })),
        input = |p| call_instance(tags(p), DeclaringType::List, "Contains", vec![string("a")], HostType::Boolean)
    );

    test_translate_method!(
        enumerable_contains_on_constant_array,
        expected = Ok(bson!({ "$in": ["$Age", [1, 2]] })),
        input = |p| enumerable(
            "Contains",
            vec![
                new_array(HostType::Int32, vec![int(1), int(2)]),
                member(param(p), "Age", HostType::Int32),
            ],
            HostType::Boolean
        )
    );

    test_translate_method!(
        distinct_is_set_union,
        expected = Ok(bson!({ "$setUnion": ["$Scores"] })),
        input = |p| enumerable("Distinct", vec![scores(p)], HostType::enumerable(HostType::Int32))
    );

    test_translate_method!(
        concat_is_concat_arrays,
        expected = Ok(bson!({ "$concatArrays": ["$Tags", "$Tags"] })),
        input = |p| enumerable("Concat", vec![tags(p), tags(p)], HostType::enumerable(HostType::String))
    );

    test_translate_method!(
        except_is_set_difference,
        expected = Ok(bson!({ "$setDifference": ["$Tags", ["a"]] })),
        input = |p| enumerable(
            "Except",
            vec![tags(p), new_array(HostType::String, vec![string("a")])],
            HostType::enumerable(HostType::String)
        )
    );

    test_translate_method!(
        reverse_is_reverse_array,
        expected = Ok(bson!({ "$reverseArray": "$Scores" })),
        input = |p| enumerable("Reverse", vec![scores(p)], HostType::enumerable(HostType::Int32))
    );

    test_translate_method!(
        zip_maps_pairs,
        expected = Ok(bson!({ "$map": {
            "input": { "$zip": { "inputs": ["$Scores", "$Tags"] } },
            "as": "pair",
            "in": { "$add": [
                { "$arrayElemAt": ["$$pair", 0] },
                { "$strLenCP": { "$arrayElemAt": ["$$pair", 1] } },
            ] },
        } })),
        input = |p| {
            let s = parameter("s", HostType::Int32);
            let t = parameter("t", HostType::String);
            enumerable(
                "Zip",
                vec![
                    scores(p),
                    tags(p),
                    lambda(
                        vec![s.clone(), t.clone()],
                        arithmetic(
                            BinaryOperator::Add,
                            param(&s),
                            member(param(&t), "Length", HostType::Int32),
                        ),
                    ),
                ],
                HostType::enumerable(HostType::Int32),
            )
        }
    );

    test_translate_method!(
        range_ends_at_start_plus_count,
        expected = Ok(bson!({ "$range": ["$Age", { "$add": ["$Age", 3] }] })),
        input = |p| enumerable(
            "Range",
            vec![member(param(p), "Age", HostType::Int32), int(3)],
            HostType::enumerable(HostType::Int32)
        )
    );
}

mod index_of {
    test_translate_method!(
        char_is_searched_as_string,
        expected = Ok(bson!({ "$indexOfCP": ["$Name", "a"] })),
        input = |p| string_method(p, "IndexOf", vec![character('a')], HostType::Int32)
    );

    test_translate_method!(
        count_becomes_end_index,
        expected = Ok(bson!({ "$indexOfCP": ["$Name", "b", 1, 4] })),
        input = |p| string_method(p, "IndexOf", vec![string("b"), int(1), int(3)], HostType::Int32)
    );

    test_translate_method!(
        ignore_case_lowers_both_operands,
        expected = Ok(bson!({ "$indexOfCP": [{ "$toLower": "$Name" }, "b"] })),
        input = |p| string_method(
            p,
            "IndexOf",
            vec![string("B"), comparison(StringComparison::OrdinalIgnoreCase)],
            HostType::Int32
        )
    );

    test_translate_method!(
        culture_sensitive_comparison_is_rejected,
        expected = Err(result::Error::Translator(Error::UnsupportedStringComparison(
            StringComparison::CurrentCulture
        ))),
        input = |p| string_method(
            p,
            "IndexOf",
            vec![string("b"), comparison(StringComparison::CurrentCulture)],
            HostType::Int32
        )
    );

    test_translate_method!(
        index_of_bytes,
        expected = Ok(bson!({ "$indexOfBytes": ["$Name", "x"] })),
        input = |p| call_static(DeclaringType::Mql, "IndexOfBytes", vec![name(p), string("x")], HostType::Int32)
    );

    test_translate_method!(
        list_index_of_is_index_of_array,
        expected = Ok(bson!({ "$indexOfArray": ["$Tags", "a"] })),
        input = |p| call_instance(tags(p), DeclaringType::List, "IndexOf", vec![string("a")], HostType::Int32)
    );

    test_translate_method!(
        index_of_any_takes_smallest_position,
        expected = Ok(bson!({ "$let": {
            "vars": { "positions": { "$filter": {
                "input": { "$map": {
                    "input": ["a", "b"],
                    "as": "c",
                    "in": { "$indexOfCP": ["$Name", "$$c"] },
                } },
                "as": "i",
                "cond": { "$gte": ["$$i", 0] },
            } } },
            "in": { "$cond": {
                "if": { "$eq": [{ "$size": "$$positions" }, 0] },
                "then": -1,
                "else": { "$min": "$$positions" },
            } },
        } })),
        input = |p| string_method(
            p,
            "IndexOfAny",
            vec![new_array(HostType::Char, vec![character('a'), character('b')])],
            HostType::Int32
        )
    );
}

mod strings {
    test_translate_method!(
        starts_with_compares_prefix,
        expected = Ok(bson!({ "$eq": [{ "$substrCP": ["$Name", 0, 2] }, "ab"] })),
        input = |p| string_method(p, "StartsWith", vec![string("ab")], HostType::Boolean)
    );

    test_translate_method!(
        ends_with_searches_at_computed_start,
        expected = Ok(bson!({ "$let": {
            "vars": { "start": { "$subtract": [{ "$strLenCP": "$Name" }, 2] } },
            "in": { "$and": [
                { "$gte": ["$$start", 0] },
                { "$eq": [{ "$indexOfCP": ["$Name", "ab", "$$start"] }, "$$start"] },
            ] },
        } })),
        input = |p| string_method(p, "EndsWith", vec![string("ab")], HostType::Boolean)
    );

    test_translate_method!(
        contains_ignoring_case,
        expected = Ok(bson!({ "$gte": [{ "$indexOfCP": [{ "$toLower": "$Name" }, "ab"] }, 0] })),
        input = |p| string_method(
            p,
            "Contains",
            vec![string("aB"), comparison(StringComparison::OrdinalIgnoreCase)],
            HostType::Boolean
        )
    );

    test_translate_method!(
        equals_ignoring_case_lowers_both_sides,
        expected = Ok(bson!({ "$eq": [{ "$toLower": "$Name" }, "ab"] })),
        input = |p| string_method(
            p,
            "Equals",
            vec![string("Ab"), comparison(StringComparison::OrdinalIgnoreCase)],
            HostType::Boolean
        )
    );

    test_translate_method!(
        generic_equals,
        expected = Ok(bson!({ "$eq": ["$Age", 3] })),
        input = |p| call_instance(
            member(param(p), "Age", HostType::Int32),
            DeclaringType::Object,
            "Equals",
            vec![int(3)],
            HostType::Boolean
        )
    );

    test_translate_method!(
        compare_ignoring_case_is_strcasecmp,
        expected = Ok(bson!({ "$strcasecmp": ["$Name", "x"] })),
        input = |p| call_static(
            DeclaringType::String,
            "Compare",
            vec![name(p), string("x"), boolean(true)],
            HostType::Int32
        )
    );

    test_translate_method!(
        compare_to_is_cmp,
        expected = Ok(bson!({ "$cmp": ["$Age", 3] })),
        input = |p| call_instance(
            member(param(p), "Age", HostType::Int32),
            DeclaringType::Int32,
            "CompareTo",
            vec![int(3)],
            HostType::Int32
        )
    );

    test_translate_method!(
        to_upper,
        expected = Ok(bson!({ "$toUpper": "$Name" })),
        input = |p| string_method(p, "ToUpper", vec![], HostType::String)
    );

    test_translate_method!(
        trim_with_chars,
        expected = Ok(bson!({ "$trim": { "input": "$Name", "chars": "xy" } })),
        input = |p| string_method(
            p,
            "Trim",
            vec![new_array(HostType::Char, vec![character('x'), character('y')])],
            HostType::String
        )
    );

    test_translate_method!(
        trim_start_without_chars,
        expected = Ok(bson!({ "$ltrim": { "input": "$Name" } })),
        input = |p| string_method(p, "TrimStart", vec![], HostType::String)
    );

    test_translate_method!(
        substring_to_end,
        expected = Ok(bson!({ "$substrCP": ["$Name", 1, { "$subtract": [{ "$strLenCP": "$Name" }, 1] }] })),
        input = |p| string_method(p, "Substring", vec![int(1)], HostType::String)
    );

    test_translate_method!(
        substring_with_length,
        expected = Ok(bson!({ "$substrCP": ["$Name", 1, 2] })),
        input = |p| string_method(p, "Substring", vec![int(1), int(2)], HostType::String)
    );

    test_translate_method!(
        string_concat,
        expected = Ok(bson!({ "$concat": ["$Name", "-", "$Address.City"] })),
        input = |p| call_static(
            DeclaringType::String,
            "Concat",
            vec![
                name(p),
                string("-"),
                member(member(param(p), "Address", HostType::class("Address")), "City", HostType::String),
            ],
            HostType::String
        )
    );

    test_translate_method!(
        is_null_or_empty,
        expected = Ok(bson!({ "$in": ["$Name", [null, ""]] })),
        input = |p| call_static(DeclaringType::String, "IsNullOrEmpty", vec![name(p)], HostType::Boolean)
    );

    test_translate_method!(
        replace_is_replace_all,
        expected = Ok(bson!({ "$replaceAll": { "input": "$Name", "find": "a", "replacement": "b" } })),
        input = |p| string_method(p, "Replace", vec![string("a"), string("b")], HostType::String)
    );

    test_translate_method!(
        replace_requires_4_4,
        expected = Err(result::Error::Translator(Error::RequiresServerVersion {
            operator: "$replaceAll",
            required: ServerVersion::V4_4,
            configured: ServerVersion::V4_2,
        })),
        options = TranslationOptions {
            compatibility_level: ServerVersion::V4_2,
            ..Default::default()
        },
        input = |p| string_method(p, "Replace", vec![string("a"), string("b")], HostType::String)
    );

    test_translate_method!(
        split_on_char,
        expected = Ok(bson!({ "$split": ["$Name", ","] })),
        input = |p| string_method(
            p,
            "Split",
            vec![new_array(HostType::Char, vec![character(',')])],
            HostType::array(HostType::String)
        )
    );

    test_translate_method!(
        split_removing_empty_entries,
        expected = Ok(bson!({ "$filter": {
            "input": { "$split": ["$Name", ", "] },
            "as": "item",
            "cond": { "$ne": ["$$item", ""] },
        } })),
        input = |p| string_method(
            p,
            "Split",
            vec![string(", "), split_options(StringSplitOptions::RemoveEmptyEntries)],
            HostType::array(HostType::String)
        )
    );

    test_translate_method!(
        split_with_count_slices,
        expected = Ok(bson!({ "$slice": [{ "$split": ["$Name", ","] }, 2] })),
        input = |p| string_method(
            p,
            "Split",
            vec![
                character(','),
                int(2),
                split_options(StringSplitOptions::None),
            ],
            HostType::array(HostType::String)
        )
    );

    test_translate_method!(
        regex_is_match,
        expected = Ok(bson!({ "$regexMatch": { "input": "$Name", "regex": "^a" } })),
        input = |p| call_static(DeclaringType::Regex, "IsMatch", vec![name(p), string("^a")], HostType::Boolean)
    );

    #[test]
    fn split_on_several_separators_is_rejected() {
        use crate::{result, translator::test::*, translator::Error};
        let p = parameter("p", person_type());
        let input = super::string_method(
            &p,
            "Split",
            vec![new_array(HostType::Char, vec![character(','), character(';')])],
            HostType::array(HostType::String),
        );
        assert!(matches!(
            translate(&p, &input),
            Err(result::Error::Translator(Error::UnsupportedSplitSeparator(_)))
        ));
    }

    use crate::expression::{builder::*, *};
}

mod conversions {
    test_translate_method!(
        to_string_of_int,
        expected = Ok(bson!({ "$toString": "$Age" })),
        input = |p| call_instance(
            member(param(p), "Age", HostType::Int32),
            DeclaringType::Int32,
            "ToString",
            vec![],
            HostType::String
        )
    );

    test_translate_method!(
        convert_to_int32,
        expected = Ok(bson!({ "$convert": { "input": "$Name", "to": "int" } })),
        input = |p| call_static(DeclaringType::Convert, "ToInt32", vec![name(p)], HostType::Int32)
    );

    test_translate_method!(
        parse_decimal,
        expected = Ok(bson!({ "$convert": { "input": "$Name", "to": "decimal" } })),
        input = |p| call_static(DeclaringType::Decimal, "Parse", vec![name(p)], HostType::Decimal)
    );

    test_translate_method!(
        math_abs,
        expected = Ok(bson!({ "$abs": "$Age" })),
        input = |p| call_static(
            DeclaringType::Math,
            "Abs",
            vec![member(param(p), "Age", HostType::Int32)],
            HostType::Int32
        )
    );

    test_translate_method!(
        math_round_with_digits,
        expected = Ok(bson!({ "$round": ["$Salary", 2] })),
        input = |p| call_static(
            DeclaringType::Math,
            "Round",
            vec![member(param(p), "Salary", HostType::Decimal), int(2)],
            HostType::Decimal
        )
    );

    test_translate_method!(
        math_log_with_base,
        expected = Ok(bson!({ "$log": ["$Height", 2.0] })),
        input = |p| call_static(
            DeclaringType::Math,
            "Log",
            vec![member(param(p), "Height", HostType::Double), double(2.0)],
            HostType::Double
        )
    );

    test_translate_method!(
        math_max_of_two,
        expected = Ok(bson!({ "$max": ["$Age", 3] })),
        input = |p| call_static(
            DeclaringType::Math,
            "Max",
            vec![member(param(p), "Age", HostType::Int32), int(3)],
            HostType::Int32
        )
    );

    test_translate_method!(
        add_days_uses_date_add,
        expected = Ok(bson!({ "$dateAdd": { "startDate": "$Birthday", "unit": "day", "amount": 1 } })),
        input = |p| call_instance(
            member(param(p), "Birthday", HostType::DateTime),
            DeclaringType::DateTime,
            "AddDays",
            vec![int(1)],
            HostType::DateTime
        )
    );

    test_translate_method!(
        add_days_before_5_0_adds_milliseconds,
        expected = Ok(bson!({ "$add": ["$Birthday", { "$multiply": [1, 86_400_000_i64] }] })),
        options = TranslationOptions {
            compatibility_level: ServerVersion::V4_4,
            ..Default::default()
        },
        input = |p| call_instance(
            member(param(p), "Birthday", HostType::DateTime),
            DeclaringType::DateTime,
            "AddDays",
            vec![int(1)],
            HostType::DateTime
        )
    );

    test_translate_method!(
        add_months_before_5_0_is_rejected,
        expected = Err(result::Error::Translator(Error::RequiresServerVersion {
            operator: "$dateAdd",
            required: ServerVersion::V5_0,
            configured: ServerVersion::V4_4,
        })),
        options = TranslationOptions {
            compatibility_level: ServerVersion::V4_4,
            ..Default::default()
        },
        input = |p| call_instance(
            member(param(p), "Birthday", HostType::DateTime),
            DeclaringType::DateTime,
            "AddMonths",
            vec![int(1)],
            HostType::DateTime
        )
    );
}

mod dictionaries {
    fn attributes(p: &ParameterExpression) -> Expression {
        member(
            param(p),
            "Attributes",
            HostType::dictionary(HostType::String, HostType::Int32),
        )
    }

    fn counters(p: &ParameterExpression) -> Expression {
        member(
            param(p),
            "Counters",
            HostType::dictionary(HostType::String, HostType::Int32),
        )
    }

    test_translate_method!(
        contains_constant_key_checks_field_type,
        expected = Ok(bson!({ "$ne": [{ "$type": "$Attributes.color" }, "missing"] })),
        input = |p| call_instance(
            attributes(p),
            DeclaringType::Dictionary,
            "ContainsKey",
            vec![string("color")],
            HostType::Boolean
        )
    );

    test_translate_method!(
        contains_key_of_array_of_documents,
        expected = Ok(bson!({ "$in": ["a", { "$map": { "input": "$Counters", "as": "kv", "in": "$$kv.k" } }] })),
        input = |p| call_instance(
            counters(p),
            DeclaringType::Dictionary,
            "ContainsKey",
            vec![string("a")],
            HostType::Boolean
        )
    );

    test_translate_method!(
        contains_value_reads_entries,
        expected = Ok(bson!({ "$in": [3, { "$map": {
            "input": { "$objectToArray": "$Attributes" },
            "as": "kv",
            "in": "$$kv.v",
        } }] })),
        input = |p| call_instance(
            attributes(p),
            DeclaringType::Dictionary,
            "ContainsValue",
            vec![int(3)],
            HostType::Boolean
        )
    );

    test_translate_method!(
        indexer_with_constant_key_is_field,
        expected = Ok(bson!("$Attributes.color")),
        input = |p| call_instance(
            attributes(p),
            DeclaringType::Dictionary,
            "get_Item",
            vec![string("color")],
            HostType::Int32
        )
    );

    test_translate_method!(
        indexer_with_dollar_key_searches_entries,
        expected = Ok(bson!({ "$arrayElemAt": [
            { "$map": {
                "input": { "$filter": {
                    "input": { "$objectToArray": "$Attributes" },
                    "as": "kv",
                    "cond": { "$eq": ["$$kv.k", { "$literal": "$price" }] },
                } },
                "as": "kv",
                "in": "$$kv.v",
            } },
            0,
        ] })),
        input = |p| call_instance(
            attributes(p),
            DeclaringType::Dictionary,
            "get_Item",
            vec![string("$price")],
            HostType::Int32
        )
    );

    test_translate_method!(
        list_indexer,
        expected = Ok(bson!({ "$arrayElemAt": ["$Tags", 0] })),
        input = |p| call_instance(tags(p), DeclaringType::List, "get_Item", vec![int(0)], HostType::String)
    );

    use crate::expression::{builder::*, *};
}

mod unsupported {
    test_translate_method!(
        unknown_method_names_the_call,
        expected = Err(result::Error::Translator(Error::MethodNotSupported(
            "p.Name.PadLeft(3)".to_string()
        ))),
        input = |p| string_method(p, "PadLeft", vec![int(3)], HostType::String)
    );

    test_translate_method!(
        non_constant_regex_pattern_is_rejected,
        expected = Err(result::Error::Translator(Error::NonConstantArgument(
            "Regex.IsMatch(p.Name, p.Name)".to_string(),
            "p.Name".to_string()
        ))),
        input = |p| call_static(DeclaringType::Regex, "IsMatch", vec![name(p), name(p)], HostType::Boolean)
    );
}

mod registry {
    use super::super::*;
    use crate::{
        expression::builder::*,
        translator::{test::*, ExpressionTranslator, Result, Symbol, TranslatedExpression, TranslationContext},
    };
    use std::sync::Arc;

    struct PadLeftTranslator;

    const PAD_LEFT: &[MethodSignature] = &[MethodSignature::instance(
        DeclaringType::String,
        "PadLeft",
        &[ParameterKind::Int32],
    )];

    impl MethodTranslator for PadLeftTranslator {
        fn overloads(&self) -> &'static [MethodSignature] {
            PAD_LEFT
        }

        fn translate(
            &self,
            translator: &ExpressionTranslator,
            context: &TranslationContext,
            call: &MethodCallExpression,
        ) -> Result<TranslatedExpression> {
            let string = translator.translate(context, call.object.as_deref().unwrap())?;
            translated(call, string.ast, string.serializer)
        }
    }

    #[test]
    fn custom_translator_extends_the_standard_set() {
        let mut methods = MethodTranslatorRegistry::standard();
        methods.register(Arc::new(PadLeftTranslator));
        let translator = ExpressionTranslator::new(Arc::new(methods));

        let p = parameter("p", person_type());
        let context = TranslationContext::new(registry(), Default::default());
        let serializer = context.serializer_for(&p.ty).unwrap();
        let context = context.with_symbol(&p, Symbol::current("p", crate::ast::Expression::root(), serializer));
        let input = super::string_method(&p, "PadLeft", vec![int(3)], HostType::String);
        let translated = translator.translate(&context, &input).unwrap();
        assert_eq!(crate::ast::Expression::field(&["Name"]), translated.ast);
    }

    #[test]
    fn signature_matching_checks_parameter_kinds() {
        let p = parameter("p", person_type());
        let call = match super::string_method(&p, "IndexOf", vec![int(3)], HostType::Int32) {
            Expression::MethodCall(call) => call,
            _ => unreachable!(),
        };
        let by_string = MethodSignature::instance(DeclaringType::String, "IndexOf", &[ParameterKind::String]);
        let by_any = MethodSignature::instance(DeclaringType::String, "IndexOf", &[ParameterKind::Any]);
        assert!(!by_string.matches(&call));
        assert!(by_any.matches(&call));
    }
}
