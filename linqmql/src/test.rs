use crate::{
    ast,
    codegen::MqlCodeGenerator,
    expression::{builder::*, *},
    options::TranslationOptions,
    result, translate_expression, translate_filter, translate_pipeline,
    translator::{test::*, Error, FinalOperator, TranslationContext},
};
use bson::{bson, doc};

fn context() -> TranslationContext {
    TranslationContext::new(registry(), TranslationOptions::default())
}

fn name(p: &ParameterExpression) -> Expression {
    member(param(p), "Name", HostType::String)
}

fn age(p: &ParameterExpression) -> Expression {
    member(param(p), "Age", HostType::Int32)
}

fn person_lambda(body: impl FnOnce(&ParameterExpression) -> Expression) -> Expression {
    let p = parameter("p", person_type());
    let body = body(&p);
    lambda(vec![p], body)
}

fn queryable_call(name: &str, arguments: Vec<Expression>, return_type: HostType) -> Expression {
    call_static(DeclaringType::Queryable, name, arguments, return_type)
}

/// `people.Where(p => p.Age > 10 && p.Name.StartsWith("A")).Select(p => p.Name.ToUpper())`
fn where_then_select() -> Expression {
    let filtered = queryable_call(
        "Where",
        vec![
            queryable("people", person_type()),
            quote(person_lambda(|p| {
                and_also(
                    compare(BinaryOperator::GreaterThan, age(p), int(10)),
                    call_instance(name(p), DeclaringType::String, "StartsWith", vec![string("A")], HostType::Boolean),
                )
            })),
        ],
        HostType::queryable(person_type()),
    );
    queryable_call(
        "Select",
        vec![
            filtered,
            quote(person_lambda(|p| {
                call_instance(name(p), DeclaringType::String, "ToUpper", vec![], HostType::String)
            })),
        ],
        HostType::queryable(HostType::String),
    )
}

mod scenario {
    use super::*;

    #[test]
    fn where_and_select_become_match_and_project() {
        let translation = translate_pipeline(&context(), &where_then_select()).unwrap();
        assert_eq!("people", translation.collection);
        assert_eq!(
            vec![
                doc! { "$match": { "Age": { "$gt": 10 }, "Name": { "$regex": "^A" } } },
                doc! { "$project": { "_id": 0, "_v": { "$toUpper": "$Name" } } },
            ],
            translation.pipeline
        );
        assert_eq!(None, translation.final_operator);
        let item = translation.output_serializer.wrapped_value_serializer().unwrap();
        assert_eq!(&HostType::String, item.value_type());
    }

    #[test]
    fn nested_constants_are_projected_as_literals() {
        let query = queryable_call(
            "Select",
            vec![
                queryable("people", person_type()),
                quote(person_lambda(|_| {
                    new_anonymous(vec![("Inner", new_anonymous(vec![("Flag", boolean(true))]))])
                })),
            ],
            HostType::queryable(HostType::Object),
        );
        let translation = translate_pipeline(&context(), &query).unwrap();
        assert_eq!(
            vec![doc! { "$project": { "_id": 0, "Inner": { "Flag": { "$literal": true } } } }],
            translation.pipeline
        );
    }

    #[test]
    fn take_zero_returns_no_documents() {
        let query = queryable_call(
            "Take",
            vec![queryable("people", person_type()), int(0)],
            HostType::queryable(person_type()),
        );
        let translation = translate_pipeline(&context(), &query).unwrap();
        assert_eq!(vec![doc! { "$match": { "$expr": false } }], translation.pipeline);
    }

    #[test]
    fn translation_is_deterministic() {
        let query = where_then_select();
        let first = translate_pipeline(&context(), &query).unwrap();
        let second = translate_pipeline(&context(), &query).unwrap();
        assert_eq!(first.pipeline, second.pipeline);
    }

    #[test]
    fn terminal_count_reports_scalar_result() {
        let query = queryable_call("Count", vec![queryable("people", person_type())], HostType::Int32);
        let translation = translate_pipeline(&context(), &query).unwrap();
        assert_eq!(
            vec![doc! { "$group": { "_id": bson::Bson::Null, "_v": { "$sum": 1 } } }],
            translation.pipeline
        );
        assert_eq!(Some(FinalOperator::Scalar), translation.final_operator);
    }
}

mod expressions {
    use super::*;

    #[test]
    fn nested_lambdas_reusing_a_name_resolve_to_their_own_binding() {
        let expression = person_lambda(|p| {
            let outer = parameter("x", address_type());
            let inner = parameter("x", HostType::String);
            let lengths = call_static(
                DeclaringType::Enumerable,
                "Select",
                vec![
                    member(param(p), "Tags", HostType::list(HostType::String)),
                    lambda(vec![inner.clone()], member(param(&inner), "Length", HostType::Int32)),
                ],
                HostType::enumerable(HostType::Int32),
            );
            let body = new_anonymous(vec![
                ("Lengths", lengths),
                ("City", member(param(&outer), "City", HostType::String)),
            ]);
            call_static(
                DeclaringType::Enumerable,
                "Select",
                vec![
                    member(param(p), "Addresses", HostType::list(address_type())),
                    lambda(vec![outer.clone()], body),
                ],
                HostType::enumerable(HostType::Object),
            )
        });
        assert_eq!(
            bson!({ "$map": {
                "input": "$Addresses",
                "as": "x",
                "in": {
                    "Lengths": { "$map": { "input": "$Tags", "as": "x1", "in": { "$strLenCP": "$$x1" } } },
                    "City": "$$x.City",
                },
            } }),
            translate_expression(&context(), &expression).unwrap().expression
        );
    }

    #[test]
    fn repeated_subexpressions_are_hoisted() {
        let expression = person_lambda(|p| {
            let length = || member(name(p), "Length", HostType::Int32);
            arithmetic(BinaryOperator::Add, length(), length())
        });
        assert_eq!(
            bson!({ "$let": {
                "vars": { "cse0": { "$strLenCP": "$Name" } },
                "in": { "$add": ["$$cse0", "$$cse0"] },
            } }),
            translate_expression(&context(), &expression).unwrap().expression
        );
    }

    #[test]
    fn hoisting_can_be_disabled() {
        let options = TranslationOptions {
            hoist_common_subexpressions: false,
            ..Default::default()
        };
        let expression = person_lambda(|p| {
            let length = || member(name(p), "Length", HostType::Int32);
            arithmetic(BinaryOperator::Add, length(), length())
        });
        assert_eq!(
            bson!({ "$add": [{ "$strLenCP": "$Name" }, { "$strLenCP": "$Name" }] }),
            translate_expression(&TranslationContext::new(registry(), options), &expression)
                .unwrap()
                .expression
        );
    }

    #[test]
    fn output_serializer_describes_result() {
        let expression = person_lambda(age);
        let translation = translate_expression(&context(), &expression).unwrap();
        assert_eq!(bson!("$Age"), translation.expression);
        assert_eq!(&HostType::Int32, translation.output_serializer.value_type());
    }

    #[test]
    fn unsupported_method_names_the_call() {
        let expression = person_lambda(|p| {
            call_instance(name(p), DeclaringType::String, "PadLeft", vec![int(3)], HostType::String)
        });
        assert_eq!(
            Some(result::Error::Translator(Error::MethodNotSupported(
                "p.Name.PadLeft(3)".to_string()
            ))),
            translate_expression(&context(), &expression).err()
        );
    }
}

mod filters {
    use super::*;

    #[test]
    fn predicate_lambda_becomes_match_document() {
        let predicate = person_lambda(|p| {
            or_else(
                compare(BinaryOperator::LessThan, age(p), int(18)),
                call_static(DeclaringType::String, "IsNullOrEmpty", vec![name(p)], HostType::Boolean),
            )
        });
        assert_eq!(
            doc! { "$or": [{ "Age": { "$lt": 18 } }, { "Name": { "$in": [bson::Bson::Null, ""] } }] },
            translate_filter(&context(), &predicate).unwrap().filter
        );
    }

    #[test]
    fn element_disjunction_becomes_membership_test() {
        let predicate = person_lambda(|p| {
            let t = parameter("t", HostType::String);
            call_static(
                DeclaringType::Enumerable,
                "Any",
                vec![
                    member(param(p), "Tags", HostType::list(HostType::String)),
                    lambda(
                        vec![t.clone()],
                        or_else(
                            compare(BinaryOperator::Equal, param(&t), string("a")),
                            compare(BinaryOperator::Equal, param(&t), string("b")),
                        ),
                    ),
                ],
                HostType::Boolean,
            )
        });
        assert_eq!(
            doc! { "Tags": { "$elemMatch": { "$in": ["a", "b"] } } },
            translate_filter(&context(), &predicate).unwrap().filter
        );
    }

    #[test]
    fn non_lambda_predicate_is_rejected() {
        assert!(matches!(
            translate_filter(&context(), &boolean(true)),
            Err(result::Error::Translator(Error::ExpressionNotSupported(_, None)))
        ));
    }
}

mod rendering {
    use super::*;

    #[test]
    fn nested_and_renders_like_flattened_and() {
        let field = |name: &str| ast::Expression::field(&[name]);
        let nested = ast::Expression::Nary(ast::Nary {
            op: ast::NaryOperator::And,
            args: vec![
                ast::Expression::Nary(ast::Nary {
                    op: ast::NaryOperator::And,
                    args: vec![field("a"), field("b")],
                }),
                field("c"),
            ],
        });
        let flat = ast::Expression::Nary(ast::Nary {
            op: ast::NaryOperator::And,
            args: vec![field("a"), field("b"), field("c")],
        });
        let generator = MqlCodeGenerator::default();
        assert_eq!(
            generator.codegen_expression(flat),
            generator.codegen_expression(nested)
        );
    }
}
