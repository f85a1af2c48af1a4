macro_rules! test_display {
    ($func_name:ident, expected = $expected:expr, input = $input:expr) => {
        #[test]
        fn $func_name() {
            #[allow(unused_imports)]
            use crate::expression::{builder::*, *};
            assert_eq!($expected, $input.to_string());
        }
    };
}

mod display {
    test_display!(
        member_chain,
        expected = "d.Address.City",
        input = {
            let d = parameter("d", HostType::class("Customer"));
            member(
                member(param(&d), "Address", HostType::class("Address")),
                "City",
                HostType::String,
            )
        }
    );

    test_display!(
        extension_method_prints_source_first,
        expected = "xs.Select(x => (x + 1))",
        input = {
            let xs = parameter("xs", HostType::enumerable(HostType::Int32));
            let x = parameter("x", HostType::Int32);
            call_static(
                DeclaringType::Enumerable,
                "Select",
                vec![
                    param(&xs),
                    lambda(
                        vec![x.clone()],
                        arithmetic(BinaryOperator::Add, param(&x), int(1)),
                    ),
                ],
                HostType::enumerable(HostType::Int32),
            )
        }
    );

    test_display!(
        static_method,
        expected = "Math.Abs(x)",
        input = {
            let x = parameter("x", HostType::Int32);
            call_static(DeclaringType::Math, "Abs", vec![param(&x)], HostType::Int32)
        }
    );

    test_display!(
        instance_method_with_constant_arguments,
        expected = "s.IndexOf(\"a\", 2)",
        input = {
            let s = parameter("s", HostType::String);
            call_instance(
                param(&s),
                DeclaringType::String,
                "IndexOf",
                vec![string("a"), int(2)],
                HostType::Int32,
            )
        }
    );

    test_display!(
        anonymous_new,
        expected = "new {A = x, B = 1}",
        input = {
            let x = parameter("x", HostType::Int32);
            new_anonymous(vec![("A", param(&x)), ("B", int(1))])
        }
    );

    test_display!(
        host_types,
        expected = "Dictionary<string, int?[]>",
        input = HostType::dictionary(
            HostType::String,
            HostType::array(HostType::nullable(HostType::Int32))
        )
    );
}

mod types {
    use crate::expression::{builder::*, *};

    #[test]
    fn parameters_with_the_same_name_are_distinct() {
        let a = parameter("x", HostType::Int32);
        let b = parameter("x", HostType::Int32);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn lambda_type_is_a_function_type() {
        let x = parameter("x", HostType::Int32);
        let l = lambda(vec![x.clone()], compare(BinaryOperator::GreaterThan, param(&x), int(0)));
        assert_eq!(
            HostType::Function(vec![HostType::Int32], Box::new(HostType::Boolean)),
            l.ty()
        );
    }

    #[test]
    fn strings_are_not_sequences() {
        assert!(!HostType::String.is_sequence());
        assert_eq!(Some(&HostType::Char), HostType::String.item_type());
        assert!(HostType::list(HostType::String).is_sequence());
    }

    #[test]
    fn numeric_checks_look_through_nullable() {
        assert!(HostType::nullable(HostType::Decimal).is_numeric());
        assert!(HostType::nullable(HostType::Int64).is_integral());
        assert!(!HostType::Double.is_integral());
    }

    #[test]
    fn expression_trees_deserialize_from_json() {
        let json = r#"{
            "Binary": {
                "op": "GreaterThan",
                "left": { "Parameter": { "id": 7, "name": "x", "type": "Int32" } },
                "right": { "Constant": { "value": { "Int32": 10 }, "type": "Int32" } },
                "type": "Boolean"
            }
        }"#;
        let parsed: Expression = serde_json::from_str(json).unwrap();
        assert_eq!("(x > 10)", parsed.to_string());
    }
}
