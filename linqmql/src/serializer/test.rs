use crate::{
    expression::{HostType, HostValue},
    serializer::*,
};
use bson::{bson, Bson};
use lazy_static::lazy_static;

lazy_static! {
    static ref REGISTRY: StandardSerializerRegistry = StandardSerializerRegistry::new(vec![
        ClassMap {
            name: "Order".to_string(),
            members: vec![
                member("Id", Some("_id"), HostType::ObjectId),
                member("Total", None, HostType::Decimal),
                member("Lines", None, HostType::list(HostType::class("Line"))),
            ],
        },
        ClassMap {
            name: "Line".to_string(),
            members: vec![
                member("Sku", Some("sku"), HostType::String),
                MemberMap {
                    representation: BsonRepresentation::String,
                    ..member("Quantity", Some("qty"), HostType::Int32)
                },
            ],
        },
    ])
    .unwrap();
}

fn member(name: &str, element: Option<&str>, ty: HostType) -> MemberMap {
    MemberMap {
        member_name: name.to_string(),
        element_name: element.map(str::to_string),
        member_type: ty,
        representation: BsonRepresentation::Native,
        dictionary_representation: DictionaryRepresentation::Document,
    }
}

macro_rules! test_serialize_value {
    ($func_name:ident, expected = $expected:expr, ty = $ty:expr, value = $value:expr) => {
        #[test]
        fn $func_name() {
            let serializer = REGISTRY.lookup(&$ty).unwrap();
            assert_eq!($expected, serializer.serialize_value(&$value));
        }
    };
}

mod serialize_value {
    use super::*;

    test_serialize_value!(
        int_to_int,
        expected = Ok(Bson::Int32(3)),
        ty = HostType::Int32,
        value = HostValue::Int32(3)
    );

    test_serialize_value!(
        int_widened_to_long,
        expected = Ok(Bson::Int64(3)),
        ty = HostType::Int64,
        value = HostValue::Int32(3)
    );

    test_serialize_value!(
        int_to_double,
        expected = Ok(Bson::Double(3.0)),
        ty = HostType::Double,
        value = HostValue::Int32(3)
    );

    test_serialize_value!(
        char_to_string_type,
        expected = Ok(Bson::String("a".to_string())),
        ty = HostType::String,
        value = HostValue::Char('a')
    );

    test_serialize_value!(
        null_through_nullable,
        expected = Ok(Bson::Null),
        ty = HostType::nullable(HostType::Int32),
        value = HostValue::Null
    );

    test_serialize_value!(
        string_into_int_fails,
        expected = Err(Error::IncompatibleValue {
            value: "\"x\"".to_string(),
            ty: HostType::Int32
        }),
        ty = HostType::Int32,
        value = HostValue::String("x".to_string())
    );

    test_serialize_value!(
        array_of_strings,
        expected = Ok(bson!(["a", "b"])),
        ty = HostType::array(HostType::String),
        value = HostValue::Array(vec![
            HostValue::String("a".to_string()),
            HostValue::String("b".to_string())
        ])
    );

    test_serialize_value!(
        class_map_uses_element_names_and_representations,
        expected = Ok(bson!({"sku": "abc", "qty": "4"})),
        ty = HostType::class("Line"),
        value = HostValue::Document(vec![
            ("Sku".to_string(), HostValue::String("abc".to_string())),
            ("Quantity".to_string(), HostValue::Int32(4)),
        ])
    );

    test_serialize_value!(
        dictionary_as_document,
        expected = Ok(bson!({"a": 1})),
        ty = HostType::dictionary(HostType::String, HostType::Int32),
        value = HostValue::Document(vec![("a".to_string(), HostValue::Int32(1))])
    );

    test_serialize_value!(
        invalid_object_id,
        expected = Err(Error::InvalidObjectId("nope".to_string())),
        ty = HostType::ObjectId,
        value = HostValue::ObjectId("nope".to_string())
    );

    test_serialize_value!(
        date_from_rfc3339,
        expected = Ok(Bson::DateTime(bson::DateTime::from_millis(86_400_000))),
        ty = HostType::DateTime,
        value = HostValue::DateTime("1970-01-02T00:00:00Z".to_string())
    );
}

mod lookup {
    use super::*;

    #[test]
    fn item_serializer_of_list() {
        let lines = REGISTRY
            .lookup(&HostType::list(HostType::class("Line")))
            .unwrap();
        assert_eq!(
            &HostType::class("Line"),
            lines.item_serializer().unwrap().value_type()
        );
    }

    #[test]
    fn member_serializer_reports_element_name() {
        let order = REGISTRY.lookup(&HostType::class("Order")).unwrap();
        let id = order.member("Id").unwrap();
        assert_eq!("_id", id.element_name);
        assert_eq!(&HostType::ObjectId, id.serializer.value_type());
    }

    #[test]
    fn scalar_has_no_item_serializer() {
        let int = REGISTRY.lookup(&HostType::Int32).unwrap();
        assert_eq!(
            Err(Error::NoItemSerializer(HostType::Int32)),
            int.item_serializer().map(|_| ())
        );
    }

    #[test]
    fn unknown_member_lists_known_members() {
        let line = REGISTRY.lookup(&HostType::class("Line")).unwrap();
        assert_eq!(
            Err(Error::NoMemberSerializer {
                ty: HostType::class("Line"),
                member: "Price".to_string(),
                known: vec!["Sku".to_string(), "Quantity".to_string()],
            }),
            line.member("Price").map(|_| ())
        );
    }

    #[test]
    fn unmapped_class() {
        assert_eq!(
            Err(Error::UnmappedType(HostType::class("Missing"))),
            REGISTRY.lookup(&HostType::class("Missing")).map(|_| ())
        );
    }

    #[test]
    fn recursive_class_maps_are_rejected() {
        let actual = StandardSerializerRegistry::new(vec![ClassMap {
            name: "Node".to_string(),
            members: vec![member("Next", None, HostType::class("Node"))],
        }]);
        assert_eq!(
            Err(Error::RecursiveClassMap("Node".to_string())),
            actual.map(|_| ())
        );
    }

    #[test]
    fn serializers_compare_by_type_and_representation() {
        let a = REGISTRY.lookup(&HostType::String).unwrap();
        let b: SerializerRef = std::sync::Arc::new(PrimitiveSerializer::new(HostType::String));
        let c: SerializerRef = std::sync::Arc::new(PrimitiveSerializer::with_representation(
            HostType::String,
            BsonRepresentation::Int32,
        ));
        assert!(a == b);
        assert!(a != c);
    }
}
