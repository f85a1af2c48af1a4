use super::{UserError, UserErrorDisplay};

#[derive(Debug, PartialEq, UserErrorDisplay)]
enum Test {
    Foo,
    Bar,
}

impl UserError for Test {
    fn code(&self) -> u32 {
        match self {
            Test::Foo => 1,
            Test::Bar => 2,
        }
    }

    fn user_message(&self) -> Option<String> {
        match self {
            Test::Foo => Some(format!("{self:?}")),
            Test::Bar => None,
        }
    }

    fn technical_message(&self) -> String {
        match self {
            Test::Foo => "technically a foo".to_string(),
            Test::Bar => "technically a bar".to_string(),
        }
    }
}

mod usererror {
    use super::{Test, UserError};

    #[test]
    fn user_error_codes() {
        assert_eq!(1, Test::Foo.code());
        assert_eq!(2, Test::Bar.code());
    }

    #[test]
    fn display_with_user_message() {
        assert_eq!(
            "Error 1: Foo\n\tCaused by:\n\ttechnically a foo",
            Test::Foo.to_string()
        );
    }

    #[test]
    fn display_without_user_message() {
        assert_eq!("Error 2: technically a bar", Test::Bar.to_string());
    }
}
