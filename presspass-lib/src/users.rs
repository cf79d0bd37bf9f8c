use email_address::EmailAddress;

use crate::validation::{check_control_whitespace, check_control_leading_trailing};

pub const MAX_USERNAME_CHARS: usize = 128;
pub const MAX_NAME_CHARS: usize = 256;

pub fn username_valid<G>(given: G) -> bool
where
    G: AsRef<str>
{
    !given.as_ref().is_empty() && check_control_whitespace(given, Some(MAX_USERNAME_CHARS))
}

pub fn display_name_valid<G>(given: G) -> bool
where
    G: AsRef<str>
{
    !given.as_ref().is_empty() && check_control_leading_trailing(given, Some(MAX_NAME_CHARS))
}

pub fn email_valid<G>(given: G) -> bool
where
    G: AsRef<str>
{
    EmailAddress::is_valid(given.as_ref())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn username_validation() {
        let valid = vec![
            String::from("night_editor"),
            String::from("desk-04"),
        ];

        for test in valid {
            assert!(username_valid(&test), "valid string failed {:?}", test);
        }

        let invalid = vec![
            String::new(),
            String::from("night editor"),
            String::from("desk\u{0000}04"),
            crate::string_to_len(MAX_USERNAME_CHARS + 1),
        ];

        for test in invalid {
            assert!(!username_valid(&test), "invalid string failed {:?}", test);
        }
    }

    #[test]
    fn display_name_validation() {
        let valid = vec![
            String::from("Night Editor"),
            String::from("Desk 04"),
        ];

        for test in valid {
            assert!(display_name_valid(&test), "valid string failed {:?}", test);
        }

        let invalid = vec![
            String::new(),
            String::from(" Night Editor"),
            String::from("Night Editor "),
            crate::string_to_len(MAX_NAME_CHARS + 1),
        ];

        for test in invalid {
            assert!(!display_name_valid(&test), "invalid string failed {:?}", test);
        }
    }

    #[test]
    fn email_validation() {
        assert!(email_valid("editor@example.com"));
        assert!(!email_valid("editor"));
        assert!(!email_valid("editor@"));
    }
}
