pub mod totp;

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 512;

pub fn password_valid<G>(given: G) -> bool
where
    G: AsRef<str>
{
    let mut char_count = 0;

    for ch in given.as_ref().chars() {
        if ch.is_control() {
            return false;
        }

        char_count += 1;

        if char_count > MAX_PASSWORD_CHARS {
            return false;
        }
    }

    char_count >= MIN_PASSWORD_CHARS
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn password_validation() {
        let valid = vec![
            String::from("Sharper Snowboard Equinox Faucet Monoxide0"),
            String::from("pressroom!"),
        ];

        for test in valid {
            assert!(password_valid(&test), "valid string failed {:?}", test);
        }

        let invalid = vec![
            String::from("short"),
            String::from("password \u{0000} stuff"),
            crate::string_to_len(MIN_PASSWORD_CHARS - 1),
            crate::string_to_len(MAX_PASSWORD_CHARS + 1),
        ];

        for test in invalid {
            assert!(!password_valid(&test), "invalid string failed {:?}", test);
        }
    }
}
