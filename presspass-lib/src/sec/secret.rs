use data_encoding::BASE32_NOPAD;
use rand::Rng;

/// RFC 4648 base32 alphabet shared secrets are written in.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// default secret length in base32 characters. 16 characters carry 80 bits.
pub const SECRET_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
#[error("invalid base32 secret format")]
pub struct InvalidSecretFormat;

/// decodes a base32 secret into raw bytes.
///
/// input is case-insensitive; ascii whitespace and trailing padding are
/// stripped before decoding. anything else outside the alphabet fails.
pub fn decode<S>(secret: S) -> Result<Vec<u8>, InvalidSecretFormat>
where
    S: AsRef<str>
{
    let given = secret.as_ref();
    let mut normalized = String::with_capacity(given.len());

    for ch in given.chars() {
        if ch.is_ascii_whitespace() {
            continue;
        }

        normalized.push(ch.to_ascii_uppercase());
    }

    let trimmed = normalized.trim_end_matches('=');

    BASE32_NOPAD.decode(trimmed.as_bytes())
        .map_err(|_| InvalidSecretFormat)
}

pub fn encode(bytes: &[u8]) -> String {
    BASE32_NOPAD.encode(bytes)
}

/// produces a secret of `length` characters drawn uniformly from the
/// base32 alphabet.
pub fn generate(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut rtn = String::with_capacity(length);

    for _ in 0..length {
        let index = rng.gen_range(0..ALPHABET.len());

        rtn.push(ALPHABET[index] as char);
    }

    rtn
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_known_vector() {
        let decoded = decode("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ")
            .expect("known secret failed to decode");

        assert_eq!(decoded, b"12345678901234567890");
        assert_eq!(encode(&decoded), "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
    }

    #[test]
    fn decode_normalizes_input() {
        let canonical = decode("GEZDGNBVGY3TQOJQ").unwrap();

        assert_eq!(decode("gezdgnbvgy3tqojq").unwrap(), canonical);
        assert_eq!(decode("GEZD GNBV GY3T QOJQ").unwrap(), canonical);
        assert_eq!(decode("GEZDGNBVGY3TQOJQ====").unwrap(), canonical);
    }

    #[test]
    fn decode_rejects_invalid_chars() {
        let invalid = vec![
            "GEZDGNBVGY3TQOJ1",
            "GEZDGNBVGY3TQOJ!",
            "0EZDGNBVGY3TQOJQ",
        ];

        for test in invalid {
            assert!(decode(test).is_err(), "invalid secret decoded {:?}", test);
        }
    }

    #[test]
    fn generate_length_and_alphabet() {
        for length in [SECRET_LEN, 32] {
            let secret = generate(length);

            assert_eq!(secret.len(), length);
            assert!(secret.bytes().all(|b| ALPHABET.contains(&b)));
            assert!(decode(&secret).is_ok());
        }
    }
}
