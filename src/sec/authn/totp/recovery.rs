use rand::Rng;
use subtle::ConstantTimeEq;

pub fn create_code(digits: u32) -> String {
    let bound = 10u64.pow(digits);
    let value = rand::thread_rng().gen_range(0..bound);

    format!("{:0>width$}", value, width = digits as usize)
}

/// mints a batch of single-use recovery codes, retrying on the rare
/// intra-batch collision. collisions with previously issued batches do
/// not matter since regeneration discards the old batch.
pub fn generate(count: usize, digits: u32) -> Vec<String> {
    let mut batch: Vec<String> = Vec::with_capacity(count);

    while batch.len() < count {
        let code = create_code(digits);

        if batch.iter().any(|existing| *existing == code) {
            continue;
        }

        batch.push(code);
    }

    batch
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeResult {
    pub consumed: bool,
    pub remaining: usize,
}

/// removes exactly one entry matching `given`, or leaves the sequence
/// untouched. the scan compares every entry in constant time. callers own
/// making the removal durable atomically.
pub fn consume(codes: &mut Vec<String>, given: &str) -> ConsumeResult {
    let mut found = None;

    for (index, code) in codes.iter().enumerate() {
        let matches = bool::from(code.as_bytes().ct_eq(given.as_bytes()));

        if matches && found.is_none() {
            found = Some(index);
        }
    }

    if let Some(index) = found {
        codes.remove(index);

        ConsumeResult {
            consumed: true,
            remaining: codes.len(),
        }
    } else {
        ConsumeResult {
            consumed: false,
            remaining: codes.len(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use presspass_lib::sec::authn::totp::recovery::code_valid;

    #[test]
    fn batch_is_unique_and_numeric() {
        let batch = generate(10, 8);

        assert_eq!(batch.len(), 10);

        for (index, code) in batch.iter().enumerate() {
            assert!(code_valid(code, 8), "bad code {:?}", code);
            assert!(
                !batch[index + 1..].contains(code),
                "duplicate code {:?}", code
            );
        }
    }

    #[test]
    fn consume_removes_exactly_one() {
        let mut codes = generate(10, 8);
        let chosen = codes[4].clone();

        let result = consume(&mut codes, &chosen);

        assert!(result.consumed);
        assert_eq!(result.remaining, 9);
        assert_eq!(codes.len(), 9);
        assert!(!codes.contains(&chosen));
    }

    #[test]
    fn second_consume_of_same_code_fails() {
        let mut codes = generate(3, 8);
        let chosen = codes[0].clone();

        assert!(consume(&mut codes, &chosen).consumed);

        let result = consume(&mut codes, &chosen);

        assert!(!result.consumed);
        assert_eq!(result.remaining, 2);
    }

    #[test]
    fn unknown_code_leaves_sequence_unchanged() {
        let mut codes = vec![String::from("00731842")];

        let result = consume(&mut codes, "99999999");

        assert!(!result.consumed);
        assert_eq!(result.remaining, 1);
        assert_eq!(codes, vec![String::from("00731842")]);
    }

    #[test]
    fn empty_sequence_is_a_valid_state() {
        let mut codes: Vec<String> = Vec::new();

        let result = consume(&mut codes, "00731842");

        assert!(!result.consumed);
        assert_eq!(result.remaining, 0);
    }
}
