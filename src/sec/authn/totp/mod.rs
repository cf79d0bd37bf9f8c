use std::time::{SystemTime, UNIX_EPOCH};

use subtle::{Choice, ConstantTimeEq};

use presspass_lib::sec::authn::totp as rules;
use presspass_lib::sec::secret;

pub mod hotp;
pub mod recovery;

pub use presspass_lib::sec::authn::totp::Algo;

pub fn create_secret() -> String {
    secret::generate(secret::SECRET_LEN)
}

/// uri consumed by authenticator apps. the shape is fixed; changing it
/// breaks enrollment in third-party clients.
pub fn provisioning_uri(issuer: &str, username: &str, secret: &str) -> String {
    format!("otpauth://totp/{issuer}:{username}?secret={secret}&issuer={issuer}")
}

#[derive(Debug, Clone)]
pub struct TotpSettings {
    pub algo: Algo,
    pub secret: Vec<u8>,
    pub digits: u32,
    pub step: u64,
    pub window_before: u64,
    pub window_after: u64,
    /// unix timestamp override. `None` reads the system clock.
    pub now: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyResult {
    Valid,
    Invalid,
}

fn unix_now() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs(),
        Err(_) => {
            tracing::warn!("system clock reads before the unix epoch");

            0
        }
    }
}

/// checks the supplied code against every counter inside the drift
/// window. candidates are compared in constant time and the match result
/// is accumulated so a hit does not end the scan early.
pub fn verify_code<C>(settings: &TotpSettings, code: C) -> VerifyResult
where
    C: AsRef<str>
{
    let given = code.as_ref();

    if !rules::code_valid(given, settings.digits) {
        return VerifyResult::Invalid;
    }

    let now = settings.now.unwrap_or_else(unix_now);
    let counter = now / settings.step;
    let first = counter.saturating_sub(settings.window_before);
    let last = counter.saturating_add(settings.window_after);

    let mut matched = Choice::from(0u8);

    for candidate in first..=last {
        let expected = hotp::compute(&settings.algo, &settings.secret, candidate, settings.digits);

        matched |= expected.as_bytes().ct_eq(given.as_bytes());
    }

    if matched.into() {
        VerifyResult::Valid
    } else {
        VerifyResult::Invalid
    }
}
