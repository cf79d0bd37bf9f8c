use presspass_lib::sec::secret::InvalidSecretFormat;

use crate::sec::authn::password::PasswordError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// a totp secret that does not decode. for stored records this means
    /// the record is corrupted, not that the caller guessed wrong.
    #[error(transparent)]
    Secret(#[from] InvalidSecretFormat),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
