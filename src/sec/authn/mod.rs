use chrono::Utc;

use presspass_lib::sec::authn::password_valid;
use presspass_lib::sec::secret::{self, InvalidSecretFormat};
use presspass_lib::users;

use crate::config::Settings;
use crate::error::Error;
use crate::store::{CredentialStore, StoreError, VersionedUser};
use crate::user::{Mfa, Profile, UserCredential};

pub mod password;
pub mod totp;

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(Authenticated),
    /// the password held but the record requires a second factor the
    /// request did not carry. a protocol step, not a failure; the caller
    /// resubmits with a code.
    MfaRequired,
    Rejected(RejectedReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated {
    pub profile: Profile,
    pub used_recovery_code: bool,
    /// the password matched over the legacy plaintext path and the
    /// surrounding system should force a hash upgrade.
    pub password_upgrade_required: bool,
}

/// coarse rejection categories. nothing finer leaves the engine, so a
/// caller cannot probe which factor failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedReason {
    UserNotFound,
    BadPassword,
    BadMfaToken,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionOutcome {
    Provisioned {
        secret: String,
        uri: String,
    },
    UserNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnableTotpOutcome {
    Enabled {
        recovery_codes: Vec<String>,
    },
    InvalidToken,
    UserNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableTotpOutcome {
    Disabled,
    UserNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegenerateOutcome {
    Regenerated {
        recovery_codes: Vec<String>,
    },
    NotEnabled,
    UserNotFound,
}

const CONFLICT_EXHAUSTED: &str = "credential record kept conflicting across retries";

pub struct Authenticator<S> {
    store: S,
    settings: Settings,
}

impl<S> Authenticator<S>
where
    S: CredentialStore
{
    pub fn new(store: S, settings: Settings) -> Self {
        Authenticator {
            store,
            settings,
        }
    }

    fn totp_settings(&self, secret: Vec<u8>) -> totp::TotpSettings {
        totp::TotpSettings {
            algo: self.settings.totp.algo,
            secret,
            digits: self.settings.totp.digits,
            step: self.settings.totp.step,
            window_before: self.settings.totp.window,
            window_after: self.settings.totp.window,
            now: None,
        }
    }

    /// an enabled mfa record without a decodable secret is corruption,
    /// surfaced as an error rather than a rejected guess.
    fn mfa_secret(user: &UserCredential) -> Result<Vec<u8>, Error> {
        let encoded = user.mfa.as_ref()
            .and_then(|mfa| mfa.secret.as_deref())
            .ok_or(InvalidSecretFormat)?;

        Ok(secret::decode(encoded)?)
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
        verify: Option<&str>,
    ) -> Result<LoginOutcome, Error> {
        if !users::username_valid(username) {
            return Ok(LoginOutcome::Rejected(RejectedReason::UserNotFound));
        }

        if !password_valid(password) {
            return Ok(LoginOutcome::Rejected(RejectedReason::BadPassword));
        }

        let Some(found) = self.store.get(username).await? else {
            return Ok(LoginOutcome::Rejected(RejectedReason::UserNotFound));
        };

        let check = password::verify(&found.user.auth, password)?;

        if !check.valid {
            return Ok(LoginOutcome::Rejected(RejectedReason::BadPassword));
        }

        if !found.user.mfa_enabled() {
            return Ok(LoginOutcome::Authenticated(Authenticated {
                profile: found.user.profile(),
                used_recovery_code: false,
                password_upgrade_required: check.needs_migration,
            }));
        }

        let Some(given) = verify else {
            return Ok(LoginOutcome::MfaRequired);
        };

        let totp_settings = self.totp_settings(Self::mfa_secret(&found.user)?);

        if let totp::VerifyResult::Valid = totp::verify_code(&totp_settings, given) {
            return Ok(LoginOutcome::Authenticated(Authenticated {
                profile: found.user.profile(),
                used_recovery_code: false,
                password_upgrade_required: check.needs_migration,
            }));
        }

        self.consume_recovery(found, username, given, check.needs_migration).await
    }

    /// the one state transition with a side effect: burning a recovery
    /// code rewrites the record through the store's version check so two
    /// requests presenting the same code cannot both win.
    async fn consume_recovery(
        &self,
        mut current: VersionedUser,
        username: &str,
        given: &str,
        needs_migration: bool,
    ) -> Result<LoginOutcome, Error> {
        let mut attempts = self.settings.store.write_attempts;

        loop {
            let Some(mfa) = current.user.mfa.as_mut().filter(|mfa| mfa.enabled) else {
                return Ok(LoginOutcome::Rejected(RejectedReason::BadMfaToken));
            };

            let result = totp::recovery::consume(&mut mfa.recovery_codes, given);

            if !result.consumed {
                return Ok(LoginOutcome::Rejected(RejectedReason::BadMfaToken));
            }

            mfa.last_recovery_used_at = Some(Utc::now());

            let profile = current.user.profile();

            match self.store.put(username, current.user, current.version).await {
                Ok(_) => {
                    tracing::debug!(remaining = result.remaining, "recovery code consumed");

                    return Ok(LoginOutcome::Authenticated(Authenticated {
                        profile,
                        used_recovery_code: true,
                        password_upgrade_required: needs_migration,
                    }));
                },
                Err(StoreError::Conflict) => {
                    attempts -= 1;

                    if attempts == 0 {
                        return Err(Error::Store(StoreError::Unavailable(CONFLICT_EXHAUSTED.into())));
                    }

                    tracing::warn!("credential record conflict, retrying recovery consumption");

                    let Some(fresh) = self.store.get(username).await? else {
                        return Ok(LoginOutcome::Rejected(RejectedReason::UserNotFound));
                    };

                    current = fresh;
                },
                Err(err) => {
                    return Err(Error::Store(err));
                }
            }
        }
    }

    /// mints a fresh secret and its enrollment uri. nothing is persisted;
    /// the secret only reaches the record through `enable_totp`.
    pub async fn provision(&self, username: &str) -> Result<ProvisionOutcome, Error> {
        if self.store.get(username).await?.is_none() {
            return Ok(ProvisionOutcome::UserNotFound);
        }

        let secret = totp::create_secret();
        let uri = totp::provisioning_uri(&self.settings.issuer, username, &secret);

        Ok(ProvisionOutcome::Provisioned {
            secret,
            uri,
        })
    }

    pub async fn enable_totp(
        &self,
        username: &str,
        encoded_secret: &str,
        confirm: &str,
    ) -> Result<EnableTotpOutcome, Error> {
        let secret_bytes = secret::decode(encoded_secret)?;

        let Some(current) = self.store.get(username).await? else {
            return Ok(EnableTotpOutcome::UserNotFound);
        };

        let totp_settings = self.totp_settings(secret_bytes);

        let totp::VerifyResult::Valid = totp::verify_code(&totp_settings, confirm) else {
            return Ok(EnableTotpOutcome::InvalidToken);
        };

        let recovery_codes = totp::recovery::generate(
            self.settings.recovery.count,
            self.settings.recovery.digits,
        );

        let enabled = Mfa::enable(encoded_secret.to_owned(), recovery_codes.clone());

        let wrote = self.persist(username, current, |user| {
            user.mfa = Some(enabled.clone());
        }).await?;

        if !wrote {
            return Ok(EnableTotpOutcome::UserNotFound);
        }

        tracing::info!(username, algo = self.settings.totp.algo.as_str(), "totp enabled");

        Ok(EnableTotpOutcome::Enabled {
            recovery_codes,
        })
    }

    pub async fn disable_totp(&self, username: &str) -> Result<DisableTotpOutcome, Error> {
        let Some(current) = self.store.get(username).await? else {
            return Ok(DisableTotpOutcome::UserNotFound);
        };

        if current.user.mfa.is_none() {
            return Ok(DisableTotpOutcome::Disabled);
        }

        let wrote = self.persist(username, current, |user| {
            if let Some(mfa) = user.mfa.as_mut() {
                mfa.disable();
            }
        }).await?;

        if !wrote {
            return Ok(DisableTotpOutcome::UserNotFound);
        }

        tracing::info!(username, "totp disabled");

        Ok(DisableTotpOutcome::Disabled)
    }

    /// replaces the outstanding batch; codes already burned stay burned
    /// and the old batch is discarded wholesale.
    pub async fn regenerate_recovery(&self, username: &str) -> Result<RegenerateOutcome, Error> {
        let Some(current) = self.store.get(username).await? else {
            return Ok(RegenerateOutcome::UserNotFound);
        };

        if !current.user.mfa_enabled() {
            return Ok(RegenerateOutcome::NotEnabled);
        }

        let recovery_codes = totp::recovery::generate(
            self.settings.recovery.count,
            self.settings.recovery.digits,
        );

        let replacement = recovery_codes.clone();

        let wrote = self.persist(username, current, move |user| {
            if let Some(mfa) = user.mfa.as_mut().filter(|mfa| mfa.enabled) {
                mfa.recovery_codes = replacement.clone();
            }
        }).await?;

        if !wrote {
            return Ok(RegenerateOutcome::UserNotFound);
        }

        tracing::info!(username, "recovery codes regenerated");

        Ok(RegenerateOutcome::Regenerated {
            recovery_codes,
        })
    }

    /// version-checked write with bounded retries; reloads the record on
    /// conflict and reapplies `apply` to the fresh copy. `Ok(false)` means
    /// the record disappeared while retrying.
    async fn persist<F>(
        &self,
        username: &str,
        mut current: VersionedUser,
        mut apply: F,
    ) -> Result<bool, Error>
    where
        F: FnMut(&mut UserCredential)
    {
        let mut attempts = self.settings.store.write_attempts;

        loop {
            let mut user = current.user.clone();

            apply(&mut user);

            match self.store.put(username, user, current.version).await {
                Ok(_) => {
                    return Ok(true);
                },
                Err(StoreError::Conflict) => {
                    attempts -= 1;

                    if attempts == 0 {
                        return Err(Error::Store(StoreError::Unavailable(CONFLICT_EXHAUSTED.into())));
                    }

                    tracing::warn!("credential record conflict, retrying write");

                    match self.store.get(username).await? {
                        Some(fresh) => {
                            current = fresh;
                        },
                        None => {
                            return Ok(false);
                        }
                    }
                },
                Err(err) => {
                    return Err(Error::Store(err));
                }
            }
        }
    }
}
