use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use presspass_lib::users;

use crate::sec::authn::password::PasswordRecord;

#[derive(Debug, thiserror::Error)]
pub enum UserDataError {
    #[error("invalid username")]
    Username,

    #[error("invalid display name")]
    Name,

    #[error("invalid email address")]
    Email,
}

/// the durable credential record. owned by the credential store; the
/// engine only ever reads or rewrites it through that store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCredential {
    pub username: String,
    pub auth: PasswordRecord,
    pub role: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa: Option<Mfa>,
}

impl UserCredential {
    pub fn new<R, N, E>(
        username: String,
        auth: PasswordRecord,
        role: R,
        name: N,
        email: E,
    ) -> Result<Self, UserDataError>
    where
        R: Into<String>,
        N: Into<String>,
        E: Into<String>,
    {
        if !users::username_valid(&username) {
            return Err(UserDataError::Username);
        }

        let name = name.into();

        if !users::display_name_valid(&name) {
            return Err(UserDataError::Name);
        }

        let email = email.into();

        if !users::email_valid(&email) {
            return Err(UserDataError::Email);
        }

        Ok(UserCredential {
            username,
            auth,
            role: role.into(),
            name,
            email,
            mfa: None,
        })
    }

    pub fn mfa_enabled(&self) -> bool {
        self.mfa.as_ref().map(|mfa| mfa.enabled).unwrap_or(false)
    }

    /// projection safe to hand back to callers. never carries the password
    /// record or the totp secret.
    pub fn profile(&self) -> Profile {
        Profile {
            username: self.username.clone(),
            role: self.role.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mfa {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default)]
    pub recovery_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_recovery_used_at: Option<DateTime<Utc>>,
}

impl Mfa {
    pub fn enable(secret: String, recovery_codes: Vec<String>) -> Self {
        Mfa {
            enabled: true,
            secret: Some(secret),
            recovery_codes,
            enabled_at: Some(Utc::now()),
            disabled_at: None,
            last_recovery_used_at: None,
        }
    }

    /// disabling clears the secret and any remaining recovery codes so a
    /// disabled record can never satisfy a verify step.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.secret = None;
        self.recovery_codes.clear();
        self.disabled_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub role: String,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_user() -> UserCredential {
        UserCredential::new(
            String::from("night_editor"),
            PasswordRecord::from(String::from("plain text password")),
            "editor",
            "Night Editor",
            "editor@example.com",
        ).unwrap()
    }

    #[test]
    fn new_rejects_bad_fields() {
        let auth = PasswordRecord::from(String::from("plain text password"));

        assert!(matches!(
            UserCredential::new(String::from("bad name"), auth.clone(), "e", "Name", "e@example.com"),
            Err(UserDataError::Username)
        ));
        assert!(matches!(
            UserCredential::new(String::from("user"), auth.clone(), "e", " Name", "e@example.com"),
            Err(UserDataError::Name)
        ));
        assert!(matches!(
            UserCredential::new(String::from("user"), auth, "e", "Name", "not-an-email"),
            Err(UserDataError::Email)
        ));
    }

    #[test]
    fn disable_clears_secret_and_codes() {
        let mut mfa = Mfa::enable(
            String::from("GEZDGNBVGY3TQOJQ"),
            vec![String::from("00731842")],
        );

        mfa.disable();

        assert!(!mfa.enabled);
        assert!(mfa.secret.is_none());
        assert!(mfa.recovery_codes.is_empty());
        assert!(mfa.disabled_at.is_some());
    }

    #[test]
    fn record_round_trips_unchanged() {
        let mut user = test_user();
        user.mfa = Some(Mfa::enable(
            String::from("GEZDGNBVGY3TQOJQ"),
            vec![String::from("00731842"), String::from("91230057")],
        ));

        let encoded = serde_json::to_string(&user).unwrap();
        let decoded: UserCredential = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, user);
    }

    #[test]
    fn profile_excludes_credentials() {
        let user = test_user();
        let value = serde_json::to_value(user.profile()).unwrap();
        let mut keys: Vec<&str> = value.as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        keys.sort_unstable();

        assert_eq!(keys, ["email", "name", "role", "username"]);
    }
}
