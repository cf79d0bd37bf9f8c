use std::path::{Path, PathBuf};

use presspass_lib::sec::authn::totp::{self, Algo};
use presspass_lib::sec::authn::totp::recovery;
use presspass_lib::users;

use crate::sec::authn::password;

mod shape;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed opening config file \"{path}\"")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing config file \"{path}\"")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unknown type of config file \"{path}\"")]
    UnknownFormat {
        path: PathBuf,
    },

    #[error("invalid setting \"{name}\"")]
    InvalidSetting {
        name: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// issuer label stamped into provisioning uris.
    pub issuer: String,
    pub totp: Totp,
    pub recovery: Recovery,
    pub password: Password,
    pub store: Store,
}

#[derive(Debug, Clone)]
pub struct Totp {
    pub algo: Algo,
    pub digits: u32,
    pub step: u64,
    /// accepted steps of clock drift on each side of the current one.
    pub window: u64,
}

#[derive(Debug, Clone)]
pub struct Recovery {
    pub count: usize,
    pub digits: u32,
}

#[derive(Debug, Clone)]
pub struct Password {
    pub mem_cost: u32,
}

#[derive(Debug, Clone)]
pub struct Store {
    /// bounded retries for version-conflicted writes before the engine
    /// reports the store unavailable.
    pub write_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            issuer: String::from("pressroom"),
            totp: Totp {
                algo: Algo::SHA1,
                digits: 6,
                step: 30,
                window: 2,
            },
            recovery: Recovery {
                count: 10,
                digits: 8,
            },
            password: Password {
                mem_cost: password::DEFAULT_MEM_COST,
            },
            store: Store {
                write_attempts: 3,
            },
        }
    }
}

impl Settings {
    pub fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>
    {
        let mut settings = Settings::default();

        settings.merge(Self::load_file(path.as_ref())?);
        settings.validate()?;

        Ok(settings)
    }

    fn load_file(path: &Path) -> Result<shape::Settings, ConfigError> {
        let Some(ext) = path.extension() else {
            return Err(ConfigError::UnknownFormat { path: path.to_owned() });
        };

        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|err| ConfigError::Io {
                path: path.to_owned(),
                source: err,
            })?;
        let reader = std::io::BufReader::new(file);

        let ext = ext.to_ascii_lowercase();

        if ext.eq("yaml") || ext.eq("yml") {
            serde_yaml::from_reader(reader).map_err(|err| ConfigError::Parse {
                path: path.to_owned(),
                source: err.into(),
            })
        } else if ext.eq("json") {
            serde_json::from_reader(reader).map_err(|err| ConfigError::Parse {
                path: path.to_owned(),
                source: err.into(),
            })
        } else {
            Err(ConfigError::UnknownFormat { path: path.to_owned() })
        }
    }

    fn merge(&mut self, loaded: shape::Settings) {
        if let Some(issuer) = loaded.issuer {
            self.issuer = issuer;
        }

        if let Some(totp) = loaded.totp {
            if let Some(algo) = totp.algo {
                self.totp.algo = algo;
            }

            if let Some(digits) = totp.digits {
                self.totp.digits = digits;
            }

            if let Some(step) = totp.step {
                self.totp.step = step;
            }

            if let Some(window) = totp.window {
                self.totp.window = window;
            }
        }

        if let Some(recovery) = loaded.recovery {
            if let Some(count) = recovery.count {
                self.recovery.count = count;
            }

            if let Some(digits) = recovery.digits {
                self.recovery.digits = digits;
            }
        }

        if let Some(password) = loaded.password {
            if let Some(mem_cost) = password.mem_cost {
                self.password.mem_cost = mem_cost;
            }
        }

        if let Some(store) = loaded.store {
            if let Some(write_attempts) = store.write_attempts {
                self.store.write_attempts = write_attempts;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !users::username_valid(&self.issuer) {
            return Err(ConfigError::InvalidSetting { name: "issuer" });
        }

        if !totp::digits_valid(&self.totp.digits) {
            return Err(ConfigError::InvalidSetting { name: "totp.digits" });
        }

        if !totp::step_valid(&self.totp.step) {
            return Err(ConfigError::InvalidSetting { name: "totp.step" });
        }

        if !totp::window_valid(&self.totp.window) {
            return Err(ConfigError::InvalidSetting { name: "totp.window" });
        }

        if !recovery::count_valid(&self.recovery.count) {
            return Err(ConfigError::InvalidSetting { name: "recovery.count" });
        }

        if !recovery::digits_valid(&self.recovery.digits) {
            return Err(ConfigError::InvalidSetting { name: "recovery.digits" });
        }

        if self.password.mem_cost < 1024 {
            return Err(ConfigError::InvalidSetting { name: "password.mem_cost" });
        }

        if self.store.write_attempts == 0 {
            return Err(ConfigError::InvalidSetting { name: "store.write_attempts" });
        }

        Ok(())
    }
}
