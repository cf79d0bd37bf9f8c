use serde::Deserialize;

use presspass_lib::sec::authn::totp::Algo;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub issuer: Option<String>,
    pub totp: Option<Totp>,
    pub recovery: Option<Recovery>,
    pub password: Option<Password>,
    pub store: Option<Store>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Totp {
    pub algo: Option<Algo>,
    pub digits: Option<u32>,
    pub step: Option<u64>,
    pub window: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Recovery {
    pub count: Option<usize>,
    pub digits: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Password {
    pub mem_cost: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Store {
    pub write_attempts: Option<u32>,
}
