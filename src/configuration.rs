use std::collections::BTreeMap;

use serde_derive::Deserialize;

use crate::node::{HttpMethod, ParamMap, Params};

#[derive(Clone, Debug, Deserialize)]
pub struct FuzzConfig {
    pub target: TargetOptions,

    pub payloads: PayloadOptions,

    #[serde(default)]
    pub mutation: MutationOptions,

    #[serde(default)]
    pub generation: GenerationOptions,
}

/// Seed request the driver starts fuzzing from.
#[derive(Clone, Debug, Deserialize)]
pub struct TargetOptions {
    pub url: String,
    pub method: HttpMethod,

    #[serde(default)]
    pub query: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub body: BTreeMap<String, Vec<String>>,
}

impl TargetOptions {
    pub fn params(&self) -> Params {
        Params {
            query: self.query.clone().into_iter().collect::<ParamMap>(),
            body: self.body.clone().into_iter().collect::<ParamMap>(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PayloadOptions {
    pub directory: String,

    #[serde(default)]
    pub xss: XssWeights,

    #[serde(default)]
    pub syntax: SyntaxWeights,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct XssWeights {
    pub attributes: u32,
    pub dirty: u32,
    pub well_formed: u32,
}

impl Default for XssWeights {
    fn default() -> Self {
        XssWeights {
            attributes: 30,
            dirty: 50,
            well_formed: 20,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SyntaxWeights {
    pub html: u32,
    pub php: u32,
    pub js: u32,
}

impl Default for SyntaxWeights {
    fn default() -> Self {
        SyntaxWeights {
            html: 30,
            php: 30,
            js: 40,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct MutationOptions {
    #[serde(default)]
    pub strategies: StrategyWeights,

    /// weight of the per-parameter path against cross_over
    pub per_param: u32,
    pub cross_over: u32,
}

impl Default for MutationOptions {
    fn default() -> Self {
        MutationOptions {
            strategies: StrategyWeights::default(),
            per_param: 80,
            cross_over: 20,
        }
    }
}

// Nominal weights sum to 110, not 100. Selection normalizes by the actual
// sum, so these are relative masses, not percentages.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct StrategyWeights {
    pub skip: u32,
    pub alter_type: u32,
    pub random_text: u32,
    pub syntax_token: u32,
    pub xss_payload: u32,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        StrategyWeights {
            skip: 10,
            alter_type: 10,
            random_text: 50,
            syntax_token: 10,
            xss_payload: 30,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct GenerationOptions {
    /// how many mutated requests to produce
    pub count: usize,

    /// fixed rng seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,

    /// print this many trailing log lines after the run
    #[serde(default)]
    pub log_tail: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            count: 16,
            seed: None,
            log_tail: 0,
        }
    }
}

pub enum ConfigReadError {
    ReadError(std::io::Error),
    ParseError(toml::de::Error),
}

pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> Result<FuzzConfig, ConfigReadError> {
    let config = std::fs::read_to_string(path).map_err(ConfigReadError::ReadError)?;

    toml::from_str::<FuzzConfig>(&config).map_err(ConfigReadError::ParseError)
}
