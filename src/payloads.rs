use std::path::Path;

use anyhow::Context;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::configuration::{SyntaxWeights, XssWeights};

/// A named group of literal payload strings with a relative weight.
#[derive(Clone, Debug)]
pub struct Category {
    pub name: String,
    pub weight: u32,
    pub payloads: Vec<String>,
}

impl Category {
    pub fn new(name: &str, weight: u32, payloads: Vec<String>) -> Self {
        Category {
            name: name.to_string(),
            weight,
            payloads,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload collection contains no categories")]
    NoCategories,

    #[error("payload category {0:?} contains no payloads")]
    EmptyCategory(String),

    #[error("payload category weights sum to zero")]
    ZeroTotalWeight,
}

/// Weighted sampler over payload categories. Built once from configuration
/// and immutable afterwards; an empty category is a configuration error,
/// not something to recover from at sampling time.
#[derive(Clone, Debug)]
pub struct PayloadCollection {
    categories: Vec<Category>,
    distribution: WeightedIndex<u32>,
}

impl PayloadCollection {
    pub fn new(categories: Vec<Category>) -> Result<Self, PayloadError> {
        if categories.is_empty() {
            return Err(PayloadError::NoCategories);
        }

        for category in &categories {
            if category.payloads.is_empty() {
                return Err(PayloadError::EmptyCategory(category.name.clone()));
            }
        }

        let distribution = WeightedIndex::new(categories.iter().map(|c| c.weight))
            .map_err(|_| PayloadError::ZeroTotalWeight)?;

        Ok(PayloadCollection {
            categories,
            distribution,
        })
    }

    /// Weighted draw of a category, then a uniform draw within it.
    pub fn sample(&self, rng: &mut dyn RngCore) -> &str {
        let category = &self.categories[self.distribution.sample(rng)];
        &category.payloads[rng.gen_range(0..category.payloads.len())]
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

/// One payload per non-empty line.
pub fn read_payload_file(path: &Path) -> Result<Vec<String>, anyhow::Error> {
    let content = std::fs::read_to_string(path).context(format!(
        "trying to read payload file {}",
        path.to_string_lossy()
    ))?;

    Ok(content
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn load_category(directory: &Path, name: &str, weight: u32) -> Result<Category, anyhow::Error> {
    let payloads = read_payload_file(&directory.join(name))?;
    Ok(Category::new(name, weight, payloads))
}

pub fn load_xss_collection(
    directory: &Path,
    weights: &XssWeights,
) -> Result<PayloadCollection, anyhow::Error> {
    let directory = directory.join("xss");

    PayloadCollection::new(vec![
        load_category(&directory, "attributes", weights.attributes)?,
        load_category(&directory, "dirty", weights.dirty)?,
        load_category(&directory, "well_formed", weights.well_formed)?,
    ])
    .context("building xss payload collection")
}

pub fn load_syntax_collection(
    directory: &Path,
    weights: &SyntaxWeights,
) -> Result<PayloadCollection, anyhow::Error> {
    let directory = directory.join("syntax");

    PayloadCollection::new(vec![
        load_category(&directory, "html", weights.html)?,
        load_category(&directory, "php", weights.php)?,
        load_category(&directory, "js", weights.js)?,
    ])
    .context("building syntax token collection")
}
