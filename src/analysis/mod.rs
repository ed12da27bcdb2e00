//! Analysis stages of the meta-analysis pipeline.
//!
//! 1. **Effect calculation** ([`effects`]): raw study data to a common
//!    effect size with variance
//! 2. **Pooling** ([`pooling`]): fixed-effect and DerSimonian-Laird
//!    random-effects combination
//! 3. **Heterogeneity** ([`heterogeneity`]): Q, I squared, chi-squared
//!    p-value
//! 4. **Sensitivity** (`sensitivity`): subgroup and leave-one-out
//!    re-analyses
//! 5. **Publication bias** ([`bias`]): Egger funnel-asymmetry regression

pub mod bias;
pub mod effects;
pub mod heterogeneity;
pub mod pooling;
pub(crate) mod sensitivity;

pub use bias::eggers_test;
pub use effects::compute_effect;
pub use pooling::{model_weights, pool};

use std::collections::BTreeMap;

use crate::result::EffectEstimate;

/// One validated study in the analysis arena: identifier, covariates, and
/// the computed per-study estimate. Sub-analyses operate on read-only index
/// subsets of a slice of these.
#[derive(Debug, Clone)]
pub(crate) struct StudyEffect {
    pub study_id: String,
    pub covariates: BTreeMap<String, String>,
    pub estimate: EffectEstimate,
}
