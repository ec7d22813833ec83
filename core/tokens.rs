use crate::error::{AppError, Result};
use log;
use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model};

/// Approximate token counter. The reference tokenizer is picked by model
/// name; the raw count is scaled by `correction_factor` to approximate a
/// different target model's density. Only fit for threshold comparisons.
pub struct TokenEstimator {
    bpe: CoreBPE,
    model: String,
    correction_factor: f64,
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("model", &self.model)
            .field("correction_factor", &self.correction_factor)
            .finish_non_exhaustive()
    }
}

impl TokenEstimator {
    /// Unknown model names fall back to `cl100k_base`.
    pub fn for_model(model: &str, correction_factor: f64) -> Result<Self> {
        if !(correction_factor.is_finite() && correction_factor > 0.0) {
            return Err(AppError::InvalidArgument(format!(
                "Token correction factor must be positive, got {}",
                correction_factor
            )));
        }
        let bpe = match get_bpe_from_model(model) {
            Ok(bpe) => {
                log::debug!("Using tokenizer for model '{}'", model);
                bpe
            }
            Err(e) => {
                log::debug!(
                    "No tokenizer for model '{}' ({}), falling back to cl100k_base",
                    model,
                    e
                );
                cl100k_base().map_err(|e| AppError::TikToken(e.to_string()))?
            }
        };
        Ok(Self {
            bpe,
            model: model.to_string(),
            correction_factor,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn raw_count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }

    /// Raw count scaled by the correction factor, rounded up.
    pub fn estimate(&self, text: &str) -> usize {
        let raw = self.raw_count(text);
        if raw == 0 {
            return 0;
        }
        (raw as f64 * self.correction_factor).ceil() as usize
    }
}
