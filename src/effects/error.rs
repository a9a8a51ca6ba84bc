// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::effects::EffectFlags;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EffectError {
    #[error("{effect} does not support {flags:?}")]
    UnsupportedFlags {
        effect: &'static str,
        /// The requested flags outside the effect's supported set.
        flags: EffectFlags,
    },
    #[error("{effect} permutation {permutation} has no shader variant")]
    PermutationOutOfRange {
        effect: &'static str,
        permutation: u32,
    },
    #[error("Can't create pipeline {0}")]
    Pipeline(Box<dyn std::error::Error + Send + Sync>),
}
