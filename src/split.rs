// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Signer-disjoint train/validation splitting.

use std::collections::HashSet;

use crate::corpus::Corpus;
use crate::warn;

/// Split a corpus by signer identity.
///
/// Samples whose signer is in `held_out` go to the validation corpus, all others to
/// the training corpus. Both outputs share the input's samples and retrieval
/// settings; the training corpus is augmentation-enabled and the validation corpus
/// is not. Sample order is preserved within each output.
///
/// # Arguments
///
/// * `corpus` - Corpus to split.
/// * `held_out` - Signer identities reserved for validation.
///
/// # Returns
///
/// * `(train, validation)` corpora with disjoint signer sets whose union is the
///   input's signer set.
#[must_use]
pub fn split_by_signer(corpus: &Corpus, held_out: &HashSet<u64>) -> (Corpus, Corpus) {
    let (validation, train): (Vec<_>, Vec<_>) = corpus
        .samples()
        .iter()
        .cloned()
        .partition(|sample| held_out.contains(&sample.signer()));

    let present = corpus.signers();
    let mut unknown: Vec<u64> = held_out
        .iter()
        .copied()
        .filter(|signer| !present.contains(signer))
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        warn!("held-out signers {unknown:?} do not appear in the corpus");
    }

    (corpus.share(train, true), corpus.share(validation, false))
}
