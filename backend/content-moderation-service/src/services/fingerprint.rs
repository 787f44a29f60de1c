use crate::models::SubmitContentRequest;
use crate::utils::sha256_hex;

/// Computes the content hash used for duplicate detection
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, request: &SubmitContentRequest) -> String;
}

/// SHA-256 over `url + title + description`, missing fields as empty strings.
///
/// Only sees metadata, so re-uploads under a new URL are not caught. Swap in a
/// perceptual hash over the media bytes for that.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataFingerprinter;

impl Fingerprinter for MetadataFingerprinter {
    fn fingerprint(&self, request: &SubmitContentRequest) -> String {
        let input = format!(
            "{}{}{}",
            request.url,
            request.title.as_deref().unwrap_or_default(),
            request.description.as_deref().unwrap_or_default()
        );
        sha256_hex(&input)
    }
}
