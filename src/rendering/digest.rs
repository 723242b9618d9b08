//! Stable hashes of layout output, used to compare renders.

use sha2::{Digest, Sha256};

use super::Frame;
use crate::dom::Document;

/// SHA-256 over every element's tag and rectangle in document order.
pub fn geometry_digest(doc: &Document) -> String {
    let mut hasher = Sha256::new();
    for id in doc.elements() {
        if let Some(el) = doc.element(id) {
            let r = el.rect;
            hasher.update(format!("{} {} {} {} {}\n", el.tag(), r.x, r.y, r.width, r.height));
        }
    }
    hex::encode(hasher.finalize())
}

/// SHA-256 over the frame's JSON form.
pub fn frame_digest(frame: &Frame) -> String {
    let bytes = serde_json::to_vec(frame).unwrap_or_default();
    hex::encode(Sha256::digest(&bytes))
}
