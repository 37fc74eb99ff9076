use crate::{GalleryError, Result};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

/// One catalog record. Immutable once the gallery is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: u32,
    pub title: String,
    #[serde(rename = "imageRef", alias = "image", alias = "image_ref")]
    pub image_ref: String,
}

impl GalleryItem {
    pub fn new(id: u32, title: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            image_ref: image_ref.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_ref.trim().is_empty() {
            return Err(GalleryError::DegenerateInput(format!(
                "item #{} has an empty image reference",
                self.id
            )));
        }
        Ok(())
    }
}

/// Stock catalog: `Project 1..=n` backed by `/images/{id}.JPG`.
pub fn default_catalog(n: usize) -> Vec<GalleryItem> {
    (1..=n as u32)
        .map(|id| GalleryItem::new(id, format!("Project {id}"), format!("/images/{id}.JPG")))
        .collect()
}

/// Cycle a smaller base set up to `n` items, assigning fresh ids `1..=n`.
pub fn replicate(base: &[GalleryItem], n: usize) -> Vec<GalleryItem> {
    if base.is_empty() {
        return Vec::new();
    }
    base.iter()
        .cycle()
        .take(n)
        .enumerate()
        .map(|(i, b)| GalleryItem::new(i as u32 + 1, b.title.clone(), b.image_ref.clone()))
        .collect()
}

/// Drop malformed records (empty image reference, repeated id), keeping order.
pub fn sanitize(items: Vec<GalleryItem>) -> Vec<GalleryItem> {
    let mut seen = FnvHashSet::default();
    items
        .into_iter()
        .filter(|item| {
            if let Err(e) = item.validate() {
                log::warn!("[catalog] skipping record: {e}");
                return false;
            }
            if !seen.insert(item.id) {
                log::warn!("[catalog] skipping duplicate id #{}", item.id);
                return false;
            }
            true
        })
        .collect()
}
