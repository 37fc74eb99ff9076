/// Result alias that carries the core [`GalleryError`] type.
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Everything that can go wrong inside the gallery core.
///
/// None of these are fatal. Asset errors end as a placeholder card, raster
/// errors as a flat card, backend errors are logged and the frame goes on.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("failed to fetch `{image_ref}`: {reason}")]
    AssetFetch { image_ref: String, reason: String },
    #[error("failed to decode `{image_ref}`: {source}")]
    AssetDecode {
        image_ref: String,
        #[source]
        source: image::ImageError,
    },
    #[error("2D raster unavailable for a {width}x{height} target")]
    CompositeRasterUnavailable { width: u32, height: u32 },
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
    #[error("render backend: {0}")]
    Backend(String),
}

impl GalleryError {
    pub fn fetch(image_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetFetch {
            image_ref: image_ref.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// True for the failures that degrade an item to its placeholder.
    pub fn is_asset_failure(&self) -> bool {
        matches!(self, Self::AssetFetch { .. } | Self::AssetDecode { .. })
    }
}
