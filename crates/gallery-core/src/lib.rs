pub mod assets;
pub mod backend;
pub mod camera;
pub mod config;
pub mod constants;
pub mod error;
pub mod gallery;
pub mod interaction;
pub mod item;
pub mod layout;
pub mod picking;
pub mod state;

pub use assets::{
    acquire, deliver, AssetMessage, AssetOutcome, AssetPipeline, AssetRequest, AssetSource,
    CardTexture, FetchFuture, Fidelity, LoadState, Raster, SoftwareRaster, StaggerPolicy,
};
pub use backend::{
    CardDescriptor, MeshHandle, RenderBackend, Resource, ResourceLedger, SceneFrame,
    SurfaceHandle, TextureHandle,
};
pub use camera::{ease_out_cubic, CameraRig};
pub use config::{CameraConfig, GalleryConfig, LayoutConfig, LoadingConfig, MotionConfig};
pub use error::{GalleryError, Result};
pub use gallery::{Gallery, GallerySnapshot, PlacedItem};
pub use interaction::{
    GestureKind, InputEvent, InputGesture, InteractionContext, InteractionOutcome,
    InteractionState, PointerSample,
};
pub use item::{default_catalog, replicate, sanitize, GalleryItem};
pub use layout::{golden_angle, layout, layout_with, LayoutParams, Placement};
pub use picking::{nearest_hit, screen_to_world_ray, PickCandidate, PickHit, Ray};
pub use state::*;
