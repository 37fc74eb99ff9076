//! Staged, staggered image acquisition.
//!
//! The pipeline never runs futures itself. [`AssetPipeline::poll`] hands out
//! the requests that came due this frame, the front-end spawns one
//! [`deliver`] future per request, and each future posts an [`AssetMessage`]
//! back over a channel that the frame loop drains.

mod font;
mod raster;
mod source;

pub use raster::{corner_radius, rounded_coverage, Raster, SoftwareRaster};
pub use source::{AssetSource, FetchFuture};

use crate::config::LoadingConfig;
use crate::constants::FLAT_CARD_COLOR;
use crate::gallery::PlacedItem;
use crate::item::GalleryItem;
use crate::state::{elapsed, Mode};
use crate::{GalleryError, Result};
use fnv::FnvHashSet;
use image::RgbaImage;
use instant::Instant;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadState {
    #[default]
    Pending,
    Loading,
    LowFidelity,
    HighFidelity,
    /// Terminal: a failed first stage never upgrades.
    Placeholder,
}

impl LoadState {
    /// True once the first stage has produced something to show.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            LoadState::LowFidelity | LoadState::HighFidelity | LoadState::Placeholder
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fidelity {
    Low,
    High,
}

impl Fidelity {
    pub fn width(self, cfg: &LoadingConfig) -> u32 {
        match self {
            Fidelity::Low => cfg.low_width,
            Fidelity::High => cfg.high_width,
        }
    }

    fn loaded_state(self) -> LoadState {
        match self {
            Fidelity::Low => LoadState::LowFidelity,
            Fidelity::High => LoadState::HighFidelity,
        }
    }
}

/// Texture pixels for one card.
#[derive(Clone, Debug, PartialEq)]
pub enum CardTexture {
    Image(RgbaImage),
    /// Single color; used when the raster could not allocate.
    Flat([u8; 4]),
}

impl CardTexture {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            CardTexture::Image(img) => img.dimensions(),
            CardTexture::Flat(_) => (1, 1),
        }
    }
}

/// How many items load at once and the gap between the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaggerPolicy {
    pub immediate: usize,
    pub stagger: Duration,
}

impl StaggerPolicy {
    pub fn for_mode(mode: Mode, cfg: &LoadingConfig) -> Self {
        match mode {
            Mode::Outside => Self {
                immediate: cfg.immediate_count,
                stagger: Duration::from_millis(cfg.stagger_ms),
            },
            Mode::Inside => Self {
                immediate: cfg.inside_immediate_count,
                stagger: Duration::from_millis(cfg.inside_stagger_ms),
            },
        }
    }

    /// Offset from build time at which item `index` is due.
    pub fn due_offset(&self, index: usize) -> Duration {
        let late = index.saturating_sub(self.immediate) as u32;
        self.stagger * late
    }
}

#[derive(Clone, Debug)]
pub struct AssetRequest {
    pub generation: u64,
    pub index: usize,
    pub item: GalleryItem,
    pub fidelity: Fidelity,
    pub size: (u32, u32),
    pub placeholder_size: (u32, u32),
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssetOutcome {
    Ready(CardTexture),
    Placeholder(CardTexture),
    /// Upgrade failed; the current texture stays.
    Unchanged,
}

#[derive(Clone, Debug)]
pub struct AssetMessage {
    pub generation: u64,
    pub index: usize,
    pub fidelity: Fidelity,
    pub outcome: AssetOutcome,
}

impl AssetMessage {
    /// State the item ends in once this message is applied, if it changes.
    pub fn resulting_state(&self) -> Option<LoadState> {
        match self.outcome {
            AssetOutcome::Ready(_) => Some(self.fidelity.loaded_state()),
            AssetOutcome::Placeholder(_) => Some(LoadState::Placeholder),
            AssetOutcome::Unchanged => None,
        }
    }
}

async fn fetch_and_composite<S, R>(
    source: &S,
    raster: &R,
    request: &AssetRequest,
) -> Result<CardTexture>
where
    S: AssetSource + ?Sized,
    R: Raster + ?Sized,
{
    let image_ref = request.item.image_ref.as_str();
    let bytes = source.fetch(image_ref).await?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| GalleryError::AssetDecode {
        image_ref: image_ref.to_string(),
        source: e,
    })?;
    Ok(composite_or_flat(raster.composite_rounded(
        &decoded,
        request.size,
        corner_radius(request.size.0),
    )))
}

fn composite_or_flat(result: Result<RgbaImage>) -> CardTexture {
    match result {
        Ok(img) => CardTexture::Image(img),
        Err(e) => {
            log::warn!("[assets] {e}; using flat card");
            CardTexture::Flat(FLAT_CARD_COLOR)
        }
    }
}

/// Fetch, decode and composite one request. Never fails: a first-stage
/// failure becomes a placeholder, an upgrade failure leaves things as they are.
pub async fn acquire<S, R>(source: &S, raster: &R, request: &AssetRequest) -> AssetMessage
where
    S: AssetSource + ?Sized,
    R: Raster + ?Sized,
{
    let outcome = match fetch_and_composite(source, raster, request).await {
        Ok(texture) => AssetOutcome::Ready(texture),
        Err(e) => match request.fidelity {
            Fidelity::Low => {
                log::warn!("[assets] #{}: {e}; showing placeholder", request.item.id);
                AssetOutcome::Placeholder(composite_or_flat(
                    raster.placeholder(&request.item, request.placeholder_size),
                ))
            }
            Fidelity::High => {
                log::warn!("[assets] #{} upgrade failed: {e}", request.item.id);
                AssetOutcome::Unchanged
            }
        },
    };
    AssetMessage {
        generation: request.generation,
        index: request.index,
        fidelity: request.fidelity,
        outcome,
    }
}

/// Run [`acquire`] and post the result. A closed channel means the gallery
/// went away; the result is dropped.
pub async fn deliver<S, R>(source: &S, raster: &R, request: AssetRequest, tx: Sender<AssetMessage>)
where
    S: AssetSource + ?Sized,
    R: Raster + ?Sized,
{
    let msg = acquire(source, raster, &request).await;
    if tx.send(msg).is_err() {
        log::debug!("[assets] dropped late result for #{}", request.item.id);
    }
}

/// Scheduling and progress bookkeeping for one gallery generation.
pub struct AssetPipeline {
    generation: u64,
    config: LoadingConfig,
    card_aspect: f32,
    policy: StaggerPolicy,
    built_at: Instant,
    /// First-stage indices in due order.
    pending: VecDeque<usize>,
    urgent: SmallVec<[usize; 4]>,
    upgrade_queue: VecDeque<usize>,
    upgrade_next_due: Option<Instant>,
    high_in_flight: FnvHashSet<usize>,
    completed: usize,
    total: usize,
    fully_loaded_at: Option<Instant>,
    tx: Option<Sender<AssetMessage>>,
    rx: Option<Receiver<AssetMessage>>,
}

impl AssetPipeline {
    pub fn new(
        total: usize,
        mode: Mode,
        config: LoadingConfig,
        card_aspect: f32,
        now: Instant,
    ) -> Self {
        let (tx, rx) = channel();
        let policy = StaggerPolicy::for_mode(mode, &config);
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        log::info!(
            "[assets] generation {generation}: {total} items, {} immediate, {:?} stagger",
            policy.immediate.min(total),
            policy.stagger
        );
        Self {
            generation,
            config,
            card_aspect,
            policy,
            built_at: now,
            pending: (0..total).collect(),
            urgent: SmallVec::new(),
            upgrade_queue: VecDeque::new(),
            upgrade_next_due: None,
            high_in_flight: FnvHashSet::default(),
            completed: 0,
            total,
            // nothing to wait for
            fully_loaded_at: (total == 0).then_some(now),
            tx: Some(tx),
            rx: Some(rx),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn policy(&self) -> StaggerPolicy {
        self.policy
    }

    /// Sender for spawned acquisitions; `None` after [`close`](Self::close).
    pub fn sender(&self) -> Option<Sender<AssetMessage>> {
        self.tx.clone()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn loading_percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }

    pub fn fully_loaded_at(&self) -> Option<Instant> {
        self.fully_loaded_at
    }

    pub fn is_fully_loaded(&self) -> bool {
        self.fully_loaded_at.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.rx.is_none()
    }

    fn size_for(&self, width: u32) -> (u32, u32) {
        let height = (width as f32 * self.card_aspect).round().max(1.0) as u32;
        (width, height)
    }

    fn request(&self, index: usize, item: &GalleryItem, fidelity: Fidelity) -> AssetRequest {
        AssetRequest {
            generation: self.generation,
            index,
            item: item.clone(),
            fidelity,
            size: self.size_for(fidelity.width(&self.config)),
            placeholder_size: self.size_for(self.config.placeholder_width),
        }
    }

    /// Queue a high-fidelity fetch for a low-fidelity item ahead of any
    /// stagger. Returns false when nothing was queued.
    pub fn request_upgrade(&mut self, index: usize, state: LoadState) -> bool {
        if self.is_closed() || state != LoadState::LowFidelity {
            return false;
        }
        if self.high_in_flight.contains(&index) || self.urgent.contains(&index) {
            return false;
        }
        log::debug!("[assets] urgent upgrade for index {index}");
        self.urgent.push(index);
        true
    }

    /// Requests that became due by `now`. Marks first-stage items `Loading`.
    pub fn poll(&mut self, now: Instant, items: &mut [PlacedItem]) -> SmallVec<[AssetRequest; 8]> {
        let mut out = SmallVec::new();
        if self.is_closed() {
            return out;
        }

        for index in std::mem::take(&mut self.urgent) {
            let Some(placed) = items.get(index) else {
                continue;
            };
            if placed.load_state == LoadState::LowFidelity && self.high_in_flight.insert(index) {
                out.push(self.request(index, &placed.item, Fidelity::High));
            }
        }

        let elapsed = elapsed(self.built_at, now);
        while let Some(&index) = self.pending.front() {
            if self.policy.due_offset(index) > elapsed {
                break;
            }
            self.pending.pop_front();
            let Some(placed) = items.get_mut(index) else {
                continue;
            };
            if placed.load_state != LoadState::Pending {
                continue;
            }
            placed.load_state = LoadState::Loading;
            out.push(self.request(index, &placed.item, Fidelity::Low));
        }

        if let Some(mut due) = self.upgrade_next_due {
            let stagger = Duration::from_millis(self.config.upgrade_stagger_ms);
            while due <= now {
                let Some(index) = self.upgrade_queue.pop_front() else {
                    break;
                };
                let Some(placed) = items.get(index) else {
                    continue;
                };
                if placed.load_state != LoadState::LowFidelity
                    || !self.high_in_flight.insert(index)
                {
                    continue;
                }
                out.push(self.request(index, &placed.item, Fidelity::High));
                due += stagger;
            }
            self.upgrade_next_due = (!self.upgrade_queue.is_empty()).then_some(due);
        }

        if !out.is_empty() {
            log::debug!("[assets] {} request(s) due", out.len());
        }
        out
    }

    /// Pull every posted result for the current generation.
    pub fn drain(&mut self) -> SmallVec<[AssetMessage; 8]> {
        let mut out = SmallVec::new();
        let Some(rx) = self.rx.as_ref() else {
            return out;
        };
        while let Ok(msg) = rx.try_recv() {
            if msg.generation == self.generation {
                out.push(msg);
            } else {
                log::debug!("[assets] ignoring result from generation {}", msg.generation);
            }
        }
        out
    }

    /// Book-keep one applied message. Returns true when this message
    /// completed the first stage of the whole gallery.
    pub fn settle(&mut self, msg: &AssetMessage, previous: LoadState, now: Instant) -> bool {
        match msg.fidelity {
            Fidelity::High => {
                self.high_in_flight.remove(&msg.index);
                false
            }
            Fidelity::Low => {
                if previous.is_settled() {
                    return false;
                }
                self.completed = (self.completed + 1).min(self.total);
                if self.completed == self.total && self.fully_loaded_at.is_none() {
                    self.fully_loaded_at = Some(now);
                    log::info!("[assets] fully loaded ({} items)", self.total);
                    if self.config.background_upgrade {
                        self.upgrade_queue = (0..self.total).collect();
                        self.upgrade_next_due = Some(now);
                    }
                    return true;
                }
                false
            }
        }
    }

    /// Drop the receiver so in-flight acquisitions become no-ops.
    pub fn close(&mut self) {
        self.tx = None;
        self.rx = None;
        self.pending.clear();
        self.urgent.clear();
        self.upgrade_queue.clear();
        self.upgrade_next_due = None;
        self.high_in_flight.clear();
    }
}
