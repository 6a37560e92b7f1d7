/// Drag distance, in pixels, that turns a page while the book is unlocked.
pub const DEFAULT_SWIPE_DISTANCE: u32 = 30;
/// Page-turn animation length.
pub const FLIPPING_TIME_MS: u32 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlipError {
    #[error("page-flip widget is not ready")]
    NotReady,
}

/// Mount and input options handed to the page-flip widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlipConfig {
    pub portrait: bool,
    pub start_page: usize,
    /// 0 disables drag-to-flip.
    pub swipe_distance: u32,
    pub disable_flip_by_click: bool,
    pub use_mouse_events: bool,
    pub flipping_time_ms: u32,
}

impl FlipConfig {
    pub fn new(portrait: bool, start_page: usize, locked: bool) -> Self {
        let mut config = Self {
            portrait,
            start_page,
            swipe_distance: DEFAULT_SWIPE_DISTANCE,
            disable_flip_by_click: false,
            use_mouse_events: true,
            flipping_time_ms: FLIPPING_TIME_MS,
        };
        config.set_locked(locked);
        config
    }

    /// Locked books ignore drag, click and mouse input at the source.
    pub fn set_locked(&mut self, locked: bool) {
        self.swipe_distance = if locked { 0 } else { DEFAULT_SWIPE_DISTANCE };
        self.disable_flip_by_click = locked;
        self.use_mouse_events = !locked;
    }

    pub fn accepts_gestures(&self) -> bool {
        self.use_mouse_events && (self.swipe_distance > 0 || !self.disable_flip_by_click)
    }
}

/// The page-flip widget as seen from the navigation core. The widget owns
/// its animation; completed turns come back through `Book::on_flip`.
pub trait PageFlip {
    /// Starts turning to `index`. Fails with `NotReady` while the widget is
    /// still mounting.
    fn flip(&mut self, index: usize) -> Result<(), FlipError>;
    fn configure(&mut self, config: &FlipConfig);
}
