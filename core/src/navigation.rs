use crate::flip::{FlipError, PageFlip};
use crate::lock::{FlipOutcome, LockMode, NavigationLock};
use crate::scheme::PageScheme;

pub const FLIP_RETRY_ATTEMPTS: u8 = 10;
pub const FLIP_RETRY_INTERVAL_MS: u32 = 50;
/// How long a programmatic authorization waits for its flip to complete.
pub const AUTHORIZATION_WINDOW_MS: u32 = 1_000;
/// How long a revert waits for its completion event.
pub const REVERT_SETTLE_MS: u32 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("recipe {index} is out of range ({count} recipes)")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("page {index} is out of range ({count} pages)")]
    PageOutOfRange { index: usize, count: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingFlip {
    index: usize,
    attempts: u8,
    waited_ms: u32,
}

/// Drives the page-flip widget: validates targets, honours the lock, retries
/// while the widget is mounting and sends unauthorized turns back.
pub struct Navigator {
    scheme: PageScheme,
    lock: NavigationLock,
    pending_flip: Option<PendingFlip>,
    scheduled_revert: Option<usize>,
    authorization_ms: Option<u32>,
    revert_ms: u32,
}

impl Navigator {
    pub fn new(scheme: PageScheme) -> Self {
        Self {
            scheme,
            lock: NavigationLock::new(0),
            pending_flip: None,
            scheduled_revert: None,
            authorization_ms: None,
            revert_ms: 0,
        }
    }

    pub fn scheme(&self) -> &PageScheme {
        &self.scheme
    }

    pub fn lock(&self) -> &NavigationLock {
        &self.lock
    }

    pub fn current_page(&self) -> usize {
        self.lock.current_page()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn has_pending_flip(&self) -> bool {
        self.pending_flip.is_some()
    }

    pub fn toggle_lock(&mut self) -> LockMode {
        let mode = self.lock.toggle();
        log::info!("Navigation lock: {:?}", mode);
        mode
    }

    /// Swaps in a new page layout after the widget was rebuilt. Pending
    /// flips and authorizations belong to the old widget and are dropped.
    pub fn remount(&mut self, scheme: PageScheme, start_page: usize) {
        let start_page = start_page.min(scheme.total_page_count() - 1);
        log::debug!(
            "Remount: {} recipes, {} pages, start page {}",
            scheme.recipe_count(),
            scheme.total_page_count(),
            start_page
        );
        self.scheme = scheme;
        self.lock.remount(start_page);
        self.pending_flip = None;
        self.scheduled_revert = None;
        self.authorization_ms = None;
        self.revert_ms = 0;
    }

    /// Full reset, as after reloading the layout from scratch.
    pub fn reset(&mut self, scheme: PageScheme) {
        *self = Self::new(scheme);
    }

    pub fn go_to_contents(&mut self, widget: &mut impl PageFlip) -> bool {
        if self.is_locked() {
            log::debug!("Ignoring go-to-contents while locked");
            return false;
        }
        self.issue_flip(widget, self.scheme.contents_index());
        true
    }

    pub fn go_to_recipe(
        &mut self,
        widget: &mut impl PageFlip,
        recipe: usize,
    ) -> Result<bool, NavigationError> {
        if self.is_locked() {
            log::debug!("Ignoring go-to-recipe {} while locked", recipe);
            return Ok(false);
        }
        let index = self.scheme.checked_recipe_text_index(recipe)?;
        self.issue_flip(widget, index);
        Ok(true)
    }

    /// Low-level turn. With `authorize_if_locked` the completion at `index`
    /// is accepted even while locked.
    pub fn go_to_page(
        &mut self,
        widget: &mut impl PageFlip,
        index: usize,
        authorize_if_locked: bool,
    ) -> Result<bool, NavigationError> {
        let count = self.scheme.total_page_count();
        if index >= count {
            return Err(NavigationError::PageOutOfRange { index, count });
        }
        if authorize_if_locked {
            self.lock.authorize(index);
            self.authorization_ms = Some(0);
        } else if self.is_locked() {
            log::debug!("Ignoring unauthorized go-to-page {} while locked", index);
            return Ok(false);
        }
        self.issue_flip(widget, index);
        Ok(true)
    }

    pub fn on_flip(&mut self, index: usize) -> FlipOutcome {
        let outcome = self.lock.on_flip_completed(index);
        match outcome {
            FlipOutcome::Revert { target } => {
                log::info!("Locked: reverting turn to page {} back to page {}", index, target);
                self.scheduled_revert = Some(target);
                self.revert_ms = 0;
            }
            FlipOutcome::Accepted | FlipOutcome::Absorbed => {}
        }
        if !self.lock.revert_in_flight() {
            self.scheduled_revert = None;
        }
        if !self.lock.is_authorized() {
            self.authorization_ms = None;
        }
        outcome
    }

    /// Advances timers: scheduled reverts run on the tick after the event,
    /// not-ready flips are retried, stale authorizations and reverts expire.
    pub fn tick(&mut self, widget: &mut impl PageFlip, elapsed_ms: u32) {
        if let Some(target) = self.scheduled_revert.take() {
            self.issue_flip(widget, target);
        }

        if let Some(mut pending) = self.pending_flip.take() {
            pending.waited_ms = pending.waited_ms.saturating_add(elapsed_ms);
            if pending.waited_ms < FLIP_RETRY_INTERVAL_MS {
                self.pending_flip = Some(pending);
            } else {
                pending.attempts = pending.attempts.saturating_add(1);
                pending.waited_ms = 0;
                match widget.flip(pending.index) {
                    Ok(()) => {
                        log::debug!("Flip to {} succeeded on attempt {}", pending.index, pending.attempts);
                    }
                    Err(FlipError::NotReady) if pending.attempts < FLIP_RETRY_ATTEMPTS => {
                        self.pending_flip = Some(pending);
                    }
                    Err(err) => {
                        log::warn!(
                            "Giving up on flip to {} after {} attempts: {}",
                            pending.index,
                            pending.attempts,
                            err
                        );
                    }
                }
            }
        }

        if let Some(waited) = self.authorization_ms {
            let waited = waited.saturating_add(elapsed_ms);
            if waited >= AUTHORIZATION_WINDOW_MS {
                log::debug!("Programmatic flip authorization expired");
                self.lock.clear_authorization();
                self.authorization_ms = None;
            } else {
                self.authorization_ms = Some(waited);
            }
        }

        if self.lock.revert_in_flight() && self.scheduled_revert.is_none() {
            self.revert_ms = self.revert_ms.saturating_add(elapsed_ms);
            if self.revert_ms >= REVERT_SETTLE_MS {
                log::warn!("Revert never completed; settling at page {}", self.current_page());
                self.lock.settle_revert();
                self.revert_ms = 0;
            }
        }
    }

    fn issue_flip(&mut self, widget: &mut impl PageFlip, index: usize) {
        match widget.flip(index) {
            Ok(()) => self.pending_flip = None,
            Err(FlipError::NotReady) => {
                log::debug!("Widget not ready, retrying flip to {}", index);
                self.pending_flip = Some(PendingFlip {
                    index,
                    attempts: 1,
                    waited_ms: 0,
                });
            }
        }
    }
}
