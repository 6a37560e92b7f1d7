#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Unlocked,
    Locked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    /// The page changed and `current_page` follows it.
    Accepted,
    /// Unauthorized turn while locked; the widget must be sent back to
    /// `target`.
    Revert { target: usize },
    /// Locked and the widget already shows the current page.
    Absorbed,
}

/// Owns the authoritative current page and the lock. Only this type writes
/// either of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationLock {
    mode: LockMode,
    current_page: usize,
    revert_target: Option<usize>,
    authorized_target: Option<usize>,
    desired_start_page: Option<usize>,
}

impl NavigationLock {
    pub fn new(start_page: usize) -> Self {
        Self {
            mode: LockMode::Unlocked,
            current_page: start_page,
            revert_target: None,
            authorized_target: None,
            desired_start_page: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.mode == LockMode::Locked
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn revert_in_flight(&self) -> bool {
        self.revert_target.is_some()
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized_target.is_some()
    }

    pub fn desired_start_page(&self) -> Option<usize> {
        self.desired_start_page
    }

    pub fn toggle(&mut self) -> LockMode {
        self.mode = match self.mode {
            LockMode::Unlocked => LockMode::Locked,
            LockMode::Locked => LockMode::Unlocked,
        };
        self.mode
    }

    /// Lets the next completion at `target` through while locked. Only that
    /// completion consumes it.
    pub fn authorize(&mut self, target: usize) {
        self.authorized_target = Some(target);
    }

    pub fn clear_authorization(&mut self) {
        self.authorized_target = None;
    }

    /// Gives up on a revert whose completion never arrived.
    pub fn settle_revert(&mut self) {
        self.revert_target = None;
    }

    /// Widget remounted at `start_page`. The lock mode survives; transient
    /// state does not.
    pub fn remount(&mut self, start_page: usize) {
        self.current_page = start_page;
        self.revert_target = None;
        self.authorized_target = None;
        self.desired_start_page = Some(start_page);
    }

    pub fn on_flip_completed(&mut self, new_index: usize) -> FlipOutcome {
        if self.desired_start_page == Some(new_index) {
            self.desired_start_page = None;
        }

        if self.authorized_target == Some(new_index) {
            // An authorized turn supersedes any revert still on its way.
            self.authorized_target = None;
            self.revert_target = None;
            self.current_page = new_index;
            return FlipOutcome::Accepted;
        }

        if self.is_locked() && self.revert_target.is_none() {
            if new_index == self.current_page {
                return FlipOutcome::Absorbed;
            }
            self.revert_target = Some(self.current_page);
            return FlipOutcome::Revert {
                target: self.current_page,
            };
        }

        if self.revert_target == Some(new_index) {
            self.revert_target = None;
        }
        self.current_page = new_index;
        FlipOutcome::Accepted
    }
}
