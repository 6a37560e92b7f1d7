use std::collections::VecDeque;

use cookbook_core::book::MountRequest;
use cookbook_core::flip::{FlipConfig, FlipError, PageFlip};
use cookbook_core::layout::PageGeometry;

/// Time after a mount during which the widget refuses `flip`.
pub const MOUNT_DELAY_MS: u32 = 120;
/// Drags shorter than this count as clicks.
const CLICK_SLOP: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Turn {
    pub from: usize,
    pub to: usize,
    pub elapsed_ms: u32,
}

impl Turn {
    pub fn forward(&self) -> bool {
        self.to >= self.from
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Drag {
    start_x: i32,
}

/// Software page-flip widget: one page at a time in portrait, two-page
/// spreads in landscape with the cover on its own. Completed turns are
/// queued and read back with `poll_event`.
pub struct FlipBook {
    geometry: Option<PageGeometry>,
    page_count: usize,
    config: FlipConfig,
    current: usize,
    mounted_ms: u32,
    announced: bool,
    turn: Option<Turn>,
    drag: Option<Drag>,
    events: VecDeque<usize>,
}

impl Default for FlipBook {
    fn default() -> Self {
        Self {
            geometry: None,
            page_count: 0,
            config: FlipConfig::new(false, 0, false),
            current: 0,
            mounted_ms: 0,
            announced: false,
            turn: None,
            drag: None,
            events: VecDeque::new(),
        }
    }
}

impl FlipBook {
    /// Rebuilds the widget. Queued events from the previous mount are
    /// dropped.
    pub fn mount(&mut self, request: &MountRequest) {
        log::debug!(
            "Mounting flipbook: {} pages at {}, {}x{} per page",
            request.page_count,
            request.config.start_page,
            request.geometry.page_width,
            request.geometry.page_height
        );
        *self = Self {
            geometry: Some(request.geometry),
            page_count: request.page_count,
            config: request.config,
            current: request.config.start_page.min(request.page_count.saturating_sub(1)),
            ..Self::default()
        };
    }

    /// Follows size changes that keep the orientation. Position and
    /// animation are kept.
    pub fn resize(&mut self, geometry: PageGeometry) {
        if self.geometry.is_some() {
            self.geometry = Some(geometry);
        }
    }

    pub fn geometry(&self) -> Option<PageGeometry> {
        self.geometry
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn config(&self) -> &FlipConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.geometry.is_some() && self.mounted_ms >= MOUNT_DELAY_MS
    }

    pub fn turn(&self) -> Option<Turn> {
        self.turn
    }

    /// Pages on screen: `(left, right)` in landscape, `(page, None)` in
    /// portrait.
    pub fn visible_pages(&self) -> (usize, Option<usize>) {
        self.spread_of(self.current)
    }

    pub fn spread_of(&self, index: usize) -> (usize, Option<usize>) {
        if self.config.portrait || index == 0 {
            return (index, None);
        }
        let left = if index % 2 == 1 { index } else { index - 1 };
        let right = left + 1;
        (left, (right < self.page_count).then_some(right))
    }

    fn spread_start(&self, index: usize) -> usize {
        self.spread_of(index).0
    }

    fn next_index(&self) -> Option<usize> {
        let next = if self.config.portrait || self.current == 0 {
            self.current + 1
        } else {
            self.spread_start(self.current) + 2
        };
        (next < self.page_count).then_some(next)
    }

    fn previous_index(&self) -> Option<usize> {
        if self.current == 0 {
            return None;
        }
        if self.config.portrait {
            return Some(self.current - 1);
        }
        let start = self.spread_start(self.current);
        Some(if start <= 1 { 0 } else { start - 2 })
    }

    pub fn poll_event(&mut self) -> Option<usize> {
        self.events.pop_front()
    }

    pub fn tick(&mut self, elapsed_ms: u32) {
        if self.geometry.is_none() {
            return;
        }
        self.mounted_ms = self.mounted_ms.saturating_add(elapsed_ms);
        if !self.announced && self.is_ready() {
            self.announced = true;
            self.events.push_back(self.current);
        }
        if let Some(mut turn) = self.turn.take() {
            turn.elapsed_ms = turn.elapsed_ms.saturating_add(elapsed_ms);
            if turn.elapsed_ms >= self.config.flipping_time_ms {
                self.finish(turn);
            } else {
                self.turn = Some(turn);
            }
        }
    }

    fn start_turn(&mut self, to: usize) {
        if let Some(turn) = self.turn.take() {
            self.finish(turn);
        }
        self.turn = Some(Turn {
            from: self.current,
            to,
            elapsed_ms: 0,
        });
    }

    fn finish(&mut self, turn: Turn) {
        self.current = turn.to;
        self.events.push_back(turn.to);
    }

    /// Keyboard page turn. Keys are not filtered by the mouse settings, so a
    /// locked book sees these turns and sends them back.
    pub fn turn_forward(&mut self) -> bool {
        self.gesture_turn(true)
    }

    pub fn turn_back(&mut self) -> bool {
        self.gesture_turn(false)
    }

    fn gesture_turn(&mut self, forward: bool) -> bool {
        if !self.is_ready() || self.turn.is_some() {
            return false;
        }
        let target = if forward {
            self.next_index()
        } else {
            self.previous_index()
        };
        match target {
            Some(target) => {
                self.start_turn(target);
                true
            }
            None => false,
        }
    }

    /// Mouse button went down at `x`, relative to the left edge of the book.
    pub fn press(&mut self, x: i32) {
        if self.config.use_mouse_events {
            self.drag = Some(Drag { start_x: x });
        }
    }

    /// Mouse button released. Returns whether a turn started.
    pub fn release(&mut self, x: i32) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if !self.config.use_mouse_events {
            return false;
        }
        let distance = x - drag.start_x;
        if distance.abs() <= CLICK_SLOP {
            if self.config.disable_flip_by_click {
                return false;
            }
            let width = self.geometry.map_or(0, |geometry| geometry.spread_width() as i32);
            return self.gesture_turn(x >= width / 2);
        }
        if self.config.swipe_distance == 0 || distance.unsigned_abs() < self.config.swipe_distance {
            return false;
        }
        // Dragging to the left reveals the next page.
        self.gesture_turn(distance < 0)
    }
}

impl PageFlip for FlipBook {
    fn flip(&mut self, index: usize) -> Result<(), FlipError> {
        if !self.is_ready() {
            return Err(FlipError::NotReady);
        }
        let target = index.min(self.page_count.saturating_sub(1));
        self.drag = None;
        self.start_turn(target);
        Ok(())
    }

    fn configure(&mut self, config: &FlipConfig) {
        self.config.swipe_distance = config.swipe_distance;
        self.config.disable_flip_by_click = config.disable_flip_by_click;
        self.config.use_mouse_events = config.use_mouse_events;
        self.config.flipping_time_ms = config.flipping_time_ms;
        if !config.use_mouse_events {
            self.drag = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbook_core::layout::ViewportMetrics;
    use cookbook_core::flip::FLIPPING_TIME_MS;

    fn mounted(portrait: bool, page_count: usize, start_page: usize, locked: bool) -> FlipBook {
        let viewport = if portrait {
            ViewportMetrics::new(600, 1000)
        } else {
            ViewportMetrics::new(1000, 800)
        };
        let mut book = FlipBook::default();
        book.mount(&MountRequest {
            geometry: PageGeometry::compute(viewport),
            page_count,
            config: FlipConfig::new(portrait, start_page, locked),
        });
        book
    }

    fn ready(portrait: bool, page_count: usize, start_page: usize, locked: bool) -> FlipBook {
        let mut book = mounted(portrait, page_count, start_page, locked);
        book.tick(MOUNT_DELAY_MS);
        assert_eq!(book.poll_event(), Some(start_page));
        book
    }

    #[test]
    fn refuses_flips_while_mounting() {
        let mut book = mounted(false, 12, 0, false);
        assert_eq!(book.flip(4), Err(FlipError::NotReady));
        book.tick(MOUNT_DELAY_MS - 1);
        assert_eq!(book.flip(4), Err(FlipError::NotReady));
        book.tick(1);
        assert_eq!(book.flip(4), Ok(()));
    }

    #[test]
    fn flip_completes_after_animation() {
        let mut book = ready(false, 12, 0, false);
        book.flip(6).unwrap();
        book.tick(FLIPPING_TIME_MS - 1);
        assert_eq!(book.poll_event(), None);
        assert_eq!(book.turn().map(|turn| turn.to), Some(6));
        book.tick(1);
        assert_eq!(book.poll_event(), Some(6));
        assert_eq!(book.visible_pages(), (5, Some(6)));
    }

    #[test]
    fn second_flip_completes_the_first() {
        let mut book = ready(true, 12, 0, false);
        book.flip(4).unwrap();
        book.flip(8).unwrap();
        assert_eq!(book.poll_event(), Some(4));
        book.tick(FLIPPING_TIME_MS);
        assert_eq!(book.poll_event(), Some(8));
        assert_eq!(book.visible_pages(), (8, None));
    }

    #[test]
    fn resize_keeps_position() {
        let mut book = ready(false, 12, 5, false);
        let larger = PageGeometry::compute(ViewportMetrics::new(1400, 1000));
        book.resize(larger);
        assert_eq!(book.geometry(), Some(larger));
        assert_eq!(book.visible_pages(), (5, Some(6)));

        let mut unmounted = FlipBook::default();
        unmounted.resize(larger);
        assert_eq!(unmounted.geometry(), None);
    }

    #[test]
    fn landscape_spreads_keep_cover_and_back_alone() {
        let book = ready(false, 12, 0, false);
        assert_eq!(book.spread_of(0), (0, None));
        assert_eq!(book.spread_of(2), (1, Some(2)));
        assert_eq!(book.spread_of(5), (5, Some(6)));
        assert_eq!(book.spread_of(11), (11, None));
    }

    #[test]
    fn keyboard_turns_walk_spreads() {
        let mut book = ready(false, 12, 0, false);
        assert!(!book.turn_back());
        assert!(book.turn_forward());
        book.tick(FLIPPING_TIME_MS);
        assert_eq!(book.poll_event(), Some(1));
        assert!(book.turn_forward());
        book.tick(FLIPPING_TIME_MS);
        assert_eq!(book.poll_event(), Some(3));
        assert!(book.turn_back());
        book.tick(FLIPPING_TIME_MS);
        assert_eq!(book.poll_event(), Some(1));
    }

    #[test]
    fn mouse_gestures_follow_config() {
        let mut book = ready(false, 12, 3, false);
        let width = book.geometry().unwrap().spread_width() as i32;

        book.press(width - 20);
        assert!(!book.release(width - 30));

        book.press(width - 20);
        assert!(book.release(width - 80));
        book.tick(FLIPPING_TIME_MS);
        assert_eq!(book.poll_event(), Some(5));

        book.press(10);
        assert!(book.release(12));
        book.tick(FLIPPING_TIME_MS);
        assert_eq!(book.poll_event(), Some(3));
    }

    #[test]
    fn locked_config_ignores_mouse_but_not_keys() {
        let mut book = ready(false, 12, 3, false);
        book.configure(&FlipConfig::new(false, 3, true));
        let width = book.geometry().unwrap().spread_width() as i32;

        book.press(width - 20);
        assert!(!book.release(width - 200));
        book.press(width - 20);
        assert!(!book.release(width - 20));
        assert_eq!(book.turn(), None);

        assert!(book.turn_forward());
        book.tick(FLIPPING_TIME_MS);
        assert_eq!(book.poll_event(), Some(5));
    }
}
