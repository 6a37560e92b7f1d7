/// Horizontal gap kept between the book and the viewport edges.
pub const H_GAP: u32 = 16;
/// Vertical gap kept between the book and the viewport edges.
pub const V_GAP: u32 = 16;
pub const MIN_PAGE_WIDTH: u32 = 240;
pub const MIN_PAGE_HEIGHT: u32 = 320;

// Page height / width, A-series paper (1.414).
const ASPECT_NUM: u64 = 1414;
const ASPECT_DEN: u64 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportMetrics {
    pub width: u32,
    pub height: u32,
}

impl ViewportMetrics {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_portrait(&self) -> bool {
        self.height >= self.width
    }
}

/// Size of a single page of the book.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageGeometry {
    pub page_width: u32,
    pub page_height: u32,
    pub portrait: bool,
}

impl PageGeometry {
    /// Portrait viewports show one page at nearly full width, landscape
    /// viewports show a two-page spread. The page keeps its aspect ratio and
    /// shrinks to fit the height, then clamps to the minimum page size.
    pub fn compute(viewport: ViewportMetrics) -> Self {
        let portrait = viewport.is_portrait();
        let usable_width = viewport.width.saturating_sub(H_GAP * 2);
        let target_single_width = if portrait {
            usable_width
        } else {
            usable_width / 2
        };

        let mut width = u64::from(target_single_width);
        let mut height = width * ASPECT_NUM / ASPECT_DEN;
        let max_height = u64::from(viewport.height.saturating_sub(V_GAP * 2));

        if height > max_height {
            height = max_height;
            width = height * ASPECT_DEN / ASPECT_NUM;
        }

        Self {
            page_width: (width as u32).max(MIN_PAGE_WIDTH),
            page_height: (height as u32).max(MIN_PAGE_HEIGHT),
            portrait,
        }
    }

    /// Width of what the widget shows at once: one page in portrait, a spread
    /// in landscape.
    pub fn spread_width(&self) -> u32 {
        if self.portrait {
            self.page_width
        } else {
            self.page_width * 2
        }
    }
}

pub fn compute(viewport_width: u32, viewport_height: u32) -> PageGeometry {
    PageGeometry::compute(ViewportMetrics::new(viewport_width, viewport_height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_viewport_uses_half_width() {
        let geometry = compute(1000, 800);
        assert!(!geometry.portrait);
        assert_eq!(geometry.page_width, 484);
        assert_eq!(geometry.page_height, 684);
        assert_eq!(geometry.spread_width(), 968);
    }

    #[test]
    fn portrait_viewport_uses_full_width() {
        let geometry = compute(300, 1200);
        assert!(geometry.portrait);
        assert_eq!(geometry.page_width, 268);
        // floor(268 * 1.414) = floor(378.952)
        assert_eq!(geometry.page_height, 378);
        assert_eq!(geometry.spread_width(), 268);
    }

    #[test]
    fn square_viewport_counts_as_portrait() {
        assert!(ViewportMetrics::new(700, 700).is_portrait());
    }

    #[test]
    fn short_viewport_fits_height_first() {
        // Landscape 1600x600: target width 784 would need 1108px of height.
        let geometry = compute(1600, 600);
        assert!(!geometry.portrait);
        assert_eq!(geometry.page_height, 568);
        assert_eq!(geometry.page_width, 568 * 1000 / 1414);
    }

    #[test]
    fn narrow_viewport_clamps_to_minimum() {
        let geometry = compute(200, 900);
        assert_eq!(geometry.page_width, MIN_PAGE_WIDTH);
        assert_eq!(geometry.page_height, implied_height(200 - 32));

        let tiny = compute(10, 10);
        assert_eq!(tiny.page_width, MIN_PAGE_WIDTH);
        assert_eq!(tiny.page_height, MIN_PAGE_HEIGHT);
    }

    fn implied_height(width: u32) -> u32 {
        (u64::from(width) * ASPECT_NUM / ASPECT_DEN).max(u64::from(MIN_PAGE_HEIGHT)) as u32
    }
}
