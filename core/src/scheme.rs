//! Flat page layout of the book.
//!
//! ```text
//! 0 Cover | 1 Blank | 2 Author | 3 Foreword | 4 Contents |
//! 5 Image 0 | 6 Recipe 0 | 7 Image 1 | 8 Recipe 1 | ... | Back cover
//! ```
//!
//! With no recipes a single placeholder page sits at index 5 and the back
//! cover moves to index 6.

use crate::navigation::NavigationError;

pub const COVER_INDEX: usize = 0;
pub const BLANK_INDEX: usize = 1;
pub const AUTHOR_INDEX: usize = 2;
pub const FOREWORD_INDEX: usize = 3;
pub const CONTENTS_INDEX: usize = 4;
pub const FRONT_MATTER_PAGES: usize = CONTENTS_INDEX + 1;
pub const RECIPE_FIRST_PAGE_INDEX: usize = CONTENTS_INDEX + 2;
pub const PAGES_PER_RECIPE: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSlot {
    Cover,
    Blank,
    Author,
    Foreword,
    Contents,
    RecipeImage(usize),
    RecipeText(usize),
    NoRecipes,
    BackCover,
}

impl PageSlot {
    pub fn recipe(&self) -> Option<usize> {
        match self {
            PageSlot::RecipeImage(index) | PageSlot::RecipeText(index) => Some(*index),
            _ => None,
        }
    }
}

/// Page positions for one snapshot of the recipe collection. Rebuilt, never
/// patched, whenever the collection changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PageScheme {
    recipe_count: usize,
}

impl PageScheme {
    pub const fn new(recipe_count: usize) -> Self {
        Self { recipe_count }
    }

    pub fn recipe_count(&self) -> usize {
        self.recipe_count
    }

    pub fn contents_index(&self) -> usize {
        CONTENTS_INDEX
    }

    pub fn recipe_text_index(&self, recipe: usize) -> usize {
        RECIPE_FIRST_PAGE_INDEX + recipe * PAGES_PER_RECIPE
    }

    pub fn recipe_image_index(&self, recipe: usize) -> usize {
        self.recipe_text_index(recipe) - 1
    }

    pub fn checked_recipe_text_index(&self, recipe: usize) -> Result<usize, NavigationError> {
        if recipe < self.recipe_count {
            Ok(self.recipe_text_index(recipe))
        } else {
            Err(NavigationError::IndexOutOfRange {
                index: recipe,
                count: self.recipe_count,
            })
        }
    }

    fn recipe_pages(&self) -> usize {
        (self.recipe_count * PAGES_PER_RECIPE).max(1)
    }

    pub fn total_page_count(&self) -> usize {
        FRONT_MATTER_PAGES + self.recipe_pages() + 1
    }

    pub fn back_cover_index(&self) -> usize {
        self.total_page_count() - 1
    }

    pub fn slot_at(&self, index: usize) -> Option<PageSlot> {
        let slot = match index {
            COVER_INDEX => PageSlot::Cover,
            BLANK_INDEX => PageSlot::Blank,
            AUTHOR_INDEX => PageSlot::Author,
            FOREWORD_INDEX => PageSlot::Foreword,
            CONTENTS_INDEX => PageSlot::Contents,
            _ if index == self.back_cover_index() => PageSlot::BackCover,
            _ if index > self.back_cover_index() => return None,
            _ if self.recipe_count == 0 => PageSlot::NoRecipes,
            _ => {
                let offset = index - FRONT_MATTER_PAGES;
                let recipe = offset / PAGES_PER_RECIPE;
                if offset % PAGES_PER_RECIPE == 0 {
                    PageSlot::RecipeImage(recipe)
                } else {
                    PageSlot::RecipeText(recipe)
                }
            }
        };
        Some(slot)
    }

    /// Recipe shown on `index`, for both its image and its text page.
    pub fn recipe_at(&self, index: usize) -> Option<usize> {
        self.slot_at(index).and_then(|slot| slot.recipe())
    }

    pub fn slots(&self) -> impl Iterator<Item = PageSlot> + '_ {
        (0..self.total_page_count()).filter_map(move |index| self.slot_at(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn contents_index_is_fixed() {
        for count in 0..40 {
            assert_eq!(PageScheme::new(count).contents_index(), 4);
        }
    }

    #[test]
    fn recipe_pages_come_in_image_text_pairs() {
        for count in 1..30 {
            let scheme = PageScheme::new(count);
            for i in 0..count {
                assert_eq!(scheme.recipe_text_index(i) - scheme.recipe_image_index(i), 1);
                if i + 1 < count {
                    assert_eq!(scheme.recipe_text_index(i + 1) - scheme.recipe_text_index(i), 2);
                }
                assert_eq!(scheme.slot_at(scheme.recipe_image_index(i)), Some(PageSlot::RecipeImage(i)));
                assert_eq!(scheme.slot_at(scheme.recipe_text_index(i)), Some(PageSlot::RecipeText(i)));
            }
        }
    }

    #[test]
    fn first_recipe_follows_contents() {
        let scheme = PageScheme::new(3);
        assert_eq!(scheme.recipe_image_index(0), 5);
        assert_eq!(scheme.recipe_text_index(0), 6);
        assert_eq!(scheme.total_page_count(), 12);
        assert_eq!(scheme.back_cover_index(), 11);
        assert_eq!(scheme.slot_at(11), Some(PageSlot::BackCover));
        assert_eq!(scheme.slot_at(12), None);
    }

    #[test]
    fn empty_collection_reserves_one_placeholder_page() {
        let scheme = PageScheme::new(0);
        assert_eq!(scheme.total_page_count(), 7);
        assert_eq!(scheme.slot_at(5), Some(PageSlot::NoRecipes));
        assert_eq!(scheme.slot_at(6), Some(PageSlot::BackCover));
        assert_eq!(scheme.recipe_at(5), None);
        assert_eq!(
            scheme.checked_recipe_text_index(0),
            Err(NavigationError::IndexOutOfRange { index: 0, count: 0 })
        );
    }

    #[test]
    fn slots_cover_every_page_once() {
        let scheme = PageScheme::new(2);
        let slots: Vec<PageSlot> = scheme.slots().collect();
        assert_eq!(
            slots,
            [
                PageSlot::Cover,
                PageSlot::Blank,
                PageSlot::Author,
                PageSlot::Foreword,
                PageSlot::Contents,
                PageSlot::RecipeImage(0),
                PageSlot::RecipeText(0),
                PageSlot::RecipeImage(1),
                PageSlot::RecipeText(1),
                PageSlot::BackCover,
            ]
        );
    }

    #[test]
    fn recipe_at_maps_both_pages_of_a_recipe() {
        let scheme = PageScheme::new(4);
        assert_eq!(scheme.recipe_at(9), Some(2));
        assert_eq!(scheme.recipe_at(10), Some(2));
        assert_eq!(scheme.recipe_at(4), None);
        assert_eq!(scheme.recipe_at(13), None);
    }
}
