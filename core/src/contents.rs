use alloc::string::String;
use alloc::vec::Vec;

use crate::recipe::Recipe;
use crate::scheme::PageScheme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentsEntry<'a> {
    pub recipe_index: usize,
    pub title: &'a str,
    pub page_index: usize,
}

/// Table of contents, in book order, filtered by a case-insensitive search
/// over titles and tags.
pub fn contents<'a>(recipes: &'a [Recipe], scheme: &PageScheme, query: &str) -> Vec<ContentsEntry<'a>> {
    let needle = query.trim().to_lowercase();
    recipes
        .iter()
        .enumerate()
        .filter(|(_, recipe)| needle.is_empty() || matches(recipe, &needle))
        .map(|(recipe_index, recipe)| ContentsEntry {
            recipe_index,
            title: recipe.title.as_str(),
            page_index: scheme.recipe_text_index(recipe_index),
        })
        .collect()
}

fn matches(recipe: &Recipe, needle: &str) -> bool {
    contains(&recipe.title, needle) || recipe.tags.iter().any(|tag| contains(tag, needle))
}

fn contains(haystack: &str, needle: &str) -> bool {
    let haystack: String = haystack.to_lowercase();
    haystack.contains(needle)
}
