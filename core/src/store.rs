use alloc::vec::Vec;

use crate::recipe::{NewRecipe, Recipe, RecipeId, RecipePatch};
use crate::repository::{ImageFile, RecipeRepository, RepositoryError, UploadedImage};
use crate::scheme::PageScheme;

/// Ordered recipe collection. Every mutation goes through the repository and
/// is followed by a full reload, so local indices always match the source.
pub struct RecipeStore<R: RecipeRepository> {
    repository: R,
    recipes: Vec<Recipe>,
    revision: u32,
}

impl<R: RecipeRepository> RecipeStore<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            recipes: Vec::new(),
            revision: 0,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Recipe> {
        self.recipes.get(index)
    }

    pub fn position(&self, id: &RecipeId) -> Option<usize> {
        self.recipes.iter().position(|recipe| &recipe.id == id)
    }

    /// Bumped on every reload.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn scheme(&self) -> PageScheme {
        PageScheme::new(self.recipes.len())
    }

    /// Reloads the collection. A failed fetch leaves the store empty.
    pub async fn load(&mut self) -> &[Recipe] {
        self.recipes = match self.repository.fetch_published().await {
            Ok(recipes) => recipes,
            Err(err) => {
                log::error!("Failed to load recipes: {}", err);
                Vec::new()
            }
        };
        self.revision = self.revision.wrapping_add(1);
        log::info!("Loaded {} recipes (revision {})", self.recipes.len(), self.revision);
        &self.recipes
    }

    pub async fn add(&mut self, recipe: NewRecipe) -> Result<RecipeId, RepositoryError> {
        let created = self.repository.create(recipe).await?;
        log::info!("Created recipe {} ({:?})", created.id, created.title);
        self.load().await;
        Ok(created.id)
    }

    pub async fn update(&mut self, id: &RecipeId, patch: RecipePatch) -> Result<(), RepositoryError> {
        self.repository.update(id, patch).await?;
        log::info!("Updated recipe {}", id);
        self.load().await;
        Ok(())
    }

    pub async fn remove(&mut self, id: &RecipeId) -> Result<(), RepositoryError> {
        self.repository.delete(id).await?;
        log::info!("Deleted recipe {}", id);
        self.load().await;
        Ok(())
    }

    pub async fn upload_image(&self, file: &ImageFile) -> Result<UploadedImage, RepositoryError> {
        self.repository.upload_image(file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryRepository, recipe};
    use alloc::string::String;
    use embassy_futures::block_on;

    fn seeded_store(count: usize) -> RecipeStore<MemoryRepository> {
        let repository = MemoryRepository::new();
        for i in 0..count {
            repository.insert(recipe(&alloc::format!("{}", i + 1), &alloc::format!("Recipe {}", i + 1)));
        }
        let mut store = RecipeStore::new(repository);
        block_on(store.load());
        store
    }

    #[test]
    fn fetch_failure_yields_empty_collection() {
        let mut store = seeded_store(3);
        assert_eq!(store.len(), 3);

        store.repository().fail_next_fetch();
        let recipes = block_on(store.load());
        assert!(recipes.is_empty());
        assert_eq!(store.scheme().recipe_count(), 0);
    }

    #[test]
    fn remove_shrinks_scheme_and_shifts_indices() {
        let mut store = seeded_store(4);
        let before = store.scheme();
        assert_eq!(before.total_page_count(), 14);

        block_on(store.remove(&RecipeId::from("2"))).unwrap();

        let after = store.scheme();
        assert_eq!(after.total_page_count(), 12);
        let titles: alloc::vec::Vec<&str> = store.recipes().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Recipe 1", "Recipe 3", "Recipe 4"]);

        let mut pages: alloc::vec::Vec<usize> = (0..store.len())
            .flat_map(|i| [after.recipe_image_index(i), after.recipe_text_index(i)])
            .collect();
        assert_eq!(pages, [5, 6, 7, 8, 9, 10]);
        pages.dedup();
        assert_eq!(pages.len(), 6);
        assert_eq!(store.position(&RecipeId::from("3")), Some(1));
        assert_eq!(after.back_cover_index(), 11);
    }

    #[test]
    fn add_refetches_and_returns_new_id() {
        let mut store = seeded_store(1);
        let revision = store.revision();
        let id = block_on(store.add(NewRecipe {
            title: String::from("Shakshuka"),
            ..NewRecipe::default()
        }))
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.position(&id), Some(1));
        assert!(store.revision() > revision);
    }

    #[test]
    fn failed_mutation_keeps_collection() {
        let mut store = seeded_store(2);
        let revision = store.revision();
        let result = block_on(store.update(&RecipeId::from("99"), RecipePatch::default()));

        assert_eq!(result, Err(RepositoryError::NotFound(RecipeId::from("99"))));
        assert_eq!(store.len(), 2);
        assert_eq!(store.revision(), revision);
    }
}
