//! In-memory collaborators for unit tests.

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::flip::{FlipConfig, FlipError, PageFlip};
use crate::recipe::{NewRecipe, Recipe, RecipeId, RecipePatch};
use crate::repository::{
    AuthError, AuthProvider, ImageFile, RecipeRepository, RepositoryError, UploadedImage,
};

pub fn recipe(id: &str, title: &str) -> Recipe {
    Recipe {
        id: RecipeId::from(id),
        title: String::from(title),
        prep_time: String::from("10 mins"),
        cook_time: String::from("15 mins"),
        ingredients: Vec::new(),
        instructions: String::new(),
        image_url: String::new(),
        tags: BTreeSet::new(),
        owner_id: None,
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    recipes: RefCell<Vec<Recipe>>,
    next_id: Cell<u32>,
    fail_fetch: Cell<bool>,
    fail_writes: Cell<bool>,
    pub uploads: RefCell<Vec<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(100),
            ..Self::default()
        }
    }

    pub fn insert(&self, recipe: Recipe) {
        self.recipes.borrow_mut().push(recipe);
    }

    pub fn fail_next_fetch(&self) {
        self.fail_fetch.set(true);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_writes(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.get() {
            return Err(RepositoryError::Unavailable(String::from("offline")));
        }
        Ok(())
    }
}

impl RecipeRepository for MemoryRepository {
    async fn fetch_published(&self) -> Result<Vec<Recipe>, RepositoryError> {
        if self.fail_fetch.replace(false) {
            return Err(RepositoryError::Unavailable(String::from("offline")));
        }
        Ok(self.recipes.borrow().clone())
    }

    async fn create(&self, new: NewRecipe) -> Result<Recipe, RepositoryError> {
        self.check_writes()?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let created = Recipe {
            id: RecipeId::new(format!("{}", id)),
            title: new.title,
            prep_time: new.prep_time,
            cook_time: new.cook_time,
            ingredients: new.ingredients,
            instructions: new.instructions,
            image_url: new.image_path.map(|path| format!("mem://{}", path)).unwrap_or_default(),
            tags: new.tags,
            owner_id: new.owner_id,
        };
        self.recipes.borrow_mut().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &RecipeId, patch: RecipePatch) -> Result<Recipe, RepositoryError> {
        self.check_writes()?;
        let mut recipes = self.recipes.borrow_mut();
        let recipe = recipes
            .iter_mut()
            .find(|recipe| &recipe.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        if let Some(title) = patch.title {
            recipe.title = title;
        }
        if let Some(prep_time) = patch.prep_time {
            recipe.prep_time = prep_time;
        }
        if let Some(cook_time) = patch.cook_time {
            recipe.cook_time = cook_time;
        }
        if let Some(ingredients) = patch.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(instructions) = patch.instructions {
            recipe.instructions = instructions;
        }
        if let Some(image_path) = patch.image_path {
            recipe.image_url = image_path.map(|path| format!("mem://{}", path)).unwrap_or_default();
        }
        if let Some(tags) = patch.tags {
            recipe.tags = tags;
        }
        Ok(recipe.clone())
    }

    async fn delete(&self, id: &RecipeId) -> Result<(), RepositoryError> {
        self.check_writes()?;
        let mut recipes = self.recipes.borrow_mut();
        let before = recipes.len();
        recipes.retain(|recipe| &recipe.id != id);
        if recipes.len() == before {
            return Err(RepositoryError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn upload_image(&self, file: &ImageFile) -> Result<UploadedImage, RepositoryError> {
        self.check_writes()?;
        let path = format!("uploads/{}", file.name);
        self.uploads.borrow_mut().push(path.clone());
        Ok(UploadedImage {
            public_url: format!("mem://{}", path),
            path,
        })
    }
}

pub struct StaticAuth {
    user: RefCell<Option<String>>,
    pub fail: Cell<bool>,
}

impl StaticAuth {
    pub fn signed_in(user: &str) -> Self {
        Self {
            user: RefCell::new(Some(String::from(user))),
            fail: Cell::new(false),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user: RefCell::new(None),
            fail: Cell::new(false),
        }
    }
}

impl AuthProvider for StaticAuth {
    async fn current_user_id(&self) -> Result<Option<String>, AuthError> {
        if self.fail.get() {
            return Err(AuthError::Unavailable(String::from("offline")));
        }
        Ok(self.user.borrow().clone())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.fail.get() {
            return Err(AuthError::Unavailable(String::from("offline")));
        }
        self.user.replace(None);
        Ok(())
    }
}

/// Widget double that records successful flips. It can refuse the first few
/// calls to model a widget that is still mounting.
#[derive(Default)]
pub struct RecordingFlip {
    pub flips: Vec<usize>,
    pub attempts: usize,
    pub config: Option<FlipConfig>,
    not_ready_calls: usize,
}

impl RecordingFlip {
    pub fn ready() -> Self {
        Self::default()
    }

    pub fn not_ready_for(calls: usize) -> Self {
        Self {
            not_ready_calls: calls,
            ..Self::default()
        }
    }
}

impl PageFlip for RecordingFlip {
    fn flip(&mut self, index: usize) -> Result<(), FlipError> {
        self.attempts += 1;
        if self.not_ready_calls > 0 {
            self.not_ready_calls -= 1;
            return Err(FlipError::NotReady);
        }
        self.flips.push(index);
        Ok(())
    }

    fn configure(&mut self, config: &FlipConfig) {
        self.config = Some(*config);
    }
}
