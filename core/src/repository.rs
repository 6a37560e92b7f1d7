use alloc::string::String;
use alloc::vec::Vec;

use crate::recipe::{NewRecipe, Recipe, RecipeId, RecipePatch};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("recipe {0} not found")]
    NotFound(RecipeId),
    #[error("permission denied")]
    PermissionDenied,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
    #[error("session expired")]
    SessionExpired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedImage {
    /// Storage key, written to the recipe's `image_path`.
    pub path: String,
    pub public_url: String,
}

/// Remote recipe storage. Implementations enforce ownership on writes.
#[allow(async_fn_in_trait)]
pub trait RecipeRepository {
    /// Published recipes in creation order.
    async fn fetch_published(&self) -> Result<Vec<Recipe>, RepositoryError>;
    async fn create(&self, recipe: NewRecipe) -> Result<Recipe, RepositoryError>;
    async fn update(&self, id: &RecipeId, patch: RecipePatch) -> Result<Recipe, RepositoryError>;
    async fn delete(&self, id: &RecipeId) -> Result<(), RepositoryError>;
    async fn upload_image(&self, file: &ImageFile) -> Result<UploadedImage, RepositoryError>;
}

#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    async fn current_user_id(&self) -> Result<Option<String>, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
}
