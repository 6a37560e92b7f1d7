use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecipeId(String);

impl RecipeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecipeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub prep_time: String,
    pub cook_time: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    /// Public URL of the photo, empty when the recipe has none.
    pub image_url: String,
    pub tags: BTreeSet<String>,
    pub owner_id: Option<String>,
}

impl Recipe {
    /// Ownership check used to offer editing. The repository enforces
    /// ownership again on every write.
    pub fn is_owned_by(&self, user_id: Option<&str>) -> bool {
        match (self.owner_id.as_deref(), user_id) {
            (Some(owner), Some(user)) => owner == user,
            _ => false,
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}

/// Fields for a recipe that does not exist yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub prep_time: String,
    pub cook_time: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub image_path: Option<String>,
    pub tags: BTreeSet<String>,
    pub owner_id: Option<String>,
}

/// Partial update. `None` leaves a field untouched; `image_path: Some(None)`
/// removes the photo.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<String>,
    pub image_path: Option<Option<String>>,
    pub tags: Option<BTreeSet<String>>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
