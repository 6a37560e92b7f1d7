use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use cookbook_core::recipe::{NewRecipe, Recipe, RecipeId, RecipePatch};
use cookbook_core::repository::{
    AuthError, AuthProvider, ImageFile, RecipeRepository, RepositoryError, UploadedImage,
};
use serde::{Deserialize, Serialize};

const DATA_FILE: &str = "recipes.json";
const IMAGE_DIR: &str = "images";

/// One row of `recipes.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct StoredRecipe {
    id: u64,
    #[serde(default)]
    created_at: u64,
    title: String,
    image_path: Option<String>,
    cook_time: Option<String>,
    prep_time: Option<String>,
    ingredients: Option<Vec<String>>,
    instructions: Option<String>,
    is_published: Option<bool>,
    owner_id: Option<String>,
    tags: Option<Vec<String>>,
}

/// Signed-in user shared by the auth provider and the repository, which
/// checks ownership on every write.
#[derive(Clone, Debug, Default)]
pub struct EnvAuth {
    user: Rc<RefCell<Option<String>>>,
}

impl EnvAuth {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user: Rc::new(RefCell::new(user_id)),
        }
    }

    pub fn user(&self) -> Option<String> {
        self.user.borrow().clone()
    }
}

impl AuthProvider for EnvAuth {
    async fn current_user_id(&self) -> Result<Option<String>, AuthError> {
        Ok(self.user())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(user) = self.user.replace(None) {
            log::info!("Signed out {}", user);
        }
        Ok(())
    }
}

/// Recipes stored as JSON under a data directory, photos in `images/`.
pub struct FileRecipeRepository {
    root: PathBuf,
    auth: EnvAuth,
}

impl FileRecipeRepository {
    pub fn open<P: AsRef<Path>>(root: P, auth: EnvAuth) -> Result<Self, RepositoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(IMAGE_DIR)).map_err(io_error)?;
        let repository = Self { root, auth };
        if !repository.data_path().exists() {
            log::info!("No recipe file in {}, writing sample recipes", repository.root.display());
            repository.write_rows(&seed_rows())?;
        }
        Ok(repository)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    fn read_rows(&self) -> Result<Vec<StoredRecipe>, RepositoryError> {
        let data = match fs::read(self.data_path()) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(err)),
        };
        serde_json::from_slice(&data).map_err(|err| RepositoryError::Malformed(err.to_string()))
    }

    fn write_rows(&self, rows: &[StoredRecipe]) -> Result<(), RepositoryError> {
        let data = serde_json::to_vec_pretty(rows)
            .map_err(|err| RepositoryError::Malformed(err.to_string()))?;
        let path = self.data_path();
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, data).map_err(io_error)?;
        fs::rename(&temp, &path).map_err(io_error)
    }

    fn public_url(&self, image_path: Option<&str>) -> String {
        match image_path {
            Some(path) if !path.is_empty() => self.root.join(path).display().to_string(),
            _ => String::new(),
        }
    }

    fn to_recipe(&self, row: &StoredRecipe) -> Recipe {
        Recipe {
            id: RecipeId::new(row.id.to_string()),
            title: row.title.clone(),
            prep_time: row.prep_time.clone().unwrap_or_default(),
            cook_time: row.cook_time.clone().unwrap_or_default(),
            ingredients: row.ingredients.clone().unwrap_or_default(),
            instructions: row.instructions.clone().unwrap_or_default(),
            image_url: self.public_url(row.image_path.as_deref()),
            tags: row.tags.iter().flatten().cloned().collect(),
            owner_id: row.owner_id.clone(),
        }
    }

    /// Finds the row for `id` and checks the signed-in user owns it.
    fn owned_row(rows: &[StoredRecipe], id: &RecipeId, user: Option<&str>) -> Result<usize, RepositoryError> {
        let position = id
            .as_str()
            .parse::<u64>()
            .ok()
            .and_then(|key| rows.iter().position(|row| row.id == key))
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        match (rows[position].owner_id.as_deref(), user) {
            (Some(owner), Some(user)) if owner == user => Ok(position),
            _ => Err(RepositoryError::PermissionDenied),
        }
    }
}

impl RecipeRepository for FileRecipeRepository {
    async fn fetch_published(&self) -> Result<Vec<Recipe>, RepositoryError> {
        let mut rows = self.read_rows()?;
        rows.retain(|row| row.is_published == Some(true));
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows.iter().map(|row| self.to_recipe(row)).collect())
    }

    async fn create(&self, recipe: NewRecipe) -> Result<Recipe, RepositoryError> {
        let mut rows = self.read_rows()?;
        let id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        let created_at = rows
            .iter()
            .map(|row| row.created_at)
            .max()
            .unwrap_or(0)
            .max(now_millis())
            .saturating_add(1);
        let row = StoredRecipe {
            id,
            created_at,
            title: recipe.title,
            image_path: recipe.image_path,
            cook_time: Some(recipe.cook_time),
            prep_time: Some(recipe.prep_time),
            ingredients: Some(recipe.ingredients),
            instructions: Some(recipe.instructions),
            is_published: Some(true),
            owner_id: recipe.owner_id,
            tags: Some(recipe.tags.into_iter().collect()),
        };
        let created = self.to_recipe(&row);
        rows.push(row);
        self.write_rows(&rows)?;
        Ok(created)
    }

    async fn update(&self, id: &RecipeId, patch: RecipePatch) -> Result<Recipe, RepositoryError> {
        let mut rows = self.read_rows()?;
        let position = Self::owned_row(&rows, id, self.auth.user().as_deref())?;
        let row = &mut rows[position];
        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(prep_time) = patch.prep_time {
            row.prep_time = Some(prep_time);
        }
        if let Some(cook_time) = patch.cook_time {
            row.cook_time = Some(cook_time);
        }
        if let Some(ingredients) = patch.ingredients {
            row.ingredients = Some(ingredients);
        }
        if let Some(instructions) = patch.instructions {
            row.instructions = Some(instructions);
        }
        if let Some(image_path) = patch.image_path {
            row.image_path = image_path;
        }
        if let Some(tags) = patch.tags {
            row.tags = Some(tags.into_iter().collect());
        }
        let updated = self.to_recipe(row);
        self.write_rows(&rows)?;
        Ok(updated)
    }

    async fn delete(&self, id: &RecipeId) -> Result<(), RepositoryError> {
        let mut rows = self.read_rows()?;
        let position = Self::owned_row(&rows, id, self.auth.user().as_deref())?;
        rows.remove(position);
        self.write_rows(&rows)
    }

    async fn upload_image(&self, file: &ImageFile) -> Result<UploadedImage, RepositoryError> {
        let name = format!("{}-{}", now_millis(), sanitize_file_name(&file.name));
        let path = format!("{}/{}", IMAGE_DIR, name);
        fs::write(self.root.join(&path), &file.bytes).map_err(io_error)?;
        log::info!("Stored image {} ({} bytes)", path, file.bytes.len());
        Ok(UploadedImage {
            public_url: self.public_url(Some(&path)),
            path,
        })
    }
}

fn io_error(err: io::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image");
    let cleaned: String = base
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        String::from("image")
    } else {
        cleaned
    }
}

fn seed_rows() -> Vec<StoredRecipe> {
    let samples: [(&str, &str, &str, &[&str], &str, &[&str]); 6] = [
        (
            "Spaghetti Carbonara",
            "10 mins",
            "15 mins",
            &["Spaghetti", "Eggs", "Pancetta", "Parmesan Cheese", "Black Pepper"],
            "Cook spaghetti. Fry pancetta. Mix eggs and cheese. Combine everything. Serve with pepper.",
            &["pasta", "dinner"],
        ),
        (
            "Chicken Curry",
            "15 mins",
            "20 mins",
            &["Chicken Breast", "Onion", "Garlic", "Ginger", "Coconut Milk", "Curry Powder"],
            "Saute onions, garlic and ginger. Add chicken and cook. Stir in curry powder, then add coconut milk. Simmer until the chicken is cooked through.",
            &["spicy", "dinner"],
        ),
        (
            "Chocolate Cake",
            "20 mins",
            "35 mins",
            &["Flour", "Sugar", "Cocoa Powder", "Baking Soda", "Eggs", "Milk", "Vegetable Oil"],
            "Mix dry ingredients. Add wet ingredients and mix until smooth. Bake at 175C for 30-35 minutes.",
            &["dessert", "baking"],
        ),
        (
            "Caesar Salad",
            "15 mins",
            "0 mins",
            &["Romaine Lettuce", "Croutons", "Parmesan Cheese", "Caesar Dressing", "Chicken (optional)"],
            "Toss lettuce with dressing. Top with croutons and cheese. Add grilled chicken if desired.",
            &["salad", "quick"],
        ),
        (
            "Grilled Salmon",
            "10 mins",
            "12 mins",
            &["Salmon Fillets", "Lemon", "Olive Oil", "Salt", "Pepper", "Dill"],
            "Season salmon, grill skin-side down until nearly done, flip briefly. Finish with lemon and dill.",
            &["fish", "quick"],
        ),
        (
            "Lentil Soup",
            "10 mins",
            "35 mins",
            &["Lentils", "Carrot", "Celery", "Onion", "Tomatoes", "Stock"],
            "Saute aromatics, add lentils and stock, simmer until tender. Season and serve warm.",
            &["soup", "vegetarian"],
        ),
    ];

    samples
        .iter()
        .zip(1u64..)
        .map(|(&(title, prep, cook, ingredients, instructions, tags), id)| StoredRecipe {
            id,
            created_at: id,
            title: title.to_string(),
            image_path: None,
            cook_time: Some(cook.to_string()),
            prep_time: Some(prep.to_string()),
            ingredients: Some(ingredients.iter().map(|item| item.to_string()).collect()),
            instructions: Some(instructions.to_string()),
            is_published: Some(true),
            owner_id: None,
            tags: Some(tags.iter().map(|tag| tag.to_string()).collect()),
        })
        .collect()
}
