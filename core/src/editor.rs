use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::recipe::{NewRecipe, Recipe, RecipeId, RecipePatch};
use crate::repository::ImageFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("a recipe needs a title")]
    MissingTitle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorMode {
    Add,
    Edit(RecipeId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftField {
    Title,
    PrepTime,
    CookTime,
    Ingredients,
    Instructions,
    Tags,
}

impl DraftField {
    pub const ALL: [DraftField; 6] = [
        DraftField::Title,
        DraftField::PrepTime,
        DraftField::CookTime,
        DraftField::Ingredients,
        DraftField::Instructions,
        DraftField::Tags,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DraftField::Title => "Title",
            DraftField::PrepTime => "Prep Time",
            DraftField::CookTime => "Cook Time",
            DraftField::Ingredients => "Ingredients (one per line)",
            DraftField::Instructions => "Steps",
            DraftField::Tags => "Tags (comma separated)",
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, DraftField::Ingredients | DraftField::Instructions)
    }

    pub fn next(&self) -> DraftField {
        let position = Self::ALL.iter().position(|field| field == self).unwrap_or(0);
        Self::ALL[(position + 1) % Self::ALL.len()]
    }
}

/// Raw form contents, as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipeDraft {
    pub title: String,
    pub prep_time: String,
    pub cook_time: String,
    pub ingredients: String,
    pub instructions: String,
    pub tags: String,
    pub image_url: String,
    pub image_file: Option<ImageFile>,
    pub remove_image: bool,
}

impl RecipeDraft {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            title: recipe.title.clone(),
            prep_time: recipe.prep_time.clone(),
            cook_time: recipe.cook_time.clone(),
            ingredients: recipe.ingredients.join("\n"),
            instructions: recipe.instructions.clone(),
            tags: recipe.tags.iter().cloned().collect::<Vec<_>>().join(", "),
            image_url: recipe.image_url.clone(),
            image_file: None,
            remove_image: false,
        }
    }

    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.title,
            DraftField::PrepTime => &self.prep_time,
            DraftField::CookTime => &self.cook_time,
            DraftField::Ingredients => &self.ingredients,
            DraftField::Instructions => &self.instructions,
            DraftField::Tags => &self.tags,
        }
    }

    pub fn field_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::Title => &mut self.title,
            DraftField::PrepTime => &mut self.prep_time,
            DraftField::CookTime => &mut self.cook_time,
            DraftField::Ingredients => &mut self.ingredients,
            DraftField::Instructions => &mut self.instructions,
            DraftField::Tags => &mut self.tags,
        }
    }

    pub fn attach_image(&mut self, file: ImageFile) {
        self.image_file = Some(file);
        self.remove_image = false;
    }

    pub fn remove_image(&mut self) {
        self.image_file = None;
        self.image_url.clear();
        self.remove_image = true;
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        if self.title.trim().is_empty() {
            return Err(EditorError::MissingTitle);
        }
        Ok(())
    }

    /// `image_path` is the storage key of an image uploaded for this save.
    pub fn to_new_recipe(&self, owner_id: Option<String>, image_path: Option<String>) -> NewRecipe {
        NewRecipe {
            title: self.title.trim().to_string(),
            prep_time: self.prep_time.trim().to_string(),
            cook_time: self.cook_time.trim().to_string(),
            ingredients: parse_ingredients(&self.ingredients),
            instructions: self.instructions.trim().to_string(),
            image_path,
            tags: parse_tags(&self.tags),
            owner_id,
        }
    }

    /// Only fields that differ from `original` end up in the patch.
    pub fn to_patch(&self, original: &Recipe, image_path: Option<String>) -> RecipePatch {
        let changed = |value: &str, before: &str| {
            let value = value.trim();
            (value != before).then(|| value.to_string())
        };
        let ingredients = parse_ingredients(&self.ingredients);
        let tags = parse_tags(&self.tags);
        RecipePatch {
            title: changed(&self.title, &original.title),
            prep_time: changed(&self.prep_time, &original.prep_time),
            cook_time: changed(&self.cook_time, &original.cook_time),
            ingredients: (ingredients != original.ingredients).then_some(ingredients),
            instructions: changed(&self.instructions, &original.instructions),
            image_path: match image_path {
                Some(path) => Some(Some(path)),
                None if self.remove_image && original.has_image() => Some(None),
                None => None,
            },
            tags: (tags != original.tags).then_some(tags),
        }
    }
}

pub fn parse_ingredients(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn parse_tags(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// An open editor: what is being edited, its draft, and the page to return
/// to on cancel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSession {
    pub mode: EditorMode,
    pub draft: RecipeDraft,
    pub focus: DraftField,
    pub return_page: usize,
}

impl EditorSession {
    pub fn add(return_page: usize) -> Self {
        Self {
            mode: EditorMode::Add,
            draft: RecipeDraft::default(),
            focus: DraftField::Title,
            return_page,
        }
    }

    pub fn edit(recipe: &Recipe, return_page: usize) -> Self {
        Self {
            mode: EditorMode::Edit(recipe.id.clone()),
            draft: RecipeDraft::from_recipe(recipe),
            focus: DraftField::Title,
            return_page,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            EditorMode::Add => "Add a new recipe",
            EditorMode::Edit(_) => "Edit recipe",
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn type_char(&mut self, ch: char) {
        if ch == '\n' && !self.focus.is_multiline() {
            self.focus_next();
            return;
        }
        self.draft.field_mut(self.focus).push(ch);
    }

    pub fn backspace(&mut self) {
        self.draft.field_mut(self.focus).pop();
    }
}
