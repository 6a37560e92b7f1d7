use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::busy::BusyCounter;
use crate::contents::{ContentsEntry, contents};
use crate::editor::{EditorMode, EditorSession};
use crate::flip::{FlipConfig, PageFlip};
use crate::layout::{PageGeometry, ViewportMetrics};
use crate::lock::{FlipOutcome, LockMode};
use crate::navigation::Navigator;
use crate::recipe::{Recipe, RecipeId};
use crate::repository::{AuthProvider, RecipeRepository};
use crate::scheme::PageScheme;
use crate::store::RecipeStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no recipe at position {0}")]
    UnknownRecipe(usize),
    #[error("only the owner can edit this recipe")]
    NotOwner,
    #[error("the editor is already open")]
    AlreadyEditing,
}

/// Widget identity. A change means the page-flip widget must be rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountKey {
    pub portrait: bool,
    pub recipe_count: usize,
}

/// Everything the host needs to (re)build its page-flip widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountRequest {
    pub geometry: PageGeometry,
    pub page_count: usize,
    pub config: FlipConfig,
}

pub struct Book<R: RecipeRepository, A: AuthProvider> {
    store: RecipeStore<R>,
    auth: A,
    busy: BusyCounter,
    viewport: ViewportMetrics,
    geometry: PageGeometry,
    navigator: Navigator,
    mount_key: MountKey,
    mount_request: Option<MountRequest>,
    editor: Option<EditorSession>,
    current_user: Option<String>,
    search: String,
    notice: Option<String>,
}

impl<R: RecipeRepository, A: AuthProvider> Book<R, A> {
    pub fn new(repository: R, auth: A, viewport: ViewportMetrics, busy: BusyCounter) -> Self {
        let store = RecipeStore::new(repository);
        let scheme = store.scheme();
        let geometry = PageGeometry::compute(viewport);
        let mut book = Self {
            store,
            auth,
            busy,
            viewport,
            geometry,
            navigator: Navigator::new(scheme),
            mount_key: MountKey {
                portrait: geometry.portrait,
                recipe_count: scheme.recipe_count(),
            },
            mount_request: None,
            editor: None,
            current_user: None,
            search: String::new(),
            notice: None,
        };
        book.request_mount(0);
        book
    }

    /// Initial load of the collection and the signed-in user.
    pub async fn open(&mut self) {
        self.reload().await;
        self.refresh_user().await;
    }

    pub async fn reload(&mut self) {
        let _busy = self.busy.enter();
        self.store.load().await;
        self.sync_mount_key(self.navigator.current_page());
    }

    pub async fn refresh_user(&mut self) {
        let _busy = self.busy.enter();
        match self.auth.current_user_id().await {
            Ok(user) => {
                log::info!("Current user: {:?}", user);
                self.current_user = user;
            }
            Err(err) => {
                log::warn!("Could not determine current user: {}", err);
                self.current_user = None;
                self.notice = Some(format!("Sign-in check failed: {}", err));
            }
        }
    }

    /// Best effort; the local session is dropped either way.
    pub async fn sign_out(&mut self) {
        let _busy = self.busy.enter();
        if let Err(err) = self.auth.sign_out().await {
            log::warn!("Sign out failed: {}", err);
        }
        self.current_user = None;
    }

    pub fn recipes(&self) -> &[Recipe] {
        self.store.recipes()
    }

    pub fn recipe(&self, index: usize) -> Option<&Recipe> {
        self.store.get(index)
    }

    pub fn scheme(&self) -> &PageScheme {
        self.navigator.scheme()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn busy(&self) -> &BusyCounter {
        &self.busy
    }

    pub fn current_page(&self) -> usize {
        self.navigator.current_page()
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.navigator.is_locked()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        self.search.clear();
        self.search.push_str(query);
    }

    pub fn contents(&self) -> Vec<ContentsEntry<'_>> {
        contents(self.store.recipes(), self.navigator.scheme(), &self.search)
    }

    /// Recipe shown on the current page, image or text side.
    pub fn current_recipe(&self) -> Option<usize> {
        self.scheme().recipe_at(self.current_page())
    }

    pub fn can_edit(&self, recipe: usize) -> bool {
        self.store
            .get(recipe)
            .is_some_and(|recipe| recipe.is_owned_by(self.current_user.as_deref()))
    }

    pub fn flip_config(&self) -> FlipConfig {
        FlipConfig::new(self.geometry.portrait, self.current_page(), self.is_locked())
    }

    pub fn take_mount_request(&mut self) -> Option<MountRequest> {
        self.mount_request.take()
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        let viewport = ViewportMetrics::new(width, height);
        if viewport == self.viewport {
            return;
        }
        let orientation_changed = viewport.is_portrait() != self.viewport.is_portrait();
        self.viewport = viewport;
        self.geometry = PageGeometry::compute(viewport);
        if orientation_changed {
            self.on_orientation_change();
        } else if let Some(request) = self.mount_request.as_mut() {
            request.geometry = self.geometry;
        }
    }

    /// Rebuilds the layout from scratch: the widget is remounted at the
    /// cover with a fresh, unlocked navigation state.
    pub fn on_orientation_change(&mut self) {
        log::info!(
            "Orientation changed ({}x{}), remounting",
            self.viewport.width,
            self.viewport.height
        );
        self.geometry = PageGeometry::compute(self.viewport);
        self.navigator.reset(self.store.scheme());
        self.request_mount(0);
    }

    pub fn toggle_lock(&mut self, widget: &mut impl PageFlip) -> LockMode {
        let mode = self.navigator.toggle_lock();
        widget.configure(&self.flip_config());
        mode
    }

    pub fn go_to_contents(&mut self, widget: &mut impl PageFlip) -> bool {
        self.navigator.go_to_contents(widget)
    }

    pub fn go_to_recipe(&mut self, widget: &mut impl PageFlip, recipe: usize) -> bool {
        match self.navigator.go_to_recipe(widget, recipe) {
            Ok(issued) => issued,
            Err(err) => {
                log::warn!("Ignoring navigation request: {}", err);
                false
            }
        }
    }

    pub fn go_to_page(&mut self, widget: &mut impl PageFlip, index: usize, authorize_if_locked: bool) -> bool {
        match self.navigator.go_to_page(widget, index, authorize_if_locked) {
            Ok(issued) => issued,
            Err(err) => {
                log::warn!("Ignoring navigation request: {}", err);
                false
            }
        }
    }

    pub fn on_flip(&mut self, index: usize) -> FlipOutcome {
        self.navigator.on_flip(index)
    }

    pub fn tick(&mut self, widget: &mut impl PageFlip, elapsed_ms: u32) {
        self.navigator.tick(widget, elapsed_ms);
    }

    pub fn editor(&self) -> Option<&EditorSession> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditorSession> {
        self.editor.as_mut()
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn begin_add(&mut self) -> Result<(), EditError> {
        if self.editor.is_some() {
            return Err(EditError::AlreadyEditing);
        }
        self.editor = Some(EditorSession::add(self.current_page()));
        Ok(())
    }

    pub fn begin_edit(&mut self, recipe: usize) -> Result<(), EditError> {
        if self.editor.is_some() {
            return Err(EditError::AlreadyEditing);
        }
        let Some(found) = self.store.get(recipe) else {
            return Err(EditError::UnknownRecipe(recipe));
        };
        if !found.is_owned_by(self.current_user.as_deref()) {
            return Err(EditError::NotOwner);
        }
        self.editor = Some(EditorSession::edit(found, self.current_page()));
        Ok(())
    }

    pub fn cancel_editor(&mut self) {
        if let Some(session) = self.editor.take() {
            self.request_mount(session.return_page);
        }
    }

    /// Uploads the draft's image, writes the recipe and reopens the book at
    /// it. On failure the editor stays open with a notice.
    pub async fn save_editor(&mut self) -> bool {
        let Some(session) = self.editor.as_ref() else {
            return false;
        };
        if let Err(err) = session.draft.validate() {
            self.notice = Some(format!("{}", err));
            return false;
        }
        let session = session.clone();
        let _busy = self.busy.enter();

        let image_path = match &session.draft.image_file {
            Some(file) => match self.store.upload_image(file).await {
                Ok(uploaded) => Some(uploaded.path),
                Err(err) => {
                    log::error!("Image upload failed: {}", err);
                    self.notice = Some(format!("Image upload failed: {}", err));
                    return false;
                }
            },
            None => None,
        };

        let saved: Result<RecipeId, _> = match &session.mode {
            EditorMode::Add => {
                let recipe = session.draft.to_new_recipe(self.current_user.clone(), image_path);
                self.store.add(recipe).await
            }
            EditorMode::Edit(id) => {
                let Some(original) = self.store.position(id).and_then(|i| self.store.get(i)) else {
                    self.notice = Some(format!("Recipe {} no longer exists", id));
                    return false;
                };
                let patch = session.draft.to_patch(original, image_path);
                if patch.is_empty() {
                    Ok(id.clone())
                } else {
                    self.store.update(id, patch).await.map(|()| id.clone())
                }
            }
        };

        match saved {
            Ok(id) => {
                self.editor = None;
                let scheme = self.store.scheme();
                let start_page = self
                    .store
                    .position(&id)
                    .map_or(scheme.contents_index(), |i| scheme.recipe_text_index(i));
                self.request_mount(start_page);
                true
            }
            Err(err) => {
                log::error!("Saving recipe failed: {}", err);
                self.notice = Some(format!("Saving failed: {}", err));
                false
            }
        }
    }

    /// Deletes the recipe open in the editor and reopens the book at the
    /// contents page.
    pub async fn delete_editing_recipe(&mut self) -> bool {
        let Some(EditorMode::Edit(id)) = self.editor.as_ref().map(|session| session.mode.clone()) else {
            return false;
        };
        let _busy = self.busy.enter();
        match self.store.remove(&id).await {
            Ok(()) => {
                self.editor = None;
                self.request_mount(self.store.scheme().contents_index());
                true
            }
            Err(err) => {
                log::error!("Deleting recipe {} failed: {}", id, err);
                self.notice = Some(format!("Delete failed: {}", err));
                false
            }
        }
    }

    fn sync_mount_key(&mut self, start_page: usize) {
        let key = MountKey {
            portrait: self.geometry.portrait,
            recipe_count: self.store.len(),
        };
        if key != self.mount_key {
            self.request_mount(start_page);
        }
    }

    fn request_mount(&mut self, start_page: usize) {
        let scheme = self.store.scheme();
        self.navigator.remount(scheme, start_page);
        self.mount_key = MountKey {
            portrait: self.geometry.portrait,
            recipe_count: scheme.recipe_count(),
        };
        self.mount_request = Some(MountRequest {
            geometry: self.geometry,
            page_count: scheme.total_page_count(),
            config: self.flip_config(),
        });
    }
}
