use std::fs;
use std::path::Path;

use cookbook_core::book::Book;
use cookbook_core::flip::PageFlip;
use cookbook_core::repository::{AuthProvider, ImageFile, RecipeRepository};
use embedded_graphics::prelude::Point;
use minifb::Key;

use crate::display::MouseState;
use crate::flipbook::FlipBook;

/// Work that needs the repository; the main loop runs it after showing the
/// busy overlay for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Save,
    Delete,
    Reload,
    SignOut,
}

/// Host-side interaction state: contents selection, search entry and the
/// editor's image path prompt.
#[derive(Debug, Default)]
pub struct Controls {
    pub selected: usize,
    pub searching: bool,
    pub image_prompt: Option<String>,
}

impl Controls {
    pub fn handle_keys<R: RecipeRepository, A: AuthProvider>(
        &mut self,
        keys: &[Key],
        typed: &[char],
        book: &mut Book<R, A>,
        flipbook: &mut FlipBook,
    ) -> Option<Command> {
        if book.is_editing() {
            return self.handle_editor(keys, typed, book);
        }
        if self.searching {
            self.handle_search(keys, typed, book);
            return None;
        }

        let mut command = None;
        for key in keys {
            match key {
                Key::Right | Key::PageDown | Key::Space => {
                    flipbook.turn_forward();
                }
                Key::Left | Key::PageUp => {
                    flipbook.turn_back();
                }
                Key::C => {
                    book.go_to_contents(flipbook);
                }
                Key::L => {
                    let mode = book.toggle_lock(flipbook);
                    book.set_notice(format!("Navigation {:?}", mode).to_lowercase());
                }
                Key::Home => {
                    book.go_to_page(flipbook, 0, false);
                }
                Key::End => {
                    let back_cover = book.scheme().back_cover_index();
                    book.go_to_page(flipbook, back_cover, false);
                }
                Key::Up => self.selected = self.selected.saturating_sub(1),
                Key::Down => self.selected = self.selected.saturating_add(1),
                Key::Enter => self.open_selected(book, flipbook),
                Key::Slash => self.searching = true,
                Key::A => {
                    if let Err(err) = book.begin_add() {
                        book.set_notice(err.to_string());
                    }
                }
                Key::E => match book.current_recipe() {
                    Some(recipe) => {
                        if let Err(err) = book.begin_edit(recipe) {
                            book.set_notice(err.to_string());
                        }
                    }
                    None => book.set_notice("Turn to a recipe to edit it"),
                },
                Key::R => command = Some(Command::Reload),
                Key::S => command = Some(Command::SignOut),
                _ => {}
            }
        }
        self.clamp_selection(book);
        command
    }

    pub fn handle_mouse<R: RecipeRepository, A: AuthProvider>(
        &mut self,
        mouse: MouseState,
        origin: Point,
        book: &Book<R, A>,
        flipbook: &mut FlipBook,
    ) {
        if book.is_editing() {
            return;
        }
        let Some(geometry) = flipbook.geometry() else {
            return;
        };
        let x = mouse.x - origin.x;
        let y = mouse.y - origin.y;
        if mouse.pressed {
            let inside = x >= 0
                && y >= 0
                && x < geometry.spread_width() as i32
                && y < geometry.page_height as i32;
            if inside {
                flipbook.press(x);
            }
        }
        if mouse.released {
            flipbook.release(x);
        }
    }

    fn open_selected<R: RecipeRepository, A: AuthProvider>(&mut self, book: &mut Book<R, A>, widget: &mut impl PageFlip) {
        let recipe = book.contents().get(self.selected).map(|entry| entry.recipe_index);
        if let Some(recipe) = recipe {
            book.go_to_recipe(widget, recipe);
        }
    }

    fn clamp_selection<R: RecipeRepository, A: AuthProvider>(&mut self, book: &Book<R, A>) {
        let entries = book.contents().len();
        self.selected = self.selected.min(entries.saturating_sub(1));
    }

    fn handle_search<R: RecipeRepository, A: AuthProvider>(&mut self, keys: &[Key], typed: &[char], book: &mut Book<R, A>) {
        let mut query = book.search().to_string();
        query.extend(typed.iter());
        for key in keys {
            match key {
                Key::Backspace => {
                    query.pop();
                }
                Key::Enter => self.searching = false,
                Key::Escape => {
                    query.clear();
                    self.searching = false;
                }
                _ => {}
            }
        }
        if query != book.search() {
            book.set_search(&query);
            self.selected = 0;
        }
    }

    fn handle_editor<R: RecipeRepository, A: AuthProvider>(
        &mut self,
        keys: &[Key],
        typed: &[char],
        book: &mut Book<R, A>,
    ) -> Option<Command> {
        if self.image_prompt.is_some() {
            self.handle_image_prompt(keys, typed, book);
            return None;
        }

        let mut command = None;
        let mut cancel = false;
        if let Some(session) = book.editor_mut() {
            for &ch in typed {
                session.type_char(ch);
            }
            for key in keys {
                match key {
                    Key::Enter => session.type_char('\n'),
                    Key::Tab => session.focus_next(),
                    Key::Backspace => session.backspace(),
                    Key::F2 => command = Some(Command::Save),
                    Key::F3 => self.image_prompt = Some(String::new()),
                    Key::F4 => session.draft.remove_image(),
                    Key::F8 => command = Some(Command::Delete),
                    Key::Escape => cancel = true,
                    _ => {}
                }
            }
        }
        if cancel {
            book.cancel_editor();
            return None;
        }
        command
    }

    fn handle_image_prompt<R: RecipeRepository, A: AuthProvider>(
        &mut self,
        keys: &[Key],
        typed: &[char],
        book: &mut Book<R, A>,
    ) {
        let Some(prompt) = self.image_prompt.as_mut() else {
            return;
        };
        prompt.extend(typed.iter());
        for key in keys {
            match key {
                Key::Backspace => {
                    prompt.pop();
                }
                Key::Escape => {
                    self.image_prompt = None;
                    return;
                }
                Key::Enter => {
                    let path = prompt.trim().to_string();
                    self.image_prompt = None;
                    match read_image_file(Path::new(&path)) {
                        Ok(file) => {
                            if let Some(session) = book.editor_mut() {
                                session.draft.attach_image(file);
                            }
                        }
                        Err(err) => {
                            log::warn!("Cannot attach {}: {}", path, err);
                            book.set_notice(format!("Cannot read {}: {}", path, err));
                        }
                    }
                    return;
                }
                _ => {}
            }
        }
    }
}

fn read_image_file(path: &Path) -> std::io::Result<ImageFile> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map_or_else(|| String::from("image"), |name| name.to_string_lossy().into_owned());
    Ok(ImageFile { name, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flipbook::MOUNT_DELAY_MS;
    use crate::repository::{EnvAuth, FileRecipeRepository};
    use cookbook_core::busy::BusyCounter;
    use cookbook_core::flip::FLIPPING_TIME_MS;
    use cookbook_core::layout::ViewportMetrics;
    use embassy_futures::block_on;

    fn open(user: Option<&str>) -> (tempfile::TempDir, Book<FileRecipeRepository, EnvAuth>, FlipBook) {
        let dir = tempfile::tempdir().unwrap();
        let auth = EnvAuth::new(user.map(str::to_string));
        let repository = FileRecipeRepository::open(dir.path(), auth.clone()).unwrap();
        let mut book = Book::new(repository, auth, ViewportMetrics::new(1000, 800), BusyCounter::new());
        block_on(book.open());
        let mut flipbook = FlipBook::default();
        flipbook.mount(&book.take_mount_request().unwrap());
        flipbook.tick(MOUNT_DELAY_MS);
        while let Some(index) = flipbook.poll_event() {
            book.on_flip(index);
        }
        (dir, book, flipbook)
    }

    #[test]
    fn search_then_enter_opens_matching_recipe() {
        let (_dir, mut book, mut flipbook) = open(None);
        let mut controls = Controls::default();

        controls.handle_keys(&[Key::Slash], &['/'], &mut book, &mut flipbook);
        assert!(controls.searching);
        controls.handle_keys(&[], &['s', 'o', 'u', 'p'], &mut book, &mut flipbook);
        assert_eq!(book.search(), "soup");
        controls.handle_keys(&[Key::Enter], &[], &mut book, &mut flipbook);
        assert!(!controls.searching);

        controls.handle_keys(&[Key::Enter], &[], &mut book, &mut flipbook);
        assert_eq!(flipbook.turn().map(|turn| turn.to), Some(16));
    }

    #[test]
    fn selection_stays_within_contents() {
        let (_dir, mut book, mut flipbook) = open(None);
        let mut controls = Controls::default();
        controls.handle_keys(&[Key::Down; 20], &[], &mut book, &mut flipbook);
        assert_eq!(controls.selected, 5);
        controls.handle_keys(&[Key::Up, Key::Up], &[], &mut book, &mut flipbook);
        assert_eq!(controls.selected, 3);
    }

    #[test]
    fn lock_key_blocks_contents_navigation() {
        let (_dir, mut book, mut flipbook) = open(None);
        let mut controls = Controls::default();
        controls.handle_keys(&[Key::L, Key::C], &[], &mut book, &mut flipbook);
        assert!(book.is_locked());
        assert_eq!(flipbook.turn(), None);
        assert!(!flipbook.config().use_mouse_events);
    }

    #[test]
    fn cover_keys_respect_the_lock() {
        let (_dir, mut book, mut flipbook) = open(None);
        let mut controls = Controls::default();
        controls.handle_keys(&[Key::Enter], &[], &mut book, &mut flipbook);
        flipbook.tick(FLIPPING_TIME_MS);
        while let Some(index) = flipbook.poll_event() {
            book.on_flip(index);
        }
        assert_eq!(book.current_page(), 6);

        controls.handle_keys(&[Key::L, Key::Home, Key::End], &[], &mut book, &mut flipbook);
        assert!(book.is_locked());
        assert_eq!(flipbook.turn(), None);
        book.tick(&mut flipbook, 16);
        assert_eq!(book.current_page(), 6);

        controls.handle_keys(&[Key::L, Key::Home], &[], &mut book, &mut flipbook);
        assert!(!book.is_locked());
        assert_eq!(flipbook.turn().map(|turn| turn.to), Some(0));
    }

    #[test]
    fn editor_keys_fill_the_draft() {
        let (_dir, mut book, mut flipbook) = open(Some("chef"));
        let mut controls = Controls::default();
        controls.handle_keys(&[Key::A], &['a'], &mut book, &mut flipbook);
        assert!(book.is_editing());

        controls.handle_keys(&[], &['T', 'e', 'a'], &mut book, &mut flipbook);
        controls.handle_keys(&[Key::Tab], &[], &mut book, &mut flipbook);
        controls.handle_keys(&[], &['5'], &mut book, &mut flipbook);
        let draft = &book.editor().unwrap().draft;
        assert_eq!(draft.title, "Tea");
        assert_eq!(draft.prep_time, "5");

        assert_eq!(
            controls.handle_keys(&[Key::F2], &[], &mut book, &mut flipbook),
            Some(Command::Save)
        );
        controls.handle_keys(&[Key::Escape], &[], &mut book, &mut flipbook);
        assert!(!book.is_editing());
    }

    #[test]
    fn missing_image_file_sets_notice() {
        let (dir, mut book, mut flipbook) = open(Some("chef"));
        let mut controls = Controls::default();
        controls.handle_keys(&[Key::A], &[], &mut book, &mut flipbook);
        controls.handle_keys(&[Key::F3], &[], &mut book, &mut flipbook);
        assert!(controls.image_prompt.is_some());

        let missing = dir.path().join("missing.png");
        let typed: Vec<char> = missing.to_string_lossy().chars().collect();
        controls.handle_keys(&[Key::Enter], &typed, &mut book, &mut flipbook);
        assert!(controls.image_prompt.is_none());
        assert!(book.notice().unwrap().starts_with("Cannot read"));

        let photo = dir.path().join("photo.jpg");
        fs::write(&photo, [1, 2, 3]).unwrap();
        controls.handle_keys(&[Key::F3], &[], &mut book, &mut flipbook);
        let typed: Vec<char> = photo.to_string_lossy().chars().collect();
        controls.handle_keys(&[Key::Enter], &typed, &mut book, &mut flipbook);
        let attached = book.editor().unwrap().draft.image_file.as_ref().unwrap();
        assert_eq!(attached.name, "photo.jpg");
    }
}
