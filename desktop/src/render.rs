use std::collections::HashMap;

use cookbook_core::book::Book;
use cookbook_core::editor::{DraftField, EditorMode, EditorSession};
use cookbook_core::layout::PageGeometry;
use cookbook_core::repository::{AuthProvider, RecipeRepository};
use cookbook_core::scheme::PageSlot;
use embedded_graphics::{
    Drawable,
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{FONT_6X13, FONT_8X13, FONT_8X13_BOLD, FONT_10X20},
    },
    pixelcolor::Rgb888,
    prelude::{Point, Primitive, Size},
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use image::imageops::FilterType;

use crate::controls::Controls;
use crate::display::{Canvas, pack};
use crate::flipbook::FlipBook;

const DESK: Rgb888 = Rgb888::new(58, 50, 44);
const TOOLBAR: Rgb888 = Rgb888::new(36, 31, 27);
const PAPER: Rgb888 = Rgb888::new(250, 246, 238);
const EDGE: Rgb888 = Rgb888::new(205, 196, 182);
const INK: Rgb888 = Rgb888::new(40, 34, 28);
const MUTED: Rgb888 = Rgb888::new(120, 110, 98);
const ACCENT: Rgb888 = Rgb888::new(150, 60, 40);
const COVER: Rgb888 = Rgb888::new(118, 38, 30);
const PLACEHOLDER: Rgb888 = Rgb888::new(226, 218, 204);

const MARGIN: i32 = 24;
const TOOLBAR_HEIGHT: i32 = 22;
const AUTHOR: &str = "Reece D'Souza";

const FOREWORD: [&str; 3] = [
    "Cooking is one of the simplest ways to turn time into care. It slows us down long enough to notice ingredients and to share something nourishing with the people around us.",
    "Treat these recipes as starting points. Taste often, season with intention, and let your preferences shape the final result.",
    "Don't worry about perfection. Enjoy the process, and may this book make your kitchen feel a little more welcoming.",
];

struct Picture {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

struct Cached {
    bounds: (u32, u32),
    picture: Option<Picture>,
}

/// Decoded recipe photos, one per URL at the last box they were scaled into.
#[derive(Default)]
pub struct ImageCache {
    pictures: HashMap<String, Cached>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.pictures.clear();
    }

    fn get(&mut self, url: &str, width: u32, height: u32) -> Option<&Picture> {
        let bounds = (width, height);
        let cached = self.pictures.entry(url.to_string()).or_insert_with(|| Cached {
            bounds,
            picture: decode(url, width, height),
        });
        if cached.bounds != bounds {
            cached.bounds = bounds;
            cached.picture = decode(url, width, height);
        }
        cached.picture.as_ref()
    }
}

fn decode(url: &str, width: u32, height: u32) -> Option<Picture> {
    let image = match image::open(url) {
        Ok(image) => image,
        Err(err) => {
            log::warn!("Cannot load image {}: {}", url, err);
            return None;
        }
    };
    let rgb = image.resize(width.max(1), height.max(1), FilterType::Triangle).to_rgb8();
    Some(Picture {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
        pixels: rgb
            .pixels()
            .map(|pixel| {
                let [r, g, b] = pixel.0;
                pack(Rgb888::new(r, g, b))
            })
            .collect(),
    })
}

/// Top-left corner of the book, centered in the window.
pub fn book_origin(canvas: Size, geometry: PageGeometry) -> Point {
    let x = (canvas.width as i32 - geometry.spread_width() as i32) / 2;
    let y = (canvas.height as i32 - geometry.page_height as i32) / 2;
    Point::new(x.max(0), y.max(0))
}

/// Greedy word wrap to `columns` characters. Blank lines are kept and
/// words longer than a line are split.
pub fn wrap(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            while word.chars().count() > columns {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let split = word.char_indices().nth(columns).map_or(word.len(), |(i, _)| i);
                lines.push(word[..split].to_string());
                word = &word[split..];
            }
            if word.is_empty() {
                continue;
            }
            let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > columns && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

fn advance(font: &MonoFont<'_>) -> u32 {
    font.character_size.width + font.character_spacing
}

fn line_height(font: &MonoFont<'_>) -> i32 {
    font.character_size.height as i32 + 4
}

fn columns(width: u32, font: &MonoFont<'_>) -> usize {
    (width / advance(font)).max(1) as usize
}

fn text_width(text: &str, font: &MonoFont<'_>) -> i32 {
    (text.chars().count() as u32 * advance(font)) as i32
}

fn fill(canvas: &mut Canvas, area: Rectangle, color: Rgb888) {
    area.into_styled(PrimitiveStyle::with_fill(color)).draw(canvas).ok();
}

fn outline(canvas: &mut Canvas, area: Rectangle, color: Rgb888) {
    area.into_styled(PrimitiveStyle::with_stroke(color, 1)).draw(canvas).ok();
}

fn label(canvas: &mut Canvas, text: &str, position: Point, font: &MonoFont<'_>, color: Rgb888) {
    Text::with_baseline(text, position, MonoTextStyle::new(font, color), Baseline::Top)
        .draw(canvas)
        .ok();
}

fn centered(canvas: &mut Canvas, text: &str, area: Rectangle, y: i32, font: &MonoFont<'_>, color: Rgb888) {
    let x = area.top_left.x + (area.size.width as i32 - text_width(text, font)) / 2;
    label(canvas, text, Point::new(x, y), font, color);
}

/// Flowing text inside a page, top to bottom.
struct Column {
    left: i32,
    width: u32,
    y: i32,
    bottom: i32,
}

impl Column {
    fn inside(area: Rectangle, margin: i32) -> Self {
        Self {
            left: area.top_left.x + margin,
            width: (area.size.width as i32 - margin * 2).max(1) as u32,
            y: area.top_left.y + margin,
            bottom: area.top_left.y + area.size.height as i32 - margin,
        }
    }

    /// Returns false once the column is full.
    fn write(&mut self, canvas: &mut Canvas, text: &str, font: &MonoFont<'_>, color: Rgb888) -> bool {
        let height = line_height(font);
        for line in wrap(text, columns(self.width, font)) {
            if self.y + height > self.bottom {
                return false;
            }
            label(canvas, &line, Point::new(self.left, self.y), font, color);
            self.y += height;
        }
        true
    }

    fn gap(&mut self, pixels: i32) {
        self.y += pixels;
    }
}

pub fn draw_frame<R: RecipeRepository, A: AuthProvider>(
    canvas: &mut Canvas,
    images: &mut ImageCache,
    book: &Book<R, A>,
    flipbook: &FlipBook,
    controls: &Controls,
    working: bool,
) {
    fill(canvas, Rectangle::new(Point::zero(), size_of(canvas)), DESK);

    if let Some(geometry) = flipbook.geometry() {
        let origin = book_origin(size_of(canvas), geometry);
        let page = Size::new(geometry.page_width, geometry.page_height);
        let right = Point::new(origin.x + geometry.page_width as i32, origin.y);
        match flipbook.visible_pages() {
            (left, Some(right_page)) => {
                draw_page(canvas, images, book, controls, left, Rectangle::new(origin, page));
                draw_page(canvas, images, book, controls, right_page, Rectangle::new(right, page));
            }
            // The cover sits on the right-hand side of an open spread.
            (0, None) if !geometry.portrait => {
                draw_page(canvas, images, book, controls, 0, Rectangle::new(right, page));
            }
            (single, None) => {
                draw_page(canvas, images, book, controls, single, Rectangle::new(origin, page));
            }
        }
        draw_turn(canvas, flipbook, origin, geometry);
    }

    draw_toolbar(canvas, book, flipbook);
    if let Some(session) = book.editor() {
        draw_editor(canvas, session, controls);
    }
    if let Some(notice) = book.notice() {
        draw_notice(canvas, notice);
    }
    if working || book.busy().is_busy() {
        draw_busy(canvas);
    }
}

fn size_of(canvas: &Canvas) -> Size {
    Size::new(canvas.width() as u32, canvas.height() as u32)
}

fn draw_page<R: RecipeRepository, A: AuthProvider>(
    canvas: &mut Canvas,
    images: &mut ImageCache,
    book: &Book<R, A>,
    controls: &Controls,
    index: usize,
    area: Rectangle,
) {
    let Some(slot) = book.scheme().slot_at(index) else {
        return;
    };
    let background = match slot {
        PageSlot::Cover | PageSlot::BackCover => COVER,
        _ => PAPER,
    };
    fill(canvas, area, background);
    outline(canvas, area, EDGE);

    let top = area.top_left.y;
    let height = area.size.height as i32;
    match slot {
        PageSlot::Cover => {
            centered(canvas, "COOKBOOK", area, top + height / 3, &FONT_10X20, PAPER);
            centered(canvas, "Recipes worth keeping", area, top + height / 3 + 32, &FONT_8X13, PLACEHOLDER);
        }
        PageSlot::Blank => {}
        PageSlot::Author => {
            centered(canvas, "By", area, top + height / 2 - 28, &FONT_8X13, MUTED);
            centered(canvas, AUTHOR, area, top + height / 2, &FONT_10X20, INK);
        }
        PageSlot::Foreword => {
            let mut column = Column::inside(area, MARGIN);
            column.write(canvas, "Foreword", &FONT_10X20, INK);
            for paragraph in FOREWORD {
                column.gap(8);
                if !column.write(canvas, paragraph, &FONT_8X13, INK) {
                    break;
                }
            }
        }
        PageSlot::Contents => draw_contents(canvas, book, controls, area),
        PageSlot::RecipeImage(recipe) => draw_recipe_image(canvas, images, book, recipe, area),
        PageSlot::RecipeText(recipe) => draw_recipe_text(canvas, book, recipe, area),
        PageSlot::NoRecipes => {
            centered(canvas, "No recipes yet.", area, top + height / 2 - 20, &FONT_10X20, INK);
            centered(canvas, "Press A to add the first one.", area, top + height / 2 + 8, &FONT_8X13, MUTED);
        }
        PageSlot::BackCover => {
            let line = format!("(c) {}", AUTHOR);
            centered(canvas, &line, area, top + height - MARGIN - 16, &FONT_8X13, PLACEHOLDER);
        }
    }

    if !matches!(slot, PageSlot::Cover | PageSlot::BackCover) {
        let number = (index + 1).to_string();
        centered(canvas, &number, area, top + height - 20, &FONT_6X13, MUTED);
    }
}

fn draw_contents<R: RecipeRepository, A: AuthProvider>(
    canvas: &mut Canvas,
    book: &Book<R, A>,
    controls: &Controls,
    area: Rectangle,
) {
    let mut column = Column::inside(area, MARGIN);
    column.write(canvas, "Contents", &FONT_10X20, INK);
    if controls.searching || !book.search().is_empty() {
        let cursor = if controls.searching { "_" } else { "" };
        column.write(canvas, &format!("Search: {}{}", book.search(), cursor), &FONT_8X13, ACCENT);
    }
    column.gap(6);

    let entries = book.contents();
    if entries.is_empty() {
        column.write(canvas, "Nothing matches.", &FONT_8X13, MUTED);
        return;
    }

    let font = &FONT_8X13;
    let height = line_height(font);
    let rows = ((column.bottom - 24 - column.y) / height).max(1) as usize;
    let first = controls.selected.saturating_sub(rows - 1);
    let width = columns(column.width, font);
    for (position, entry) in entries.iter().enumerate().skip(first).take(rows) {
        let number = (entry.page_index + 1).to_string();
        let room = width.saturating_sub(number.chars().count() + 1);
        let title: String = entry.title.chars().take(room).collect();
        let dots = width.saturating_sub(title.chars().count() + number.chars().count());
        let line = format!("{}{}{}", title, ".".repeat(dots), number);
        let color = if position == controls.selected {
            fill(
                canvas,
                Rectangle::new(
                    Point::new(column.left - 4, column.y - 2),
                    Size::new(column.width + 8, height as u32),
                ),
                ACCENT,
            );
            PAPER
        } else {
            INK
        };
        label(canvas, &line, Point::new(column.left, column.y), font, color);
        column.y += height;
    }
}

fn draw_recipe_image<R: RecipeRepository, A: AuthProvider>(
    canvas: &mut Canvas,
    images: &mut ImageCache,
    book: &Book<R, A>,
    recipe: usize,
    area: Rectangle,
) {
    let Some(recipe) = book.recipe(recipe) else {
        return;
    };
    let inner = Rectangle::new(
        area.top_left + Point::new(MARGIN, MARGIN),
        Size::new(
            area.size.width.saturating_sub(MARGIN as u32 * 2),
            area.size.height.saturating_sub(MARGIN as u32 * 2 + 16),
        ),
    );
    if recipe.has_image() {
        if let Some(picture) = images.get(&recipe.image_url, inner.size.width, inner.size.height) {
            let x = inner.top_left.x + (inner.size.width as i32 - picture.width as i32) / 2;
            let y = inner.top_left.y + (inner.size.height as i32 - picture.height as i32) / 2;
            canvas.blit(x, y, picture.width, picture.height, &picture.pixels);
            return;
        }
    }
    fill(canvas, inner, PLACEHOLDER);
    let middle = inner.top_left.y + inner.size.height as i32 / 2;
    let lines = wrap(&recipe.title, columns(inner.size.width.saturating_sub(16), &FONT_10X20));
    let mut y = middle - lines.len() as i32 * line_height(&FONT_10X20) / 2 - 10;
    for line in &lines {
        centered(canvas, line, inner, y, &FONT_10X20, MUTED);
        y += line_height(&FONT_10X20);
    }
    centered(canvas, "No photo", inner, y + 8, &FONT_8X13, MUTED);
}

fn draw_recipe_text<R: RecipeRepository, A: AuthProvider>(
    canvas: &mut Canvas,
    book: &Book<R, A>,
    index: usize,
    area: Rectangle,
) {
    let Some(recipe) = book.recipe(index) else {
        return;
    };
    let mut column = Column::inside(area, MARGIN);
    column.bottom -= 18;
    column.write(canvas, &recipe.title, &FONT_10X20, INK);
    let times = format!("Prep {}  |  Cook {}", or_dash(&recipe.prep_time), or_dash(&recipe.cook_time));
    column.write(canvas, &times, &FONT_6X13, MUTED);

    let mut room = true;
    if !recipe.ingredients.is_empty() {
        column.gap(8);
        room = column.write(canvas, "Ingredients", &FONT_8X13_BOLD, ACCENT);
        for ingredient in &recipe.ingredients {
            if !room {
                break;
            }
            room = column.write(canvas, &format!("- {}", ingredient), &FONT_8X13, INK);
        }
    }
    if room && !recipe.instructions.is_empty() {
        column.gap(8);
        room = column.write(canvas, "Steps", &FONT_8X13_BOLD, ACCENT)
            && column.write(canvas, &recipe.instructions, &FONT_8X13, INK);
    }
    if room && !recipe.tags.is_empty() {
        column.gap(8);
        let tags: Vec<String> = recipe.tags.iter().map(|tag| format!("#{}", tag)).collect();
        column.write(canvas, &tags.join(" "), &FONT_6X13, MUTED);
    }

    if book.can_edit(index) {
        label(
            canvas,
            "E: edit this recipe",
            Point::new(column.left, column.bottom),
            &FONT_6X13,
            ACCENT,
        );
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

/// Paper sheet sliding over the spread while a turn animates.
fn draw_turn(canvas: &mut Canvas, flipbook: &FlipBook, origin: Point, geometry: PageGeometry) {
    let Some(turn) = flipbook.turn() else {
        return;
    };
    let duration = flipbook.config().flipping_time_ms.max(1);
    let remaining = 1.0 - (turn.elapsed_ms.min(duration) as f32 / duration as f32);
    let page_width = geometry.page_width as i32;
    let width = (page_width as f32 * remaining) as i32;
    if width <= 0 {
        return;
    }
    let (x, edge) = match (geometry.portrait, turn.forward()) {
        (true, true) => (origin.x, origin.x + width),
        (true, false) => (origin.x + page_width - width, origin.x + page_width - width),
        (false, true) => (origin.x + page_width, origin.x + page_width + width),
        (false, false) => (origin.x + page_width - width, origin.x + page_width - width),
    };
    fill(
        canvas,
        Rectangle::new(Point::new(x, origin.y), Size::new(width as u32, geometry.page_height)),
        PAPER,
    );
    Line::new(
        Point::new(edge, origin.y),
        Point::new(edge, origin.y + geometry.page_height as i32),
    )
    .into_styled(PrimitiveStyle::with_stroke(MUTED, 2))
    .draw(canvas)
    .ok();
}

fn draw_toolbar<R: RecipeRepository, A: AuthProvider>(canvas: &mut Canvas, book: &Book<R, A>, flipbook: &FlipBook) {
    let width = canvas.width() as u32;
    fill(canvas, Rectangle::new(Point::zero(), Size::new(width, TOOLBAR_HEIGHT as u32)), TOOLBAR);
    let status = format!(
        "Page {}/{}  {}  {}",
        book.current_page() + 1,
        flipbook.page_count().max(1),
        if book.is_locked() { "[locked]" } else { "[unlocked]" },
        book.current_user().map_or_else(|| String::from("signed out"), |user| format!("user: {}", user)),
    );
    label(canvas, &status, Point::new(8, 4), &FONT_8X13, PAPER);
    let hints = "<- -> turn  C contents  L lock  / search  A add  E edit  R reload  S sign out";
    let x = width as i32 - text_width(hints, &FONT_6X13) - 8;
    if x > text_width(&status, &FONT_8X13) + 24 {
        label(canvas, hints, Point::new(x, 5), &FONT_6X13, PLACEHOLDER);
    }
}

fn draw_notice(canvas: &mut Canvas, notice: &str) {
    let size = size_of(canvas);
    let area = Rectangle::new(Point::new(0, size.height as i32 - 24), Size::new(size.width, 24));
    fill(canvas, area, ACCENT);
    label(canvas, notice, Point::new(8, area.top_left.y + 5), &FONT_8X13, PAPER);
}

fn draw_busy(canvas: &mut Canvas) {
    let size = size_of(canvas);
    let area = Rectangle::new(
        Point::new(size.width as i32 / 2 - 80, size.height as i32 / 2 - 20),
        Size::new(160, 40),
    );
    fill(canvas, area, TOOLBAR);
    outline(canvas, area, PAPER);
    centered(canvas, "Working...", area, area.top_left.y + 12, &FONT_8X13, PAPER);
}

fn draw_editor(canvas: &mut Canvas, session: &EditorSession, controls: &Controls) {
    let size = size_of(canvas);
    let width = size.width.saturating_sub(40).min(760);
    let height = size.height.saturating_sub(TOOLBAR_HEIGHT as u32 + 40);
    let panel = Rectangle::new(
        Point::new((size.width as i32 - width as i32) / 2, TOOLBAR_HEIGHT + 20),
        Size::new(width, height),
    );
    fill(canvas, panel, PAPER);
    outline(canvas, panel, ACCENT);

    let mut column = Column::inside(panel, 20);
    column.write(canvas, session.title(), &FONT_10X20, INK);
    column.gap(4);
    let value_columns = columns(column.width, &FONT_8X13);
    for field in DraftField::ALL {
        let focused = field == session.focus;
        let marker = if focused { "> " } else { "  " };
        column.write(
            canvas,
            &format!("{}{}", marker, field.label()),
            &FONT_8X13_BOLD,
            if focused { ACCENT } else { INK },
        );
        let mut value = session.draft.field(field).to_string();
        if focused {
            value.push('_');
        }
        let mut lines = wrap(&value, value_columns.saturating_sub(2));
        let keep = if field.is_multiline() { 4 } else { 1 };
        if lines.len() > keep {
            lines.drain(..lines.len() - keep);
        }
        for line in lines {
            column.write(canvas, &format!("  {}", line), &FONT_8X13, INK);
        }
        column.gap(4);
    }

    let photo = match (&session.draft.image_file, session.draft.image_url.is_empty()) {
        (Some(file), _) => format!("Photo: {} (new)", file.name),
        (None, false) => format!("Photo: {}", session.draft.image_url),
        (None, true) => String::from("Photo: none"),
    };
    column.write(canvas, &photo, &FONT_8X13, MUTED);
    if let Some(prompt) = &controls.image_prompt {
        column.write(canvas, &format!("Image path: {}_", prompt), &FONT_8X13, ACCENT);
    }

    let mut hints = String::from("Tab next field  F2 save  F3 attach photo  F4 remove photo  Esc cancel");
    if matches!(session.mode, EditorMode::Edit(_)) {
        hints.push_str("  F8 delete");
    }
    let bottom = panel.top_left.y + panel.size.height as i32 - 24;
    label(canvas, &hints, Point::new(column.left, bottom), &FONT_6X13, MUTED);
}
