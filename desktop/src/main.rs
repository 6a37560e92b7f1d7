use std::time::Instant;

use cookbook_core::{book::Book, busy::BusyCounter, layout::ViewportMetrics};
use embassy_futures::block_on;
use embedded_graphics::prelude::Size;

use crate::config::Config;
use crate::controls::{Command, Controls};
use crate::display::MinifbDisplay;
use crate::flipbook::FlipBook;
use crate::render::{ImageCache, book_origin, draw_frame};
use crate::repository::{EnvAuth, FileRecipeRepository};

mod config;
mod controls;
mod display;
mod flipbook;
mod render;
mod repository;

/// How long a notice stays on screen.
const NOTICE_MS: u32 = 4_000;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    log::info!(
        "Cookbook desktop started (data: {}, user: {:?})",
        config.data_dir.display(),
        config.user_id
    );

    let auth = EnvAuth::new(config.user_id.clone());
    let repository = match FileRecipeRepository::open(&config.data_dir, auth.clone()) {
        Ok(repository) => repository,
        Err(err) => {
            log::error!("Cannot open recipe data in {}: {}", config.data_dir.display(), err);
            std::process::exit(1);
        }
    };
    log::info!("Recipe data in {}", repository.root().display());

    let mut window = minifb::Window::new(
        "Cookbook",
        config.window_width as usize,
        config.window_height as usize,
        minifb::WindowOptions {
            resize: true,
            ..minifb::WindowOptions::default()
        },
    )
    .unwrap_or_else(|e| {
        panic!("Unable to open window: {}", e);
    });

    window.set_target_fps(60);

    let mut display = MinifbDisplay::new(window);
    let (width, height) = display.size();

    let busy = BusyCounter::new();
    let mut book = Book::new(repository, auth, ViewportMetrics::new(width, height), busy);
    block_on(book.open());

    let mut flipbook = FlipBook::default();
    let mut controls = Controls::default();
    let mut images = ImageCache::new();
    let mut pending: Option<Command> = None;
    let mut notice_ms = 0u32;
    let mut last_frame = Instant::now();

    while display.is_open() {
        let now = Instant::now();
        let elapsed_ms = u32::try_from(now.duration_since(last_frame).as_millis()).unwrap_or(u32::MAX);
        last_frame = now;

        // Commands run one frame after they were issued so the busy overlay
        // is on screen while they block.
        if let Some(command) = pending.take() {
            run(command, &mut book, &mut images);
        }

        let (width, height) = display.size();
        book.on_resize(width, height);
        if let Some(request) = book.take_mount_request() {
            flipbook.mount(&request);
        }
        flipbook.resize(book.geometry());

        let keys = display.keys_pressed();
        let typed = display.take_typed();
        pending = controls.handle_keys(&keys, &typed, &mut book, &mut flipbook);
        if let Some(geometry) = flipbook.geometry() {
            let origin = book_origin(Size::new(width, height), geometry);
            let mouse = display.mouse();
            controls.handle_mouse(mouse, origin, &book, &mut flipbook);
        }

        flipbook.tick(elapsed_ms);
        while let Some(index) = flipbook.poll_event() {
            let outcome = book.on_flip(index);
            log::debug!("Flip to {}: {:?}", index, outcome);
        }
        book.tick(&mut flipbook, elapsed_ms);

        if book.notice().is_some() {
            notice_ms = notice_ms.saturating_add(elapsed_ms);
            if notice_ms >= NOTICE_MS {
                book.take_notice();
                notice_ms = 0;
            }
        } else {
            notice_ms = 0;
        }

        draw_frame(
            display.canvas(),
            &mut images,
            &book,
            &flipbook,
            &controls,
            pending.is_some(),
        );
        display.present();
    }

    log::info!("Cookbook desktop closed");
}

fn run(command: Command, book: &mut Book<FileRecipeRepository, EnvAuth>, images: &mut ImageCache) {
    log::debug!("Running {:?}", command);
    match command {
        Command::Save => {
            block_on(book.save_editor());
        }
        Command::Delete => {
            block_on(book.delete_editing_recipe());
        }
        Command::Reload => {
            images.clear();
            block_on(book.reload());
        }
        Command::SignOut => {
            block_on(book.sign_out());
            book.set_notice("Signed out");
        }
    }
}
