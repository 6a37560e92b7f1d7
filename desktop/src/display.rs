use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_graphics::{
    Pixel,
    pixelcolor::{Rgb888, RgbColor},
    prelude::{DrawTarget, OriginDimensions, Size},
};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode};

/// XRGB pixel buffer the page renderer draws into.
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; width * height];
        }
    }

    /// Copies a packed XRGB block with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, x: i32, y: i32, width: usize, height: usize, source: &[u32]) {
        for row in 0..height {
            let target_y = y + row as i32;
            if target_y < 0 || target_y as usize >= self.height {
                continue;
            }
            for column in 0..width {
                let target_x = x + column as i32;
                if target_x < 0 || target_x as usize >= self.width {
                    continue;
                }
                if let Some(&pixel) = source.get(row * width + column) {
                    self.pixels[target_y as usize * self.width + target_x as usize] = pixel;
                }
            }
        }
    }
}

pub fn pack(color: Rgb888) -> u32 {
    0xFF00_0000 | (u32::from(color.r()) << 16) | (u32::from(color.g()) << 8) | u32::from(color.b())
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as usize);
            if x < self.width && y < self.height {
                self.pixels[y * self.width + x] = pack(color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(pack(color));
        Ok(())
    }
}

/// Collects characters typed into the window.
struct TypedChars {
    queue: Rc<RefCell<Vec<char>>>,
}

impl minifb::InputCallback for TypedChars {
    fn add_char(&mut self, uni_char: u32) {
        if let Some(ch) = char::from_u32(uni_char).filter(|ch| !ch.is_control()) {
            self.queue.borrow_mut().push(ch);
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseState {
    pub x: i32,
    pub y: i32,
    pub pressed: bool,
    pub released: bool,
}

pub struct MinifbDisplay {
    window: minifb::Window,
    canvas: Canvas,
    typed: Rc<RefCell<Vec<char>>>,
    mouse_down: bool,
}

impl MinifbDisplay {
    pub fn new(mut window: minifb::Window) -> Self {
        let typed = Rc::new(RefCell::new(Vec::new()));
        window.set_input_callback(Box::new(TypedChars {
            queue: typed.clone(),
        }));
        let (width, height) = window.get_size();
        Self {
            window,
            canvas: Canvas::new(width, height),
            typed,
            mouse_down: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Current client size; the canvas follows it.
    pub fn size(&mut self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        self.canvas.resize(width.max(1), height.max(1));
        (self.canvas.width() as u32, self.canvas.height() as u32)
    }

    pub fn canvas(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn keys_pressed(&self) -> Vec<Key> {
        self.window.get_keys_pressed(KeyRepeat::Yes)
    }

    pub fn take_typed(&mut self) -> Vec<char> {
        std::mem::take(&mut *self.typed.borrow_mut())
    }

    /// Mouse position plus button edges since the last call.
    pub fn mouse(&mut self) -> MouseState {
        let (x, y) = self
            .window
            .get_mouse_pos(MouseMode::Clamp)
            .unwrap_or((0.0, 0.0));
        let down = self.window.get_mouse_down(MouseButton::Left);
        let state = MouseState {
            x: x as i32,
            y: y as i32,
            pressed: down && !self.mouse_down,
            released: !down && self.mouse_down,
        };
        self.mouse_down = down;
        state
    }

    pub fn present(&mut self) {
        if let Err(err) =
            self.window
                .update_with_buffer(self.canvas.pixels(), self.canvas.width(), self.canvas.height())
        {
            log::error!("Failed to present frame: {}", err);
        }
    }
}
