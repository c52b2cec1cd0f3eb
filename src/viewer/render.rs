// Software rendering module
// Draws a viewer window (image + menu bar) into a BGRA pixel buffer

use super::font::{glyph, text_width, GLYPH_ADVANCE, GLYPH_HEIGHT};
use super::menu::{Rect, DROPDOWN_WIDTH, HEADER_PADDING, ITEM_HEIGHT, MENU_BAR_HEIGHT};
use super::window::ViewerWindow;
use crate::raster::{blend_over, Raster};

/// Window background behind the image
pub const BACKGROUND: u32 = 0xFFEE_EEEE;

const MENU_BAR_COLOR: u32 = 0xFFDD_DDDD;
const MENU_BORDER: u32 = 0xFF99_9999;
const MENU_TEXT: u32 = 0xFF20_2020;
const DROPDOWN_COLOR: u32 = 0xFFF6_F6F6;
const HIGHLIGHT: u32 = 0xFF50_78B4;
const HIGHLIGHT_TEXT: u32 = 0xFFFF_FFFF;
const RADIO_SIZE: u32 = 5;

/// A `width` x `height` ARGB8888 surface in little-endian byte order
/// (B, G, R, A per pixel), as used by `wl_shm`.
pub struct Canvas<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    /// Wrap a buffer of at least `width * height * 4` bytes
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Self {
        debug_assert!(data.len() >= width as usize * height as usize * 4);
        Self { data, width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed ARGB at (x, y); transparent outside the canvas
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        u32::from_le_bytes([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    fn put(&mut self, x: i64, y: i64, argb: u32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if let Some(px) = self.data.get_mut(idx..idx + 4) {
            px.copy_from_slice(&argb.to_le_bytes());
        }
    }

    pub fn clear(&mut self, argb: u32) {
        let bytes = argb.to_le_bytes();
        let len = self.width as usize * self.height as usize * 4;
        for px in self.data[..len].chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, argb: u32) {
        for y in rect.y as i64..rect.y as i64 + rect.height as i64 {
            for x in rect.x as i64..rect.x as i64 + rect.width as i64 {
                self.put(x, y, argb);
            }
        }
    }

    pub fn stroke_rect(&mut self, rect: Rect, argb: u32) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        let (left, top) = (rect.x as i64, rect.y as i64);
        let right = left + rect.width as i64 - 1;
        let bottom = top + rect.height as i64 - 1;
        for x in left..=right {
            self.put(x, top, argb);
            self.put(x, bottom, argb);
        }
        for y in top..=bottom {
            self.put(left, y, argb);
            self.put(right, y, argb);
        }
    }

    /// Draw `text` with its top-left corner at (x, y)
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, argb: u32) {
        let mut cx = x as i64;
        for c in text.chars() {
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..5i64 {
                    if bits & (0x10u8 >> col) != 0 {
                        self.put(cx + col, y as i64 + row as i64, argb);
                    }
                }
            }
            cx += GLYPH_ADVANCE as i64;
        }
    }

    /// Draw `image` scaled into `dest` with nearest-neighbor sampling,
    /// blending translucent pixels over what is already there
    pub fn draw_image(&mut self, image: &Raster, dest: Rect) {
        if dest.width == 0 || dest.height == 0 {
            return;
        }
        let (img_w, img_h) = image.dimensions();

        // Fixed-point source step per destination pixel
        let step_x = ((img_w as u64) << 16) / dest.width as u64;
        let step_y = ((img_h as u64) << 16) / dest.height as u64;

        let x_lut: Vec<u32> = (0..dest.width as u64)
            .map(|x| (((x * step_x) >> 16) as u32).min(img_w - 1))
            .collect();

        for y in 0..dest.height as u64 {
            let src_y = (((y * step_y) >> 16) as u32).min(img_h - 1);
            let dy = dest.y as i64 + y as i64;
            for (x, &src_x) in x_lut.iter().enumerate() {
                let dx = dest.x as i64 + x as i64;
                let color = image.color_at(src_x, src_y);
                let color = match color >> 24 {
                    0xFF => color,
                    0 => continue,
                    _ => {
                        let under = self.pixel(dx.max(0) as u32, dy.max(0) as u32);
                        blend_over(color, under)
                    }
                };
                self.put(dx, dy, color);
            }
        }
    }
}

/// Paint a whole viewer window: background, centered image, menu bar and
/// the open drop-down, if any
pub fn render_window(window: &ViewerWindow, canvas: &mut Canvas<'_>) {
    canvas.clear(BACKGROUND);
    let dest = window.image_rect(canvas.width(), canvas.height());
    canvas.draw_image(window.image(), dest);
    render_menu_bar(window, canvas);
}

fn render_menu_bar(window: &ViewerWindow, canvas: &mut Canvas<'_>) {
    let bar = window.menu_bar();
    let strip = Rect::new(0, 0, canvas.width(), MENU_BAR_HEIGHT);
    canvas.fill_rect(strip, MENU_BAR_COLOR);
    canvas.fill_rect(Rect::new(0, MENU_BAR_HEIGHT as i32 - 1, canvas.width(), 1), MENU_BORDER);

    let text_y = ((MENU_BAR_HEIGHT - GLYPH_HEIGHT) / 2) as i32;
    for (index, menu) in bar.menus().iter().enumerate() {
        let header = bar.header_rect(index);
        let open = bar.open_menu() == Some(index);
        if open {
            canvas.fill_rect(header, HIGHLIGHT);
        }
        let color = if open { HIGHLIGHT_TEXT } else { MENU_TEXT };
        canvas.draw_text(header.x + HEADER_PADDING as i32, text_y, menu.title, color);
    }

    let Some(open) = bar.open_menu() else {
        return;
    };
    let dropdown = bar.dropdown_rect(open);
    canvas.fill_rect(dropdown, DROPDOWN_COLOR);

    for (index, item) in bar.menus()[open].items.iter().enumerate() {
        let rect = bar.item_rect(open, index);
        let hovered = bar.hovered_item() == Some(index);
        if hovered {
            canvas.fill_rect(rect, HIGHLIGHT);
        }
        let color = if hovered { HIGHLIGHT_TEXT } else { MENU_TEXT };
        let text_y = rect.y + ((ITEM_HEIGHT - GLYPH_HEIGHT) / 2) as i32;

        // radio marker
        if let Some(selected) = item.selected {
            let marker = Rect::new(rect.x + 8, rect.y + ((ITEM_HEIGHT - RADIO_SIZE) / 2) as i32, RADIO_SIZE, RADIO_SIZE);
            if selected {
                canvas.fill_rect(marker, color);
            } else {
                canvas.stroke_rect(marker, color);
            }
        }
        canvas.draw_text(rect.x + 20, text_y, item.label, color);

        if let Some(accelerator) = item.accelerator {
            let label = accelerator.label();
            let x = rect.x + (DROPDOWN_WIDTH - 8 - text_width(&label)) as i32;
            canvas.draw_text(x, text_y, &label, color);
        }
    }
    canvas.stroke_rect(dropdown, MENU_BORDER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ColorModel;
    use crate::viewer::window::ViewRequest;
    use crate::viewer::Zoom;
    use std::sync::Arc;

    fn buffer(width: u32, height: u32) -> Vec<u8> {
        vec![0; width as usize * height as usize * 4]
    }

    #[test]
    fn canvas_stores_bgra_bytes() {
        let mut data = buffer(2, 1);
        let mut canvas = Canvas::new(&mut data, 2, 1);
        canvas.fill_rect(Rect::new(1, 0, 1, 1), 0xFF11_2233);
        assert_eq!(canvas.pixel(1, 0), 0xFF11_2233);
        assert_eq!(&data[4..8], &[0x33, 0x22, 0x11, 0xFF]);
    }

    #[test]
    fn drawing_is_clipped_to_the_canvas() {
        let mut data = buffer(4, 4);
        let mut canvas = Canvas::new(&mut data, 4, 4);
        canvas.fill_rect(Rect::new(-10, -10, 100, 100), 0xFFFF_FFFF);
        canvas.draw_text(2, 2, "Close", 0xFF00_0000);
        assert_eq!(canvas.pixel(9, 9), 0);
    }

    #[test]
    fn image_is_scaled_with_nearest_neighbor() {
        let mut image = Raster::new(2, 2).unwrap();
        image.set_color(0, 0, 0xFFFF_0000).unwrap();
        image.set_color(1, 1, 0xFF00_00FF).unwrap();

        let mut data = buffer(4, 4);
        let mut canvas = Canvas::new(&mut data, 4, 4);
        canvas.draw_image(&image, Rect::new(0, 0, 4, 4));
        assert_eq!(canvas.pixel(0, 0), 0xFFFF_0000);
        assert_eq!(canvas.pixel(1, 1), 0xFFFF_0000);
        assert_eq!(canvas.pixel(3, 3), 0xFF00_00FF);
        assert_eq!(canvas.pixel(3, 0), 0xFF00_0000);
    }

    #[test]
    fn translucent_pixels_blend_over_background() {
        let mut image = Raster::with_model(1, 1, ColorModel::IntArgb).unwrap();
        image.set_color(0, 0, 0x8000_0000).unwrap();

        let mut data = buffer(1, 1);
        let mut canvas = Canvas::new(&mut data, 1, 1);
        canvas.clear(0xFFFF_FFFF);
        canvas.draw_image(&image, Rect::new(0, 0, 1, 1));
        assert_eq!(canvas.pixel(0, 0), 0xFF7F_7F7F);
    }

    #[test]
    fn window_renders_centered_image_below_menu_bar() {
        let mut image = Raster::new(40, 20).unwrap();
        image.fill(0xFF00_FF00);
        let window = ViewerWindow::new(ViewRequest::new(Arc::new(image), "t", Zoom::Half));
        let (width, height) = (200, 100);

        let mut data = buffer(width, height);
        let mut canvas = Canvas::new(&mut data, width, height);
        render_window(&window, &mut canvas);

        let rect = window.image_rect(width, height);
        assert_eq!((rect.width, rect.height), (20, 10));
        let (cx, cy) = (rect.x as u32 + 10, rect.y as u32 + 5);
        assert_eq!(canvas.pixel(cx, cy), 0xFF00_FF00);
        assert_eq!(canvas.pixel(rect.x as u32 - 1, cy), BACKGROUND);
        assert_eq!(canvas.pixel(width - 1, 5), MENU_BAR_COLOR);
    }

    #[test]
    fn open_dropdown_is_painted_over_the_image() {
        let mut image = Raster::new(300, 200).unwrap();
        image.fill(0xFF00_0000);
        let mut window = ViewerWindow::new(ViewRequest::new(Arc::new(image), "t", Zoom::Full));
        window.menu_bar_mut().click(2.0, 2.0);
        let (width, height) = window.window_size();

        let mut data = buffer(width, height);
        let mut canvas = Canvas::new(&mut data, width, height);
        render_window(&window, &mut canvas);

        let dropdown = window.menu_bar().dropdown_rect(0);
        assert_eq!(canvas.pixel(dropdown.x as u32, dropdown.y as u32), MENU_BORDER);
        assert_eq!(
            canvas.pixel(dropdown.x as u32 + 2, dropdown.y as u32 + 2),
            DROPDOWN_COLOR
        );
    }
}
