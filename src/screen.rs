/// Panel width in pixels.
pub const WIDTH: u32 = 128;
/// Panel height in pixels.
pub const HEIGHT: u32 = 160;
const CHAR_W: u32 = 6;
const CHAR_H: u32 = 8;

/// Drawing surface the results are presented on. All calls are
/// order-sensitive side effects and never fail.
pub trait Screen {
    fn clear(&mut self);
    fn set_cursor(&mut self, col: u32, row: u32);
    fn write_text(&mut self, text: &str);
    fn write_number(&mut self, n: u64);
    fn draw_vertical_bar(&mut self, x: u32, y_top: u32, height: u32);
}

/// In-memory monochrome panel that renders to terminal text.
///
/// Each output line covers one 8-pixel text row and each character one
/// pixel column, so bars keep their horizontal resolution. Text is laid
/// down one character per column starting at `col * 6`.
pub struct TextScreen {
    pixels: Vec<bool>,
    overlay: Vec<Option<char>>,
    cursor_x: u32,
    cursor_row: u32,
}

const BLOCKS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

impl TextScreen {
    pub fn new() -> Self {
        let rows = HEIGHT / CHAR_H;
        Self {
            pixels: vec![false; (WIDTH * HEIGHT) as usize],
            overlay: vec![None; (WIDTH * rows) as usize],
            cursor_x: 0,
            cursor_row: 0,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        x < WIDTH && y < HEIGHT && self.pixels[(y * WIDTH + x) as usize]
    }

    pub fn render(&self) -> String {
        let rows = HEIGHT / CHAR_H;
        let mut out = String::new();
        for row in 0..rows {
            let mut line = String::with_capacity(WIDTH as usize);
            for x in 0..WIDTH {
                if let Some(ch) = self.overlay[(row * WIDTH + x) as usize] {
                    line.push(ch);
                    continue;
                }
                let lit = (row * CHAR_H..(row + 1) * CHAR_H)
                    .filter(|&y| self.pixel(x, y))
                    .count();
                line.push(BLOCKS[lit]);
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

impl Default for TextScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for TextScreen {
    fn clear(&mut self) {
        self.pixels.fill(false);
        self.overlay.fill(None);
        self.cursor_x = 0;
        self.cursor_row = 0;
    }

    fn set_cursor(&mut self, col: u32, row: u32) {
        self.cursor_x = col.saturating_mul(CHAR_W);
        self.cursor_row = row;
    }

    fn write_text(&mut self, text: &str) {
        let rows = HEIGHT / CHAR_H;
        for ch in text.chars() {
            if ch == '\n' {
                self.cursor_x = 0;
                self.cursor_row += 1;
                continue;
            }
            if self.cursor_x >= WIDTH {
                self.cursor_x = 0;
                self.cursor_row += 1;
            }
            if self.cursor_row >= rows {
                return;
            }
            self.overlay[(self.cursor_row * WIDTH + self.cursor_x) as usize] = Some(ch);
            self.cursor_x += 1;
        }
    }

    fn write_number(&mut self, n: u64) {
        self.write_text(&n.to_string());
    }

    fn draw_vertical_bar(&mut self, x: u32, y_top: u32, height: u32) {
        if x >= WIDTH {
            return;
        }
        let bottom = y_top.saturating_add(height).min(HEIGHT);
        for y in y_top..bottom {
            self.pixels[(y * WIDTH + x) as usize] = true;
        }
    }
}
