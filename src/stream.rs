use crate::error::GraphError;
use std::collections::VecDeque;

const BRAILLE_BASE: u32 = 0x2800;
const DOTS_X: usize = 2;
const DOTS_Y: usize = 4;

// Braille dot bits, [dot column][dot row], row 0 at the top of the cell.
const DOT_BITS: [[u8; DOTS_Y]; DOTS_X] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Fixed-size history of samples rendered as a braille bar sparkline.
///
/// Every character cell holds a 2x4 dot grid, so a buffer `width` cells wide
/// keeps the last `width * 2` values and a buffer `height` cells tall has
/// `height * 4` fill levels.
#[derive(Clone, Debug)]
pub struct StreamBuffer {
    width: usize,
    height: usize,
    min: f64,
    max: f64,
    history: VecDeque<f64>,
}

impl StreamBuffer {
    pub fn new(width: usize, height: usize, min: f64, max: f64) -> Result<Self, GraphError> {
        if width == 0 || height == 0 {
            return Err(GraphError::EmptyGrid { width, height });
        }
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(GraphError::InvalidRange { min, max });
        }
        Ok(Self {
            width,
            height,
            min,
            max,
            history: VecDeque::with_capacity(width * DOTS_X),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn capacity(&self) -> usize {
        self.width * DOTS_X
    }

    /// Number of discrete fill levels a single column can show.
    pub fn levels(&self) -> usize {
        self.height * DOTS_Y
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.history.back().copied()
    }

    /// Stored values, oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    pub fn push(&mut self, value: f64) {
        let value = self.clamp(value);
        if self.history.len() == self.capacity() {
            self.history.pop_front();
        }
        self.history.push_back(value);
    }

    /// Fill level of `value`, from 1 at `min` to `levels()` at `max`.
    pub fn level(&self, value: f64) -> usize {
        let value = self.clamp(value);
        let fraction = (value - self.min) / (self.max - self.min);
        let top = (self.levels() - 1) as f64;
        1 + (fraction * top).round() as usize
    }

    pub fn snapshot(&self) -> RenderableGrid {
        let mut cells = vec![0u8; self.width * self.height];
        let offset = self.capacity() - self.history.len();
        let levels = self.levels();

        for (i, &value) in self.history.iter().enumerate() {
            let column = offset + i;
            let (cell_x, dot_x) = (column / DOTS_X, column % DOTS_X);
            for dot in 0..self.level(value) {
                let row = levels - 1 - dot;
                let (cell_y, dot_y) = (row / DOTS_Y, row % DOTS_Y);
                cells[cell_y * self.width + cell_x] |= DOT_BITS[dot_x][dot_y];
            }
        }

        let lines = cells
            .chunks(self.width)
            .map(|row| row.iter().map(|&bits| glyph(bits)).collect())
            .collect();
        RenderableGrid {
            width: self.width,
            lines,
        }
    }

    fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Rendered graph: `height` lines of exactly `width` glyphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableGrid {
    width: usize,
    lines: Vec<String>,
}

impl RenderableGrid {
    pub fn blank(width: usize, height: usize) -> Self {
        let line: String = std::iter::repeat(glyph(0)).take(width).collect();
        Self {
            width,
            lines: vec![line; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn is_blank(&self) -> bool {
        self.lines
            .iter()
            .flat_map(|line| line.chars())
            .all(|c| dot_bits(c) == Some(0))
    }

    /// Lit dots in one dot column (two per character cell).
    pub fn column_fill(&self, dot_column: usize) -> usize {
        let (cell_x, dot_x) = (dot_column / DOTS_X, dot_column % DOTS_X);
        if cell_x >= self.width {
            return 0;
        }
        self.lines
            .iter()
            .filter_map(|line| line.chars().nth(cell_x).and_then(dot_bits))
            .map(|bits| {
                DOT_BITS[dot_x]
                    .iter()
                    .filter(|&&bit| bits & bit != 0)
                    .count()
            })
            .sum()
    }
}

fn glyph(bits: u8) -> char {
    char::from_u32(BRAILLE_BASE + u32::from(bits)).unwrap_or(' ')
}

fn dot_bits(c: char) -> Option<u8> {
    (c as u32)
        .checked_sub(BRAILLE_BASE)
        .and_then(|bits| u8::try_from(bits).ok())
}
