use super::config::Geometry;

/// Last-known content of every visible cell, as written through the layout engine.
///
/// Display shifts and right-to-left text are not reflected; cells are filled where the cursor
/// mirror says the character went.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Screen {
    columns: usize,
    rows: usize,
    cells: Vec<u8>,
}

impl Screen {
    pub fn new(geometry: &Geometry) -> Self {
        let columns = geometry.columns() as usize;
        let rows = geometry.rows() as usize;
        Screen {
            columns,
            rows,
            cells: vec![b' '; columns * rows],
        }
    }

    /// Blanks every cell.
    pub fn clear(&mut self) {
        self.cells.fill(b' ');
    }

    /// Stores `byte` at the given cell. Cells outside the display are ignored.
    pub fn put(&mut self, col: u8, row: u8, byte: u8) {
        let (col, row) = (col as usize, row as usize);
        if col < self.columns && row < self.rows {
            self.cells[row * self.columns + col] = byte;
        }
    }

    pub fn row(&self, row: usize) -> &[u8] {
        &self.cells[row * self.columns..(row + 1) * self.columns]
    }

    /// Renders the screen as text, every row followed by a line break.
    pub fn snapshot(&self) -> Vec<u8> {
        let mut text = Vec::with_capacity((self.columns + 1) * self.rows);
        for row in 0..self.rows {
            text.extend_from_slice(self.row(row));
            text.push(b'\n');
        }
        text
    }
}
