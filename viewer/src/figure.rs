//! Grid of titled images rendered into one RGB canvas.

use crate::{to_display_rgb, Result, ViewerError};
use cv_core::{paste, Image, U8Pixel};
use cv_imgproc::{get_text_size, put_text, FontFace, LineType};
use image::{Rgb, RgbImage};
use std::path::Path;

const MARGIN: u32 = 8;
const TITLE_SCALE: f64 = 1.0;
const TITLE_FONT: FontFace = FontFace::Plain;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const TITLE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(Debug, Clone)]
struct Cell {
    title: String,
    image: RgbImage,
}

/// Subplot layout with `rows * cols` cells numbered from 1, row-major.
#[derive(Debug, Clone)]
pub struct Figure {
    rows: u32,
    cols: u32,
    cells: Vec<Option<Cell>>,
}

impl Figure {
    pub fn new(rows: u32, cols: u32) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            cells: vec![None; (rows * cols) as usize],
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Places `image` in cell `index` (1-based); gray images stay gray.
    pub fn subplot<P: U8Pixel>(&mut self, index: u32, title: &str, image: &Image<P>) -> Result<&mut Self> {
        if index == 0 || index > self.rows * self.cols {
            return Err(ViewerError::InvalidSubplot(format!(
                "index {index} outside a {}x{} grid",
                self.rows, self.cols
            )));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(ViewerError::InvalidSubplot(format!("'{title}' is empty")));
        }
        self.cells[(index - 1) as usize] = Some(Cell {
            title: title.to_string(),
            image: to_display_rgb(image),
        });
        Ok(self)
    }

    /// Composites all cells; every cell is as large as the largest image.
    pub fn render(&self) -> Result<RgbImage> {
        let filled = self.cells.iter().flatten();
        let cell_w = filled.clone().map(|c| c.image.width()).max();
        let cell_h = filled.map(|c| c.image.height()).max();
        let (Some(cell_w), Some(cell_h)) = (cell_w, cell_h) else {
            return Err(ViewerError::Render("figure has no subplots".into()));
        };

        let title_h = get_text_size("Ag", TITLE_FONT, TITLE_SCALE, 1).height as u32 + MARGIN;
        let slot_w = cell_w + 2 * MARGIN;
        let slot_h = cell_h + title_h + 2 * MARGIN;
        let mut canvas = RgbImage::from_pixel(slot_w * self.cols, slot_h * self.rows, BACKGROUND);

        for (i, cell) in self.cells.iter().enumerate() {
            let Some(cell) = cell else { continue };
            let (row, col) = (i as u32 / self.cols, i as u32 % self.cols);
            let x0 = col * slot_w + MARGIN;
            let y0 = row * slot_h + MARGIN;

            let text = get_text_size(&cell.title, TITLE_FONT, TITLE_SCALE, 1);
            let text_x = x0 as i32 + (cell_w as i32 - text.width).max(0) / 2;
            put_text(
                &mut canvas,
                &cell.title,
                (text_x, (y0 + title_h - MARGIN) as i32),
                TITLE_FONT,
                TITLE_SCALE,
                TITLE_COLOR,
                1,
                LineType::Connected8,
            );

            let img_x = x0 + (cell_w - cell.image.width()) / 2;
            let img_y = y0 + title_h + (cell_h - cell.image.height()) / 2;
            paste(&mut canvas, &cell.image, img_x, img_y)
                .map_err(|e| ViewerError::Render(e.to_string()))?;
        }
        Ok(canvas)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let canvas = self.render()?;
        cv_io::imwrite(path.as_ref(), &canvas).map_err(|e| ViewerError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn two_cells_side_by_side() {
        let mut fig = Figure::new(1, 2);
        fig.subplot(1, "BGR", &RgbImage::from_pixel(20, 10, Rgb([0, 0, 255])))
            .unwrap()
            .subplot(2, "gray", &GrayImage::from_pixel(10, 10, Luma([100])))
            .unwrap();
        let canvas = fig.render().unwrap();

        let title_h = get_text_size("Ag", TITLE_FONT, TITLE_SCALE, 1).height as u32 + MARGIN;
        let slot_w = 20 + 2 * MARGIN;
        assert_eq!(canvas.width(), 2 * slot_w);
        assert_eq!(canvas.height(), 10 + title_h + 2 * MARGIN);

        let top = MARGIN + title_h;
        assert_eq!(canvas.get_pixel(MARGIN, top), &Rgb([0, 0, 255]));
        // gray cell is centred in its slot
        assert_eq!(canvas.get_pixel(slot_w + MARGIN + 5, top), &Rgb([100, 100, 100]));
        assert_eq!(canvas.get_pixel(slot_w + MARGIN, top), &BACKGROUND);
    }

    #[test]
    fn invalid_index_and_empty_figure() {
        let mut fig = Figure::new(2, 3);
        assert!(fig.subplot(0, "x", &RgbImage::new(2, 2)).is_err());
        assert!(fig.subplot(7, "x", &RgbImage::new(2, 2)).is_err());
        assert!(matches!(fig.render(), Err(ViewerError::Render(_))));
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.png");
        let mut fig = Figure::new(1, 1);
        fig.subplot(1, "only", &RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))).unwrap();
        fig.save(&path).unwrap();
        assert!(path.is_file());
    }
}
