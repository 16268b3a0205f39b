//! Scaling, translation, rotation, and affine and perspective warps
//! solved from point correspondences.

use cv_demos::{samples, DemoArgs, Presenter};
use cv_imgproc::{
    cvt_color_to_gray, get_affine_transform, get_perspective_transform, get_rotation_matrix_2d,
    get_translation_matrix, resize, resize_by_factor, warp_affine, warp_perspective,
    ColorConversion, Interpolation,
};
use cv_viewer::Figure;
use nalgebra::Point2;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut presenter = Presenter::new("Geometric transformations", &args);
    let img = args.color_input(samples::pitch_scene)?;

    // Scaling, by factor or by explicit size
    let res = resize_by_factor(&img, 2.0, 2.0, Interpolation::Cubic)?;
    let (width, height) = img.dimensions();
    let same = resize(&img, 2 * width, 2 * height, Interpolation::Cubic)?;
    tracing::debug!(identical = res == same, "factor vs size resize");
    presenter.imshow("original", &img);
    presenter.imshow("scaled", &res);

    let gray = cvt_color_to_gray(&img, ColorConversion::RgbToGray)?;
    let (cols, rows) = gray.dimensions();

    let m = get_translation_matrix(100.0, 50.0);
    presenter.imshow("translated", &warp_affine(&gray, &m, cols, rows)?);

    let center = Point2::new(cols as f32 / 2.0, rows as f32 / 2.0);
    let m = get_rotation_matrix_2d(center, 90.0, 1.0);
    presenter.imshow("rotated", &warp_affine(&gray, &m, cols, rows)?);

    // Affine: three point pairs
    let drawing = samples::drawing();
    let pts1 = samples::DRAWING_POINTS.map(|(x, y)| Point2::new(x, y));
    let pts2 = [Point2::new(10.0, 100.0), Point2::new(200.0, 50.0), Point2::new(100.0, 250.0)];
    let m = get_affine_transform(&pts1, &pts2)?;
    let (w, h) = drawing.dimensions();
    let mut affine = Figure::new(1, 2);
    affine
        .subplot(1, "Input", &drawing)?
        .subplot(2, "Output", &warp_affine(&drawing, &m, w, h)?)?;
    presenter.figure("Affine transformation", &affine)?;

    // Perspective: four point pairs onto a 300x300 square
    let sudoku = samples::sudoku();
    let pts1 = samples::SUDOKU_CORNERS.map(|(x, y)| Point2::new(x, y));
    let pts2 = [
        Point2::new(0.0, 0.0),
        Point2::new(300.0, 0.0),
        Point2::new(0.0, 300.0),
        Point2::new(300.0, 300.0),
    ];
    let m = get_perspective_transform(&pts1, &pts2)?;
    let mut perspective = Figure::new(1, 2);
    perspective
        .subplot(1, "Input", &sudoku)?
        .subplot(2, "Output", &warp_perspective(&sudoku, &m, 300, 300)?)?;
    presenter.figure("Perspective transformation", &perspective)?;

    presenter.show()
}
