//! A 5x5 averaging kernel applied with `filter2d`, next to the built-in
//! box, Gaussian, median and bilateral blurs.

use cv_demos::{samples, DemoArgs, Presenter};
use cv_imgproc::{
    bilateral_filter, blur, filter2d, gaussian_blur, median_blur, BorderMode, Kernel,
};
use cv_viewer::Figure;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut presenter = Presenter::new("Smoothing", &args);
    let img = args.color_input(|| samples::logo(256))?;

    let kernel = Kernel::new(vec![1.0 / 25.0; 25], 5, 5)?;
    let averaged = filter2d(&img, &kernel, BorderMode::DEFAULT)?;
    let mut convolution = Figure::new(1, 2);
    convolution
        .subplot(1, "Original", &img)?
        .subplot(2, "Averaging", &averaged)?;
    presenter.figure("2D convolution", &convolution)?;

    let mut blurs = Figure::new(2, 2);
    blurs
        .subplot(1, "Blur", &blur(&img, 5, 5, BorderMode::DEFAULT)?)?
        .subplot(2, "Gaussian", &gaussian_blur(&img, 5, 0.0, BorderMode::DEFAULT)?)?
        .subplot(3, "Median", &median_blur(&img, 5)?)?
        .subplot(4, "Bilateral", &bilateral_filter(&img, 9, 75.0, 75.0)?)?;
    presenter.figure("Blurring", &blurs)?;

    presenter.show()
}
