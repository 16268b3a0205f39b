//! Global thresholds of every type on a gradient, then global versus
//! adaptive thresholding of an unevenly lit page.

use cv_demos::{samples, DemoArgs, Presenter};
use cv_imgproc::{adaptive_threshold, median_blur, threshold, AdaptiveMethod, ThresholdType};
use cv_viewer::Figure;

const THRESH: u8 = 127;
const BLOCK_SIZE: u32 = 11;
const C: f32 = 2.0;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut presenter = Presenter::new("Thresholding", &args);

    let img = args.gray_input(|| samples::gradient(256, 160))?;
    let mut simple = Figure::new(2, 3);
    simple.subplot(1, "Original Image", &img)?;
    for (i, typ) in ThresholdType::ALL.into_iter().enumerate() {
        simple.subplot(i as u32 + 2, typ.name(), &threshold(&img, THRESH, 255, typ))?;
    }
    presenter.figure("Simple thresholding", &simple)?;

    let page = args.gray_input(|| samples::uneven_page(420, 300))?;
    let page = median_blur(&page, 5)?;
    let th1 = threshold(&page, THRESH, 255, ThresholdType::Binary);
    let th2 = adaptive_threshold(&page, 255, AdaptiveMethod::MeanC, ThresholdType::Binary, BLOCK_SIZE, C)?;
    let th3 = adaptive_threshold(&page, 255, AdaptiveMethod::GaussianC, ThresholdType::Binary, BLOCK_SIZE, C)?;

    let mut adaptive = Figure::new(2, 2);
    adaptive
        .subplot(1, "Original Image", &page)?
        .subplot(2, "Global Thresholding (v = 127)", &th1)?
        .subplot(3, "Adaptive Mean Thresholding", &th2)?
        .subplot(4, "Adaptive Gaussian Thresholding", &th3)?;
    presenter.figure("Adaptive thresholding", &adaptive)?;

    presenter.show()
}
