//! Times a chain of median blurs with the tick counter.

use cv_core::{tick_count, tick_frequency, TickMeter};
use cv_demos::{samples, DemoArgs};
use cv_imgproc::median_blur;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut img = args.color_input(samples::pitch_scene)?;
    tracing::info!(threads = cv_core::current_cpu_threads(), "running median blurs");

    let mut meter = TickMeter::new();
    let e1 = tick_count();
    for ksize in (5..49).step_by(2) {
        meter.start();
        img = median_blur(&img, ksize)?;
        meter.stop();
        tracing::debug!(ksize, total_secs = meter.elapsed_secs(), "median blur");
    }
    let e2 = tick_count();
    let t = (e2 - e1) as f64 / tick_frequency();

    println!("Time taken: {t:.6} seconds");
    println!("Average per blur: {:.6} seconds over {} runs", meter.average_secs(), meter.laps());
    Ok(())
}
