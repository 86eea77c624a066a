// correlation_demo.rs
// Manual 2D correlation of a random image with a random kernel.
//
// Usage:
//   correlation_demo [config.json]
//
// Without a config the demo uses a 3x32x32 image, a 3x5x5 kernel, padding 2
// and stride 1, which keeps the output at 32x32.
//
// Output:
//   - logs the input/output sizes and the top-left output value next to the
//     same window summed by hand
//   - writes the feature map as a pseudo-color PNG when heatmap_path is set

use log::{error, info};
use rust_conv_networks::config::{load_correlation_config, CorrelationConfig};
use rust_conv_networks::correlate::{correlate2d, FeatureMap, Volume};
use rust_conv_networks::plot::render_heatmap;
use rust_conv_networks::utils::SimpleRng;
use rust_conv_networks::Result;
use std::process;

// Side of one rendered cell in pixels.
const CELL_PX: u32 = 12;

struct CorrelationRun {
    map: FeatureMap,
    top_left_expected: f32,
}

fn config_from_args(args: &[String]) -> Result<CorrelationConfig> {
    match args.get(1) {
        Some(path) => load_correlation_config(path),
        None => Ok(CorrelationConfig::default()),
    }
}

// Product sum of the kernel with the first window of the padded image.
fn top_left_window_sum(padded: &Volume, kernel: &Volume) -> f32 {
    let mut sum = 0.0f32;
    for c in 0..kernel.channels() {
        for y in 0..kernel.height() {
            for x in 0..kernel.width() {
                sum += padded.get(c, y, x) * kernel.get(c, y, x);
            }
        }
    }
    sum
}

fn run(config: &CorrelationConfig) -> Result<CorrelationRun> {
    let mut rng = SimpleRng::new(config.seed());
    let image = Volume::uniform(config.channels, config.height, config.width, 0.0, 1.0, &mut rng);
    let kernel = Volume::uniform(
        config.channels,
        config.kernel_size,
        config.kernel_size,
        -1.0,
        1.0,
        &mut rng,
    );

    info!(
        "image {}x{}x{}, kernel {}x{}x{}, padding {}, stride {}",
        image.channels(),
        image.height(),
        image.width(),
        kernel.channels(),
        kernel.height(),
        kernel.width(),
        config.padding(),
        config.stride()
    );

    let map = correlate2d(&image, &kernel, config.stride(), config.padding())?;
    let top_left_expected = top_left_window_sum(&image.zero_pad(config.padding()), &kernel);

    info!("output {}x{}", map.height(), map.width());
    info!(
        "output[0][0] = {:.6} (window sum by hand: {:.6})",
        map.get(0, 0),
        top_left_expected
    );

    if let Some(path) = &config.heatmap_path {
        render_heatmap(&map, path, CELL_PX)?;
    }

    Ok(CorrelationRun {
        map,
        top_left_expected,
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = config_from_args(&args).unwrap_or_else(|e| {
        error!("Failed to load config: {}", e);
        process::exit(1);
    });

    match run(&config) {
        Ok(result) => println!(
            "output {}x{}, top-left difference from hand sum: {:.2e}",
            result.map.height(),
            result.map.width(),
            (result.map.get(0, 0) - result.top_left_expected).abs()
        ),
        Err(e) => {
            error!("Correlation failed: {}", e);
            process::exit(1);
        }
    }
}
