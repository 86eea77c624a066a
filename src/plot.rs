//! Pseudo-color rendering of a correlation output.
//!
//! Each cell of the feature map becomes a filled `cell_px × cell_px` square.
//! Values are normalised between the map's minimum and maximum and mapped to a
//! hue running from blue (lowest) to red (highest).

use crate::correlate::FeatureMap;
use crate::error::{Error, Result};
use log::info;
use plotters::prelude::*;
use std::path::Path;

/// Hue for a value already normalised to [0, 1]; 0 is blue, 1 is red.
pub fn heat_color(t: f32) -> HSLColor {
    let t = f64::from(t.clamp(0.0, 1.0));
    HSLColor(0.66 * (1.0 - t), 1.0, 0.5)
}

/// Write `map` to `path` as an image.
///
/// A constant map has no range to normalise over and renders uniformly in the
/// lowest color.
///
/// # Errors
///
/// `InvalidConfig` if `cell_px` is 0 or the map is empty, `Plot` if the
/// backend cannot draw or encode the image.
pub fn render_heatmap(map: &FeatureMap, path: impl AsRef<Path>, cell_px: u32) -> Result<()> {
    if cell_px == 0 {
        return Err(Error::config("cell_px must be greater than 0"));
    }
    let (min, max) = map
        .min_max()
        .ok_or_else(|| Error::config("cannot render an empty feature map"))?;
    let range = max - min;

    let path = path.as_ref();
    let size = (map.width() as u32 * cell_px, map.height() as u32 * cell_px);
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let cell = cell_px as i32;
    for y in 0..map.height() {
        for x in 0..map.width() {
            let t = if range > 0.0 {
                (map.get(y, x) - min) / range
            } else {
                0.0
            };
            let top_left = (x as i32 * cell, y as i32 * cell);
            let bottom_right = (top_left.0 + cell, top_left.1 + cell);
            root.draw(&Rectangle::new(
                [top_left, bottom_right],
                heat_color(t).filled(),
            ))
            .map_err(plot_error)?;
        }
    }

    root.present().map_err(plot_error)?;
    info!(
        "heatmap {}x{} (min {:.4}, max {:.4}) written to {}",
        map.height(),
        map.width(),
        min,
        max,
        path.display()
    );
    Ok(())
}

fn plot_error(e: impl std::fmt::Display) -> Error {
    Error::Plot(e.to_string())
}
