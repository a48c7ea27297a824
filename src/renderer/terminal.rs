//! Text display of observations for terminal front ends

use super::Observation;
use super::scene::colors;

/// Character for a pixel intensity (brightest channel for RGB)
fn glyph(value: f32) -> char {
    if value >= colors::AGENT {
        '@'
    } else if value >= colors::OBSTACLE {
        '#'
    } else if value >= colors::FLOOR {
        '='
    } else {
        ' '
    }
}

/// Draw the observation as text, `zoom` cells per pixel horizontally.
///
/// Terminal cells are about twice as tall as they are wide, so rows are
/// repeated `zoom / 2` times (at least once).
pub fn draw(obs: &Observation, zoom: u32) -> String {
    let x_repeat = zoom.max(1) as usize;
    let y_repeat = (zoom / 2).max(1) as usize;
    let mut out = String::with_capacity((obs.width() * x_repeat + 1) * obs.height() * y_repeat);

    for row in 0..obs.height() {
        let mut line = String::with_capacity(obs.width() * x_repeat);
        for col in 0..obs.width() {
            let value = obs
                .pixel(row, col)
                .map(|px| px.iter().copied().fold(0.0, f32::max))
                .unwrap_or(colors::BACKGROUND);
            let c = glyph(value);
            line.extend(std::iter::repeat_n(c, x_repeat));
        }
        for _ in 0..y_repeat {
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
    out
}
