//! Bars view - one column per key of the on-screen octave

use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line},
        Block, Borders,
    },
    Frame,
};

use midi_visualizer::io::converter::pitch_class_name;
use midi_visualizer::sequencing::notes::KEYBOARD_RANGE;
use midi_visualizer::visual::NoteSnapshot;

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 400.0;
const COLUMN: f64 = WIDTH / 12.0;
const GAP: f64 = 6.0;
/// Horizontal spacing of the vertical strokes that fill a bar
const FILL_STEP: f64 = 1.5;

/// Column index for pitches the view covers.
fn column(pitch: u8) -> Option<usize> {
    KEYBOARD_RANGE
        .contains(&pitch)
        .then(|| (pitch - KEYBOARD_RANGE.start()) as usize)
}

fn bar_height(velocity: u8) -> f64 {
    velocity.min(127) as f64 / 127.0 * HEIGHT
}

pub fn render_bars(frame: &mut Frame, area: Rect, notes: &[NoteSnapshot], show_grid: bool) {
    let canvas = Canvas::default()
        .block(Block::default().title(" Bars ").borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, WIDTH])
        .y_bounds([0.0, HEIGHT])
        .paint(|ctx| {
            if show_grid {
                let grid = Color::Rgb(40, 40, 40);
                for i in 0..=12 {
                    let x = i as f64 * COLUMN;
                    ctx.draw(&Line::new(x, 0.0, x, HEIGHT, grid));
                }
                for i in 0..=8 {
                    let y = i as f64 * HEIGHT / 8.0;
                    ctx.draw(&Line::new(0.0, y, WIDTH, y, grid));
                }
                ctx.layer();
            }

            for note in notes {
                let Some(col) = column(note.pitch) else {
                    continue;
                };
                let (r, g, b) = note.color.dimmed(note.opacity).to_rgb8();
                let color = Color::Rgb(r, g, b);
                let left = col as f64 * COLUMN + GAP;
                let right = (col + 1) as f64 * COLUMN - GAP;
                let top = bar_height(note.velocity);

                let mut x = left;
                while x <= right {
                    ctx.draw(&Line::new(x, 0.0, x, top, color));
                    x += FILL_STEP;
                }
            }
            ctx.layer();

            for pitch in KEYBOARD_RANGE {
                if let Some(col) = column(pitch) {
                    let x = col as f64 * COLUMN + GAP;
                    ctx.print(x, HEIGHT, pitch_class_name(pitch));
                }
            }
        });

    frame.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_visible_octave_gets_columns() {
        assert_eq!(column(60), Some(0));
        assert_eq!(column(71), Some(11));
        assert_eq!(column(59), None);
        assert_eq!(column(72), None);
    }

    #[test]
    fn full_velocity_fills_the_height() {
        assert_eq!(bar_height(127), HEIGHT);
        assert_eq!(bar_height(0), 0.0);
    }
}
