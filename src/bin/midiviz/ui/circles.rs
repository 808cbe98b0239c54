//! Circles view - one circle per active note
//!
//! Horizontal position follows the pitch class, vertical position the pitch
//! itself, so octaves stack in columns.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Line},
        Block, Borders,
    },
    Frame,
};

use midi_visualizer::io::converter::note_name;
use midi_visualizer::visual::NoteSnapshot;

/// Drawing surface in the same units as note radii.
const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 400.0;
const GRID_SPACING: f64 = 50.0;

fn position(pitch: u8) -> (f64, f64) {
    let x = ((pitch % 12) as f64 + 0.5) / 12.0 * WIDTH;
    let y = pitch as f64 / 127.0 * HEIGHT;
    (x, y)
}

pub fn render_circles(frame: &mut Frame, area: Rect, notes: &[NoteSnapshot], show_grid: bool) {
    let canvas = Canvas::default()
        .block(Block::default().title(" Circles ").borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, WIDTH])
        .y_bounds([0.0, HEIGHT])
        .paint(|ctx| {
            if show_grid {
                let grid = Color::Rgb(40, 40, 40);
                let mut x = 0.0;
                while x <= WIDTH {
                    ctx.draw(&Line::new(x, 0.0, x, HEIGHT, grid));
                    x += GRID_SPACING;
                }
                let mut y = 0.0;
                while y <= HEIGHT {
                    ctx.draw(&Line::new(0.0, y, WIDTH, y, grid));
                    y += GRID_SPACING;
                }
                ctx.layer();
            }

            for note in notes {
                let (x, y) = position(note.pitch);
                let (r, g, b) = note.color.dimmed(note.opacity).to_rgb8();
                let color = Color::Rgb(r, g, b);
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: note.radius as f64,
                    color,
                });
                ctx.print(x, y, Span::styled(note_name(note.pitch), Style::default().fg(color)));
            }
        });

    frame.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octaves_share_a_column() {
        let (x4, y4) = position(60);
        let (x5, y5) = position(72);
        assert_eq!(x4, x5);
        assert!(y5 > y4);
        assert!(position(61).0 > x4);
    }
}
