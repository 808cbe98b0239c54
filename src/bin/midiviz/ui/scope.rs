//! Echo scope: what the synth is playing back, tinted by the newest note

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use midi_visualizer::io::converter::note_name;
use midi_visualizer::visual::NoteSnapshot;

/// Smallest vertical half-range, so near-silence doesn't fill the panel
const MIN_RANGE: f32 = 0.05;
/// Names listed in the title before eliding the rest
const TITLE_NOTES: usize = 4;

/// Reduce `samples` to `points` (x, y) pairs, keeping the largest excursion
/// of each bucket so transients survive.
fn decimate(samples: &[f32], points: usize) -> Vec<(f64, f64)> {
    if samples.is_empty() || points == 0 {
        return Vec::new();
    }
    let bucket = samples.len().div_ceil(points);
    let buckets = samples.len().div_ceil(bucket) as f64;

    samples
        .chunks(bucket)
        .enumerate()
        .map(|(i, chunk)| {
            let peak = chunk
                .iter()
                .copied()
                .fold(0.0f32, |acc, s| if s.abs() > acc.abs() { s } else { acc });
            (i as f64 / buckets, peak as f64)
        })
        .collect()
}

/// Colour of the most recently struck note that is still held, else the
/// most recent one.
fn trace_color(notes: &[NoteSnapshot]) -> Color {
    let newest = notes
        .iter()
        .filter(|n| n.fade_duration.is_none())
        .max_by_key(|n| n.created_at)
        .or_else(|| notes.iter().max_by_key(|n| n.created_at));

    match newest {
        Some(note) => {
            let (r, g, b) = note.color.to_rgb8();
            Color::Rgb(r, g, b)
        }
        None => Color::DarkGray,
    }
}

fn title(notes: &[NoteSnapshot], peak: f32) -> String {
    let mut held: Vec<&NoteSnapshot> = notes.iter().filter(|n| n.fade_duration.is_none()).collect();
    held.sort_by_key(|n| n.pitch);

    let mut names: Vec<String> = held.iter().take(TITLE_NOTES).map(|n| note_name(n.pitch)).collect();
    if held.len() > TITLE_NOTES {
        names.push(format!("+{}", held.len() - TITLE_NOTES));
    }

    if names.is_empty() {
        format!(" Echo  peak {peak:.2} ")
    } else {
        format!(" Echo {}  peak {peak:.2} ", names.join(" "))
    }
}

pub fn render_scope(
    frame: &mut Frame,
    area: Rect,
    samples: &[f32],
    notes: &[NoteSnapshot],
    sound_enabled: bool,
) {
    if !sound_enabled {
        let muted = Paragraph::new("muted, [M] to hear the echo")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(" Echo ").borders(Borders::ALL));
        frame.render_widget(muted, area);
        return;
    }

    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    let range = peak.max(MIN_RANGE) as f64;

    // Braille packs two dots per cell horizontally
    let data = decimate(samples, area.width.saturating_sub(2) as usize * 2);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(trace_color(notes)))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(title(notes, peak)).borders(Borders::ALL))
        .x_axis(Axis::default().bounds([0.0, 1.0]))
        .y_axis(Axis::default().bounds([-range, range]));

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_visualizer::visual::ColorScheme;
    use std::time::{Duration, Instant};

    fn note(pitch: u8, created_at: Instant, released: bool) -> NoteSnapshot {
        NoteSnapshot {
            pitch,
            velocity: 100,
            radius: 40.0,
            color: ColorScheme::Rainbow.color(pitch, 100),
            opacity: 1.0,
            fade_duration: released.then(|| Duration::from_secs(2)),
            created_at,
        }
    }

    #[test]
    fn decimate_keeps_the_loudest_sample_per_bucket() {
        let samples = [0.1, -0.9, 0.2, 0.3, 0.5, -0.4];
        let points = decimate(&samples, 3);
        let ys: Vec<f64> = points.iter().map(|&(_, y)| y).collect();
        assert_eq!(ys, vec![-0.9f32 as f64, 0.3f32 as f64, 0.5f32 as f64]);
        assert_eq!(points[0].0, 0.0);
        assert!(decimate(&[], 10).is_empty());
    }

    #[test]
    fn trace_follows_the_newest_held_note() {
        let t0 = Instant::now();
        let notes = [
            note(60, t0, false),
            note(64, t0 + Duration::from_millis(10), false),
            note(67, t0 + Duration::from_millis(20), true),
        ];
        let (r, g, b) = notes[1].color.to_rgb8();
        assert_eq!(trace_color(&notes), Color::Rgb(r, g, b));
        assert_eq!(trace_color(&[]), Color::DarkGray);
    }

    #[test]
    fn title_lists_held_notes_in_pitch_order() {
        let t0 = Instant::now();
        let notes: Vec<_> = [67, 60, 64, 72, 76, 79]
            .into_iter()
            .map(|p| note(p, t0, false))
            .collect();
        assert_eq!(title(&notes, 0.5), " Echo C4 E4 G4 C5 +2  peak 0.50 ");
        assert_eq!(title(&[], 0.0), " Echo  peak 0.00 ");
    }
}
