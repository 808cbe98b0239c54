//! On-screen keyboard widget - one octave, lit by the active notes

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use midi_visualizer::io::converter::note_name;
use midi_visualizer::sequencing::notes::{BLACK_KEYS, C4, WHITE_KEYS};
use midi_visualizer::visual::NoteSnapshot;

fn key_style(pitch: u8, black: bool, notes: &[NoteSnapshot]) -> Style {
    match notes.iter().find(|n| n.pitch == pitch) {
        Some(note) => {
            let (r, g, b) = note.color.dimmed(note.opacity.max(0.3)).to_rgb8();
            Style::default()
                .bg(Color::Rgb(r, g, b))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        }
        None if black => Style::default().bg(Color::Rgb(30, 30, 30)).fg(Color::Gray),
        None => Style::default().bg(Color::Gray).fg(Color::Black),
    }
}

fn label(pitch: u8, key_map: &[char; 12]) -> String {
    let key = key_map[(pitch - C4) as usize].to_ascii_uppercase();
    format!("{}\n{}", note_name(pitch), key)
}

pub fn render_keyboard(frame: &mut Frame, area: Rect, notes: &[NoteSnapshot], key_map: &[char; 12]) {
    let block = Block::default().title(" Keyboard ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width < 14 || inner.height < 4 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(2)])
        .split(inner);

    let white_cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, WHITE_KEYS.len() as u32); WHITE_KEYS.len()])
        .split(rows[1]);

    for (&pitch, &cell) in WHITE_KEYS.iter().zip(white_cells.iter()) {
        let key = Paragraph::new(label(pitch, key_map))
            .alignment(Alignment::Center)
            .style(key_style(pitch, false, notes));
        frame.render_widget(key, cell);
    }

    // Black keys sit on the boundary between two white keys
    let white_width = inner.width as f32 / WHITE_KEYS.len() as f32;
    let black_width = (white_width * 0.6).max(3.0) as u16;
    for &(pitch, position) in &BLACK_KEYS {
        let center = inner.x as f32 + position * white_width;
        let x = (center - black_width as f32 / 2.0).max(inner.x as f32) as u16;
        let cell = Rect::new(x, rows[0].y, black_width, rows[0].height).intersection(rows[0]);
        let key = Paragraph::new(label(pitch, key_map))
            .alignment(Alignment::Center)
            .style(key_style(pitch, true, notes));
        frame.render_widget(key, cell);
    }
}
