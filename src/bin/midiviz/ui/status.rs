//! Status bar widget - endpoint state and the current settings

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use midi_visualizer::audio::Instrument;
use midi_visualizer::session::Session;

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

pub fn render_status<I: Instrument>(
    frame: &mut Frame,
    area: Rect,
    session: &Session<I>,
    sample_rate: Option<f32>,
    active: usize,
) {
    let title = match session.port().client_name() {
        "" => " midiviz ".to_string(),
        name => format!(" midiviz - {name} "),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let (endpoint, endpoint_color) = if session.is_connected() {
        ("● Connected", Color::Green)
    } else {
        ("○ Loopback only", Color::Yellow)
    };

    let settings = session.settings();
    let audio = match sample_rate {
        Some(rate) => format!("{:.1}kHz", rate / 1000.0),
        None => "no audio".to_string(),
    };

    let mut spans = vec![
        Span::styled(format!(" {endpoint}  "), Style::default().fg(endpoint_color)),
        Span::styled(
            format!("{} / {}  ", settings.style.name(), settings.color_scheme.name()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Speed {:.1}x  ", settings.animation_speed),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "Grid {}  Sound {}  ",
                on_off(settings.show_grid),
                on_off(settings.sound_enabled)
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{audio}  "), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("Notes: {active}"), Style::default().fg(Color::Magenta)),
    ];

    if session.is_demo_playing() {
        spans.push(Span::styled("  ▶ Demo", Style::default().fg(Color::Green)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
