//! Terminal rendering: key strip, instrument/chord panel, help bar.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use virtuoso_synth::{
    catalog::KeyCategory, chord::ChordProfile, instrument::InstrumentKind,
    player::PlaybackOutcome,
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Keys
            Constraint::Length(4), // Instrument and chord
            Constraint::Min(3),    // Status
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_keys(frame, chunks[0], app);
    render_selection(frame, chunks[1], app);
    render_status(frame, chunks[2], app);

    let help = if app.release_events {
        " [keys] play  [1-4] instrument  [5-9] chord  [Enter] melody  [Esc] stop melody  [Ctrl+C] quit"
    } else {
        " [keys] press on, pause, press off  [1-4] instrument  [5-9] chord  [Enter] melody  [Esc] stop melody  [Ctrl+C] quit"
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

fn render_keys(frame: &mut Frame, area: Rect, app: &App) {
    let mut names = Vec::new();
    let mut chars = Vec::new();

    for (note, light) in app.keyboard.lights(app.player.ai_note()) {
        let base = match note.category {
            KeyCategory::Natural => Style::default().fg(Color::Black).bg(Color::White),
            KeyCategory::Accidental => Style::default().fg(Color::White).bg(Color::DarkGray),
        };
        let style = if light.active {
            base.bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else if light.ai_playing {
            base.bg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else {
            base
        };

        names.push(Span::styled(format!("{:^5}", note.name), style));
        names.push(Span::raw(" "));
        chars.push(Span::styled(format!("{:^5}", note.input_char), style));
        chars.push(Span::raw(" "));
    }

    let block = Block::default().title(" Keys ").borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(vec![Line::from(names), Line::from(chars)]).block(block),
        area,
    );
}

fn render_selection(frame: &mut Frame, area: Rect, app: &App) {
    let selected = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let instruments: Vec<Span> = InstrumentKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let label = format!(" {}:{} ", i + 1, kind.name());
            if *kind == app.keyboard.instrument() {
                Span::styled(label, selected)
            } else {
                Span::raw(label)
            }
        })
        .collect();

    let chords: Vec<Span> = ChordProfile::ALL
        .iter()
        .enumerate()
        .map(|(i, profile)| {
            let label = format!(" {}:{} ", i + 5, profile.name());
            if *profile == app.keyboard.chord() {
                Span::styled(label, selected)
            } else {
                Span::raw(label)
            }
        })
        .collect();

    let block = Block::default()
        .title(format!(" {} ", app.keyboard.instrument().description()))
        .borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(vec![Line::from(instruments), Line::from(chords)]).block(block),
        area,
    );
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let engine = app.engine.borrow();

    let audio = if app.audio {
        format!(
            "audio {:>7.2}s   voices {} held, {} fading",
            engine.now().as_secs_f32(),
            engine.active_count(),
            engine.releasing_count()
        )
    } else {
        "no audio device, running silent".to_owned()
    };

    let melody = match (&app.melody, app.player.is_playing(), app.last_outcome.get()) {
        (None, _, _) => "no melody loaded (--melody <file>)".to_owned(),
        (Some(m), true, _) => format!("playing \"{}\"", m.title),
        (Some(m), false, Some(PlaybackOutcome::Cancelled)) => format!("\"{}\" stopped", m.title),
        (Some(m), false, Some(PlaybackOutcome::Finished)) => format!("\"{}\" finished", m.title),
        (Some(m), false, None) => format!("\"{}\" ready ({} notes)", m.title, m.notes.len()),
    };

    let block = Block::default().title(" virtuoso ").borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(vec![Line::from(audio), Line::from(melody)]).block(block),
        area,
    );
}
