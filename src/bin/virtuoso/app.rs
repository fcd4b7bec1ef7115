use std::cell::{Cell, RefCell};
use std::io::stdout;
use std::rc::Rc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use futures_util::StreamExt;
use ratatui::DefaultTerminal;
use virtuoso_synth::{
    chord::ChordProfile,
    instrument::InstrumentKind,
    keyboard::{KeyInput, Keyboard, PressRepeatGuard},
    melody::Melody,
    player::{cancel_pair, CancelHandle, MelodyPlayer, PlaybackOutcome},
    synth::VoiceEngine,
};

/// UI refresh and cleanup polling interval
const TICK: Duration = Duration::from_millis(33);

pub struct App {
    pub engine: Rc<RefCell<VoiceEngine>>,
    pub keyboard: Keyboard,
    pub player: Rc<MelodyPlayer>,
    pub melody: Option<Melody>,
    pub last_outcome: Rc<Cell<Option<PlaybackOutcome>>>,
    /// Audio device opened
    pub audio: bool,
    /// Terminal reports key releases
    pub release_events: bool,
    press_guard: PressRepeatGuard,
    cancel: CancelHandle,
    should_quit: bool,
}

impl App {
    pub fn new(engine: VoiceEngine, melody: Option<Melody>, audio: bool) -> Self {
        let settings = engine.settings().clone();
        let (cancel, _) = cancel_pair();

        Self {
            engine: Rc::new(RefCell::new(engine)),
            keyboard: Keyboard::new(settings.instrument, settings.chord),
            player: Rc::new(MelodyPlayer::new(&settings.melody)),
            melody,
            last_outcome: Rc::new(Cell::new(None)),
            audio,
            release_events: false,
            press_guard: PressRepeatGuard::default(),
            cancel,
            should_quit: false,
        }
    }

    /// Run the event loop until Ctrl+C. Must be driven inside a `LocalSet`.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> EyreResult<()> {
        self.release_events = supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.event_loop(&mut terminal).await;

        if self.release_events {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        self.cancel.cancel();
        self.keyboard.release_all(&mut *self.engine.borrow_mut());
        self.engine.borrow_mut().dispose();
        result
    }

    async fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(TICK);

        while !self.should_quit {
            let view: &App = self;
            terminal.draw(|frame| crate::ui::render(frame, view))?;

            tokio::select! {
                _ = tick.tick() => {
                    self.engine.borrow_mut().poll_cleanup();
                }
                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(err)) => return Err(err.into()),
                    None => break,
                },
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::FocusLost => self.keyboard.release_all(&mut *self.engine.borrow_mut()),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        let pressed = key.kind == KeyEventKind::Press;
        match key.code {
            KeyCode::Esc if pressed => self.cancel.cancel(),
            KeyCode::Enter if pressed => self.play_melody(),
            KeyCode::Char(c @ '1'..='4') if pressed => {
                let idx = c as usize - '1' as usize;
                self.keyboard.set_instrument(InstrumentKind::ALL[idx]);
            }
            KeyCode::Char(c @ '5'..='9') if pressed => {
                let idx = c as usize - '5' as usize;
                self.keyboard.set_chord(ChordProfile::ALL[idx]);
            }
            KeyCode::Char(c) => self.handle_note(c, key.kind),
            _ => {}
        }
    }

    fn handle_note(&mut self, c: char, kind: KeyEventKind) {
        let input = KeyInput::char(c);
        let mut engine = self.engine.borrow_mut();

        match kind {
            KeyEventKind::Press if self.release_events => {
                self.keyboard.key_down(input, &mut *engine);
            }
            // No release reporting: a second press releases the note, and
            // auto-repeat arrives as more presses
            KeyEventKind::Press => {
                let Some(note) = input.resolve() else {
                    return;
                };
                if self.press_guard.is_repeat(note.name, Instant::now()) {
                    return;
                }
                if self.keyboard.is_held(note.name) {
                    self.keyboard.key_up(input, &mut *engine);
                } else {
                    self.keyboard.key_down(input, &mut *engine);
                }
            }
            KeyEventKind::Repeat => {
                self.keyboard.key_down(input.repeated(), &mut *engine);
            }
            KeyEventKind::Release => {
                self.keyboard.key_up(input, &mut *engine);
            }
        }
    }

    fn play_melody(&mut self) {
        if self.player.is_playing() {
            return;
        }
        let Some(melody) = self.melody.clone() else {
            return;
        };

        self.cancel.reset();
        let mut token = self.cancel.token();
        let engine = Rc::clone(&self.engine);
        let player = Rc::clone(&self.player);
        let outcome = Rc::clone(&self.last_outcome);
        let instrument = self.keyboard.instrument();

        outcome.set(None);
        tokio::task::spawn_local(async move {
            let result = player.play(&melody, instrument, &*engine, &mut token).await;
            outcome.set(Some(result));
        });
    }
}
