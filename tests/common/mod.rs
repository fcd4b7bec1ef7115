#![allow(dead_code)]

use tokio::time::Instant;
use virtuoso_synth::{
    config::Settings,
    instrument::InstrumentKind,
    io::OfflineDriver,
    synth::{ToneSink, VoiceEngine},
};

pub const SAMPLE_RATE: f32 = 48_000.0;

/// Engine on an offline output. Audio only advances through the driver.
pub fn offline_engine() -> (VoiceEngine, OfflineDriver) {
    offline_engine_with(Settings::default())
}

pub fn offline_engine_with(mut settings: Settings) -> (VoiceEngine, OfflineDriver) {
    settings.output.offline_sample_rate = SAMPLE_RATE;
    let mut engine = VoiceEngine::new(settings);
    let driver = engine
        .init_offline()
        .expect("offline output always starts");
    (engine, driver)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToneEvent {
    Play {
        id: String,
        frequency: f32,
        instrument: InstrumentKind,
    },
    Stop {
        id: String,
    },
}

/// Records every call with its time (milliseconds since creation, tokio clock).
pub struct RecordingSink {
    start: Instant,
    pub events: Vec<(u64, ToneEvent)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            events: Vec::new(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Compact form: `"play C4_0 @0"`, `"stop C4_0 @300"`.
    pub fn timeline(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|(at, event)| match event {
                ToneEvent::Play { id, .. } => format!("play {id} @{at}"),
                ToneEvent::Stop { id } => format!("stop {id} @{at}"),
            })
            .collect()
    }
}

impl ToneSink for RecordingSink {
    fn play_tone(&mut self, frequency: f32, id: &str, instrument: InstrumentKind) {
        let at = self.elapsed_ms();
        self.events.push((
            at,
            ToneEvent::Play {
                id: id.to_owned(),
                frequency,
                instrument,
            },
        ));
    }

    fn stop_tone(&mut self, id: &str) {
        let at = self.elapsed_ms();
        self.events.push((at, ToneEvent::Stop { id: id.to_owned() }));
    }
}
