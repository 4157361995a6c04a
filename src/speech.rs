/// Playback options forwarded to the platform speech capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeakOptions {
    pub rate: f64,
    pub pitch: f64,
}

impl Default for SpeakOptions {
    fn default() -> Self {
        Self {
            rate: crate::narration::SPEECH_RATE,
            pitch: crate::narration::SPEECH_PITCH,
        }
    }
}

/// Abstract speech synthesis. Fire-and-forget: no completion event is
/// reported back, which is why callers lean on the script-length duration
/// estimate.
pub trait SpeechSynth {
    fn speak(&mut self, text: &str, options: &SpeakOptions);
    fn stop(&mut self);
}

/// Wraps a synthesizer and enforces the at-most-one-utterance rule: starting
/// a new utterance stops any prior one, and stopping while idle is a no-op.
#[allow(dead_code)]
pub struct Narrator<S: SpeechSynth> {
    synth: S,
    speaking: bool,
}

#[allow(dead_code)]
impl<S: SpeechSynth> Narrator<S> {
    pub fn new(synth: S) -> Self {
        Self {
            synth,
            speaking: false,
        }
    }

    pub fn speak(&mut self, text: &str, options: &SpeakOptions) {
        if text.is_empty() {
            return;
        }
        self.stop();
        self.synth.speak(text, options);
        self.speaking = true;
    }

    pub fn stop(&mut self) {
        if self.speaking {
            self.synth.stop();
            self.speaking = false;
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }
}
