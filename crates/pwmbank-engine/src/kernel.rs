//! Render-side kernel: parameter ramps and note state.
//!
//! The kernel owns one [`ParameterRamper`] per parameter and a fixed table of
//! 128 note slots. Control-side writes arrive as [`KernelCommand`]s and are
//! applied at the start of each [`process`](BankKernel::process) call, so the
//! kernel never locks.

use crossbeam_channel::Receiver;
use pwmbank_core::{
    ramp_samples, NoteNumber, ParameterId, ParameterRamper, Velocity, PARAMETER_COUNT,
};

const NOTE_SLOTS: usize = 128;
const MAX_FREQUENCY: f32 = 22050.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelCommand {
    /// Observer write: ramp over the current ramp time.
    Ramp { id: ParameterId, value: f32 },
    /// Direct write: jump.
    SetImmediate { id: ParameterId, value: f32 },
    SetRampTime(f64),
    StartNote {
        note: NoteNumber,
        velocity: Velocity,
        frequency: f32,
    },
    StopNote { note: NoteNumber },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteStage {
    #[default]
    Off,
    On,
    Release,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoteState {
    pub note: NoteNumber,
    pub stage: NoteStage,
    pub frequency: f32,
    /// `(velocity / 127)^2`
    pub amplitude: f32,
    release_remaining: u32,
}

impl NoteState {
    pub fn is_active(&self) -> bool {
        self.stage != NoteStage::Off
    }
}

pub struct BankKernel {
    sample_rate: f64,
    ramp_samples: u32,
    rampers: [ParameterRamper; PARAMETER_COUNT],
    notes: [NoteState; NOTE_SLOTS],
    commands: Receiver<KernelCommand>,
    frames_rendered: u64,
}

impl BankKernel {
    pub(crate) fn new(
        sample_rate: f64,
        ramp_time: f64,
        initial: [f32; PARAMETER_COUNT],
        commands: Receiver<KernelCommand>,
    ) -> Self {
        let mut notes = [NoteState::default(); NOTE_SLOTS];
        for (i, state) in notes.iter_mut().enumerate() {
            state.note = i as NoteNumber;
        }

        Self {
            sample_rate,
            ramp_samples: ramp_samples(ramp_time, sample_rate),
            rampers: initial.map(ParameterRamper::new),
            notes,
            commands,
            frames_rendered: 0,
        }
    }

    /// Apply pending commands, then advance ramps and notes by `frame_count`.
    pub fn process(&mut self, frame_count: u32) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }

        for ramper in self.rampers.iter_mut() {
            ramper.get_and_step(frame_count);
        }

        for state in self.notes.iter_mut() {
            if state.stage == NoteStage::Release {
                state.release_remaining = state.release_remaining.saturating_sub(frame_count);
                if state.release_remaining == 0 {
                    state.stage = NoteStage::Off;
                    state.amplitude = 0.0;
                }
            }
        }

        self.frames_rendered += frame_count as u64;
    }

    fn apply(&mut self, command: KernelCommand) {
        match command {
            KernelCommand::Ramp { id, value } => {
                self.rampers[id.index()].start_ramp(value, self.ramp_samples);
            }
            KernelCommand::SetImmediate { id, value } => {
                self.rampers[id.index()].set_immediate(value);
            }
            KernelCommand::SetRampTime(seconds) => {
                self.ramp_samples = ramp_samples(seconds, self.sample_rate);
            }
            KernelCommand::StartNote {
                note,
                velocity,
                frequency,
            } => self.start_note(note, velocity, frequency),
            KernelCommand::StopNote { note } => self.start_note(note, 0, 0.0),
        }
    }

    fn start_note(&mut self, note: NoteNumber, velocity: Velocity, frequency: f32) {
        let release_samples = self.seconds_to_samples(self.parameter(ParameterId::ReleaseDuration));
        let Some(state) = self.notes.get_mut(note as usize) else {
            tracing::debug!("Ignoring note {} outside the note table", note);
            return;
        };

        if velocity == 0 {
            if state.stage == NoteStage::On {
                state.stage = NoteStage::Release;
                state.release_remaining = release_samples;
                if release_samples == 0 {
                    state.stage = NoteStage::Off;
                    state.amplitude = 0.0;
                }
            }
        } else {
            state.stage = NoteStage::On;
            state.frequency = frequency;
            let v = velocity.min(127) as f32 / 127.0;
            state.amplitude = v * v;
        }
    }

    fn seconds_to_samples(&self, seconds: f32) -> u32 {
        (seconds.max(0.0) as f64 * self.sample_rate).round() as u32
    }

    /// Current ramped value.
    #[inline]
    pub fn parameter(&self, id: ParameterId) -> f32 {
        self.rampers[id.index()].current()
    }

    #[inline]
    pub fn parameter_target(&self, id: ParameterId) -> f32 {
        self.rampers[id.index()].target()
    }

    pub fn is_ramping(&self, id: ParameterId) -> bool {
        self.rampers[id.index()].is_ramping()
    }

    pub fn ramp_samples(&self) -> u32 {
        self.ramp_samples
    }

    pub fn note(&self, note: NoteNumber) -> Option<&NoteState> {
        self.notes.get(note as usize)
    }

    pub fn active_notes(&self) -> impl Iterator<Item = &NoteState> {
        self.notes.iter().filter(|state| state.is_active())
    }

    /// Note frequency after pitch bend, clamped to 0-22050 Hz.
    pub fn bent_frequency(&self, note: NoteNumber) -> Option<f32> {
        let state = self.note(note).filter(|s| s.is_active())?;
        let bend = self.parameter(ParameterId::PitchBend);
        Some((state.frequency * 2.0_f32.powf(bend / 12.0)).clamp(0.0, MAX_FREQUENCY))
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
