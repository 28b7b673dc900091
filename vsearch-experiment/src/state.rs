use crate::config::ExperimentSettings;
use crate::placement::PlacementEngine;
use crate::results::ResultsLog;
use crate::schedule::EventQueue;
use crate::trial::Trial;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};
use vsearch_core::{StimulusSet, TrialPhase, TrialResult};
use vsearch_timing::Timer;

/// Inputs to the trial state machine. Timer events carry the index of the
/// trial that scheduled them; a stale one is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentEvent {
    FixationElapsed { trial: usize },
    StimulusOnset { trial: usize },
    ResponseReceived,
}

/// Display mode changes for the shell to apply when it can
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationRequest {
    EnterFullscreen,
    ExitFullscreen,
}

/// What the shell should draw right now
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderRequest {
    #[default]
    Blank,
    Fixation {
        canvas_size: u32,
        glyph_size: u32,
    },
    Stimulus {
        stimulus: Arc<StimulusSet>,
        canvas_size: u32,
        glyph_size: u32,
    },
}

impl RenderRequest {
    pub fn canvas_size(&self) -> Option<u32> {
        match self {
            RenderRequest::Blank => None,
            RenderRequest::Fixation { canvas_size, .. }
            | RenderRequest::Stimulus { canvas_size, .. } => Some(*canvas_size),
        }
    }
}

/// Fixation → stimulus → response loop over `total_trials` trials.
///
/// Nothing blocks: the fixation timeout sits in an event queue that
/// [`update`](Self::update) drains against the injected timer, and the
/// response arrives through [`respond`](Self::respond).
pub struct ExperimentStateMachine<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub timer: T,
    pub rng: R,
    settings: ExperimentSettings,
    phase: TrialPhase,
    active: bool,
    queue: EventQueue<ExperimentEvent>,
    pending_onset: Option<usize>,
    current: Option<Trial>,
    reserve: Option<Arc<StimulusSet>>,
    idle_frame: RenderRequest,
    trial_number: usize,
    results: ResultsLog,
    requests: Vec<PresentationRequest>,
}

impl<T, R> ExperimentStateMachine<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(settings: ExperimentSettings, timer: T, rng: R) -> Self {
        Self {
            timer,
            rng,
            settings,
            phase: TrialPhase::Idle,
            active: false,
            queue: EventQueue::new(),
            pending_onset: None,
            current: None,
            reserve: None,
            idle_frame: RenderRequest::Blank,
            trial_number: 0,
            results: ResultsLog::new(),
            requests: Vec::new(),
        }
    }

    /// Resets the log, asks for fullscreen, pregenerates the repeat set and
    /// enters fixation for the first trial. Refused while a run is active.
    pub fn start_experiment(&mut self) -> bool {
        if self.active {
            debug!("start ignored: experiment already running");
            return false;
        }
        self.results.clear();
        self.queue.clear();
        self.pending_onset = None;
        self.trial_number = 0;
        self.active = true;
        self.requests.push(PresentationRequest::EnterFullscreen);

        let reserve = Arc::new(PlacementEngine::generate(&self.settings.trial, &mut self.rng));
        self.idle_frame = self.frame_for(Arc::clone(&reserve));
        self.reserve = Some(reserve);

        info!(
            total_trials = self.settings.total_trials,
            repeat_percentage = self.settings.trial.repeat_percentage,
            fixation_ms = self.settings.trial.fixation_ms,
            "experiment started"
        );
        self.begin_fixation();
        true
    }

    /// Dispatches every queued event that has come due. Returns how many
    /// events changed state.
    ///
    /// An onset left pending by the previous pass is delivered first: by
    /// then the stimulus has been on screen for at least one frame.
    pub fn update(&mut self) -> usize {
        let mut handled = 0;
        if self.mark_onset() {
            handled += 1;
        }
        while let Some(event) = self.queue.pop_due(self.timer.now()) {
            if self.handle_event(event) {
                handled += 1;
            }
        }
        handled
    }

    /// Stimulus is now visible; starts the reaction clock. Shells call this
    /// right after presenting the frame that carries the stimulus.
    pub fn mark_onset(&mut self) -> bool {
        match self.pending_onset.take() {
            Some(trial) => self.handle_event(ExperimentEvent::StimulusOnset { trial }),
            None => false,
        }
    }

    /// The "target found" signal. Only counts while awaiting a response.
    pub fn respond(&mut self) -> bool {
        self.handle_event(ExperimentEvent::ResponseReceived)
    }

    pub fn handle_event(&mut self, event: ExperimentEvent) -> bool {
        match (self.phase, event) {
            (TrialPhase::Fixation, ExperimentEvent::FixationElapsed { trial })
                if trial == self.trial_number =>
            {
                self.present_stimulus();
                true
            }
            (TrialPhase::StimulusDisplay, ExperimentEvent::StimulusOnset { trial })
                if trial == self.trial_number =>
            {
                self.pending_onset = None;
                let now = self.timer.now();
                if let Some(current) = &mut self.current {
                    current.timestamps.stimulus_start = Some(now);
                }
                self.phase = TrialPhase::AwaitingResponse;
                true
            }
            (phase, ExperimentEvent::ResponseReceived) if phase.accepts_response() && self.active => {
                self.record_response();
                true
            }
            (phase, event) => {
                debug!(?phase, ?event, "event ignored");
                false
            }
        }
    }

    /// One-off stimulus for preview outside a run; no timing is recorded
    pub fn generate_preview(&mut self) -> Option<Arc<StimulusSet>> {
        if self.active {
            return None;
        }
        let stimulus = Arc::new(PlacementEngine::generate(&self.settings.trial, &mut self.rng));
        debug!(glyphs = stimulus.len(), "preview generated");
        self.idle_frame = self.frame_for(Arc::clone(&stimulus));
        Some(stimulus)
    }

    /// New settings take effect from the next trial; the running trial
    /// keeps the snapshot it started with.
    pub fn set_settings(&mut self, settings: ExperimentSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &ExperimentSettings {
        &self.settings
    }

    pub fn render_request(&self) -> RenderRequest {
        let Some(trial) = &self.current else {
            return self.idle_frame.clone();
        };
        if self.phase.shows_fixation() {
            return RenderRequest::Fixation {
                canvas_size: trial.config.canvas_size,
                glyph_size: trial.config.glyph_size,
            };
        }
        if !self.phase.shows_stimulus() {
            return self.idle_frame.clone();
        }
        match &trial.stimulus {
            Some(stimulus) => RenderRequest::Stimulus {
                stimulus: Arc::clone(stimulus),
                canvas_size: trial.config.canvas_size,
                glyph_size: trial.config.glyph_size,
            },
            None => RenderRequest::Blank,
        }
    }

    pub fn drain_presentation_requests(&mut self) -> Vec<PresentationRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Zero-based index of the running trial
    pub fn trial_number(&self) -> usize {
        self.trial_number
    }

    /// `(current, total)` with the current trial counted from 1
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.active
            .then(|| (self.trial_number + 1, self.settings.total_trials as usize))
    }

    pub fn results(&self) -> &ResultsLog {
        &self.results
    }

    pub fn reserve(&self) -> Option<&Arc<StimulusSet>> {
        self.reserve.as_ref()
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        self.current.as_ref()
    }

    pub fn last_was_repeat(&self) -> bool {
        match &self.current {
            Some(trial) if trial.stimulus.is_some() => trial.is_repeat,
            _ => self.results.iter().last().is_some_and(|r| r.is_repeat),
        }
    }

    /// Due time of the next queued event, for shells that sleep between polls
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.next_due()
    }

    fn begin_fixation(&mut self) {
        let now = self.timer.now();
        let trial = Trial::new(self.trial_number, self.settings.trial.clone(), now);
        self.queue.schedule(
            trial.fixation_deadline(),
            ExperimentEvent::FixationElapsed {
                trial: self.trial_number,
            },
        );
        debug!(
            trial = self.trial_number + 1,
            fixation_ms = trial.config.fixation_ms,
            "fixation"
        );
        self.current = Some(trial);
        self.phase = TrialPhase::Fixation;
    }

    fn present_stimulus(&mut self) {
        let Some(trial) = &mut self.current else {
            return;
        };
        let use_repeat = match &self.reserve {
            Some(_) => self.rng.random_bool(trial.config.repeat_probability()),
            None => false,
        };
        let stimulus = match (&self.reserve, use_repeat) {
            (Some(reserve), true) => Arc::clone(reserve),
            _ => Arc::new(PlacementEngine::generate(&trial.config, &mut self.rng)),
        };
        debug!(
            trial = trial.index + 1,
            glyphs = stimulus.len(),
            repeat = use_repeat,
            "stimulus"
        );
        trial.stimulus = Some(stimulus);
        trial.is_repeat = use_repeat;
        self.phase = TrialPhase::StimulusDisplay;
        self.pending_onset = Some(self.trial_number);
    }

    fn record_response(&mut self) {
        let Some(trial) = self.current.take() else {
            return;
        };
        let now = self.timer.now();
        let elapsed_ms = trial.reaction_ms(now).unwrap_or(0);
        let stimulus = trial.stimulus.unwrap_or_default();
        debug!(trial = trial.index + 1, elapsed_ms, "response");

        self.idle_frame = RenderRequest::Stimulus {
            stimulus: Arc::clone(&stimulus),
            canvas_size: trial.config.canvas_size,
            glyph_size: trial.config.glyph_size,
        };
        self.results.push(TrialResult {
            config: trial.config,
            is_repeat: trial.is_repeat,
            elapsed_ms,
            stimulus,
        });

        if self.results.len() >= self.settings.total_trials as usize {
            self.finish();
        } else {
            self.trial_number += 1;
            self.begin_fixation();
        }
    }

    fn finish(&mut self) {
        self.active = false;
        self.phase = TrialPhase::Idle;
        self.current = None;
        self.queue.clear();
        self.pending_onset = None;
        self.requests.push(PresentationRequest::ExitFullscreen);

        if let Some(s) = self.results.summary() {
            info!(
                trials = s.trials,
                repeats = s.repeats,
                mean_ms = s.mean_ms,
                min_ms = s.min_ms,
                max_ms = s.max_ms,
                "experiment finished"
            );
        }
    }

    fn frame_for(&self, stimulus: Arc<StimulusSet>) -> RenderRequest {
        RenderRequest::Stimulus {
            stimulus,
            canvas_size: self.settings.trial.canvas_size,
            glyph_size: self.settings.trial.glyph_size,
        }
    }
}
