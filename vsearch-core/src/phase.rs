/// Position of the experiment inside a trial
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum TrialPhase {
    #[default]
    Idle,
    Fixation,
    StimulusDisplay,
    AwaitingResponse,
}

impl TrialPhase {
    pub fn accepts_response(&self) -> bool {
        matches!(self, Self::AwaitingResponse)
    }

    pub fn shows_fixation(&self) -> bool {
        matches!(self, Self::Fixation)
    }

    pub fn shows_stimulus(&self) -> bool {
        matches!(self, Self::StimulusDisplay | Self::AwaitingResponse)
    }
}
