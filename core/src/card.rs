use crate::settings::CardSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnMode {
    Animated,
    Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardMarker {
    Opening,
    Open,
}

impl CardMarker {
    pub fn class_name(self) -> &'static str {
        match self {
            CardMarker::Opening => "opening",
            CardMarker::Open => "open",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerDelay {
    NextFrame,
    Millis(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardEffect {
    AddMarker(CardMarker),
    RemoveMarker(CardMarker),
    /// Replaces whatever marker change is still pending.
    ScheduleMarker {
        marker: CardMarker,
        add: bool,
        delay: MarkerDelay,
    },
    PlayTurn,
    ReverseTurn,
    PlayAudio,
    StopAudio,
    SetPressed(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardRequest {
    /// Trigger button click.
    Toggle,
    Open,
    Close,
    /// Pointer interaction outside the card and the trigger.
    OutsideClick,
    /// Initial forced close.
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardTiming {
    pub open_settle_ms: u32,
    pub close_settle_ms: u32,
}

impl From<&CardSettings> for CardTiming {
    fn from(settings: &CardSettings) -> Self {
        Self {
            open_settle_ms: settings.open_settle_ms,
            close_settle_ms: settings.close_settle_ms,
        }
    }
}

impl Default for CardTiming {
    fn default() -> Self {
        Self::from(&CardSettings::default())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardState {
    opened: bool,
    pressed: bool,
}

impl CardState {
    pub fn opened(&self) -> bool {
        self.opened
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    pub fn apply(&mut self, request: CardRequest, mode: TurnMode, timing: CardTiming) -> Vec<CardEffect> {
        match request {
            CardRequest::Toggle if self.pressed => self.close(mode, timing),
            CardRequest::Toggle => self.open(mode, timing),
            CardRequest::Open if !self.opened => self.open(mode, timing),
            CardRequest::Close | CardRequest::OutsideClick if self.opened => {
                self.close(mode, timing)
            }
            CardRequest::Reset => self.close(mode, timing),
            _ => Vec::new(),
        }
    }

    fn open(&mut self, mode: TurnMode, timing: CardTiming) -> Vec<CardEffect> {
        self.opened = true;
        self.pressed = true;
        let mut effects = vec![CardEffect::AddMarker(CardMarker::Opening)];
        let delay = match mode {
            TurnMode::Animated => {
                effects.push(CardEffect::PlayTurn);
                MarkerDelay::Millis(timing.open_settle_ms)
            }
            TurnMode::Instant => MarkerDelay::NextFrame,
        };
        effects.push(CardEffect::ScheduleMarker {
            marker: CardMarker::Open,
            add: true,
            delay,
        });
        effects.push(CardEffect::PlayAudio);
        effects.push(CardEffect::SetPressed(true));
        effects
    }

    fn close(&mut self, mode: TurnMode, timing: CardTiming) -> Vec<CardEffect> {
        self.opened = false;
        self.pressed = false;
        let mut effects = vec![CardEffect::RemoveMarker(CardMarker::Open)];
        if mode == TurnMode::Animated {
            effects.push(CardEffect::ReverseTurn);
        }
        effects.push(CardEffect::ScheduleMarker {
            marker: CardMarker::Opening,
            add: false,
            delay: MarkerDelay::Millis(timing.close_settle_ms),
        });
        effects.push(CardEffect::StopAudio);
        effects.push(CardEffect::SetPressed(false));
        effects
    }
}
