// Dashboard session state: a small state record plus pure transitions

use crate::error::GENERIC_FAILURE;
use crate::geo::GeoLocation;
use crate::models::quiz::QuizScenario;
use crate::models::report::AnalysisReport;
use serde::{Deserialize, Serialize};

/// Which face of the dashboard the session is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Analyst,
    Training,
}

/// A finished analysis: the bound report plus its best-effort origin point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    /// `None` when the geolocation lookup failed; the map then falls back to
    /// the default world view.
    pub origin: Option<GeoLocation>,
}

/// The analysis panel holds at most one outcome, replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AnalysisSlot {
    #[default]
    Idle,
    InFlight,
    Ready(Box<AnalysisOutcome>),
    Failed(&'static str),
}

/// Quiz progress for the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizState {
    pub score: u32,
    pub rounds_played: u32,
    pub in_flight: bool,
    /// The outstanding scenario, ground truth included. Replaced wholesale
    /// each round; consumed by scoring.
    pub current: Option<QuizScenario>,
}

impl QuizState {
    /// Read-only check of a guess against the outstanding scenario.
    ///
    /// Correctness is strict boolean equality against the labeled ground
    /// truth. Returns `None` when no round is awaiting a guess.
    pub fn judge(&self, guess: bool) -> Option<(bool, QuizScenario)> {
        self.current
            .as_ref()
            .map(|scenario| (guess == scenario.is_phishing, scenario.clone()))
    }
}

/// Everything that can happen to a dashboard session.
#[derive(Debug, Clone)]
pub enum Event {
    ModeChanged(Mode),
    AnalysisStarted,
    AnalysisCompleted(Box<AnalysisOutcome>),
    AnalysisFailed,
    Reset,
    QuizOpened,
    QuizClosed,
    RoundStarted,
    RoundReady(QuizScenario),
    RoundFailed,
    GuessScored { correct: bool },
}

/// Per-session view state.
///
/// All mutation goes through [`DashboardState::apply`]; handlers read,
/// apply one event, and store the result back. The analysis and quiz flows
/// touch disjoint fields, so both may be in flight at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub mode: Mode,
    pub quiz_open: bool,
    pub analysis: AnalysisSlot,
    pub quiz: QuizState,
}

impl DashboardState {
    pub fn analysis_in_flight(&self) -> bool {
        matches!(self.analysis, AnalysisSlot::InFlight)
    }

    pub fn quiz_in_flight(&self) -> bool {
        self.quiz.in_flight
    }

    /// Apply one event and return the next state.
    ///
    /// Transitions are total: an event that does not apply in the current
    /// state (a duplicate submission, a stray completion) leaves the state
    /// unchanged rather than corrupting it.
    pub fn apply(mut self, event: Event) -> Self {
        match event {
            Event::ModeChanged(mode) => {
                self.mode = mode;
            }
            Event::AnalysisStarted => {
                if !self.analysis_in_flight() {
                    self.analysis = AnalysisSlot::InFlight;
                }
            }
            Event::AnalysisCompleted(outcome) => {
                if self.analysis_in_flight() {
                    self.analysis = AnalysisSlot::Ready(outcome);
                }
            }
            Event::AnalysisFailed => {
                if self.analysis_in_flight() {
                    self.analysis = AnalysisSlot::Failed(GENERIC_FAILURE);
                }
            }
            Event::Reset => {
                self.analysis = AnalysisSlot::Idle;
            }
            Event::QuizOpened => {
                self.quiz_open = true;
            }
            Event::QuizClosed => {
                self.quiz_open = false;
            }
            Event::RoundStarted => {
                if !self.quiz.in_flight {
                    self.quiz_open = true;
                    self.quiz.in_flight = true;
                }
            }
            Event::RoundReady(scenario) => {
                if self.quiz.in_flight {
                    self.quiz.in_flight = false;
                    self.quiz.current = Some(scenario);
                }
            }
            Event::RoundFailed => {
                self.quiz.in_flight = false;
            }
            Event::GuessScored { correct } => {
                if self.quiz.current.is_some() {
                    self.quiz.current = None;
                    self.quiz.rounds_played += 1;
                    if correct {
                        self.quiz.score += 1;
                    }
                }
            }
        }
        self
    }
}
