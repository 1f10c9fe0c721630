// Training-quiz scenario record

use serde::{Deserialize, Serialize};

/// One phishing-or-legitimate email scenario.
///
/// Held only for the current round and replaced wholesale on the next one.
/// The label and explanation stay server-side until a guess is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScenario {
    pub sender: String,
    pub subject: String,
    pub body: String,
    /// Ground truth for the round.
    pub is_phishing: bool,
    /// Shown to the trainee after the guess.
    pub explanation: String,
}
