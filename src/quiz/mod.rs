// Training quiz: scenario generation

use crate::analysis::bind_reply;
use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::models::gemini::Part;
use crate::models::quiz::QuizScenario;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// High temperature so consecutive rounds do not repeat themselves.
const SCENARIO_TEMPERATURE: f32 = 1.0;

/// Fixed system instruction for scenario generation.
const SCENARIO_INSTRUCTION: &str = "\
You are building a phishing-awareness training exercise. Produce one \
phishing-or-legitimate email scenario: a sender address, a subject line, and \
a short body. Roughly half of the scenarios you produce should be legitimate \
business email; the rest should use realistic phishing tactics of varying \
subtlety. Label the scenario truthfully and explain, in one or two \
sentences, the cues that give it away.";

const SCENARIO_PROMPT: &str = "Generate one new scenario.";

/// Response schema for a quiz round.
static SCENARIO_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "OBJECT",
        "properties": {
            "sender": { "type": "STRING" },
            "subject": { "type": "STRING" },
            "body": { "type": "STRING" },
            "isPhishing": { "type": "BOOLEAN" },
            "explanation": { "type": "STRING" }
        },
        "required": ["sender", "subject", "body", "isPhishing", "explanation"]
    })
});

/// Generate the next training scenario.
///
/// Same endpoint family and binding policy as the analysis flow; only the
/// instruction, schema, and temperature differ.
pub async fn next_scenario(gemini: &GeminiClient) -> Result<QuizScenario> {
    let part = Part::Text {
        text: SCENARIO_PROMPT.to_string(),
    };

    let reply = gemini
        .generate(SCENARIO_INSTRUCTION, part, &SCENARIO_SCHEMA, SCENARIO_TEMPERATURE)
        .await?;

    bind_reply(&reply)
}
