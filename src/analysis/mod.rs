// Artifact analysis: fixed forensic prompt, response schema, reply binding

use crate::dispatch::AnalysisPayload;
use crate::error::{Result, TriageError};
use crate::gemini::GeminiClient;
use crate::models::gemini::Part;
use crate::models::report::AnalysisReport;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::error;

/// Low temperature keeps verdicts stable for identical artifacts.
const ANALYSIS_TEMPERATURE: f32 = 0.1;

/// Fixed system instruction for the forensic analysis call.
const ANALYST_INSTRUCTION: &str = "\
You are a senior email-security analyst. Examine the submitted artifact \
(email text, document, or audio recording) for phishing, vishing, or other \
social-engineering activity. Assign a verdict with a confidence score and \
explain your reasoning in plain language a non-technical reader can follow. \
List concrete recommended actions for the recipient and preventive measures \
for the future. Summarize the tactics used and the SPF/DKIM/DMARC \
authentication status as far as the artifact exposes it. Reconstruct the \
sender profile and the message headers, including the originating IP \
address; when a detail is not present in the artifact, give your best \
estimate instead of leaving the field empty. Report every indicator of \
compromise you find, and include a short illustrative snippet of any \
embedded link, script, or payload.";

/// Response schema the model must fill for an analysis call.
///
/// Field names mirror the camelCase wire form of [`AnalysisReport`].
static REPORT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "OBJECT",
        "properties": {
            "verdict": {
                "type": "STRING",
                "enum": ["Clean", "Suspicious", "Malicious"]
            },
            "confidence": { "type": "INTEGER", "minimum": 0, "maximum": 100 },
            "explanation": { "type": "STRING" },
            "recommendedActions": { "type": "ARRAY", "items": { "type": "STRING" } },
            "preventiveMeasures": { "type": "ARRAY", "items": { "type": "STRING" } },
            "technical": {
                "type": "OBJECT",
                "properties": {
                    "tactics": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "authentication": { "type": "STRING" }
                },
                "required": ["tactics", "authentication"]
            },
            "sender": {
                "type": "OBJECT",
                "properties": {
                    "address": { "type": "STRING" },
                    "country": { "type": "STRING" },
                    "anonymized": { "type": "BOOLEAN" }
                },
                "required": ["address", "country", "anonymized"]
            },
            "headers": {
                "type": "OBJECT",
                "properties": {
                    "from": { "type": "STRING" },
                    "replyTo": { "type": "STRING" },
                    "returnPath": { "type": "STRING" },
                    "originatingIp": { "type": "STRING" }
                },
                "required": ["from", "replyTo", "returnPath", "originatingIp"]
            },
            "indicators": { "type": "ARRAY", "items": { "type": "STRING" } },
            "codeSnippet": { "type": "STRING" }
        },
        "required": [
            "verdict", "confidence", "explanation", "recommendedActions",
            "preventiveMeasures", "technical", "sender", "headers",
            "indicators", "codeSnippet"
        ]
    })
});

/// Bind a raw model reply to its expected record.
///
/// Fails closed: an empty or undeserializable reply produces an error and no
/// partial record. The same binder serves both the analysis and the quiz
/// flows; only the target schema differs.
pub fn bind_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
    if reply.trim().is_empty() {
        return Err(TriageError::MalformedReply("empty reply".to_string()));
    }
    serde_json::from_str(reply).map_err(|e| {
        error!("Failed to bind model reply: {}", e);
        TriageError::MalformedReply(e.to_string())
    })
}

/// Submit a dispatched payload for analysis and bind the verdict.
pub async fn analyze(gemini: &GeminiClient, payload: AnalysisPayload) -> Result<AnalysisReport> {
    let part = match payload {
        AnalysisPayload::Text(text) => Part::Text { text },
        AnalysisPayload::Inline(inline_data) => Part::InlineData { inline_data },
    };

    let reply = gemini
        .generate(ANALYST_INSTRUCTION, part, &REPORT_SCHEMA, ANALYSIS_TEMPERATURE)
        .await?;

    bind_reply(&reply)
}
