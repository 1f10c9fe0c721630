// Structured analysis report returned by the model

use serde::{Deserialize, Serialize};

/// Severity assigned to an analyzed artifact.
///
/// Any other value in a reply fails deserialization, which routes the whole
/// reply through the malformed-reply path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Clean,
    Suspicious,
    Malicious,
}

/// The fixed-shape forensic report.
///
/// Lives only in session memory for the current round of analysis; discarded
/// on reset or session teardown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub verdict: Verdict,
    /// Model confidence, 0 to 100.
    pub confidence: u8,
    /// Plain-language explanation for a non-technical reader.
    pub explanation: String,
    pub recommended_actions: Vec<String>,
    pub preventive_measures: Vec<String>,
    pub technical: TechnicalSummary,
    pub sender: SenderProfile,
    pub headers: MessageHeaders,
    /// Indicators of compromise, as discrete observable strings.
    pub indicators: Vec<String>,
    /// Illustrative snippet of any embedded link, script, or payload.
    pub code_snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSummary {
    /// Tactic identifiers the model recognized in the artifact.
    pub tactics: Vec<String>,
    /// SPF/DKIM/DMARC status text, reported verbatim and never verified here.
    pub authentication: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderProfile {
    pub address: String,
    /// Best-guess country of origin.
    pub country: String,
    /// Whether the sender appears to be behind an anonymization service.
    pub anonymized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeaders {
    pub from: String,
    pub reply_to: String,
    pub return_path: String,
    /// IP the message appears to originate from; feeds the geolocation lookup.
    pub originating_ip: String,
}
