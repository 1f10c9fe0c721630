// CLI module for phishlens

use clap::Parser;

/// phishlens - AI-delegated phishing triage and training service
#[derive(Parser, Debug)]
#[command(name = "phishlens", version, about, long_about = None)]
pub struct Args {
    /// Verify model endpoint connectivity and exit
    #[arg(long)]
    pub check: bool,
}
