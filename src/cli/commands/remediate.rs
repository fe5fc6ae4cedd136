use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::client::{ReqwestTransport, ScanClient};
use crate::config::ScanlinkConfig;

#[derive(Args)]
pub struct RemediateArgs {
    /// Detection id as reported by a scan
    pub detection_id: String,

    /// Print the proposed fix as a diff instead of remediation details
    #[arg(long)]
    pub fix: bool,
}

pub fn execute(args: RemediateArgs, custom_config: Option<&str>) -> Result<()> {
    let config = ScanlinkConfig::load(custom_config)?;
    let transport = ReqwestTransport::new(&config.api).context("Failed to create HTTP client")?;
    let client = ScanClient::new(Box::new(transport))
        .with_ai_remediation_timeout(Duration::from_secs(config.api.ai_remediation_timeout_secs));

    let remediation = client
        .ai_remediation(&args.detection_id, args.fix)
        .with_context(|| format!("Failed to fetch remediation for detection {}", args.detection_id))?;
    println!("{remediation}");
    Ok(())
}
