//! Run command implementation

use crate::config::Config;
use crate::deliver::TelegramDelivery;
use crate::features::{self, FeatureContext, RunStatus};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Feature name; omit to run every registered feature in order
    #[arg(short, long)]
    pub feature: Option<String>,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let delivery = TelegramDelivery::new(
            config.telegram.bot_token.clone(),
            config.telegram.chat_id.clone(),
        )?;
        let ctx = FeatureContext::from_config(config, Arc::new(delivery))?;

        let names: Vec<&str> = match &self.feature {
            Some(name) => vec![name.as_str()],
            None => features::FEATURES.to_vec(),
        };

        let mut failures = 0usize;
        for name in names {
            let outcome = features::run_feature(&ctx, name).await?;
            if outcome.status == RunStatus::Failure {
                failures += 1;
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} feature run(s) failed");
        }
        Ok(())
    }
}
