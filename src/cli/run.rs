//! Run command implementation

use super::render::render_board;
use crate::config::Config;
use crate::engine::MarketDataEngine;
use crate::feed::Symbol;
use clap::Args;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured symbols (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Only log, do not print the metrics table
    #[arg(long)]
    pub no_table: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if !self.symbols.is_empty() {
            config.feed.symbols = self.symbols.iter().map(Symbol::new).collect();
            config.validate()?;
        }

        let mut engine = MarketDataEngine::from_config(&config)?;
        engine.start().await?;

        let mut view = engine.view();
        let mut last_rendered = None;

        loop {
            let changed = tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    tracing::info!("Shutdown requested");
                    false
                }
                changed = view.changed() => changed,
            };
            if !changed {
                break;
            }

            let board = view.board_and_update();
            if !self.no_table && board.computed_at.is_some() && board.computed_at != last_rendered {
                last_rendered = board.computed_at;
                println!("{}", render_board(&board, &config.feed.quote_asset));
            }
        }

        engine.stop().await;
        Ok(())
    }
}
