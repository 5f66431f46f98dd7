use std::{future::Future, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use concat_string::concat_string;

use crate::{
    config::TickerConfig,
    crawler::{self, QuoteSource},
    declare::CycleOutcome,
    display::{PriceBoard, Screen},
    logging,
    util::text,
};

/// The pause between cycles. Swapped for a fake in tests.
#[async_trait]
pub trait Clock {
    async fn sleep(&self, period: Duration);
}

pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Polls the quote source and keeps the board up to date.
pub struct Poller<Q, S, C>
where
    Q: QuoteSource,
    S: Screen,
    C: Clock,
{
    source: Q,
    board: PriceBoard<S>,
    clock: C,
    base_currency: String,
    currency: String,
    /// 例：BTC/USD，僅用於日誌
    pair: String,
    period: Duration,
}

impl<Q, S, C> Poller<Q, S, C>
where
    Q: QuoteSource,
    S: Screen,
    C: Clock,
{
    pub fn new(config: &TickerConfig, source: Q, board: PriceBoard<S>, clock: C) -> Self {
        Poller {
            source,
            board,
            clock,
            base_currency: config.base_currency.clone(),
            currency: config.currency.clone(),
            pair: concat_string!(config.base_currency, "/", config.currency),
            period: config.update_frequency,
        }
    }

    /// One fetch → match → render pass. Never fails: errors are shown on
    /// screen and reported as [`CycleOutcome::Failed`].
    pub async fn cycle(&mut self) -> CycleOutcome {
        match self.try_cycle().await {
            Ok(outcome) => outcome,
            Err(why) => {
                let message = why.to_string();
                logging::error_file_async(format!("Failed to refresh the price because {:?}", why));

                if let Err(display_why) = self.board.show_error(&message) {
                    logging::error_file_async(format!(
                        "Failed to show the error because {:?}",
                        display_why
                    ));
                }

                CycleOutcome::Failed(message)
            }
        }
    }

    async fn try_cycle(&mut self) -> Result<CycleOutcome> {
        let quotes = self.source.fetch_quotes().await?;

        let amount = match crawler::find_quote(&quotes, &self.base_currency, &self.currency)
            .and_then(|quote| quote.amount)
        {
            Some(amount) => amount,
            None => {
                logging::debug_file_async(format!(
                    "No {} amount among {} quotes",
                    self.pair,
                    quotes.len()
                ));
                return Ok(CycleOutcome::NoMatch);
            }
        };

        let price = text::format_price(amount);
        if self.board.update(&price)? {
            logging::info_file_async(format!("{} {}", self.pair, price));
            Ok(CycleOutcome::Rendered(price))
        } else {
            Ok(CycleOutcome::Unchanged(price))
        }
    }

    /// Runs cycles back to back, sleeping `UpdateFrequency` between them,
    /// until `shutdown` completes.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        logging::info_file_async(format!(
            "Ticker started: {} every {} ms",
            self.pair,
            self.period.as_millis()
        ));

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = async {
                    self.cycle().await;
                    self.clock.sleep(self.period).await;
                } => {}
            }
        }

        logging::info_file_async("Ticker stopped".to_string());
    }

    pub fn board(&self) -> &PriceBoard<S> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut PriceBoard<S> {
        &mut self.board
    }
}
