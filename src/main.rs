use std::io;

use anyhow::Result;
use crossterm::{cursor::Show, execute, style::ResetColor};

use crate::{
    config::Settings,
    crawler::quote_api::QuoteApi,
    display::{FigletTypeface, PriceBoard, TerminalScreen},
    scheduler::{Poller, TokioClock},
};

pub mod config;
pub mod crawler;
pub mod declare;
pub mod display;
pub mod logging;
pub mod scheduler;
pub mod util;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    util::http::install_crypto_provider();

    let config = match Settings::load().validate() {
        Ok(config) => config,
        Err(why) => {
            logging::error_file_async(why.to_string());
            println!("{}", why);
            return Ok(());
        }
    };

    logging::info_console(format!(
        "Polling {} for {}/{} every {} ms",
        config.api_url,
        config.base_currency,
        config.currency,
        config.update_frequency.as_millis()
    ));

    let typeface = FigletTypeface::load(config.font_path.as_deref())?;
    let source = QuoteApi::new(&config)?;
    let board = PriceBoard::new(TerminalScreen::stdout(), Box::new(typeface));
    let mut poller = Poller::new(&config, source, board, TokioClock);

    // 不論怎麼離開，都把游標與顏色還給終端機
    let _restore = scopeguard::guard((), |_| {
        let _ = execute!(io::stdout(), ResetColor, Show);
    });

    // 之後 stdout 只屬於報價畫面
    logging::mute_console();
    poller.board_mut().hide_cursor()?;
    poller
        .run(async {
            if let Err(why) = tokio::signal::ctrl_c().await {
                logging::error_file_async(format!("Failed to listen for Ctrl+C because {:?}", why));
                // 無法監聽訊號時維持原本行為：一直跑到行程被終止
                std::future::pending::<()>().await;
            }
        })
        .await;
    poller.board_mut().restore()?;

    Ok(())
}
