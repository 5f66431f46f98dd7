//! # 報價 API 採集模組
//!
//! 以設定檔中的 `ApiUrl` 取得幣對報價清單。
//!
//! - 存取方式：HTTP GET 搭配 Bearer Token 驗證
//! - 回應格式：`[{ "sourceCurrency", "targetCurrency", "amount" }, ...]`

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::TickerConfig,
    crawler::QuoteSource,
    declare::Quote,
    util::http::{self, FetchError},
};

/// The configured price endpoint.
///
/// The bearer header is attached once, when the client is built.
pub struct QuoteApi {
    client: Client,
    url: String,
}

impl QuoteApi {
    pub fn new(config: &TickerConfig) -> Result<Self, FetchError> {
        Ok(QuoteApi {
            client: http::build_client(&config.api_key)?,
            url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl QuoteSource for QuoteApi {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, FetchError> {
        http::get_json::<Vec<Quote>>(&self.client, &self.url).await
    }
}
