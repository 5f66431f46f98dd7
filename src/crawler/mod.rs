use async_trait::async_trait;

use crate::{declare::Quote, util::http::FetchError};

/// 報價 API
pub mod quote_api;

/// Anything that can hand back the current list of quotes.
#[async_trait]
pub trait QuoteSource {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, FetchError>;
}

/// Returns the first quote for `source`/`target`, if any.
pub fn find_quote<'a>(quotes: &'a [Quote], source: &str, target: &str) -> Option<&'a Quote> {
    quotes.iter().find(|quote| quote.is_pair(source, target))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_find_quote_by_target() {
        let quotes = vec![
            Quote::new("BTC", "USD", Some(dec!(50000))),
            Quote::new("BTC", "EUR", Some(dec!(45000))),
        ];

        let eur = find_quote(&quotes, "BTC", "EUR").unwrap();
        assert_eq!(eur.amount, Some(dec!(45000)));

        let usd = find_quote(&quotes, "BTC", "USD").unwrap();
        assert_eq!(usd.amount, Some(dec!(50000)));
    }

    #[test]
    fn test_find_quote_first_wins() {
        let quotes = vec![
            Quote::new("ETH", "USD", Some(dec!(3000))),
            Quote::new("BTC", "USD", Some(dec!(1))),
            Quote::new("BTC", "USD", Some(dec!(2))),
        ];

        let found = find_quote(&quotes, "BTC", "USD").unwrap();
        assert_eq!(found.amount, Some(dec!(1)));
    }

    #[test]
    fn test_find_quote_none() {
        let quotes = vec![Quote::new("ETH", "USD", Some(dec!(3000)))];
        assert!(find_quote(&quotes, "BTC", "USD").is_none());
        assert!(find_quote(&[], "BTC", "USD").is_none());
    }
}
