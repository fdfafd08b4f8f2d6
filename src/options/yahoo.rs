// file: src/options/yahoo.rs
// description: Yahoo Finance chart and options client behind the MarketData trait
// reference: https://query1.finance.yahoo.com/v7/finance/options/AAPL

use crate::config::OptionsConfig;
use crate::error::{AgentError, Result};
use crate::options::contract::{OptionContract, OptionType};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const SERVICE: &str = "Yahoo Finance";

pub const AUTH_HINT: &str = "Yahoo refused the request. The public endpoints are rate limited \
and sometimes demand a browser session; wait a minute or change options.user_agent.";

/// Calls and puts listed for one expiration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionChain {
    pub calls: Vec<OptionContract>,
    pub puts: Vec<OptionContract>,
}

impl OptionChain {
    pub fn side(&self, option_type: OptionType) -> &[OptionContract] {
        match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        }
    }
}

/// Read-only market data needed for options research.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn spot_price(&self, symbol: &str) -> Result<f64>;

    /// Listed expirations, nearest first.
    async fn expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>>;

    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain>;
}

#[derive(Debug, Deserialize)]
struct ResultSet<T> {
    result: Option<Vec<T>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

impl<T> ResultSet<T> {
    fn first(self, symbol: &str) -> Result<T> {
        if let Some(error) = self.error {
            return Err(AgentError::MarketData(format!(
                "{} for {}: {}",
                error.code, symbol, error.description
            )));
        }
        self.result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::MarketData(format!("No data returned for {}", symbol)))
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ResultSet<ChartResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    #[serde(rename = "optionChain")]
    option_chain: ResultSet<OptionsResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Deserialize)]
struct OptionsBlock {
    #[serde(default)]
    calls: Vec<YahooContract>,
    #[serde(default)]
    puts: Vec<YahooContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooContract {
    #[serde(default)]
    contract_symbol: String,
    #[serde(default)]
    strike: f64,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    last_price: f64,
    #[serde(default)]
    change: f64,
    #[serde(default)]
    percent_change: f64,
    #[serde(default)]
    volume: f64,
    #[serde(default)]
    open_interest: f64,
    #[serde(default)]
    bid: f64,
    #[serde(default)]
    ask: f64,
    #[serde(default)]
    last_trade_date: Option<i64>,
    #[serde(default)]
    implied_volatility: f64,
    #[serde(default)]
    in_the_money: bool,
}

impl YahooContract {
    fn normalize(self, option_type: OptionType, expiration: NaiveDate) -> OptionContract {
        OptionContract {
            contract_symbol: self.contract_symbol,
            option_type,
            expiration,
            strike: finite(self.strike),
            last_price: finite(self.last_price),
            bid: finite(self.bid),
            ask: finite(self.ask),
            volume: finite(self.volume).max(0.0) as u64,
            open_interest: finite(self.open_interest).max(0.0) as u64,
            implied_volatility: finite(self.implied_volatility),
            in_the_money: self.in_the_money,
            change: finite(self.change),
            percent_change: finite(self.percent_change),
            last_trade_date: self
                .last_trade_date
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            currency: self.currency,
        }
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[derive(Debug)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &OptionsConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| AgentError::Config(format!("Invalid options.user_agent: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn chart_endpoint(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }

    pub fn options_endpoint(&self, symbol: &str) -> String {
        format!("{}/v7/finance/options/{}", self.base_url, symbol)
    }

    /// Last close of the day, falling back to the quoted market price.
    pub fn parse_spot(symbol: &str, body: &str) -> Result<f64> {
        let envelope: ChartEnvelope = serde_json::from_str(body)
            .map_err(|e| AgentError::malformed(SERVICE, format!("invalid chart JSON: {}", e)))?;
        let chart = envelope.chart.first(symbol)?;

        let last_close = chart
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .and_then(|q| q.close.into_iter().rev().flatten().next());

        last_close
            .or(chart.meta.regular_market_price)
            .filter(|price| price.is_finite() && *price > 0.0)
            .ok_or_else(|| {
                AgentError::MarketData(format!("Could not load spot price for {}", symbol))
            })
    }

    pub fn parse_expirations(symbol: &str, body: &str) -> Result<Vec<NaiveDate>> {
        let result = Self::parse_options(symbol, body)?;
        let mut dates: Vec<NaiveDate> = result
            .expiration_dates
            .iter()
            .filter_map(|ts| DateTime::from_timestamp(*ts, 0))
            .map(|dt| dt.date_naive())
            .collect();
        dates.sort();
        dates.dedup();

        if dates.is_empty() {
            return Err(AgentError::MarketData(format!(
                "No listed options found for {}",
                symbol
            )));
        }
        Ok(dates)
    }

    pub fn parse_chain(symbol: &str, expiration: NaiveDate, body: &str) -> Result<OptionChain> {
        let result = Self::parse_options(symbol, body)?;
        let block = result.options.into_iter().next().ok_or_else(|| {
            AgentError::MarketData(format!("No {} chain for {}", expiration, symbol))
        })?;

        Ok(OptionChain {
            calls: block
                .calls
                .into_iter()
                .map(|c| c.normalize(OptionType::Call, expiration))
                .collect(),
            puts: block
                .puts
                .into_iter()
                .map(|c| c.normalize(OptionType::Put, expiration))
                .collect(),
        })
    }

    fn parse_options(symbol: &str, body: &str) -> Result<OptionsResult> {
        let envelope: OptionsEnvelope = serde_json::from_str(body)
            .map_err(|e| AgentError::malformed(SERVICE, format!("invalid options JSON: {}", e)))?;
        envelope.option_chain.first(symbol)
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AgentError::http(SERVICE, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::http(SERVICE, e))?;

        if !status.is_success() {
            return Err(AgentError::from_status(SERVICE, status, &text, AUTH_HINT));
        }
        Ok(text)
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn spot_price(&self, symbol: &str) -> Result<f64> {
        let query = [("range", "1d".to_string()), ("interval", "1d".to_string())];
        let body = self.get(&self.chart_endpoint(symbol), &query).await?;
        Self::parse_spot(symbol, &body)
    }

    async fn expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        let body = self.get(&self.options_endpoint(symbol), &[]).await?;
        Self::parse_expirations(symbol, &body)
    }

    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain> {
        let date = expiration.and_time(NaiveTime::MIN).and_utc().timestamp();
        let body = self
            .get(&self.options_endpoint(symbol), &[("date", date.to_string())])
            .await?;
        Self::parse_chain(symbol, expiration, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::utils::stub_server;

    const OPTIONS_BODY: &str = r#"{
        "optionChain": {
            "result": [{
                "underlyingSymbol": "AAPL",
                "expirationDates": [1795132800, 1794528000],
                "quote": {"regularMarketPrice": 201.5, "currency": "USD"},
                "options": [{
                    "expirationDate": 1794528000,
                    "calls": [{
                        "contractSymbol": "AAPL261113C00205000",
                        "strike": 205.0, "currency": "USD", "lastPrice": 2.1,
                        "change": 0.15, "percentChange": 7.7, "volume": 812,
                        "openInterest": 4310, "bid": 2.05, "ask": 2.12,
                        "lastTradeDate": 1794340800, "impliedVolatility": 0.27,
                        "inTheMoney": false
                    }],
                    "puts": [{
                        "contractSymbol": "AAPL261113P00195000",
                        "strike": 195.0, "lastPrice": 1.4, "bid": 1.38, "ask": 1.45,
                        "impliedVolatility": 0.29, "inTheMoney": false
                    }]
                }]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_spot_uses_last_close() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":201.0},
            "indicators":{"quote":[{"close":[199.5, 200.25, null]}]}}],"error":null}}"#;
        assert_eq!(YahooClient::parse_spot("AAPL", body).unwrap(), 200.25);
    }

    #[test]
    fn test_parse_spot_falls_back_to_meta() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":201.0}}],"error":null}}"#;
        assert_eq!(YahooClient::parse_spot("AAPL", body).unwrap(), 201.0);
    }

    #[test]
    fn test_parse_spot_reports_yahoo_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = YahooClient::parse_spot("ZZZZ", body).unwrap_err();
        assert!(matches!(err, AgentError::MarketData(_)));
        assert!(err.to_string().contains("ZZZZ"));
    }

    #[test]
    fn test_parse_expirations_sorted() {
        let dates = YahooClient::parse_expirations("AAPL", OPTIONS_BODY).unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 11, 13).unwrap(),
                NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_expirations_none_listed() {
        let body = r#"{"optionChain":{"result":[{"expirationDates":[],"options":[]}],"error":null}}"#;
        assert!(YahooClient::parse_expirations("BRK-A", body).is_err());
    }

    #[test]
    fn test_parse_chain_normalizes_missing_fields() {
        let expiration = NaiveDate::from_ymd_opt(2026, 11, 13).unwrap();
        let chain = YahooClient::parse_chain("AAPL", expiration, OPTIONS_BODY).unwrap();

        assert_eq!(chain.calls.len(), 1);
        let call = &chain.calls[0];
        assert_eq!(call.option_type, OptionType::Call);
        assert_eq!(call.open_interest, 4310);
        assert_eq!(call.expiration, expiration);
        assert!(call.last_trade_date.is_some());

        let put = &chain.side(OptionType::Put)[0];
        assert_eq!(put.volume, 0);
        assert_eq!(put.currency, "");
        assert!(put.last_trade_date.is_none());
    }

    #[tokio::test]
    async fn test_chain_request_passes_expiration_timestamp() {
        let (base_url, server) = stub_server::serve_once("200 OK", OPTIONS_BODY).await;
        let mut config = Config::default_config().options;
        config.base_url = base_url;
        let client = YahooClient::new(&config).unwrap();

        let expiration = NaiveDate::from_ymd_opt(2026, 11, 13).unwrap();
        let chain = client.option_chain("AAPL", expiration).await.unwrap();
        assert_eq!(chain.puts.len(), 1);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /v7/finance/options/AAPL?date=1794528000 "));
        assert!(request.to_lowercase().contains("user-agent: mozilla/5.0"));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_api_error() {
        let (base_url, server) =
            stub_server::serve_once("429 Too Many Requests", "Too Many Requests").await;
        let mut config = Config::default_config().options;
        config.base_url = base_url;
        let client = YahooClient::new(&config).unwrap();

        match client.spot_price("AAPL").await.unwrap_err() {
            AgentError::Api { status, .. } => assert_eq!(status, 429),
            other => panic!("unexpected error: {other:?}"),
        }
        server.await.unwrap();
    }
}
