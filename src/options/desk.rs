// file: src/options/desk.rs
// description: options research over a MarketData source: detailed chains and trade plans
// reference: market data only, no orders are placed

use crate::config::OptionsConfig;
use crate::error::{AgentError, Result};
use crate::options::contract::{ChainFilter, ContractDetail, OptionType, SortKey, round_to};
use crate::options::strategy::{LiquidityFloor, Strategy, TradePlan};
use crate::options::yahoo::MarketData;
use crate::utils::telemetry::OperationTimer;
use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ChainSide {
    Call,
    Put,
    #[default]
    Both,
}

impl ChainSide {
    fn includes(self, option_type: OptionType) -> bool {
        match self {
            ChainSide::Both => true,
            ChainSide::Call => option_type == OptionType::Call,
            ChainSide::Put => option_type == OptionType::Put,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChainQuery {
    /// Nearest listed expiration when unset
    pub expiration: Option<NaiveDate>,
    pub side: ChainSide,
    /// Rows kept per side after sorting; None keeps all
    pub limit: Option<usize>,
    pub sort_by: SortKey,
    pub filter: ChainFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainReport {
    pub symbol: String,
    pub spot_price: f64,
    pub expiration: NaiveDate,
    pub as_of_utc: DateTime<Utc>,
    pub calls: Vec<ContractDetail>,
    pub puts: Vec<ContractDetail>,
}

impl ChainReport {
    pub fn format(&self) -> String {
        let rule = "=".repeat(68);
        let mut output = format!(
            "{rule}\nGenerated: {}\n{rule}\n{:<32}: {}\n{:<32}: {}\n{:<32}: {}\n",
            self.as_of_utc.to_rfc3339(),
            "symbol",
            self.symbol,
            "spot price",
            self.spot_price,
            "expiration",
            self.expiration
        );

        for (label, rows) in [("CALLS", &self.calls), ("PUTS", &self.puts)] {
            if rows.is_empty() {
                continue;
            }
            let rule = "-".repeat(68);
            output.push_str(&format!("\n{rule}\n{} ({} rows)\n{rule}\n", label, rows.len()));

            for row in rows {
                let fields = [
                    ("contract symbol", row.contract_symbol.clone()),
                    ("strike", row.strike.to_string()),
                    ("mid price", row.mid_price.to_string()),
                    ("bid / ask", format!("{} / {}", row.bid, row.ask)),
                    ("spread", format!("{} ({}% of mid)", row.spread, row.spread_pct_mid)),
                    ("last traded price", row.last_price.to_string()),
                    ("open interest", row.open_interest.to_string()),
                    ("volume", row.volume.to_string()),
                    (
                        "open interest to volume ratio",
                        row.oi_to_volume_ratio
                            .map_or("n/a".to_string(), |r| r.to_string()),
                    ),
                    ("implied volatility", row.implied_volatility.to_string()),
                    ("change", format!("{} ({}%)", row.change, row.percent_change)),
                    ("in the money", row.in_the_money.to_string()),
                    ("moneyness % from spot", row.moneyness_pct_from_spot.to_string()),
                    ("days to expiry", row.days_to_expiry.to_string()),
                    (
                        "last traded",
                        row.last_trade_date
                            .map_or(String::new(), |d| d.to_rfc3339()),
                    ),
                    ("premium per contract", row.premium_per_contract.to_string()),
                    ("currency", row.currency.clone()),
                ];
                for (name, value) in fields {
                    output.push_str(&format!("{:<32}: {}\n", name, value));
                }
                output.push_str(&format!("{rule}\n"));
            }
        }

        output
    }
}

/// Uppercased ticker; empty input is rejected.
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    let allowed = |c: char| c.is_ascii_alphanumeric() || "-.^=".contains(c);
    if symbol.is_empty() || !symbol.chars().all(allowed) {
        return Err(AgentError::Validation(format!(
            "Invalid ticker symbol '{}'",
            symbol
        )));
    }
    Ok(symbol)
}

pub struct OptionsDesk<'a> {
    market: &'a dyn MarketData,
    floor: LiquidityFloor,
    covered_call_otm_pct: f64,
}

impl<'a> OptionsDesk<'a> {
    pub fn new(
        market: &'a dyn MarketData,
        floor: LiquidityFloor,
        covered_call_otm_pct: f64,
    ) -> Self {
        Self {
            market,
            floor,
            covered_call_otm_pct,
        }
    }

    pub fn from_config(market: &'a dyn MarketData, config: &OptionsConfig) -> Self {
        Self::new(
            market,
            LiquidityFloor {
                min_open_interest: config.min_open_interest,
                min_volume: config.min_volume,
            },
            config.covered_call_otm_pct,
        )
    }

    async fn expiration_or_nearest(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<NaiveDate> {
        if let Some(expiration) = expiration {
            return Ok(expiration);
        }
        let dates = self.market.expirations(symbol).await?;
        let nearest = dates.first().copied().ok_or_else(|| {
            AgentError::MarketData(format!("No listed options found for {}", symbol))
        })?;
        debug!("Using nearest expiration {} for {}", nearest, symbol);
        Ok(nearest)
    }

    pub async fn detailed_chain(&self, symbol: &str, query: &ChainQuery) -> Result<ChainReport> {
        let symbol = normalize_symbol(symbol)?;
        let timer = OperationTimer::new(&format!("{} option chain", symbol));

        let expiration = self.expiration_or_nearest(&symbol, query.expiration).await?;
        let spot = self.market.spot_price(&symbol).await?;
        let chain = self.market.option_chain(&symbol, expiration).await?;
        let now = Utc::now();

        let side = |option_type: OptionType| -> Vec<ContractDetail> {
            if !query.side.includes(option_type) {
                return Vec::new();
            }
            let mut rows: Vec<ContractDetail> = query
                .filter
                .apply(chain.side(option_type), spot)
                .into_iter()
                .map(|c| c.detail(spot, now))
                .collect();
            query.sort_by.sort(&mut rows);
            if let Some(limit) = query.limit {
                rows.truncate(limit);
            }
            rows
        };

        let report = ChainReport {
            calls: side(OptionType::Call),
            puts: side(OptionType::Put),
            symbol,
            spot_price: round_to(spot, 4),
            expiration,
            as_of_utc: now,
        };

        timer.finish_with_count(report.calls.len() + report.puts.len());
        Ok(report)
    }

    pub async fn plan(
        &self,
        symbol: &str,
        strategy: Strategy,
        expiration: Option<NaiveDate>,
    ) -> Result<TradePlan> {
        let symbol = normalize_symbol(symbol)?;
        let expiration = self.expiration_or_nearest(&symbol, expiration).await?;
        let spot = self.market.spot_price(&symbol).await?;
        let chain = self.market.option_chain(&symbol, expiration).await?;

        let plan = TradePlan::build(
            strategy,
            &symbol,
            expiration,
            spot,
            &chain,
            &self.floor,
            self.covered_call_otm_pct,
        )?;
        info!(
            "{} plan for {} uses {} at strike {}",
            strategy, symbol, plan.contract_symbol, plan.strike
        );
        Ok(plan)
    }
}
