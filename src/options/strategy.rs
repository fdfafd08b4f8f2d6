// file: src/options/strategy.rs
// description: single-leg trade plans built from the most liquid contract near a target strike
// reference: https://www.investopedia.com/terms/c/coveredcall.asp

use crate::error::{AgentError, Result};
use crate::options::contract::{CONTRACT_MULTIPLIER, OptionContract, OptionType, round_to};
use crate::options::yahoo::OptionChain;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    LongCall,
    LongPut,
    CoveredCall,
}

impl Strategy {
    pub fn option_type(self) -> OptionType {
        match self {
            Strategy::LongPut => OptionType::Put,
            Strategy::LongCall | Strategy::CoveredCall => OptionType::Call,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::LongCall => write!(f, "long_call"),
            Strategy::LongPut => write!(f, "long_put"),
            Strategy::CoveredCall => write!(f, "covered_call"),
        }
    }
}

/// Minimum activity a contract needs before a plan will use it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidityFloor {
    pub min_open_interest: u64,
    pub min_volume: u64,
}

impl LiquidityFloor {
    pub fn admits(&self, contract: &OptionContract) -> bool {
        contract.open_interest >= self.min_open_interest
            && contract.volume >= self.min_volume
            && contract.ask > 0.0
    }
}

/// Closest liquid out-of-the-money strike to `target`; ties go to the busier contract.
pub fn pick_liquid_near_strike<'a>(
    contracts: &'a [OptionContract],
    option_type: OptionType,
    target: f64,
    floor: &LiquidityFloor,
) -> Option<&'a OptionContract> {
    contracts
        .iter()
        .filter(|c| c.option_type == option_type && floor.admits(c))
        .filter(|c| match option_type {
            OptionType::Call => c.strike >= target,
            OptionType::Put => c.strike <= target,
        })
        .min_by(|a, b| {
            let distance = |c: &OptionContract| (c.strike - target).abs();
            distance(*a)
                .total_cmp(&distance(*b))
                .then_with(|| (b.open_interest + b.volume).cmp(&(a.open_interest + a.volume)))
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlanEconomics {
    Debit {
        entry_debit: f64,
        break_even_at_expiry: f64,
        max_loss: f64,
        /// None means unlimited
        max_profit: Option<f64>,
    },
    Credit {
        entry_credit: f64,
        premium_received: f64,
        if_called_away_sale_price: f64,
        downside_buffer_per_share: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradePlan {
    pub strategy: Strategy,
    pub symbol: String,
    pub expiration: NaiveDate,
    pub spot_price: f64,
    pub contract_symbol: String,
    pub strike: f64,
    #[serde(flatten)]
    pub economics: PlanEconomics,
}

impl TradePlan {
    pub fn build(
        strategy: Strategy,
        symbol: &str,
        expiration: NaiveDate,
        spot: f64,
        chain: &OptionChain,
        floor: &LiquidityFloor,
        covered_call_otm_pct: f64,
    ) -> Result<Self> {
        let option_type = strategy.option_type();
        let target = match strategy {
            Strategy::CoveredCall => spot * (1.0 + covered_call_otm_pct / 100.0),
            Strategy::LongCall | Strategy::LongPut => spot,
        };

        let contract = pick_liquid_near_strike(chain.side(option_type), option_type, target, floor)
            .ok_or_else(|| {
                AgentError::MarketData(format!(
                    "No liquid {} contract found for {} on {} {}",
                    option_type, strategy, symbol, expiration
                ))
            })?;

        let premium = contract.mid_price();
        let strike = contract.strike;
        let economics = match strategy {
            Strategy::LongCall => PlanEconomics::Debit {
                entry_debit: round_to(premium, 4),
                break_even_at_expiry: round_to(strike + premium, 4),
                max_loss: round_to(premium * CONTRACT_MULTIPLIER, 2),
                max_profit: None,
            },
            Strategy::LongPut => PlanEconomics::Debit {
                entry_debit: round_to(premium, 4),
                break_even_at_expiry: round_to(strike - premium, 4),
                max_loss: round_to(premium * CONTRACT_MULTIPLIER, 2),
                max_profit: Some(round_to((strike - premium) * CONTRACT_MULTIPLIER, 2)),
            },
            Strategy::CoveredCall => PlanEconomics::Credit {
                entry_credit: round_to(premium, 4),
                premium_received: round_to(premium * CONTRACT_MULTIPLIER, 2),
                if_called_away_sale_price: round_to(strike * CONTRACT_MULTIPLIER, 2),
                downside_buffer_per_share: round_to(premium, 4),
            },
        };

        Ok(Self {
            strategy,
            symbol: symbol.to_string(),
            expiration,
            spot_price: round_to(spot, 4),
            contract_symbol: contract.contract_symbol.clone(),
            strike,
            economics,
        })
    }

    pub fn format(&self) -> String {
        let mut rows = vec![
            ("strategy", self.strategy.to_string()),
            ("symbol", self.symbol.clone()),
            ("expiration", self.expiration.to_string()),
            ("spot_price", self.spot_price.to_string()),
            ("contract_symbol", self.contract_symbol.clone()),
            ("strike", self.strike.to_string()),
        ];

        match &self.economics {
            PlanEconomics::Debit {
                entry_debit,
                break_even_at_expiry,
                max_loss,
                max_profit,
            } => {
                rows.push(("entry_debit", entry_debit.to_string()));
                rows.push(("break_even_at_expiry", break_even_at_expiry.to_string()));
                rows.push(("max_loss", max_loss.to_string()));
                rows.push((
                    "max_profit",
                    max_profit.map_or("unlimited".to_string(), |p| p.to_string()),
                ));
            }
            PlanEconomics::Credit {
                entry_credit,
                premium_received,
                if_called_away_sale_price,
                downside_buffer_per_share,
            } => {
                rows.push(("entry_credit", entry_credit.to_string()));
                rows.push(("premium_received", premium_received.to_string()));
                rows.push(("if_called_away_sale_price", if_called_away_sale_price.to_string()));
                rows.push(("downside_buffer_per_share", downside_buffer_per_share.to_string()));
            }
        }

        rows.iter()
            .map(|(label, value)| format!("{:>26}: {}\n", label, value))
            .collect()
    }
}
