// file: src/options/contract.rs
// description: normalized option contracts, chain filters and per-contract metrics
// reference: https://www.investopedia.com/terms/o/optionchain.asp

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Shares covered by one listed equity option.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionContract {
    pub contract_symbol: String,
    pub option_type: OptionType,
    pub expiration: NaiveDate,
    pub strike: f64,
    pub last_price: f64,
    pub bid: f64,
    pub ask: f64,
    pub volume: u64,
    pub open_interest: u64,
    pub implied_volatility: f64,
    pub in_the_money: bool,
    pub change: f64,
    pub percent_change: f64,
    pub last_trade_date: Option<DateTime<Utc>>,
    pub currency: String,
}

impl OptionContract {
    /// Midpoint of a two-sided quote, otherwise the last trade.
    pub fn mid_price(&self) -> f64 {
        if self.bid > 0.0 && self.ask > 0.0 {
            round_to((self.bid + self.ask) / 2.0, 4)
        } else {
            round_to(self.last_price, 4)
        }
    }

    pub fn spread(&self) -> f64 {
        round_to((self.ask - self.bid).max(0.0), 4)
    }

    pub fn spread_pct_of_mid(&self) -> f64 {
        let mid = self.mid_price();
        if mid <= 0.0 {
            return 0.0;
        }
        round_to(self.spread() / mid * 100.0, 2)
    }

    /// In the money by strike against spot, independent of the feed's flag.
    pub fn is_itm_at(&self, spot: f64) -> bool {
        match self.option_type {
            OptionType::Call => self.strike < spot,
            OptionType::Put => self.strike > spot,
        }
    }

    /// Signed distance from spot in percent; positive means in the money.
    pub fn moneyness_pct(&self, spot: f64) -> f64 {
        if spot <= 0.0 {
            return 0.0;
        }
        let pct = round_to((spot - self.strike) / spot * 100.0, 2);
        match self.option_type {
            OptionType::Call => pct,
            OptionType::Put => -pct,
        }
    }

    pub fn days_to_expiry(&self, now: DateTime<Utc>) -> i64 {
        let expiry = self.expiration.and_time(chrono::NaiveTime::MIN).and_utc();
        (expiry - now).num_days().max(0)
    }

    pub fn detail(&self, spot: f64, now: DateTime<Utc>) -> ContractDetail {
        let mid = self.mid_price();
        ContractDetail {
            contract_symbol: self.contract_symbol.clone(),
            option_type: self.option_type,
            strike: self.strike,
            last_price: self.last_price,
            bid: self.bid,
            ask: self.ask,
            mid_price: mid,
            spread: self.spread(),
            spread_pct_mid: self.spread_pct_of_mid(),
            volume: self.volume,
            open_interest: self.open_interest,
            oi_to_volume_ratio: (self.volume > 0)
                .then(|| round_to(self.open_interest as f64 / self.volume as f64, 2)),
            implied_volatility: self.implied_volatility,
            change: self.change,
            percent_change: self.percent_change,
            in_the_money: self.in_the_money,
            moneyness_pct_from_spot: self.moneyness_pct(spot),
            days_to_expiry: self.days_to_expiry(now),
            last_trade_date: self.last_trade_date,
            premium_per_share: mid,
            premium_per_contract: round_to(mid * CONTRACT_MULTIPLIER, 2),
            currency: self.currency.clone(),
        }
    }
}

/// One row of a detailed chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractDetail {
    pub contract_symbol: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike: f64,
    pub last_price: f64,
    pub bid: f64,
    pub ask: f64,
    pub mid_price: f64,
    pub spread: f64,
    pub spread_pct_mid: f64,
    pub volume: u64,
    pub open_interest: u64,
    /// None when nothing traded today
    pub oi_to_volume_ratio: Option<f64>,
    pub implied_volatility: f64,
    pub change: f64,
    pub percent_change: f64,
    pub in_the_money: bool,
    pub moneyness_pct_from_spot: f64,
    pub days_to_expiry: i64,
    pub last_trade_date: Option<DateTime<Utc>>,
    pub premium_per_share: f64,
    pub premium_per_contract: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Moneyness {
    Itm,
    Otm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    #[default]
    OpenInterest,
    Volume,
    Strike,
    Iv,
    SpreadPct,
}

impl SortKey {
    /// Strike sorts ascending; every other key puts the largest first.
    pub fn sort(self, rows: &mut [ContractDetail]) {
        let key = |row: &ContractDetail| match self {
            SortKey::OpenInterest => row.open_interest as f64,
            SortKey::Volume => row.volume as f64,
            SortKey::Strike => row.strike,
            SortKey::Iv => row.implied_volatility,
            SortKey::SpreadPct => row.spread_pct_mid,
        };

        rows.sort_by(|a, b| {
            let ordering: Ordering = key(a).total_cmp(&key(b));
            if self == SortKey::Strike {
                ordering
            } else {
                ordering.reverse()
            }
        });
    }
}

/// Liquidity, strike and moneyness filters. Zero and `None` disable a bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainFilter {
    pub min_open_interest: u64,
    pub min_volume: u64,
    pub min_strike: Option<f64>,
    pub max_strike: Option<f64>,
    pub moneyness: Option<Moneyness>,
}

impl ChainFilter {
    pub fn matches(&self, contract: &OptionContract, spot: f64) -> bool {
        if contract.open_interest < self.min_open_interest || contract.volume < self.min_volume {
            return false;
        }
        if self.min_strike.is_some_and(|min| contract.strike < min)
            || self.max_strike.is_some_and(|max| contract.strike > max)
        {
            return false;
        }
        match self.moneyness {
            Some(Moneyness::Itm) => contract.is_itm_at(spot),
            Some(Moneyness::Otm) => !contract.is_itm_at(spot),
            None => true,
        }
    }

    pub fn apply<'a>(&self, contracts: &'a [OptionContract], spot: f64) -> Vec<&'a OptionContract> {
        contracts.iter().filter(|c| self.matches(c, spot)).collect()
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
