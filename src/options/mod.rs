// file: src/options/mod.rs
// description: options research module exports

pub mod contract;
pub mod desk;
pub mod strategy;
pub mod yahoo;

pub use contract::{ChainFilter, ContractDetail, Moneyness, OptionContract, OptionType, SortKey};
pub use desk::{ChainQuery, ChainReport, ChainSide, OptionsDesk};
pub use strategy::{LiquidityFloor, PlanEconomics, Strategy, TradePlan};
pub use yahoo::{MarketData, OptionChain, YahooClient};
