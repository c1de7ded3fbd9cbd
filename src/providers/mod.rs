pub mod alphavantage;
pub mod caching;
pub mod reference;
pub mod util;
pub mod yahoo_finance;
