pub mod dcf;
pub mod dividend;
pub mod fetch;
pub mod multiples;
pub mod normalize;
pub mod report;
pub mod sectors;
pub mod setup;
pub mod ui;
