pub mod rates;
pub mod sentiment;
pub mod series;
pub mod snapshot;
