pub mod config;
pub mod domain;
pub mod error;
pub mod metacritic;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod sink;
pub mod vgchartz;
