//! Order triage dashboard
//!
//! A terminal front end for operators who confirm or cancel new orders. The board and its live updates come from
//! [`order_index`]; the admin service and its push channel are reached through [`admin_client`].
pub mod cli;
pub mod config;
pub mod errors;
pub mod formatting;
pub mod runner;
pub mod terminal;
