//! # Monitoring Server Client
//!
//! [`HistorySource`] is the seam between the export pipeline and the
//! monitoring server. [`ZabbixClient`] implements it over Zabbix JSON-RPC.

pub mod traits;
pub mod zabbix;

pub use traits::{HistorySource, HistorySourceFactory};
pub use zabbix::{ZabbixClient, ZabbixClientFactory};
