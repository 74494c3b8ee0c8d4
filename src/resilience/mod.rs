//! # Resilience Module
//!
//! Fault-tolerance wrappers for calls against the monitoring server.
//!
//! ## Usage
//!
//! ```rust
//! use zabbix_export::resilience::RetryingExecutor;
//!
//! # tokio_test::block_on(async {
//! let executor = RetryingExecutor::new("zabbix");
//!
//! let hosts = executor
//!     .call("host.get", || async {
//!         // Remote call here
//!         Ok::<_, String>(vec!["srv-a"])
//!     })
//!     .await;
//! assert_eq!(hosts, Ok(vec!["srv-a"]));
//! # });
//! ```

pub mod retry;

pub use retry::RetryingExecutor;
