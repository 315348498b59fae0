//! Dispense Server - supply-dispensing reconciliation engine
//!
//! # Overview
//!
//! Reconciles three views of the same consumable supplies:
//!
//! - **Billing orders** from the hospital information system (`reconcile`)
//! - **Cabinet stock** tracked per RFID unit (`cabinet`)
//! - **Clinical usage and returns** recorded against order lines (`reconcile::ledger`)
//!
//! Every mutation runs in one redb write transaction and is journaled in a
//! hash-chained audit log (`audit`).
//!
//! # Module layout
//!
//! ```text
//! dispense-server/src/
//! ├── core/          # config, state, startup
//! ├── reconcile/     # resolver, adapter, merge, ledger, cascade, variance, manager
//! ├── audit/         # audit journal (redb, SHA-256 chain)
//! ├── cabinet/       # RFID stock flags
//! ├── catalog/       # item catalog + department directory
//! ├── api/           # axum routes and handlers
//! └── utils/         # error re-exports, logger
//! ```

pub mod api;
pub mod audit;
pub mod cabinet;
pub mod catalog;
pub mod core;
pub mod reconcile;
pub mod utils;

pub use core::{Config, ConfigError, Server, ServerError, ServerState};
pub use reconcile::{ManagerError, ReconciliationManager, SupplyStorage};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialise logging from the environment
///
/// Must run before [`Config::from_env`] so `.env` values are visible.
pub fn setup_environment() {
    if let Err(e) = dotenv::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to load .env: {e}");
    }

    let level = std::env::var("LOG_LEVEL").ok();
    let dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(level.as_deref(), dir.as_deref().map(std::path::Path::new));
}

pub fn print_banner() {
    println!(
        r#"
    ____  _                                
   / __ \(_)________  ___  ____  ________ 
  / / / / / ___/ __ \/ _ \/ __ \/ ___/ _ \
 / /_/ / (__  ) /_/ /  __/ / / (__  )  __/
/_____/_/____/ .___/\___/_/ /_/____/\___/ 
            /_/                            
    "#
    );
}
