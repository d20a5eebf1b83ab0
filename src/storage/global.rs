//! Process-wide handle table
//!
//! The simulator calls into the library through free functions, so the table
//! it sees lives in a global behind a single mutex. Everything else should own
//! a [`HandleTable`] directly.

use parking_lot::{Mutex, MutexGuard};

use super::HandleTable;
use crate::config::ExtConfig;

lazy_static::lazy_static! {
    /// Configuration read once, on first use of the process-wide table
    static ref GLOBAL_CONFIG: ExtConfig = ExtConfig::load_for_process();

    /// The table behind the VHPIDIRECT entry points
    static ref GLOBAL_TABLE: Mutex<HandleTable> =
        Mutex::new(HandleTable::with_config(GLOBAL_CONFIG.storage.clone()));
}

pub fn global_config() -> &'static ExtConfig {
    &GLOBAL_CONFIG
}

/// Lock the process-wide table
pub fn global_table() -> MutexGuard<'static, HandleTable> {
    GLOBAL_TABLE.lock()
}

/// Run `f` with the process-wide table locked
pub fn with_global_table<F, R>(f: F) -> R
where
    F: FnOnce(&mut HandleTable) -> R,
{
    let mut table = GLOBAL_TABLE.lock();
    f(&mut table)
}
