//! Ledger events and observers.
//!
//! Presentation layers (the debug monitor, a CLI printer) subscribe to the
//! ledger instead of reading its internals.

use super::types::ProcessResult;

/// Something the ledger did.
#[derive(Debug, Clone, Copy)]
pub enum LedgerEvent<'a> {
    /// `process` reached a terminal outcome.
    Processed(&'a ProcessResult),
    /// `validate` checked a key without applying it.
    Validated {
        key: &'a str,
        game_id: Option<&'a str>,
        valid: bool,
    },
}

/// Receives ledger events. Called synchronously after state is persisted.
pub trait LedgerObserver {
    fn on_event(&self, event: &LedgerEvent<'_>);
}
