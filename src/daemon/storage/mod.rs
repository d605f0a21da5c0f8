//!  Storage of alert dedupe keys is organized through [dedupe_store::FileDedupeStore].
//!  The basic idea is:
//!   - There is a single json file mapping keys to values.
//!   - Every change is a read-modify-write of the whole file under an exclusive lock, so several
//!     daemons can share it.
//!   - Keys are never removed.
//!
//!  Alerts waiting for the user live in [alert_inbox::AlertInbox], a json-lines file that the
//!  cli empties whenever it shows them.

pub mod alert_inbox;
pub mod dedupe_store;
#[cfg(test)]
pub mod memory;
