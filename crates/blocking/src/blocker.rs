//! The blocker plug-in contract.
use srdedupe_model::CanonicalRecord;

/// Maps records to zero or more block keys. Records sharing a key become
/// candidate pairs. Implementations should favor recall over precision —
/// precision is the scoring stage's job.
///
/// `initialize` defaults to a no-op; blockers that need corpus-wide
/// statistics before they can key anything (document frequency, etc.)
/// override it. The generator calls it once per run, before any
/// `block_keys` call, on every blocker regardless of whether it needs it.
pub trait Blocker: Send + Sync {
    fn name(&self) -> &str;
    fn match_key(&self) -> &str;
    fn initialize(&mut self, _records: &[CanonicalRecord]) {}
    fn block_keys(&self, record: &CanonicalRecord) -> Vec<String>;
}
