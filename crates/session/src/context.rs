//! Per-session persistence context: identity bookkeeping + staged writes.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::row::RowKey;

/// How a staged write entered the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Persisted,
    Merged,
}

/// A change a session intends to apply at commit.
#[derive(Debug, Clone)]
pub(crate) enum StagedChange {
    Write { payload: JsonValue, kind: ChangeKind },
    Remove,
}

/// Session-scoped bookkeeping for managed rows.
///
/// Tracks, per row key:
/// - the store version observed when the row first entered the session
///   (0 when the row is new), used as the optimistic expectation at commit
/// - the staged, uncommitted change, if any
///
/// Staging order is preserved so commit applies changes in the order the
/// session performed them.
#[derive(Debug, Default)]
pub(crate) struct PersistenceContext {
    base_versions: HashMap<RowKey, u64>,
    staged: HashMap<RowKey, StagedChange>,
    order: Vec<RowKey>,
}

impl PersistenceContext {
    /// Record the store version a row had when the session first saw it.
    pub fn note_loaded(&mut self, key: &RowKey, version: u64) {
        self.base_versions.entry(key.clone()).or_insert(version);
    }

    pub fn base_version(&self, key: &RowKey) -> Option<u64> {
        self.base_versions.get(key).copied()
    }

    pub fn stage_write(
        &mut self,
        key: RowKey,
        payload: JsonValue,
        kind: ChangeKind,
        base_version: u64,
    ) {
        self.base_versions.entry(key.clone()).or_insert(base_version);

        // Re-staging keeps the original kind: a record persisted and then
        // merged in the same session is still a first write.
        let kind = match self.staged.get(&key) {
            Some(StagedChange::Write {
                kind: ChangeKind::Persisted,
                ..
            }) => ChangeKind::Persisted,
            _ => kind,
        };

        if self
            .staged
            .insert(key.clone(), StagedChange::Write { payload, kind })
            .is_none()
        {
            self.order.push(key);
        }
    }

    pub fn stage_removal(&mut self, key: RowKey, base_version: u64) {
        self.base_versions.entry(key.clone()).or_insert(base_version);

        if self.staged.insert(key.clone(), StagedChange::Remove).is_none() {
            self.order.push(key);
        }
    }

    /// Forget a row entirely (used when removing a row that only ever existed
    /// as a staged first write).
    pub fn unstage(&mut self, key: &RowKey) {
        self.staged.remove(key);
        self.base_versions.remove(key);
        self.order.retain(|k| k != key);
    }

    pub fn staged_payload(&self, key: &RowKey) -> Option<&JsonValue> {
        match self.staged.get(key) {
            Some(StagedChange::Write { payload, .. }) => Some(payload),
            _ => None,
        }
    }

    pub fn is_staged_for_removal(&self, key: &RowKey) -> bool {
        matches!(self.staged.get(key), Some(StagedChange::Remove))
    }

    /// Whether the session currently manages the row.
    pub fn manages(&self, key: &RowKey) -> bool {
        if self.is_staged_for_removal(key) {
            return false;
        }
        self.base_versions.contains_key(key) || self.staged.contains_key(key)
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Consume the context, yielding staged changes in staging order together
    /// with their optimistic base versions.
    pub fn drain(self) -> Vec<(RowKey, StagedChange, u64)> {
        let PersistenceContext {
            mut staged,
            base_versions,
            order,
        } = self;

        order
            .into_iter()
            .filter_map(|key| {
                let base = base_versions.get(&key).copied().unwrap_or(0);
                staged.remove(&key).map(|change| (key, change, base))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::RecordId;
    use serde_json::json;

    fn key(n: &str) -> RowKey {
        RowKey::of(n, RecordId::new())
    }

    #[test]
    fn drain_preserves_staging_order() {
        let mut ctx = PersistenceContext::default();
        let first = key("a");
        let second = key("b");

        ctx.stage_write(first.clone(), json!(1), ChangeKind::Merged, 0);
        ctx.stage_write(second.clone(), json!(2), ChangeKind::Merged, 0);

        let drained = ctx.drain();
        assert_eq!(drained[0].0, first);
        assert_eq!(drained[1].0, second);
    }

    #[test]
    fn restaging_replaces_the_payload_without_duplicating_the_entry() {
        let mut ctx = PersistenceContext::default();
        let k = key("a");

        ctx.stage_write(k.clone(), json!(1), ChangeKind::Merged, 0);
        ctx.stage_write(k.clone(), json!(2), ChangeKind::Merged, 0);

        assert_eq!(ctx.staged_len(), 1);
        assert_eq!(ctx.staged_payload(&k), Some(&json!(2)));
    }

    #[test]
    fn a_persisted_row_stays_persisted_when_merged_again() {
        let mut ctx = PersistenceContext::default();
        let k = key("a");

        ctx.stage_write(k.clone(), json!(1), ChangeKind::Persisted, 0);
        ctx.stage_write(k.clone(), json!(2), ChangeKind::Merged, 0);

        match ctx.drain().remove(0).1 {
            StagedChange::Write { kind, .. } => assert_eq!(kind, ChangeKind::Persisted),
            StagedChange::Remove => panic!("expected a staged write"),
        }
    }

    #[test]
    fn removal_hides_the_row_from_the_managed_set() {
        let mut ctx = PersistenceContext::default();
        let k = key("a");

        ctx.stage_write(k.clone(), json!(1), ChangeKind::Merged, 3);
        assert!(ctx.manages(&k));

        ctx.stage_removal(k.clone(), 3);
        assert!(!ctx.manages(&k));
        assert!(ctx.is_staged_for_removal(&k));
    }
}
