//! Read reconciliation policies.
//!
//! A [`ReconciliationPolicy`] gets whatever the remote produced for a read (if it
//! was consulted at all) plus the local collection, and returns the single
//! view handed to the caller. [`NoteSync`](crate::NoteSync) is generic over
//! the policy, so replacing the whole-collection rule with a per-note merge
//! does not touch any caller.

use crate::models::Note;

/// Which store a read was served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadSource {
    Remote,
    Local,
}

/// Outcome of the remote half of a read.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteRead {
    /// Guest identity or no session; the remote was not asked.
    Skipped,
    /// The fetch failed; the error was already logged.
    Failed,
    Fetched(Vec<Note>),
}

pub trait ReconciliationPolicy {
    fn reconcile(&self, remote: RemoteRead, local: Vec<Note>) -> (Vec<Note>, ReadSource);
}

/// Whole-collection rule: a non-empty remote result wins outright, anything
/// else falls back to the local cache.
///
/// An empty remote result means "unknown", not "no notes", so a first sync or a
/// transient empty read never hides local data.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoteWhenNonEmpty;

impl ReconciliationPolicy for RemoteWhenNonEmpty {
    fn reconcile(&self, remote: RemoteRead, local: Vec<Note>) -> (Vec<Note>, ReadSource) {
        match remote {
            RemoteRead::Fetched(notes) if !notes.is_empty() => (notes, ReadSource::Remote),
            _ => (local, ReadSource::Local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str) -> Note {
        Note {
            id: id.to_string(),
            ..Note::new(id, "")
        }
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_non_empty_remote_wins_wholesale() {
        let (notes, source) = RemoteWhenNonEmpty
            .reconcile(RemoteRead::Fetched(vec![note("r1")]), vec![note("l1"), note("l2")]);
        assert_eq!(source, ReadSource::Remote);
        assert_eq!(ids(&notes), vec!["r1"]);
    }

    #[test]
    fn test_empty_failed_or_skipped_remote_falls_back() {
        for remote in [RemoteRead::Fetched(vec![]), RemoteRead::Failed, RemoteRead::Skipped] {
            let (notes, source) = RemoteWhenNonEmpty.reconcile(remote, vec![note("l1")]);
            assert_eq!(source, ReadSource::Local);
            assert_eq!(ids(&notes), vec!["l1"]);
        }
    }

    #[test]
    fn test_both_empty() {
        let (notes, source) = RemoteWhenNonEmpty.reconcile(RemoteRead::Failed, vec![]);
        assert!(notes.is_empty());
        assert_eq!(source, ReadSource::Local);
    }
}
