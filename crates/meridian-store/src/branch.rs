//! Write-buffering overlay.
//!
//! A [`Branch`] reads through to its parent and buffers every write. Calling
//! [`Branch::commit`] hands the buffered writes to the parent as a single
//! batch; dropping the branch discards them. Keepers run each mutating call
//! on a branch so that a failure part-way through leaves no trace.

use std::collections::BTreeMap;

use crate::{KvStore, Result};

/// A staged view over a parent store.
pub struct Branch<'a> {
    parent: &'a mut dyn KvStore,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> Branch<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of keys with staged writes.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Write the staged changes to the parent.
    pub fn commit(self) -> Result<()> {
        let Branch { parent, writes } = self;
        if writes.is_empty() {
            return Ok(());
        }
        tracing::trace!(writes = writes.len(), "branch: committing");
        parent.apply_batch(writes.into_iter().collect())
    }
}

/// Run `f` against a branch of `store`, committing only if `f` succeeds.
pub fn atomically<T, E>(
    store: &mut dyn KvStore,
    f: impl FnOnce(&mut Branch<'_>) -> std::result::Result<T, E>,
) -> std::result::Result<T, E>
where
    E: From<crate::StoreError>,
{
    let mut branch = Branch::new(store);
    let value = f(&mut branch)?;
    branch.commit()?;
    Ok(value)
}

impl KvStore for Branch<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.writes.insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.scan_prefix(prefix)?.into_iter().collect();

        for (key, staged) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match staged {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemStore;

    #[test]
    fn test_reads_through_to_parent() {
        let mut parent = MemStore::new();
        parent.set(b"k", b"v".to_vec()).expect("set");

        let branch = Branch::new(&mut parent);
        assert_eq!(branch.get(b"k").expect("get"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_commit_applies_writes() {
        let mut parent = MemStore::new();
        parent.set(b"old", b"1".to_vec()).expect("set");

        let mut branch = Branch::new(&mut parent);
        branch.set(b"new", b"2".to_vec()).expect("set");
        branch.delete(b"old").expect("delete");
        assert_eq!(branch.pending(), 2);
        branch.commit().expect("commit");

        assert_eq!(parent.get(b"new").expect("get"), Some(b"2".to_vec()));
        assert_eq!(parent.get(b"old").expect("get"), None);
    }

    #[test]
    fn test_drop_discards_writes() {
        let mut parent = MemStore::new();
        {
            let mut branch = Branch::new(&mut parent);
            branch.set(b"k", b"v".to_vec()).expect("set");
        }
        assert!(parent.is_empty());
    }

    #[test]
    fn test_scan_merges_staged_writes() {
        let mut parent = MemStore::new();
        parent.set(b"p/1", b"a".to_vec()).expect("set");
        parent.set(b"p/2", b"b".to_vec()).expect("set");

        let mut branch = Branch::new(&mut parent);
        branch.delete(b"p/1").expect("delete");
        branch.set(b"p/3", b"c".to_vec()).expect("set");
        branch.set(b"p/2", b"B".to_vec()).expect("set");

        let entries = branch.scan_prefix(b"p/").expect("scan");
        assert_eq!(
            entries,
            vec![
                (b"p/2".to_vec(), b"B".to_vec()),
                (b"p/3".to_vec(), b"c".to_vec()),
            ]
        );
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let mut parent = MemStore::new();
        let result: std::result::Result<(), crate::StoreError> = atomically(&mut parent, |tx| {
            tx.set(b"k", b"v".to_vec())?;
            Err(crate::StoreError::Migration("abort".to_string()))
        });
        assert!(result.is_err());
        assert!(parent.is_empty());

        atomically::<_, crate::StoreError>(&mut parent, |tx| tx.set(b"k", b"v".to_vec()))
            .expect("commit");
        assert_eq!(parent.get(b"k").expect("get"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_nested_branches() {
        let mut parent = MemStore::new();
        let mut outer = Branch::new(&mut parent);
        {
            let mut inner = Branch::new(&mut outer);
            inner.set(b"k", b"v".to_vec()).expect("set");
            inner.commit().expect("inner commit");
        }
        assert_eq!(outer.get(b"k").expect("get"), Some(b"v".to_vec()));
        outer.commit().expect("outer commit");
        assert_eq!(parent.get(b"k").expect("get"), Some(b"v".to_vec()));
    }
}
