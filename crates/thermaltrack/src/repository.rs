//! In-memory entity repositories.
//!
//! A [`Repository`] holds one ordered collection and writes the whole
//! collection back to its [`CollectionStore`] after every change.

use std::rc::Rc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::{load_collection, save_collection, CollectionStore};

/// A record kept in a repository.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Storage key of the collection this record lives in.
    const COLLECTION: &'static str;

    /// The record's unique id.
    fn id(&self) -> &str;
}

/// Ordered collection of `T` mirrored to a store.
#[derive(Debug)]
pub struct Repository<T: Record> {
    records: Vec<T>,
    store: Rc<dyn CollectionStore>,
}

impl<T: Record> Repository<T> {
    /// Load the collection from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load(store: Rc<dyn CollectionStore>) -> Result<Self> {
        let records = load_collection(store.as_ref(), T::COLLECTION)?;
        Ok(Self { records, store })
    }

    /// All records in insertion order.
    #[must_use]
    pub fn list(&self) -> &[T] {
        &self.records
    }

    /// Find a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Whether a record with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Generate an id not used by any record in the collection.
    ///
    /// Ids are the current Unix time in milliseconds, bumped until free.
    #[must_use]
    pub fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.contains(&candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Append a record and persist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if the id is taken, or a storage error
    /// if the save fails.
    pub fn add(&mut self, record: T) -> Result<()> {
        if self.contains(record.id()) {
            return Err(Error::DuplicateId {
                collection: T::COLLECTION,
                id: record.id().to_string(),
            });
        }
        debug!("Adding {} to {}", record.id(), T::COLLECTION);
        self.records.push(record);
        self.persist()
    }

    /// Replace the record with this id and persist.
    ///
    /// Returns `false` without saving when no record matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn update(&mut self, id: &str, record: T) -> Result<bool> {
        let Some(slot) = self.records.iter_mut().find(|r| r.id() == id) else {
            debug!("Update of missing {id} in {} ignored", T::COLLECTION);
            return Ok(false);
        };
        *slot = record;
        self.persist()?;
        Ok(true)
    }

    /// Mutate the record with this id in place and persist.
    ///
    /// Returns `false` without saving when no record matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn modify(&mut self, id: &str, f: impl FnOnce(&mut T)) -> Result<bool> {
        let Some(slot) = self.records.iter_mut().find(|r| r.id() == id) else {
            debug!("Modify of missing {id} in {} ignored", T::COLLECTION);
            return Ok(false);
        };
        f(slot);
        self.persist()?;
        Ok(true)
    }

    /// Remove the record with this id and persist.
    ///
    /// Returns `false` without saving when no record matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.records.len();
        self.records.retain(|r| r.id() != id);
        if self.records.len() == before {
            debug!("Delete of missing {id} in {} ignored", T::COLLECTION);
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        save_collection(self.store.as_ref(), T::COLLECTION, &self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Transformer, TransformerType, TRANSFORMERS_KEY};
    use crate::storage::MemoryStore;

    fn transformer(id: &str, number: &str) -> Transformer {
        Transformer {
            id: id.to_string(),
            region: "Galle".to_string(),
            number: number.to_string(),
            pole: None,
            kind: TransformerType::Distribution,
            location: "Fort".to_string(),
        }
    }

    fn setup() -> (Rc<MemoryStore>, Repository<Transformer>) {
        let store = Rc::new(MemoryStore::new());
        let repo = Repository::load(store.clone()).unwrap();
        (store, repo)
    }

    fn stored(store: &MemoryStore) -> Vec<Transformer> {
        load_collection(store, TRANSFORMERS_KEY).unwrap()
    }

    #[test]
    fn test_add_then_list_contains_record_with_fresh_id() {
        let (store, mut repo) = setup();
        let mut prior = Vec::new();
        for n in 0..5 {
            let id = repo.next_id();
            assert!(!prior.contains(&id));
            repo.add(transformer(&id, &format!("TX-{n}"))).unwrap();
            prior.push(id);
        }

        assert_eq!(repo.len(), 5);
        let ids: Vec<&str> = repo.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, prior.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(stored(&store), repo.list());
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let (store, mut repo) = setup();
        repo.add(transformer("1", "A")).unwrap();

        let err = repo.add(transformer("1", "B")).unwrap_err();
        assert!(matches!(err, Error::DuplicateId { .. }));
        assert_eq!(repo.len(), 1);
        assert_eq!(stored(&store)[0].number, "A");
    }

    #[test]
    fn test_update_changes_only_matching_record() {
        let (store, mut repo) = setup();
        repo.add(transformer("1", "A")).unwrap();
        repo.add(transformer("2", "B")).unwrap();
        repo.add(transformer("3", "C")).unwrap();
        let before = serde_json::to_string(&repo.list()[0]).unwrap();

        assert!(repo.update("2", transformer("2", "B2")).unwrap());

        assert_eq!(repo.get("2").unwrap().number, "B2");
        assert_eq!(serde_json::to_string(&repo.list()[0]).unwrap(), before);
        assert_eq!(repo.list()[2], transformer("3", "C"));
        assert_eq!(stored(&store)[1].number, "B2");
    }

    #[test]
    fn test_update_missing_is_noop() {
        let (_store, mut repo) = setup();
        repo.add(transformer("1", "A")).unwrap();

        assert!(!repo.update("9", transformer("9", "Z")).unwrap());
        assert_eq!(repo.list(), &[transformer("1", "A")]);
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let (store, mut repo) = setup();
        repo.add(transformer("1", "A")).unwrap();
        repo.add(transformer("2", "B")).unwrap();

        assert!(repo.delete("1").unwrap());
        assert_eq!(repo.list(), &[transformer("2", "B")]);
        assert_eq!(stored(&store), vec![transformer("2", "B")]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let (store, mut repo) = setup();
        repo.add(transformer("1", "A")).unwrap();

        assert!(!repo.delete("nope").unwrap());
        assert_eq!(repo.len(), 1);
        assert_eq!(stored(&store).len(), 1);
    }

    #[test]
    fn test_modify_in_place() {
        let (store, mut repo) = setup();
        repo.add(transformer("1", "A")).unwrap();

        assert!(repo.modify("1", |t| t.location = "Pier".to_string()).unwrap());
        assert_eq!(repo.get("1").unwrap().location, "Pier");
        assert_eq!(stored(&store)[0].location, "Pier");

        assert!(!repo.modify("2", |t| t.location = "x".to_string()).unwrap());
    }

    #[test]
    fn test_load_reads_existing_collection() {
        let store = Rc::new(MemoryStore::new());
        save_collection(
            store.as_ref(),
            TRANSFORMERS_KEY,
            &[transformer("5", "E"), transformer("4", "D")],
        )
        .unwrap();

        let repo: Repository<Transformer> = Repository::load(store).unwrap();
        assert_eq!(repo.list()[0].id, "5");
        assert_eq!(repo.list()[1].id, "4");
    }

    #[test]
    fn test_next_id_skips_taken_ids() {
        let (_store, mut repo) = setup();
        let id = repo.next_id();
        repo.add(transformer(&id, "A")).unwrap();

        let next = repo.next_id();
        assert_ne!(next, id);
        assert!(!repo.contains(&next));
    }
}
