//! Batched writes and transactions.
//!
//! Neither adds semantics of its own. A [`WriteBatch`] records writes and
//! replays them one by one on [`WriteBatch::commit`]; a [`Transaction`] applies
//! each write immediately against live data. There is no isolation and no
//! rollback: when a write fails, the ones before it stay applied.

use tracing::debug;

use crate::{
    backend::SetOptions,
    error::DocumentStoreResult,
    reference::DocumentReference,
    snapshot::DocumentSnapshot,
    value::WriteData,
};

/// A write recorded in a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum BatchWrite {
    Set {
        reference: DocumentReference,
        data: WriteData,
        options: SetOptions,
    },
    Update {
        reference: DocumentReference,
        data: WriteData,
    },
    Delete {
        reference: DocumentReference,
    },
}

/// An ordered list of writes committed together.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, reference: &DocumentReference, data: impl Into<WriteData>) -> &mut Self {
        self.set_with_options(reference, data, SetOptions::default())
    }

    pub fn set_with_options(
        &mut self,
        reference: &DocumentReference,
        data: impl Into<WriteData>,
        options: SetOptions,
    ) -> &mut Self {
        self.writes.push(BatchWrite::Set {
            reference: reference.clone(),
            data: data.into(),
            options,
        });
        self
    }

    pub fn update(&mut self, reference: &DocumentReference, data: impl Into<WriteData>) -> &mut Self {
        self.writes.push(BatchWrite::Update {
            reference: reference.clone(),
            data: data.into(),
        });
        self
    }

    pub fn delete(&mut self, reference: &DocumentReference) -> &mut Self {
        self.writes.push(BatchWrite::Delete { reference: reference.clone() });
        self
    }

    pub fn writes(&self) -> &[BatchWrite] {
        &self.writes
    }

    /// Applies the recorded writes in order, stopping at the first failure.
    pub async fn commit(self) -> DocumentStoreResult<()> {
        debug!(writes = self.writes.len(), "Committing write batch");

        for write in self.writes {
            match write {
                BatchWrite::Set { reference, data, options } => {
                    reference
                        .set_with_options(data, options)
                        .await?
                }
                BatchWrite::Update { reference, data } => reference.update(data).await?,
                BatchWrite::Delete { reference } => reference.delete().await?,
            }
        }

        Ok(())
    }
}

/// Write handle passed to `run_transaction`. Every call hits live data immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transaction;

impl Transaction {
    pub async fn get(&self, reference: &DocumentReference) -> DocumentStoreResult<DocumentSnapshot> {
        reference.get().await
    }

    pub async fn set(&self, reference: &DocumentReference, data: impl Into<WriteData>) -> DocumentStoreResult<()> {
        reference.set(data).await
    }

    pub async fn set_with_options(
        &self,
        reference: &DocumentReference,
        data: impl Into<WriteData>,
        options: SetOptions,
    ) -> DocumentStoreResult<()> {
        reference
            .set_with_options(data, options)
            .await
    }

    pub async fn update(&self, reference: &DocumentReference, data: impl Into<WriteData>) -> DocumentStoreResult<()> {
        reference.update(data).await
    }

    pub async fn delete(&self, reference: &DocumentReference) -> DocumentStoreResult<()> {
        reference.delete().await
    }
}
