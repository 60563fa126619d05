//! Scoped acquisition of a store connection.

use std::ops::{Deref, DerefMut};

use equirisk_model::{FactorStore, InMemoryStore, MarketDataSource, StoreError, UnitOfWork};
use tracing::warn;

use crate::UniverseStore;

/// Hands out connections for one pipeline step at a time.
pub trait ConnectionProvider {
    /// Connection type a step works against.
    type Connection: MarketDataSource + FactorStore + UniverseStore + UnitOfWork;

    /// Acquire a connection. Writes not committed through it are rolled back when the
    /// returned guard is dropped.
    ///
    /// # Errors
    /// Returns error if no connection can be obtained.
    fn acquire(&mut self) -> Result<ScopedUnit<'_, Self::Connection>, StoreError>;
}

/// A connection held for the duration of one step.
///
/// Dropping the guard rolls back whatever the step did not commit.
#[derive(Debug)]
pub struct ScopedUnit<'a, C: UnitOfWork> {
    conn: &'a mut C,
}

impl<'a, C: UnitOfWork> ScopedUnit<'a, C> {
    /// Guard `conn` until the returned value is dropped.
    pub const fn new(conn: &'a mut C) -> Self {
        Self { conn }
    }

    /// Commit the writes made so far.
    ///
    /// # Errors
    /// Returns error if the store rejects the commit.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.commit()
    }
}

impl<C: UnitOfWork> Deref for ScopedUnit<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.conn
    }
}

impl<C: UnitOfWork> DerefMut for ScopedUnit<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.conn
    }
}

impl<C: UnitOfWork> Drop for ScopedUnit<'_, C> {
    fn drop(&mut self) {
        if let Err(err) = self.conn.rollback() {
            warn!(error = %err, "rollback on release failed");
        }
    }
}

impl ConnectionProvider for InMemoryStore {
    type Connection = Self;

    fn acquire(&mut self) -> Result<ScopedUnit<'_, Self>, StoreError> {
        Ok(ScopedUnit::new(self))
    }
}
