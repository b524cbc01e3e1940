//! Postgres database clients.
//!
//! Both clients acquire their underlying [`Connection`] lazily, on the first
//! operation, and share it between their clones.

use std::{future::Future, sync::Arc};

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Non-transactional Postgres database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to acquire the [`Connection`] from.
    pool: connection::Pool,

    /// Lazily acquired [`Connection`].
    connection: Arc<Slot<connection::NonTx>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client from the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::default(),
        }
    }

    /// Returns the [`connection::Pool`] of this [`NonTx`] client.
    pub(crate) fn pool(&self) -> &connection::Pool {
        &self.pool
    }

    /// Returns the underlying [`Connection`] of this [`NonTx`] client.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        self.connection
            .get_or_acquire(|| acquire(&self.pool))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Transactional Postgres database client.
///
/// The transaction is started on the first operation, reusing the
/// [`Connection`] of the [`NonTx`] client it was created from, if there is
/// one.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to acquire the [`Connection`] from.
    pool: connection::Pool,

    /// [`NonTx`] client this [`Tx`] client was created from.
    origin: Arc<Mutex<Option<NonTx>>>,

    /// Lazily started [`connection::Tx`].
    connection: Arc<Slot<connection::Tx>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            origin: Arc::new(Mutex::new(Some(client))),
            connection: Arc::default(),
        }
    }

    /// Returns the underlying [`Connection`] of this [`Tx`] client.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        self.connection
            .get_or_acquire(|| async {
                let reused = match self.origin.lock().await.take() {
                    Some(origin) => origin.connection.take().await,
                    None => None,
                };
                let conn = match reused {
                    Some(conn) => conn,
                    None => acquire(&self.pool).await?,
                };
                connection::Tx::from_non_tx(conn).await
            })
            .await
            .map_err(tracerr::wrap!())
    }

    /// Commits this [`Tx`] client.
    ///
    /// Does nothing if no operation has been performed yet.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        match self.connection.take().await {
            Some(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }
}

/// Lazily filled slot of a [`Connection`].
#[derive(Debug)]
struct Slot<C>(RwLock<Option<C>>);

impl<C> Default for Slot<C> {
    fn default() -> Self {
        Self(RwLock::new(None))
    }
}

impl<C> Slot<C> {
    /// Returns the [`Connection`] of this [`Slot`], filling it with the
    /// provided `acquire` function if it's empty.
    async fn get_or_acquire<F>(
        &self,
        acquire: impl FnOnce() -> F,
    ) -> Result<RwLockReadGuard<'_, C>, Traced<database::Error>>
    where
        F: Future<Output = Result<C, Traced<database::Error>>>,
    {
        {
            let slot = self.0.read().await;
            if slot.is_some() {
                return Ok(RwLockReadGuard::map(slot, |c| {
                    c.as_ref().expect("checked to be filled")
                }));
            }
        }

        let mut slot = self.0.write().await;
        if slot.is_none() {
            *slot = Some(acquire().await.map_err(tracerr::wrap!())?);
        }
        Ok(RwLockReadGuard::map(slot.downgrade(), |c| {
            c.as_ref().expect("filled above")
        }))
    }

    /// Takes the [`Connection`] out of this [`Slot`], leaving it empty.
    async fn take(&self) -> Option<C> {
        self.0.write().await.take()
    }
}

/// Acquires a new [`connection::NonTx`] from the provided
/// [`connection::Pool`].
pub(crate) async fn acquire(
    pool: &connection::Pool,
) -> Result<connection::NonTx, Traced<database::Error>> {
    pool.get()
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
}

/// Implements [`Connection`] for a client by delegating to its lazily
/// acquired underlying [`Connection`].
macro_rules! delegate_connection {
    ($client:ty) => {
        impl Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + Sync + Send + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + Sync + Send + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + Sync + Send + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}

delegate_connection!(NonTx);
delegate_connection!(Tx);
