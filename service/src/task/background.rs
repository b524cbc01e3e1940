//! [`Background`] environment running [`Task`]s of a [`Service`].

use std::{
    convert,
    error::Error as StdError,
    future::{Future, IntoFuture},
};

use derive_more::{Display, Error};
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::{Service, Task};

/// Boxed error of a [`Task`].
type BoxedError = Box<dyn StdError>;

/// Background environment running named [`Task`]s until the first of them
/// fails.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Names of the spawned [`Task`]s along with their handles.
    tasks: Vec<(&'static str, task::JoinHandle<Result<(), BoxedError>>)>,
}

impl Background {
    /// Spawns the provided `future` as a [`Task`] with the provided `name`.
    ///
    /// Nothing runs until this [`Background`] is awaited.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: StdError + 'static,
    {
        log::debug!("`{name}` task spawned");
        let handle = self.set.spawn_local(future.err_into::<BoxedError>());
        self.tasks.push((name, handle));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, tasks } = self;

        let handles = future::try_join_all(tasks.into_iter().map(
            |(name, handle)| {
                handle.map(move |res| {
                    res.map_err(BoxedError::from)
                        .and_then(convert::identity)
                        .map_err(|source| TaskError { name, source })
                })
            },
        ));
        future::try_join(set.map(Ok), handles)
            .map_ok(drop)
            .boxed_local()
    }
}

/// Error of a [`Task`] failed in the [`Background`].
#[derive(Debug, Display, Error)]
#[display("`{name}` task failed: {source}")]
pub struct TaskError {
    /// Name of the failed [`Task`].
    #[error(not(source))]
    pub name: &'static str,

    /// Cause of the failure, including a panic.
    #[error(not(source))]
    pub source: BoxedError,
}

#[cfg(test)]
mod spec {
    use std::future;

    use derive_more::{Display, Error};

    use super::Background;

    #[derive(Debug, Display, Error)]
    #[display("boom")]
    struct Boom;

    #[tokio::test]
    async fn reports_first_failed_task() {
        let mut bg = Background::default();
        bg.spawn("Endless", future::pending::<Result<(), Boom>>());
        bg.spawn("Finished", async { Ok::<_, Boom>(()) });
        bg.spawn("Failing", async { Err(Boom) });

        let err = bg.await.unwrap_err();

        assert_eq!(err.name, "Failing");
        assert_eq!(err.to_string(), "`Failing` task failed: boom");
    }
}
