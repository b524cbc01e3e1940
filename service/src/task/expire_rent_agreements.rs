//! [`ExpireRentAgreements`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Start, Update},
    Date,
};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::rent_agreement::Status;
use crate::{
    domain::RentAgreement,
    infra::{database, Database},
    read::rent_agreement::Elapsed,
    Service,
};

use super::Task;

/// Configuration for [`ExpireRentAgreements`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between checks for elapsed [`RentAgreement`]s.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] marking [`Status::Active`] [`RentAgreement`]s whose end date has
/// passed as [`Status::Expired`].
#[derive(Clone, Copy, Debug)]
pub struct ExpireRentAgreements<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpireRentAgreements<Self>, Config>>> for Service<Db>
where
    ExpireRentAgreements<Service<Db>>:
        Task<Perform<()>, Ok = u64, Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireRentAgreements<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let task = ExpireRentAgreements {
            config: by.into_inner(),
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::info!("{n} `RentAgreement`s expired"),
                Err(e) => {
                    log::error!("`task::ExpireRentAgreements` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for ExpireRentAgreements<Service<Db>>
where
    Db: Database<
        Update<By<Elapsed<RentAgreement>, Date>>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    type Ok = u64;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service
            .database()
            .execute(Update(By::new(Date::today())))
            .await
            .map_err(tracerr::map_from_and_wrap!())
    }
}

/// Error of [`ExpireRentAgreements`] execution.
pub type ExecutionError = Traced<database::Error>;
