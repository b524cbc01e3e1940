//! [`Command`] for canceling a [`RentAgreement`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        property,
        rent_agreement::{self, Status, StatusError},
        RentAgreement,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for canceling an active [`RentAgreement`].
///
/// Installments of the canceled [`RentAgreement`] are kept untouched.
#[derive(Clone, Debug)]
pub struct CancelRentAgreement {
    /// ID of the [`RentAgreement`] to cancel.
    pub rent_agreement_id: rent_agreement::Id,

    /// Properties the canceling user is allowed to operate on.
    pub access: property::Access,
}

impl<Db> Command<CancelRentAgreement> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<RentAgreement>, rent_agreement::Id>>,
            Ok = Option<RentAgreement>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<RentAgreement, rent_agreement::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RentAgreement>, rent_agreement::Id>>,
            Ok = Option<RentAgreement>,
            Err = Traced<database::Error>,
        > + Database<Update<RentAgreement>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = RentAgreement;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CancelRentAgreement,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelRentAgreement {
            rent_agreement_id: id,
            access,
        } = cmd;

        let agreement = self
            .database()
            .execute(Select(By::<Option<RentAgreement>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentAgreementNotExists(id))
            .map_err(tracerr::wrap!())?;
        if !access.allows(agreement.property_id) {
            return Err(tracerr::new!(E::PropertyNotAllowed(
                agreement.property_id
            )));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::<RentAgreement, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut agreement = tx
            .execute(Select(By::<Option<RentAgreement>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentAgreementNotExists(id))
            .map_err(tracerr::wrap!())?;
        agreement
            .cancel(Date::today())
            .map_err(|StatusError(s)| tracerr::new!(E::NotActive(s)))?;

        tx.execute(Update(agreement.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`RentAgreement(id: {id})` canceled");

        Ok(agreement)
    }
}

/// Error of [`CancelRentAgreement`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`RentAgreement`] is not [`Status::Active`].
    #[display("`RentAgreement` is {_0}, not active")]
    #[from(ignore)]
    NotActive(#[error(not(source))] Status),

    /// User is not allowed to operate on the property.
    #[display("`Property(id: {_0})` is not allowed")]
    #[from(ignore)]
    PropertyNotAllowed(#[error(not(source))] property::Id),

    /// [`RentAgreement`] with the provided ID does not exist.
    #[display("`RentAgreement(id: {_0})` does not exist")]
    #[from(ignore)]
    RentAgreementNotExists(#[error(not(source))] rent_agreement::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{
            property,
            rent_agreement::{CollectionPeriod, Status},
            schedule, Installments,
        },
        infra::database::memory,
        Command as _,
    };

    use super::{CancelRentAgreement, ExecutionError};

    #[tokio::test]
    async fn cancels_and_keeps_installments() {
        let svc = memory::service();
        let terms = memory::terms(12, 12_000, CollectionPeriod::ThreeMonths);
        let agreement = memory::active_agreement(terms.clone());
        let items =
            schedule::generate(&terms, schedule::RoundingUnit::DEFAULT)
                .unwrap();
        svc.database().put(agreement.clone());
        svc.database().put_installments(Installments {
            rent_agreement_id: agreement.id,
            items: items.clone(),
        });

        let canceled = svc
            .execute(CancelRentAgreement {
                rent_agreement_id: agreement.id,
                access: property::Access::Any,
            })
            .await
            .unwrap();

        assert_eq!(canceled.status, Status::Canceled);
        assert!(canceled.canceled_at.is_some());

        let state = svc.database().state();
        assert_eq!(
            state.rent_agreements[&agreement.id].status,
            Status::Canceled,
        );
        assert_eq!(state.installments[&agreement.id], items);
    }

    #[tokio::test]
    async fn rejects_canceling_twice() {
        let svc = memory::service();
        let agreement = memory::active_agreement(memory::terms(
            12,
            12_000,
            CollectionPeriod::OneYear,
        ));
        svc.database().put(agreement.clone());
        let cmd = CancelRentAgreement {
            rent_agreement_id: agreement.id,
            access: property::Access::Any,
        };
        drop(svc.execute(cmd.clone()).await.unwrap());

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotActive(Status::Canceled),
        ));
    }

    #[tokio::test]
    async fn rejects_elapsed_agreement() {
        let svc = memory::service();
        let agreement = memory::elapsed_agreement();
        svc.database().put(agreement.clone());

        let err = svc
            .execute(CancelRentAgreement {
                rent_agreement_id: agreement.id,
                access: property::Access::Any,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotActive(Status::Expired),
        ));
        assert_eq!(
            svc.database().state().rent_agreements[&agreement.id].status,
            Status::Active,
        );
    }
}
