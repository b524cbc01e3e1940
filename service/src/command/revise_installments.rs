//! [`Command`] for revising [`Installments`] of a [`RentAgreement`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        installment::Draft,
        property,
        rent_agreement::{self, Status},
        schedule::{self, ValidationError},
        Installments, RentAgreement,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for replacing [`Installments`] of an active
/// [`RentAgreement`] with hand-edited ones.
///
/// The provided installments are validated against the current
/// [`rent_agreement::Terms`] of the [`RentAgreement`].
#[derive(Clone, Debug)]
pub struct ReviseInstallments {
    /// ID of the [`RentAgreement`] to revise [`Installments`] of.
    pub rent_agreement_id: rent_agreement::Id,

    /// Hand-edited installments replacing the current ones.
    pub installments: Vec<Draft>,

    /// Properties the revising user is allowed to operate on.
    pub access: property::Access,
}

impl<Db> Command<ReviseInstallments> for Service<Db>
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
        > + Database<Update<Installments>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Installments;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ReviseInstallments,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReviseInstallments {
            rent_agreement_id: id,
            installments: drafts,
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

        let agreement = tx
            .execute(Select(By::<Option<RentAgreement>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentAgreementNotExists(id))
            .map_err(tracerr::wrap!())?;
        match agreement.status_at(Date::today()) {
            Status::Active => {}
            s @ (Status::Canceled | Status::Expired) => {
                return Err(tracerr::new!(E::NotActive(s)));
            }
        }

        let installments = Installments {
            rent_agreement_id: id,
            items: schedule::from_drafts(&agreement.terms, drafts)
                .map_err(tracerr::from_and_wrap!(=> E))?,
        };
        tx.execute(Update(installments.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`RentAgreement(id: {id})` installments revised: {} in total",
            installments.items.len(),
        );

        Ok(installments)
    }
}

/// Error of [`ReviseInstallments`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Hand-edited installments are invalid.
    #[display("Invalid installments: {_0}")]
    InvalidInstallments(ValidationError),

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
    use pretty_assertions::assert_eq;

    use crate::{
        domain::{
            installment::Draft,
            property,
            rent_agreement::{CollectionPeriod, Status},
            schedule::{self, ValidationError},
            Installments, RentAgreement,
        },
        infra::database::memory,
        Command as _,
    };

    use super::{ExecutionError, ReviseInstallments};

    fn seeded(svc: &crate::Service<memory::Memory>) -> RentAgreement {
        let terms = memory::terms(12, 12_000, CollectionPeriod::ThreeMonths);
        let agreement = memory::active_agreement(terms.clone());
        svc.database().put(agreement.clone());
        svc.database().put_installments(Installments {
            rent_agreement_id: agreement.id,
            items: schedule::generate(&terms, schedule::RoundingUnit::DEFAULT)
                .unwrap(),
        });
        agreement
    }

    fn drafts(agreement: &RentAgreement, amounts: &[i64]) -> Vec<Draft> {
        let start = agreement.terms.start_date();
        amounts
            .iter()
            .zip(0..)
            .map(|(amount, i)| Draft {
                due_date: start.checked_add_months(i * 4).unwrap().coerce(),
                amount: memory::aed(*amount),
            })
            .collect()
    }

    #[tokio::test]
    async fn replaces_installments() {
        let svc = memory::service();
        let agreement = seeded(&svc);

        let revised = svc
            .execute(ReviseInstallments {
                rent_agreement_id: agreement.id,
                installments: drafts(&agreement, &[5_000, 4_000, 3_000]),
                access: property::Access::Any,
            })
            .await
            .unwrap();

        assert_eq!(revised.items.len(), 3);
        let numbers = revised
            .items
            .iter()
            .map(|i| u16::from(i.number))
            .collect::<Vec<_>>();
        assert_eq!(numbers, [1, 2, 3]);
        assert_eq!(
            svc.database().state().installments[&agreement.id],
            revised.items,
        );
    }

    #[tokio::test]
    async fn mismatching_total_leaves_state_untouched() {
        let svc = memory::service();
        let agreement = seeded(&svc);
        let before = svc.database().state().installments[&agreement.id].clone();

        let err = svc
            .execute(ReviseInstallments {
                rent_agreement_id: agreement.id,
                installments: drafts(&agreement, &[6_000, 5_950]),
                access: property::Access::Any,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidInstallments(
                ValidationError::TotalMismatch { .. }
            ),
        ));
        assert_eq!(
            err.as_ref().to_string(),
            "Invalid installments: installment total does not match \
             contract total",
        );
        assert_eq!(
            svc.database().state().installments[&agreement.id],
            before,
        );
    }

    #[tokio::test]
    async fn rejects_canceled_agreement() {
        let svc = memory::service();
        let mut agreement = seeded(&svc);
        agreement.status = Status::Canceled;
        svc.database().put(agreement.clone());

        let err = svc
            .execute(ReviseInstallments {
                rent_agreement_id: agreement.id,
                installments: drafts(&agreement, &[12_000]),
                access: property::Access::Any,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotActive(Status::Canceled),
        ));
    }
}
