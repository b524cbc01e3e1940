//! [`Command`] for renewing a [`RentAgreement`].

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
        rent_agreement::{self, Status, StatusError},
        schedule::{self, GenerationError, ValidationError},
        unit, Installments, RentAgreement,
    },
    infra::{database, Database},
    read::rent_agreement::Active,
    Service,
};

use super::Command;

/// [`Command`] for renewing a [`RentAgreement`] with new
/// [`rent_agreement::Terms`].
///
/// Installments of the renewed [`RentAgreement`] are replaced as a whole.
#[derive(Clone, Debug)]
pub struct RenewRentAgreement {
    /// ID of the [`RentAgreement`] to renew.
    pub rent_agreement_id: rent_agreement::Id,

    /// New [`rent_agreement::Terms`] of the [`RentAgreement`].
    pub terms: rent_agreement::Terms,

    /// Hand-edited installments to be used instead of the generated ones.
    pub installments: Option<Vec<Draft>>,

    /// Properties the renewing user is allowed to operate on.
    pub access: property::Access,
}

impl<Db> Command<RenewRentAgreement> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<RentAgreement>, rent_agreement::Id>>,
            Ok = Option<RentAgreement>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<RentAgreement, unit::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<RentAgreement, rent_agreement::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RentAgreement>, rent_agreement::Id>>,
            Ok = Option<RentAgreement>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Active<RentAgreement>>, unit::Id>>,
            Ok = Vec<Active<RentAgreement>>,
            Err = Traced<database::Error>,
        > + Database<Update<RentAgreement>, Err = Traced<database::Error>>
        + Database<Update<Installments>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = (RentAgreement, Installments);
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RenewRentAgreement,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RenewRentAgreement {
            rent_agreement_id: id,
            terms,
            installments,
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

        let items = match installments {
            Some(drafts) => schedule::from_drafts(&terms, drafts)
                .map_err(tracerr::from_and_wrap!(=> E))?,
            None => schedule::generate(&terms, self.config.rounding_unit)
                .map_err(tracerr::from_and_wrap!(=> E))?,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent agreements upon the same unit.
        tx.execute(Lock(By::<RentAgreement, _>::new(agreement.unit_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
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

        let today = Date::today();
        agreement
            .renew(terms, today)
            .map_err(|StatusError(s)| tracerr::new!(E::NotRenewable(s)))?;

        let occupied = tx
            .execute(Select(By::<Vec<Active<RentAgreement>>, _>::new(
                agreement.unit_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .any(|Active(a)| {
                a.id != id && a.status_at(today) == Status::Active
            });
        if occupied {
            return Err(tracerr::new!(E::UnitOccupied(agreement.unit_id)));
        }

        let installments = Installments {
            rent_agreement_id: id,
            items,
        };
        tx.execute(Update(agreement.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(installments.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`RentAgreement(id: {id})` renewed until {} with {} installments",
            agreement.terms.end_date(),
            installments.items.len(),
        );

        Ok((agreement, installments))
    }
}

/// Error of [`RenewRentAgreement`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Installments cannot be generated out of the provided terms.
    #[display("Cannot generate installments: {_0}")]
    Generation(GenerationError),

    /// Hand-edited installments are invalid.
    #[display("Invalid installments: {_0}")]
    InvalidInstallments(ValidationError),

    /// [`RentAgreement`] cannot be renewed in its current [`Status`].
    #[display("`RentAgreement` cannot be renewed being {_0}")]
    #[from(ignore)]
    NotRenewable(#[error(not(source))] Status),

    /// User is not allowed to operate on the property.
    #[display("`Property(id: {_0})` is not allowed")]
    #[from(ignore)]
    PropertyNotAllowed(#[error(not(source))] property::Id),

    /// [`RentAgreement`] with the provided ID does not exist.
    #[display("`RentAgreement(id: {_0})` does not exist")]
    #[from(ignore)]
    RentAgreementNotExists(#[error(not(source))] rent_agreement::Id),

    /// Unit already has another active [`RentAgreement`].
    #[display("`Unit(id: {_0})` already has an active `RentAgreement`")]
    #[from(ignore)]
    UnitOccupied(#[error(not(source))] unit::Id),
}
