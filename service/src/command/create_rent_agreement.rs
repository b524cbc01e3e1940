//! [`Command`] for creating a new [`RentAgreement`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        installment::Draft,
        property, rent_agreement, renter,
        schedule::{self, GenerationError, ValidationError},
        unit, Installments, RentAgreement,
    },
    infra::{database, Database},
    read::rent_agreement::Active,
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`RentAgreement`] along with its
/// [`Installments`].
#[derive(Clone, Debug)]
pub struct CreateRentAgreement {
    /// ID of the property the rented unit belongs to.
    pub property_id: property::Id,

    /// ID of the unit to rent.
    pub unit_id: unit::Id,

    /// ID of the renter.
    pub renter_id: renter::Id,

    /// [`rent_agreement::Terms`] of a new [`RentAgreement`].
    pub terms: rent_agreement::Terms,

    /// Hand-edited installments to be used instead of the generated ones.
    pub installments: Option<Vec<Draft>>,

    /// Properties the creating user is allowed to operate on.
    pub access: property::Access,
}

impl<Db> Command<CreateRentAgreement> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<RentAgreement, unit::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Active<RentAgreement>>, unit::Id>>,
            Ok = Vec<Active<RentAgreement>>,
            Err = Traced<database::Error>,
        > + Database<Insert<RentAgreement>, Err = Traced<database::Error>>
        + Database<Update<Installments>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = (RentAgreement, Installments);
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateRentAgreement,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRentAgreement {
            property_id,
            unit_id,
            renter_id,
            terms,
            installments,
            access,
        } = cmd;

        if !access.allows(property_id) {
            return Err(tracerr::new!(E::PropertyNotAllowed(property_id)));
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
        tx.execute(Lock(By::<RentAgreement, _>::new(unit_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let today = Date::today();
        let occupied = tx
            .execute(Select(By::<Vec<Active<RentAgreement>>, _>::new(
                unit_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .any(|Active(a)| {
                a.status_at(today) == rent_agreement::Status::Active
            });
        if occupied {
            return Err(tracerr::new!(E::UnitOccupied(unit_id)));
        }

        let agreement = RentAgreement {
            id: rent_agreement::Id::new(),
            property_id,
            unit_id,
            renter_id,
            terms,
            status: rent_agreement::Status::Active,
            created_at: DateTime::now().coerce(),
            renewed_at: None,
            canceled_at: None,
        };
        let installments = Installments {
            rent_agreement_id: agreement.id,
            items,
        };

        tx.execute(Insert(agreement.clone()))
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
            "`RentAgreement(id: {})` created for `Unit(id: {unit_id})` with \
             {} installments",
            agreement.id,
            installments.items.len(),
        );

        Ok((agreement, installments))
    }
}

/// Error of [`CreateRentAgreement`] [`Command`] execution.
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

    /// User is not allowed to operate on the property.
    #[display("`Property(id: {_0})` is not allowed")]
    #[from(ignore)]
    PropertyNotAllowed(#[error(not(source))] property::Id),

    /// Unit already has an active [`RentAgreement`].
    #[display("`Unit(id: {_0})` already has an active `RentAgreement`")]
    #[from(ignore)]
    UnitOccupied(#[error(not(source))] unit::Id),
}

#[cfg(test)]
mod spec {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            installment::Draft,
            property,
            rent_agreement::{self, CollectionPeriod as Period},
            renter,
            schedule::{GenerationError, ValidationError},
            unit,
        },
        infra::database::memory,
        Command as _,
    };

    use super::{CreateRentAgreement, ExecutionError};

    fn create(terms: rent_agreement::Terms) -> CreateRentAgreement {
        CreateRentAgreement {
            property_id: property::Id::new(),
            unit_id: unit::Id::new(),
            renter_id: renter::Id::new(),
            terms,
            installments: None,
            access: property::Access::Any,
        }
    }

    #[tokio::test]
    async fn persists_agreement_with_generated_installments() {
        let svc = memory::service();
        let terms = memory::terms(12, 12_000, Period::ThreeMonths);

        let (agreement, installments) =
            svc.execute(create(terms.clone())).await.unwrap();

        assert_eq!(agreement.status, rent_agreement::Status::Active);
        assert_eq!(agreement.terms, terms);
        assert_eq!(installments.items.len(), 4);
        assert!(installments
            .items
            .iter()
            .all(|i| i.amount == memory::aed(3_000)));

        let state = svc.database().state();
        assert!(state.rent_agreements.contains_key(&agreement.id));
        assert_eq!(state.installments[&agreement.id], installments.items);
    }

    #[tokio::test]
    async fn accepts_hand_edited_installments() {
        let svc = memory::service();
        let terms = memory::terms(12, 12_000, Period::ThreeMonths);
        let start = terms.start_date();
        let drafts = vec![
            Draft {
                due_date: start.coerce(),
                amount: memory::aed(2_000),
            },
            Draft {
                due_date: start.checked_add_months(6).unwrap().coerce(),
                amount: memory::aed(10_000),
            },
        ];

        let (_, installments) = svc
            .execute(CreateRentAgreement {
                installments: Some(drafts),
                ..create(terms)
            })
            .await
            .unwrap();

        assert_eq!(installments.items.len(), 2);
        assert_eq!(installments.items[1].amount, memory::aed(10_000));
    }

    #[tokio::test]
    async fn rejects_mismatching_installments() {
        let svc = memory::service();
        let terms = memory::terms(12, 12_000, Period::ThreeMonths);
        let drafts = vec![Draft {
            due_date: terms.start_date().coerce(),
            amount: memory::aed(11_950),
        }];

        let err = svc
            .execute(CreateRentAgreement {
                installments: Some(drafts),
                ..create(terms)
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidInstallments(
                ValidationError::TotalMismatch { .. }
            ),
        ));
        assert!(svc.database().state().rent_agreements.is_empty());
    }

    #[tokio::test]
    async fn rejects_non_positive_rounded_amount() {
        let svc = memory::service();
        let terms = memory::terms(12, 170, Period::TwoMonths);

        let err = svc.execute(create(terms)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Generation(GenerationError::NonPositiveAmount(m))
                if m.amount == Decimal::from(-80),
        ));
        assert!(svc.database().state().rent_agreements.is_empty());
    }

    #[tokio::test]
    async fn rejects_occupied_unit() {
        let svc = memory::service();
        let cmd = create(memory::terms(12, 12_000, Period::ThreeMonths));
        let unit_id = cmd.unit_id;
        drop(svc.execute(cmd.clone()).await.unwrap());

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::UnitOccupied(id) if *id == unit_id,
        ));
        assert_eq!(svc.database().state().rent_agreements.len(), 1);
    }

    #[tokio::test]
    async fn allows_unit_with_elapsed_agreement() {
        let svc = memory::service();
        let elapsed = memory::elapsed_agreement();
        let unit_id = elapsed.unit_id;
        svc.database().put(elapsed);

        let res = svc
            .execute(CreateRentAgreement {
                unit_id,
                ..create(memory::terms(12, 12_000, Period::ThreeMonths))
            })
            .await;

        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn rejects_not_allowed_property() {
        let svc = memory::service();
        let cmd = CreateRentAgreement {
            access: [property::Id::new()].into_iter().collect(),
            ..create(memory::terms(12, 12_000, Period::ThreeMonths))
        };
        let property_id = cmd.property_id;

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PropertyNotAllowed(id) if *id == property_id,
        ));
    }
}
