//! [`Query`] definition.

pub mod installments;
pub mod rent_agreement;
pub mod schedule_preview;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

pub use self::schedule_preview::SchedulePreview;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use pretty_assertions::assert_eq;

    use crate::{
        domain::{rent_agreement::CollectionPeriod, schedule, Installments},
        infra::database::memory,
        query, Query as _,
    };

    #[tokio::test]
    async fn selects_stored_agreement_with_installments() {
        let svc = memory::service();
        let terms = memory::terms(12, 12_000, CollectionPeriod::SixMonths);
        let agreement = memory::active_agreement(terms.clone());
        let items =
            schedule::generate(&terms, schedule::RoundingUnit::DEFAULT)
                .unwrap();
        svc.database().put(agreement.clone());
        svc.database().put_installments(Installments {
            rent_agreement_id: agreement.id,
            items: items.clone(),
        });

        let found = svc
            .execute(query::rent_agreement::ById::by(agreement.id))
            .await
            .unwrap()
            .unwrap();
        let installments = svc
            .execute(query::installments::ByRentAgreement::by(agreement.id))
            .await
            .unwrap();

        assert_eq!(found.terms, terms);
        assert_eq!(installments.items, items);
    }

    #[tokio::test]
    async fn missing_agreement_has_no_installments() {
        let svc = memory::service();
        let id = memory::active_agreement(memory::terms(
            12,
            12_000,
            CollectionPeriod::OneYear,
        ))
        .id;

        let found = svc
            .execute(query::rent_agreement::ById::by(id))
            .await
            .unwrap();
        let installments = svc
            .execute(query::installments::ByRentAgreement::by(id))
            .await
            .unwrap();

        assert!(found.is_none());
        assert!(installments.items.is_empty());
    }
}
