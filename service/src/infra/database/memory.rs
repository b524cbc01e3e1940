//! In-memory [`Database`] for exercising [`Service`] operations in tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use common::{
    money::Currency,
    operations::{By, Commit, Insert, Lock, Select, Transact, Update},
    Date, DateTime, Money,
};
use jsonwebtoken::DecodingKey;
use tracerr::Traced;

use crate::{
    domain::{
        property, rent_agreement, renter, schedule::RoundingUnit, unit,
        Installment, Installments, RentAgreement,
    },
    infra::{database, Database},
    read::rent_agreement::{Active, Elapsed},
    Config, Service,
};

/// Secret the [`Service`] returned by [`service()`] decodes tokens with.
pub(crate) const JWT_SECRET: &[u8] = b"test-secret";

/// Data stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub(crate) struct State {
    /// Stored [`RentAgreement`]s.
    pub(crate) rent_agreements: HashMap<rent_agreement::Id, RentAgreement>,

    /// Stored [`Installment`]s of every [`RentAgreement`].
    pub(crate) installments: HashMap<rent_agreement::Id, Vec<Installment>>,
}

/// In-memory [`Database`].
///
/// A [`Transact`]ed [`Memory`] works on a copy of the [`State`] which is
/// written back on [`Commit`] only, so a failed operation leaves nothing
/// behind.
#[derive(Clone, Debug, Default)]
pub(crate) struct Memory {
    /// Committed [`State`].
    committed: Arc<Mutex<State>>,

    /// [`State`] staged by an ongoing transaction, if any.
    staged: Option<Arc<Mutex<State>>>,
}

impl Memory {
    /// Returns a snapshot of the committed [`State`].
    pub(crate) fn state(&self) -> State {
        self.committed.lock().unwrap().clone()
    }

    /// Stores the provided [`RentAgreement`] directly.
    pub(crate) fn put(&self, agreement: RentAgreement) {
        drop(
            self.committed
                .lock()
                .unwrap()
                .rent_agreements
                .insert(agreement.id, agreement),
        );
    }

    /// Stores the provided [`Installments`] directly.
    pub(crate) fn put_installments(&self, installments: Installments) {
        drop(
            self.committed
                .lock()
                .unwrap()
                .installments
                .insert(installments.rent_agreement_id, installments.items),
        );
    }

    /// Locks the [`State`] this [`Memory`] currently operates on.
    fn current(&self) -> MutexGuard<'_, State> {
        self.staged
            .as_ref()
            .unwrap_or(&self.committed)
            .lock()
            .unwrap()
    }
}

/// Creates a new [`Service`] backed by an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    Service {
        config: Config {
            jwt_decoding_key: DecodingKey::from_secret(JWT_SECRET),
            rounding_unit: RoundingUnit::default(),
            expire_rent_agreements: Default::default(),
        },
        database: Memory::default(),
    }
}

/// Creates [`Money`] in AED.
pub(crate) fn aed(amount: i64) -> Money {
    Money {
        amount: amount.into(),
        currency: Currency::Aed,
    }
}

/// Creates [`rent_agreement::Terms`] starting today and lasting the provided
/// number of months.
pub(crate) fn terms(
    months: u32,
    total: i64,
    period: rent_agreement::CollectionPeriod,
) -> rent_agreement::Terms {
    let start = Date::today();
    rent_agreement::Terms::new(
        start.coerce(),
        start.checked_add_months(months).unwrap().coerce(),
        aed(total),
        None,
        period,
    )
    .unwrap()
}

/// Creates an [`rent_agreement::Status::Active`] [`RentAgreement`] with the
/// provided [`rent_agreement::Terms`].
pub(crate) fn active_agreement(
    terms: rent_agreement::Terms,
) -> RentAgreement {
    RentAgreement {
        id: rent_agreement::Id::new(),
        property_id: property::Id::new(),
        unit_id: unit::Id::new(),
        renter_id: renter::Id::new(),
        terms,
        status: rent_agreement::Status::Active,
        created_at: DateTime::now().coerce(),
        renewed_at: None,
        canceled_at: None,
    }
}

/// Creates a [`RentAgreement`] stored as
/// [`rent_agreement::Status::Active`], but whose period has already elapsed.
pub(crate) fn elapsed_agreement() -> RentAgreement {
    active_agreement(
        rent_agreement::Terms::new(
            "2020-01-01".parse().unwrap(),
            "2021-01-01".parse().unwrap(),
            aed(12_000),
            None,
            rent_agreement::CollectionPeriod::SixMonths,
        )
        .unwrap(),
    )
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.staged.is_some() {
            return Ok(self.clone());
        }
        Ok(Self {
            committed: Arc::clone(&self.committed),
            staged: Some(Arc::new(Mutex::new(self.state()))),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if let Some(staged) = &self.staged {
            *self.committed.lock().unwrap() = staged.lock().unwrap().clone();
        }
        Ok(())
    }
}

impl<B> Database<Lock<By<RentAgreement, B>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<RentAgreement, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<RentAgreement>, rent_agreement::Id>>>
    for Memory
{
    type Ok = Option<RentAgreement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<RentAgreement>, rent_agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.current().rent_agreements.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Vec<Active<RentAgreement>>, unit::Id>>> for Memory {
    type Ok = Vec<Active<RentAgreement>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Active<RentAgreement>>, unit::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let unit_id = by.into_inner();
        Ok(self
            .current()
            .rent_agreements
            .values()
            .filter(|a| {
                a.unit_id == unit_id
                    && a.status == rent_agreement::Status::Active
            })
            .cloned()
            .map(Active)
            .collect())
    }
}

impl Database<Select<By<Installments, rent_agreement::Id>>> for Memory {
    type Ok = Installments;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Installments, rent_agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let rent_agreement_id = by.into_inner();
        Ok(Installments {
            rent_agreement_id,
            items: self
                .current()
                .installments
                .get(&rent_agreement_id)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

impl Database<Insert<RentAgreement>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(agreement): Insert<RentAgreement>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(agreement)).await
    }
}

impl Database<Update<RentAgreement>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(agreement): Update<RentAgreement>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(
            self.current()
                .rent_agreements
                .insert(agreement.id, agreement),
        );
        Ok(())
    }
}

impl Database<Update<Installments>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(installments): Update<Installments>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(
            self.current()
                .installments
                .insert(installments.rent_agreement_id, installments.items),
        );
        Ok(())
    }
}

impl Database<Update<By<Elapsed<RentAgreement>, Date>>> for Memory {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Elapsed<RentAgreement>, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();
        let mut expired = 0;
        for a in self.current().rent_agreements.values_mut() {
            if a.status == rent_agreement::Status::Active
                && a.terms.end_date().coerce::<()>() < today
            {
                a.status = rent_agreement::Status::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }
}
