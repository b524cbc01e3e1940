//! [`RentAgreement`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Insert, Lock, Select, Update},
    Date, Money,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        rent_agreement::{self, Status},
        unit, RentAgreement,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::rent_agreement::{Active, Elapsed},
};

impl<C> Database<Select<By<Option<RentAgreement>, rent_agreement::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<RentAgreement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<RentAgreement>, rent_agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rent_agreement::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, property_id, unit_id, renter_id, \
                   start_date, end_date, \
                   total_price, discount, currency, \
                   collection_period, status, \
                   created_at, renewed_at, canceled_at \
            FROM rent_agreements \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Active<RentAgreement>>, unit::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Active<RentAgreement>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Active<RentAgreement>>, unit::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let unit_id: unit::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, property_id, unit_id, renter_id, \
                   start_date, end_date, \
                   total_price, discount, currency, \
                   collection_period, status, \
                   created_at, renewed_at, canceled_at \
            FROM rent_agreements \
            WHERE unit_id = $1::UUID \
              AND status = $2::INT2";
        Ok(self
            .query(SQL, &[&unit_id, &Status::Active])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .map(Active)
            .collect())
    }
}

impl<C> Database<Insert<RentAgreement>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<RentAgreement>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(agreement): Insert<RentAgreement>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(agreement))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<RentAgreement>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(agreement): Update<RentAgreement>,
    ) -> Result<Self::Ok, Self::Err> {
        let RentAgreement {
            id,
            property_id,
            unit_id,
            renter_id,
            terms,
            status,
            created_at,
            renewed_at,
            canceled_at,
        } = agreement;

        let total_price = terms.total_price();
        let discount = terms.discount().map(|d| d.amount);

        const SQL: &str = "\
            INSERT INTO rent_agreements (\
                id, property_id, unit_id, renter_id, \
                start_date, end_date, \
                total_price, discount, currency, \
                collection_period, status, \
                created_at, renewed_at, canceled_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::DATE, $6::DATE, \
                $7::NUMERIC, $8::NUMERIC, $9::INT2, \
                $10::INT2, $11::INT2, \
                $12::TIMESTAMPTZ, $13::TIMESTAMPTZ, $14::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                total_price = EXCLUDED.total_price, \
                discount = EXCLUDED.discount, \
                currency = EXCLUDED.currency, \
                collection_period = EXCLUDED.collection_period, \
                status = EXCLUDED.status, \
                renewed_at = EXCLUDED.renewed_at, \
                canceled_at = EXCLUDED.canceled_at";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &unit_id,
                &renter_id,
                &terms.start_date(),
                &terms.end_date(),
                &total_price.amount,
                &discount,
                &total_price.currency,
                &terms.collection_period(),
                &status,
                &created_at,
                &renewed_at,
                &canceled_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<By<Elapsed<RentAgreement>, Date>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Elapsed<RentAgreement>, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let today: Date = by.into_inner();

        const SQL: &str = "\
            UPDATE rent_agreements \
            SET status = $2::INT2 \
            WHERE status = $3::INT2 \
              AND end_date < $1::DATE";
        self.exec(SQL, &[&today, &Status::Expired, &Status::Active])
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<RentAgreement, rent_agreement::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<RentAgreement, rent_agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rent_agreement::Id = by.into_inner();

        // Touching the existing row locks it as well.
        const SQL: &str = "\
            INSERT INTO rent_agreements_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<RentAgreement, unit::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<RentAgreement, unit::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let unit_id: unit::Id = by.into_inner();

        // Touching the existing row locks it as well.
        const SQL: &str = "\
            INSERT INTO units_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&unit_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Reconstructs a [`RentAgreement`] from the provided `rent_agreements`
/// table [`Row`].
fn from_row(row: &Row) -> RentAgreement {
    let currency: Currency = row.get("currency");
    let money = |amount: Decimal| Money { amount, currency };

    // SAFETY: `rent_agreement::Terms` are validated before being stored.
    #[expect(unsafe_code, reason = "invariants are preserved")]
    let terms = unsafe {
        rent_agreement::Terms::new_unchecked(
            row.get("start_date"),
            row.get("end_date"),
            money(row.get("total_price")),
            row.get::<_, Option<Decimal>>("discount").map(money),
            row.get("collection_period"),
        )
    };

    RentAgreement {
        id: row.get("id"),
        property_id: row.get("property_id"),
        unit_id: row.get("unit_id"),
        renter_id: row.get("renter_id"),
        terms,
        status: row.get("status"),
        created_at: row.get("created_at"),
        renewed_at: row.get("renewed_at"),
        canceled_at: row.get("canceled_at"),
    }
}
