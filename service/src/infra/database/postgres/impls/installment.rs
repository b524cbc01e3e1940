//! [`Installments`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Select, Update},
    Money,
};
use itertools::Itertools as _;
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{installment, rent_agreement, Installment, Installments},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Installments, rent_agreement::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Installments;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Installments, rent_agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let rent_agreement_id: rent_agreement::Id = by.into_inner();

        const SQL: &str = "\
            SELECT num, start_date, due_date, end_date, amount, currency \
            FROM installments \
            WHERE rent_agreement_id = $1::UUID \
            ORDER BY num ASC";
        let items = self
            .query(SQL, &[&rent_agreement_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Installment {
                number: u16::try_from(row.get::<_, i32>("num"))
                    .expect("`num` overflow")
                    .into(),
                start_date: row.get("start_date"),
                due_date: row.get("due_date"),
                end_date: row.get("end_date"),
                amount: Money {
                    amount: row.get("amount"),
                    currency: row.get("currency"),
                },
            })
            .collect();

        Ok(Installments {
            rent_agreement_id,
            items,
        })
    }
}

impl<C> Database<Update<Installments>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(installments): Update<Installments>,
    ) -> Result<Self::Ok, Self::Err> {
        let Installments {
            rent_agreement_id,
            items,
        } = installments;

        const DELETE_SQL: &str = "\
            DELETE FROM installments \
            WHERE rent_agreement_id = $1::UUID";
        _ = self
            .exec(DELETE_SQL, &[&rent_agreement_id])
            .await
            .map_err(tracerr::wrap!())?;
        if items.is_empty() {
            return Ok(());
        }

        let (nums, start_dates, due_dates, end_dates, amounts, currencies): (
            Vec<i32>,
            Vec<rent_agreement::StartDate>,
            Vec<installment::DueDate>,
            Vec<installment::EndDate>,
            Vec<Decimal>,
            Vec<Currency>,
        ) = items
            .into_iter()
            .map(|i| {
                (
                    i32::from(u16::from(i.number)),
                    i.start_date,
                    i.due_date,
                    i.end_date,
                    i.amount.amount,
                    i.amount.currency,
                )
            })
            .multiunzip();

        const INSERT_SQL: &str = "\
            INSERT INTO installments (\
                rent_agreement_id, num, \
                start_date, due_date, end_date, \
                amount, currency \
            ) \
            SELECT $1::UUID, i.* \
            FROM unnest(\
                $2::INT4[], \
                $3::DATE[], $4::DATE[], $5::DATE[], \
                $6::NUMERIC[], $7::INT2[] \
            ) AS i";
        self.exec(
            INSERT_SQL,
            &[
                &rent_agreement_id,
                &nums,
                &start_dates,
                &due_dates,
                &end_dates,
                &amounts,
                &currencies,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
