//! GraphQL [`Query`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{query, Query as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `RentAgreement` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENT_AGREEMENT_NOT_EXISTS` - the `RentAgreement` with the specified
    ///                                 ID does not exist;
    /// - `PROPERTY_NOT_ALLOWED` - the current user is not allowed to operate
    ///                            on the property of the `RentAgreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rentAgreement",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rent_agreement(
        id: api::rent_agreement::Id,
        ctx: &Context,
    ) -> Result<api::RentAgreement, Error> {
        let access = ctx.access().await?;

        let agreement = ctx
            .service()
            .execute(query::rent_agreement::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::RentAgreementError::NotExists.into())
            .map_err(ctx.error())?;
        if !access.allows(agreement.property_id) {
            return Err(api::PrivilegeError::PropertyNotAllowed.into())
                .map_err(ctx.error());
        }

        Ok(agreement.into())
    }

    /// Computes the `Installment`s of the provided terms without storing
    /// anything.
    ///
    /// Meant to be re-run whenever any of the terms is edited.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_TERMS` - the provided terms are inconsistent;
    /// - `SCHEDULE_ROUNDING` - rounding leaves a non-positive `Installment`,
    ///                         so the schedule has to be edited manually.
    #[tracing::instrument(
        skip_all,
        fields(
            collection_period = ?collection_period,
            discount = ?discount.map(|d| d.to_string()),
            end_date = %end_date,
            gql.name = "schedulePreview",
            otel.name = Self::SPAN_NAME,
            start_date = %start_date,
            total_price = %total_price,
        ),
    )]
    pub async fn schedule_preview(
        start_date: Date,
        end_date: Date,
        total_price: Money,
        discount: Option<Money>,
        collection_period: api::rent_agreement::CollectionPeriod,
        ctx: &Context,
    ) -> Result<Vec<api::Installment>, Error> {
        drop(ctx.current_session().await?);

        let terms = api::rent_agreement::terms(
            start_date,
            end_date,
            total_price,
            discount,
            collection_period,
        )
        .map_err(ctx.error())?;

        ctx.service()
            .execute(query::SchedulePreview { terms })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|items| items.into_iter().map(Into::into).collect())
    }
}
