//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `RentAgreement` of the provided unit along with its
    /// `Installment`s.
    ///
    /// `Installment`s are generated out of the terms, unless hand-edited
    /// `installments` are provided.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_TERMS` - the provided terms are inconsistent;
    /// - `INVALID_INSTALLMENTS` - the provided `installments` are invalid;
    /// - `INSTALLMENT_TOTAL_MISMATCH` - the provided `installments` don't sum
    ///                                  up to the discounted total;
    /// - `SCHEDULE_ROUNDING` - rounding leaves a non-positive `Installment`;
    /// - `PROPERTY_NOT_ALLOWED` - the current user is not allowed to operate
    ///                            on the property;
    /// - `UNIT_OCCUPIED` - the unit already has an active `RentAgreement`.
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    #[tracing::instrument(
        skip_all,
        fields(
            collection_period = ?collection_period,
            end_date = %end_date,
            gql.name = "createRentAgreement",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
            renter_id = %renter_id,
            start_date = %start_date,
            total_price = %total_price,
            unit_id = %unit_id,
        ),
    )]
    pub async fn create_rent_agreement(
        property_id: api::property::Id,
        unit_id: api::unit::Id,
        renter_id: api::renter::Id,
        start_date: Date,
        end_date: Date,
        total_price: Money,
        discount: Option<Money>,
        collection_period: api::rent_agreement::CollectionPeriod,
        installments: Option<Vec<api::installment::Input>>,
        ctx: &Context,
    ) -> Result<api::RentAgreement, Error> {
        let access = ctx.access().await?;
        let terms = api::rent_agreement::terms(
            start_date,
            end_date,
            total_price,
            discount,
            collection_period,
        )
        .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateRentAgreement {
                property_id: property_id.into(),
                unit_id: unit_id.into(),
                renter_id: renter_id.into(),
                terms,
                installments: installments.map(api::installment::drafts),
                access,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Renews the `RentAgreement` with the provided terms, replacing all its
    /// `Installment`s.
    ///
    /// Both active and expired `RentAgreement`s can be renewed.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENT_AGREEMENT_NOT_EXISTS` - the `RentAgreement` with the specified
    ///                                 ID does not exist;
    /// - `NOT_RENEWABLE` - the `RentAgreement` is canceled;
    /// - `INVALID_TERMS` - the provided terms are inconsistent;
    /// - `INVALID_INSTALLMENTS` - the provided `installments` are invalid;
    /// - `INSTALLMENT_TOTAL_MISMATCH` - the provided `installments` don't sum
    ///                                  up to the discounted total;
    /// - `SCHEDULE_ROUNDING` - rounding leaves a non-positive `Installment`;
    /// - `PROPERTY_NOT_ALLOWED` - the current user is not allowed to operate
    ///                            on the property;
    /// - `UNIT_OCCUPIED` - another `RentAgreement` is active on the unit.
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    #[tracing::instrument(
        skip_all,
        fields(
            collection_period = ?collection_period,
            end_date = %end_date,
            gql.name = "renewRentAgreement",
            id = %id,
            otel.name = Self::SPAN_NAME,
            start_date = %start_date,
            total_price = %total_price,
        ),
    )]
    pub async fn renew_rent_agreement(
        id: api::rent_agreement::Id,
        start_date: Date,
        end_date: Date,
        total_price: Money,
        discount: Option<Money>,
        collection_period: api::rent_agreement::CollectionPeriod,
        installments: Option<Vec<api::installment::Input>>,
        ctx: &Context,
    ) -> Result<api::RentAgreement, Error> {
        let access = ctx.access().await?;
        let terms = api::rent_agreement::terms(
            start_date,
            end_date,
            total_price,
            discount,
            collection_period,
        )
        .map_err(ctx.error())?;

        ctx.service()
            .execute(command::RenewRentAgreement {
                rent_agreement_id: id.into(),
                terms,
                installments: installments.map(api::installment::drafts),
                access,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the active `RentAgreement`.
    ///
    /// `Installment`s of the canceled `RentAgreement` are kept.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENT_AGREEMENT_NOT_EXISTS` - the `RentAgreement` with the specified
    ///                                 ID does not exist;
    /// - `NOT_ACTIVE` - the `RentAgreement` is canceled or expired already;
    /// - `PROPERTY_NOT_ALLOWED` - the current user is not allowed to operate
    ///                            on the property.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelRentAgreement",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_rent_agreement(
        id: api::rent_agreement::Id,
        ctx: &Context,
    ) -> Result<api::RentAgreement, Error> {
        let access = ctx.access().await?;

        ctx.service()
            .execute(command::CancelRentAgreement {
                rent_agreement_id: id.into(),
                access,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Replaces `Installment`s of the active `RentAgreement` with the
    /// hand-edited ones.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENT_AGREEMENT_NOT_EXISTS` - the `RentAgreement` with the specified
    ///                                 ID does not exist;
    /// - `NOT_ACTIVE` - the `RentAgreement` is canceled or expired;
    /// - `INVALID_INSTALLMENTS` - the provided `installments` are invalid;
    /// - `INSTALLMENT_TOTAL_MISMATCH` - the provided `installments` don't sum
    ///                                  up to the discounted total;
    /// - `PROPERTY_NOT_ALLOWED` - the current user is not allowed to operate
    ///                            on the property.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "reviseInstallments",
            id = %id,
            installments = installments.len(),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn revise_installments(
        id: api::rent_agreement::Id,
        installments: Vec<api::installment::Input>,
        ctx: &Context,
    ) -> Result<Vec<api::Installment>, Error> {
        let access = ctx.access().await?;

        ctx.service()
            .execute(command::ReviseInstallments {
                rent_agreement_id: id.into(),
                installments: api::installment::drafts(installments),
                access,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|i| i.items.into_iter().map(Into::into).collect())
    }
}

define_error! {
    enum AgreementStateError {
        #[code = "UNIT_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Unit already has an active `RentAgreement`"]
        UnitOccupied,

        #[code = "NOT_ACTIVE"]
        #[status = CONFLICT]
        #[message = "`RentAgreement` is not active"]
        NotActive,

        #[code = "NOT_RENEWABLE"]
        #[status = CONFLICT]
        #[message = "Canceled `RentAgreement` cannot be renewed"]
        NotRenewable,
    }
}

impl AsError for command::create_rent_agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Generation(e) => return e.try_as_error(),
            Self::InvalidInstallments(e) => return e.try_as_error(),
            Self::PropertyNotAllowed(_) => {
                api::PrivilegeError::PropertyNotAllowed.into()
            }
            Self::UnitOccupied(_) => AgreementStateError::UnitOccupied.into(),
        })
    }
}

impl AsError for command::renew_rent_agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Generation(e) => return e.try_as_error(),
            Self::InvalidInstallments(e) => return e.try_as_error(),
            Self::NotRenewable(_) => AgreementStateError::NotRenewable.into(),
            Self::PropertyNotAllowed(_) => {
                api::PrivilegeError::PropertyNotAllowed.into()
            }
            Self::RentAgreementNotExists(_) => {
                api::RentAgreementError::NotExists.into()
            }
            Self::UnitOccupied(_) => AgreementStateError::UnitOccupied.into(),
        })
    }
}

impl AsError for command::cancel_rent_agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NotActive(_) => AgreementStateError::NotActive.into(),
            Self::PropertyNotAllowed(_) => {
                api::PrivilegeError::PropertyNotAllowed.into()
            }
            Self::RentAgreementNotExists(_) => {
                api::RentAgreementError::NotExists.into()
            }
        })
    }
}

impl AsError for command::revise_installments::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidInstallments(e) => return e.try_as_error(),
            Self::NotActive(_) => AgreementStateError::NotActive.into(),
            Self::PropertyNotAllowed(_) => {
                api::PrivilegeError::PropertyNotAllowed.into()
            }
            Self::RentAgreementNotExists(_) => {
                api::RentAgreementError::NotExists.into()
            }
        })
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{
            cancel_rent_agreement, create_rent_agreement,
            revise_installments,
        },
        domain::{rent_agreement::Status, unit},
    };

    use crate::AsError as _;

    #[test]
    fn occupied_unit_is_conflict() {
        let err =
            create_rent_agreement::ExecutionError::UnitOccupied(unit::Id::new())
                .as_error();

        assert_eq!(err.code, "UNIT_OCCUPIED");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }

    #[test]
    fn state_errors_carry_codes() {
        let canceled =
            cancel_rent_agreement::ExecutionError::NotActive(Status::Expired)
                .as_error();
        let revised =
            revise_installments::ExecutionError::NotActive(Status::Canceled)
                .as_error();

        assert_eq!(canceled.code, "NOT_ACTIVE");
        assert_eq!(revised.code, "NOT_ACTIVE");
    }
}
