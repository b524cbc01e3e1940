//! [`Command`] definition.

pub mod authorize_session;
pub mod cancel_rent_agreement;
pub mod create_rent_agreement;
pub mod renew_rent_agreement;
pub mod revise_installments;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_session::AuthorizeSession,
    cancel_rent_agreement::CancelRentAgreement,
    create_rent_agreement::CreateRentAgreement,
    renew_rent_agreement::RenewRentAgreement,
    revise_installments::ReviseInstallments,
};
