//! GraphQL API definitions.

pub mod installment;
mod mutation;
pub mod property;
mod query;
pub mod renter;
pub mod rent_agreement;
pub mod unit;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    installment::Installment, mutation::Mutation, query::Query,
    rent_agreement::RentAgreement,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

/// Creates a new [`Schema`].
#[must_use]
pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}

define_error! {
    enum PrivilegeError {
        #[code = "PROPERTY_NOT_ALLOWED"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not allowed to operate on the \
                     property"]
        PropertyNotAllowed,
    }
}

define_error! {
    enum RentAgreementError {
        #[code = "RENT_AGREEMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`RentAgreement` with the provided ID does not exist"]
        NotExists,
    }
}
