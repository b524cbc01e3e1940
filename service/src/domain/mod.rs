//! Domain definitions.

pub mod installment;
pub mod property;
pub mod rent_agreement;
pub mod renter;
pub mod schedule;
pub mod unit;
pub mod user;

pub use self::{
    installment::{Installment, Installments},
    rent_agreement::RentAgreement,
    user::Session,
};
