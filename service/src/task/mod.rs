//! Background [`Task`]s definitions.

mod background;
pub mod expire_rent_agreements;

pub use common::Handler as Task;

pub use self::{
    background::{Background, TaskError},
    expire_rent_agreements::ExpireRentAgreements,
};
