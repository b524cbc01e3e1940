//! Renter-related definitions.

use derive_more::{Display, From, Into};
use juniper::GraphQLScalar;
use service::domain;
use uuid::Uuid;

/// Unique identifier of a renter.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::renter::Id)]
#[into(domain::renter::Id)]
#[graphql(name = "RenterId", transparent)]
pub struct Id(Uuid);
