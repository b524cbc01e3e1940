//! Read entities definitions.

pub mod rent_agreement;
