//! [`Query`] for previewing an installment schedule.

use crate::{
    domain::{
        rent_agreement::Terms,
        schedule::{self, GenerationError},
        Installment,
    },
    Service,
};

use super::Query;

/// [`Query`] computing [`Installment`]s of the provided [`Terms`] without
/// persisting anything.
///
/// Uses the same rounding as the one applied when a rent agreement is
/// created or renewed.
#[derive(Clone, Debug)]
pub struct SchedulePreview {
    /// [`Terms`] to compute the schedule of.
    pub terms: Terms,
}

impl<Db> Query<SchedulePreview> for Service<Db> {
    type Ok = Vec<Installment>;
    type Err = GenerationError;

    async fn execute(
        &self,
        SchedulePreview { terms }: SchedulePreview,
    ) -> Result<Self::Ok, Self::Err> {
        schedule::generate(&terms, self.config().rounding_unit)
    }
}
