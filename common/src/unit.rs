//! Marker types distinguishing the moments of an entity lifecycle.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity renewal.
#[derive(Clone, Copy, Debug)]
pub struct Renewal;

/// Marker type describing an entity cancellation.
#[derive(Clone, Copy, Debug)]
pub struct Cancellation;

/// Marker type describing the start of a period.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing the end of a period.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Marker type describing a payment due moment.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// Marker type describing an expiration moment.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
