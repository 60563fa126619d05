//! Pluggable compute steps.

use equirisk_primitives::{Date, Market};

use crate::PipelineError;

/// A regional compute step supplied by the caller, such as fundamental ratio or sector
/// aggregate computation.
///
/// A step commits its own writes through `conn`; anything left uncommitted is rolled
/// back when the step's unit is released.
pub trait ComputeStep<C: ?Sized> {
    /// Run the step for `markets` as of `date` and return the number of rows written.
    ///
    /// # Errors
    /// Any error marks the step failed and skips the steps that depend on it.
    fn run(&self, conn: &mut C, markets: &[Market], date: Date) -> Result<usize, PipelineError>;
}

impl<C, F> ComputeStep<C> for F
where
    C: ?Sized,
    F: Fn(&mut C, &[Market], Date) -> Result<usize, PipelineError>,
{
    fn run(&self, conn: &mut C, markets: &[Market], date: Date) -> Result<usize, PipelineError> {
        self(conn, markets, date)
    }
}
