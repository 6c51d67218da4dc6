use jiff::SignedDuration;

#[derive(Clone, Debug, Default)]
pub struct SolverParams {
    /// Wall-clock budget for the solve call. `None` means unbounded.
    pub time_limit: Option<SignedDuration>,
}

impl SolverParams {
    pub fn with_time_limit(time_limit: SignedDuration) -> Self {
        SolverParams {
            time_limit: Some(time_limit),
        }
    }
}
