/// Hard bounds on inference. Both convert non-convergence into a reported
/// error instead of an infinite loop (or unbounded memory growth, for
/// polymorphic recursion that keeps minting new call shapes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassConfig {
    /// Maximum fixpoint passes over a single call frame.
    pub fixpoint_iter_limit: usize,
    /// Maximum number of distinct call frames across the whole unit.
    pub context_limit: usize,
}

impl Default for PassConfig {
    fn default() -> Self {
        PassConfig {
            fixpoint_iter_limit: 64,
            context_limit: 10_000,
        }
    }
}
