/// How a dispatch failure reaches the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Hand the error back (teach flow reports it and returns to idle)
    Propagate,

    /// Swallow the error and report "no result" (predict flow keeps the
    /// last good result on screen)
    Drop,
}
