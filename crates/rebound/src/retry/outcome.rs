/// Classified result of a single attempt.
///
/// Both the blocking and the async loop branch on this tag, so the
/// classification rules exist in exactly one place.
#[derive(Debug)]
pub(super) enum Outcome<T, E> {
    Success(T),
    Retryable(E),
    Fatal(E),
}

impl<T, E> Outcome<T, E> {
    pub(super) fn classify(result: Result<T, E>, is_retryable: impl FnOnce(&E) -> bool) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(fault) if is_retryable(&fault) => Self::Retryable(fault),
            Err(fault) => Self::Fatal(fault),
        }
    }
}
