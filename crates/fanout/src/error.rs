//! Error type produced by accumulate-all batches.

use std::error::Error;
use std::fmt;

/// Every failure captured by an accumulate-all batch.
///
/// Failures are kept in completion order, which is the order the
/// underlying operations finished in, not the order they were submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError<E> {
    failures: Vec<E>,
}

impl<E> AggregateError<E> {
    /// Wrap a list of captured failures
    pub fn new(failures: Vec<E>) -> Self {
        Self { failures }
    }

    /// The captured failures, in completion order
    pub fn failures(&self) -> &[E] {
        &self.failures
    }

    /// Consume the error, returning the captured failures
    pub fn into_failures(self) -> Vec<E> {
        self.failures
    }

    /// Number of failed operations
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether no failure was captured
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<E> IntoIterator for AggregateError<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl<E: fmt::Display> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.failures.len() == 1 {
            "operation"
        } else {
            "operations"
        };
        write!(f, "{} {} failed", self.failures.len(), noun)?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl<E: Error + 'static> Error for AggregateError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures.first().map(|e| e as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_failure() {
        let err = AggregateError::new(vec!["bad file a.yml", "bad file b.yml"]);
        let rendered = err.to_string();
        assert!(rendered.starts_with("2 operations failed"));
        assert!(rendered.contains("\n  bad file a.yml"));
        assert!(rendered.contains("\n  bad file b.yml"));
    }

    #[test]
    fn test_display_singular() {
        let err = AggregateError::new(vec!["timeout"]);
        assert!(err.to_string().starts_with("1 operation failed"));
    }

    #[test]
    fn test_source_is_first_failure() {
        let err = AggregateError::new(vec![
            std::io::Error::other("first"),
            std::io::Error::other("second"),
        ]);
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("first"));
    }
}
