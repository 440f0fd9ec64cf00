use optimizer_core::{OptError, OptResult};

/// Fit state of a compressor. The only transition is `Unfitted -> Fitted`.
#[derive(Debug, Clone, Default)]
pub enum CompressorState<P> {
    #[default]
    Unfitted,
    Fitted(P),
}

impl<P> CompressorState<P> {
    pub fn is_fitted(&self) -> bool {
        matches!(self, Self::Fitted(_))
    }

    pub fn params(&self) -> Option<&P> {
        match self {
            Self::Unfitted => None,
            Self::Fitted(params) => Some(params),
        }
    }

    /// Parameters for decompression; `NotFitted` until the first fit.
    pub fn fitted(&self, compressor: &str) -> OptResult<&P> {
        self.params().ok_or_else(|| {
            OptError::not_fitted(format!(
                "{} must compress a batch before it can decompress",
                compressor
            ))
        })
    }

    /// Run `fit` if and only if nothing has been fitted yet, then return the
    /// parameters. A failed fit leaves the state `Unfitted`.
    pub(crate) fn fit_once<F>(&mut self, fit: F) -> OptResult<&P>
    where
        F: FnOnce() -> OptResult<P>,
    {
        if let Self::Unfitted = self {
            *self = Self::Fitted(fit()?);
        }
        match &*self {
            Self::Fitted(params) => Ok(params),
            Self::Unfitted => Err(OptError::not_fitted("fit did not complete")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_runs_once() {
        let mut state: CompressorState<u32> = CompressorState::default();
        assert!(!state.is_fitted());
        assert!(matches!(state.fitted("test"), Err(OptError::NotFitted(_))));

        assert_eq!(*state.fit_once(|| Ok(7)).unwrap(), 7);
        // second fit closure is never consulted
        assert_eq!(*state.fit_once(|| Ok(99)).unwrap(), 7);
        assert_eq!(state.params(), Some(&7));
    }

    #[test]
    fn test_failed_fit_stays_unfitted() {
        let mut state: CompressorState<u32> = CompressorState::Unfitted;
        assert!(state
            .fit_once(|| Err(OptError::invalid_input("empty batch")))
            .is_err());
        assert!(!state.is_fitted());
    }
}
