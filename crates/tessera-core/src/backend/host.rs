//! Host backend: buffers are plain vectors, work runs on the calling thread

use super::{scale_region, Backend, BackendKind, Completion};
use crate::numeric::Numeric;
use crate::storage::{StorageDescriptor, StorageDescriptorMut};
use crate::tags::{sealed, Orientation};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Host execution backend tag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Host;

impl sealed::Sealed for Host {}

/// Execution strategy for host kernels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    /// Run on the calling thread
    Sequential,
    /// Split work across the rayon pool (needs the `parallel` feature)
    Parallel,
    /// Go parallel once the work estimate reaches the threshold
    Auto,
}

/// Execution context of host expressions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostContext {
    pub strategy: ExecutionStrategy,
    /// Work estimate (multiply-adds) from which `Auto` goes parallel
    pub parallel_threshold: usize,
}

impl Default for HostContext {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Auto,
            parallel_threshold: 1 << 16,
        }
    }
}

impl HostContext {
    /// Context that never leaves the calling thread
    pub fn sequential() -> Self {
        Self::default().with_strategy(ExecutionStrategy::Sequential)
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Whether an operation of the given size should be split across threads
    ///
    /// This only expresses the preference; kernels built without the
    /// `parallel` feature always run sequentially.
    pub fn prefers_parallel(&self, work: usize) -> bool {
        match self.strategy {
            ExecutionStrategy::Sequential => false,
            ExecutionStrategy::Parallel => true,
            ExecutionStrategy::Auto => work >= self.parallel_threshold,
        }
    }
}

impl Backend for Host {
    const NAME: &'static str = "host";
    const KIND: BackendKind = BackendKind::Host;

    type Context = HostContext;
    type Buffer<T: Numeric> = Vec<T>;

    fn allocate<T: Numeric>(_context: &HostContext, len: usize) -> Result<Vec<T>> {
        Ok(vec![T::zero(); len])
    }

    fn upload<T: Numeric>(_context: &HostContext, data: Vec<T>) -> Result<Vec<T>> {
        Ok(data)
    }

    fn download<T: Numeric>(_context: &HostContext, buffer: &Vec<T>) -> Result<Vec<T>> {
        Ok(buffer.clone())
    }

    fn buffer_len<T: Numeric>(buffer: &Vec<T>) -> usize {
        buffer.len()
    }

    fn copy_scaled<T: Numeric, OS: Orientation, OD: Orientation>(
        _context: &HostContext,
        alpha: T,
        src: StorageDescriptor<'_, Self, T, OS>,
        mut dst: StorageDescriptorMut<'_, Self, T, OD>,
    ) -> Result<Completion> {
        let (rows, cols) = (src.rows(), src.cols());
        let (dst_offset, dst_ld) = (dst.offset(), dst.leading_dimension());
        scale_region::<T, OS, OD>(
            alpha,
            rows,
            cols,
            src.buffer(),
            src.offset(),
            src.leading_dimension(),
            dst.buffer_mut(),
            dst_offset,
            dst_ld,
        );
        Ok(Completion::ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_preference() {
        let ctx = HostContext::default().with_parallel_threshold(100);
        assert!(!ctx.prefers_parallel(99));
        assert!(ctx.prefers_parallel(100));
        assert!(!HostContext::sequential().prefers_parallel(usize::MAX));
        assert!(HostContext::default()
            .with_strategy(ExecutionStrategy::Parallel)
            .prefers_parallel(1));
    }

    #[test]
    fn test_context_config_round_trip() {
        let ctx = HostContext::sequential().with_parallel_threshold(42);
        let json = serde_json::to_string(&ctx).unwrap();
        let back: HostContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);

        let partial: HostContext = serde_json::from_str(r#"{"strategy":"Parallel"}"#).unwrap();
        assert_eq!(partial.strategy, ExecutionStrategy::Parallel);
        assert_eq!(partial.parallel_threshold, HostContext::default().parallel_threshold);
    }
}
