use crate::convert::ConversionResult;

/// Statistics for one flushed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushRecord {
    /// Results written
    pub items: usize,
    /// Sum of the results' approximate sizes
    pub bytes: u64,
    /// Size of the largest single result
    pub largest_item: u64,
}

/// Conversion results waiting to be written, with a running size total
///
/// The batch reports [`Batch::would_exceed`] before an item would push a
/// non-empty batch past its ceiling, so a flushed batch only exceeds the
/// ceiling when a single item is larger than the ceiling on its own.
#[derive(Debug)]
pub struct Batch {
    items: Vec<ConversionResult>,
    bytes: u64,
    largest_item: u64,
    ceiling: u64,
}

impl Batch {
    pub fn new(ceiling: u64) -> Self {
        Self {
            items: Vec::new(),
            bytes: 0,
            largest_item: 0,
            ceiling,
        }
    }

    /// Returns true if adding `size` bytes requires flushing first
    pub fn would_exceed(&self, size: u64) -> bool {
        !self.items.is_empty() && self.bytes.saturating_add(size) > self.ceiling
    }

    pub fn push(&mut self, item: ConversionResult) {
        let size = item.approx_size();
        self.bytes += size;
        self.largest_item = self.largest_item.max(size);
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Accumulated approximate size
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Empties the batch, returning its items and their flush record
    pub fn drain(&mut self) -> (Vec<ConversionResult>, FlushRecord) {
        let record = FlushRecord {
            items: self.items.len(),
            bytes: self.bytes,
            largest_item: self.largest_item,
        };
        self.bytes = 0;
        self.largest_item = 0;
        (std::mem::take(&mut self.items), record)
    }
}
