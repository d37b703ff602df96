//! Heap allocator
//!
//! The heap grows downward from the top of the address space. Blocks are kept
//! as `(address, size)` pairs sorted by descending address, so the block
//! nearest to the top of memory comes first and the last block is the one
//! closest to the stack.
//!
//! # Placement
//!
//! A request is placed in the highest gap between two neighbouring blocks that
//! can hold it, or directly below the lowest block when no gap fits. The block
//! contents live in the flat word store; the heap only tracks ownership.

use super::value::Address;
use crate::interpreter::constants::{MEMORY_SIZE, NULL_ADDRESS};

/// One allocated run of words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapBlock {
    pub address: Address,
    pub size: u32,
}

impl HeapBlock {
    /// One past the last word of the block
    pub fn end(&self) -> u64 {
        u64::from(self.address) + u64::from(self.size)
    }

    pub fn contains(&self, address: Address) -> bool {
        address >= self.address && u64::from(address) < self.end()
    }
}

/// The block list
#[derive(Debug, Clone, Default)]
pub struct Heap {
    blocks: Vec<HeapBlock>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocated blocks, highest address first
    pub fn blocks(&self) -> &[HeapBlock] {
        &self.blocks
    }

    /// Start of the block closest to the stack, if any
    pub fn lowest_address(&self) -> Option<Address> {
        self.blocks.last().map(|block| block.address)
    }

    /// Reserve `size` words. `stack_end` is one past the last stack word; the
    /// new block must start strictly above it, otherwise the null address is
    /// returned and nothing is reserved.
    pub fn allocate(&mut self, size: u32, stack_end: u64) -> Address {
        let (address, index) = self.find_slot(u64::from(size));

        match address {
            Some(address) if address > stack_end => {
                // address <= MEMORY_SIZE - size, so it fits in 24 bits
                let address = address as Address;
                self.blocks.insert(index, HeapBlock { address, size });
                address
            }
            _ => NULL_ADDRESS,
        }
    }

    /// Highest placement for a block of `size` words and its list position
    fn find_slot(&self, size: u64) -> (Option<u64>, usize) {
        let top = u64::from(MEMORY_SIZE);

        let mut previous = top;
        for (index, block) in self.blocks.iter().enumerate() {
            if block.end() + size <= previous {
                return (Some(block.end()), index);
            }
            previous = u64::from(block.address);
        }

        (previous.checked_sub(size), self.blocks.len())
    }

    /// Release the block starting exactly at `address`
    pub fn free(&mut self, address: Address) -> Result<HeapBlock, Address> {
        match self.blocks.iter().position(|block| block.address == address) {
            Some(index) => Ok(self.blocks.remove(index)),
            None => Err(address),
        }
    }

    pub fn block_at(&self, address: Address) -> Option<&HeapBlock> {
        self.blocks.iter().find(|block| block.contains(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(heap: &Heap, stack_end: u64) {
        let blocks = heap.blocks();
        for pair in blocks.windows(2) {
            assert!(pair[1].end() <= u64::from(pair[0].address));
        }
        for block in blocks {
            assert!(u64::from(block.address) > stack_end);
            assert!(block.end() <= u64::from(MEMORY_SIZE));
        }
    }

    #[test]
    fn test_first_block_sits_at_top() {
        let mut heap = Heap::new();
        let address = heap.allocate(4, 10);
        assert_eq!(address, MEMORY_SIZE - 4);
        assert_eq!(heap.lowest_address(), Some(MEMORY_SIZE - 4));
    }

    #[test]
    fn test_blocks_grow_downward() {
        let mut heap = Heap::new();
        let a = heap.allocate(4, 10);
        let b = heap.allocate(2, 10);
        assert_eq!(b, a - 2);
        assert_disjoint(&heap, 10);
    }

    #[test]
    fn test_freed_gap_is_reused() {
        let mut heap = Heap::new();
        let a = heap.allocate(4, 10);
        let b = heap.allocate(4, 10);
        let c = heap.allocate(4, 10);
        heap.free(b).expect("b is allocated");

        let d = heap.allocate(3, 10);
        // highest gap that fits: right above c
        assert_eq!(d, c + 4);
        assert!(d + 3 <= a);
        assert_disjoint(&heap, 10);
    }

    #[test]
    fn test_exact_fit_gap_is_used() {
        let mut heap = Heap::new();
        let a = heap.allocate(2, 10);
        let b = heap.allocate(2, 10);
        heap.allocate(2, 10);
        heap.free(b).expect("b is allocated");
        assert_eq!(heap.allocate(2, 10), b);
        assert_eq!(heap.blocks()[0].address, a);
        assert_disjoint(&heap, 10);
    }

    #[test]
    fn test_collision_with_stack_returns_null() {
        let mut heap = Heap::new();
        let stack_end = u64::from(MEMORY_SIZE) - 5;
        assert_eq!(heap.allocate(5, stack_end), NULL_ADDRESS);
        assert_eq!(heap.allocate(4, stack_end), MEMORY_SIZE - 4);
        assert!(heap.blocks().len() == 1);
    }

    #[test]
    fn test_oversized_request_returns_null() {
        let mut heap = Heap::new();
        assert_eq!(heap.allocate(MEMORY_SIZE + 1, 1), NULL_ADDRESS);
        assert!(heap.blocks().is_empty());
    }

    #[test]
    fn test_free_requires_block_start() {
        let mut heap = Heap::new();
        let a = heap.allocate(4, 10);
        assert_eq!(heap.free(a + 1), Err(a + 1));
        assert!(heap.free(a).is_ok());
        assert_eq!(heap.free(a), Err(a));
    }

    #[test]
    fn test_mixed_sequence_keeps_blocks_disjoint() {
        let mut heap = Heap::new();
        let mut live = Vec::new();
        for round in 0..40u32 {
            let address = heap.allocate(round % 7 + 1, 100);
            assert_ne!(address, NULL_ADDRESS);
            live.push(address);
            if round % 3 == 0 {
                let victim = live.remove(live.len() / 2);
                heap.free(victim).expect("live block");
            }
            assert_disjoint(&heap, 100);
        }
    }
}
