//! Memory model for the SYN-C runtime
//!
//! This module provides the core memory abstractions:
//! - [`value`]: the word codec (int, float, bool, char, pointer ↔ [`value::Word`])
//! - [`stack`]: globals and call frames, as name → address maps
//! - [`heap`]: the downward-growing block allocator
//!
//! # Address space
//!
//! ```text
//! 1            R          R+G               S                  2^24
//! | read-only  | globals  | stack frames →  |  free  | ← heap  |
//! ```
//!
//! `R` (the stack limit) and `G` are fixed at load time. `S` moves with the
//! stack. The stack and the heap must never meet: declaring a variable fails
//! with `MemoryExceeded` and an allocation returns NULL instead.

pub mod heap;
pub mod stack;
pub mod value;

use crate::interpreter::constants::{MEMORY_SIZE, NULL_ADDRESS};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::SourceLocation;
use heap::{Heap, HeapBlock};
use rustc_hash::FxHashMap;
use stack::CallStack;
use value::{char_to_word, word_to_char, Address, Word};

/// The flat word store plus the stack and heap bookkeeping
#[derive(Debug, Clone)]
pub struct Memory {
    cells: FxHashMap<Address, Word>,
    stack: CallStack,
    heap: Heap,
}

impl Memory {
    /// Build memory from the static image laid out at load time: `image[i]`
    /// is stored at address `1 + i`, and the first `stack_limit - 1` words
    /// are read-only.
    pub fn new(image: &[Word], stack_limit: Address, globals: &[String]) -> Self {
        let cells = image
            .iter()
            .enumerate()
            .filter(|(_, &word)| word != 0)
            .map(|(offset, &word)| (offset as Address + 1, word))
            .collect();

        Self {
            cells,
            stack: CallStack::new(stack_limit, globals),
            heap: Heap::new(),
        }
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn heap_blocks(&self) -> &[HeapBlock] {
        self.heap.blocks()
    }

    fn checked_address(address: i64, location: SourceLocation) -> Result<Address, RuntimeError> {
        if address <= i64::from(NULL_ADDRESS) || address >= i64::from(MEMORY_SIZE) {
            return Err(RuntimeError::MemoryAccess { address, location });
        }
        Ok(address as Address)
    }

    /// Read one word; never-written words read as zero
    pub fn read(&self, address: i64, location: SourceLocation) -> Result<Word, RuntimeError> {
        let address = Self::checked_address(address, location)?;
        Ok(self.cells.get(&address).copied().unwrap_or(0))
    }

    pub fn write(
        &mut self,
        address: i64,
        word: Word,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let checked = Self::checked_address(address, location)?;
        if checked < self.stack.stack_limit() {
            return Err(RuntimeError::ReadOnlyWrite { address, location });
        }
        if word == 0 {
            self.cells.remove(&checked);
        } else {
            self.cells.insert(checked, word);
        }
        Ok(())
    }

    /// Read a NUL-terminated string starting at `address`
    pub fn read_string(
        &self,
        address: i64,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        let mut text = String::new();
        let mut cursor = address;
        loop {
            let c = word_to_char(self.read(cursor, location)?, location)?;
            if c == '\0' {
                return Ok(text);
            }
            text.push(c);
            cursor += 1;
        }
    }

    /// Write `text` followed by NUL at `address`; the terminator goes first
    /// so an overlong string fails before anything is written
    pub fn write_string(
        &mut self,
        address: i64,
        text: &str,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let bytes = text.as_bytes();
        self.write(address + bytes.len() as i64, 0, location)?;
        for (offset, &byte) in bytes.iter().enumerate() {
            self.write(address + offset as i64, char_to_word(byte), location)?;
        }
        Ok(())
    }

    /// Fail with `MemoryExceeded` if the stack reaches the lowest heap block
    pub fn check_stack_room(
        &self,
        variable: &str,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let heap_floor = self.heap.lowest_address().unwrap_or(MEMORY_SIZE);
        if self.stack.stack_end() >= u64::from(heap_floor) {
            return Err(RuntimeError::MemoryExceeded {
                variable: variable.to_string(),
                location,
            });
        }
        Ok(())
    }

    /// Address of a declared variable (global first, then current frame)
    pub fn variable_address(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Address, RuntimeError> {
        self.stack
            .address_of(name)
            .ok_or_else(|| RuntimeError::UndeclaredVariable {
                name: name.to_string(),
                location,
            })
    }

    /// Address of `name`, declaring it in the current frame on first use
    pub fn declare_variable(
        &mut self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Address, RuntimeError> {
        if let Some(address) = self.stack.address_of(name) {
            return Ok(address);
        }
        let address = self
            .stack
            .declare_local(name)
            .ok_or_else(|| RuntimeError::UndeclaredVariable {
                name: name.to_string(),
                location,
            })?;
        self.check_stack_room(name, location)?;
        Ok(address)
    }

    /// Push a frame holding `params` and store `args` in it
    pub fn push_frame(
        &mut self,
        function: &str,
        params: &[String],
        args: &[Word],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        self.stack.push_frame(function);
        let mut addresses = Vec::with_capacity(params.len());
        for param in params {
            if let Some(address) = self.stack.declare_local(param) {
                addresses.push(address);
            }
        }
        let culprit = params.last().map(String::as_str).unwrap_or(function);
        self.check_stack_room(culprit, location)?;
        for (address, &word) in addresses.into_iter().zip(args) {
            self.write(i64::from(address), word, location)?;
        }
        Ok(())
    }

    /// Pop the current frame and clear its words
    pub fn pop_frame(&mut self) {
        if let Some(frame) = self.stack.pop_frame() {
            self.clear_range(frame.base, frame.len() as u32);
        }
    }

    /// Zero `len` words from `start`
    fn clear_range(&mut self, start: Address, len: u32) {
        if len as usize > self.cells.len() {
            let end = u64::from(start) + u64::from(len);
            self.cells
                .retain(|&address, _| address < start || u64::from(address) >= end);
        } else {
            for offset in 0..len {
                self.cells.remove(&(start + offset));
            }
        }
    }

    /// Reserve `size` zeroed words on the heap; NULL when the stack is in
    /// the way
    pub fn allocate(&mut self, size: i32, location: SourceLocation) -> Result<Address, RuntimeError> {
        if size <= 0 {
            return Err(RuntimeError::MallocInvalidSize { size, location });
        }
        let address = self.heap.allocate(size as u32, self.stack.stack_end());
        if address != NULL_ADDRESS {
            self.clear_range(address, size as u32);
        }
        Ok(address)
    }

    pub fn free(&mut self, address: Address, location: SourceLocation) -> Result<(), RuntimeError> {
        self.heap
            .free(address)
            .map(|_| ())
            .map_err(|address| RuntimeError::FreeOfUnallocatedPointer { address, location })
    }
}
