//! Call stack implementation
//!
//! This module tracks variable names, not values; every variable owns one
//! word in the flat store and its address is derived from its position:
//!
//! - global `i` lives at `stack_limit + i`
//! - local `j` of a frame lives at `frame.base + j`, where frames are laid
//!   out back to back from `stack_limit + globals`
//!
//! Locals are declared by first assignment, so a frame grows while it runs.
//! The total number of live locals is cached to give the stack end in O(1).

use super::value::Address;
use rustc_hash::FxHashMap;

/// A single function's activation record
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub function_name: String,
    pub base: Address,
    locals: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl StackFrame {
    fn new(function_name: &str, base: Address) -> Self {
        Self {
            function_name: function_name.to_string(),
            base,
            locals: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Local names in declaration order
    pub fn locals(&self) -> &[String] {
        &self.locals
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.index
            .get(name)
            .map(|&slot| self.base + slot as Address)
    }

    fn declare(&mut self, name: &str) -> Address {
        let slot = self.locals.len();
        self.locals.push(name.to_string());
        self.index.insert(name.to_string(), slot);
        self.base + slot as Address
    }
}

/// Globals plus the stack of frames
#[derive(Debug, Clone)]
pub struct CallStack {
    stack_limit: Address,
    globals: Vec<String>,
    global_index: FxHashMap<String, usize>,
    frames: Vec<StackFrame>,
    live_locals: usize,
}

impl CallStack {
    pub fn new(stack_limit: Address, globals: &[String]) -> Self {
        let global_index = globals
            .iter()
            .enumerate()
            .map(|(slot, name)| (name.clone(), slot))
            .collect();

        Self {
            stack_limit,
            globals: globals.to_vec(),
            global_index,
            frames: Vec::new(),
            live_locals: 0,
        }
    }

    pub fn stack_limit(&self) -> Address {
        self.stack_limit
    }

    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// One past the last stack word
    pub fn stack_end(&self) -> u64 {
        u64::from(self.stack_limit) + self.globals.len() as u64 + self.live_locals as u64
    }

    pub fn global_address(&self, name: &str) -> Option<Address> {
        self.global_index
            .get(name)
            .map(|&slot| self.stack_limit + slot as Address)
    }

    /// Resolve a name: globals first, then the current frame
    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.global_address(name)
            .or_else(|| self.current_frame().and_then(|frame| frame.address_of(name)))
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.address_of(name).is_some()
    }

    /// Push an empty frame for `function_name`
    pub fn push_frame(&mut self, function_name: &str) {
        let base = self.stack_end() as Address;
        self.frames.push(StackFrame::new(function_name, base));
    }

    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        let frame = self.frames.pop()?;
        self.live_locals -= frame.len();
        Some(frame)
    }

    /// Add `name` to the current frame and return its address
    pub fn declare_local(&mut self, name: &str) -> Option<Address> {
        let frame = self.frames.last_mut()?;
        let address = frame.declare(name);
        self.live_locals += 1;
        Some(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_precede_locals() {
        let mut stack = CallStack::new(10, &["g".to_string(), "h".to_string()]);
        assert_eq!(stack.global_address("h"), Some(11));
        assert_eq!(stack.stack_end(), 12);

        stack.push_frame("main");
        assert_eq!(stack.declare_local("x"), Some(12));
        assert_eq!(stack.declare_local("y"), Some(13));
        assert_eq!(stack.stack_end(), 14);
    }

    #[test]
    fn test_frames_are_contiguous_and_scoped() {
        let mut stack = CallStack::new(5, &[]);
        stack.push_frame("main");
        stack.declare_local("x");

        stack.push_frame("f");
        assert_eq!(stack.current_frame().map(|f| f.base), Some(6));
        assert_eq!(stack.declare_local("x"), Some(6));
        assert!(stack.is_declared("x"));
        assert_eq!(stack.stack_end(), 7);

        stack.pop_frame();
        assert_eq!(stack.address_of("x"), Some(5));
        assert_eq!(stack.stack_end(), 6);
    }

    #[test]
    fn test_callee_cannot_see_caller_locals() {
        let mut stack = CallStack::new(1, &[]);
        stack.push_frame("main");
        stack.declare_local("secret");
        stack.push_frame("f");
        assert_eq!(stack.address_of("secret"), None);
    }
}
