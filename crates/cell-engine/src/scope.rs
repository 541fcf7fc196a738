//! Variable bindings as a stack of frames.
//!
//! The root frame lives for the whole run. Each user function call pushes a
//! frame and pops it on return, so a lookup that misses the callee's frame
//! continues through its caller's frames, not the definition site.

use std::collections::HashMap;

use crate::value::Value;

#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, Value>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![HashMap::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Drop the innermost frame. The root frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Look `name` up from the innermost frame outwards; unbound names are `""`.
    pub fn get(&self, name: &str) -> Value {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
            .unwrap_or_else(Value::empty)
    }

    /// Overwrite the nearest existing binding, or bind in the innermost frame.
    pub fn set(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.declare(name, value);
    }

    /// Bind in the innermost frame, shadowing any outer binding.
    pub fn declare(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    pub fn get_root(&self, name: &str) -> Value {
        self.frames[0].get(name).cloned().unwrap_or_else(Value::empty)
    }

    pub fn set_root(&mut self, name: &str, value: Value) {
        self.frames[0].insert(name.to_string(), value);
    }

    pub fn remove_root(&mut self, name: &str) {
        self.frames[0].remove(name);
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
