//! A program: an ordered collection of uniquely-named functions.

use crate::ir::Function;
use std::collections::HashMap;

/// Owns every [`Function`] in a translation unit, keyed by name, preserving declaration order.
#[derive(Default)]
pub struct Program {
    functions: Vec<Function>,
    by_name: HashMap<String, usize>,
}

impl Program {
    pub fn new() -> Self {
        Program {
            functions: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Add a function. Returns `Err(name)` without modifying the program if a function with that
    /// name already exists.
    pub fn add_function(&mut self, function: Function) -> Result<(), String> {
        if self.by_name.contains_key(&function.name) {
            return Err(function.name);
        }
        self.by_name
            .insert(function.name.clone(), self.functions.len());
        self.functions.push(function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.by_name.get(name).map(|&i| &self.functions[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Function> {
        let i = *self.by_name.get(name)?;
        Some(&mut self.functions[i])
    }

    /// Functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn functions_mut(&mut self) -> impl Iterator<Item = &mut Function> {
        self.functions.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
