//! Known modules and their test sequences

use serde::Serialize;
use std::{ collections::BTreeMap, fmt, path::Path };

use crate::{
    board::ModuleId,
    operation::Operation,
    script::{ self, ParseError },
};

/// A daughter module type and the operations that test it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module
{
    pub id: ModuleId,
    pub name: String,
    pub operations: Vec<Operation>,
}

impl Module
{
    pub fn new(id: ModuleId, name: impl Into<String>, operations: Vec<Operation>) -> Self
    {
        Self {
            id: id,
            name: name.into(),
            operations: operations,
        }
    }
}

#[derive(Debug)]
pub struct DuplicateModuleErr
{
    pub id: ModuleId,
}

impl fmt::Display for DuplicateModuleErr
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "A module with id {} is already registered", self.id)
    }
}

impl std::error::Error for DuplicateModuleErr {}

/// Lookup table from module ID to module, filled once at startup
#[derive(Debug, Clone, Default)]
pub struct Registry
{
    modules: BTreeMap<ModuleId, Module>,
}

impl Registry
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Builds a registry from a multi-module script, see [`crate::script`]
    pub fn from_script(text: &str) -> Result<Self, ParseError>
    {
        let modules = script::parse_modules(text)?;
        let mut registry = Self::new();

        for module in modules {
            // the parser already rejects repeated ids
            registry.modules.insert(module.id, module);
        }

        Ok(registry)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParseError>
    {
        let text = std::fs::read_to_string(path.as_ref())?;
        let registry = Self::from_script(&text)?;
        log::info!("Loaded {} module(s) from {}", registry.len(), path.as_ref().display());

        Ok(registry)
    }

    pub fn insert(&mut self, module: Module) -> Result<(), DuplicateModuleErr>
    {
        if self.modules.contains_key(&module.id) {
            return Err(DuplicateModuleErr { id: module.id });
        }

        self.modules.insert(module.id, module);
        Ok(())
    }

    pub fn lookup(&self, id: ModuleId) -> Option<&Module>
    {
        self.modules.get(&id)
    }

    pub fn len(&self) -> usize
    {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module>
    {
        self.modules.values()
    }
}
