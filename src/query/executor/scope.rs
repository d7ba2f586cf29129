// Scope Implementation
//
// Table bindings visible to a query. A scope is a stack of frames: the root
// frame holds the caller's bindings and every select pushes a child frame
// that is popped once the select has been evaluated. Lookups walk from the
// innermost frame outwards, writes always land in the innermost frame.

use std::collections::HashMap;

use linked_hash_map::LinkedHashMap;
use log::trace;

use crate::catalog::table::Table;

/// The bindings of one frame
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    tables: LinkedHashMap<String, Table>,
    table_aliases: HashMap<String, String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Table bound under `name`, directly or through an alias
    pub fn get_by_identifier(&self, name: &str) -> Option<&Table> {
        self.tables.get(name).or_else(|| {
            self.table_aliases
                .get(name)
                .and_then(|table_name| self.tables.get(table_name))
        })
    }

    /// Bind a table; its name becomes an alias of itself
    pub fn set_table(&mut self, name: &str, table: Table) {
        self.table_aliases.insert(name.to_string(), table.name().to_string());
        self.tables.insert(name.to_string(), table);
    }

    pub fn get_table_name(&self, alias: &str) -> Option<&str> {
        self.table_aliases.get(alias).map(String::as_str)
    }

    pub fn set_table_alias(&mut self, alias: &str, table_name: &str) {
        self.table_aliases.insert(alias.to_string(), table_name.to_string());
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Frame binding only `table`, with every alias of this frame pointing at it
    fn rebound(&self, table: Table) -> ExecutionContext {
        let name = table.name().to_string();
        let mut frame = ExecutionContext::new();
        for alias in self.table_aliases.keys() {
            frame.set_table_alias(alias, &name);
        }
        frame.set_table(&name, table);
        frame
    }
}

/// Stack of execution contexts, innermost last
#[derive(Debug, Clone)]
pub struct Scope {
    frames: Vec<ExecutionContext>,
}

impl Scope {
    pub fn new(root: ExecutionContext) -> Self {
        Scope { frames: vec![root] }
    }

    /// Number of frames, 1 for the root alone
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn local(&self) -> &ExecutionContext {
        // the root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn local_mut(&mut self) -> &mut ExecutionContext {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn push_frame(&mut self) {
        self.frames.push(ExecutionContext::new());
        trace!("pushed scope frame, depth {}", self.frames.len());
    }

    /// Drop the innermost frame; the root frame stays
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
        trace!("popped scope frame, depth {}", self.frames.len());
    }

    pub fn get_local_table_by_name(&self, name: &str) -> Option<&Table> {
        self.local().get_table_by_name(name)
    }

    pub fn get_table_by_name(&self, name: &str) -> Option<&Table> {
        self.frames.iter().rev().find_map(|frame| frame.get_table_by_name(name))
    }

    pub fn get_by_identifier(&self, name: &str) -> Option<&Table> {
        self.frames.iter().rev().find_map(|frame| frame.get_by_identifier(name))
    }

    /// Table name an alias refers to, searching outwards
    pub fn get_table_alias(&self, alias: &str) -> Option<&str> {
        self.frames.iter().rev().find_map(|frame| frame.get_table_name(alias))
    }

    /// Tables bound in the innermost frame only
    pub fn get_local_tables(&self) -> impl Iterator<Item = &Table> {
        self.local().tables()
    }

    pub fn set_table(&mut self, name: &str, table: Table) {
        self.local_mut().set_table(name, table);
    }

    pub fn set_table_alias(&mut self, alias: &str, table_name: &str) {
        self.local_mut().set_table_alias(alias, table_name);
    }

    /// Replace the innermost frame with one binding only `table`, every
    /// alias of the frame now pointing at it. Returns the replaced frame.
    pub fn rebind_local(&mut self, table: Table) -> ExecutionContext {
        let frame = self.local().rebound(table);
        std::mem::replace(self.local_mut(), frame)
    }

    /// Swap the innermost frame for `frame`, returning the previous one
    pub fn replace_local(&mut self, frame: ExecutionContext) -> ExecutionContext {
        std::mem::replace(self.local_mut(), frame)
    }
}
