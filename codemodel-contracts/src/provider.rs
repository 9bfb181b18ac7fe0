//! Handle-keyed contract store

use crate::contract::{LoopContract, MethodContract, QuantifierTriggers, TypeContract};
use codemodel_core::{ExprId, MethodId, ModelHashMap, StmtId, TypeId};
use parking_lot::RwLock;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};

/// One locked association table
#[derive(Debug)]
struct Table<K, V> {
    name: &'static str,
    entries: RwLock<ModelHashMap<K, Arc<V>>>,
}

impl<K: Copy + Eq + Hash + std::fmt::Display, V> Table<K, V> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(ModelHashMap::default()),
        }
    }

    fn associate(&self, key: K, value: Arc<V>) {
        trace!("Associating {} contract with {}", self.name, key);
        self.entries.write().insert(key, value);
    }

    fn get(&self, key: K) -> Option<Arc<V>> {
        self.entries.read().get(&key).cloned()
    }

    fn remove(&self, key: K) -> Option<Arc<V>> {
        let removed = self.entries.write().remove(&key);
        if removed.is_some() {
            trace!("Removed {} contract of {}", self.name, key);
        }
        removed
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Associates contracts with methods, types, loops and quantifiers
///
/// Associations are keyed by handle, so a node and its copy never share a
/// contract implicitly: whoever creates the copy re-associates. Each table
/// has its own lock; all operations are safe to call concurrently.
#[derive(Debug)]
pub struct ContractProvider {
    loops: Table<StmtId, LoopContract>,
    methods: Table<MethodId, MethodContract>,
    types: Table<TypeId, TypeContract>,
    triggers: Table<ExprId, QuantifierTriggers>,
}

impl Default for ContractProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractProvider {
    /// Creates an empty store
    pub fn new() -> Self {
        debug!("Creating contract provider");
        Self {
            loops: Table::new("loop"),
            methods: Table::new("method"),
            types: Table::new("type"),
            triggers: Table::new("trigger"),
        }
    }

    // ===== Loops =====

    /// Associates `contract` with `loop_statement`, replacing any previous one
    pub fn associate_loop_with_contract(
        &self,
        loop_statement: StmtId,
        contract: impl Into<Arc<LoopContract>>,
    ) {
        self.loops.associate(loop_statement, contract.into());
    }

    /// Contract of `loop_statement`, if any
    pub fn contract_for_loop(&self, loop_statement: StmtId) -> Option<Arc<LoopContract>> {
        self.loops.get(loop_statement)
    }

    /// Drops the contract of `loop_statement`, returning it
    pub fn unassociate_loop(&self, loop_statement: StmtId) -> Option<Arc<LoopContract>> {
        self.loops.remove(loop_statement)
    }

    // ===== Methods =====

    /// Associates `contract` with `method`, replacing any previous one
    pub fn associate_method_with_contract(
        &self,
        method: MethodId,
        contract: impl Into<Arc<MethodContract>>,
    ) {
        self.methods.associate(method, contract.into());
    }

    /// Contract of `method`, if any
    pub fn contract_for_method(&self, method: MethodId) -> Option<Arc<MethodContract>> {
        self.methods.get(method)
    }

    /// Drops the contract of `method`, returning it
    pub fn unassociate_method(&self, method: MethodId) -> Option<Arc<MethodContract>> {
        self.methods.remove(method)
    }

    // ===== Types =====

    /// Associates `contract` with `ty`, replacing any previous one
    pub fn associate_type_with_contract(&self, ty: TypeId, contract: impl Into<Arc<TypeContract>>) {
        self.types.associate(ty, contract.into());
    }

    /// Contract of `ty`, if any
    pub fn contract_for_type(&self, ty: TypeId) -> Option<Arc<TypeContract>> {
        self.types.get(ty)
    }

    /// Drops the contract of `ty`, returning it
    pub fn unassociate_type(&self, ty: TypeId) -> Option<Arc<TypeContract>> {
        self.types.remove(ty)
    }

    // ===== Quantifier triggers =====

    /// Associates trigger sets with a quantifier expression
    pub fn associate_triggers_with_quantifier(
        &self,
        quantifier: ExprId,
        triggers: QuantifierTriggers,
    ) {
        self.triggers.associate(quantifier, Arc::new(triggers));
    }

    /// Trigger sets of `quantifier`, if any
    pub fn triggers_for_quantifier(&self, quantifier: ExprId) -> Option<Arc<QuantifierTriggers>> {
        self.triggers.get(quantifier)
    }

    /// Drops the triggers of `quantifier`, returning them
    pub fn unassociate_triggers(&self, quantifier: ExprId) -> Option<Arc<QuantifierTriggers>> {
        self.triggers.remove(quantifier)
    }

    /// Total number of associations across all tables
    pub fn len(&self) -> usize {
        self.loops.len() + self.methods.len() + self.types.len() + self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
