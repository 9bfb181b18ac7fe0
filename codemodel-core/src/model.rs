//! The code model arena
//!
//! All nodes and definitions live in typed arenas owned by [`CodeModel`] and
//! are addressed by handles from [`crate::ids`]. Handle identity is node
//! identity: two handles are the same node exactly when they are equal.

use crate::body::MethodBody;
use crate::error::Result;
use crate::expressions::{CompileTimeConstant, Expression, ExpressionNode};
use crate::ids::{ExprId, FieldId, LocalId, MethodId, ParamId, PropertyId, StmtId, TypeId};
use crate::members::{
    FieldDefinition, LocalDefinition, MethodDefinition, ParameterDefinition, PlatformType,
    PropertyDefinition, TypeDefinition,
};
use crate::statements::{BlockStatement, Statement, StatementNode};
use crate::traverse::{NodeRef, Traversal};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// Type alias for the map implementation used by the model and its side tables
pub type ModelHashMap<K, V> = FxHashMap<K, V>;

/// Type alias for the set implementation used by the model and its side tables
pub type ModelHashSet<T> = FxHashSet<T>;

/// Arena of expressions, statements and the metadata they reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeModel {
    expressions: Vec<Expression>,
    statements: Vec<Statement>,
    locals: Vec<LocalDefinition>,
    parameters: Vec<ParameterDefinition>,
    types: Vec<TypeDefinition>,
    fields: Vec<FieldDefinition>,
    methods: Vec<MethodDefinition>,
    properties: Vec<PropertyDefinition>,
    /// Nodes handed out as immutable; mutators must copy them before writing
    frozen_expressions: ModelHashSet<ExprId>,
    frozen_statements: ModelHashSet<StmtId>,
    #[serde(skip)]
    bodies: ModelHashMap<MethodId, Arc<dyn MethodBody>>,
}

macro_rules! arena_accessors {
    (
        $arena:ident: $id:ty => $item:ty,
        $get:ident, $get_mut:ident, $try_get:ident, $count:ident
    ) => {
        /// Borrows the entry. Panics on a handle from another model.
        pub fn $get(&self, id: $id) -> &$item {
            &self.$arena[id.index()]
        }

        /// Mutably borrows the entry. Panics on a handle from another model.
        pub fn $get_mut(&mut self, id: $id) -> &mut $item {
            &mut self.$arena[id.index()]
        }

        /// Borrows the entry if the handle resolves
        pub fn $try_get(&self, id: $id) -> Option<&$item> {
            self.$arena.get(id.index())
        }

        /// Number of entries, dummy included
        pub fn $count(&self) -> usize {
            self.$arena.len()
        }
    };
}

impl CodeModel {
    /// Creates a model holding only the dummy entries and the platform types
    pub fn new() -> Self {
        let mut types = vec![TypeDefinition::default()];
        types.extend(PlatformType::ALL.iter().map(|platform| TypeDefinition {
            name: platform.name().to_string(),
            namespace: "System".to_string(),
            is_value_type: platform.is_value_type(),
            ..Default::default()
        }));

        Self {
            expressions: vec![Expression::new(
                CompileTimeConstant::default(),
                TypeId::DUMMY,
            )],
            statements: vec![Statement::new(BlockStatement::default())],
            locals: vec![LocalDefinition::default()],
            parameters: vec![ParameterDefinition::default()],
            types,
            fields: vec![FieldDefinition::default()],
            methods: vec![MethodDefinition::default()],
            properties: vec![PropertyDefinition::default()],
            frozen_expressions: ModelHashSet::default(),
            frozen_statements: ModelHashSet::default(),
            bodies: ModelHashMap::default(),
        }
    }

    arena_accessors!(
        expressions: ExprId => Expression,
        expression,
        expression_mut,
        try_expression,
        expression_count
    );
    arena_accessors!(
        statements: StmtId => Statement,
        statement,
        statement_mut,
        try_statement,
        statement_count
    );
    arena_accessors!(
        locals: LocalId => LocalDefinition,
        local,
        local_mut,
        try_local,
        local_count
    );
    arena_accessors!(
        parameters: ParamId => ParameterDefinition,
        parameter,
        parameter_mut,
        try_parameter,
        parameter_count
    );
    arena_accessors!(
        types: TypeId => TypeDefinition,
        type_definition,
        type_definition_mut,
        try_type_definition,
        type_count
    );
    arena_accessors!(
        fields: FieldId => FieldDefinition,
        field,
        field_mut,
        try_field,
        field_count
    );
    arena_accessors!(
        methods: MethodId => MethodDefinition,
        method,
        method_mut,
        try_method,
        method_count
    );
    arena_accessors!(
        properties: PropertyId => PropertyDefinition,
        property,
        property_mut,
        try_property,
        property_count
    );

    // ===== Allocation =====

    /// Adds an expression node
    pub fn add_expression(&mut self, expression: Expression) -> Result<ExprId> {
        let id = ExprId::from_index(self.expressions.len())?;
        self.expressions.push(expression);
        Ok(id)
    }

    /// Adds a statement node
    pub fn add_statement(&mut self, statement: Statement) -> Result<StmtId> {
        let id = StmtId::from_index(self.statements.len())?;
        self.statements.push(statement);
        Ok(id)
    }

    /// Adds a local definition
    pub fn add_local(&mut self, local: LocalDefinition) -> Result<LocalId> {
        let id = LocalId::from_index(self.locals.len())?;
        self.locals.push(local);
        Ok(id)
    }

    /// Adds a parameter definition. The owner's signature is not updated.
    pub fn add_parameter(&mut self, parameter: ParameterDefinition) -> Result<ParamId> {
        let id = ParamId::from_index(self.parameters.len())?;
        self.parameters.push(parameter);
        Ok(id)
    }

    /// Adds a type definition
    pub fn add_type(&mut self, definition: TypeDefinition) -> Result<TypeId> {
        let id = TypeId::from_index(self.types.len())?;
        self.types.push(definition);
        Ok(id)
    }

    /// Adds a field and lists it on its containing type
    pub fn add_field(&mut self, field: FieldDefinition) -> Result<FieldId> {
        let id = FieldId::from_index(self.fields.len())?;
        let owner = field.containing_type;
        self.fields.push(field);
        if owner != TypeId::DUMMY {
            self.type_definition_mut(owner).fields.push(id);
        }
        Ok(id)
    }

    /// Adds a method and lists it on its containing type
    pub fn add_method(&mut self, method: MethodDefinition) -> Result<MethodId> {
        let id = MethodId::from_index(self.methods.len())?;
        let owner = method.containing_type;
        self.methods.push(method);
        if owner != TypeId::DUMMY {
            self.type_definition_mut(owner).methods.push(id);
        }
        Ok(id)
    }

    /// Adds a property and lists it on its containing type
    pub fn add_property(&mut self, property: PropertyDefinition) -> Result<PropertyId> {
        let id = PropertyId::from_index(self.properties.len())?;
        let owner = property.containing_type;
        self.properties.push(property);
        if owner != TypeId::DUMMY {
            self.type_definition_mut(owner).properties.push(id);
        }
        Ok(id)
    }

    // ===== Typed node access =====

    /// Borrows the expression as a concrete node type
    pub fn expression_node<T: ExpressionNode>(&self, id: ExprId) -> Option<&T> {
        T::from_kind(&self.expression(id).kind)
    }

    /// Mutably borrows the expression as a concrete node type
    pub fn expression_node_mut<T: ExpressionNode>(&mut self, id: ExprId) -> Option<&mut T> {
        T::from_kind_mut(&mut self.expression_mut(id).kind)
    }

    /// Borrows the statement as a concrete node type
    pub fn statement_node<T: StatementNode>(&self, id: StmtId) -> Option<&T> {
        T::from_kind(&self.statement(id).kind)
    }

    /// Mutably borrows the statement as a concrete node type
    pub fn statement_node_mut<T: StatementNode>(&mut self, id: StmtId) -> Option<&mut T> {
        T::from_kind_mut(&mut self.statement_mut(id).kind)
    }

    // ===== Shallow copies =====

    /// New expression with the same fields, sharing every child handle.
    /// The dummy expression is returned as is.
    pub fn shallow_copy_expression(&mut self, id: ExprId) -> Result<ExprId> {
        if id == ExprId::DUMMY {
            return Ok(id);
        }
        let copy = self.expression(id).clone();
        self.add_expression(copy)
    }

    /// New statement with the same fields, sharing every child handle.
    /// The dummy block is returned as is.
    pub fn shallow_copy_statement(&mut self, id: StmtId) -> Result<StmtId> {
        if id == StmtId::DUMMY_BLOCK {
            return Ok(id);
        }
        let copy = self.statement(id).clone();
        self.add_statement(copy)
    }

    // ===== Mutability =====

    /// Marks one expression immutable
    pub fn freeze_expression(&mut self, id: ExprId) {
        self.frozen_expressions.insert(id);
    }

    /// Marks one statement immutable
    pub fn freeze_statement(&mut self, id: StmtId) {
        self.frozen_statements.insert(id);
    }

    /// Marks every node reachable from `root` immutable
    pub fn freeze_tree(&mut self, root: NodeRef) {
        let nodes: Vec<NodeRef> = Traversal::new(self).from(root).collect();
        trace!("Freezing {} nodes under {}", nodes.len(), root);
        for node in nodes {
            match node {
                NodeRef::Expression(id) => self.freeze_expression(id),
                NodeRef::Statement(id) => self.freeze_statement(id),
            }
        }
    }

    pub fn is_expression_frozen(&self, id: ExprId) -> bool {
        // The dummies are shared by everyone and never writable
        id == ExprId::DUMMY || self.frozen_expressions.contains(&id)
    }

    pub fn is_statement_frozen(&self, id: StmtId) -> bool {
        id == StmtId::DUMMY_BLOCK || self.frozen_statements.contains(&id)
    }

    // ===== Method bodies =====

    /// Body of `method`, if it has one
    pub fn method_body(&self, method: MethodId) -> Option<Arc<dyn MethodBody>> {
        self.bodies.get(&method).cloned()
    }

    /// Attaches (or replaces) the body of `method`
    pub fn set_method_body(&mut self, method: MethodId, body: Arc<dyn MethodBody>) {
        self.bodies.insert(method, body);
    }

    /// Detaches the body of `method`
    pub fn remove_method_body(&mut self, method: MethodId) -> Option<Arc<dyn MethodBody>> {
        self.bodies.remove(&method)
    }

    // ===== Lookup =====

    /// Fixed handle of a platform type
    pub fn platform_type(&self, platform: PlatformType) -> TypeId {
        platform.id()
    }

    /// Every non-dummy type with its handle
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeDefinition)> + '_ {
        self.types
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, definition)| {
                TypeId::from_index(index).ok().map(|id| (id, definition))
            })
    }

    /// First type with the given simple name
    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.types()
            .find(|(_, definition)| definition.name == name)
            .map(|(id, _)| id)
    }

    /// First method of `ty` with the given name
    pub fn find_method(&self, ty: TypeId, name: &str) -> Option<MethodId> {
        self.type_definition(ty)
            .methods
            .iter()
            .copied()
            .find(|m| self.method(*m).name == name)
    }

    /// First field of `ty` with the given name
    pub fn find_field(&self, ty: TypeId, name: &str) -> Option<FieldId> {
        self.type_definition(ty)
            .fields
            .iter()
            .copied()
            .find(|f| self.field(*f).name == name)
    }
}

impl Default for CodeModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
