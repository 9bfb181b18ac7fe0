//! Makes attributed property getters lazy
//!
//! For a getter-only instance property `P` carrying the marker attribute,
//! the rewrite adds two private fields, `P$Value` and `P$Init`, moves the
//! original getter body into a private `GetPUncached` method and replaces
//! the getter body with
//!
//! ```text
//! if (!this.P$Init) {
//!     this.P$Value = this.GetPUncached();
//!     this.P$Init = true;
//! }
//! return this.P$Value;
//! ```
//!
//! Properties that do not qualify are reported to the host and left alone.

use crate::config::LazyPropertyConfig;
use crate::copier::DeepCopier;
use crate::host::{Diagnostic, DiagnosticSubject, Host, Severity};
use codemodel_contracts::ContractProvider;
use codemodel_core::expressions::{Constant, LogicalNot};
use codemodel_core::members::{CustomAttribute, FieldDefinition, TypeDefinition, Visibility};
use codemodel_core::statements::{ConditionalStatement, EmptyStatement};
use codemodel_core::{
    BlockBody, CodeModel, FieldId, MethodId, PropertyId, Result, StmtId, TypeId,
};
use std::sync::Arc;
use tracing::debug;

/// Outcome of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LazyPropertyReport {
    /// Properties rewritten
    pub mutation_count: usize,
    /// Marked properties rejected with a diagnostic
    pub rejected_count: usize,
}

impl LazyPropertyReport {
    /// Whether the model was changed
    pub fn changed(&self) -> bool {
        self.mutation_count > 0
    }
}

/// The lazy property rewrite
pub struct LazyPropertyMutator {
    host: Arc<dyn Host>,
    config: LazyPropertyConfig,
    contracts: Option<Arc<ContractProvider>>,
}

impl LazyPropertyMutator {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::with_config(host, LazyPropertyConfig::default())
    }

    pub fn with_config(host: Arc<dyn Host>, config: LazyPropertyConfig) -> Self {
        Self {
            host,
            config,
            contracts: None,
        }
    }

    /// Copy getter contracts to the uncached getters
    pub fn with_contracts(mut self, contracts: Arc<ContractProvider>) -> Self {
        self.contracts = Some(contracts);
        self
    }

    /// Rewrites every marked property of every type in `model`
    pub fn run(&self, model: &mut CodeModel) -> Result<LazyPropertyReport> {
        let properties: Vec<PropertyId> = model
            .types()
            .flat_map(|(_, definition)| definition.properties.iter().copied())
            .collect();
        let mut report = LazyPropertyReport::default();
        for property in properties {
            match self.visit_property(model, property)? {
                Some(true) => report.mutation_count += 1,
                Some(false) => report.rejected_count += 1,
                None => {}
            }
        }
        debug!(
            "Lazy property rewrite: {} rewritten, {} rejected",
            report.mutation_count, report.rejected_count
        );
        Ok(report)
    }

    /// `None` for unmarked properties, otherwise whether the rewrite happened
    fn visit_property(&self, model: &mut CodeModel, property: PropertyId) -> Result<Option<bool>> {
        let Some(marker) = self.marker_position(model, property) else {
            return Ok(None);
        };
        let getter = match self.check_preconditions(model, property) {
            Ok(getter) => getter,
            Err(message) => {
                self.report(model, property, Severity::Error, message);
                return Ok(Some(false));
            }
        };

        let (value_field, init_field) = self.define_fields(model, property)?;
        self.define_uncached_getter(model, property, getter, value_field, init_field)?;
        model.property_mut(property).attributes.remove(marker);

        let name = model.property(property).name.clone();
        self.host.report(Diagnostic {
            severity: Severity::Info,
            subject: DiagnosticSubject::Property(property),
            message: format!("lazy: {}", name),
        });
        Ok(Some(true))
    }

    fn marker_position(&self, model: &CodeModel, property: PropertyId) -> Option<usize> {
        model
            .property(property)
            .attributes
            .iter()
            .position(|attribute| {
                model.type_definition(attribute.ty).name == self.config.marker_attribute
            })
    }

    fn check_preconditions(
        &self,
        model: &CodeModel,
        property: PropertyId,
    ) -> std::result::Result<MethodId, &'static str> {
        let definition = model.property(property);
        if definition.setter.is_some() {
            return Err("cannot have a setter to be lazy");
        }
        let getter = definition.getter.ok_or("must have a getter to be lazy")?;
        let getter_definition = model.method(getter);
        if getter_definition.is_static {
            return Err("must be an instance property to be lazy");
        }
        if getter_definition.is_virtual {
            return Err("cannot be virtual to be lazy");
        }
        if !getter_definition.parameters.is_empty() {
            return Err("must not be an indexer to be lazy");
        }
        Ok(getter)
    }

    fn report(&self, model: &CodeModel, property: PropertyId, severity: Severity, message: &str) {
        self.host.report(Diagnostic {
            severity,
            subject: DiagnosticSubject::Property(property),
            message: format!("{} {}", model.property(property).name, message),
        });
    }

    /// Finds an attribute type by simple name, adding it when the model lacks it
    fn attribute_type(model: &mut CodeModel, namespace: &str, name: &str) -> Result<TypeId> {
        match model.find_type(name) {
            Some(ty) => Ok(ty),
            None => model.add_type(TypeDefinition::new(namespace, name)),
        }
    }

    fn define_fields(
        &self,
        model: &mut CodeModel,
        property: PropertyId,
    ) -> Result<(FieldId, FieldId)> {
        let non_serialized = Self::attribute_type(model, "System", "NonSerializedAttribute")?;
        let definition = model.property(property).clone();
        let compiler_generated_field = |name: String, ty: TypeId| FieldDefinition {
            visibility: Visibility::Private,
            is_compiler_generated: true,
            attributes: vec![CustomAttribute::new(non_serialized)],
            ..FieldDefinition::new(name, ty, definition.containing_type)
        };

        let value_field = model.add_field(compiler_generated_field(
            format!("{}{}", definition.name, self.config.value_field_suffix),
            definition.ty,
        ))?;
        let init_field = model.add_field(compiler_generated_field(
            format!("{}{}", definition.name, self.config.init_field_suffix),
            TypeId::BOOLEAN,
        ))?;
        Ok((value_field, init_field))
    }

    fn uncached_name(&self, getter_name: &str) -> String {
        let base = getter_name
            .strip_prefix(self.config.getter_prefix.as_str())
            .unwrap_or(getter_name);
        format!("Get{}{}", base, self.config.uncached_method_suffix)
    }

    fn define_uncached_getter(
        &self,
        model: &mut CodeModel,
        property: PropertyId,
        getter: MethodId,
        value_field: FieldId,
        init_field: FieldId,
    ) -> Result<()> {
        let uncached = {
            let mut copier = DeepCopier::new(model);
            if let Some(contracts) = &self.contracts {
                copier = copier.with_contracts(Arc::clone(contracts));
            }
            copier.copy_method(getter)?
        };
        let name = self.uncached_name(&model.method(getter).name);
        {
            let definition = model.method_mut(uncached);
            definition.name = name;
            definition.visibility = Visibility::Private;
        }
        model.method_mut(getter).is_compiler_generated = true;

        let block = self.cached_getter_block(model, property, uncached, value_field, init_field)?;
        match model.method_body(getter) {
            Some(body) => body.set_block(block),
            None => model.set_method_body(getter, Arc::new(BlockBody::new(getter, block))),
        }
        Ok(())
    }

    fn cached_getter_block(
        &self,
        model: &mut CodeModel,
        property: PropertyId,
        uncached: MethodId,
        value_field: FieldId,
        init_field: FieldId,
    ) -> Result<StmtId> {
        let owner = model.property(property).containing_type;

        // this.P$Value = this.GetPUncached();
        let receiver = model.this_reference(owner)?;
        let call = model.call(Some(receiver), uncached, Vec::new())?;
        let receiver = model.this_reference(owner)?;
        let target = model.target_field(Some(receiver), value_field)?;
        let store_value = model.assignment(target, call)?;
        let store_value = model.expression_statement(store_value)?;

        // this.P$Init = true;
        let receiver = model.this_reference(owner)?;
        let target = model.target_field(Some(receiver), init_field)?;
        let initialized = model.constant(Constant::Bool(true))?;
        let store_init = model.assignment(target, initialized)?;
        let store_init = model.expression_statement(store_init)?;

        // if (!this.P$Init) { ... }
        let receiver = model.this_reference(owner)?;
        let read_init = model.bound_field(Some(receiver), init_field)?;
        let condition = model.new_expression(LogicalNot { operand: read_init }, TypeId::BOOLEAN)?;
        let fill = model.block(vec![store_value, store_init])?;
        let skip = model.new_statement(EmptyStatement::default())?;
        let check = model.new_statement(ConditionalStatement {
            condition,
            true_branch: fill,
            false_branch: skip,
        })?;

        // return this.P$Value;
        let receiver = model.this_reference(owner)?;
        let read_value = model.bound_field(Some(receiver), value_field)?;
        let ret = model.return_statement(Some(read_value))?;

        model.block(vec![check, ret])
    }
}

#[cfg(test)]
#[path = "lazy_property_tests.rs"]
mod tests;
