//! Method bodies that generate their operations on first use
//!
//! A [`SourceMethodBody`] holds a statement tree. The first call to any of
//! the instruction accessors converts the tree, caches the result and hands
//! it out to every later caller. Installing a new block discards the cache.
//!
//! Generation takes the body's lock for its whole duration, so concurrent
//! first callers wait for one conversion instead of racing. A failed
//! conversion leaves the body ungenerated and the next call retries.
//!
//! Trees containing anonymous delegates or yield statements cannot be
//! converted directly. They are copied into a scratch model, rewritten by
//! the configured [`ClosureRemover`](crate::ClosureRemover) and
//! [`IteratorDecomposer`](crate::IteratorDecomposer), and then converted.
//! The caller's model and block are never modified.

use crate::config::BodyOptions;
use crate::copier::DeepCopier;
use crate::normalize::NormalizationChecker;
use crate::services::{
    BodyServices, ConversionRequest, ExceptionInformation, GeneratedBody, LocalScope,
    NamespaceScope, Operation,
};
use codemodel_core::{
    CodeModel, Error, LocalId, MethodBody, MethodId, NodeRef, Result, StmtId, TypeId,
};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

enum GenerationState {
    Pending,
    Ready(Arc<GeneratedBody>),
}

struct BodyInner {
    block: StmtId,
    options: BodyOptions,
    state: GenerationState,
}

/// A tree body with lazily generated operations
pub struct SourceMethodBody {
    method: MethodId,
    services: Arc<BodyServices>,
    inner: Mutex<BodyInner>,
}

impl SourceMethodBody {
    /// Body of `method` holding `block`
    pub fn new(method: MethodId, services: Arc<BodyServices>, block: StmtId) -> Self {
        Self {
            method,
            services,
            inner: Mutex::new(BodyInner {
                block,
                options: BodyOptions::default(),
                state: GenerationState::Pending,
            }),
        }
    }

    /// Body of `method` whose block has not been set yet
    pub fn empty(method: MethodId, services: Arc<BodyServices>) -> Self {
        Self::new(method, services, StmtId::DUMMY_BLOCK)
    }

    pub fn with_options(self, options: BodyOptions) -> Self {
        self.inner.lock().options = options;
        self
    }

    pub fn options(&self) -> BodyOptions {
        self.inner.lock().options.clone()
    }

    /// Replaces the options. Anything generated under the old ones is discarded.
    pub fn set_options(&self, options: BodyOptions) {
        let mut inner = self.inner.lock();
        inner.options = options;
        inner.state = GenerationState::Pending;
    }

    pub fn locals_are_zeroed(&self) -> bool {
        self.inner.lock().options.locals_are_zeroed
    }

    pub fn is_normalized(&self) -> bool {
        self.inner.lock().options.is_normalized
    }

    /// Whether operations are currently cached
    pub fn is_generated(&self) -> bool {
        matches!(self.inner.lock().state, GenerationState::Ready(_))
    }

    /// The generated body, converting the block on first use
    ///
    /// `model` must be the model the block lives in. The converter must not
    /// call back into this body.
    pub fn generated(&self, model: &CodeModel) -> Result<Arc<GeneratedBody>> {
        let mut inner = self.inner.lock();
        if let GenerationState::Ready(generated) = &inner.state {
            return Ok(Arc::clone(generated));
        }
        let generated = Arc::new(self.generate(model, inner.block, &inner.options)?);
        inner.state = GenerationState::Ready(Arc::clone(&generated));
        Ok(generated)
    }

    pub fn operations(&self, model: &CodeModel) -> Result<Vec<Operation>> {
        Ok(self.generated(model)?.operations.clone())
    }

    pub fn local_variables(&self, model: &CodeModel) -> Result<Vec<LocalId>> {
        Ok(self.generated(model)?.local_variables.clone())
    }

    pub fn max_stack(&self, model: &CodeModel) -> Result<u16> {
        Ok(self.generated(model)?.max_stack)
    }

    pub fn local_scopes(&self, model: &CodeModel) -> Result<Vec<LocalScope>> {
        Ok(self.generated(model)?.local_scopes.clone())
    }

    pub fn iterator_scopes(&self, model: &CodeModel) -> Result<Vec<LocalScope>> {
        Ok(self.generated(model)?.iterator_scopes.clone())
    }

    pub fn namespace_scopes(&self, model: &CodeModel) -> Result<Vec<NamespaceScope>> {
        Ok(self.generated(model)?.namespace_scopes.clone())
    }

    pub fn exception_information(&self, model: &CodeModel) -> Result<Vec<ExceptionInformation>> {
        Ok(self.generated(model)?.exception_information.clone())
    }

    pub fn private_helper_types(&self, model: &CodeModel) -> Result<Vec<TypeId>> {
        Ok(self.generated(model)?.private_helper_types.clone())
    }

    pub fn size(&self, model: &CodeModel) -> Result<u32> {
        Ok(self.generated(model)?.size)
    }

    fn method_name(&self, model: &CodeModel) -> String {
        model
            .try_method(self.method)
            .map(|definition| definition.name.clone())
            .unwrap_or_else(|| self.method.to_string())
    }

    fn generate(
        &self,
        model: &CodeModel,
        block: StmtId,
        options: &BodyOptions,
    ) -> Result<GeneratedBody> {
        let checker = if options.is_normalized {
            NormalizationChecker::default()
        } else {
            NormalizationChecker::check(model, NodeRef::Statement(block))
        };
        let locations = self.services.location_provider.as_deref();

        if checker.is_normalized() {
            debug!("Converting body of {} directly", self.method);
            return Ok(self.services.converter.convert(ConversionRequest {
                model,
                method: self.method,
                block,
                options,
                locations,
            })?);
        }

        let closure_remover = match &self.services.closure_remover {
            Some(remover) => Some(remover),
            None if checker.has_anonymous_delegates => {
                return Err(Error::MissingNormalizer {
                    method: self.method_name(model),
                    service: "closure remover",
                })
            }
            None => None,
        };
        let iterator_decomposer = match &self.services.iterator_decomposer {
            Some(decomposer) => Some(decomposer),
            None if checker.has_yield_statements => {
                return Err(Error::MissingNormalizer {
                    method: self.method_name(model),
                    service: "iterator decomposer",
                })
            }
            None => None,
        };

        debug!(
            "Normalizing body of {} (closures: {}, yields: {})",
            self.method, checker.has_anonymous_delegates, checker.has_yield_statements
        );
        let mut scratch = model.clone();
        let block = DeepCopier::new(&mut scratch).copy_block(block)?;
        let mut helper_types = Vec::new();
        if let (true, Some(remover)) = (checker.has_anonymous_delegates, closure_remover) {
            let introduced = remover.remove_anonymous_delegates(&mut scratch, self.method, block)?;
            helper_types.extend(introduced);
        }
        if let (true, Some(decomposer)) = (checker.has_yield_statements, iterator_decomposer) {
            helper_types.extend(decomposer.decompose_iterator(&mut scratch, self.method, block)?);
        }
        trace!("Normalization introduced {} helper types", helper_types.len());

        let normalized = BodyOptions {
            is_normalized: true,
            ..options.clone()
        };
        let mut generated = self.services.converter.convert(ConversionRequest {
            model: &scratch,
            method: self.method,
            block,
            options: &normalized,
            locations,
        })?;
        helper_types.append(&mut generated.private_helper_types);
        generated.private_helper_types = helper_types;
        generated.normalized_model = Some(Arc::new(scratch));
        Ok(generated)
    }
}

impl fmt::Debug for SourceMethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SourceMethodBody")
            .field("method", &self.method)
            .field("block", &inner.block)
            .field("options", &inner.options)
            .field(
                "generated",
                &matches!(inner.state, GenerationState::Ready(_)),
            )
            .finish()
    }
}

impl MethodBody for SourceMethodBody {
    fn method_definition(&self) -> MethodId {
        self.method
    }

    fn block(&self) -> StmtId {
        self.inner.lock().block
    }

    fn set_block(&self, block: StmtId) {
        let mut inner = self.inner.lock();
        trace!("Installing block {} in body of {}", block, self.method);
        inner.block = block;
        inner.state = GenerationState::Pending;
    }

    fn with_block(&self, method: MethodId, block: StmtId) -> Arc<dyn MethodBody> {
        Arc::new(
            SourceMethodBody::new(method, Arc::clone(&self.services), block)
                .with_options(self.options()),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "lazy_body_tests.rs"]
mod tests;
