//! Configuration for mutators, lazy bodies and the lazy property rewrite

/// Which parts of a unit a mutator may change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationScope {
    /// Code and the metadata it references
    WholeUnit,
    /// Code only; field, method and type references pass through untouched
    MethodBodiesOnly,
}

/// Mutator configuration
#[derive(Debug, Clone)]
pub struct MutatorConfig {
    /// Mutate nodes in place unless they are frozen. When off, every
    /// visited node is replaced by a fresh copy.
    pub copy_only_if_not_already_mutable: bool,
    /// What the mutator may touch
    pub scope: MutationScope,
    /// Drop statements a hook replaced with the dummy block
    pub remove_dummy_statements: bool,
}

impl MutatorConfig {
    /// Mutate unfrozen nodes in place
    pub fn in_place() -> Self {
        Self {
            copy_only_if_not_already_mutable: true,
            scope: MutationScope::WholeUnit,
            remove_dummy_statements: true,
        }
    }

    /// Produce a fresh tree, leaving the input untouched
    pub fn copy_on_write() -> Self {
        Self {
            copy_only_if_not_already_mutable: false,
            ..Self::in_place()
        }
    }

    /// In-place mutation of code only
    pub fn method_bodies_only() -> Self {
        Self {
            scope: MutationScope::MethodBodiesOnly,
            ..Self::in_place()
        }
    }
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self::in_place()
    }
}

/// Initial flags of a lazily generated method body
#[derive(Debug, Clone)]
pub struct BodyOptions {
    /// Locals start zero-initialized
    pub locals_are_zeroed: bool,
    /// Ask the converter to record expression-level source locations
    pub track_expression_source_locations: bool,
    /// The block is known to contain no closures or iterator code
    pub is_normalized: bool,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            locals_are_zeroed: true,
            track_expression_source_locations: false,
            is_normalized: false,
        }
    }
}

/// Naming used by the lazy property rewrite
#[derive(Debug, Clone)]
pub struct LazyPropertyConfig {
    /// Simple name of the marker attribute type
    pub marker_attribute: String,
    /// Suffix of the cached value field
    pub value_field_suffix: String,
    /// Suffix of the initialized flag field
    pub init_field_suffix: String,
    /// Accessor prefix stripped from the getter name when naming the copy
    pub getter_prefix: String,
    /// The copied original getter of `P` is named `Get` + `P` + this suffix
    pub uncached_method_suffix: String,
}

impl Default for LazyPropertyConfig {
    fn default() -> Self {
        Self {
            marker_attribute: "LazyAttribute".to_string(),
            value_field_suffix: "$Value".to_string(),
            init_field_suffix: "$Init".to_string(),
            getter_prefix: "get_".to_string(),
            uncached_method_suffix: "Uncached".to_string(),
        }
    }
}
