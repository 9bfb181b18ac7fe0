//! Statement nodes, switch cases and catch clauses

use crate::ids::{ExprId, LocalId, StmtId, TypeId};
use crate::location::Location;
use serde::{Deserialize, Serialize};

/// A statement node and its source tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub locations: Vec<Location>,
}

impl Statement {
    /// Creates an untagged statement
    pub fn new(kind: impl Into<StatementKind>) -> Self {
        Self {
            kind: kind.into(),
            locations: Vec::new(),
        }
    }

    /// Adds a source location tag
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }
}

/// Access to a concrete node struct through its [`StatementKind`] variant
pub trait StatementNode: Sized + Into<StatementKind> {
    /// Borrows the node if `kind` holds this node type
    fn from_kind(kind: &StatementKind) -> Option<&Self>;
    /// Mutably borrows the node if `kind` holds this node type
    fn from_kind_mut(kind: &mut StatementKind) -> Option<&mut Self>;
}

macro_rules! statement_kinds {
    ($($variant:ident($node:ident)),* $(,)?) => {
        /// Every statement node kind
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum StatementKind {
            $($variant($node),)*
        }

        /// Fieldless mirror of [`StatementKind`] used for dispatch
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatementTag {
            $($variant,)*
        }

        impl StatementKind {
            /// The kind's tag
            pub fn tag(&self) -> StatementTag {
                match self {
                    $(StatementKind::$variant(_) => StatementTag::$variant,)*
                }
            }

            /// The kind's name
            pub fn name(&self) -> &'static str {
                self.tag().name()
            }
        }

        impl StatementTag {
            /// The kind's name
            pub fn name(self) -> &'static str {
                match self {
                    $(StatementTag::$variant => stringify!($node),)*
                }
            }
        }

        $(
            impl From<$node> for StatementKind {
                fn from(node: $node) -> Self {
                    StatementKind::$variant(node)
                }
            }

            impl StatementNode for $node {
                fn from_kind(kind: &StatementKind) -> Option<&Self> {
                    match kind {
                        StatementKind::$variant(node) => Some(node),
                        _ => None,
                    }
                }

                fn from_kind_mut(kind: &mut StatementKind) -> Option<&mut Self> {
                    match kind {
                        StatementKind::$variant(node) => Some(node),
                        _ => None,
                    }
                }
            }
        )*
    };
}

statement_kinds! {
    Assert(AssertStatement),
    Assume(AssumeStatement),
    Block(BlockStatement),
    Break(BreakStatement),
    Conditional(ConditionalStatement),
    Continue(ContinueStatement),
    CopyMemory(CopyMemoryStatement),
    DebuggerBreak(DebuggerBreakStatement),
    DoUntil(DoUntilStatement),
    Empty(EmptyStatement),
    Expression(ExpressionStatement),
    FillMemory(FillMemoryStatement),
    ForEach(ForEachStatement),
    For(ForStatement),
    Goto(GotoStatement),
    GotoSwitchCase(GotoSwitchCaseStatement),
    Labeled(LabeledStatement),
    LocalDeclaration(LocalDeclarationStatement),
    Lock(LockStatement),
    Push(PushStatement),
    ResourceUse(ResourceUseStatement),
    Rethrow(RethrowStatement),
    Return(ReturnStatement),
    Switch(SwitchStatement),
    Throw(ThrowStatement),
    TryCatchFinally(TryCatchFinallyStatement),
    WhileDo(WhileDoStatement),
    YieldBreak(YieldBreakStatement),
    YieldReturn(YieldReturnStatement),
}

impl StatementKind {
    /// Loops carry loop contracts
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            StatementKind::DoUntil(_)
                | StatementKind::ForEach(_)
                | StatementKind::For(_)
                | StatementKind::WhileDo(_)
        )
    }
}

/// `assert(condition)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssertStatement {
    pub condition: ExprId,
    pub description: Option<ExprId>,
    pub has_been_verified: bool,
}

/// `assume(condition)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssumeStatement {
    pub condition: ExprId,
    pub description: Option<ExprId>,
}

/// `{ statements }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockStatement {
    pub statements: Vec<StmtId>,
    pub use_checked_arithmetic: bool,
}

impl BlockStatement {
    /// Block over the given statements
    pub fn new(statements: Vec<StmtId>) -> Self {
        Self {
            statements,
            use_checked_arithmetic: false,
        }
    }
}

/// `break`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BreakStatement;

/// `if (condition) true_branch else false_branch`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionalStatement {
    pub condition: ExprId,
    pub true_branch: StmtId,
    pub false_branch: StmtId,
}

/// `continue`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinueStatement;

/// Block memory copy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CopyMemoryStatement {
    pub target_address: ExprId,
    pub source_address: ExprId,
    pub number_of_bytes_to_copy: ExprId,
}

/// Debugger trap
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DebuggerBreakStatement;

/// `do body until (condition)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DoUntilStatement {
    pub body: StmtId,
    pub condition: ExprId,
}

/// `;`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmptyStatement {
    /// Marks the end of a block, not source text
    pub is_sentinel: bool,
}

/// An expression evaluated for its side effects
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expression: ExprId,
}

/// Block memory fill
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FillMemoryStatement {
    pub target_address: ExprId,
    pub fill_value: ExprId,
    pub number_of_bytes_to_fill: ExprId,
}

/// `foreach (variable in collection) body`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForEachStatement {
    /// Declared by the loop
    pub variable: LocalId,
    pub collection: ExprId,
    pub body: StmtId,
}

/// `for (initial; condition; incrementers) body`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForStatement {
    pub initial_statements: Vec<StmtId>,
    pub condition: ExprId,
    pub incrementers: Vec<StmtId>,
    pub body: StmtId,
}

/// `goto label`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GotoStatement {
    pub target_label: String,
}

/// `goto case value` or `goto default` when `target_case` is absent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GotoSwitchCaseStatement {
    pub target_case: Option<ExprId>,
}

/// `label: statement`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabeledStatement {
    pub label: String,
    pub statement: StmtId,
}

/// `T local = initial_value`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalDeclarationStatement {
    pub local_variable: LocalId,
    pub initial_value: Option<ExprId>,
}

/// `lock (guard) body`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LockStatement {
    pub guard: ExprId,
    pub body: StmtId,
}

/// Pushes a value on the evaluation stack
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PushStatement {
    pub value_to_push: ExprId,
}

/// `using (resource_acquisitions) body`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceUseStatement {
    pub resource_acquisitions: StmtId,
    pub body: StmtId,
}

/// `throw;`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RethrowStatement;

/// `return expression`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnStatement {
    pub expression: Option<ExprId>,
}

/// `switch (expression) { cases }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SwitchStatement {
    pub expression: ExprId,
    pub cases: Vec<SwitchCase>,
}

/// `throw exception`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThrowStatement {
    pub exception: ExprId,
}

/// `try { } catch { } finally { }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TryCatchFinallyStatement {
    pub try_body: StmtId,
    pub catch_clauses: Vec<CatchClause>,
    pub finally_body: Option<StmtId>,
    pub fault_body: Option<StmtId>,
}

/// `while (condition) body`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WhileDoStatement {
    pub condition: ExprId,
    pub body: StmtId,
}

/// `yield break`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YieldBreakStatement;

/// `yield return expression`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YieldReturnStatement {
    pub expression: ExprId,
}

/// One case of a [`SwitchStatement`]
///
/// The default case has no label expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SwitchCase {
    pub expression: Option<ExprId>,
    pub body: Vec<StmtId>,
    pub locations: Vec<Location>,
}

impl SwitchCase {
    /// `case expression:`
    pub fn new(expression: ExprId, body: Vec<StmtId>) -> Self {
        Self {
            expression: Some(expression),
            body,
            locations: Vec::new(),
        }
    }

    /// `default:`
    pub fn default_case(body: Vec<StmtId>) -> Self {
        Self {
            expression: None,
            body,
            locations: Vec::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.expression.is_none()
    }
}

/// One handler of a [`TryCatchFinallyStatement`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatchClause {
    pub exception_type: TypeId,
    /// Local receiving the exception, declared by the clause
    pub exception_container: Option<LocalId>,
    pub filter_condition: Option<ExprId>,
    pub body: StmtId,
    pub locations: Vec<Location>,
}
