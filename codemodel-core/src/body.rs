//! Method bodies attached to the model

use crate::ids::{MethodId, StmtId};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A method body holding a statement tree
///
/// Bodies are shared (`Arc`) and mutated through `&self`, so implementations
/// guard their state internally.
pub trait MethodBody: Send + Sync + fmt::Debug {
    /// The method this body belongs to
    fn method_definition(&self) -> MethodId;

    /// Root block. [`StmtId::DUMMY_BLOCK`] until a block is installed.
    fn block(&self) -> StmtId;

    /// Installs a new root block, discarding anything derived from the old one
    fn set_block(&self, block: StmtId);

    /// A new body of the same flavor for `method`, holding `block`
    fn with_block(&self, method: MethodId, block: StmtId) -> Arc<dyn MethodBody>;

    fn as_any(&self) -> &dyn Any;
}

/// A body that is nothing but its tree
pub struct BlockBody {
    method: MethodId,
    block: RwLock<StmtId>,
}

impl BlockBody {
    /// Body of `method` holding `block`
    pub fn new(method: MethodId, block: StmtId) -> Self {
        Self {
            method,
            block: RwLock::new(block),
        }
    }
}

impl fmt::Debug for BlockBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockBody")
            .field("method", &self.method)
            .field("block", &*self.block.read())
            .finish()
    }
}

impl MethodBody for BlockBody {
    fn method_definition(&self) -> MethodId {
        self.method
    }

    fn block(&self) -> StmtId {
        *self.block.read()
    }

    fn set_block(&self, block: StmtId) {
        *self.block.write() = block;
    }

    fn with_block(&self, method: MethodId, block: StmtId) -> Arc<dyn MethodBody> {
        Arc::new(BlockBody::new(method, block))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
