/// Data access boundary
///
/// The planner produces [`Statement`]s and hands them to a session supplied by
/// the caller for the duration of one query. Sessions come in two flavours:
/// [`Session`] blocks the calling thread, [`AsyncSession`] suspends.

mod datafusion_session;
mod memory;
mod statement;
mod value;

pub use datafusion_session::{record_batch_row, DataFusionSession};
pub use memory::MemorySession;
pub use statement::{FilterOp, Literal, Order, Predicate, Statement};
pub use value::{EnumValue, Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Blocking executor
pub trait Session: Send + Sync {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>>;
}

/// Suspending executor
#[async_trait]
pub trait AsyncSession: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<Vec<Row>>;
}

/// The session of one query execution, tagged with its execution mode
#[derive(Clone)]
pub enum SessionHandle {
    Blocking(Arc<dyn Session>),
    Suspending(Arc<dyn AsyncSession>),
}

impl SessionHandle {
    pub async fn execute(&self, statement: &Statement) -> Result<Vec<Row>> {
        tracing::debug!("Executing statement: {}", statement);
        match self {
            SessionHandle::Blocking(session) => session.execute(statement),
            SessionHandle::Suspending(session) => session.execute(statement).await,
        }
    }
}
