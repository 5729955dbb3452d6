//! Scripted endpoints with call counting

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tessera_quorum::{CallError, CallResult, Endpoint};
use thiserror::Error;

/// Recoverable connection failure reported by scripted endpoints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Connection to {0} refused")]
pub struct ConnectionError(pub String);

/// One step of an endpoint's scripted behavior
#[derive(Debug, Clone)]
pub enum CallScript<R> {
    /// Return this value
    Ok(R),

    /// Fail with a recoverable connection error
    Refuse,

    /// Fail with a non-recoverable error carrying this message
    Fatal(&'static str),

    /// Never return
    Hang,
}

/// An endpoint that plays back a fixed script, one step per call
///
/// The last step repeats once the script is exhausted, so a single-step
/// script describes a constant endpoint. Calls are counted for assertions
/// on how often the coordinator consulted this endpoint.
pub struct ScriptedEndpoint<R> {
    name: String,
    script: Vec<CallScript<R>>,
    calls: AtomicUsize,
}

impl<R> ScriptedEndpoint<R> {
    /// Create an endpoint playing back `script`
    pub fn new(name: impl Into<String>, script: Vec<CallScript<R>>) -> Arc<Self> {
        Arc::new(Self { name: name.into(), script, calls: AtomicUsize::new(0) })
    }

    /// An endpoint that always returns `value`
    pub fn ok(name: impl Into<String>, value: R) -> Arc<Self> {
        Self::new(name, vec![CallScript::Ok(value)])
    }

    /// An endpoint that always refuses the connection
    pub fn refusing(name: impl Into<String>) -> Arc<Self> {
        Self::new(name, vec![CallScript::Refuse])
    }

    /// An endpoint that always fails fatally
    pub fn fatal(name: impl Into<String>, message: &'static str) -> Arc<Self> {
        Self::new(name, vec![CallScript::Fatal(message)])
    }

    /// An endpoint that never returns
    pub fn hanging(name: impl Into<String>) -> Arc<Self> {
        Self::new(name, vec![CallScript::Hang])
    }

    /// How many times the coordinator called this endpoint
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<A, R> Endpoint<A, R, ConnectionError> for ScriptedEndpoint<R>
where
    A: Sync,
    R: Clone + Send + Sync,
{
    async fn call(&self, _argument: &A) -> CallResult<R, ConnectionError> {
        let step = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.get(step).or_else(|| self.script.last()) {
            Some(CallScript::Ok(value)) => Ok(value.clone()),
            Some(CallScript::Fatal(message)) => Err(CallError::fatal(*message)),
            Some(CallScript::Hang) => std::future::pending().await,
            Some(CallScript::Refuse) | None => {
                Err(CallError::recoverable(ConnectionError(self.name.clone())))
            },
        }
    }
}

/// Upcast scripted endpoints into the list shape `query` expects
pub fn into_endpoints<R>(
    endpoints: Vec<Arc<ScriptedEndpoint<R>>>,
) -> Vec<Arc<dyn Endpoint<(), R, ConnectionError>>>
where
    R: Clone + Send + Sync + 'static,
{
    endpoints
        .into_iter()
        .map(|endpoint| endpoint as Arc<dyn Endpoint<(), R, ConnectionError>>)
        .collect()
}
