//! Capability interfaces for external collaborators.
//!
//! Steps, checks, gate validators and lifecycle hooks are supplied by the
//! host program. Whatever they do internally (spawn a process, call an
//! HTTP endpoint, mutate a context), the core only sees these traits.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Boxed future returned by closure-backed steps
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A unit of workflow work with optional compensation
#[async_trait]
pub trait Step<C>: Send + Sync {
    /// Human-readable step name (used in errors and logs)
    fn name(&self) -> &str {
        "step"
    }

    /// Run the step against the shared context
    async fn execute(&self, ctx: &mut C) -> Result<Value>;

    /// Action undoing the effects of a successful `execute`.
    ///
    /// Steps returning `None` are skipped during rollback.
    fn compensation(&self) -> Option<BoxFuture<'_, Result<()>>> {
        None
    }
}

/// Outcome reported by a quality check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Whether the check passed
    pub passed: bool,

    /// Arbitrary payload inspected by gates
    #[serde(default)]
    pub result: Value,
}

impl CheckOutcome {
    /// A passing outcome with the given payload
    pub fn pass(result: impl Into<Value>) -> Self {
        Self {
            passed: true,
            result: result.into(),
        }
    }

    /// A failing outcome with the given payload
    pub fn fail(result: impl Into<Value>) -> Self {
        Self {
            passed: false,
            result: result.into(),
        }
    }
}

/// A named quality probe
#[async_trait]
pub trait Check: Send + Sync {
    async fn run(&self) -> Result<CheckOutcome>;
}

#[async_trait]
impl<F, Fut> Check for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<CheckOutcome>> + Send,
{
    async fn run(&self) -> Result<CheckOutcome> {
        (self)().await
    }
}

/// Acceptance rule evaluated against a check's result payload.
///
/// `Ok(false)` and `Err(_)` both fail the gate; neither aborts evaluation
/// of the remaining gates.
pub trait GateValidator: Send + Sync {
    fn validate(&self, result: &Value) -> Result<bool>;
}

impl<F> GateValidator for F
where
    F: Fn(&Value) -> Result<bool> + Send + Sync,
{
    fn validate(&self, result: &Value) -> Result<bool> {
        (self)(result)
    }
}

/// Callback run on entering or exiting a stage
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self) -> Result<()>;
}

#[async_trait]
impl<F, Fut> Hook for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn call(&self) -> Result<()> {
        (self)().await
    }
}

type ExecuteFn<C> = Box<dyn for<'a> Fn(&'a mut C) -> BoxFuture<'a, Result<Value>> + Send + Sync>;
type RollbackFn = Box<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A step backed by a plain closure; never compensates
pub struct FnStep<C> {
    name: String,
    execute: ExecuteFn<C>,
}

impl<C> FnStep<C> {
    /// Wrap a closure as a step
    ///
    /// ```
    /// use aegis::adapters::FnStep;
    /// use serde_json::json;
    ///
    /// let step = FnStep::new("count", |ctx: &mut u32| {
    ///     Box::pin(async move {
    ///         *ctx += 1;
    ///         Ok(json!(*ctx))
    ///     })
    /// });
    /// # let _ = step;
    /// ```
    pub fn new<F>(name: impl Into<String>, execute: F) -> Self
    where
        F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, Result<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            execute: Box::new(execute),
        }
    }
}

#[async_trait]
impl<C: Send> Step<C> for FnStep<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut C) -> Result<Value> {
        (self.execute)(ctx).await
    }
}

/// A step with an explicit compensating action
pub struct CompensableStep<C> {
    name: String,
    execute: ExecuteFn<C>,
    rollback: RollbackFn,
}

impl<C> CompensableStep<C> {
    pub fn new<F, R>(name: impl Into<String>, execute: F, rollback: R) -> Self
    where
        F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, Result<Value>> + Send + Sync + 'static,
        R: Fn() -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            execute: Box::new(execute),
            rollback: Box::new(rollback),
        }
    }
}

#[async_trait]
impl<C: Send> Step<C> for CompensableStep<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut C) -> Result<Value> {
        (self.execute)(ctx).await
    }

    fn compensation(&self) -> Option<BoxFuture<'_, Result<()>>> {
        Some((self.rollback)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_step_mutates_context() {
        let step = FnStep::new("double", |ctx: &mut Vec<u32>| {
            Box::pin(async move {
                ctx.push(2);
                Ok(json!(ctx.len()))
            })
        });

        let mut ctx = vec![1];
        let result = step.execute(&mut ctx).await.unwrap();

        assert_eq!(step.name(), "double");
        assert!(step.compensation().is_none());
        assert_eq!(result, json!(2));
        assert_eq!(ctx, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_compensable_step_exposes_rollback() {
        let step = CompensableStep::new(
            "reserve",
            |_: &mut ()| Box::pin(async { Ok(Value::Null) }),
            || Box::pin(async { anyhow::bail!("already released") }),
        );

        let undo = step.compensation().unwrap();
        assert_eq!(undo.await.unwrap_err().to_string(), "already released");
    }

    #[tokio::test]
    async fn test_closure_check_and_gate() {
        let check = || async { anyhow::Ok(CheckOutcome::pass(json!({ "coverage": 92 }))) };
        let outcome = check.run().await.unwrap();
        assert!(outcome.passed);

        let gate = |r: &Value| -> Result<bool> { Ok(r["coverage"].as_u64().unwrap_or(0) >= 90) };
        assert!(gate.validate(&outcome.result).unwrap());
    }
}
