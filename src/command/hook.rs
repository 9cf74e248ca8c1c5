//! Pipeline steps.
//!
//! A command's pipeline is a list of [`Hook`]s run in order, each turning the
//! current data into the next. The terminal handler is just the last hook.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::context::Context;
use crate::error::CommandError;

/// One step of a command pipeline.
#[async_trait]
pub trait Hook: Send + Sync + 'static {
    async fn call(&self, ctx: &mut Context, data: Value) -> Result<Value, CommandError>;
}

/// A synchronous closure step. Build with [`hook_fn`].
pub struct FnHook<F>(F);

/// Wrap a synchronous closure as a hook.
///
/// ```ignore
/// let stamp = hook_fn(|ctx, mut data| {
///     data["owner"] = json!(ctx.user_id()?);
///     Ok(data)
/// });
/// ```
pub fn hook_fn<F>(f: F) -> FnHook<F>
where
    F: Fn(&mut Context, Value) -> Result<Value, CommandError> + Send + Sync + 'static,
{
    FnHook(f)
}

#[async_trait]
impl<F> Hook for FnHook<F>
where
    F: Fn(&mut Context, Value) -> Result<Value, CommandError> + Send + Sync + 'static,
{
    async fn call(&self, ctx: &mut Context, data: Value) -> Result<Value, CommandError> {
        (self.0)(ctx, data)
    }
}

/// An async closure step. The closure receives a clone of the context.
pub struct AsyncHook<F>(F);

pub fn hook_async<F, Fut>(f: F) -> AsyncHook<F>
where
    F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, CommandError>> + Send + 'static,
{
    AsyncHook(f)
}

#[async_trait]
impl<F, Fut> Hook for AsyncHook<F>
where
    F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, CommandError>> + Send + 'static,
{
    async fn call(&self, ctx: &mut Context, data: Value) -> Result<Value, CommandError> {
        (self.0)(ctx.clone(), data).await
    }
}

/// A typed async handler: decodes the input into `I` and encodes the `O` it
/// returns.
pub struct TypedHandler<F, I, O> {
    handler: F,
    _types: PhantomData<fn(I) -> O>,
}

pub fn typed<F, Fut, I, O>(handler: F) -> TypedHandler<F, I, O>
where
    F: Fn(Context, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, CommandError>> + Send + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    TypedHandler {
        handler,
        _types: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, I, O> Hook for TypedHandler<F, I, O>
where
    F: Fn(Context, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, CommandError>> + Send + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    async fn call(&self, ctx: &mut Context, data: Value) -> Result<Value, CommandError> {
        let input = ctx.decode::<I>(data)?;
        let output = (self.handler)(ctx.clone(), input).await?;
        serde_json::to_value(output)
            .map_err(|e| CommandError::general(format!("failed to encode output: {}", e)))
    }
}
