use std::marker::PhantomData;

use super::error::StageError;

/// One transformation stage of a [`Flow`](super::Flow)
pub trait Pipe<I, O>: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn execute(&self, input: I) -> Result<O, StageError>;
}

/// Closure-backed stage, built with [`pipe_fn`]
pub struct FnPipe<I, O, F> {
    name: String,
    f: F,
    _marker: PhantomData<fn(I) -> O>,
}

/// Adapt a closure into a named stage
pub fn pipe_fn<I, O, F>(name: impl Into<String>, f: F) -> FnPipe<I, O, F>
where
    F: Fn(I) -> Result<O, StageError> + Send + Sync,
{
    FnPipe {
        name: name.into(),
        f,
        _marker: PhantomData,
    }
}

impl<I, O, F> Pipe<I, O> for FnPipe<I, O, F>
where
    F: Fn(I) -> Result<O, StageError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, input: I) -> Result<O, StageError> {
        (self.f)(input)
    }
}

/// Tags failures with the stage name
pub(crate) struct Stage<I, O> {
    inner: Box<dyn Pipe<I, O>>,
}

impl<I: 'static, O: 'static> Stage<I, O> {
    pub(crate) fn new(pipe: impl Pipe<I, O> + 'static) -> Self {
        Self {
            inner: Box::new(pipe),
        }
    }
}

impl<I, O> Pipe<I, O> for Stage<I, O> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn execute(&self, input: I) -> Result<O, StageError> {
        self.inner
            .execute(input)
            .map_err(|e| e.in_stage(self.inner.name()))
    }
}

/// Two stages run back to back
pub(crate) struct Chain<I, M, O> {
    name: String,
    first: Box<dyn Pipe<I, M>>,
    second: Box<dyn Pipe<M, O>>,
}

impl<I: 'static, M: 'static, O: 'static> Chain<I, M, O> {
    pub(crate) fn new(first: Box<dyn Pipe<I, M>>, second: Box<dyn Pipe<M, O>>) -> Self {
        Self {
            name: format!("{} -> {}", first.name(), second.name()),
            first,
            second,
        }
    }
}

impl<I, M, O> Pipe<I, O> for Chain<I, M, O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, input: I) -> Result<O, StageError> {
        let intermediate = self.first.execute(input)?;
        self.second.execute(intermediate)
    }
}
