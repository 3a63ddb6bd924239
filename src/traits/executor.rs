/// A unit of work handed to a [`TaskExecutor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Generic task executor.
///
/// An executor accepts a unit of work and runs it, inline, on a pool, or on a
/// thread owned by some device driver. Callers must not assume the task runs on
/// the calling thread, nor that it has finished when `run` returns.
pub trait TaskExecutor: Send + Sync {
    fn run(&self, task: Task);

    fn name(&self) -> &'static str;
}
