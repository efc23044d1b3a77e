//! Deferred task queue with cancellation.
//!
//! Non-critical work (hit-feedback bursts, chance item drops, boss
//! evolution staging) is never performed inside the physics step that
//! triggers it; it is enqueued here and drained at the start of the next
//! step. Every task carries a cancellation token tied to its owning
//! entity, so teardown (pause, restart, entity death) cancels in bulk and
//! a stale task can never mutate a torn-down entity.
//!
//! Single-threaded by design: tokens are `Rc`-based and the queue is only
//! ever touched from the simulation call stack.

use std::cell::Cell;
use std::rc::Rc;

/// Read side of a cancellation flag, carried by a task.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Owner side of a cancellation flag. An entity holds one source for all
/// its in-flight tasks and cancels it on teardown.
#[derive(Clone, Debug, Default)]
pub struct CancelSource(Rc<Cell<bool>>);

impl CancelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a token sharing this source's flag.
    pub fn token(&self) -> CancelToken {
        CancelToken(self.0.clone())
    }

    /// Cancel every task holding a token from this source.
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// A pending deferred job against the simulation context `C`.
pub struct Task<C> {
    fire_at: f64,
    token: CancelToken,
    job: Box<dyn FnOnce(&mut C)>,
}

impl<C> Task<C> {
    /// Execute the job unless its token was cancelled after scheduling.
    pub fn run(self, ctx: &mut C) {
        if !self.token.is_cancelled() {
            (self.job)(ctx);
        }
    }
}

/// The single explicit queue for all deferred and delayed work.
///
/// Draining is two-phase: `drain_due` detaches the due tasks, then the
/// caller runs them against `&mut C` (which usually owns the queue).
/// Tasks scheduled while running land in the queue for the next drain,
/// which is exactly the "next callback invocation" suspension model.
pub struct TaskQueue<C> {
    tasks: Vec<Task<C>>,
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TaskQueue<C> {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Schedule a job to fire once `now >= fire_at` (sim seconds).
    pub fn schedule(&mut self, fire_at: f64, token: CancelToken, job: impl FnOnce(&mut C) + 'static) {
        self.tasks.push(Task {
            fire_at,
            token,
            job: Box::new(job),
        });
    }

    /// Enqueue a job for the next drain.
    pub fn defer(&mut self, token: CancelToken, job: impl FnOnce(&mut C) + 'static) {
        self.schedule(f64::MIN, token, job);
    }

    /// Detach every task that is due (or already cancelled — those are
    /// discarded here so the queue cannot accumulate stale entries).
    /// Returned tasks are ordered by fire time.
    pub fn drain_due(&mut self, now: f64) -> Vec<Task<C>> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].token.is_cancelled() {
                drop(self.tasks.swap_remove(i));
            } else if self.tasks[i].fire_at <= now {
                due.push(self.tasks.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at));
        due
    }

    /// Drop every pending task regardless of token. Used on pause/restart.
    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_task_fires_on_next_drain() {
        let mut queue: TaskQueue<u32> = TaskQueue::new();
        queue.defer(CancelToken::default(), |n| *n += 1);
        let mut ctx = 0u32;
        for task in queue.drain_due(0.0) {
            task.run(&mut ctx);
        }
        assert_eq!(ctx, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn delayed_task_waits_for_fire_time() {
        let mut queue: TaskQueue<u32> = TaskQueue::new();
        queue.schedule(1.0, CancelToken::default(), |n| *n += 1);
        assert!(queue.drain_due(0.5).is_empty());
        assert_eq!(queue.drain_due(1.0).len(), 1);
    }

    #[test]
    fn cancelled_task_never_runs() {
        let mut queue: TaskQueue<u32> = TaskQueue::new();
        let source = CancelSource::new();
        queue.schedule(0.0, source.token(), |n| *n += 1);
        source.cancel();
        let mut ctx = 0u32;
        for task in queue.drain_due(10.0) {
            task.run(&mut ctx);
        }
        assert_eq!(ctx, 0);
    }

    #[test]
    fn cancel_after_drain_still_blocks_execution() {
        let mut queue: TaskQueue<u32> = TaskQueue::new();
        let source = CancelSource::new();
        queue.schedule(0.0, source.token(), |n| *n += 1);
        let due = queue.drain_due(1.0);
        source.cancel();
        let mut ctx = 0u32;
        for task in due {
            task.run(&mut ctx);
        }
        assert_eq!(ctx, 0);
    }

    #[test]
    fn cancel_all_empties_the_queue() {
        let mut queue: TaskQueue<u32> = TaskQueue::new();
        queue.defer(CancelToken::default(), |_| {});
        queue.schedule(5.0, CancelToken::default(), |_| {});
        queue.cancel_all();
        assert!(queue.is_empty());
    }

    #[test]
    fn due_tasks_come_out_in_fire_order() {
        let mut queue: TaskQueue<Vec<u32>> = TaskQueue::new();
        queue.schedule(2.0, CancelToken::default(), |v| v.push(2));
        queue.schedule(1.0, CancelToken::default(), |v| v.push(1));
        let mut ctx = Vec::new();
        for task in queue.drain_due(3.0) {
            task.run(&mut ctx);
        }
        assert_eq!(ctx, vec![1, 2]);
    }

    #[test]
    fn tasks_scheduled_while_running_wait_for_next_drain() {
        struct Ctx {
            queue: TaskQueue<Ctx>,
            hits: u32,
        }
        let mut ctx = Ctx {
            queue: TaskQueue::new(),
            hits: 0,
        };
        ctx.queue.defer(CancelToken::default(), |c: &mut Ctx| {
            c.hits += 1;
            c.queue.defer(CancelToken::default(), |c| c.hits += 10);
        });
        let due = ctx.queue.drain_due(0.0);
        for task in due {
            task.run(&mut ctx);
        }
        assert_eq!(ctx.hits, 1);
        let due = ctx.queue.drain_due(0.0);
        for task in due {
            task.run(&mut ctx);
        }
        assert_eq!(ctx.hits, 11);
    }
}
