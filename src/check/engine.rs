use std::collections::VecDeque;

use tracing::trace;

type Deferred<'a, V> = Box<dyn FnOnce(&mut CheckerEngine<'a, V>) + 'a>;

/// Collects the violations of one check and runs its deferred comparisons.
///
/// Direct findings are reported as the checker walks the record. Anything
/// that needs a referenced record is queued with [`comparative_check`] and
/// evaluated by [`finish`] once the direct pass is over, in FIFO order.
/// Deferred closures may queue further work; it runs before `finish` returns.
///
/// [`comparative_check`]: CheckerEngine::comparative_check
/// [`finish`]: CheckerEngine::finish
pub struct CheckerEngine<'a, V> {
    violations: Vec<V>,
    deferred: VecDeque<Deferred<'a, V>>,
}

impl<'a, V> CheckerEngine<'a, V> {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            deferred: VecDeque::new(),
        }
    }

    /// Reports a violation immediately.
    pub fn report(&mut self, violation: V) {
        self.violations.push(violation);
    }

    /// Queues `check` to run against `other`, resolved by the caller now.
    pub fn comparative_check<R: 'a>(
        &mut self,
        other: R,
        check: impl FnOnce(R, &mut CheckerEngine<'a, V>) + 'a,
    ) {
        self.defer(move |engine| check(other, engine));
    }

    /// Queues arbitrary work for after the direct checks.
    pub fn defer(&mut self, work: impl FnOnce(&mut CheckerEngine<'a, V>) + 'a) {
        self.deferred.push_back(Box::new(work));
    }

    /// Runs every queued comparison and returns all violations in report order.
    pub fn finish(mut self) -> Vec<V> {
        let mut rounds = 0usize;
        while let Some(work) = self.deferred.pop_front() {
            work(&mut self);
            rounds += 1;
        }
        trace!(
            deferred = rounds,
            violations = self.violations.len(),
            "consistency.engine.finish"
        );
        self.violations
    }
}

impl<'a, V> Default for CheckerEngine<'a, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_checks_run_after_direct_reports_in_order() {
        let mut engine = CheckerEngine::new();
        engine.comparative_check(1, |value, engine| engine.report(value));
        engine.report(0);
        engine.comparative_check(2, |value, engine| {
            engine.comparative_check(value + 1, |value, engine| engine.report(value));
            engine.report(value);
        });
        engine.comparative_check(4, |value, engine| engine.report(value));
        assert_eq!(engine.finish(), vec![0, 1, 2, 4, 3]);
    }
}
