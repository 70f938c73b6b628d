use std::{
    collections::VecDeque,
    sync::Mutex,
};

use chrono::{
    DateTime,
    Utc,
};

/// Source of wall-clock time for timestamping and window selection.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl Clock for Utc {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<T> Clock for &T
where
    T: Clock + ?Sized,
{
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Replays a fixed sequence of instants. Once exhausted, keeps returning the last one.
#[derive(Debug)]
pub struct ScriptedClock {
    inner: Mutex<Script>,
}

#[derive(Debug)]
struct Script {
    queue: VecDeque<DateTime<Utc>>,
    last:  DateTime<Utc>,
}

impl ScriptedClock {
    pub fn new(instants: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        let queue = instants.into_iter().collect::<VecDeque<_>>();
        let last = queue.front().copied().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        Self {
            inner: Mutex::new(Script {
                queue,
                last,
            }),
        }
    }

    pub fn push(&self, instant: DateTime<Utc>) {
        self.script().queue.push_back(instant);
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        // a panic while holding the lock cannot leave the queue half-updated
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> DateTime<Utc> {
        let mut script = self.script();

        if let Some(next) = script.queue.pop_front() {
            script.last = next;
        }

        script.last
    }
}
