use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::nes::bus::{BusEvent, TraceHook};

pub mod traceable;
pub use traceable::Traceable;

pub const DEFAULT_TRACE_CAPACITY: usize = 100_000;

pub static TRACER: Lazy<Mutex<Tracer>> = Lazy::new(|| Mutex::new(Tracer::new(DEFAULT_TRACE_CAPACITY)));

/// Bounded trace history. Oldest lines are dropped once `capacity` is reached.
pub struct Tracer {
    history: VecDeque<String>,
    capacity: usize,
}

impl Tracer {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity.min(DEFAULT_TRACE_CAPACITY)),
            capacity,
        }
    }

    pub fn write(&mut self, msg: String) {
        if self.capacity == 0 {
            return;
        }
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(msg);
    }

    pub fn record(&mut self, event: &BusEvent) {
        self.write(event.to_string());
    }

    pub fn log<T: Traceable>(&mut self, thing: &T) {
        if let Some(trace) = thing.trace() {
            self.write(trace);
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn print(&self) {
        for (i, line) in self.history.iter().enumerate() {
            println!("{:04}: {}", i, line);
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// Hook that records every bus access into the global [`TRACER`].
pub fn global_hook() -> TraceHook {
    Box::new(|event: &BusEvent| {
        if let Ok(mut tracer) = TRACER.lock() {
            tracer.record(event);
        }
    })
}

/// Hook that forwards every bus access to `log::trace!`.
pub fn log_hook() -> TraceHook {
    Box::new(|event: &BusEvent| log::trace!("{}", event))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nes::bus::{Access, Region};

    #[test]
    fn test_capacity_drops_oldest() {
        let mut tracer = Tracer::new(2);
        tracer.write("a".into());
        tracer.write("b".into());
        tracer.write("c".into());
        assert_eq!(tracer.lines().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut tracer = Tracer::new(0);
        tracer.write("a".into());
        assert!(tracer.is_empty());
    }

    #[test]
    fn test_record_formats_event() {
        let mut tracer = Tracer::new(4);
        tracer.record(&BusEvent {
            access: Access::Write,
            addr: 0x0805,
            region: Region::CpuRam,
            offset: 0x0005,
            value: 0xAB,
        });
        assert_eq!(tracer.len(), 1);
        let line = tracer.lines().next().unwrap();
        assert!(line.contains("$0805"), "{}", line);
        assert!(line.contains("$AB"), "{}", line);
    }
}
