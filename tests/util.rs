#![allow(dead_code)]

use std::{cell::Cell, rc::Rc};

use element_source::BoxError;

pub fn log() {
    let _ = env_logger::builder()
        .format_file(true)
        .format_target(false)
        .format_level(false)
        .format_timestamp_millis()
        .format_line_number(true)
        .filter_level(log::LevelFilter::Trace)
        .format_module_path(false)
        .try_init();
}

/// Counts how often the producers it hands out are invoked.
#[derive(Clone, Default)]
pub struct Calls(Rc<Cell<usize>>);

impl Calls {
    pub fn count(&self) -> usize {
        self.0.get()
    }

    pub fn producer<T: 'static>(&self, values: Vec<T>) -> impl FnOnce() -> Vec<T> + use<T> {
        let calls = Rc::clone(&self.0);
        move || {
            calls.set(calls.get() + 1);
            values
        }
    }

    pub fn failing<T: 'static>(
        &self,
        message: &'static str,
    ) -> impl FnOnce() -> Result<Vec<T>, BoxError> + use<T> {
        let calls = Rc::clone(&self.0);
        move || {
            calls.set(calls.get() + 1);
            Err(message.into())
        }
    }
}
