use std::{cell::Cell, rc::Rc};

use element_source::{ElementSource, ElementSourceError, PendingSource, WithEstimatedSize};
use log::{info, trace};

fn capacity_hint(source: &impl WithEstimatedSize) -> usize {
    source.estimated_size()
}

fn main() -> Result<(), ElementSourceError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .format_line_number(true)
        .format_file(true)
        .init();
    info!("Starting demo");

    let producer_calls = Rc::new(Cell::new(0));
    let mut tasks = ElementSource::new();

    tasks.add("compile");
    let calls = Rc::clone(&producer_calls);
    tasks.add_pending(move || {
        calls.set(calls.get() + 1);
        ["link", "strip"]
    });
    tasks.add("package");

    tasks.on_realize(|realization, registrar| {
        trace!(
            "Entry {} realized to {:?}",
            realization.index(),
            realization.values()
        );
        if realization.values().contains(&"link") {
            registrar.add_pending(|| ["sign"]);
        }
    });

    info!(
        "Before flushing: {:?} (about {} tasks)",
        tasks.iter_no_flush().collect::<Vec<_>>(),
        capacity_hint(&tasks)
    );

    let all = tasks.iter()?.copied().collect::<Vec<_>>();
    info!("After flushing: {all:?}");

    tasks.realize_pending()?;
    info!(
        "Producer ran {} time(s), {} task(s) in total",
        producer_calls.get(),
        tasks.size()?
    );

    tasks.clear();
    info!(
        "After clearing: empty = {}",
        tasks.constant_time_is_empty()
    );
    Ok(())
}
