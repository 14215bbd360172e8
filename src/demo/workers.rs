use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use ansi_term::Colour;
use anyhow::{anyhow, Result};
use clap::Args;

use round_robin::CyclicQueue;

const PALETTE: [Colour; 6] = [
    Colour::Cyan,
    Colour::Green,
    Colour::Yellow,
    Colour::Purple,
    Colour::Blue,
    Colour::Red,
];

#[derive(Args, Debug)]
pub struct WorkersArgs {
    /// Worker threads sharing the queue
    #[arg(long, default_value_t = 3)]
    pub workers: usize,

    /// Tasks queued before the workers start
    #[arg(long, default_value_t = 5)]
    pub tasks: usize,

    /// Tasks added while the workers run
    #[arg(long, default_value_t = 5)]
    pub dynamic: usize,

    /// Units of work each task needs before it is done
    #[arg(long, default_value_t = 3)]
    pub units: u32,

    /// Milliseconds spent on one unit of work
    #[arg(long, default_value_t = 20)]
    pub work_ms: u64,
}

#[derive(Debug)]
struct Task {
    name: String,
    remaining: u32,
}

type SharedQueue = Arc<Mutex<CyclicQueue<Task>>>;

fn lock(queue: &SharedQueue) -> Result<MutexGuard<CyclicQueue<Task>>> {
    queue.lock().map_err(|_| anyhow!("task queue lock poisoned"))
}

/// Checks out the next task, spends one unit on it and drops it when done.
/// The lock is held across fetch and removal so no other worker can move
/// the checkout in between.
fn step(queue: &SharedQueue) -> Result<Option<(String, bool)>> {
    let mut queue = lock(queue)?;

    let (name, done) = match queue.fetch() {
        Some(task) => {
            task.remaining = task.remaining.saturating_sub(1);
            (task.name.clone(), task.remaining == 0)
        }
        None => return Ok(None),
    };

    if done {
        queue.remove_current()?;
    }

    Ok(Some((name, done)))
}

fn worker(id: usize, queue: SharedQueue, stop: Arc<AtomicBool>, work: Duration) -> Result<usize> {
    let label = PALETTE[id % PALETTE.len()].paint(format!("worker {}", id + 1));
    let mut units = 0;

    while !stop.load(Ordering::SeqCst) {
        match step(&queue)? {
            Some((name, done)) => {
                units += 1;
                if done {
                    info!("{} finished: {}", label, name);
                } else {
                    info!("{} processing: {}", label, name);
                }
                thread::sleep(work);
            }
            None => thread::sleep(work / 2),
        }
    }

    Ok(units)
}

pub fn run(args: &WorkersArgs) -> Result<()> {
    if args.workers == 0 {
        return Err(anyhow!("at least one worker is required"));
    }

    let units = args.units.max(1);
    let work = Duration::from_millis(args.work_ms);
    let queue: SharedQueue = Arc::new(Mutex::new(CyclicQueue::with_capacity(
        args.tasks + args.dynamic,
    )));

    {
        let mut queue = lock(&queue)?;
        for i in 0..args.tasks {
            queue.add(Task {
                name: format!("Task {}", i + 1),
                remaining: units,
            });
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    info!("Starting {} workers on {} tasks", args.workers, args.tasks);

    let handles: Vec<_> = (0..args.workers)
        .map(|id| {
            let queue = queue.clone();
            let stop = stop.clone();
            thread::spawn(move || worker(id, queue, stop, work))
        })
        .collect();

    for i in 0..args.dynamic {
        thread::sleep(work * 2);
        let name = format!("Dynamic Task {}", i + 1);
        info!("Adding new task: {}", name);
        lock(&queue)?.add(Task {
            name: name,
            remaining: units,
        });
    }

    while !lock(&queue)?.is_empty() {
        thread::sleep(work);
    }
    stop.store(true, Ordering::SeqCst);

    let mut total = 0;
    for (id, handle) in handles.into_iter().enumerate() {
        let done = handle
            .join()
            .map_err(|_| anyhow!("worker {} panicked", id + 1))??;
        info!("Worker {} did {} units of work", id + 1, done);
        total += done;
    }

    let expected = (args.tasks + args.dynamic) * units as usize;
    if total != expected {
        warn!("Expected {} units of work, counted {}", expected, total);
    }
    info!("All workers finished");

    Ok(())
}
