//! `WorkerPool`: drains one or more queues concurrently through the task
//! executor.
//!
//! Built on `rayon` rather than an async runtime, since the pool itself
//! does no I/O multiplexing of its own, only CPU-bound chain execution, so
//! a work-stealing thread pool fits more directly than a tokio task set
//! would. Events flow out over a plain `std::sync::mpsc` channel: many
//! rayon worker threads act as producers, and the single `Receiver` side
//! is the one consumer. Cancellation is a shared `AtomicBool` polled by
//! `Task` between tool steps, not a rayon-level abort, since rayon has no
//! built-in task cancellation primitive.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use bqm_core::{FileOps, SidecarHelper};
use bqm_queue::Queue;
use bqm_registry::ToolRegistry;
use bqm_task::{Task, TaskOutcome};
use rayon::prelude::*;

use crate::event::PoolEvent;

pub struct WorkerPool {
    registry: Arc<ToolRegistry>,
    sidecar: Arc<dyn SidecarHelper>,
    file_ops: Arc<dyn FileOps>,
    cancel: Arc<AtomicBool>,
    /// One handle per `process_queues` call still running. `cancel_all`
    /// joins every handle here before returning, so the pool only reports
    /// itself canceled once every worker has actually parked.
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(registry: Arc<ToolRegistry>, sidecar: Arc<dyn SidecarHelper>, file_ops: Arc<dyn FileOps>) -> Self {
        WorkerPool {
            registry,
            sidecar,
            file_ops,
            cancel: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// A clone of the cancellation flag a caller can flip to ask every
    /// in-flight and future task in this pool to stop at its next
    /// between-tool check.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Flips the shared cancellation flag, then blocks until every
    /// `process_queues` worker thread has finished, so the call only
    /// returns once all workers have parked.
    pub fn cancel_all(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        let mut handles = self.handles.lock().unwrap();
        for handle in handles.drain(..) {
            let _ = handle.join();
        }
    }

    /// Processes each queue to completion, in order, before moving to the
    /// next. Within one queue, items run concurrently (or serially, if
    /// `QueueSettings::use_multi_core_cpu` is false) with no ordering
    /// guarantee between `Starting`/`Finished` events for different items.
    /// `AllDone` is sent only after the last queue's `QueueProcessed`.
    pub fn process_queues(&self, queues: Vec<Queue>, working_dir: PathBuf) -> mpsc::Receiver<PoolEvent> {
        let (tx, rx) = mpsc::channel();
        let registry = self.registry.clone();
        let sidecar = self.sidecar.clone();
        let file_ops = self.file_ops.clone();
        let cancel = self.cancel.clone();

        let handle = std::thread::spawn(move || {
            for queue in queues {
                let items: Vec<_> = queue.pending_items().cloned().collect();
                let thread_pool = build_thread_pool(queue.settings.use_multi_core_cpu);
                let tx = tx.clone();

                thread_pool.install(|| {
                    items.par_iter().for_each(|assignment| {
                        let _ = tx.send(PoolEvent::Starting { item: assignment.item_url.clone() });

                        let task = Task {
                            queue_settings: &queue.settings,
                            registry: registry.as_ref(),
                            sidecar: sidecar.as_ref(),
                            file_ops: file_ops.as_ref(),
                            cancel: cancel.as_ref(),
                        };

                        let item = assignment.item_url.clone();
                        let tx_progress = tx.clone();
                        let item_for_progress = item.clone();
                        let result = task.run(assignment, &working_dir, move |event| {
                            let _ = tx_progress.send(PoolEvent::Progress {
                                item: item_for_progress.clone(),
                                event,
                            });
                        });

                        let outcome = match result {
                            Ok(outcome) => outcome,
                            Err(err) => {
                                tracing::error!(item = %item.display(), error = %err, "task execution failed");
                                TaskOutcome::Failed(err.to_string())
                            }
                        };
                        let _ = tx.send(PoolEvent::Finished { item, outcome });
                    });
                });

                let _ = tx.send(PoolEvent::QueueProcessed { queue_title: queue.title.clone() });
            }
            let _ = tx.send(PoolEvent::AllDone);
        });

        self.handles.lock().unwrap().push(handle);
        rx
    }
}

fn build_thread_pool(use_multi_core: bool) -> rayon::ThreadPool {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if !use_multi_core {
        builder = builder.num_threads(1);
    }
    builder.build().expect("failed to build worker thread pool")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqm_core::{Assignment, DefaultFileOps, QueueSettings, ToolGroup, ToolInstance, ToolSettings};
    use tempfile::tempdir;

    struct NoSidecars;
    impl SidecarHelper for NoSidecars {
        fn has_sidecar(&self, _path: &std::path::Path) -> bool {
            false
        }
        fn sidecar_path(&self, path: &std::path::Path) -> PathBuf {
            path.with_extension("xmp")
        }
    }

    #[test]
    fn processes_all_items_and_signals_queue_processed_then_all_done() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(bqm_registry::default_registry());
        let descriptor = registry.descriptor(ToolGroup::Transform, "Resize").unwrap();

        let mut queue = Queue::new("Resize batch", QueueSettings::default());
        for i in 0..3 {
            let input_path = dir.path().join(format!("in{i}.png"));
            image::RgbImage::from_pixel(8, 8, image::Rgb([i as u8, 0, 0])).save(&input_path).unwrap();
            let mut assignment = Assignment::new(input_path, format!("out{i}"));
            assignment.push_tool(ToolInstance::new(
                0,
                &descriptor,
                ToolSettings::new().with("width", 4i64).with("height", 4i64),
            ));
            queue.push(assignment);
        }

        let pool = WorkerPool::new(registry, Arc::new(NoSidecars), Arc::new(DefaultFileOps));
        let rx = pool.process_queues(vec![queue], dir.path().to_path_buf());

        let mut finished = 0;
        let mut saw_queue_processed = false;
        let mut saw_all_done = false;
        for event in rx {
            match event {
                PoolEvent::Finished { .. } => finished += 1,
                PoolEvent::QueueProcessed { .. } => saw_queue_processed = true,
                PoolEvent::AllDone => saw_all_done = true,
                _ => {}
            }
        }

        assert_eq!(finished, 3);
        assert!(saw_queue_processed);
        assert!(saw_all_done);
    }

    #[test]
    fn cancel_all_stops_items_not_yet_started() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(bqm_registry::default_registry());
        let descriptor = registry.descriptor(ToolGroup::Transform, "Resize").unwrap();

        let mut queue = Queue::new("Resize batch", QueueSettings { use_multi_core_cpu: false, ..QueueSettings::default() });
        let input_path = dir.path().join("in.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([9, 9, 9])).save(&input_path).unwrap();
        let mut assignment = Assignment::new(input_path, "out");
        assignment.push_tool(ToolInstance::new(0, &descriptor, ToolSettings::new().with("width", 4i64).with("height", 4i64)));
        queue.push(assignment);

        let pool = WorkerPool::new(registry, Arc::new(NoSidecars), Arc::new(DefaultFileOps));
        pool.cancel_all();
        let rx = pool.process_queues(vec![queue], dir.path().to_path_buf());

        let mut saw_canceled = false;
        for event in rx {
            if let PoolEvent::Finished { outcome: TaskOutcome::Canceled, .. } = event {
                saw_canceled = true;
            }
        }
        assert!(saw_canceled);
    }

    #[test]
    fn cancel_all_joins_the_worker_thread_before_returning() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(bqm_registry::default_registry());
        let descriptor = registry.descriptor(ToolGroup::Transform, "Resize").unwrap();

        let mut queue = Queue::new("Resize batch", QueueSettings::default());
        let input_path = dir.path().join("in.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([9, 9, 9])).save(&input_path).unwrap();
        let mut assignment = Assignment::new(input_path, "out");
        assignment.push_tool(ToolInstance::new(0, &descriptor, ToolSettings::new().with("width", 4i64).with("height", 4i64)));
        queue.push(assignment);

        let pool = WorkerPool::new(registry, Arc::new(NoSidecars), Arc::new(DefaultFileOps));
        let rx = pool.process_queues(vec![queue], dir.path().to_path_buf());

        pool.cancel_all();
        assert!(pool.handles.lock().unwrap().is_empty());

        // The worker thread has already been joined by `cancel_all`, so the
        // channel is fully drained and receiving now only sees disconnect.
        for _event in rx {}
    }
}
