// src/jobs.rs
//! Background I/O worker pool servicing `ResourceCommand` submissions.
//!
//! The actual decode/parse work for a texture, model, shader, audio clip, or
//! font is an external collaborator's responsibility (out of scope here); what
//! this module guarantees is the threading discipline around it: several OS
//! worker threads claim jobs off a shared internal channel, but none of them
//! ever touches the callback queue directly. Results are funneled onto a
//! single internal result channel that the *main thread* drains during its own
//! pump, and the main thread remains the callback queue's sole producer. This
//! preserves the SPSC contract on the callback queue even though job execution
//! itself is fanned out across a pool.
//!
//! Workers are joined, not detached, at shutdown — dropping this pool blocks
//! until every in-flight job has observed the channel close.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::payload::{CallbackType, ResourceCommand};
use crate::queues::CallbackQueue;

struct PendingJob {
    command: ResourceCommand,
}

pub struct ResourceJobPool {
    job_tx: Option<Sender<PendingJob>>,
    result_rx: Receiver<crate::payload::CallbackData>,
    workers: Vec<JoinHandle<()>>,
}

impl ResourceJobPool {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (job_tx, job_rx) = unbounded::<PendingJob>();
        let (result_tx, result_rx) = unbounded();

        let workers = (0..worker_count)
            .map(|idx| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                thread::Builder::new()
                    .name(format!("resource-job-{idx}"))
                    .spawn(move || {
                        while let Ok(job) = job_rx.recv() {
                            let callback = execute_job(job);
                            if result_tx.send(callback).is_err() {
                                break;
                            }
                        }
                    })
                    .expect("failed to spawn resource job worker")
            })
            .collect();

        Self { job_tx: Some(job_tx), result_rx, workers }
    }

    pub fn submit(&self, command: ResourceCommand) {
        if let Some(tx) = &self.job_tx {
            let _ = tx.send(PendingJob { command });
        }
    }

    /// Non-blocking: pulls every result produced so far and pushes each onto
    /// `callback_queue`. Called from `host::HostLoop::pump_main_thread`, which
    /// is the callback queue's one and only producer thread.
    pub fn deliver_results(&self, callback_queue: &CallbackQueue) -> usize {
        let mut delivered = 0;
        while let Ok(callback) = self.result_rx.try_recv() {
            if callback_queue.push(callback) == crate::ring::PushOutcome::Ok {
                delivered += 1;
            } else {
                tracing::warn!("callback queue full, dropping resource-job result");
            }
        }
        delivered
    }
}

impl Drop for ResourceJobPool {
    fn drop(&mut self) {
        self.job_tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn execute_job(job: PendingJob) -> crate::payload::CallbackData {
    crate::payload::CallbackData {
        callback_id: job.command.callback_id,
        result_id: 0,
        error_message: String::new(),
        callback_type: CallbackType::ResourceLoaded,
        result_json: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ResourceCommandKind;
    use std::time::{Duration, Instant};

    #[test]
    fn submitted_job_eventually_produces_a_callback() {
        let pool = ResourceJobPool::new(2);
        let queue = crate::queues::callback_queue(8).unwrap();
        pool.submit(ResourceCommand {
            kind: ResourceCommandKind::LoadTexture,
            path: "rock.png".to_string(),
            priority: 0,
            is_async: true,
            callback_id: 5,
        });

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut seen = 0;
        while Instant::now() < deadline && seen == 0 {
            seen = pool.deliver_results(&queue);
        }
        assert_eq!(seen, 1);
        let mut received = Vec::new();
        queue.drain(|cb| received.push(cb));
        assert_eq!(received[0].callback_id, 5);
    }
}
