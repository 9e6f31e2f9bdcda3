use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use anyhow::Result;

use super::frame_store::FrameSinks;
use crate::types::{CameraPoint, DepthPoint};

/// Camera space → depth / body-index pixel space.
pub trait CoordinateMapper: Send + Sync {
    /// Points the sensor cannot project come back non-finite.
    fn camera_to_depth(&self, point: &CameraPoint) -> DepthPoint;
}

pub trait Sensor {
    fn label(&self) -> &str;

    fn mapper(&self) -> Arc<dyn CoordinateMapper>;

    /// Starts the device and its delivery thread. Frames go to `sinks` until
    /// the returned stream is stopped or dropped.
    fn start(&mut self, sinks: FrameSinks) -> Result<SensorStream>;
}

#[derive(Debug)]
pub struct SensorStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SensorStream {
    pub fn spawn<F>(name: &str, run: F) -> Result<Self>
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(stop_flag))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("sensor thread panicked");
            } else {
                log::info!("sensor stopped");
            }
        }
    }
}

impl Drop for SensorStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn stop_joins_worker() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let worker_ticks = ticks.clone();
        let stream = SensorStream::spawn("test-sensor", move |stop| {
            while !stop.load(Ordering::Relaxed) {
                worker_ticks.fetch_add(1, Ordering::Relaxed);
                thread::yield_now();
            }
        })
        .unwrap();

        stream.stop();
        let after_stop = ticks.load(Ordering::Relaxed);
        thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(ticks.load(Ordering::Relaxed), after_stop);
    }

    #[test]
    fn drop_stops_worker() {
        let finished = Arc::new(AtomicBool::new(false));
        let worker_finished = finished.clone();
        let stream = SensorStream::spawn("test-sensor", move |stop| {
            while !stop.load(Ordering::Relaxed) {
                thread::yield_now();
            }
            worker_finished.store(true, Ordering::SeqCst);
        })
        .unwrap();

        drop(stream);
        assert!(finished.load(Ordering::SeqCst));
    }
}
