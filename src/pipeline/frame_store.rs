use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::types::{BodyFrame, BodyIndexMask, DepthImage};

/// Write side of a single-slot mailbox. Publishing never blocks: an unread
/// value is evicted so the slot always holds the newest one.
pub struct MailboxSender<T> {
    tx: Sender<Arc<T>>,
    evict: Receiver<Arc<T>>,
    // The sender also holds a receiver, so channel disconnection never fires;
    // this tracks the reading side instead.
    reader: Weak<()>,
}

impl<T> Clone for MailboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            evict: self.evict.clone(),
            reader: self.reader.clone(),
        }
    }
}

impl<T> MailboxSender<T> {
    /// Returns `false` once the reading side is gone.
    pub fn publish(&self, value: T) -> bool {
        if self.reader.strong_count() == 0 {
            return false;
        }
        let mut value = Arc::new(value);
        loop {
            match self.tx.try_send(value) {
                Ok(()) => return true,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.evict.try_recv();
                    value = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// Read side. Keeps the last value it saw so a redraw without a fresh
/// delivery still sees the previous frame.
pub struct MailboxReceiver<T> {
    rx: Receiver<Arc<T>>,
    latest: Option<Arc<T>>,
    _alive: Arc<()>,
}

impl<T> MailboxReceiver<T> {
    /// Pulls any pending value. Returns `true` when the latest value changed.
    pub fn refresh(&mut self) -> bool {
        let mut changed = false;
        while let Ok(value) = self.rx.try_recv() {
            self.latest = Some(value);
            changed = true;
        }
        changed
    }

    pub fn latest(&self) -> Option<&T> {
        self.latest.as_deref()
    }
}

pub fn mailbox<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let (tx, rx) = bounded(1);
    let alive = Arc::new(());
    (
        MailboxSender {
            tx,
            evict: rx.clone(),
            reader: Arc::downgrade(&alive),
        },
        MailboxReceiver {
            rx,
            latest: None,
            _alive: alive,
        },
    )
}

/// Handed to the sensor backend; each setter overwrites its channel.
#[derive(Clone)]
pub struct FrameSinks {
    depth: MailboxSender<DepthImage>,
    body_index: MailboxSender<BodyIndexMask>,
    body: MailboxSender<BodyFrame>,
}

impl FrameSinks {
    pub fn set_depth(&self, image: DepthImage) -> bool {
        self.depth.publish(image)
    }

    pub fn set_body_index(&self, mask: BodyIndexMask) -> bool {
        self.body_index.publish(mask)
    }

    pub fn set_body_frame(&self, frame: BodyFrame) -> bool {
        self.body.publish(frame)
    }
}

/// Latest depth image, body-index mask and body frame as seen by the render
/// thread. Channels are independent; nothing ties the three to one instant.
pub struct FrameStore {
    depth: MailboxReceiver<DepthImage>,
    body_index: MailboxReceiver<BodyIndexMask>,
    body: MailboxReceiver<BodyFrame>,
}

impl FrameStore {
    pub fn new() -> (Self, FrameSinks) {
        let (depth_tx, depth_rx) = mailbox();
        let (index_tx, index_rx) = mailbox();
        let (body_tx, body_rx) = mailbox();
        (
            Self {
                depth: depth_rx,
                body_index: index_rx,
                body: body_rx,
            },
            FrameSinks {
                depth: depth_tx,
                body_index: index_tx,
                body: body_tx,
            },
        )
    }

    pub fn refresh(&mut self) {
        self.depth.refresh();
        self.body_index.refresh();
        self.body.refresh();
    }

    pub fn depth(&self) -> Option<&DepthImage> {
        self.depth.latest()
    }

    pub fn body_index(&self) -> Option<&BodyIndexMask> {
        self.body_index.latest()
    }

    pub fn body_frame(&self) -> Option<&BodyFrame> {
        self.body.latest()
    }

    /// Spread between the oldest and newest sensor timestamps of the held
    /// channels. `None` until all three have arrived.
    pub fn channel_skew(&self) -> Option<Duration> {
        let stamps = [
            self.depth()?.timestamp,
            self.body_index()?.timestamp,
            self.body_frame()?.timestamp,
        ];
        let oldest = stamps.iter().min()?;
        let newest = stamps.iter().max()?;
        Some(newest.duration_since(*oldest))
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Instant};

    use crate::types::BODY_COUNT;

    use super::*;

    fn depth(value: u16) -> DepthImage {
        DepthImage {
            width: 2,
            height: 1,
            samples: vec![value; 2],
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn empty_until_first_delivery() {
        let (mut store, _sinks) = FrameStore::new();
        store.refresh();
        assert!(store.depth().is_none());
        assert!(store.body_index().is_none());
        assert!(store.body_frame().is_none());
    }

    #[test]
    fn newest_write_wins() {
        let (mut store, sinks) = FrameStore::new();
        for value in 1..=5 {
            assert!(sinks.set_depth(depth(value)));
        }
        store.refresh();
        assert_eq!(store.depth().unwrap().samples, vec![5, 5]);
    }

    #[test]
    fn latest_survives_empty_refresh() {
        let (mut tx, mut rx) = {
            let (tx, rx) = mailbox::<u32>();
            (Some(tx), rx)
        };
        tx.as_ref().unwrap().publish(7);
        assert!(rx.refresh());
        assert!(!rx.refresh());
        assert_eq!(rx.latest(), Some(&7));

        tx.take();
        assert!(!rx.refresh());
        assert_eq!(rx.latest(), Some(&7));
    }

    #[test]
    fn publish_reports_closed_reader() {
        let (tx, rx) = mailbox::<u32>();
        drop(rx);
        assert!(!tx.publish(1));
    }

    #[test]
    fn writes_from_another_thread_arrive() {
        let (mut store, sinks) = FrameStore::new();
        let handle = thread::spawn(move || {
            for value in 0..100 {
                sinks.set_depth(depth(value));
            }
        });
        handle.join().unwrap();

        store.refresh();
        assert_eq!(store.depth().unwrap().samples[0], 99);
    }

    #[test]
    fn skew_spans_all_three_channels() {
        let (mut store, sinks) = FrameStore::new();
        let start = Instant::now();
        sinks.set_depth(DepthImage {
            timestamp: start,
            ..depth(1)
        });
        store.refresh();
        assert_eq!(store.channel_skew(), None);

        sinks.set_body_index(BodyIndexMask {
            width: 1,
            height: 1,
            labels: vec![0],
            timestamp: start + Duration::from_millis(5),
        });
        sinks.set_body_frame(BodyFrame {
            bodies: Vec::with_capacity(BODY_COUNT),
            timestamp: start + Duration::from_millis(12),
        });
        store.refresh();
        assert_eq!(store.channel_skew(), Some(Duration::from_millis(12)));
    }
}
