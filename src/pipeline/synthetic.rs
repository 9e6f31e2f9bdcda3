use std::{
    sync::{Arc, atomic::Ordering},
    thread,
    time::{Duration, Instant},
};

use anyhow::{Result, ensure};

use super::{
    frame_store::FrameSinks,
    sensor::{CoordinateMapper, Sensor, SensorStream},
    skeleton::{JOINT_COUNT, JOINTS, JointType},
};
use crate::types::{
    BODY_COUNT, Body, BodyFrame, BodyIndexMask, CameraPoint, DepthImage, DepthPoint, HandState,
    NO_BODY, TrackingState,
};

pub const DEPTH_WIDTH: u32 = 512;
pub const DEPTH_HEIGHT: u32 = 424;

const BACKGROUND_MM: u16 = 4_000;
const BODY_DISTANCE_M: f32 = 2.5;
const LIMB_RADIUS_M: f32 = 0.06;
const HAND_STATE_PERIOD: Duration = Duration::from_secs(2);
const FEET_DROPOUT_PERIOD: u64 = 90;
const FEET_DROPOUT_FRAMES: u64 = 20;

/// Joint offsets in metres relative to the body centre, x right and y up.
const REST_POSE: [(f32, f32); JOINT_COUNT] = [
    (0.00, -0.30),
    (0.00, 0.00),
    (0.00, 0.30),
    (0.00, 0.45),
    (-0.18, 0.25),
    (-0.30, 0.02),
    (-0.35, -0.20),
    (-0.36, -0.27),
    (0.18, 0.25),
    (0.30, 0.02),
    (0.35, -0.20),
    (0.36, -0.27),
    (-0.09, -0.32),
    (-0.10, -0.75),
    (-0.10, -1.15),
    (-0.12, -1.22),
    (0.09, -0.32),
    (0.10, -0.75),
    (0.10, -1.15),
    (0.12, -1.22),
    (0.00, 0.24),
    (-0.37, -0.36),
    (-0.32, -0.30),
    (0.37, -0.36),
    (0.32, -0.30),
];

const WAVING_ARM: [JointType; 5] = [
    JointType::ElbowRight,
    JointType::WristRight,
    JointType::HandRight,
    JointType::HandTipRight,
    JointType::ThumbRight,
];

const HAND_CYCLE: [HandState; 4] = [
    HandState::Open,
    HandState::Closed,
    HandState::Lasso,
    HandState::Unknown,
];

/// Pinhole model of the depth camera.
#[derive(Clone, Debug)]
pub struct DepthIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Default for DepthIntrinsics {
    fn default() -> Self {
        Self {
            fx: 365.456,
            fy: 365.456,
            cx: 254.878,
            cy: 205.395,
        }
    }
}

impl CoordinateMapper for DepthIntrinsics {
    fn camera_to_depth(&self, point: &CameraPoint) -> DepthPoint {
        if point.z <= f32::EPSILON {
            return DepthPoint {
                x: f32::NEG_INFINITY,
                y: f32::NEG_INFINITY,
            };
        }
        DepthPoint {
            x: self.cx + self.fx * point.x / point.z,
            y: self.cy - self.fy * point.y / point.z,
        }
    }
}

/// Sensor backend that animates a single waving body in front of a flat
/// wall. Stands in for a depth camera when none is attached.
pub struct SyntheticSensor {
    fps: u32,
    intrinsics: Arc<DepthIntrinsics>,
}

impl SyntheticSensor {
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            intrinsics: Arc::new(DepthIntrinsics::default()),
        }
    }
}

impl Sensor for SyntheticSensor {
    fn label(&self) -> &str {
        "synthetic"
    }

    fn mapper(&self) -> Arc<dyn CoordinateMapper> {
        self.intrinsics.clone()
    }

    fn start(&mut self, sinks: FrameSinks) -> Result<SensorStream> {
        ensure!(self.fps > 0, "sensor frame rate must be positive");
        let frame_interval = Duration::from_secs_f64(1.0 / f64::from(self.fps));
        let intrinsics = self.intrinsics.clone();

        SensorStream::spawn("synthetic-sensor", move |stop| {
            let started = Instant::now();
            let mut frame_no: u64 = 0;

            while !stop.load(Ordering::Relaxed) {
                let frame_start = Instant::now();
                let body = animate_body(started.elapsed(), frame_no);
                let (depth, mask) = render_scene(&body, intrinsics.as_ref());

                let mut bodies = vec![body];
                bodies.resize_with(BODY_COUNT, Body::untracked);
                let frame = BodyFrame {
                    bodies,
                    timestamp: Instant::now(),
                };

                let delivered = sinks.set_depth(depth)
                    & sinks.set_body_index(mask)
                    & sinks.set_body_frame(frame);
                if !delivered {
                    log::info!("frame store closed, stopping synthetic sensor");
                    break;
                }

                frame_no += 1;
                thread::sleep(frame_interval.saturating_sub(frame_start.elapsed()));
            }
        })
    }
}

fn animate_body(elapsed: Duration, frame_no: u64) -> Body {
    let t = elapsed.as_secs_f32();
    let sway = 0.2 * (t * 0.5).sin();
    let wave = 0.9 * (t * 2.0).sin();
    let shoulder = REST_POSE[JointType::ShoulderRight.index()];

    let mut body = Body::untracked();
    body.tracked = true;
    for spec in &JOINTS {
        let (mut x, mut y) = REST_POSE[spec.joint.index()];
        if WAVING_ARM.contains(&spec.joint) {
            (x, y) = rotate_about((x, y), shoulder, wave);
        }
        let joint = body.joint_mut(spec.joint);
        joint.position = CameraPoint::new(x + sway, y, BODY_DISTANCE_M);
        joint.tracking_state = TrackingState::Tracked;
    }

    if frame_no % FEET_DROPOUT_PERIOD < FEET_DROPOUT_FRAMES {
        body.joint_mut(JointType::FootLeft).tracking_state = TrackingState::Inferred;
        body.joint_mut(JointType::FootRight).tracking_state = TrackingState::Inferred;
    }

    let step = (elapsed.as_millis() / HAND_STATE_PERIOD.as_millis()) as usize;
    body.hand_right = HAND_CYCLE[step % HAND_CYCLE.len()];
    body.hand_left = HAND_CYCLE[(step + 2) % HAND_CYCLE.len()];
    body
}

fn rotate_about(point: (f32, f32), pivot: (f32, f32), angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    let (dx, dy) = (point.0 - pivot.0, point.1 - pivot.1);
    (pivot.0 + dx * cos - dy * sin, pivot.1 + dx * sin + dy * cos)
}

/// Depth and body-index frames for one body: limbs are stamped as discs
/// along every bone over a wall gradient.
fn render_scene(body: &Body, mapper: &DepthIntrinsics) -> (DepthImage, BodyIndexMask) {
    let (width, height) = (DEPTH_WIDTH as usize, DEPTH_HEIGHT as usize);
    let mut samples: Vec<u16> = (0..height)
        .flat_map(|y| {
            let row = BACKGROUND_MM - (y as u16 * 2);
            std::iter::repeat_n(row, width)
        })
        .collect();
    let mut labels = vec![NO_BODY; width * height];

    let body_mm = (BODY_DISTANCE_M * 1000.0) as u16;
    let radius_px = (mapper.fx * LIMB_RADIUS_M / BODY_DISTANCE_M).max(1.0);

    for spec in &JOINTS {
        let Some(parent) = spec.parent else {
            continue;
        };
        let a = mapper.camera_to_depth(&body.joint(spec.joint).position);
        let b = mapper.camera_to_depth(&body.joint(parent).position);
        if !a.is_finite() || !b.is_finite() {
            continue;
        }

        let length = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        let steps = (length / 2.0).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let f = i as f32 / steps as f32;
            let cx = a.x + (b.x - a.x) * f;
            let cy = a.y + (b.y - a.y) * f;
            stamp_disc(&mut samples, &mut labels, width, height, (cx, cy), radius_px, body_mm);
        }
    }

    let timestamp = Instant::now();
    (
        DepthImage {
            width: DEPTH_WIDTH,
            height: DEPTH_HEIGHT,
            samples,
            timestamp,
        },
        BodyIndexMask {
            width: DEPTH_WIDTH,
            height: DEPTH_HEIGHT,
            labels,
            timestamp,
        },
    )
}

fn stamp_disc(
    samples: &mut [u16],
    labels: &mut [u8],
    width: usize,
    height: usize,
    center: (f32, f32),
    radius: f32,
    depth_mm: u16,
) {
    let r = radius.ceil() as i32;
    let (cx, cy) = (center.0 as i32, center.1 as i32);
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx * dx + dy * dy) as f32 > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
                continue;
            }
            let idx = y as usize * width + x as usize;
            samples[idx] = depth_mm;
            labels[idx] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame_store::FrameStore;

    #[test]
    fn centre_ray_hits_principal_point() {
        let mapper = DepthIntrinsics::default();
        let p = mapper.camera_to_depth(&CameraPoint::new(0.0, 0.0, 2.0));
        assert!((p.x - mapper.cx).abs() < 1e-4);
        assert!((p.y - mapper.cy).abs() < 1e-4);

        let up = mapper.camera_to_depth(&CameraPoint::new(0.0, 0.5, 2.0));
        assert!(up.y < mapper.cy, "camera y up maps to smaller row index");
    }

    #[test]
    fn points_behind_the_camera_do_not_project() {
        let mapper = DepthIntrinsics::default();
        assert!(!mapper.camera_to_depth(&CameraPoint::new(0.1, 0.1, 0.0)).is_finite());
    }

    #[test]
    fn animated_body_stays_in_view() {
        let mapper = DepthIntrinsics::default();
        for frame_no in 0..120 {
            let body = animate_body(Duration::from_millis(frame_no * 33), frame_no);
            assert!(body.tracked);
            for joint in &body.joints {
                let p = mapper.camera_to_depth(&joint.position);
                assert!(p.x >= 0.0 && p.x < DEPTH_WIDTH as f32, "{:?}", joint.joint_type);
                assert!(p.y >= 0.0 && p.y < DEPTH_HEIGHT as f32, "{:?}", joint.joint_type);
            }
        }
    }

    #[test]
    fn feet_drop_out_periodically() {
        let early = animate_body(Duration::ZERO, 0);
        assert_eq!(early.joint(JointType::FootLeft).tracking_state, TrackingState::Inferred);
        let later = animate_body(Duration::from_secs(1), FEET_DROPOUT_FRAMES);
        assert!(later.joints.iter().all(|j| j.is_tracked()));
    }

    #[test]
    fn scene_marks_body_pixels() {
        let mapper = DepthIntrinsics::default();
        let body = animate_body(Duration::ZERO, 0);
        let (depth, mask) = render_scene(&body, &mapper);
        assert_eq!(depth.samples.len(), (DEPTH_WIDTH * DEPTH_HEIGHT) as usize);
        assert_eq!(mask.labels.len(), depth.samples.len());

        let spine = mapper.camera_to_depth(&body.joint(JointType::SpineMid).position);
        let idx = spine.y as usize * DEPTH_WIDTH as usize + spine.x as usize;
        assert_eq!(mask.labels[idx], 0);
        assert_eq!(depth.samples[idx], 2_500);
        assert_eq!(mask.labels[0], NO_BODY);
    }

    #[test]
    fn start_delivers_all_three_channels() {
        let (mut store, sinks) = FrameStore::new();
        let mut sensor = SyntheticSensor::new(120);
        let stream = sensor.start(sinks).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            store.refresh();
            if store.depth().is_some()
                && store.body_index().is_some()
                && store.body_frame().is_some()
            {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        stream.stop();

        let frame = store.body_frame().expect("body frame delivered");
        assert_eq!(frame.bodies.len(), BODY_COUNT);
        assert_eq!(frame.tracked_bodies().count(), 1);
        assert!(store.depth().is_some());
        assert!(store.body_index().is_some());
    }

    #[test]
    fn zero_fps_is_rejected() {
        let (_store, sinks) = FrameStore::new();
        assert!(SyntheticSensor::new(0).start(sinks).is_err());
    }
}
