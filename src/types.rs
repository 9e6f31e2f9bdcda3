use std::time::Instant;

use crate::pipeline::skeleton::{JOINT_COUNT, JointType};

/// Upper bound of bodies the sensor reports per frame.
pub const BODY_COUNT: usize = 6;

/// Body-index value for pixels that belong to no body.
pub const NO_BODY: u8 = 255;

#[derive(Clone, Debug)]
pub struct DepthImage {
    pub width: u32,
    pub height: u32,
    /// Millimetres, row-major.
    pub samples: Vec<u16>,
    pub timestamp: Instant,
}

#[derive(Clone, Debug)]
pub struct BodyIndexMask {
    pub width: u32,
    pub height: u32,
    pub labels: Vec<u8>,
    pub timestamp: Instant,
}

#[derive(Clone, Debug)]
pub struct BodyFrame {
    pub bodies: Vec<Body>,
    pub timestamp: Instant,
}

impl BodyFrame {
    pub fn tracked_bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter(|body| body.tracked)
    }
}

/// Camera-space position in metres (x right, y up, z away from the sensor).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CameraPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Pixel position in depth / body-index space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthPoint {
    pub x: f32,
    pub y: f32,
}

impl DepthPoint {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackingState {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandState {
    #[default]
    Unknown,
    NotTracked,
    Open,
    Closed,
    Lasso,
}

impl HandState {
    pub fn label(&self) -> &'static str {
        match self {
            HandState::Unknown => "unknown",
            HandState::NotTracked => "not tracked",
            HandState::Open => "open",
            HandState::Closed => "closed",
            HandState::Lasso => "lasso",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Joint {
    pub joint_type: JointType,
    pub position: CameraPoint,
    pub tracking_state: TrackingState,
}

impl Joint {
    pub fn is_tracked(&self) -> bool {
        self.tracking_state == TrackingState::Tracked
    }

    pub fn parent(&self) -> Option<JointType> {
        self.joint_type.parent()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub tracked: bool,
    /// Indexed by `JointType::index`, so every parent lookup resolves.
    pub joints: [Joint; JOINT_COUNT],
    pub hand_left: HandState,
    pub hand_right: HandState,
}

impl Body {
    pub fn untracked() -> Self {
        let mut joints = [Joint {
            joint_type: JointType::SpineBase,
            position: CameraPoint::default(),
            tracking_state: TrackingState::NotTracked,
        }; JOINT_COUNT];
        for (joint, joint_type) in joints.iter_mut().zip(JointType::all()) {
            joint.joint_type = joint_type;
        }

        Self {
            tracked: false,
            joints,
            hand_left: HandState::Unknown,
            hand_right: HandState::Unknown,
        }
    }

    pub fn joint(&self, joint_type: JointType) -> &Joint {
        &self.joints[joint_type.index()]
    }

    pub fn joint_mut(&mut self, joint_type: JointType) -> &mut Joint {
        &mut self.joints[joint_type.index()]
    }
}
