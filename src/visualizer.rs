use std::io::Write;

use image::GrayImage;

use crate::{
    capture::Session,
    pipeline::{
        depth_converter::depth_to_luminance, frame_store::FrameStore, sensor::CoordinateMapper,
        skeleton::JointType,
    },
    types::{Body, CameraPoint, HandState},
};

/// Straight (non-premultiplied) RGBA.
pub type Color = [u8; 4];

pub const JOINT_COLOR: Color = [255, 255, 255, 255];
pub const BONE_COLOR: Color = [255, 255, 255, 255];

/// Radii in body-index pixels; scaled with the canvas.
const JOINT_RADIUS: f32 = 5.0;
const HAND_RADIUS: f32 = 30.0;

/// Drawing surface for one redraw, in canvas pixels.
pub trait Canvas {
    fn size(&self) -> (u32, u32);

    /// Covers the whole canvas with `image`, stretched on both axes.
    fn draw_luminance(&mut self, image: &GrayImage);

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color);

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Color);
}

pub fn hand_color(state: HandState) -> Color {
    match state {
        HandState::Closed => [255, 0, 0, 128],
        HandState::Lasso => [0, 0, 255, 128],
        HandState::Open => [0, 255, 0, 128],
        HandState::Unknown | HandState::NotTracked => [0, 0, 0, 0],
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub tracked_bodies: usize,
    pub tracked_joints: usize,
}

/// Projected points further than this many canvas sizes from the origin are
/// not drawn.
const OFF_CANVAS_LIMIT: f32 = 4.0;

struct Projection<'a> {
    mapper: &'a dyn CoordinateMapper,
    scale: (f32, f32),
    limit: (f32, f32),
}

impl Projection<'_> {
    fn project(&self, point: &CameraPoint) -> Option<(f32, f32)> {
        let mapped = self.mapper.camera_to_depth(point);
        if !mapped.is_finite() {
            return None;
        }
        let (x, y) = (mapped.x * self.scale.0, mapped.y * self.scale.1);
        (x.abs() <= self.limit.0 && y.abs() <= self.limit.1).then_some((x, y))
    }

    fn radius(&self, radius: f32) -> f32 {
        radius * (self.scale.0 + self.scale.1) / 2.0
    }
}

/// One redraw: depth backdrop, then skeleton, hands and one log row for every
/// tracked body. Missing channels skip their step.
pub fn draw_frame<C, W>(
    store: &FrameStore,
    mapper: &dyn CoordinateMapper,
    canvas: &mut C,
    session: &mut Session<W>,
) -> FrameStats
where
    C: Canvas + ?Sized,
    W: Write,
{
    let mut stats = FrameStats::default();

    if let Some(depth) = store.depth() {
        match depth_to_luminance(depth) {
            Ok(gray) => canvas.draw_luminance(&gray),
            Err(err) => log::debug!("skipping depth image: {err:#}"),
        }
    }

    let Some(mask) = store.body_index() else {
        return stats;
    };
    if mask.width == 0 || mask.height == 0 {
        return stats;
    }
    let Some(frame) = store.body_frame() else {
        return stats;
    };

    let (width, height) = canvas.size();
    let projection = Projection {
        mapper,
        scale: (
            width as f32 / mask.width as f32,
            height as f32 / mask.height as f32,
        ),
        limit: (
            width as f32 * OFF_CANVAS_LIMIT,
            height as f32 * OFF_CANVAS_LIMIT,
        ),
    };

    for body in frame.tracked_bodies() {
        stats.tracked_bodies += 1;
        stats.tracked_joints += draw_skeleton(canvas, &projection, body);
        session.log_body(body);
        draw_hand(canvas, &projection, body, JointType::HandLeft, body.hand_left);
        draw_hand(canvas, &projection, body, JointType::HandRight, body.hand_right);
    }

    stats
}

fn draw_skeleton<C: Canvas + ?Sized>(
    canvas: &mut C,
    projection: &Projection<'_>,
    body: &Body,
) -> usize {
    let mut tracked = 0;
    for joint in &body.joints {
        if !joint.is_tracked() {
            continue;
        }
        tracked += 1;

        let Some(pos) = projection.project(&joint.position) else {
            continue;
        };
        canvas.fill_circle(pos, projection.radius(JOINT_RADIUS), JOINT_COLOR);

        let parent = joint
            .parent()
            .and_then(|parent| projection.project(&body.joint(parent).position));
        if let Some(parent) = parent {
            canvas.draw_line(pos, parent, BONE_COLOR);
        }
    }
    tracked
}

fn draw_hand<C: Canvas + ?Sized>(
    canvas: &mut C,
    projection: &Projection<'_>,
    body: &Body,
    hand: JointType,
    state: HandState,
) {
    if let Some(pos) = projection.project(&body.joint(hand).position) {
        canvas.fill_circle(pos, projection.radius(HAND_RADIUS), hand_color(state));
    }
}
