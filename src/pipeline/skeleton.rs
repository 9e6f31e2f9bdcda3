pub const JOINT_COUNT: usize = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointType {
    SpineBase,
    SpineMid,
    Neck,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    SpineShoulder,
    HandTipLeft,
    ThumbLeft,
    HandTipRight,
    ThumbRight,
}

pub struct JointSpec {
    pub joint: JointType,
    pub name: &'static str,
    /// `None` only for the root of the tree.
    pub parent: Option<JointType>,
}

/// Every joint in sensor enumeration order. CSV columns and bone drawing both
/// walk this table, so its order is the column order of the output log.
#[rustfmt::skip]
pub const JOINTS: [JointSpec; JOINT_COUNT] = [
    JointSpec { joint: JointType::SpineBase, name: "SpineBase", parent: None },
    JointSpec { joint: JointType::SpineMid, name: "SpineMid", parent: Some(JointType::SpineBase) },
    JointSpec { joint: JointType::Neck, name: "Neck", parent: Some(JointType::SpineShoulder) },
    JointSpec { joint: JointType::Head, name: "Head", parent: Some(JointType::Neck) },
    JointSpec { joint: JointType::ShoulderLeft, name: "ShoulderLeft", parent: Some(JointType::SpineShoulder) },
    JointSpec { joint: JointType::ElbowLeft, name: "ElbowLeft", parent: Some(JointType::ShoulderLeft) },
    JointSpec { joint: JointType::WristLeft, name: "WristLeft", parent: Some(JointType::ElbowLeft) },
    JointSpec { joint: JointType::HandLeft, name: "HandLeft", parent: Some(JointType::WristLeft) },
    JointSpec { joint: JointType::ShoulderRight, name: "ShoulderRight", parent: Some(JointType::SpineShoulder) },
    JointSpec { joint: JointType::ElbowRight, name: "ElbowRight", parent: Some(JointType::ShoulderRight) },
    JointSpec { joint: JointType::WristRight, name: "WristRight", parent: Some(JointType::ElbowRight) },
    JointSpec { joint: JointType::HandRight, name: "HandRight", parent: Some(JointType::WristRight) },
    JointSpec { joint: JointType::HipLeft, name: "HipLeft", parent: Some(JointType::SpineBase) },
    JointSpec { joint: JointType::KneeLeft, name: "KneeLeft", parent: Some(JointType::HipLeft) },
    JointSpec { joint: JointType::AnkleLeft, name: "AnkleLeft", parent: Some(JointType::KneeLeft) },
    JointSpec { joint: JointType::FootLeft, name: "FootLeft", parent: Some(JointType::AnkleLeft) },
    JointSpec { joint: JointType::HipRight, name: "HipRight", parent: Some(JointType::SpineBase) },
    JointSpec { joint: JointType::KneeRight, name: "KneeRight", parent: Some(JointType::HipRight) },
    JointSpec { joint: JointType::AnkleRight, name: "AnkleRight", parent: Some(JointType::KneeRight) },
    JointSpec { joint: JointType::FootRight, name: "FootRight", parent: Some(JointType::AnkleRight) },
    JointSpec { joint: JointType::SpineShoulder, name: "SpineShoulder", parent: Some(JointType::SpineMid) },
    JointSpec { joint: JointType::HandTipLeft, name: "HandTipLeft", parent: Some(JointType::HandLeft) },
    JointSpec { joint: JointType::ThumbLeft, name: "ThumbLeft", parent: Some(JointType::HandLeft) },
    JointSpec { joint: JointType::HandTipRight, name: "HandTipRight", parent: Some(JointType::HandRight) },
    JointSpec { joint: JointType::ThumbRight, name: "ThumbRight", parent: Some(JointType::HandRight) },
];

impl JointType {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static JointSpec {
        &JOINTS[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn parent(self) -> Option<JointType> {
        self.spec().parent
    }

    pub fn all() -> impl Iterator<Item = JointType> {
        JOINTS.iter().map(|spec| spec.joint)
    }
}
