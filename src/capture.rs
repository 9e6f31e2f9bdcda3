use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use serde::Deserialize;

use crate::{
    config::{KeysConfig, OutputConfig},
    error::SnapshotError,
    output_log::OutputLog,
    types::Body,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Off,
    On,
}

impl CaptureState {
    pub fn toggled(self) -> Self {
        match self {
            CaptureState::Off => CaptureState::On,
            CaptureState::On => CaptureState::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self == CaptureState::On
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Off => "OFF",
            CaptureState::On => "REC",
        }
    }
}

/// What a tracked body contributes to the log while capture is off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdleRows {
    /// An empty row terminator per tracked body per redraw.
    #[default]
    Blank,
    /// Nothing at all.
    #[serde(rename = "none")]
    Suppressed,
    /// `N/A` triples for untracked joints, then the terminator.
    Untracked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction<'a> {
    ToggleCapture,
    Label(&'a str),
}

#[derive(Clone, Debug)]
pub struct KeyMap {
    toggle: char,
    labels: Vec<(char, String)>,
}

impl KeyMap {
    pub fn new(toggle: char, labels: Vec<(char, String)>) -> Result<Self, SnapshotError> {
        let mut seen = vec![toggle];
        for (key, _) in &labels {
            if seen.contains(key) {
                return Err(SnapshotError::DuplicateKey(*key));
            }
            seen.push(*key);
        }
        Ok(Self { toggle, labels })
    }

    pub fn action_for(&self, key: char) -> Option<KeyAction<'_>> {
        if key == self.toggle {
            return Some(KeyAction::ToggleCapture);
        }
        self.labels
            .iter()
            .find(|(bound, _)| *bound == key)
            .map(|(_, label)| KeyAction::Label(label.as_str()))
    }

    pub fn toggle_key(&self) -> char {
        self.toggle
    }
}

impl TryFrom<&KeysConfig> for KeyMap {
    type Error = SnapshotError;

    fn try_from(config: &KeysConfig) -> Result<Self, Self::Error> {
        let labels = config
            .labels
            .iter()
            .map(|binding| (binding.key, binding.label.clone()))
            .collect();
        KeyMap::new(config.toggle, labels)
    }
}

/// Capture flag, key bindings and the output log for one run of the app.
/// Only the render thread touches it.
pub struct Session<W: Write> {
    capture: CaptureState,
    keys: KeyMap,
    idle_rows: IdleRows,
    log: OutputLog<W>,
    last_label: Option<String>,
    rows_written: u64,
}

impl Session<BufWriter<File>> {
    pub fn create(output: &OutputConfig, keys: KeyMap) -> Result<Self, SnapshotError> {
        let log = OutputLog::create(&output.path, &output.title)?;
        Ok(Self::new(log, keys, output.idle_rows))
    }
}

impl<W: Write> Session<W> {
    pub fn new(log: OutputLog<W>, keys: KeyMap, idle_rows: IdleRows) -> Self {
        Self {
            capture: CaptureState::Off,
            keys,
            idle_rows,
            log,
            last_label: None,
            rows_written: 0,
        }
    }

    pub fn capture(&self) -> CaptureState {
        self.capture
    }

    pub fn keys(&self) -> &KeyMap {
        &self.keys
    }

    pub fn last_label(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Applies one key-down event. Returns `false` for unbound keys.
    pub fn handle_key(&mut self, key: char) -> bool {
        match self.keys.action_for(key) {
            Some(KeyAction::ToggleCapture) => {
                self.capture = self.capture.toggled();
                log::info!("capture {}", self.capture.label());
                true
            }
            Some(KeyAction::Label(label)) => {
                let label = label.to_string();
                let result = self.log.write_label(&label);
                self.report(result, "label");
                log::info!("marked {label}");
                self.last_label = Some(label);
                true
            }
            None => false,
        }
    }

    /// Appends the row for one tracked body. While capturing, every joint
    /// contributes either its position or an `N/A` triple, so the row always
    /// carries 75 fields.
    pub fn log_body(&mut self, body: &Body) {
        let result = self.write_body_row(body);
        self.report(result, "row");
    }

    fn write_body_row(&mut self, body: &Body) -> io::Result<()> {
        let capturing = self.capture.is_on();
        if !capturing && self.idle_rows == IdleRows::Suppressed {
            return Ok(());
        }

        for joint in &body.joints {
            match (joint.is_tracked(), capturing) {
                (true, true) => self.log.push_position(&joint.position)?,
                (false, true) => self.log.push_untracked()?,
                (false, false) if self.idle_rows == IdleRows::Untracked => {
                    self.log.push_untracked()?
                }
                _ => {}
            }
        }
        self.log.end_row()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) {
        let result = self.log.flush();
        self.report(result, "flush");
    }

    fn report(&self, result: io::Result<()>, what: &str) {
        if let Err(err) = result {
            log::warn!("output log {what} failed: {err:?}");
        }
    }

    #[cfg(test)]
    pub fn log(&self) -> &OutputLog<W> {
        &self.log
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        output_log::UNTRACKED_FIELDS,
        pipeline::skeleton::JointType,
        types::{CameraPoint, TrackingState},
    };

    pub(crate) fn default_keys() -> KeyMap {
        KeyMap::try_from(&KeysConfig::default()).unwrap()
    }

    pub(crate) fn session(idle_rows: IdleRows) -> Session<Vec<u8>> {
        let log = OutputLog::new(Vec::new(), "test").unwrap();
        Session::new(log, default_keys(), idle_rows)
    }

    /// Lines after the title and header rows.
    pub(crate) fn body_lines(session: &Session<Vec<u8>>) -> Vec<String> {
        let text = String::from_utf8(session.log().get_ref().clone()).unwrap();
        text.split('\n')
            .skip(2)
            .map(str::to_string)
            .collect::<Vec<_>>()
            .split_last()
            .map(|(_, rows)| rows.to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn tracked_body() -> Body {
        let mut body = Body::untracked();
        body.tracked = true;
        for (idx, joint) in body.joints.iter_mut().enumerate() {
            joint.position = CameraPoint::new(idx as f32 * 0.01, 0.5, 2.0);
            joint.tracking_state = TrackingState::Tracked;
        }
        body
    }

    #[test]
    fn toggle_parity() {
        let mut session = session(IdleRows::Blank);
        for presses in 1..=6 {
            assert!(session.handle_key('a'));
            let expected = if presses % 2 == 1 {
                CaptureState::On
            } else {
                CaptureState::Off
            };
            assert_eq!(session.capture(), expected);
        }
        assert!(body_lines(&session).is_empty());
    }

    #[test]
    fn every_label_key_appends_one_row() {
        let expected = [
            ('1', "ANXIETY"),
            ('2', "DISINTEREST"),
            ('3', "INTEREST"),
            ('4', "JOY"),
            ('5', "TIRED"),
            ('6', "ANGER"),
            ('7', "CONFIDENT"),
            ('8', "VUNERABLE"),
        ];

        let mut session = session(IdleRows::Blank);
        for (key, _) in expected {
            assert!(session.handle_key(key));
        }
        session.handle_key('a');
        for (key, _) in expected {
            session.handle_key(key);
        }

        let labels: Vec<&str> = expected.iter().map(|(_, label)| *label).collect();
        let mut both = labels.clone();
        both.extend(labels);
        assert_eq!(body_lines(&session), both);
        assert_eq!(session.capture(), CaptureState::On);
        assert_eq!(session.last_label(), Some("VUNERABLE"));
    }

    #[test]
    fn unbound_keys_do_nothing() {
        let mut session = session(IdleRows::Blank);
        for key in ['b', 'z', '9', '0', ' ', 'A'] {
            assert!(!session.handle_key(key));
        }
        assert_eq!(session.capture(), CaptureState::Off);
        assert!(body_lines(&session).is_empty());
    }

    #[test]
    fn capturing_row_has_75_fields() {
        let mut session = session(IdleRows::Blank);
        session.handle_key('a');
        session.log_body(&tracked_body());

        let rows = body_lines(&session);
        assert_eq!(rows.len(), 1);
        let fields: Vec<&str> = rows[0].split(',').collect();
        // trailing comma leaves one empty tail
        assert_eq!(fields.len(), 76);
        assert_eq!(fields[75], "");
        assert!(fields[..75].iter().all(|f| f.parse::<f32>().is_ok()));
        assert_eq!(session.rows_written(), 1);
    }

    #[test]
    fn untracked_joints_keep_their_columns() {
        let mut body = tracked_body();
        let missing = [JointType::Head, JointType::KneeLeft, JointType::ThumbRight];
        for joint in missing {
            body.joint_mut(joint).tracking_state = TrackingState::Inferred;
        }

        let mut session = session(IdleRows::Blank);
        session.handle_key('a');
        session.log_body(&body);

        let rows = body_lines(&session);
        let fields: Vec<&str> = rows[0].split(',').collect();
        assert_eq!(rows[0].matches(UNTRACKED_FIELDS).count(), 3);
        for joint in JointType::all() {
            let triple = &fields[joint.index() * 3..joint.index() * 3 + 3];
            if missing.contains(&joint) {
                assert_eq!(triple, ["N/A", "N/A", "N/A"], "{}", joint.name());
            } else {
                assert!(triple.iter().all(|f| f.parse::<f32>().is_ok()));
            }
        }
    }

    #[test]
    fn idle_blank_writes_bare_terminator() {
        let mut body = tracked_body();
        body.joint_mut(JointType::Head).tracking_state = TrackingState::NotTracked;

        let mut session = session(IdleRows::Blank);
        session.log_body(&body);
        assert_eq!(body_lines(&session), vec![String::new()]);
    }

    #[test]
    fn idle_none_writes_nothing() {
        let mut session = session(IdleRows::Suppressed);
        session.log_body(&tracked_body());
        assert!(body_lines(&session).is_empty());
        assert_eq!(session.rows_written(), 0);
    }

    #[test]
    fn idle_untracked_keeps_na_triples() {
        let mut body = tracked_body();
        body.joint_mut(JointType::FootLeft).tracking_state = TrackingState::NotTracked;
        body.joint_mut(JointType::FootRight).tracking_state = TrackingState::NotTracked;

        let mut session = session(IdleRows::Untracked);
        session.log_body(&body);
        assert_eq!(body_lines(&session), vec!["N/A,N/A,N/A,N/A,N/A,N/A,".to_string()]);
    }

    #[test]
    fn duplicate_bindings_are_rejected() {
        let err = KeyMap::new('a', vec![('1', "JOY".into()), ('a', "ANGER".into())]).unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateKey('a')));
    }
}
