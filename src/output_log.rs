use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{error::SnapshotError, pipeline::skeleton::JointType, types::CameraPoint};

pub const UNTRACKED_FIELDS: &str = "N/A,N/A,N/A,";

/// Append-only CSV sink: a title row, a header row with one `.x/.y/.z`
/// triple per joint, then label rows and coordinate rows in event order.
///
/// Every field is written with a trailing comma, so a full coordinate row is
/// 75 comma-terminated fields followed by a newline.
pub struct OutputLog<W: Write> {
    writer: W,
}

impl OutputLog<BufWriter<File>> {
    pub fn create(path: &Path, title: &str) -> Result<Self, SnapshotError> {
        let to_error = |source| SnapshotError::OutputLog {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(to_error)?;
        let log = Self::new(BufWriter::new(file), title).map_err(to_error)?;
        log::info!("writing skeletal tracking log to {}", path.display());
        Ok(log)
    }
}

impl<W: Write> OutputLog<W> {
    pub fn new(writer: W, title: &str) -> io::Result<Self> {
        let mut log = Self { writer };
        writeln!(log.writer, "{title}")?;
        for joint in JointType::all() {
            write!(log.writer, "{0}.x,{0}.y,{0}.z,", joint.name())?;
        }
        log.end_row()?;
        Ok(log)
    }

    pub fn push_position(&mut self, position: &CameraPoint) -> io::Result<()> {
        write!(
            self.writer,
            "{:.6},{:.6},{:.6},",
            position.x, position.y, position.z
        )
    }

    pub fn push_untracked(&mut self) -> io::Result<()> {
        self.writer.write_all(UNTRACKED_FIELDS.as_bytes())
    }

    /// Terminates the current row. Coordinate rows stay buffered until the
    /// next `flush`.
    pub fn end_row(&mut self) -> io::Result<()> {
        self.writer.write_all(b"\n")
    }

    /// Label rows are flushed immediately.
    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        self.writer.write_all(label.as_bytes())?;
        self.end_row()?;
        self.writer.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> Drop for OutputLog<W> {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            log::warn!("failed to flush output log on close: {err:?}");
        }
    }
}
