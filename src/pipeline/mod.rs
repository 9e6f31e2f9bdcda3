pub mod depth_converter;
pub mod frame_store;
pub mod sensor;
pub mod skeleton;
pub mod synthetic;

// Re-exports for convenience
pub use frame_store::FrameStore;
pub use sensor::Sensor;
pub use synthetic::SyntheticSensor;
