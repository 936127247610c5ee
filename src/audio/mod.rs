pub mod permission;

#[cfg(feature = "microphone")]
pub use permission::CpalPermissionGate;
pub use permission::{gate_for_mode, AssumeGranted, MicrophoneGrant, PermissionDenied, PermissionGate};
