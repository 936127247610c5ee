use crate::config::PermissionMode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Proof that the microphone could be opened. Holds no device handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MicrophoneGrant;

/// Microphone access was refused or no usable input device exists
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("microphone permission denied: {reason}")]
pub struct PermissionDenied {
    pub reason: String,
}

impl PermissionDenied {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Checks microphone access before a call may start.
///
/// Implementations must release whatever capture handle they open before
/// returning; the live capture during a call belongs to the voice engine.
#[async_trait::async_trait]
pub trait PermissionGate: Send + Sync {
    async fn acquire_microphone(&self) -> Result<MicrophoneGrant, PermissionDenied>;

    /// Gate name for logging
    fn name(&self) -> &str;
}

/// Grants every request without touching hardware
#[derive(Debug, Default)]
pub struct AssumeGranted;

#[async_trait::async_trait]
impl PermissionGate for AssumeGranted {
    async fn acquire_microphone(&self) -> Result<MicrophoneGrant, PermissionDenied> {
        Ok(MicrophoneGrant)
    }

    fn name(&self) -> &str {
        "assume-granted"
    }
}

/// Opens the default input device with cpal, starts it, and drops it again
#[cfg(feature = "microphone")]
#[derive(Debug, Default)]
pub struct CpalPermissionGate;

#[cfg(feature = "microphone")]
#[async_trait::async_trait]
impl PermissionGate for CpalPermissionGate {
    async fn acquire_microphone(&self) -> Result<MicrophoneGrant, PermissionDenied> {
        // cpal::Stream is !Send, so the whole probe stays on one blocking thread
        tokio::task::spawn_blocking(probe_default_input)
            .await
            .map_err(|e| PermissionDenied::new(format!("microphone probe task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

#[cfg(feature = "microphone")]
fn probe_default_input() -> Result<MicrophoneGrant, PermissionDenied> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| PermissionDenied::new("no input device available"))?;

    let supported = device
        .default_input_config()
        .map_err(|e| PermissionDenied::new(format!("failed to read input config: {}", e)))?;

    let stream = device
        .build_input_stream_raw(
            &supported.config(),
            supported.sample_format(),
            |_data: &cpal::Data, _: &cpal::InputCallbackInfo| {},
            |err| warn!("Microphone probe stream error: {}", err),
            None,
        )
        .map_err(|e| PermissionDenied::new(format!("failed to open input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| PermissionDenied::new(format!("failed to start input stream: {}", e)))?;

    drop(stream);

    Ok(MicrophoneGrant)
}

/// Pick the gate for the configured permission mode
pub fn gate_for_mode(mode: PermissionMode) -> Arc<dyn PermissionGate> {
    match mode {
        PermissionMode::AssumeGranted => {
            info!("Microphone permission checks disabled by config");
            Arc::new(AssumeGranted)
        }
        PermissionMode::Probe => probe_gate(),
    }
}

#[cfg(feature = "microphone")]
fn probe_gate() -> Arc<dyn PermissionGate> {
    Arc::new(CpalPermissionGate)
}

#[cfg(not(feature = "microphone"))]
fn probe_gate() -> Arc<dyn PermissionGate> {
    warn!("Built without the `microphone` feature; assuming permission is granted");
    Arc::new(AssumeGranted)
}
