//! GPU Error Recovery
//!
//! Keeps a failed GPU operation from taking the frame down with it.
//! Creation calls run inside wgpu error scopes so an allocation failure
//! becomes a value the caller can replace with a placeholder; submissions
//! run under `catch_unwind` and trip a device-lost flag after repeated
//! failures.

use crate::error::LightingError;
use std::any::Any;
use std::panic;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Consecutive failures tolerated before the device is treated as lost
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// GPU error recovery state shared by every pass of one pipeline
pub struct GpuErrorRecovery {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    /// Set from the uncaptured-error callback as well as from here
    device_lost: Arc<AtomicBool>,

    error_count: AtomicU32,
    max_errors: u32,
}

impl GpuErrorRecovery {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let device_lost = Arc::new(AtomicBool::new(false));
        let device_lost_flag = device_lost.clone();

        device.on_uncaptured_error(Box::new(move |error| match error {
            wgpu::Error::OutOfMemory { .. } => {
                log::error!("[GpuRecovery] GPU out of memory");
                device_lost_flag.store(true, Ordering::Relaxed);
            }
            wgpu::Error::Validation { description, .. } => {
                log::error!("[GpuRecovery] Uncaptured validation error: {}", description);
            }
        }));

        Self {
            device,
            queue,
            device_lost,
            error_count: AtomicU32::new(0),
            max_errors: MAX_CONSECUTIVE_ERRORS,
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn is_device_lost(&self) -> bool {
        self.device_lost.load(Ordering::Relaxed)
    }

    /// Run a GPU operation, converting panics into errors
    pub fn execute_with_recovery<F, R>(&self, operation: F) -> Result<R, GpuRecoveryError>
    where
        F: FnOnce() -> Result<R, GpuRecoveryError>,
    {
        if self.is_device_lost() {
            return Err(GpuRecoveryError::DeviceLost);
        }

        match panic::catch_unwind(panic::AssertUnwindSafe(operation)) {
            Ok(Ok(value)) => {
                self.error_count.store(0, Ordering::Relaxed);
                Ok(value)
            }
            Ok(Err(e)) => {
                log::warn!("[GpuRecovery] Operation failed: {}", e);
                self.record_failure()?;
                Err(e)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("[GpuRecovery] GPU operation panicked: {}", message);
                self.device_lost.store(true, Ordering::Relaxed);
                Err(GpuRecoveryError::Panic { message })
            }
        }
    }

    fn record_failure(&self) -> Result<(), GpuRecoveryError> {
        let count = self.error_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count > self.max_errors {
            log::error!(
                "[GpuRecovery] Too many GPU errors ({}), treating device as lost",
                count
            );
            self.device_lost.store(true, Ordering::Relaxed);
            return Err(GpuRecoveryError::TooManyErrors { count });
        }
        Ok(())
    }

    /// Create a resource inside validation and out-of-memory error scopes
    pub fn create_scoped<F, R>(&self, label: &str, create: F) -> Result<R, GpuRecoveryError>
    where
        F: FnOnce(&wgpu::Device) -> R,
    {
        self.execute_with_recovery(|| {
            self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);

            let resource = create(&self.device);

            let validation = pollster::block_on(self.device.pop_error_scope());
            let out_of_memory = pollster::block_on(self.device.pop_error_scope());

            match validation.or(out_of_memory) {
                None => Ok(resource),
                Some(error) => Err(GpuRecoveryError::OperationFailed {
                    message: format!("{}: {}", label, error),
                }),
            }
        })
    }

    pub fn submit_with_recovery(
        &self,
        command_buffers: Vec<wgpu::CommandBuffer>,
    ) -> Result<wgpu::SubmissionIndex, GpuRecoveryError> {
        self.execute_with_recovery(|| Ok(self.queue.submit(command_buffers)))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

/// GPU recovery errors
#[derive(Debug, thiserror::Error)]
pub enum GpuRecoveryError {
    #[error("GPU device lost")]
    DeviceLost,

    #[error("Too many GPU errors: {count}")]
    TooManyErrors { count: u32 },

    #[error("GPU operation panicked: {message}")]
    Panic { message: String },

    #[error("Shader validation failed: {message}")]
    ShaderValidation { message: String },

    #[error("GPU operation failed: {message}")]
    OperationFailed { message: String },
}

impl From<GpuRecoveryError> for LightingError {
    fn from(error: GpuRecoveryError) -> Self {
        match error {
            GpuRecoveryError::ShaderValidation { message } => LightingError::ResourceCreation {
                resource: "shader".to_string(),
                error: message,
            },
            other => LightingError::Gpu {
                operation: "recovery".to_string(),
                error: other.to_string(),
            },
        }
    }
}

/// Attach context to foreign errors as `GpuRecoveryError`
pub trait GpuResultExt<T> {
    fn gpu_context(self, context: &str) -> Result<T, GpuRecoveryError>;
}

impl<T, E: std::fmt::Display> GpuResultExt<T> for Result<T, E> {
    fn gpu_context(self, context: &str) -> Result<T, GpuRecoveryError> {
        self.map_err(|e| GpuRecoveryError::OperationFailed {
            message: format!("{}: {}", context, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extraction() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("texture lost"));
        assert_eq!(panic_message(owned.as_ref()), "texture lost");

        let borrowed: Box<dyn Any + Send> = Box::new("bad bind group");
        assert_eq!(panic_message(borrowed.as_ref()), "bad bind group");

        let other: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(other.as_ref()), "Unknown panic");
    }

    #[test]
    fn test_conversion_into_lighting_error() {
        let err: LightingError = GpuRecoveryError::DeviceLost.into();
        assert!(matches!(err, LightingError::Gpu { .. }));

        let err: LightingError = GpuRecoveryError::ShaderValidation {
            message: "missing fs_main".to_string(),
        }
        .into();
        assert!(matches!(err, LightingError::ResourceCreation { .. }));
    }

    #[test]
    fn test_gpu_context() {
        let failed: Result<(), &str> = Err("map failed");
        let err = failed.gpu_context("readback").unwrap_err();
        assert_eq!(err.to_string(), "GPU operation failed: readback: map failed");
    }
}
