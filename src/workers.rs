//! Background threads owned by the dashboard and their shutdown.

use std::thread::JoinHandle;

use tracing::{info, warn};

use crate::core::errors::SamplerError;
use crate::sample_loop::CancelToken;

/// The sampler and input threads sharing one cancel token.
pub struct Workers {
    cancel: CancelToken,
    sampler: JoinHandle<Result<u64, SamplerError>>,
    input: Option<JoinHandle<()>>,
}

impl Workers {
    pub fn new(
        cancel: CancelToken,
        sampler: JoinHandle<Result<u64, SamplerError>>,
        input: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            cancel,
            sampler,
            input,
        }
    }

    /// Cancels and joins every worker. Returns the sampler's tick count, or
    /// `None` if it failed or panicked.
    pub fn shutdown(self) -> Option<u64> {
        self.cancel.cancel();

        let ticks = match self.sampler.join() {
            Ok(Ok(ticks)) => {
                info!("Sampler stopped after {ticks} ticks");
                Some(ticks)
            }
            Ok(Err(err)) => {
                warn!("Sampler ended with error: {err}");
                None
            }
            Err(_) => {
                warn!("Sampler thread panicked");
                None
            }
        };
        if let Some(input) = self.input {
            if input.join().is_err() {
                warn!("Input thread panicked");
            }
        }
        ticks
    }
}
