//! Sending one command to the backend and decoding its answer.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::AppError;
use super::validation::decode_response;
use crate::backend::Command;
use crate::core::BranchDeckCore;

/// Invoke `command` and return the raw payload.
///
/// `failure_message` stands in when the backend fails without a message.
pub async fn invoke_raw<A: Serialize + ?Sized>(
    core: &BranchDeckCore,
    command: Command,
    args: &A,
    failure_message: &str,
) -> Result<String, AppError> {
    let args = serde_json::to_value(args).map_err(|e| {
        AppError::unknown(format!("Failed to encode arguments for {command}"))
            .with_description(e.to_string())
    })?;

    tracing::debug!(command = %command, "Invoking backend command");
    core.backend().invoke(command, args).await.map_err(|failure| {
        tracing::warn!(command = %command, error = %failure, "Backend command failed");
        AppError::from_backend(failure, failure_message)
    })
}

/// Invoke `command` and decode its payload as `T`.
pub async fn invoke<T: DeserializeOwned, A: Serialize + ?Sized>(
    core: &BranchDeckCore,
    command: Command,
    args: &A,
    failure_message: &str,
    invalid_message: &str,
) -> Result<T, AppError> {
    let raw = invoke_raw(core, command, args, failure_message).await?;
    decode_response(&raw, invalid_message).inspect_err(|e| {
        tracing::warn!(command = %command, error = %e, "Backend response rejected");
    })
}
