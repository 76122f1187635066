use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::Session;

use crate::detection::domain::adapter_config::Delegate;

/// Execution providers for a delegate on the current platform.
///
/// `Gpu` prefers CoreML on macOS and DirectML on Windows; everything else
/// runs on the default CPU provider.
pub fn execution_providers(delegate: Delegate) -> Vec<ExecutionProviderDispatch> {
    if delegate == Delegate::Cpu {
        return vec![];
    }
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Builds a session for `model_path` on the given delegate.
pub fn build_session(
    model_path: &Path,
    delegate: Delegate,
) -> Result<Session, Box<dyn std::error::Error>> {
    let session = Session::builder()?
        .with_execution_providers(execution_providers(delegate))?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Square NCHW input size read from the model, or `fallback` when the
/// dimension is dynamic.
pub fn square_input_size(session: &Session, fallback: u32) -> u32 {
    session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 4 && shape[2] > 0 {
                    Some(shape[2] as u32)
                } else {
                    None
                }
            } else {
                None
            }
        })
        .unwrap_or(fallback)
}
