//! Probing for host tools.

use anyhow::Result;
use oob_guard_utils::{new_command, CommandRunExt};

use crate::config::ToolRequirement;
use crate::GuardError;

/// Run the probe for a single tool; a probe that fails to spawn means
/// the tool is not there.
fn tool_present(tool: &ToolRequirement) -> bool {
    match new_command(&tool.probe) {
        Ok(mut cmd) => cmd.probe(),
        Err(e) => {
            tracing::warn!("Invalid probe for {}: {e}", tool.name);
            false
        }
    }
}

/// Return the names of all tools whose probe does not succeed, in order.
pub fn missing_tools(tools: &[ToolRequirement]) -> Vec<String> {
    tools
        .iter()
        .filter(|tool| !tool_present(tool))
        .map(|tool| tool.name.clone())
        .collect()
}

/// Probe every required tool and fail listing all of the missing ones.
pub fn check_tools(tools: &[ToolRequirement]) -> Result<()> {
    let missing = missing_tools(tools);
    if missing.is_empty() {
        tracing::debug!("All {} required tools found", tools.len());
        return Ok(());
    }
    for name in &missing {
        tracing::warn!("Required tool not found: {name}");
    }
    Err(GuardError::MissingTools(missing).into())
}
