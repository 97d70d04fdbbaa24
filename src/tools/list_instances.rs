//! `list_instances`: discover other live sessions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::{local_time, ToolHandlers};
use crate::error::ToolError;
use crate::store::Instance;

pub const NAME: &str = "list_instances";
pub const DESCRIPTION: &str = "List all running clauder instances across different directories. \
Use this to discover other sessions you can communicate with.";

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListInstancesParams {}

impl ToolHandlers {
    pub(crate) fn list_instances(&self, _params: ListInstancesParams) -> Result<String, ToolError> {
        let instances = self.instances.live_instances()?;
        Ok(render_instances(&instances, &self.instance_id))
    }
}

fn render_instances(instances: &[Instance], current_id: &str) -> String {
    if instances.is_empty() {
        return "No other running instances found.".into();
    }

    let mut out = format!("Found {} running instance(s):\n\n", instances.len());
    for inst in instances {
        let marker = if inst.id == current_id { " (this instance)" } else { "" };
        let _ = writeln!(out, "**{}**{}", inst.id, marker);
        let _ = writeln!(out, "  Directory: {}", inst.directory);
        let _ = writeln!(out, "  Started: {}", local_time(inst.started_at, "%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "  Last heartbeat: {}\n", local_time(inst.last_heartbeat, "%H:%M:%S"));
    }
    out
}
