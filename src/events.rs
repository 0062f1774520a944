/// Events emitted during agent execution, for UI streaming.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    RoleCreated { objective: String, role: String },
    Text { content: String },
    ActionCall { name: String, args: Vec<String> },
    ActionResult { name: String, output: String, is_error: bool },
    /// Output handed to the user by the `present_result` action.
    Presented { content: String },
}
