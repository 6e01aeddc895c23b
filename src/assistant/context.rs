use crate::core::note::Note;
use crate::core::task::Task;

pub const EMPTY_CONTEXT: &str = "No tasks or notes yet.";

/// How many of the newest notes go into the context.
pub const RECENT_NOTES: usize = 3;

/// Summarize tasks and the most recent notes for the model.
pub fn build_context(tasks: &[Task], notes: &[Note]) -> String {
    let mut context = String::new();

    if !tasks.is_empty() {
        context.push_str("Tasks:\n");
        for task in tasks {
            context.push_str(&format!(
                "- [{}] {}: {}",
                task.category, task.priority, task.text
            ));
            if task.completed {
                context.push_str(" (completed)");
            }
            context.push('\n');
        }
        context.push('\n');
    }

    if !notes.is_empty() {
        context.push_str("Recent notes:\n");
        let start = notes.len().saturating_sub(RECENT_NOTES);
        for note in &notes[start..] {
            context.push_str(&format!("- {}\n", note.text));
        }
    }

    if context.is_empty() {
        EMPTY_CONTEXT.to_string()
    } else {
        context
    }
}

pub fn system_prompt(context: &str) -> String {
    format!(
        "You are a helpful Daily AI Assistant designed to help users manage their tasks, notes, and productivity. \n\
         Current user context:\n\
         {}\n\n\
         Be concise, helpful, and actionable. If the user asks about their tasks, provide insights and suggestions.",
        context
    )
}

/// The single text part sent to the model.
pub fn compose_prompt(context: &str, message: &str) -> String {
    format!("{}\n\nUser: {}", system_prompt(context), message)
}
