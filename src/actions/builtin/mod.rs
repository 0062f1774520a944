//! The stock action set: files, web, search, shell and result presentation.

pub mod files;
pub mod present;
pub mod search;
pub mod shell;
pub mod web;

pub use files::{ReadFile, WriteFile};
pub use present::PresentResult;
pub use search::GoogleSearch;
pub use shell::RunCommand;
pub use web::BrowseUrl;

use super::registry::ActionRegistry;

/// Registry holding all six stock actions under their usual names.
pub fn standard_registry(search: GoogleSearch, present: PresentResult) -> ActionRegistry {
    ActionRegistry::new()
        .add(
            "read_file",
            1,
            "Read the content of a file. Argument: (path)",
            ReadFile,
        )
        .add(
            "write_file",
            2,
            "Write data to a file. Arguments: (path, data)",
            WriteFile,
        )
        .add(
            "browse_url",
            1,
            "Access a URL and retrieve its content. If this fails, consider browsing another site from the search results. Argument: (url)",
            BrowseUrl::new(),
        )
        .add(
            "search_web",
            1,
            "Perform a web search and return results. Argument: (query)",
            search,
        )
        .add(
            "run_command",
            1,
            "Run a shell command and return output. Argument: (cmd)",
            RunCommand,
        )
        .add(
            "present_result",
            1,
            "Output a result to the user. Argument: (result)",
            present,
        )
}
