use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::workspace::Workspace;

/// Tabs saved to disk: `{"tabs": [{"title", "text", "closed"}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub tabs: Vec<SessionTab>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTab {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub closed: bool,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let contents = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| SessionError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let io_error = |source: std::io::Error| SessionError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|source| SessionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, contents).map_err(io_error)
    }

    /// Open tabs in tab order, then closed tabs oldest first. A preview tab is
    /// saved as closed.
    pub fn capture(workspace: &Workspace) -> Self {
        let preview = workspace.preview();
        let mut tabs: Vec<SessionTab> = workspace
            .tabs()
            .iter()
            .filter(|b| Some(b.id) != preview)
            .map(|b| SessionTab {
                title: b.title.clone(),
                text: b.text.to_string(),
                closed: false,
            })
            .collect();

        let mut closed: Vec<_> = workspace
            .tabs()
            .iter()
            .filter(|b| Some(b.id) == preview)
            .chain(workspace.closed_tabs())
            .collect();
        closed.sort_by_key(|b| b.closed_at_seq());
        tabs.extend(closed.into_iter().map(|b| SessionTab {
            title: b.title.clone(),
            text: b.text.to_string(),
            closed: true,
        }));

        Self { tabs }
    }

    /// Rebuilds a workspace. Closed tabs keep their relative age and the first
    /// open tab ends up focused.
    pub fn into_workspace(self, retention: usize, max_tabs: usize) -> Result<Workspace, SessionError> {
        let mut workspace = Workspace::new(retention, max_tabs);
        for tab in self.tabs {
            let id = workspace.open_tab(Some(&tab.title), &tab.text)?;
            if tab.closed {
                workspace.close_tab(id)?;
            }
        }

        if let Some(first) = workspace.tabs().first().map(|b| b.id) {
            workspace.activate(first)?;
        }

        log::debug!(
            "restored {} open and {} closed tabs",
            workspace.tabs().len(),
            workspace.closed_tabs().len()
        );
        Ok(workspace)
    }
}
