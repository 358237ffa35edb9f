use std::path::Path;
use std::sync::Arc;

use super::{Command, CommandArgs, SELECT_INTERPRETER};
use crate::host::{FilePickOptions, Host, PickItem};
use crate::interpreter::{InterpreterInformation, InterpreterService};
use crate::Result;

pub const BROWSE_LABEL: &str = "Browse...";
const PICK_TITLE: &str = "Select AutoHotkey interpreter";

/// Receives the interpreter the user picked.
pub type SelectionHandler = Box<dyn Fn(&dyn Host, InterpreterInformation) + Send + Sync>;

/// Lets the user choose among the current, discovered and a browsed interpreter.
pub struct SelectInterpreterCommand {
    service: Arc<InterpreterService>,
    on_select: SelectionHandler,
}

impl SelectInterpreterCommand {
    pub fn new(service: Arc<InterpreterService>, on_select: SelectionHandler) -> Self {
        Self { service, on_select }
    }

    /// Picker rows for `candidates`, the first marked current, plus the browse row.
    pub fn items(candidates: &[InterpreterInformation]) -> Vec<PickItem> {
        let mut items: Vec<PickItem> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let mut item = PickItem::new(candidate.path.clone());
                if index == 0 {
                    item = item.description("current");
                }
                let mut detail = candidate
                    .version
                    .clone()
                    .unwrap_or_else(|| "invalid interpreter".to_string());
                if let Some(arch) = &candidate.architecture {
                    detail.push_str(&format!(" ({arch})"));
                }
                item.detail(detail)
            })
            .collect();
        items.push(PickItem::new(BROWSE_LABEL).description("Enter a custom interpreter path"));
        items
    }

    fn browse(
        &self,
        host: &dyn Host,
        candidates: &[InterpreterInformation],
    ) -> Option<InterpreterInformation> {
        let default_dir = candidates
            .first()
            .and_then(|first| Path::new(&first.path).parent())
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf);
        let options = FilePickOptions {
            title: PICK_TITLE.to_string(),
            filters: vec![("Executable".to_string(), vec!["exe".to_string()])],
            default_dir,
        };
        let file = host.pick_file(&options)?;
        Some(InterpreterInformation::new(file.to_string_lossy().into_owned(), None))
    }
}

impl Command for SelectInterpreterCommand {
    fn id(&self) -> &'static str {
        SELECT_INTERPRETER
    }

    fn execute(&self, host: &dyn Host, _args: &CommandArgs) -> Result<()> {
        let candidates = self.service.candidates(&host.settings());
        let items = Self::items(&candidates);

        let Some(index) = host.pick(PICK_TITLE, &items) else {
            return Ok(());
        };
        let selected = match candidates.get(index) {
            Some(candidate) => Some(candidate.clone()),
            None if index == candidates.len() => self.browse(host, &candidates),
            None => None,
        };
        if let Some(selected) = selected {
            (self.on_select)(host, selected);
        }
        Ok(())
    }
}
