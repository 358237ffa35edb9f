use tracing::debug;

use super::{Command, CommandArgs, FORMAT_DOCUMENT, LANGUAGE_ID};
use crate::host::{Host, Notification};
use crate::Result;

/// Formats a document through the language server's formatting provider.
#[derive(Debug, Default)]
pub struct FormatCommand;

impl FormatCommand {
    pub fn new() -> Self {
        Self
    }

    fn format(&self, host: &dyn Host, args: &CommandArgs) -> Result<()> {
        let document = args.resolve_document(host)?;
        let edits = host.format_document(&document)?;
        debug!(document = %document.display(), edits = edits.len(), "formatting document");
        if edits.is_empty() {
            return Ok(());
        }
        host.apply_edits(&document, &edits)
    }
}

impl Command for FormatCommand {
    fn id(&self) -> &'static str {
        FORMAT_DOCUMENT
    }

    fn on_register(&self, host: &dyn Host) {
        host.register_formatter(LANGUAGE_ID);
    }

    fn execute(&self, host: &dyn Host, args: &CommandArgs) -> Result<()> {
        self.format(host, args).inspect_err(|err| {
            host.notify(Notification::from_error(err));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Position, Range, TextEdit};
    use crate::testing::FakeHost;
    use std::path::PathBuf;

    fn edit(line: u32, text: &str) -> TextEdit {
        TextEdit {
            range: Range {
                start: Position { line, character: 0 },
                end: Position { line, character: 10 },
            },
            new_text: text.to_string(),
        }
    }

    #[test]
    fn applies_all_edits_in_one_transaction() {
        let host = FakeHost::new();
        let edits = vec![edit(0, "MsgBox, hi"), edit(3, "return")];
        *host.format_result.borrow_mut() = Some(Ok(edits.clone()));

        FormatCommand::new()
            .execute(&host, &CommandArgs::for_document("a.ahk"))
            .unwrap();

        let applied = host.applied.borrow();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0], (PathBuf::from("a.ahk"), edits));
    }

    #[test]
    fn no_edits_applies_nothing() {
        let host = FakeHost::new();
        FormatCommand::new()
            .execute(&host, &CommandArgs::for_document("a.ahk"))
            .unwrap();
        assert!(host.applied.borrow().is_empty());
        assert!(host.notifications().is_empty());
    }

    #[test]
    fn provider_failure_is_reported_and_nothing_applied() {
        let host = FakeHost::new();
        *host.format_result.borrow_mut() = Some(Err("server crashed".to_string()));

        assert!(FormatCommand::new()
            .execute(&host, &CommandArgs::for_document("a.ahk"))
            .is_err());
        assert!(host.applied.borrow().is_empty());
        assert!(host.notifications()[0].message.contains("server crashed"));
    }

    #[test]
    fn registration_routes_language_formatting() {
        let host = FakeHost::new();
        FormatCommand::new().on_register(&host);
        assert_eq!(*host.formatters.borrow(), vec![LANGUAGE_ID.to_string()]);
    }
}
