//! Editors - Retirement Migration and Identity Checks

use serde::Serialize;

use crate::config::Person;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::status::StatusInfo;

const RULE: &str = "editors";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorRoster {
    pub editors: Vec<Person>,
    pub former_editors: Vec<Person>,
}

/// Moves retired editors to the former list, keeping relative order.
/// Running it again on its own output moves nothing.
pub fn migrate_retired(editors: Vec<Person>, former_editors: Vec<Person>) -> EditorRoster {
    let mut roster = EditorRoster {
        editors: Vec::with_capacity(editors.len()),
        former_editors,
    };
    for editor in editors {
        if editor.is_retired() {
            roster.former_editors.push(editor);
        } else {
            roster.editors.push(editor);
        }
    }
    roster
}

pub fn resolve_editors(
    editors: &[Person],
    former_editors: &[Person],
    status: &StatusInfo,
    diags: &mut Diagnostics,
) -> EditorRoster {
    let roster = migrate_retired(editors.to_vec(), former_editors.to_vec());

    if roster.editors.is_empty() {
        diags.push(
            Diagnostic::error(RULE, "At least one editor is required.")
                .with_hint("Add one or more editors using the `editors` configuration option."),
        );
    } else if status.facets.is_rec_track {
        for (i, editor) in roster.editors.iter().enumerate() {
            if editor.has_w3cid() {
                continue;
            }
            let who = match editor.name.as_deref().filter(|n| !n.is_empty()) {
                Some(name) => format!("\"{name}\""),
                None => format!("number {}", i + 1),
            };
            diags.push(
                Diagnostic::error(RULE, format!("Editor {who} is missing their `w3cid`."))
                    .with_hint("Add the editor's `w3cid` to their entry in `editors`.")
                    .with_element(format!("editors[{i}]")),
            );
        }
    }

    roster
}
