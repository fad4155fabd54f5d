//! Interactive target selection
//!
//! Used when no target is given on the command line: lists the running pod
//! containers of the namespace and lets the operator pick one.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use thiserror::Error;

use crate::kubernetes::KubePod;
use crate::target::identifier::SEPARATOR;

/// Rows visible at once in the selection list
const LIST_HEIGHT: usize = 14;

#[derive(Debug, Error)]
pub enum PickerError {
    #[error("Selection prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Asks the operator to choose one of `items`.
///
/// Returns None when the operator aborts.
pub trait TargetPicker {
    fn pick(&self, title: &str, items: &[String]) -> Result<Option<String>, PickerError>;
}

/// One `"<pod>: <container>"` entry per declared container
pub fn picker_entries(pods: &[KubePod]) -> Vec<String> {
    pods.iter()
        .flat_map(|pod| {
            pod.containers
                .iter()
                .map(move |container| format!("{}{}{}", pod.name, SEPARATOR, container))
        })
        .collect()
}

/// Title shown above the list
pub fn picker_title(pod_count: usize, namespace: &str) -> String {
    format!("There are {} running pods in {}:", pod_count, namespace)
}

/// Terminal list picker (arrow keys + enter, Esc/q aborts)
#[derive(Debug, Default)]
pub struct DialoguerPicker;

impl TargetPicker for DialoguerPicker {
    fn pick(&self, title: &str, items: &[String]) -> Result<Option<String>, PickerError> {
        if items.is_empty() {
            eprintln!("{}", title);
            return Ok(None);
        }

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(title)
            .items(items)
            .default(0)
            .max_length(LIST_HEIGHT)
            .interact_opt()?;

        Ok(selection.map(|index| items[index].clone()))
    }
}
