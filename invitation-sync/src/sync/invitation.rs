//! Guest rows to invitation records
//!
//! Turns raw spreadsheet rows into [`Invitation`] records and assembles the
//! slug-keyed [`InvitationMap`] that gets published.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::slug::slugify;

/// One spreadsheet row as plain text cells
pub type GuestRow = Vec<String>;

/// A single guest invitation as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub name: String,
    pub domicile: String,
    pub priority: u32,
    pub invitee: String,
    pub gender: String,
    #[serde(default)]
    pub prefix: String,
    /// Slug derived from `name`, also the map key
    pub key: String,
}

/// Invitations keyed by slug. Rebuilt from scratch on every run.
pub type InvitationMap = BTreeMap<String, Invitation>;

/// Column positions of the guest sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub name: usize,
    pub domicile: usize,
    pub priority: usize,
    pub invitee: usize,
    pub gender: usize,
    /// Optional trailing column, the API drops it when the cell is empty
    pub prefix: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            name: 0,
            domicile: 1,
            priority: 2,
            invitee: 3,
            gender: 4,
            prefix: 5,
        }
    }
}

impl ColumnLayout {
    /// Minimum number of cells a row needs, i.e. every required column
    pub fn required_len(&self) -> usize {
        [
            self.name,
            self.domicile,
            self.priority,
            self.invitee,
            self.gender,
        ]
        .into_iter()
        .max()
        .map_or(0, |max| max + 1)
    }
}

/// Validation failure for a single guest row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Row has fewer cells than the layout requires
    MissingColumns {
        index: usize,
        sheet_row: usize,
        found: usize,
        required: usize,
    },
    /// Name produced an empty slug
    EmptyKey {
        index: usize,
        sheet_row: usize,
        name: String,
    },
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::MissingColumns {
                index,
                sheet_row,
                found,
                required,
            } => write!(
                f,
                "row {} (sheet row {}) has {} cells, expected at least {}",
                index, sheet_row, found, required
            ),
            RowError::EmptyKey {
                index,
                sheet_row,
                name,
            } => write!(
                f,
                "row {} (sheet row {}) name {:?} does not produce a usable key",
                index, sheet_row, name
            ),
        }
    }
}

impl std::error::Error for RowError {}

/// Result of building invitations from a batch of rows
#[derive(Debug, Clone, Default)]
pub struct BuiltInvitations {
    /// One invitation per row, in sheet order
    pub invitations: Vec<Invitation>,
    /// Sheet row of the first data row, used to address link cells
    pub first_sheet_row: usize,
}

impl BuiltInvitations {
    /// Sheet row number of the invitation at `index`
    pub fn sheet_row(&self, index: usize) -> usize {
        self.first_sheet_row + index
    }

    /// Collapse into the publishable map. Later rows overwrite earlier rows
    /// that share a key.
    pub fn into_map(self) -> InvitationMap {
        let mut map = InvitationMap::new();
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();

        for (index, invitation) in self.invitations.into_iter().enumerate() {
            let sheet_row = self.first_sheet_row + index;
            if let Some(previous) = seen.insert(invitation.key.clone(), sheet_row) {
                warn!(
                    "Duplicate key '{}': sheet row {} replaces sheet row {}",
                    invitation.key, sheet_row, previous
                );
            }
            map.insert(invitation.key.clone(), invitation);
        }

        map
    }
}

/// Parse the priority cell. Anything that is not a non-negative integer is 0.
pub fn parse_priority(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// Build one invitation from a row
pub fn build_invitation(
    row: &[String],
    layout: &ColumnLayout,
    index: usize,
    sheet_row: usize,
) -> Result<Invitation, RowError> {
    let required = layout.required_len();
    if row.len() < required {
        return Err(RowError::MissingColumns {
            index,
            sheet_row,
            found: row.len(),
            required,
        });
    }

    let name = row[layout.name].clone();
    let key = slugify(&name);
    if key.is_empty() {
        return Err(RowError::EmptyKey {
            index,
            sheet_row,
            name,
        });
    }

    let raw_priority = &row[layout.priority];
    let priority = parse_priority(raw_priority).unwrap_or_else(|| {
        warn!(
            "Sheet row {}: priority {:?} is not a number, using 0",
            sheet_row, raw_priority
        );
        0
    });

    let prefix = row.get(layout.prefix).cloned().unwrap_or_default();

    Ok(Invitation {
        name,
        domicile: row[layout.domicile].clone(),
        priority,
        invitee: row[layout.invitee].clone(),
        gender: row[layout.gender].clone(),
        prefix,
        key,
    })
}

/// Build invitations for every row. The first invalid row aborts the batch.
pub fn build_invitations(
    rows: &[GuestRow],
    layout: &ColumnLayout,
    first_sheet_row: usize,
) -> Result<BuiltInvitations, RowError> {
    let invitations = rows
        .iter()
        .enumerate()
        .map(|(index, row)| build_invitation(row, layout, index, first_sheet_row + index))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Built {} invitations", invitations.len());

    Ok(BuiltInvitations {
        invitations,
        first_sheet_row,
    })
}
