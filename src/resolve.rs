//! Page backfill for foreign-key values
//!
//! Every history and media row must point at an existing page. When the
//! target has no page for an id, a placeholder page is created on the spot
//! and remembered for the rest of the run.

use crate::error::Result;
use crate::phase::Phase;
use crate::store::{Page, TargetDb};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// What [`PageResolver::ensure_page`] found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Existing,
    Created,
}

/// Ensures parent pages exist, one placeholder per distinct missing id
pub struct PageResolver<'a> {
    db: &'a TargetDb,
    phase: Phase,
    name_template: String,
    known: BTreeSet<i64>,
    created: Vec<i64>,
}

impl<'a> PageResolver<'a> {
    /// `name_template` is rendered with `{id}` replaced by the page id
    pub fn new(db: &'a TargetDb, phase: Phase, name_template: impl Into<String>) -> Self {
        Self {
            db,
            phase,
            name_template: name_template.into(),
            known: BTreeSet::new(),
            created: Vec::new(),
        }
    }

    /// Ensure a page exists, creating a placeholder when absent
    pub async fn ensure_page(&mut self, id: i64) -> Result<Resolution> {
        let name = self.name_template.replace("{id}", &id.to_string());
        self.ensure_named_page(id, &name).await
    }

    /// Ensure a page exists, creating it with `name` when absent
    pub async fn ensure_named_page(&mut self, id: i64, name: &str) -> Result<Resolution> {
        if self.known.contains(&id) {
            return Ok(Resolution::Existing);
        }

        if self.db.page_exists(id).await? {
            debug!(page_id = id, "Page already present");
            self.known.insert(id);
            return Ok(Resolution::Existing);
        }

        self.db
            .insert_page(&Page::new(id, name.to_string(), self.phase))
            .await?;
        info!(page_id = id, "Created page '{}'", name);

        self.known.insert(id);
        self.created.push(id);
        Ok(Resolution::Created)
    }

    /// Ids of pages created during this run, in creation order
    pub fn created(&self) -> &[i64] {
        &self.created
    }
}
