//! Minimal ALTER fragment planning for column changes.
//!
//! Given the old and new definition of one column, the planner emits zero
//! or more independent ALTER fragments. Each fragment is only produced
//! when the dialect has a usable template for it; a dialect without a
//! drop-not-null template simply cannot relax an existing NOT NULL, and
//! the fragment is skipped rather than raised as an error.

use crate::core::identifier::TableIdentifier;
use crate::core::schema::ColumnDef;
use crate::dialect::Dialect;
use crate::templates::{
    fill, TemplateKind, TemplateStore, PH_COLUMN_NAME, PH_COMMENT, PH_DATA_TYPE,
    PH_DEFAULT_VALUE, PH_NEW_COLUMN_NAME, PH_TABLE_NAME,
};

/// Computes ALTER fragments between two versions of a column.
pub struct ColumnChangePlanner<'a> {
    dialect: &'a Dialect,
    templates: &'a TemplateStore,
}

impl<'a> ColumnChangePlanner<'a> {
    /// Create a planner over the given dialect and template store.
    pub fn new(dialect: &'a Dialect, templates: &'a TemplateStore) -> Self {
        Self { dialect, templates }
    }

    /// Plan the fragments to turn `old` into `new`.
    ///
    /// Returns an empty list when nothing changed or nothing the dialect
    /// can express changed. The caller joins fragments with its statement
    /// separator.
    pub fn plan(
        &self,
        table: &TableIdentifier,
        old: &ColumnDef,
        new: &ColumnDef,
    ) -> Vec<String> {
        let mut fragments = Vec::new();

        if let Some(stmt) = self.type_change(table, old, new) {
            fragments.push(stmt);
        }
        if let Some(stmt) = self.nullability_change(table, old, new) {
            fragments.push(stmt);
        }
        if let Some(stmt) = self.default_change(table, old, new) {
            fragments.push(stmt);
        }
        if let Some(stmt) = self.comment_change(table, old, new) {
            fragments.push(stmt);
        }
        if let Some(stmt) = self.rename(table, old, new) {
            fragments.push(stmt);
        }

        fragments
    }

    /// Fill the placeholders shared by every fragment kind.
    ///
    /// Rename templates on some dialects restate the full column
    /// definition, so the data type is always available here and the
    /// substitution order (table, names, type) matches the template
    /// contract.
    fn fill_common(&self, template: &str, table: &TableIdentifier, old: &ColumnDef, new: &ColumnDef) -> String {
        let table_name = super::qualify(self.dialect, table);
        fill(
            template,
            &[
                (PH_TABLE_NAME, &table_name),
                (PH_COLUMN_NAME, &self.dialect.quote_if_needed(&old.name)),
                (PH_NEW_COLUMN_NAME, &self.dialect.quote_if_needed(&new.name)),
                (PH_DATA_TYPE, new.dialect_type.trim()),
            ],
        )
    }

    fn type_change(
        &self,
        table: &TableIdentifier,
        old: &ColumnDef,
        new: &ColumnDef,
    ) -> Option<String> {
        if old.dialect_type.trim() == new.dialect_type.trim() {
            return None;
        }
        let template = self
            .templates
            .template(TemplateKind::AlterColumnType, self.dialect.id())?;
        Some(self.fill_common(template, table, old, new))
    }

    fn nullability_change(
        &self,
        table: &TableIdentifier,
        old: &ColumnDef,
        new: &ColumnDef,
    ) -> Option<String> {
        if old.is_nullable == new.is_nullable {
            return None;
        }
        let kind = if new.is_nullable {
            TemplateKind::DropNotNull
        } else {
            TemplateKind::SetNotNull
        };
        let template = self.templates.template(kind, self.dialect.id())?;
        Some(self.fill_common(template, table, old, new))
    }

    fn default_change(
        &self,
        table: &TableIdentifier,
        old: &ColumnDef,
        new: &ColumnDef,
    ) -> Option<String> {
        let old_default = old.trimmed_default();
        let new_default = new.trimmed_default();
        if old_default == new_default {
            return None;
        }

        match new_default {
            Some(value) => {
                let template = self
                    .templates
                    .template(TemplateKind::SetDefault, self.dialect.id())?;
                Some(fill(
                    &self.fill_common(template, table, old, new),
                    &[(PH_DEFAULT_VALUE, value)],
                ))
            }
            None => {
                // Prefer the dedicated drop-default form; fall back to
                // setting an explicit NULL default through the combined
                // alter-default template.
                if let Some(template) = self
                    .templates
                    .template(TemplateKind::DropDefault, self.dialect.id())
                {
                    Some(self.fill_common(template, table, old, new))
                } else {
                    let template = self
                        .templates
                        .template(TemplateKind::SetDefault, self.dialect.id())?;
                    Some(fill(
                        &self.fill_common(template, table, old, new),
                        &[(PH_DEFAULT_VALUE, "NULL")],
                    ))
                }
            }
        }
    }

    fn comment_change(
        &self,
        table: &TableIdentifier,
        old: &ColumnDef,
        new: &ColumnDef,
    ) -> Option<String> {
        let old_comment = old.trimmed_comment().unwrap_or_default();
        let new_comment = new.trimmed_comment().unwrap_or_default();
        if old_comment == new_comment {
            return None;
        }

        let template = self
            .templates
            .template(TemplateKind::ColumnComment, self.dialect.id())?;
        let escaped = new_comment.replace('\'', "''");
        Some(fill(
            &self.fill_common(template, table, old, new),
            &[(PH_COMMENT, &escaped)],
        ))
    }

    fn rename(
        &self,
        table: &TableIdentifier,
        old: &ColumnDef,
        new: &ColumnDef,
    ) -> Option<String> {
        if old.name == new.name {
            return None;
        }
        let template = self
            .templates
            .template(TemplateKind::RenameColumn, self.dialect.id())?;
        Some(self.fill_common(template, table, old, new))
    }
}
