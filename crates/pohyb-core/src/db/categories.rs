//! Category operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::Result;
use crate::models::{Category, INCOME_CATEGORY_NAME, UNCATEGORIZED_CATEGORY_NAME};

fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        color: row.get(3)?,
    })
}

impl Database {
    /// Create a category, or return the existing one with the same name
    pub fn create_category(
        &self,
        name: &str,
        icon: Option<&str>,
        color: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO categories (name, icon, color)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
            params![name, icon, color],
        )?;

        let id = conn.query_row(
            "SELECT id FROM categories WHERE name = ?",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// List every category, including the synthesized ones
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, icon, color FROM categories ORDER BY name")?;
        let categories = stmt
            .query_map([], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// List categories the classifier may pick from
    ///
    /// Excludes the synthesized income and uncategorized pseudo-categories;
    /// neither is a valid classifier target.
    pub fn list_assignable_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, icon, color FROM categories WHERE name NOT IN (?, ?) ORDER BY name",
        )?;
        let categories = stmt
            .query_map(
                params![INCOME_CATEGORY_NAME, UNCATEGORIZED_CATEGORY_NAME],
                row_to_category,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Look up a category by display name (case-insensitive)
    pub fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, icon, color FROM categories WHERE name = ? COLLATE NOCASE",
                params![name],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Get the synthesized income category, creating it on first use
    pub fn get_or_create_income_category(&self) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE name = ? LIMIT 1",
                params![INCOME_CATEGORY_NAME],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        drop(conn);
        self.create_category(INCOME_CATEGORY_NAME, Some("💰"), Some("#10b981"))
    }
}
