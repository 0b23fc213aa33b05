//! SQLite-backed store
//!
//! Lines and their analogs are normalized: `bom_line_analogs` is the edge
//! table between a line and each analog, indexed on the analog column so the
//! used-in query is an index lookup rather than a scan.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Store, StoreError};
use crate::core::identity::EntityId;
use crate::core::project::Project;
use crate::entities::{
    BomLine, Category, ComponentFamily, Nomenclature, OriginType, Parameter, UnitOfMeasure,
};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const CATEGORY_COLUMNS: &str = "id, name, parent_id, origin_type, hide_specification, created";
const UOM_COLUMNS: &str = "id, name, rounding, created";
const FAMILY_COLUMNS: &str = "id, name, uom_id, category_id, created";
const NOMENCLATURE_COLUMNS: &str =
    "id, family_id, name, code, currency, purchase_cost, material_cost, total_cost, created";
const PARAMETER_COLUMNS: &str = "id, nomenclature_id, name, value, uom_id, sequence, created";
const LINE_COLUMNS: &str =
    "l.id, l.parent_id, l.family_id, l.quantity, l.sequence, l.cost, l.line_total, l.created";

/// The catalog store backed by SQLite
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the catalog database of a project
    pub fn for_project(project: &Project) -> Result<Self, StoreError> {
        Self::open(&project.db_path())
    }

    /// Open or create a catalog database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// A throwaway database, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id TEXT,
                origin_type TEXT NOT NULL,
                hide_specification INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS uoms (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                rounding REAL NOT NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS families (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                uom_id TEXT,
                category_id TEXT,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS nomenclature (
                id TEXT PRIMARY KEY,
                family_id TEXT NOT NULL REFERENCES families(id),
                name TEXT,
                code TEXT UNIQUE,
                currency TEXT NOT NULL,
                purchase_cost REAL NOT NULL DEFAULT 0,
                material_cost REAL NOT NULL DEFAULT 0,
                total_cost REAL NOT NULL DEFAULT 0,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_nomenclature_family ON nomenclature(family_id);

            CREATE TABLE IF NOT EXISTS parameters (
                id TEXT PRIMARY KEY,
                nomenclature_id TEXT NOT NULL REFERENCES nomenclature(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                value REAL NOT NULL,
                uom_id TEXT,
                sequence INTEGER NOT NULL DEFAULT 10,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_parameters_nomenclature ON parameters(nomenclature_id, sequence);

            -- Lines go away with their owner
            CREATE TABLE IF NOT EXISTS bom_lines (
                id TEXT PRIMARY KEY,
                parent_id TEXT NOT NULL REFERENCES nomenclature(id) ON DELETE CASCADE,
                family_id TEXT NOT NULL REFERENCES families(id),
                quantity REAL NOT NULL,
                sequence INTEGER NOT NULL DEFAULT 10,
                cost REAL NOT NULL DEFAULT 0,
                line_total REAL NOT NULL DEFAULT 0,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_bom_lines_parent ON bom_lines(parent_id, sequence);

            -- A nomenclature cannot be deleted while it is somebody's analog
            CREATE TABLE IF NOT EXISTS bom_line_analogs (
                line_id TEXT NOT NULL REFERENCES bom_lines(id) ON DELETE CASCADE,
                nomenclature_id TEXT NOT NULL REFERENCES nomenclature(id) ON DELETE RESTRICT,
                position INTEGER NOT NULL,
                PRIMARY KEY (line_id, nomenclature_id)
            );
            CREATE INDEX IF NOT EXISTS idx_analogs_nomenclature ON bom_line_analogs(nomenclature_id);
            "#,
        )?;

        let version: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match version {
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
            }
            Some(v) if v != SCHEMA_VERSION => {
                return Err(StoreError::Corrupt(format!(
                    "catalog schema version {} (expected {})",
                    v, SCHEMA_VERSION
                )));
            }
            Some(_) => {}
        }

        Ok(())
    }

    fn analogs_of(&self, line: &EntityId) -> Result<Vec<EntityId>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT nomenclature_id FROM bom_line_analogs WHERE line_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![line.to_string()], |row| id_at(row, 0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Run a line query and attach each line's analogs
    fn query_lines(
        &self,
        sql: &str,
        param: &EntityId,
    ) -> Result<Vec<BomLine>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params![param.to_string()], line_from_row)?;
        let mut lines = rows.collect::<Result<Vec<_>, _>>()?;
        for line in &mut lines {
            line.analogs = self.analogs_of(&line.id)?;
        }
        Ok(lines)
    }

    fn count_users(&self, id: &EntityId) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bom_line_analogs WHERE nomenclature_id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl Store for SqliteStore {
    fn category(&self, id: &EntityId) -> Result<Option<Category>, StoreError> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], category_from_row)
            .optional()?)
    }

    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let sql = format!("SELECT {} FROM categories ORDER BY id", CATEGORY_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn save_category(&mut self, category: &Category) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT INTO categories (id, name, parent_id, origin_type, hide_specification, created)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   parent_id = excluded.parent_id,
                   origin_type = excluded.origin_type,
                   hide_specification = excluded.hide_specification"#,
            params![
                category.id.to_string(),
                category.name,
                category.parent.as_ref().map(|p| p.to_string()),
                category.origin_type.to_string(),
                category.hide_specification,
                category.created.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn uom(&self, id: &EntityId) -> Result<Option<UnitOfMeasure>, StoreError> {
        let sql = format!("SELECT {} FROM uoms WHERE id = ?1", UOM_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], uom_from_row)
            .optional()?)
    }

    fn uoms(&self) -> Result<Vec<UnitOfMeasure>, StoreError> {
        let sql = format!("SELECT {} FROM uoms ORDER BY id", UOM_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], uom_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn save_uom(&mut self, uom: &UnitOfMeasure) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT INTO uoms (id, name, rounding, created) VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(id) DO UPDATE SET name = excluded.name, rounding = excluded.rounding"#,
            params![
                uom.id.to_string(),
                uom.name,
                uom.rounding,
                uom.created.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn family(&self, id: &EntityId) -> Result<Option<ComponentFamily>, StoreError> {
        let sql = format!("SELECT {} FROM families WHERE id = ?1", FAMILY_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], family_from_row)
            .optional()?)
    }

    fn family_by_name(&self, name: &str) -> Result<Option<ComponentFamily>, StoreError> {
        let sql = format!("SELECT {} FROM families WHERE name = ?1", FAMILY_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![name], family_from_row)
            .optional()?)
    }

    fn families(&self) -> Result<Vec<ComponentFamily>, StoreError> {
        let sql = format!("SELECT {} FROM families ORDER BY id", FAMILY_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], family_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn save_family(&mut self, family: &ComponentFamily) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT INTO families (id, name, uom_id, category_id, created)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   uom_id = excluded.uom_id,
                   category_id = excluded.category_id"#,
            params![
                family.id.to_string(),
                family.name,
                family.uom.as_ref().map(|u| u.to_string()),
                family.category.as_ref().map(|c| c.to_string()),
                family.created.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn nomenclature(&self, id: &EntityId) -> Result<Option<Nomenclature>, StoreError> {
        let sql = format!(
            "SELECT {} FROM nomenclature WHERE id = ?1",
            NOMENCLATURE_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], nomenclature_from_row)
            .optional()?)
    }

    fn nomenclature_by_code(&self, code: &str) -> Result<Option<Nomenclature>, StoreError> {
        let sql = format!(
            "SELECT {} FROM nomenclature WHERE code = ?1",
            NOMENCLATURE_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![code], nomenclature_from_row)
            .optional()?)
    }

    fn nomenclatures(&self) -> Result<Vec<Nomenclature>, StoreError> {
        let sql = format!("SELECT {} FROM nomenclature ORDER BY id", NOMENCLATURE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], nomenclature_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn save_nomenclature(&mut self, nomenclature: &Nomenclature) -> Result<(), StoreError> {
        // Upsert rather than REPLACE: a REPLACE deletes the row first and
        // would cascade away the node's own lines.
        self.conn.execute(
            r#"INSERT INTO nomenclature
                   (id, family_id, name, code, currency, purchase_cost, material_cost, total_cost, created)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
               ON CONFLICT(id) DO UPDATE SET
                   family_id = excluded.family_id,
                   name = excluded.name,
                   code = excluded.code,
                   currency = excluded.currency,
                   purchase_cost = excluded.purchase_cost,
                   material_cost = excluded.material_cost,
                   total_cost = excluded.total_cost"#,
            params![
                nomenclature.id.to_string(),
                nomenclature.family.to_string(),
                nomenclature.name,
                nomenclature.code,
                nomenclature.currency,
                nomenclature.purchase_cost,
                nomenclature.material_cost,
                nomenclature.total_cost,
                nomenclature.created.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete_nomenclature(&mut self, id: &EntityId) -> Result<(), StoreError> {
        let users = self.count_users(id)?;
        if users > 0 {
            return Err(StoreError::Referenced {
                id: id.clone(),
                lines: users,
            });
        }
        let deleted = self.conn.execute(
            "DELETE FROM nomenclature WHERE id = ?1",
            params![id.to_string()],
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn parameter(&self, id: &EntityId) -> Result<Option<Parameter>, StoreError> {
        let sql = format!("SELECT {} FROM parameters WHERE id = ?1", PARAMETER_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], parameter_from_row)
            .optional()?)
    }

    fn parameters_of(&self, nomenclature: &EntityId) -> Result<Vec<Parameter>, StoreError> {
        let sql = format!(
            "SELECT {} FROM parameters WHERE nomenclature_id = ?1 ORDER BY sequence, id",
            PARAMETER_COLUMNS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![nomenclature.to_string()], parameter_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn save_parameter(&mut self, parameter: &Parameter) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT INTO parameters (id, nomenclature_id, name, value, uom_id, sequence, created)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               ON CONFLICT(id) DO UPDATE SET
                   nomenclature_id = excluded.nomenclature_id,
                   name = excluded.name,
                   value = excluded.value,
                   uom_id = excluded.uom_id,
                   sequence = excluded.sequence"#,
            params![
                parameter.id.to_string(),
                parameter.nomenclature.to_string(),
                parameter.name,
                parameter.value,
                parameter.uom.as_ref().map(|u| u.to_string()),
                parameter.sequence,
                parameter.created.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete_parameter(&mut self, id: &EntityId) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM parameters WHERE id = ?1", params![id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn bom_line(&self, id: &EntityId) -> Result<Option<BomLine>, StoreError> {
        let sql = format!("SELECT {} FROM bom_lines l WHERE l.id = ?1", LINE_COLUMNS);
        Ok(self.query_lines(&sql, id)?.into_iter().next())
    }

    fn bom_lines(&self) -> Result<Vec<BomLine>, StoreError> {
        let sql = format!("SELECT {} FROM bom_lines l ORDER BY l.id", LINE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], line_from_row)?;
        let mut lines = rows.collect::<Result<Vec<_>, _>>()?;
        for line in &mut lines {
            line.analogs = self.analogs_of(&line.id)?;
        }
        Ok(lines)
    }

    fn save_bom_line(&mut self, line: &BomLine) -> Result<(), StoreError> {
        let sp = self.conn.savepoint()?;
        sp.execute(
            r#"INSERT INTO bom_lines
                   (id, parent_id, family_id, quantity, sequence, cost, line_total, created)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               ON CONFLICT(id) DO UPDATE SET
                   parent_id = excluded.parent_id,
                   family_id = excluded.family_id,
                   quantity = excluded.quantity,
                   sequence = excluded.sequence,
                   cost = excluded.cost,
                   line_total = excluded.line_total"#,
            params![
                line.id.to_string(),
                line.parent.to_string(),
                line.family.to_string(),
                line.quantity,
                line.sequence,
                line.cost,
                line.line_total,
                line.created.to_rfc3339(),
            ],
        )?;
        sp.execute(
            "DELETE FROM bom_line_analogs WHERE line_id = ?1",
            params![line.id.to_string()],
        )?;
        for (position, analog) in line.analogs.iter().enumerate() {
            sp.execute(
                "INSERT INTO bom_line_analogs (line_id, nomenclature_id, position) VALUES (?1, ?2, ?3)",
                params![line.id.to_string(), analog.to_string(), position as i64],
            )?;
        }
        sp.commit()?;
        Ok(())
    }

    fn delete_bom_line(&mut self, id: &EntityId) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM bom_lines WHERE id = ?1", params![id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn lines_owned_by(&self, parent: &EntityId) -> Result<Vec<BomLine>, StoreError> {
        let sql = format!(
            "SELECT {} FROM bom_lines l WHERE l.parent_id = ?1 ORDER BY l.sequence, l.id",
            LINE_COLUMNS
        );
        self.query_lines(&sql, parent)
    }

    fn lines_using(&self, child: &EntityId) -> Result<Vec<BomLine>, StoreError> {
        let sql = format!(
            r#"SELECT {} FROM bom_lines l
               JOIN bom_line_analogs a ON a.line_id = l.id
               WHERE a.nomenclature_id = ?1
               ORDER BY l.id"#,
            LINE_COLUMNS
        );
        self.query_lines(&sql, child)
    }

    fn write_line_costs(
        &mut self,
        line: &EntityId,
        cost: f64,
        line_total: f64,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE bom_lines SET cost = ?2, line_total = ?3 WHERE id = ?1",
            params![line.to_string(), cost, line_total],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(line.clone()));
        }
        Ok(())
    }

    fn write_node_costs(
        &mut self,
        nomenclature: &EntityId,
        material_cost: f64,
        total_cost: f64,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE nomenclature SET material_cost = ?2, total_cost = ?3 WHERE id = ?1",
            params![nomenclature.to_string(), material_cost, total_cost],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(nomenclature.clone()));
        }
        Ok(())
    }

    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        E: From<StoreError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        // Already inside a unit of work: join it
        if !self.conn.is_autocommit() {
            return f(self);
        }

        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| E::from(StoreError::from(e)))?;

        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| E::from(StoreError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    tracing::error!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<EntityId> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn opt_id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<EntityId>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn datetime_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let origin: String = row.get(3)?;
    Ok(Category {
        id: id_at(row, 0)?,
        name: row.get(1)?,
        parent: opt_id_at(row, 2)?,
        origin_type: origin
            .parse::<OriginType>()
            .map_err(|e: String| conversion_error(3, StoreError::Corrupt(e)))?,
        hide_specification: row.get(4)?,
        created: datetime_at(row, 5)?,
    })
}

fn uom_from_row(row: &Row<'_>) -> rusqlite::Result<UnitOfMeasure> {
    Ok(UnitOfMeasure {
        id: id_at(row, 0)?,
        name: row.get(1)?,
        rounding: row.get(2)?,
        created: datetime_at(row, 3)?,
    })
}

fn family_from_row(row: &Row<'_>) -> rusqlite::Result<ComponentFamily> {
    Ok(ComponentFamily {
        id: id_at(row, 0)?,
        name: row.get(1)?,
        uom: opt_id_at(row, 2)?,
        category: opt_id_at(row, 3)?,
        created: datetime_at(row, 4)?,
    })
}

fn nomenclature_from_row(row: &Row<'_>) -> rusqlite::Result<Nomenclature> {
    Ok(Nomenclature {
        id: id_at(row, 0)?,
        family: id_at(row, 1)?,
        name: row.get(2)?,
        code: row.get(3)?,
        currency: row.get(4)?,
        purchase_cost: row.get(5)?,
        material_cost: row.get(6)?,
        total_cost: row.get(7)?,
        created: datetime_at(row, 8)?,
    })
}

fn parameter_from_row(row: &Row<'_>) -> rusqlite::Result<Parameter> {
    Ok(Parameter {
        id: id_at(row, 0)?,
        nomenclature: id_at(row, 1)?,
        name: row.get(2)?,
        value: row.get(3)?,
        uom: opt_id_at(row, 4)?,
        sequence: row.get(5)?,
        created: datetime_at(row, 6)?,
    })
}

/// Line without analogs; callers attach them
fn line_from_row(row: &Row<'_>) -> rusqlite::Result<BomLine> {
    Ok(BomLine {
        id: id_at(row, 0)?,
        parent: id_at(row, 1)?,
        family: id_at(row, 2)?,
        analogs: Vec::new(),
        quantity: row.get(3)?,
        sequence: row.get(4)?,
        cost: row.get(5)?,
        line_total: row.get(6)?,
        created: datetime_at(row, 7)?,
    })
}
