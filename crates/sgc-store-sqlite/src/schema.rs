//! SQL schema for the SGC SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Drive ────────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS folders (
    folder_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    parent_id   TEXT REFERENCES folders(folder_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    created_by  TEXT
);

-- Sibling names are unique; top-level folders share the '' parent key.
CREATE UNIQUE INDEX IF NOT EXISTS folders_sibling_name_idx
    ON folders(COALESCE(parent_id, ''), name);
CREATE INDEX IF NOT EXISTS folders_parent_idx ON folders(parent_id);

CREATE TABLE IF NOT EXISTS files (
    file_id      TEXT PRIMARY KEY,
    folder_id    TEXT NOT NULL REFERENCES folders(folder_id) ON DELETE CASCADE,
    name         TEXT NOT NULL,
    mime_type    TEXT NOT NULL,
    size         INTEGER NOT NULL,
    content_hash TEXT NOT NULL,   -- SHA-256 hex
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS file_contents (
    file_id TEXT PRIMARY KEY REFERENCES files(file_id) ON DELETE CASCADE,
    content BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS files_folder_idx ON files(folder_id);

-- ── ACPM ─────────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS acpms (
    acpm_id         TEXT PRIMARY KEY,
    kind            TEXT NOT NULL,   -- 'corrective' | 'preventive' | 'improvement'
    origin          TEXT NOT NULL,
    source_kind     TEXT,            -- 'report' | 'audit' | 'other'
    source_ref      TEXT,
    description     TEXT NOT NULL,
    action_plan     TEXT NOT NULL,
    responsible     TEXT NOT NULL,
    due_date        TEXT NOT NULL,   -- YYYY-MM-DD
    root_cause      TEXT,
    status          TEXT NOT NULL,   -- 'open' | 'in_progress' | 'closed'
    closure_comment TEXT,
    evidence_url    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    closed_at       TEXT,
    CHECK (status != 'closed' OR trim(COALESCE(evidence_url, '')) != '')
);

CREATE INDEX IF NOT EXISTS acpms_status_idx ON acpms(status);

-- ── Reports ──────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS reports (
    report_id    TEXT PRIMARY KEY,
    category     TEXT NOT NULL,
    title        TEXT NOT NULL,
    answers      TEXT NOT NULL DEFAULT '[]',   -- JSON checklist
    passed       INTEGER NOT NULL,
    evidence_url TEXT,
    verified     INTEGER NOT NULL DEFAULT 0,
    acpm_id      TEXT REFERENCES acpms(acpm_id) ON DELETE SET NULL,
    created_by   TEXT,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS reports_category_idx ON reports(category);

-- ── Certificates ─────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS certificate_templates (
    template_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    schema_json TEXT NOT NULL,   -- normalized TemplateSchema
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- No foreign keys: the log outlives templates and drive files.
CREATE TABLE IF NOT EXISTS generated_certificates (
    certificate_id TEXT PRIMARY KEY,
    template_id    TEXT NOT NULL,
    template_name  TEXT NOT NULL,
    values_json    TEXT NOT NULL,
    batch          TEXT,
    client         TEXT,
    file_id        TEXT NOT NULL,
    pdf_url        TEXT NOT NULL,
    page_count     INTEGER NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS generated_template_idx
    ON generated_certificates(template_id);

-- ── Documentation cards ──────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS document_cards (
    card_id     TEXT PRIMARY KEY,
    module      TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT,
    folder_name TEXT NOT NULL,
    position    INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cards_module_idx ON document_cards(module);

PRAGMA user_version = 1;
";
