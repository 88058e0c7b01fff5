//! SQL schema for the ARMIS SQLite store.
//!
//! Executed once at connection startup. Child tables cascade on person
//! deletion, so `foreign_keys` must stay on for the connection's lifetime.

/// Staff columns a seeding call may set. The `fname`/`lname`/`dob`/`nrc`/
/// `svc_no`/`sex` columns hold values imported from the paper-form era and
/// are only read through the canonical translation layer.
pub const STAFF_COLUMNS: &[&str] = &[
  "service_number",
  "prefix",
  "first_name",
  "middle_name",
  "last_name",
  "suffix",
  "date_of_birth",
  "gender",
  "national_id",
  "nationality",
  "marital_status",
  "religion",
  "email",
  "phone",
  "photo_path",
  "rank_id",
  "unit_id",
  "corps",
  "service_status",
  "enlistment_date",
  "svc_no",
  "fname",
  "lname",
  "dob",
  "nrc",
  "sex",
];

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS ranks (
    rank_id  INTEGER PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS units (
    unit_id  INTEGER PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS staff (
    staff_id         INTEGER PRIMARY KEY,
    service_number   TEXT,
    prefix           TEXT,
    first_name       TEXT,
    middle_name      TEXT,
    last_name        TEXT,
    suffix           TEXT,
    date_of_birth    TEXT,             -- YYYY-MM-DD
    gender           TEXT,
    national_id      TEXT,
    nationality      TEXT,
    marital_status   TEXT,
    religion         TEXT,
    email            TEXT,
    phone            TEXT,
    photo_path       TEXT,             -- relative to the upload directory
    rank_id          INTEGER REFERENCES ranks(rank_id) ON DELETE SET NULL,
    unit_id          INTEGER REFERENCES units(unit_id) ON DELETE SET NULL,
    corps            TEXT,
    service_status   TEXT,
    enlistment_date  TEXT,
    -- legacy import columns
    svc_no           TEXT,
    fname            TEXT,
    lname            TEXT,
    dob              TEXT,             -- free-form
    nrc              TEXT,
    sex              TEXT,
    created_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE IF NOT EXISTS contact_methods (
    contact_id    INTEGER PRIMARY KEY,
    staff_id      INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    contact_type  TEXT NOT NULL,
    value         TEXT NOT NULL,
    is_primary    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (staff_id, contact_type, value)
);

-- At most one primary per contact type.
CREATE UNIQUE INDEX IF NOT EXISTS contact_methods_primary
    ON contact_methods(staff_id, contact_type) WHERE is_primary = 1;

CREATE TABLE IF NOT EXISTS addresses (
    address_id   INTEGER PRIMARY KEY,
    staff_id     INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    kind         TEXT NOT NULL,
    line1        TEXT NOT NULL,
    line2        TEXT,
    city         TEXT,
    province     TEXT,
    country      TEXT,
    postal_code  TEXT
);

CREATE TABLE IF NOT EXISTS family_members (
    family_id             INTEGER PRIMARY KEY,
    staff_id              INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    name                  TEXT NOT NULL,
    relationship          TEXT NOT NULL,
    date_of_birth         TEXT,
    phone                 TEXT,
    email                 TEXT,
    address               TEXT,
    is_emergency_contact  INTEGER NOT NULL DEFAULT 0,
    is_dependent          INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS education (
    education_id     INTEGER PRIMARY KEY,
    staff_id         INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    qualification    TEXT NOT NULL,
    institution      TEXT,
    level            TEXT NOT NULL,
    completion_year  INTEGER
);

CREATE TABLE IF NOT EXISTS training (
    training_id  INTEGER PRIMARY KEY,
    staff_id     INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    course_name  TEXT NOT NULL,
    provider     TEXT,
    start_date   TEXT,
    end_date     TEXT,
    due_date     TEXT,
    status       TEXT NOT NULL,
    mandatory    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS skills (
    skill_id     INTEGER PRIMARY KEY,
    staff_id     INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    name         TEXT NOT NULL,
    proficiency  TEXT
);

CREATE TABLE IF NOT EXISTS certifications (
    certification_id  INTEGER PRIMARY KEY,
    staff_id          INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    name              TEXT NOT NULL,
    issuer            TEXT,
    issue_date        TEXT,
    expiry_date       TEXT
);

CREATE TABLE IF NOT EXISTS awards (
    award_id    INTEGER PRIMARY KEY,
    staff_id    INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    kind        TEXT NOT NULL,
    awarded_on  TEXT,
    citation    TEXT
);

CREATE TABLE IF NOT EXISTS deployments (
    deployment_id  INTEGER PRIMARY KEY,
    staff_id       INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    mission        TEXT NOT NULL,
    location       TEXT,
    start_date     TEXT,
    end_date       TEXT,
    status         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS service_history (
    posting_id   INTEGER PRIMARY KEY,
    staff_id     INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    unit_name    TEXT NOT NULL,
    appointment  TEXT,
    from_date    TEXT,
    to_date      TEXT
);

-- At most one current clearance and one medical record per person.
CREATE TABLE IF NOT EXISTS security_clearances (
    staff_id     INTEGER PRIMARY KEY REFERENCES staff(staff_id) ON DELETE CASCADE,
    level        TEXT NOT NULL,
    issue_date   TEXT,
    expiry_date  TEXT,
    status       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS medical_readiness (
    staff_id             INTEGER PRIMARY KEY REFERENCES staff(staff_id) ON DELETE CASCADE,
    fitness_category     TEXT NOT NULL,
    exam_date            TEXT,
    exam_expiry          TEXT,
    deployment_eligible  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS cv_documents (
    reference       TEXT PRIMARY KEY,  -- UUID
    staff_id        INTEGER NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    file_name       TEXT NOT NULL,
    media_type      TEXT NOT NULL,
    size_bytes      INTEGER NOT NULL,
    content_hash    TEXT NOT NULL,     -- SHA-256 hex
    stored_path     TEXT NOT NULL,
    extracted_json  TEXT NOT NULL,     -- DraftProfile
    uploaded_at     TEXT NOT NULL      -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS contact_methods_staff ON contact_methods(staff_id);
CREATE INDEX IF NOT EXISTS family_members_staff  ON family_members(staff_id);
CREATE INDEX IF NOT EXISTS education_staff       ON education(staff_id);
CREATE INDEX IF NOT EXISTS skills_staff          ON skills(staff_id);
CREATE INDEX IF NOT EXISTS certifications_staff  ON certifications(staff_id);

PRAGMA user_version = 1;
";
