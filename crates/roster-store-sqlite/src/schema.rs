//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Students are never deleted; cancellation clears `active`.
CREATE TABLE IF NOT EXISTS students (
    student_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name      TEXT NOT NULL,
    cpf            TEXT NOT NULL UNIQUE,   -- 11 digits, immutable
    birth_date     TEXT,                   -- YYYY-MM-DD
    gender         TEXT,
    phone          TEXT,
    zip_code       TEXT,
    street         TEXT,
    house_number   TEXT,
    neighborhood   TEXT,
    current_school TEXT,
    grade          TEXT,
    school_shift   TEXT CHECK (school_shift IN ('morning', 'afternoon', 'full-day')),
    notes          TEXT,
    enrolled_at    TEXT NOT NULL,          -- RFC 3339
    active         INTEGER NOT NULL DEFAULT 1
);

-- Shared between students with the same guardian CPF.
CREATE TABLE IF NOT EXISTS guardians (
    guardian_id            INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name              TEXT NOT NULL,
    cpf                    TEXT NOT NULL UNIQUE,
    relationship           TEXT,
    phone                  TEXT,
    phone_contact          TEXT,
    message_phone1         TEXT,
    message_phone1_contact TEXT,
    message_phone2         TEXT,
    message_phone2_contact TEXT
);

CREATE TABLE IF NOT EXISTS guardian_links (
    student_id  INTEGER NOT NULL REFERENCES students(student_id),
    guardian_id INTEGER NOT NULL REFERENCES guardians(guardian_id),
    link        TEXT NOT NULL CHECK (link IN ('principal', 'secondary')),
    PRIMARY KEY (student_id, guardian_id)
);

CREATE TABLE IF NOT EXISTS courses (
    course_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    total_seats     INTEGER NOT NULL CHECK (total_seats >= 0),
    available_seats INTEGER NOT NULL,
    active          INTEGER NOT NULL DEFAULT 1,
    CHECK (available_seats BETWEEN 0 AND total_seats)
);

CREATE TABLE IF NOT EXISTS classes (
    class_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id   INTEGER NOT NULL REFERENCES courses(course_id),
    name        TEXT NOT NULL,
    weekday     TEXT NOT NULL,   -- catalog spelling, e.g. 'Segunda-feira'
    start_time  TEXT NOT NULL,   -- HH:MM:SS
    end_time    TEXT NOT NULL,
    term_start  TEXT,            -- YYYY-MM-DD or NULL (open)
    term_end    TEXT,
    seats       INTEGER NOT NULL DEFAULT 0,
    description TEXT
);

-- `course_id` is the course charged when the row became ACTIVE.
CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id    INTEGER NOT NULL REFERENCES students(student_id),
    class_id      INTEGER NOT NULL REFERENCES classes(class_id),
    course_id     INTEGER NOT NULL REFERENCES courses(course_id),
    status        TEXT NOT NULL CHECK (status IN ('ACTIVE', 'CANCELLED')),
    enrolled_at   TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS enrollments_one_active_idx
    ON enrollments(student_id, class_id) WHERE status = 'ACTIVE';
CREATE INDEX IF NOT EXISTS enrollments_class_idx ON enrollments(class_id, status);

CREATE TABLE IF NOT EXISTS class_sessions (
    session_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    class_id     INTEGER NOT NULL REFERENCES classes(class_id),
    session_date TEXT NOT NULL,
    recorded_by  INTEGER NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE (class_id, session_date)
);

CREATE TABLE IF NOT EXISTS presences (
    presence_id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id  INTEGER NOT NULL REFERENCES class_sessions(session_id),
    student_id  INTEGER NOT NULL REFERENCES students(student_id),
    mark        TEXT NOT NULL,
    note        TEXT,
    recorded_at TEXT NOT NULL,
    UNIQUE (session_id, student_id)
);

CREATE TABLE IF NOT EXISTS attachments (
    attachment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type   TEXT NOT NULL,
    entity_id     INTEGER NOT NULL,
    kind          TEXT NOT NULL,
    file_name     TEXT NOT NULL,
    extension     TEXT,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS attachments_owner_idx ON attachments(entity_type, entity_id);

PRAGMA user_version = 1;
";
