/// Column headers of the product schema, in canonical serialization order.
pub mod schema {
    /// Product page link.
    pub const COL_URL: &str = "Product URL";
    /// Product display name (required).
    pub const COL_NAME: &str = "Product Name";
    /// One-line definition.
    pub const COL_DEFINITION: &str = "Definition (Simple)";
    /// Long-form explanation.
    pub const COL_EXPLANATION: &str = "Expanded Explanation";
    /// Typical applications.
    pub const COL_COMMON_USES: &str = "Common Uses";
    /// Comma-joined customer profile list.
    pub const COL_CUSTOMER_PROFILES: &str = "Common Customer Profiles";
    /// Competitive positioning notes.
    pub const COL_POSITIONING: &str = "Positioning (vs Competitors)";
    /// Cold call script body.
    pub const COL_COLD_CALL: &str = "Cold Call Script";
    /// Cold email sequence bodies, in send order.
    pub const COL_EMAIL_SEQUENCES: [&str; 5] = [
        "Cold Email - Sequence 1",
        "Cold Email - Sequence 2",
        "Cold Email - Sequence 3",
        "Cold Email - Sequence 4",
        "Cold Email - Sequence 5",
    ];
    /// Expected objections.
    pub const COL_OBJECTIONS: &str = "Possible Customer Objections";
    /// Rebuttals to the expected objections.
    pub const COL_REBUTTALS: &str = "Rebuttals to Objections";
    /// Separator used inside the customer-profiles column.
    pub const PROFILE_DELIMITER: char = ',';
}

/// Constants used by upload parsing.
pub mod ingestion {
    /// Local file header magic shared by all ZIP containers (and so `.xlsx`).
    pub const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
    /// UTF-8 byte-order mark some spreadsheet tools prepend to CSV exports.
    pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
    /// Extensions recognized as workbook uploads.
    pub const WORKBOOK_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];
    /// Extensions recognized as delimited-text uploads.
    pub const DELIMITED_EXTENSIONS: [&str; 2] = ["csv", "txt"];
}

/// Constants used by share links and token handling.
pub mod share {
    /// Key carrying the compressed token in the URL fragment and the legacy JSON in the query.
    pub const DATA_PARAM: &str = "data";
    /// Query key selecting the viewer mode.
    pub const MODE_PARAM: &str = "mode";
    /// Mode value that makes the viewer read-only.
    pub const TRAINEE_MODE: &str = "trainee";
    /// Separator between fragment parameters.
    pub const FRAGMENT_PAIR_DELIMITER: char = '&';
}

/// Constants used by the key-value persistence layer.
pub mod storage {
    /// Key prefix for per-namespace record sets.
    pub const RECORDS_PREFIX: &str = "records:";
    /// Key prefix for per-namespace selected product names.
    pub const SELECTED_PREFIX: &str = "selectedId:";
    /// Key holding the last active namespace.
    pub const ACTIVE_NAMESPACE_KEY: &str = "activeNamespace";
    /// Key holding completed curriculum lesson ids.
    pub const COMPLETIONS_KEY: &str = "trainingCompletions";

    /// Version tag prepended to values written by the file-backed store.
    pub const VALUE_RECORD_VERSION: u8 = 1;
    /// Tombstone marker byte for removed file-store values.
    pub const VALUE_TOMBSTONE: u8 = b'-';

    /// Default directory for persisted viewer state.
    pub const DEFAULT_STORE_DIR: &str = ".salesdeck_store";
    /// Default filename for persisted viewer state.
    pub const DEFAULT_STORE_FILENAME: &str = "viewer_store.bin";
}

/// User-facing notice texts.
pub mod notices {
    /// Shown when an inbound share link cannot be imported.
    pub const SHARED_LOAD_FAILED: &str = "Failed to load shared data. Ask trainer to resend link.";
    /// Shown when an upload cannot be parsed.
    pub const UPLOAD_FAILED: &str = "Could not read the uploaded file. Check it is a valid .xlsx or .csv.";
    /// Shown after a share link is generated.
    pub const SHARE_READY: &str = "View-only link ready to copy.";
    /// Shown when a trainee tries a trainer-only action.
    pub const READ_ONLY: &str = "This view is read-only.";
}
