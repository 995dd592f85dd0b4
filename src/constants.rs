#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Feedback written when a check passes without reporting anything itself.
pub const PASSED: &str = "Passed!\n";

/// Feedback written when a check fails without explaining why.
pub const STAFF_ALERT: &str = "Test didn't pass. Some message should have been reported but \
                               didn't; please alert the course staff.";

/// Feedback written when a check asks for input but no input was scripted.
pub const INPUT_NOT_ALLOWED: &str = "This task should not ask for user input. Comment out or \
                                     remove any calls to 'input'";

/// Header for failures raised from student code.
pub const RUNTIME_ERROR_HEADER: &str = "Error running your code:";

/// Prefix for assertions that failed inside student code.
pub const ASSERTION_PREFIX: &str = "Assertion failed: ";

/// Course report exported from the learning platform.
pub const REPORT_FILE: &str = "report.csv";

/// Partner grouping map written by the extractor and read by the merger.
pub const PARTNERS_FILE: &str = "partners.json";

/// Output of the score merger.
pub const MERGED_SCORES_FILE: &str = "merged_scores.csv";

/// Report column holding each student's school email.
pub const SCHOOL_EMAIL_COLUMN: &str = "School email";

/// Column written first in the merged report, holding the student id.
pub const ID_COLUMN: &str = "calvin_id";

/// Column appended to the merged report, holding the weighted total.
pub const TOTAL_COLUMN: &str = "lab_scores";

/// Marker identifying lab score columns in the course report.
pub const LAB_COLUMN_MARKER: &str = "- Lab";

/// Marker counted by the conservative author detector.
pub const AUTHOR_MARKER: &str = "author:";
