//! Error code definitions

/// Scenario file errors (E0xxx)
pub mod scenario {
    pub const PARSE_ERROR: &str = "E0001";
    pub const UNKNOWN_FUTURE: &str = "E0002";
    pub const DUPLICATE_FUTURE: &str = "E0003";
    pub const INVALID_SOURCE: &str = "E0004";
    pub const INVALID_HANDLER: &str = "E0005";
    pub const INVALID_VALUE: &str = "E0006";
    pub const INVALID_EXPECTATION: &str = "E0007";
    pub const READ_FAILED: &str = "E0008";
}

/// Construction errors (E1xxx)
pub mod construction {
    pub const NOT_CALLABLE: &str = "E1001";
}

/// Expectation failures (E2xxx)
pub mod expectation {
    pub const STATE_MISMATCH: &str = "E2001";
    pub const VALUE_MISMATCH: &str = "E2002";
    pub const IDENTITY_MISMATCH: &str = "E2003";
    pub const EXPECTED_ERROR: &str = "E2004";
    pub const UNREACHABLE_HANDLER: &str = "E2005";
}

/// Runtime errors (E3xxx)
pub mod runtime {
    pub const STALLED: &str = "E3001";
    pub const BUDGET_EXHAUSTED: &str = "E3002";
}

/// Warnings (W0xxx)
pub mod warnings {
    pub const UNHANDLED_REJECTION: &str = "W0001";
}

/// Every code, in order
pub const ALL_CODES: &[&str] = &[
    scenario::PARSE_ERROR,
    scenario::UNKNOWN_FUTURE,
    scenario::DUPLICATE_FUTURE,
    scenario::INVALID_SOURCE,
    scenario::INVALID_HANDLER,
    scenario::INVALID_VALUE,
    scenario::INVALID_EXPECTATION,
    scenario::READ_FAILED,
    construction::NOT_CALLABLE,
    expectation::STATE_MISMATCH,
    expectation::VALUE_MISMATCH,
    expectation::IDENTITY_MISMATCH,
    expectation::EXPECTED_ERROR,
    expectation::UNREACHABLE_HANDLER,
    runtime::STALLED,
    runtime::BUDGET_EXHAUSTED,
    warnings::UNHANDLED_REJECTION,
];
