// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mb-core: domain types for the Meeting Bot Controller — meetings, sessions,
//! subscribers, job specs, leader leases, and the configuration and parsing
//! boundary that keeps the rest of the system strongly typed.

pub mod macros;

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod job_spec;
pub mod labels;
pub mod lease;
pub mod meeting;
pub mod session;
pub mod url_normalize;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    default_meeting_status_values, default_meetings_collection_path, ControllerConfig,
    MeetingsQueryMode,
};
pub use error::{ConfigError, MeetingParseError};
pub use ids::{org_id_hash, url_hash, JobName, MeetingId, OrgId, SessionId, UserId};
pub use job_spec::{
    recordings_prefix, ResourceLimits, WorkerJobParams, WorkerJobSpec, JOB_ACTIVE_DEADLINE,
    JOB_TTL_AFTER_FINISHED,
};
pub use labels::{sanitize_label_value, JobLabels, APP_LABEL_VALUE};
pub use lease::{LeaderLease, LEASE_DURATION, LEASE_RENEW_MARGIN};
pub use meeting::{FanoutStatus, MeetingRecord, MeetingStatus};
pub use session::{
    AddedVia, Claim, FanoutReport, MeetingSession, SessionStatus, Subscriber, SubscriberStatus,
    SubscriberValidation,
};
pub use url_normalize::{is_allowed_platform_host, normalize_meeting_url};
