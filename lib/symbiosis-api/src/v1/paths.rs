//! Resource paths, relative to the API base address
//!
//! Caller-supplied identities are percent-encoded as a single path segment, so an
//! email such as `a#b@x.com` cannot end the path early.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;

const PREFIX: &str = "rest/v1";

/// Everything but unreserved characters and `@`
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~').remove(b'@');

fn segment(raw: &str) -> impl fmt::Display + '_ {
    utf8_percent_encode(raw, SEGMENT)
}

pub fn clusters() -> String {
    format!("{PREFIX}/cluster")
}

pub fn cluster(name: &str) -> String {
    format!("{PREFIX}/cluster/{}", segment(name))
}

pub fn cluster_identity(name: &str) -> String {
    format!("{PREFIX}/cluster/{}/identity", segment(name))
}

pub fn node_pools() -> String {
    format!("{PREFIX}/node-pool")
}

pub fn node_pool(id: &str) -> String {
    format!("{PREFIX}/node-pool/{}", segment(id))
}

pub fn team_invitations() -> String {
    format!("{PREFIX}/team/member/invite")
}

pub fn team_invitation(email: &str) -> String {
    format!("{PREFIX}/team/member/invite/{}", segment(email))
}

pub fn team_member(email: &str) -> String {
    format!("{PREFIX}/team/member/{}", segment(email))
}

pub fn service_accounts(cluster: &str) -> String {
    format!("{PREFIX}/cluster/{}/user-service-account", segment(cluster))
}

pub fn service_account(cluster: &str, id: &str) -> String {
    format!("{PREFIX}/cluster/{}/user-service-account/{}", segment(cluster), segment(id))
}
