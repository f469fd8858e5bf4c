// src/acl.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Access-control data model: canned policies, explicit grants and the
//! read/write shapes exchanged with the storage backend.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AclError;

// -----------------------------------------------------------------------------
// Canned ACL
// -----------------------------------------------------------------------------

/// Predefined (canned) object ACLs accepted by `--acl`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum CannedAcl {
    /// Owner gets `FULL_CONTROL`, nobody else has access.
    #[default]
    Private,
    /// Owner gets `FULL_CONTROL`, the `AllUsers` group gets `READ`.
    PublicRead,
    /// Owner gets `FULL_CONTROL`, the `AllUsers` group gets `READ` and `WRITE`.
    PublicReadWrite,
    /// Owner gets `FULL_CONTROL`, EC2 gets `READ` on AMI bundles.
    AwsExecRead,
    /// Owner gets `FULL_CONTROL`, the `AuthenticatedUsers` group gets `READ`.
    AuthenticatedRead,
    /// Object owner gets `FULL_CONTROL`, bucket owner gets `READ`.
    BucketOwnerRead,
    /// Object owner and bucket owner both get `FULL_CONTROL`.
    BucketOwnerFullControl,
}

impl CannedAcl {
    /// Wire representation, as sent in the `x-amz-acl` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AwsExecRead => "aws-exec-read",
            Self::AuthenticatedRead => "authenticated-read",
            Self::BucketOwnerRead => "bucket-owner-read",
            Self::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CannedAcl {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            "aws-exec-read" => Ok(Self::AwsExecRead),
            "authenticated-read" => Ok(Self::AuthenticatedRead),
            "bucket-owner-read" => Ok(Self::BucketOwnerRead),
            "bucket-owner-full-control" => Ok(Self::BucketOwnerFullControl),
            other => Err(AclError::InvalidConfig(format!("unknown canned ACL: {other}"))),
        }
    }
}

// -----------------------------------------------------------------------------
// Grants
// -----------------------------------------------------------------------------

/// Kind of identity a grant is issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GranteeType {
    CanonicalUser,
    AmazonCustomerByEmail,
    Group,
}

/// Access level carried by a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "FULL_CONTROL")]
    FullControl,
    #[serde(rename = "WRITE")]
    Write,
    #[serde(rename = "WRITE_ACP")]
    WriteAcp,
    #[serde(rename = "READ")]
    Read,
    #[serde(rename = "READ_ACP")]
    ReadAcp,
}

/// Who a grant applies to. Keys follow the S3 JSON shape (`ID`, `Type`, ...);
/// the lowercase and camelCase spellings are accepted on input as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grantee {
    #[serde(
        rename = "ID",
        alias = "id",
        alias = "Id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        rename = "DisplayName",
        alias = "displayName",
        alias = "displayname",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    #[serde(
        rename = "EmailAddress",
        alias = "emailAddress",
        alias = "emailaddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub email_address: Option<String>,
    #[serde(
        rename = "URI",
        alias = "uri",
        alias = "Uri",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub uri: Option<String>,
    #[serde(rename = "Type", alias = "type")]
    pub grantee_type: GranteeType,
}

impl Grantee {
    /// Canonical-user grantee identified by `id`.
    pub fn canonical_user(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            display_name: None,
            email_address: None,
            uri: None,
            grantee_type: GranteeType::CanonicalUser,
        }
    }

    /// The identifier field the grantee type requires.
    fn identifier(&self) -> Option<&str> {
        match self.grantee_type {
            GranteeType::CanonicalUser => self.id.as_deref(),
            GranteeType::AmazonCustomerByEmail => self.email_address.as_deref(),
            GranteeType::Group => self.uri.as_deref(),
        }
    }
}

/// One `{grantee, permission}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    #[serde(rename = "Grantee", alias = "grantee")]
    pub grantee: Grantee,
    #[serde(rename = "Permission", alias = "permission")]
    pub permission: Permission,
}

/// Decode the `--grants` JSON document into a validated grant list.
///
/// Example input:
/// `[{"Grantee":{"ID":"abc","Type":"CanonicalUser"},"Permission":"FULL_CONTROL"}]`
pub fn parse_grants(json: &str) -> Result<Vec<Grant>, AclError> {
    let grants: Vec<Grant> = serde_json::from_str(json)
        .map_err(|e| AclError::InvalidGrants(format!("malformed grants JSON: {e}")))?;

    if grants.is_empty() {
        return Err(AclError::InvalidGrants("grant list is empty".to_string()));
    }

    for (idx, grant) in grants.iter().enumerate() {
        match grant.grantee.identifier() {
            Some(v) if !v.is_empty() => {}
            _ => {
                return Err(AclError::InvalidGrants(format!(
                    "grant #{idx}: grantee of type {:?} is missing its identifier",
                    grant.grantee.grantee_type
                )));
            }
        }
    }

    Ok(grants)
}

// -----------------------------------------------------------------------------
// Requested policy and backend shapes
// -----------------------------------------------------------------------------

/// The change to apply to every matched object. Decided once at
/// configuration time: explicit grants always win over the canned value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclSpec {
    Canned(CannedAcl),
    Explicit(Vec<Grant>),
}

impl AclSpec {
    /// Pick the variant from the raw CLI inputs.
    pub fn from_parts(canned: CannedAcl, grants: Option<Vec<Grant>>) -> Self {
        match grants {
            Some(grants) => AclSpec::Explicit(grants),
            None => AclSpec::Canned(canned),
        }
    }
}

impl fmt::Display for AclSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclSpec::Canned(acl) => write!(f, "canned ACL '{acl}'"),
            AclSpec::Explicit(grants) => write!(f, "{} explicit grant(s)", grants.len()),
        }
    }
}

/// Object owner as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

/// Current access-control state of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectAcl {
    pub owner: Option<Owner>,
    pub grants: Vec<Grant>,
}

/// A single write request against one object's ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclWrite {
    /// Replace the ACL wholesale with a canned policy.
    Canned(CannedAcl),
    /// Replace the ACL with a full document. `grants` replaces, never merges.
    Document { owner: Option<Owner>, grants: Vec<Grant> },
}
