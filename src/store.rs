// src/store.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Object-storage seam used by the ACL pipeline.
//!
//! The pipeline only needs three calls: one page of a prefix listing, an ACL
//! read and an ACL write. `AclStore` is the trait for them; `S3AclStore` is
//! the AWS SDK implementation. The client handle is shared read-only across
//! all workers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::types::{
    AccessControlPolicy, Grant as S3Grant, Grantee as S3Grantee, ObjectCannedAcl,
    Owner as S3Owner, Permission as S3Permission, Type as S3GranteeType,
};
use aws_sdk_s3::Client;
use tracing::debug;

use crate::acl::{AclWrite, CannedAcl, Grant, Grantee, GranteeType, ObjectAcl, Owner, Permission};

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Continuation token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

/// Storage operations consumed by the enumerator and the mutator.
#[async_trait]
pub trait AclStore: Send + Sync {
    /// Fetch one page of keys under `prefix`, continuing from `continuation`.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage>;

    /// Read the owner and current grants of one object.
    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<ObjectAcl>;

    /// Replace the ACL of one object.
    async fn put_object_acl(&self, bucket: &str, key: &str, acl: &AclWrite) -> Result<()>;
}

/// `AclStore` backed by the AWS Rust SDK.
#[derive(Clone, Debug)]
pub struct S3AclStore {
    client: Client,
}

impl S3AclStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AclStore for S3AclStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation)
            .send()
            .await
            .context("list_objects_v2 failed")?;

        let keys: Vec<String> = resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_owned))
            .collect();

        // Some S3-compatible stores omit IsTruncated; trust the token.
        let next_token = match resp.is_truncated() {
            Some(false) => None,
            _ => resp.next_continuation_token().map(str::to_owned),
        };
        debug!("Listed {} keys from s3://{}/{}", keys.len(), bucket, prefix);

        Ok(ListPage { keys, next_token })
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<ObjectAcl> {
        let resp = self
            .client
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context("get_object_acl failed")?;

        let owner = resp.owner().map(|o| Owner {
            id: o.id().map(str::to_owned),
            display_name: o.display_name().map(str::to_owned),
        });
        let grants = resp.grants().iter().filter_map(grant_from_s3).collect();

        Ok(ObjectAcl { owner, grants })
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: &AclWrite) -> Result<()> {
        let req = self.client.put_object_acl().bucket(bucket).key(key);
        let req = match acl {
            AclWrite::Canned(canned) => req.acl(canned_to_s3(*canned)),
            AclWrite::Document { owner, grants } => {
                let grants = grants.iter().map(grant_to_s3).collect::<Result<Vec<_>>>()?;
                let mut policy = AccessControlPolicy::builder().set_grants(Some(grants));
                if let Some(owner) = owner {
                    policy = policy.owner(
                        S3Owner::builder()
                            .set_id(owner.id.clone())
                            .set_display_name(owner.display_name.clone())
                            .build(),
                    );
                }
                req.access_control_policy(policy.build())
            }
        };
        req.send().await.context("put_object_acl failed")?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// SDK conversions
// -----------------------------------------------------------------------------

fn canned_to_s3(acl: CannedAcl) -> ObjectCannedAcl {
    match acl {
        CannedAcl::Private => ObjectCannedAcl::Private,
        CannedAcl::PublicRead => ObjectCannedAcl::PublicRead,
        CannedAcl::PublicReadWrite => ObjectCannedAcl::PublicReadWrite,
        CannedAcl::AwsExecRead => ObjectCannedAcl::AwsExecRead,
        CannedAcl::AuthenticatedRead => ObjectCannedAcl::AuthenticatedRead,
        CannedAcl::BucketOwnerRead => ObjectCannedAcl::BucketOwnerRead,
        CannedAcl::BucketOwnerFullControl => ObjectCannedAcl::BucketOwnerFullControl,
    }
}

fn grant_to_s3(grant: &Grant) -> Result<S3Grant> {
    let grantee_type = match grant.grantee.grantee_type {
        GranteeType::CanonicalUser => S3GranteeType::CanonicalUser,
        GranteeType::AmazonCustomerByEmail => S3GranteeType::AmazonCustomerByEmail,
        GranteeType::Group => S3GranteeType::Group,
    };
    let grantee = S3Grantee::builder()
        .r#type(grantee_type)
        .set_id(grant.grantee.id.clone())
        .set_display_name(grant.grantee.display_name.clone())
        .set_email_address(grant.grantee.email_address.clone())
        .set_uri(grant.grantee.uri.clone())
        .build()
        .map_err(anyhow::Error::from)?;
    let permission = match grant.permission {
        Permission::FullControl => S3Permission::FullControl,
        Permission::Write => S3Permission::Write,
        Permission::WriteAcp => S3Permission::WriteAcp,
        Permission::Read => S3Permission::Read,
        Permission::ReadAcp => S3Permission::ReadAcp,
    };
    Ok(S3Grant::builder().grantee(grantee).permission(permission).build())
}

/// Grants with a grantee type or permission this crate does not model are dropped.
fn grant_from_s3(grant: &S3Grant) -> Option<Grant> {
    let g = grant.grantee()?;
    let grantee_type = match g.r#type() {
        S3GranteeType::CanonicalUser => GranteeType::CanonicalUser,
        S3GranteeType::AmazonCustomerByEmail => GranteeType::AmazonCustomerByEmail,
        S3GranteeType::Group => GranteeType::Group,
        _ => return None,
    };
    let permission = match grant.permission()? {
        S3Permission::FullControl => Permission::FullControl,
        S3Permission::Write => Permission::Write,
        S3Permission::WriteAcp => Permission::WriteAcp,
        S3Permission::Read => Permission::Read,
        S3Permission::ReadAcp => Permission::ReadAcp,
        _ => return None,
    };
    Some(Grant {
        grantee: Grantee {
            id: g.id().map(str::to_owned),
            display_name: g.display_name().map(str::to_owned),
            email_address: g.email_address().map(str::to_owned),
            uri: g.uri().map(str::to_owned),
            grantee_type,
        },
        permission,
    })
}
