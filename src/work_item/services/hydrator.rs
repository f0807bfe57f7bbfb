//! Item hydrator: ordered ids to fully populated work item snapshots.

use crate::work_item::{
    domain::{
        Assignee, AvatarBlob, BranchLink, BranchLinkError, BranchName, BranchRef, ProjectScope,
        RemoteWorkItem, WorkItem, WorkItemId,
    },
    ports::{GitRemote, RemoteServiceError, WorkItemStore},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;

/// Branch link that could not be decoded during a hydration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndecodableLink {
    /// Item carrying the link.
    pub item: WorkItemId,
    /// Decode failure.
    pub error: BranchLinkError,
}

/// Linked branch that no longer exists on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedBranch {
    /// Item carrying the link.
    pub item: WorkItemId,
    /// Branch named by the link.
    pub branch: BranchName,
}

/// Output of one hydration pass.
#[derive(Debug, Clone, PartialEq)]
pub struct HydratedItems {
    /// Items in the requested order.
    pub items: Vec<WorkItem>,
    /// Requested ids the store did not return.
    pub missing: Vec<WorkItemId>,
    /// Items whose branch link was skipped.
    pub undecodable_links: Vec<UndecodableLink>,
    /// Items whose linked branch was deleted on the remote.
    pub deleted_branches: Vec<DeletedBranch>,
    /// When the pass completed.
    pub fetched_at: DateTime<Utc>,
}

/// Per-pass memo tables. Dropped at the end of every pass.
#[derive(Default)]
struct PassCache {
    avatars: HashMap<String, AvatarBlob>,
    branches: HashMap<String, Option<BranchRef>>,
}

/// Expands ids into work items with avatars and linked branches resolved.
#[derive(Clone)]
pub struct ItemHydrator<S, G, C>
where
    S: WorkItemStore,
    G: GitRemote,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    git: Arc<G>,
    clock: Arc<C>,
}

impl<S, G, C> ItemHydrator<S, G, C>
where
    S: WorkItemStore,
    G: GitRemote,
    C: Clock + Send + Sync,
{
    /// Creates a hydrator.
    #[must_use]
    pub const fn new(store: Arc<S>, git: Arc<G>, clock: Arc<C>) -> Self {
        Self { store, git, clock }
    }

    /// Hydrates `ids`, preserving their order.
    ///
    /// Items are fetched in one batch. Each distinct assignee's avatar is
    /// fetched once and each distinct branch link is resolved once per
    /// call. An item's first `Branch` relation is the only one considered;
    /// if it cannot be decoded the item has no branch and the failure is
    /// listed in [`HydratedItems::undecodable_links`]. A linked branch the
    /// remote reports as not found leaves the item without a branch and is
    /// listed in [`HydratedItems::deleted_branches`].
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError`] when any remote fetch fails for a
    /// reason other than a missing branch.
    pub async fn hydrate(
        &self,
        scope: &ProjectScope,
        ids: &[WorkItemId],
    ) -> Result<HydratedItems, RemoteServiceError> {
        if ids.is_empty() {
            return Ok(HydratedItems {
                items: Vec::new(),
                missing: Vec::new(),
                undecodable_links: Vec::new(),
                deleted_branches: Vec::new(),
                fetched_at: self.clock.utc(),
            });
        }

        let fetched = self.store.get_work_items(scope, ids).await?;
        let (ordered, missing) = order_by_request(ids, fetched);
        if !missing.is_empty() {
            tracing::debug!(?missing, "store omitted requested work items");
        }

        let mut cache = PassCache::default();
        let mut undecodable_links = Vec::new();
        let mut deleted_branches = Vec::new();
        let mut items = Vec::with_capacity(ordered.len());
        for remote in ordered {
            let assignee = self.resolve_assignee(&remote, &mut cache).await?;
            let branch = match self.resolve_branch(scope, &remote, &mut cache).await {
                Ok(branch) => branch,
                Err(BranchResolutionError::Undecodable(error)) => {
                    tracing::debug!(item = %remote.id, %error, "skipping undecodable branch link");
                    undecodable_links.push(UndecodableLink {
                        item: remote.id,
                        error,
                    });
                    None
                }
                Err(BranchResolutionError::Deleted(branch)) => {
                    tracing::debug!(item = %remote.id, %branch, "linked branch no longer exists");
                    deleted_branches.push(DeletedBranch {
                        item: remote.id,
                        branch,
                    });
                    None
                }
                Err(BranchResolutionError::Remote(err)) => return Err(err),
            };
            items.push(WorkItem::from_remote(remote, assignee, branch));
        }

        Ok(HydratedItems {
            items,
            missing,
            undecodable_links,
            deleted_branches,
            fetched_at: self.clock.utc(),
        })
    }

    async fn resolve_assignee(
        &self,
        remote: &RemoteWorkItem,
        cache: &mut PassCache,
    ) -> Result<Option<Assignee>, RemoteServiceError> {
        let Some(identity) = remote.fields.assigned_to.as_ref() else {
            return Ok(None);
        };
        let assignee = Assignee::from(identity);
        let Some(image_url) = identity.image_url.as_deref() else {
            return Ok(Some(assignee));
        };

        if let Some(avatar) = cache.avatars.get(&identity.unique_name) {
            return Ok(Some(assignee.with_avatar(Some(avatar.clone()))));
        }
        let avatar = self.store.get_avatar(image_url).await?;
        cache
            .avatars
            .insert(identity.unique_name.clone(), avatar.clone());
        Ok(Some(assignee.with_avatar(Some(avatar))))
    }

    async fn resolve_branch(
        &self,
        scope: &ProjectScope,
        remote: &RemoteWorkItem,
        cache: &mut PassCache,
    ) -> Result<Option<BranchRef>, BranchResolutionError> {
        let Some(relation) = remote.first_branch_relation() else {
            return Ok(None);
        };
        let link = BranchLink::decode(&relation.url).map_err(BranchResolutionError::Undecodable)?;

        if let Some(cached) = cache.branches.get(link.decoded()) {
            return cached
                .clone()
                .map(Some)
                .ok_or_else(|| BranchResolutionError::Deleted(link.branch_name().clone()));
        }
        let resolved = match self
            .git
            .get_branch(scope, link.repository(), link.branch_name())
            .await
        {
            Ok(stats) => Some(BranchRef::resolved(&link, stats)),
            Err(RemoteServiceError::NotFound(_)) => None,
            Err(err) => return Err(BranchResolutionError::Remote(err)),
        };
        cache
            .branches
            .insert(link.decoded().to_owned(), resolved.clone());
        resolved
            .map(Some)
            .ok_or_else(|| BranchResolutionError::Deleted(link.branch_name().clone()))
    }
}

enum BranchResolutionError {
    Undecodable(BranchLinkError),
    Deleted(BranchName),
    Remote(RemoteServiceError),
}

/// Re-orders fetched items to match the requested ids.
///
/// Duplicate requested ids keep only their first position.
fn order_by_request(
    ids: &[WorkItemId],
    fetched: Vec<RemoteWorkItem>,
) -> (Vec<RemoteWorkItem>, Vec<WorkItemId>) {
    let mut by_id: HashMap<WorkItemId, RemoteWorkItem> = HashMap::with_capacity(fetched.len());
    for item in fetched {
        by_id.entry(item.id).or_insert(item);
    }

    let mut ordered = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            continue;
        }
        match by_id.remove(id) {
            Some(item) => ordered.push(item),
            None => missing.push(*id),
        }
    }
    (ordered, missing)
}
