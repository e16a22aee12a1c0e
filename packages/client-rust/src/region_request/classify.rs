//! Region error decision table.
//!
//! Maps each region error variant to the action the sender takes. Pure: the
//! side effects (cache signals, backoff, logging) are carried out by the
//! sender, so the policy can be read and tested on its own.

use regionkv_core::{Region, RegionError, StoreId};

use crate::backoff::BackoffKind;

/// What the sender does about a region error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision<'a> {
    /// Record the hinted leader, then retry immediately.
    UpdateLeader { store_id: StoreId },
    /// Consume one unit of backoff of `kind`, then retry.
    Backoff(BackoffKind),
    /// Evict every route to the attempted store, then retry immediately.
    ClearStore,
    /// Hand the new descriptors to the cache and return the response.
    RefreshTopology { new_regions: &'a [Region] },
    /// Retry immediately without backoff.
    RetryNow,
    /// Give up with a fatal error.
    Fail,
    /// Drop the cached region and return the response.
    DropRegion,
}

#[cfg(test)]
impl Decision<'_> {
    /// Returns `true` if the loop goes around again when the action succeeds.
    pub(crate) fn retries(&self) -> bool {
        matches!(
            self,
            Self::UpdateLeader { .. } | Self::Backoff(_) | Self::ClearStore | Self::RetryNow
        )
    }
}

pub(crate) fn decide(err: &RegionError) -> Decision<'_> {
    match err {
        RegionError::NotLeader {
            leader: Some(leader),
            ..
        } => Decision::UpdateLeader {
            store_id: leader.store_id,
        },
        RegionError::NotLeader { leader: None, .. } => Decision::Backoff(BackoffKind::RegionMiss),
        RegionError::StoreNotMatch { .. } => Decision::ClearStore,
        RegionError::StaleEpoch { new_regions } => Decision::RefreshTopology { new_regions },
        RegionError::ServerIsBusy { .. } => Decision::Backoff(BackoffKind::ServerBusy),
        RegionError::StaleCommand => Decision::RetryNow,
        RegionError::RaftEntryTooLarge { .. } => Decision::Fail,
        RegionError::RegionNotFound { .. }
        | RegionError::KeyNotInRegion { .. }
        | RegionError::Other { .. } => Decision::DropRegion,
    }
}

#[cfg(test)]
mod tests {
    use regionkv_core::Peer;

    use super::*;

    #[test]
    fn not_leader_with_hint_updates_leader() {
        let err = RegionError::NotLeader {
            region_id: 1,
            leader: Some(Peer { id: 12, store_id: 3 }),
        };
        assert_eq!(decide(&err), Decision::UpdateLeader { store_id: 3 });
    }

    #[test]
    fn not_leader_without_hint_backs_off_region_miss() {
        let err = RegionError::NotLeader {
            region_id: 1,
            leader: None,
        };
        assert_eq!(decide(&err), Decision::Backoff(BackoffKind::RegionMiss));
    }

    #[test]
    fn server_is_busy_backs_off_server_busy() {
        let err = RegionError::ServerIsBusy {
            reason: "too many pending tasks".to_string(),
            backoff_ms: 0,
        };
        assert_eq!(decide(&err), Decision::Backoff(BackoffKind::ServerBusy));
    }

    #[test]
    fn stale_epoch_passes_new_regions_through() {
        let region = Region {
            id: 8,
            ..Region::default()
        };
        let err = RegionError::StaleEpoch {
            new_regions: vec![region.clone()],
        };
        match decide(&err) {
            Decision::RefreshTopology { new_regions } => assert_eq!(new_regions, &[region]),
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn unrecognized_errors_drop_region() {
        let errs = [
            RegionError::RegionNotFound { region_id: 1 },
            RegionError::KeyNotInRegion {
                key: b"k".to_vec(),
                region_id: 1,
                start_key: Vec::new(),
                end_key: Vec::new(),
            },
            RegionError::Other {
                message: "whatever".to_string(),
            },
        ];
        for err in &errs {
            assert_eq!(decide(err), Decision::DropRegion, "{err}");
        }
    }

    #[test]
    fn only_transient_errors_retry() {
        let retrying = [
            RegionError::NotLeader {
                region_id: 1,
                leader: None,
            },
            RegionError::StoreNotMatch {
                request_store_id: 1,
                actual_store_id: 2,
            },
            RegionError::ServerIsBusy {
                reason: String::new(),
                backoff_ms: 0,
            },
            RegionError::StaleCommand,
        ];
        for err in &retrying {
            assert!(decide(err).retries(), "{err}");
        }

        let terminal = [
            RegionError::stale_epoch(),
            RegionError::RaftEntryTooLarge {
                region_id: 1,
                entry_size: 1,
            },
            RegionError::Other {
                message: "x".to_string(),
            },
        ];
        for err in &terminal {
            assert!(!decide(err).retries(), "{err}");
        }
    }
}
